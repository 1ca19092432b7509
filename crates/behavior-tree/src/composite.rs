//! Composite behavior nodes.
//!
//! Composite nodes control the execution flow of multiple children. This
//! module provides the tick rules for `Sequence` (AND logic), `Priority` (OR
//! logic) and their memorized variants, which resume from the child that was
//! running on the previous tick instead of starting over.
//!
//! Children are always visited in the node's stored order, which the tree
//! keeps sorted by the children's `y` coordinate.

use crate::node::{execute_child, keys};
use crate::{ExecutionContext, Node, NodeId, Status, Tree};

/// Outcome of walking a composite's children.
enum Walk {
    /// Every child returned the "keep going" status.
    Exhausted,
    /// The child at `index` returned something else.
    Stopped { index: usize, status: Status },
}

/// Executes `node`'s children from `start` while they return `keep_going`.
fn walk<S>(
    node: &Node<S>,
    start: usize,
    keep_going: Status,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Walk {
    for (index, &child) in node.children.iter().enumerate().skip(start) {
        let status = execute_child(tree, child, ctx);
        if status != keep_going {
            return Walk::Stopped { index, status };
        }
    }
    Walk::Exhausted
}

/// # Semantics
///
/// A `Sequence` node evaluates its children in order, every tick from the
/// first child:
/// - If a child returns anything but `Success`, the sequence **stops
///   immediately** and returns that status
/// - If all children return `Success`, the sequence returns `Success`
pub(crate) fn tick_sequence<S>(
    node: &Node<S>,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    match walk(node, 0, Status::Success, tree, ctx) {
        Walk::Exhausted => Status::Success,
        Walk::Stopped { status, .. } => status,
    }
}

/// # Semantics
///
/// A `Priority` node evaluates its children in order, every tick from the
/// first child:
/// - If a child returns anything but `Failure`, the priority node **stops
///   immediately** and returns that status
/// - If all children return `Failure`, it returns `Failure`
pub(crate) fn tick_priority<S>(
    node: &Node<S>,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    match walk(node, 0, Status::Failure, tree, ctx) {
        Walk::Exhausted => Status::Failure,
        Walk::Stopped { status, .. } => status,
    }
}

/// Resets the resume index when a memorized composite opens.
pub(crate) fn open_memory<S>(id: NodeId, ctx: &mut ExecutionContext<S>) {
    ctx.set_node_value(id, keys::RUNNING_CHILD, 0);
}

fn resume_index<S>(id: NodeId, ctx: &ExecutionContext<S>) -> usize {
    ctx.get_node_value(id, keys::RUNNING_CHILD)
        .as_int()
        .and_then(|index| usize::try_from(index).ok())
        .unwrap_or(0)
}

/// Shared body of the memorized composites: start from the stored index and
/// remember the child that returned `Running`.
fn tick_memorized<S>(
    node: &Node<S>,
    keep_going: Status,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    let start = resume_index(node.id, ctx);
    match walk(node, start, keep_going, tree, ctx) {
        Walk::Exhausted => keep_going,
        Walk::Stopped { index, status } => {
            if status.is_running() {
                ctx.set_node_value(node.id, keys::RUNNING_CHILD, index);
            }
            status
        }
    }
}

/// Like [`tick_sequence`], but children that already succeeded during the
/// current run are skipped on later ticks.
pub(crate) fn tick_mem_sequence<S>(
    node: &Node<S>,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    tick_memorized(node, Status::Success, tree, ctx)
}

/// Like [`tick_priority`], but children that already failed during the
/// current run are skipped on later ticks.
pub(crate) fn tick_mem_priority<S>(
    node: &Node<S>,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    tick_memorized(node, Status::Failure, tree, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeType;
    use crate::testing::{Journal, Scripted, tree_with};

    #[test]
    fn sequence_all_success() {
        let journal = Journal::default();
        let (tree, _) = tree_with(
            NodeType::Sequence,
            vec![
                Scripted::always("a", Status::Success, &journal),
                Scripted::always("b", Status::Success, &journal),
            ],
        );

        let mut ctx = tree.create_instance(());
        assert_eq!(ctx.execute(), Status::Success);
        assert_eq!(journal.ticks(), vec!["a", "b"]);
    }

    #[test]
    fn sequence_fails_on_first_failure() {
        let journal = Journal::default();
        let (tree, _) = tree_with(
            NodeType::Sequence,
            vec![
                Scripted::always("a", Status::Success, &journal),
                Scripted::always("b", Status::Failure, &journal),
                Scripted::always("c", Status::Success, &journal), // Should not execute
            ],
        );

        let mut ctx = tree.create_instance(());
        assert_eq!(ctx.execute(), Status::Failure);
        assert_eq!(journal.ticks(), vec!["a", "b"]);
    }

    #[test]
    fn sequence_restarts_from_first_child_each_tick() {
        let journal = Journal::default();
        let (tree, _) = tree_with(
            NodeType::Sequence,
            vec![
                Scripted::always("a", Status::Success, &journal),
                Scripted::always("b", Status::Running, &journal),
            ],
        );

        let mut ctx = tree.create_instance(());
        assert_eq!(ctx.execute(), Status::Running);
        assert_eq!(ctx.execute(), Status::Running);
        assert_eq!(journal.ticks(), vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn priority_succeeds_on_first_success() {
        let journal = Journal::default();
        let (tree, _) = tree_with(
            NodeType::Priority,
            vec![
                Scripted::always("a", Status::Failure, &journal),
                Scripted::always("b", Status::Success, &journal),
                Scripted::always("c", Status::Success, &journal), // Should not execute
            ],
        );

        let mut ctx = tree.create_instance(());
        assert_eq!(ctx.execute(), Status::Success);
        assert_eq!(journal.ticks(), vec!["a", "b"]);
    }

    #[test]
    fn priority_fails_when_all_fail() {
        let journal = Journal::default();
        let (tree, _) = tree_with(
            NodeType::Priority,
            vec![
                Scripted::always("a", Status::Failure, &journal),
                Scripted::always("b", Status::Failure, &journal),
            ],
        );

        let mut ctx = tree.create_instance(());
        assert_eq!(ctx.execute(), Status::Failure);
    }

    #[test]
    fn error_stops_both_combinators() {
        let journal = Journal::default();
        let (tree, _) = tree_with(
            NodeType::Priority,
            vec![
                Scripted::always("a", Status::Error, &journal),
                Scripted::always("b", Status::Success, &journal),
            ],
        );

        let mut ctx = tree.create_instance(());
        assert_eq!(ctx.execute(), Status::Error);
        assert_eq!(journal.ticks(), vec!["a"]);
    }

    #[test]
    fn empty_composites_return_their_exhausted_status() {
        let (sequence, _) = tree_with(NodeType::Sequence, Vec::new());
        assert_eq!(sequence.create_instance(()).execute(), Status::Success);

        let (priority, _) = tree_with(NodeType::MemPriority, Vec::new());
        assert_eq!(priority.create_instance(()).execute(), Status::Failure);
    }

    #[test]
    fn mem_sequence_resumes_at_running_child() {
        let journal = Journal::default();
        let (tree, composite) = tree_with(
            NodeType::MemSequence,
            vec![
                Scripted::always("a", Status::Success, &journal),
                Scripted::new("b", &[Status::Running, Status::Success], &journal),
                Scripted::always("c", Status::Success, &journal),
            ],
        );

        let mut ctx = tree.create_instance(());
        assert_eq!(ctx.execute(), Status::Running);
        assert_eq!(
            ctx.get_node_value(composite, keys::RUNNING_CHILD).as_int(),
            Some(1)
        );

        assert_eq!(ctx.execute(), Status::Success);
        // "a" is not ticked again on the second tick.
        assert_eq!(journal.ticks(), vec!["a", "b", "b", "c"]);
        assert!(ctx.get_node_value(composite, keys::RUNNING_CHILD).is_nil());
    }

    #[test]
    fn mem_priority_resumes_and_fails_when_exhausted() {
        let journal = Journal::default();
        let (tree, _) = tree_with(
            NodeType::MemPriority,
            vec![
                Scripted::always("a", Status::Failure, &journal),
                Scripted::new("b", &[Status::Running, Status::Failure], &journal),
                Scripted::always("c", Status::Failure, &journal),
            ],
        );

        let mut ctx = tree.create_instance(());
        assert_eq!(ctx.execute(), Status::Running);
        assert_eq!(ctx.execute(), Status::Failure);
        assert_eq!(journal.ticks(), vec!["a", "b", "b", "c"]);
    }
}

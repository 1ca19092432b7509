//! Builder utilities for constructing trees in code.
//!
//! Editors build trees node by node through [`Tree::add_node`] and
//! [`Tree::connect`]. Code that just wants a fixed tree can describe it as a
//! nested [`Blueprint`] instead:
//!
//! ```
//! use behavior_tree::builder::{action, priority, sequence, wait};
//! use behavior_tree::{ExecutionContext, NodeId, Status, Tree};
//! use std::time::Duration;
//!
//! fn flee(_: NodeId, _: &mut ExecutionContext<()>) -> Status {
//!     Status::Success
//! }
//!
//! let tree = Tree::build(priority(vec![
//!     sequence(vec![wait(Duration::from_millis(50)), action("flee", flee)]),
//!     wait(Duration::from_secs(1)),
//! ]))?;
//! assert_eq!(tree.len(), 6);
//! # Ok::<(), behavior_tree::TreeError>(())
//! ```
//!
//! Children of a composite are laid out top to bottom in the order given.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, TreeError};
use crate::node::{BoundBehavior, NodeKind};
use crate::{Behavior, NodeId, Position, Role, Tree};

/// Vertical spacing between the children of a composite.
const ROW_SPACING: i32 = 10;

/// A detached subtree, ready to be inserted into a [`Tree`].
pub struct Blueprint<S> {
    kind: NodeKind<S>,
    children: Vec<Blueprint<S>>,
}

impl<S> Blueprint<S> {
    fn leaf(kind: NodeKind<S>) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    fn wrap(kind: NodeKind<S>, child: Blueprint<S>) -> Self {
        Self {
            kind,
            children: vec![child],
        }
    }

    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Blueprint::node_count).sum::<usize>()
    }
}

#[inline]
pub fn sequence<S>(children: Vec<Blueprint<S>>) -> Blueprint<S> {
    Blueprint {
        kind: NodeKind::Sequence,
        children,
    }
}

#[inline]
pub fn priority<S>(children: Vec<Blueprint<S>>) -> Blueprint<S> {
    Blueprint {
        kind: NodeKind::Priority,
        children,
    }
}

#[inline]
pub fn mem_sequence<S>(children: Vec<Blueprint<S>>) -> Blueprint<S> {
    Blueprint {
        kind: NodeKind::MemSequence,
        children,
    }
}

#[inline]
pub fn mem_priority<S>(children: Vec<Blueprint<S>>) -> Blueprint<S> {
    Blueprint {
        kind: NodeKind::MemPriority,
        children,
    }
}

#[inline]
pub fn inverter<S>(child: Blueprint<S>) -> Blueprint<S> {
    Blueprint::wrap(NodeKind::Inverter, child)
}

#[inline]
pub fn succeeder<S>(child: Blueprint<S>) -> Blueprint<S> {
    Blueprint::wrap(NodeKind::Succeeder, child)
}

/// Runs `child` until it has succeeded `times_repeat` times.
#[inline]
pub fn repeater<S>(times_repeat: u32, child: Blueprint<S>) -> Blueprint<S> {
    Blueprint::wrap(NodeKind::Repeater { times_repeat }, child)
}

/// Runs `child` until it fails.
#[inline]
pub fn repeat_until_fail<S>(child: Blueprint<S>) -> Blueprint<S> {
    Blueprint::wrap(
        NodeKind::RepeatUntilFail {
            times_repeat: 0,
            repeat_forever: true,
        },
        child,
    )
}

/// Runs `child` until it fails or has succeeded `times_repeat` times.
#[inline]
pub fn repeat_until_fail_times<S>(times_repeat: u32, child: Blueprint<S>) -> Blueprint<S> {
    Blueprint::wrap(
        NodeKind::RepeatUntilFail {
            times_repeat,
            repeat_forever: false,
        },
        child,
    )
}

#[inline]
pub fn max_time<S>(max_time: Duration, child: Blueprint<S>) -> Blueprint<S> {
    Blueprint::wrap(NodeKind::MaxTime { max_time }, child)
}

#[inline]
pub fn wait<S>(time_delay: Duration) -> Blueprint<S> {
    Blueprint::leaf(NodeKind::Wait { time_delay })
}

pub fn action<S>(name: impl Into<String>, behavior: impl Behavior<S> + 'static) -> Blueprint<S> {
    let bound = BoundBehavior::new(name, Arc::new(behavior));
    Blueprint::leaf(NodeKind::Action(Some(bound)))
}

pub fn condition<S>(name: impl Into<String>, behavior: impl Behavior<S> + 'static) -> Blueprint<S> {
    let bound = BoundBehavior::new(name, Arc::new(behavior));
    Blueprint::leaf(NodeKind::Condition(Some(bound)))
}

impl<S> Tree<S> {
    /// Creates a tree whose root runs `blueprint`.
    pub fn build(blueprint: Blueprint<S>) -> Result<Self> {
        let mut tree = Self::new();
        let child = tree.insert_blueprint(blueprint)?;
        tree.wire(tree.root, child);
        Ok(tree)
    }

    /// Inserts `blueprint` as a new subtree under `parent` and returns the
    /// id of its top node. A decorator or root parent drops its current
    /// child, as with [`connect`](Self::connect).
    pub fn attach(&mut self, parent: NodeId, blueprint: Blueprint<S>) -> Result<NodeId> {
        let parent_node = self.node(parent)?;
        if !parent_node.role().takes_children() {
            return Err(TreeError::NotAParent {
                id: parent,
                node_type: parent_node.node_type(),
            });
        }
        let top = self.insert_blueprint(blueprint)?;
        self.connect(parent, top)?;
        Ok(top)
    }

    /// Inserts fresh nodes for the whole subtree, wired to each other but
    /// not to anything already in the tree.
    fn insert_blueprint(&mut self, blueprint: Blueprint<S>) -> Result<NodeId> {
        let Blueprint { kind, children } = blueprint;
        let id = self.insert_kind(kind)?;
        let composite = self.nodes.get(&id).is_some_and(|n| n.role() == Role::Composite);

        let mut y = 0i32;
        for child in children {
            let child = self.insert_blueprint(child)?;
            if composite && let Some(node) = self.nodes.get_mut(&child) {
                node.position = Position::new(0, y);
                y = y.saturating_add(ROW_SPACING);
            }
            self.wire(id, child);
        }
        Ok(id)
    }

    /// Links two nodes known to satisfy every structural rule.
    fn wire(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExecutionContext, Node, NodeType, Status};

    fn hit(_: NodeId, _: &mut ExecutionContext<()>) -> Status {
        Status::Success
    }

    fn miss(_: NodeId, _: &mut ExecutionContext<()>) -> Status {
        Status::Failure
    }

    #[test]
    fn build_lays_out_children_in_order() {
        let tree = Tree::build(sequence(vec![
            action("first", hit),
            inverter(condition("second", miss)),
            wait(Duration::ZERO),
        ])).unwrap();

        let seq = tree.children(tree.root_id())[0];
        let kinds: Vec<_> = tree
            .children(seq)
            .iter()
            .filter_map(|&id| tree.get_node(id).map(Node::node_type))
            .collect();
        assert_eq!(kinds, vec![NodeType::Action, NodeType::Inverter, NodeType::Wait]);

        let ys: Vec<_> = tree
            .children(seq)
            .iter()
            .filter_map(|&id| tree.get_node(id).map(|n| n.position().y))
            .collect();
        assert_eq!(ys, vec![0, 10, 20]);
    }

    #[test]
    fn built_tree_executes() {
        let tree = Tree::build(sequence(vec![
            action("hit", hit),
            inverter(condition("miss", miss)),
        ])).unwrap();
        let shared = tree.into_shared();
        assert_eq!(shared.create_instance(()).execute(), Status::Success);
    }

    #[test]
    fn parameters_are_carried_over() {
        let tree: Tree<()> = Tree::build(repeat_until_fail_times(3, max_time(
            Duration::from_secs(2),
            repeater(4, wait(Duration::from_millis(5))),
        ))).unwrap();

        let until_fail = tree.children(tree.root_id())[0];
        let node = tree.get_node(until_fail).unwrap();
        assert_eq!(node.times_repeat(), Some(3));
        assert_eq!(node.repeat_forever(), Some(false));

        let timeout = node.child().unwrap();
        assert_eq!(tree.get_node(timeout).and_then(Node::max_time), Some(Duration::from_secs(2)));
    }

    #[test]
    fn attach_extends_an_existing_tree() {
        let mut tree = Tree::build(mem_priority(vec![action("hit", hit)])).unwrap();
        let priority = tree.children(tree.root_id())[0];

        let blueprint = succeeder(action("miss", miss));
        assert_eq!(blueprint.node_count(), 2);
        let top = tree.attach(priority, blueprint).unwrap();
        assert_eq!(tree.children(priority).len(), 2);
        assert_eq!(tree.get_node(top).and_then(Node::parent), Some(priority));

        let leaf = tree.children(top)[0];
        let before = tree.len();
        assert!(matches!(
            tree.attach(leaf, wait(Duration::ZERO)),
            Err(TreeError::NotAParent { .. })
        ));
        assert_eq!(tree.len(), before);
    }
}

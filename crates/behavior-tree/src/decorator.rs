//! Decorator behavior nodes.
//!
//! Decorators wrap a single child and modify its result or execution. The
//! root node shares their shape: it simply forwards to its child. A decorator
//! without a child returns `Status::Error`.

use std::time::Duration;

use crate::node::{execute_child, keys};
use crate::{ExecutionContext, Node, NodeId, Status, Tree};

fn missing_child<S>(node: &Node<S>) -> Status {
    tracing::warn!(
        node = %node.id,
        node_type = %node.node_type(),
        "decorator has no child"
    );
    Status::Error
}

/// Executes the child of `node` and maps its status, or reports `Error` if
/// the node has none.
fn with_child<S>(
    node: &Node<S>,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
    map: impl FnOnce(Status) -> Status,
) -> Status {
    match node.child() {
        Some(child) => map(execute_child(tree, child, ctx)),
        None => missing_child(node),
    }
}

pub(crate) fn tick_root<S>(node: &Node<S>, tree: &Tree<S>, ctx: &mut ExecutionContext<S>) -> Status {
    with_child(node, tree, ctx, |status| status)
}

/// - If the child returns `Success`, the inverter returns `Failure`
/// - If the child returns `Failure`, the inverter returns `Success`
/// - `Running` and `Error` pass through
pub(crate) fn tick_inverter<S>(
    node: &Node<S>,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    with_child(node, tree, ctx, Status::invert)
}

/// Turns `Failure` into `Success`; `Running` and `Error` pass through.
pub(crate) fn tick_succeeder<S>(
    node: &Node<S>,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    with_child(node, tree, ctx, |status| match status {
        Status::Failure => Status::Success,
        other => other,
    })
}

pub(crate) fn reset_counter<S>(id: NodeId, ctx: &mut ExecutionContext<S>) {
    ctx.set_node_value(id, keys::COUNTER, 0);
}

fn counter<S>(id: NodeId, ctx: &ExecutionContext<S>) -> u32 {
    ctx.get_node_value(id, keys::COUNTER)
        .as_int()
        .and_then(|i| u32::try_from(i).ok())
        .unwrap_or(0)
}

/// Repeats its child while it succeeds, up to `times_repeat` completions.
///
/// The completion count lives on the node-scope blackboard, so a child that
/// returns `Running` resumes the same iteration on the next tick. Any
/// non-`Success` child result is returned immediately.
pub(crate) fn tick_repeater<S>(
    node: &Node<S>,
    times_repeat: u32,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    let Some(child) = node.child() else {
        return missing_child(node);
    };

    let mut completed = counter(node.id, ctx);
    while completed < times_repeat {
        let status = execute_child(tree, child, ctx);
        if !status.is_success() {
            ctx.set_node_value(node.id, keys::COUNTER, completed);
            return status;
        }
        completed += 1;
    }

    Status::Success
}

/// Ticks its child until it fails, then succeeds.
///
/// The loop is bounded three ways:
/// - a `Running` or `Error` child result is returned as-is
/// - with `repeat_forever` off, `times_repeat` successes end the loop with
///   `Success`
/// - after `max_loop_iterations` child executions in one tick the node yields
///   `Running`, keeping its success count for the next tick
pub(crate) fn tick_repeat_until_fail<S>(
    node: &Node<S>,
    times_repeat: u32,
    repeat_forever: bool,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    let Some(child) = node.child() else {
        return missing_child(node);
    };

    let mut successes = counter(node.id, ctx);
    let finished = |successes: u32| !repeat_forever && successes >= times_repeat;
    if finished(successes) {
        return Status::Success;
    }

    for _ in 0..tree.config().max_loop_iterations.max(1) {
        match execute_child(tree, child, ctx) {
            Status::Failure => return Status::Success,
            Status::Success => {
                successes = successes.saturating_add(1);
                if finished(successes) {
                    return Status::Success;
                }
            }
            Status::Running => {
                ctx.set_node_value(node.id, keys::COUNTER, successes);
                return Status::Running;
            }
            Status::Error => return Status::Error,
        }
    }

    tracing::debug!(
        node = %node.id,
        successes,
        "repeat-until-fail used its iteration budget, yielding"
    );
    ctx.set_node_value(node.id, keys::COUNTER, successes);
    Status::Running
}

/// Ticks its child once and fails if more than `max_time` has passed since
/// the node opened.
///
/// The time is sampled before the child runs, and once the limit is exceeded
/// the node reports `Failure` whatever the child returned, `Success`
/// included.
pub(crate) fn tick_max_time<S>(
    node: &Node<S>,
    max_time: Duration,
    tree: &Tree<S>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    let Some(child) = node.child() else {
        return missing_child(node);
    };

    let elapsed = ctx.elapsed_since_open(node.id);
    let status = execute_child(tree, child, ctx);
    if elapsed > max_time {
        tracing::debug!(
            node = %node.id,
            elapsed_us = elapsed.as_micros() as u64,
            child_status = %status,
            "time limit exceeded"
        );
        return Status::Failure;
    }

    status
}

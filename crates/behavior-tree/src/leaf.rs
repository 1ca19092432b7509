//! Leaf nodes: the built-in `Wait` action and user-bound actions/conditions.

use std::time::Duration;

use crate::node::BoundBehavior;
use crate::{ExecutionContext, Node, NodeId, Status};

/// `Running` until `time_delay` has passed since the node opened, then
/// `Success`.
pub(crate) fn tick_wait<S>(id: NodeId, time_delay: Duration, ctx: &mut ExecutionContext<S>) -> Status {
    if ctx.elapsed_since_open(id) < time_delay {
        Status::Running
    } else {
        Status::Success
    }
}

/// Delegates to the bound behavior; an unbound leaf is a configuration error.
pub(crate) fn tick_behavior<S>(
    node: &Node<S>,
    bound: Option<&BoundBehavior<S>>,
    ctx: &mut ExecutionContext<S>,
) -> Status {
    match bound {
        Some(bound) => bound.behavior.tick(node.id, ctx),
        None => {
            tracing::warn!(
                node = %node.id,
                node_type = %node.node_type(),
                "leaf has no behavior bound"
            );
            Status::Error
        }
    }
}

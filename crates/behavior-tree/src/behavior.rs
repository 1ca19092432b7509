//! User-defined leaf behavior.
//!
//! This module defines the [`Behavior`] trait, the extension point for
//! `Action` and `Condition` leaves. The trait is generic over the subject type
//! `S` carried by each [`ExecutionContext`], which is how a leaf reaches the
//! entity it controls.

use crate::{ExecutionContext, NodeId, Status};

/// The hooks a leaf node runs during its lifecycle.
///
/// Only [`tick`](Behavior::tick) is required. The other hooks default to
/// no-ops and are called in the order enter → open → tick → close → exit, with
/// `open` skipped while the node is still open from a previous tick and
/// `close` skipped while the node keeps returning `Running`.
///
/// A behavior is shared by every context built on the tree, so any per-run
/// state belongs on the context's node-scope blackboard under `node`, not in
/// `self`.
pub trait Behavior<S>: Send + Sync {
    /// Runs every time the node is visited, before anything else.
    fn enter(&self, _node: NodeId, _ctx: &mut ExecutionContext<S>) {}

    /// Runs when the node transitions from closed to open.
    fn open(&self, _node: NodeId, _ctx: &mut ExecutionContext<S>) {}

    /// Performs the behavior and reports its status.
    ///
    /// # Arguments
    ///
    /// * `node` - Id of the leaf being ticked, for node-scope blackboard keys.
    /// * `ctx` - The execution context; exposes the subject and blackboards.
    fn tick(&self, node: NodeId, ctx: &mut ExecutionContext<S>) -> Status;

    /// Runs when the node finishes or is abandoned as an orphan.
    fn close(&self, _node: NodeId, _ctx: &mut ExecutionContext<S>) {}

    /// Runs every time the node is visited, after everything else.
    fn exit(&self, _node: NodeId, _ctx: &mut ExecutionContext<S>) {}
}

/// Plain functions and closures work as tick-only behaviors.
impl<S, F> Behavior<S> for F
where
    F: Fn(NodeId, &mut ExecutionContext<S>) -> Status + Send + Sync,
{
    #[inline]
    fn tick(&self, node: NodeId, ctx: &mut ExecutionContext<S>) -> Status {
        self(node, ctx)
    }
}

//! Execution contexts: one stateful run of a shared tree.
//!
//! A tree definition is immutable while it ticks and can back any number of
//! contexts, one per controlled subject. Each [`ExecutionContext`] owns the
//! state that differs between those runs:
//!
//! - the subject handle, passed to leaf behaviors untouched
//! - the [`Blackboard`] (context scope and node scope)
//! - the open set: nodes that returned `Running` and still await `close`
//! - the clock used by timed nodes
//!
//! # Orphans
//!
//! Composites can silently abandon a running branch, e.g. a `Priority` whose
//! earlier child starts succeeding again. Nodes in that branch are still open
//! but are never visited, so they would never close. [`execute`] therefore
//! copies the open set before ticking, strikes every node it visits, and
//! closes whatever is left afterwards.
//!
//! [`execute`]: ExecutionContext::execute

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::duration_micros;
use crate::node::{execute_child, keys};
use crate::{Blackboard, Clock, MonotonicClock, NodeId, SharedTree, Status, Value};

pub struct ExecutionContext<S> {
    tree: SharedTree<S>,
    subject: S,
    blackboard: Blackboard,
    open: BTreeSet<NodeId>,
    orphans: BTreeSet<NodeId>,
    clock: Arc<dyn Clock>,
    ticks: u64,
}

impl<S> ExecutionContext<S> {
    pub(crate) fn new(tree: SharedTree<S>, subject: S) -> Self {
        Self {
            tree,
            subject,
            blackboard: Blackboard::new(),
            open: BTreeSet::new(),
            orphans: BTreeSet::new(),
            clock: Arc::new(MonotonicClock::new()),
            ticks: 0,
        }
    }

    /// Replaces the time source used by `Wait` and `MaxTime` nodes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Runs one tick from the tree's root and returns the root's status.
    ///
    /// Nodes that were open before this tick but were not visited during it
    /// are closed afterwards, in ascending id order. If the tree lock is
    /// poisoned the tick is skipped and `Error` is returned.
    pub fn execute(&mut self) -> Status {
        let shared = Arc::clone(self.tree.inner());
        let Ok(tree) = shared.read() else {
            tracing::error!("behavior tree lock poisoned, skipping tick");
            return Status::Error;
        };

        self.ticks += 1;
        self.orphans.clone_from(&self.open);

        let status = execute_child(&tree, tree.root_id(), self);

        let orphans = std::mem::take(&mut self.orphans);
        for id in orphans {
            match tree.get_node(id) {
                Some(node) => {
                    tracing::debug!(node = %id, node_type = %node.node_type(), "closing orphan");
                    node.close(self);
                }
                None => {
                    tracing::debug!(node = %id, "dropping orphan removed from tree");
                    self.open.remove(&id);
                    self.blackboard.clear_node(id);
                }
            }
        }

        tracing::debug!(tick = self.ticks, %status, open = self.open.len(), "tick complete");
        status
    }

    pub fn tree(&self) -> &SharedTree<S> {
        &self.tree
    }

    pub fn subject(&self) -> &S {
        &self.subject
    }

    pub fn subject_mut(&mut self) -> &mut S {
        &mut self.subject
    }

    /// Swaps in a new subject and returns the previous one.
    pub fn set_subject(&mut self, subject: S) -> S {
        std::mem::replace(&mut self.subject, subject)
    }

    /// Number of completed [`execute`](Self::execute) calls.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_node_open(&self, id: NodeId) -> bool {
        self.open.contains(&id)
    }

    /// Ids of the currently open nodes, ascending.
    pub fn open_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.open.iter().copied()
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn set_inst_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.blackboard.set_inst_value(name, value);
    }

    pub fn get_inst_value(&self, name: &str) -> &Value {
        self.blackboard.get_inst_value(name)
    }

    pub fn clear_inst_value(&mut self, name: &str) {
        self.blackboard.clear_inst_value(name);
    }

    pub fn set_node_value(&mut self, node: NodeId, name: impl Into<String>, value: impl Into<Value>) {
        self.blackboard.set_node_value(node, name, value);
    }

    pub fn get_node_value(&self, node: NodeId, name: &str) -> &Value {
        self.blackboard.get_node_value(node, name)
    }

    pub fn clear_node_value(&mut self, node: NodeId, name: &str) {
        self.blackboard.clear_node_value(node, name);
    }

    // Lifecycle bookkeeping, called by `Node`.

    pub(crate) fn enter_node(&mut self, id: NodeId) {
        self.orphans.remove(&id);
    }

    pub(crate) fn open_node(&mut self, id: NodeId) {
        self.open.insert(id);
    }

    pub(crate) fn close_node(&mut self, id: NodeId) {
        self.open.remove(&id);
    }

    fn now_micros(&self) -> i64 {
        i64::try_from(duration_micros(self.clock.now())).unwrap_or(i64::MAX)
    }

    /// Records the current time as `id`'s start time.
    pub(crate) fn start_timer(&mut self, id: NodeId) {
        let now = self.now_micros();
        self.set_node_value(id, keys::START_TIME, now);
    }

    /// Time since `id` started its timer; zero if it has none.
    pub(crate) fn elapsed_since_open(&self, id: NodeId) -> Duration {
        let now = self.now_micros();
        let start = self
            .get_node_value(id, keys::START_TIME)
            .as_int()
            .unwrap_or(now);
        Duration::from_micros(u64::try_from(now.saturating_sub(start)).unwrap_or(0))
    }
}

//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{Behavior, ExecutionContext, NodeId, NodeType, Position, SharedTree, Status, Tree};

/// Ordered record of hook calls made by [`Scripted`] leaves.
#[derive(Clone, Default)]
pub(crate) struct Journal {
    events: Arc<Mutex<Vec<(String, &'static str)>>>,
}

impl Journal {
    fn record(&self, name: &str, hook: &'static str) {
        self.events
            .lock()
            .expect("journal lock")
            .push((name.to_owned(), hook));
    }

    /// Names of the leaves that ran `hook`, in call order.
    pub(crate) fn calls(&self, hook: &str) -> Vec<String> {
        self.events
            .lock()
            .expect("journal lock")
            .iter()
            .filter(|(_, h)| *h == hook)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub(crate) fn ticks(&self) -> Vec<String> {
        self.calls("tick")
    }

    pub(crate) fn closes(&self) -> Vec<String> {
        self.calls("close")
    }
}

/// A leaf that replays a fixed list of results, repeating the last one.
pub(crate) struct Scripted {
    name: &'static str,
    script: Vec<Status>,
    calls: AtomicUsize,
    journal: Journal,
}

impl Scripted {
    pub(crate) fn new(name: &'static str, script: &[Status], journal: &Journal) -> Self {
        assert!(!script.is_empty(), "script needs at least one status");
        Self {
            name,
            script: script.to_vec(),
            calls: AtomicUsize::new(0),
            journal: journal.clone(),
        }
    }

    pub(crate) fn always(name: &'static str, status: Status, journal: &Journal) -> Self {
        Self::new(name, &[status], journal)
    }
}

impl<S> Behavior<S> for Scripted {
    fn enter(&self, _node: NodeId, _ctx: &mut ExecutionContext<S>) {
        self.journal.record(self.name, "enter");
    }

    fn open(&self, _node: NodeId, _ctx: &mut ExecutionContext<S>) {
        self.journal.record(self.name, "open");
    }

    fn tick(&self, _node: NodeId, _ctx: &mut ExecutionContext<S>) -> Status {
        self.journal.record(self.name, "tick");
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.script[call.min(self.script.len() - 1)]
    }

    fn close(&self, _node: NodeId, _ctx: &mut ExecutionContext<S>) {
        self.journal.record(self.name, "close");
    }

    fn exit(&self, _node: NodeId, _ctx: &mut ExecutionContext<S>) {
        self.journal.record(self.name, "exit");
    }
}

/// Builds `Root -> parent(node_type) -> leaves`, leaves ordered as given.
///
/// Returns the shared tree and the id of the `node_type` node.
pub(crate) fn tree_with(node_type: NodeType, leaves: Vec<Scripted>) -> (SharedTree<()>, NodeId) {
    let mut tree = Tree::new();
    let parent = tree.add_node(node_type).expect("add parent");
    tree.connect(tree.root_id(), parent).expect("attach to root");

    for (index, leaf) in leaves.into_iter().enumerate() {
        let name = leaf.name;
        let id = tree.add_action(name, leaf).expect("add leaf");
        let y = i32::try_from(index).expect("small index") * 10;
        tree.set_position(id, Position::new(0, y)).expect("position");
        tree.connect(parent, id).expect("attach leaf");
    }

    (SharedTree::new(tree), parent)
}

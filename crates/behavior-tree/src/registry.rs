//! Named leaf behaviors available to a tree.
//!
//! A [`Registry`] maps names to action and condition behaviors so nodes can
//! be created by type name ([`Tree::add_named_node`](crate::Tree::add_named_node))
//! and snapshots can be loaded back into live trees. It is an ordinary value:
//! build one, wrap it in an `Arc`, and hand it to the trees that need it.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, TreeError};
use crate::node::{BoundBehavior, NodeKind};
use crate::{Behavior, NodeType};

struct Entry<S> {
    node_type: NodeType,
    behavior: Arc<dyn Behavior<S>>,
}

pub struct Registry<S> {
    entries: BTreeMap<String, Entry<S>>,
}

impl<S> Registry<S> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn register_action(
        &mut self,
        name: impl Into<String>,
        behavior: impl Behavior<S> + 'static,
    ) -> Result<()> {
        self.register(name.into(), NodeType::Action, Arc::new(behavior))
    }

    pub fn register_condition(
        &mut self,
        name: impl Into<String>,
        behavior: impl Behavior<S> + 'static,
    ) -> Result<()> {
        self.register(name.into(), NodeType::Condition, Arc::new(behavior))
    }

    /// Names may not shadow a built-in node type or an earlier registration.
    fn register(
        &mut self,
        name: String,
        node_type: NodeType,
        behavior: Arc<dyn Behavior<S>>,
    ) -> Result<()> {
        if NodeType::from_str(&name).is_ok() || self.entries.contains_key(&name) {
            return Err(TreeError::DuplicateRegistration(name));
        }
        tracing::debug!(%name, %node_type, "behavior registered");
        self.entries.insert(name, Entry { node_type, behavior });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Leaf type (`Action` or `Condition`) a name was registered as.
    pub fn node_type(&self, name: &str) -> Option<NodeType> {
        self.entries.get(name).map(|entry| entry.node_type)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn bound(&self, name: &str) -> Option<BoundBehavior<S>> {
        self.entries
            .get(name)
            .map(|entry| BoundBehavior::new(name, Arc::clone(&entry.behavior)))
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<NodeKind<S>> {
        let node_type = self.node_type(name)?;
        let bound = self.bound(name);
        match node_type {
            NodeType::Condition => Some(NodeKind::Condition(bound)),
            _ => Some(NodeKind::Action(bound)),
        }
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

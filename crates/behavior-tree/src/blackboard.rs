//! Two-scope scratch storage owned by an execution context.
//!
//! The instance scope holds values shared by every node of one context (e.g.
//! world state observed for the subject). The node scope is keyed by
//! [`NodeId`] and holds per-node bookkeeping such as the child a memorized
//! composite resumes from.

use std::collections::HashMap;

use crate::node::NodeId;
use crate::value::{NIL, Value};

#[derive(Debug, Default, Clone)]
pub struct Blackboard {
    instance: HashMap<String, Value>,
    nodes: HashMap<NodeId, HashMap<String, Value>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_inst_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.instance.insert(name.into(), value.into());
    }

    /// Returns [`Value::Nil`] when the key is unset.
    pub fn get_inst_value(&self, name: &str) -> &Value {
        self.instance.get(name).unwrap_or(&NIL)
    }

    pub fn clear_inst_value(&mut self, name: &str) {
        self.instance.remove(name);
    }

    pub fn set_node_value(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.nodes
            .entry(node)
            .or_default()
            .insert(name.into(), value.into());
    }

    /// Returns [`Value::Nil`] when the node has no value under `name`.
    pub fn get_node_value(&self, node: NodeId, name: &str) -> &Value {
        self.nodes
            .get(&node)
            .and_then(|values| values.get(name))
            .unwrap_or(&NIL)
    }

    pub fn clear_node_value(&mut self, node: NodeId, name: &str) {
        if let Some(values) = self.nodes.get_mut(&node) {
            values.remove(name);
            if values.is_empty() {
                self.nodes.remove(&node);
            }
        }
    }

    /// Drops every node-scope value of `node`.
    pub fn clear_node(&mut self, node: NodeId) {
        self.nodes.remove(&node);
    }

    /// Number of nodes that currently hold node-scope values.
    pub fn node_scope_len(&self) -> usize {
        self.nodes.len()
    }
}

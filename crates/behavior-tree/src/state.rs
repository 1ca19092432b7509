//! Property bags and snapshots.
//!
//! [`NodeState`] captures everything configurable about one node so an
//! editor can restore it after an undo; [`TreeSnapshot`] is the minimal
//! persisted form of a whole tree. Parameters travel as named [`Value`]s:
//!
//! | Property | Node types | Value |
//! |---|---|---|
//! | `times_repeat` | Repeater, RepeatUntilFail | non-negative int |
//! | `repeat_forever` | RepeatUntilFail | bool |
//! | `max_time` | MaxTime | seconds, non-negative number |
//! | `time_delay` | Wait | seconds, non-negative number |
//! | `behavior` | Action, Condition | registered behavior name |

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, TreeError};
use crate::node::NodeKind;
use crate::{Node, NodeId, NodeType, Position, Registry, Role, Tree, TreeConfig, Value};

pub const TIMES_REPEAT: &str = "times_repeat";
pub const REPEAT_FOREVER: &str = "repeat_forever";
pub const MAX_TIME: &str = "max_time";
pub const TIME_DELAY: &str = "time_delay";
pub const BEHAVIOR: &str = "behavior";

pub type Params = BTreeMap<String, Value>;

/// Everything needed to restore one node in place.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeState {
    pub node_type: NodeType,
    pub position: Position,
    pub children: Vec<NodeId>,
    pub params: Params,
}

/// Persisted form of one node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRecord {
    pub id: NodeId,
    pub node_type: NodeType,
    pub position: Position,
    pub params: Params,
}

/// A parent → child edge. The child is the destination; both slots are 0
/// since every node has a single input and a single output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Connection {
    pub dst_id: NodeId,
    pub dst_slot: u32,
    pub src_id: NodeId,
    pub src_slot: u32,
}

impl Connection {
    pub fn new(parent: NodeId, child: NodeId) -> Self {
        Self {
            dst_id: child,
            dst_slot: 0,
            src_id: parent,
            src_slot: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeSnapshot {
    pub root: NodeId,
    pub next_id: u32,
    pub config: TreeConfig,
    pub nodes: Vec<NodeRecord>,
    /// Listed parent by parent in child order, so replaying them in order
    /// reproduces the order of equal-key children.
    pub connections: Vec<Connection>,
}

fn params_of<S>(kind: &NodeKind<S>) -> Params {
    let mut params = Params::new();
    match kind {
        NodeKind::Repeater { times_repeat } => {
            params.insert(TIMES_REPEAT.to_owned(), Value::from(*times_repeat));
        }
        NodeKind::RepeatUntilFail {
            times_repeat,
            repeat_forever,
        } => {
            params.insert(TIMES_REPEAT.to_owned(), Value::from(*times_repeat));
            params.insert(REPEAT_FOREVER.to_owned(), Value::from(*repeat_forever));
        }
        NodeKind::MaxTime { max_time } => {
            params.insert(MAX_TIME.to_owned(), Value::from(max_time.as_secs_f64()));
        }
        NodeKind::Wait { time_delay } => {
            params.insert(TIME_DELAY.to_owned(), Value::from(time_delay.as_secs_f64()));
        }
        NodeKind::Action(Some(bound)) | NodeKind::Condition(Some(bound)) => {
            params.insert(BEHAVIOR.to_owned(), Value::from(bound.name()));
        }
        _ => {}
    }
    params
}

fn invalid(name: &str, reason: impl Into<String>) -> TreeError {
    TreeError::InvalidProperty {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

fn as_count(name: &str, value: &Value) -> Result<u32> {
    let raw = value
        .as_int()
        .ok_or_else(|| invalid(name, format!("expected int, got {}", value.kind())))?;
    u32::try_from(raw).map_err(|_| invalid(name, format!("{raw} is out of range")))
}

fn as_flag(name: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| invalid(name, format!("expected bool, got {}", value.kind())))
}

fn as_seconds(name: &str, value: &Value) -> Result<Duration> {
    let secs = value
        .as_float()
        .ok_or_else(|| invalid(name, format!("expected seconds, got {}", value.kind())))?;
    Duration::try_from_secs_f64(secs).map_err(|err| invalid(name, err.to_string()))
}

/// Returns `kind` with `params` applied, or an error if any entry is unknown
/// or ill-typed. Behavior names resolve through `registry`; a name equal to
/// the current binding keeps it.
fn apply_params<S>(
    mut kind: NodeKind<S>,
    params: &Params,
    registry: &Registry<S>,
) -> Result<NodeKind<S>> {
    let node_type = kind.node_type();
    for (name, value) in params {
        match (&mut kind, name.as_str()) {
            (NodeKind::Repeater { times_repeat }, TIMES_REPEAT)
            | (NodeKind::RepeatUntilFail { times_repeat, .. }, TIMES_REPEAT) => {
                *times_repeat = as_count(name, value)?;
            }
            (NodeKind::RepeatUntilFail { repeat_forever, .. }, REPEAT_FOREVER) => {
                *repeat_forever = as_flag(name, value)?;
            }
            (NodeKind::MaxTime { max_time }, MAX_TIME) => {
                *max_time = as_seconds(name, value)?;
            }
            (NodeKind::Wait { time_delay }, TIME_DELAY) => {
                *time_delay = as_seconds(name, value)?;
            }
            (NodeKind::Action(bound), BEHAVIOR) | (NodeKind::Condition(bound), BEHAVIOR) => {
                let wanted = value
                    .as_str()
                    .ok_or_else(|| invalid(name, format!("expected string, got {}", value.kind())))?;
                let keep = bound.as_ref().is_some_and(|b| b.name() == wanted);
                if !keep {
                    match registry.node_type(wanted) {
                        Some(registered) if registered == node_type => {
                            *bound = registry.bound(wanted);
                        }
                        Some(registered) => {
                            return Err(invalid(
                                name,
                                format!("`{wanted}` is registered as {registered}"),
                            ));
                        }
                        None => return Err(TreeError::UnknownNodeType(wanted.to_owned())),
                    }
                }
            }
            _ => {
                return Err(TreeError::UnknownProperty {
                    node_type,
                    name: name.clone(),
                });
            }
        }
    }
    Ok(kind)
}

impl<S> Tree<S> {
    /// Captures a node's type, position, children and parameters.
    pub fn get_state(&self, id: NodeId) -> Result<NodeState> {
        let node = self.node(id)?;
        Ok(NodeState {
            node_type: node.node_type(),
            position: node.position,
            children: node.children.clone(),
            params: params_of(&node.kind),
        })
    }

    /// Restores a node from a bag produced by [`get_state`](Self::get_state).
    ///
    /// The node keeps its parent. Its current children are detached and the
    /// listed ones attached, which requires them to be free or already
    /// children of this node. Nothing changes unless the whole bag is valid.
    pub fn set_state(&mut self, id: NodeId, state: &NodeState) -> Result<()> {
        let node = self.node(id)?;
        let actual = node.node_type();
        if state.node_type != actual {
            return Err(TreeError::TypeMismatch {
                id,
                expected: state.node_type.into(),
                actual,
            });
        }

        let kind = apply_params(node.kind.clone(), &state.params, &self.registry)?;
        self.check_children(id, actual.role(), &state.children)?;

        let previous = std::mem::take(&mut self.node_mut(id)?.children);
        for child in previous {
            if let Some(child) = self.nodes.get_mut(&child) {
                child.parent = None;
            }
        }
        for &child in &state.children {
            self.node_mut(child)?.parent = Some(id);
        }

        let node = self.node_mut(id)?;
        node.kind = kind;
        node.position = state.position;
        node.children = state.children.clone();
        let parent = node.parent;

        self.sort_children(id);
        if let Some(parent) = parent {
            self.sort_children(parent);
        }
        tracing::debug!(node = %id, "node state restored");
        Ok(())
    }

    /// Validates a replacement child list for `id`.
    fn check_children(&self, id: NodeId, role: Role, children: &[NodeId]) -> Result<()> {
        let node_type = self.node(id)?.node_type();
        if let Some(max) = role.max_children()
            && children.len() > max
        {
            return Err(TreeError::NotAParent { id, node_type });
        }

        let mut seen = BTreeSet::new();
        for &child in children {
            let child_node = self.node(child)?;
            if child == self.root || child_node.role() == Role::Root {
                return Err(TreeError::RootAsChild(child));
            }
            if !seen.insert(child) {
                return Err(TreeError::AlreadyAttached { child, parent: id });
            }
            if let Some(parent) = child_node.parent
                && parent != id
            {
                return Err(TreeError::AlreadyAttached { child, parent });
            }
            if self.is_ancestor(child, id) {
                return Err(TreeError::Cycle { parent: id, child });
            }
        }
        Ok(())
    }

    /// Captures the whole tree in persistable form.
    pub fn snapshot(&self) -> TreeSnapshot {
        let nodes = self
            .nodes
            .values()
            .map(|node| NodeRecord {
                id: node.id,
                node_type: node.node_type(),
                position: node.position,
                params: params_of(&node.kind),
            })
            .collect();

        let connections = self
            .nodes
            .values()
            .flat_map(|node| {
                node.children
                    .iter()
                    .map(move |&child| Connection::new(node.id, child))
            })
            .collect();

        TreeSnapshot {
            root: self.root,
            next_id: self.next_id,
            config: self.config.clone(),
            nodes,
            connections,
        }
    }

    /// Rebuilds a tree from a snapshot. Action and condition behaviors are
    /// looked up by name in `registry`, which the new tree keeps.
    pub fn from_snapshot(snapshot: &TreeSnapshot, registry: Arc<Registry<S>>) -> Result<Self> {
        let mut tree = Self::empty(snapshot.config.clone(), registry);

        for record in &snapshot.nodes {
            let kind = apply_params(
                NodeKind::new(record.node_type),
                &record.params,
                &tree.registry,
            )?;
            tree.insert_kind_with_id(record.id, kind)?;
            tree.node_mut(record.id)?.position = record.position;
        }
        tree.next_id = tree.next_id.max(snapshot.next_id);

        tree.set_root(snapshot.root)?;
        for connection in &snapshot.connections {
            let parent = tree.node(connection.src_id)?;
            if let Some(existing) = parent.child() {
                return Err(TreeError::ChildSlotTaken {
                    parent: connection.src_id,
                    existing,
                });
            }
            tree.connect(connection.src_id, connection.dst_id)?;
        }

        tracing::debug!(nodes = tree.len(), root = %tree.root, "tree loaded from snapshot");
        Ok(tree)
    }
}

impl<S> Node<S> {
    /// The node's parameters as a property bag.
    pub fn params(&self) -> Params {
        params_of(&self.kind)
    }
}

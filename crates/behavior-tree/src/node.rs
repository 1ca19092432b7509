//! Tree nodes and their execution lifecycle.
//!
//! A [`Node`] is plain data owned by its [`Tree`]: identity, ordering key,
//! parent and child ids, and a kind with its parameters. Nodes never point
//! back at the tree; execution passes the tree in and children are resolved
//! by id.
//!
//! Every execution runs the fixed sequence enter → open → tick → close → exit
//! (see [`Node::execute`]). The per-kind tick rules live in the `composite`,
//! `decorator` and `leaf` modules.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Behavior, ExecutionContext, Status, Tree, composite, decorator, leaf};

/// Node-scope blackboard keys used by the built-in nodes.
pub(crate) mod keys {
    /// Index of the child a memorized composite resumes from.
    pub const RUNNING_CHILD: &str = "running_child";
    /// Completed iterations of a repeating decorator.
    pub const COUNTER: &str = "i";
    /// Clock reading (microseconds) taken when a timed node opened.
    pub const START_TIME: &str = "start_time";
}

/// Identifier of a node within its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    /// Id of the root node every new tree starts with.
    pub const ROOT: Self = Self(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Layout coordinate of a node.
///
/// Only `y` affects execution: the children of a composite run in ascending
/// `y` order, ties keeping the order they were attached in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// Type tag of a node. The string form is the node's type name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeType {
    Root,
    Sequence,
    Priority,
    MemSequence,
    MemPriority,
    Inverter,
    Succeeder,
    Repeater,
    RepeatUntilFail,
    MaxTime,
    Wait,
    Action,
    Condition,
}

impl NodeType {
    pub fn role(self) -> Role {
        match self {
            NodeType::Root => Role::Root,
            NodeType::Sequence
            | NodeType::Priority
            | NodeType::MemSequence
            | NodeType::MemPriority => Role::Composite,
            NodeType::Inverter
            | NodeType::Succeeder
            | NodeType::Repeater
            | NodeType::RepeatUntilFail
            | NodeType::MaxTime => Role::Decorator,
            NodeType::Wait | NodeType::Action | NodeType::Condition => Role::Leaf,
        }
    }
}

/// Structural role of a node, which fixes how many children it takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Role {
    Leaf,
    Composite,
    Decorator,
    Root,
}

impl Role {
    /// `None` means unbounded.
    pub fn max_children(self) -> Option<usize> {
        match self {
            Role::Leaf => Some(0),
            Role::Composite => None,
            Role::Decorator | Role::Root => Some(1),
        }
    }

    #[inline]
    pub fn takes_children(self) -> bool {
        self.max_children() != Some(0)
    }
}

/// A user behavior bound to an `Action` or `Condition` leaf, with the name
/// it is known by in a [`Registry`](crate::Registry) or snapshot.
pub struct BoundBehavior<S> {
    pub(crate) name: String,
    pub(crate) behavior: Arc<dyn Behavior<S>>,
}

impl<S> BoundBehavior<S> {
    pub fn new(name: impl Into<String>, behavior: Arc<dyn Behavior<S>>) -> Self {
        Self {
            name: name.into(),
            behavior,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S> Clone for BoundBehavior<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            behavior: Arc::clone(&self.behavior),
        }
    }
}

impl<S> fmt::Debug for BoundBehavior<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundBehavior").field(&self.name).finish()
    }
}

/// Kind-specific configuration of a node.
pub(crate) enum NodeKind<S> {
    Root,
    Sequence,
    Priority,
    MemSequence,
    MemPriority,
    Inverter,
    Succeeder,
    Repeater {
        times_repeat: u32,
    },
    RepeatUntilFail {
        times_repeat: u32,
        repeat_forever: bool,
    },
    MaxTime {
        max_time: Duration,
    },
    Wait {
        time_delay: Duration,
    },
    Action(Option<BoundBehavior<S>>),
    Condition(Option<BoundBehavior<S>>),
}

impl<S> NodeKind<S> {
    /// Default configuration for a freshly created node of `node_type`.
    pub(crate) fn new(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Root => NodeKind::Root,
            NodeType::Sequence => NodeKind::Sequence,
            NodeType::Priority => NodeKind::Priority,
            NodeType::MemSequence => NodeKind::MemSequence,
            NodeType::MemPriority => NodeKind::MemPriority,
            NodeType::Inverter => NodeKind::Inverter,
            NodeType::Succeeder => NodeKind::Succeeder,
            NodeType::Repeater => NodeKind::Repeater { times_repeat: 1 },
            NodeType::RepeatUntilFail => NodeKind::RepeatUntilFail {
                times_repeat: 0,
                repeat_forever: true,
            },
            NodeType::MaxTime => NodeKind::MaxTime {
                max_time: Duration::ZERO,
            },
            NodeType::Wait => NodeKind::Wait {
                time_delay: Duration::ZERO,
            },
            NodeType::Action => NodeKind::Action(None),
            NodeType::Condition => NodeKind::Condition(None),
        }
    }

    pub(crate) fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Root => NodeType::Root,
            NodeKind::Sequence => NodeType::Sequence,
            NodeKind::Priority => NodeType::Priority,
            NodeKind::MemSequence => NodeType::MemSequence,
            NodeKind::MemPriority => NodeType::MemPriority,
            NodeKind::Inverter => NodeType::Inverter,
            NodeKind::Succeeder => NodeType::Succeeder,
            NodeKind::Repeater { .. } => NodeType::Repeater,
            NodeKind::RepeatUntilFail { .. } => NodeType::RepeatUntilFail,
            NodeKind::MaxTime { .. } => NodeType::MaxTime,
            NodeKind::Wait { .. } => NodeType::Wait,
            NodeKind::Action(_) => NodeType::Action,
            NodeKind::Condition(_) => NodeType::Condition,
        }
    }

    pub(crate) fn bound(&self) -> Option<&BoundBehavior<S>> {
        match self {
            NodeKind::Action(bound) | NodeKind::Condition(bound) => bound.as_ref(),
            _ => None,
        }
    }
}

impl<S> Clone for NodeKind<S> {
    fn clone(&self) -> Self {
        match self {
            NodeKind::Root => NodeKind::Root,
            NodeKind::Sequence => NodeKind::Sequence,
            NodeKind::Priority => NodeKind::Priority,
            NodeKind::MemSequence => NodeKind::MemSequence,
            NodeKind::MemPriority => NodeKind::MemPriority,
            NodeKind::Inverter => NodeKind::Inverter,
            NodeKind::Succeeder => NodeKind::Succeeder,
            NodeKind::Repeater { times_repeat } => NodeKind::Repeater {
                times_repeat: *times_repeat,
            },
            NodeKind::RepeatUntilFail {
                times_repeat,
                repeat_forever,
            } => NodeKind::RepeatUntilFail {
                times_repeat: *times_repeat,
                repeat_forever: *repeat_forever,
            },
            NodeKind::MaxTime { max_time } => NodeKind::MaxTime {
                max_time: *max_time,
            },
            NodeKind::Wait { time_delay } => NodeKind::Wait {
                time_delay: *time_delay,
            },
            NodeKind::Action(bound) => NodeKind::Action(bound.clone()),
            NodeKind::Condition(bound) => NodeKind::Condition(bound.clone()),
        }
    }
}

/// A node of a behavior tree.
pub struct Node<S> {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) position: Position,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind<S>,
}

impl<S> Node<S> {
    pub(crate) fn new(id: NodeId, kind: NodeKind<S>) -> Self {
        Self {
            id,
            parent: None,
            position: Position::ORIGIN,
            children: Vec::new(),
            kind,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node this one is attached under, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn role(&self) -> Role {
        self.node_type().role()
    }

    /// Children in execution order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The single child of a decorator or root.
    pub fn child(&self) -> Option<NodeId> {
        match self.role() {
            Role::Decorator | Role::Root => self.children.first().copied(),
            Role::Composite | Role::Leaf => None,
        }
    }

    pub fn has_child(&self, child: NodeId) -> bool {
        self.children.contains(&child)
    }

    pub fn times_repeat(&self) -> Option<u32> {
        match self.kind {
            NodeKind::Repeater { times_repeat }
            | NodeKind::RepeatUntilFail { times_repeat, .. } => Some(times_repeat),
            _ => None,
        }
    }

    pub fn repeat_forever(&self) -> Option<bool> {
        match self.kind {
            NodeKind::RepeatUntilFail { repeat_forever, .. } => Some(repeat_forever),
            _ => None,
        }
    }

    pub fn max_time(&self) -> Option<Duration> {
        match self.kind {
            NodeKind::MaxTime { max_time } => Some(max_time),
            _ => None,
        }
    }

    pub fn time_delay(&self) -> Option<Duration> {
        match self.kind {
            NodeKind::Wait { time_delay } => Some(time_delay),
            _ => None,
        }
    }

    /// Name of the behavior bound to an action or condition leaf.
    pub fn behavior_name(&self) -> Option<&str> {
        self.kind.bound().map(BoundBehavior::name)
    }

    /// Executes this node for one tick.
    ///
    /// Runs enter, then open if the node is not already open in `ctx`, then
    /// tick; closes the node unless the tick returned `Running`, and finally
    /// runs exit.
    pub fn execute(&self, tree: &Tree<S>, ctx: &mut ExecutionContext<S>) -> Status {
        self.enter(ctx);

        if !ctx.is_node_open(self.id) {
            self.open(ctx);
        }

        let status = self.tick(tree, ctx);

        if status.is_done() {
            self.close(ctx);
        }

        self.exit(ctx);
        status
    }

    fn enter(&self, ctx: &mut ExecutionContext<S>) {
        ctx.enter_node(self.id);
        tracing::trace!(node = %self.id, node_type = %self.node_type(), "enter");
        if let Some(bound) = self.kind.bound() {
            bound.behavior.enter(self.id, ctx);
        }
    }

    fn open(&self, ctx: &mut ExecutionContext<S>) {
        ctx.open_node(self.id);
        tracing::trace!(node = %self.id, node_type = %self.node_type(), "open");
        match &self.kind {
            NodeKind::MemSequence | NodeKind::MemPriority => composite::open_memory(self.id, ctx),
            NodeKind::Repeater { .. } | NodeKind::RepeatUntilFail { .. } => {
                decorator::reset_counter(self.id, ctx)
            }
            NodeKind::MaxTime { .. } | NodeKind::Wait { .. } => ctx.start_timer(self.id),
            NodeKind::Action(Some(bound)) | NodeKind::Condition(Some(bound)) => {
                bound.behavior.open(self.id, ctx)
            }
            _ => {}
        }
    }

    fn tick(&self, tree: &Tree<S>, ctx: &mut ExecutionContext<S>) -> Status {
        let status = match &self.kind {
            NodeKind::Root => decorator::tick_root(self, tree, ctx),
            NodeKind::Sequence => composite::tick_sequence(self, tree, ctx),
            NodeKind::Priority => composite::tick_priority(self, tree, ctx),
            NodeKind::MemSequence => composite::tick_mem_sequence(self, tree, ctx),
            NodeKind::MemPriority => composite::tick_mem_priority(self, tree, ctx),
            NodeKind::Inverter => decorator::tick_inverter(self, tree, ctx),
            NodeKind::Succeeder => decorator::tick_succeeder(self, tree, ctx),
            NodeKind::Repeater { times_repeat } => {
                decorator::tick_repeater(self, *times_repeat, tree, ctx)
            }
            NodeKind::RepeatUntilFail {
                times_repeat,
                repeat_forever,
            } => decorator::tick_repeat_until_fail(
                self,
                *times_repeat,
                *repeat_forever,
                tree,
                ctx,
            ),
            NodeKind::MaxTime { max_time } => decorator::tick_max_time(self, *max_time, tree, ctx),
            NodeKind::Wait { time_delay } => leaf::tick_wait(self.id, *time_delay, ctx),
            NodeKind::Action(bound) | NodeKind::Condition(bound) => {
                leaf::tick_behavior(self, bound.as_ref(), ctx)
            }
        };
        tracing::trace!(node = %self.id, node_type = %self.node_type(), %status, "tick");
        status
    }

    /// Closes the node: removes it from the open set and releases its scratch
    /// state. Also used directly for orphans, bypassing the rest of the
    /// lifecycle.
    pub(crate) fn close(&self, ctx: &mut ExecutionContext<S>) {
        ctx.close_node(self.id);
        tracing::trace!(node = %self.id, node_type = %self.node_type(), "close");
        match &self.kind {
            NodeKind::MemSequence | NodeKind::MemPriority => {
                ctx.clear_node_value(self.id, keys::RUNNING_CHILD)
            }
            NodeKind::Repeater { .. } | NodeKind::RepeatUntilFail { .. } => {
                ctx.clear_node_value(self.id, keys::COUNTER)
            }
            NodeKind::MaxTime { .. } | NodeKind::Wait { .. } => {
                ctx.clear_node_value(self.id, keys::START_TIME)
            }
            NodeKind::Action(Some(bound)) | NodeKind::Condition(Some(bound)) => {
                bound.behavior.close(self.id, ctx)
            }
            _ => {}
        }
    }

    fn exit(&self, ctx: &mut ExecutionContext<S>) {
        tracing::trace!(node = %self.id, node_type = %self.node_type(), "exit");
        if let Some(bound) = self.kind.bound() {
            bound.behavior.exit(self.id, ctx);
        }
    }
}

impl<S> fmt::Debug for Node<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("node_type", &self.node_type())
            .field("parent", &self.parent)
            .field("position", &self.position)
            .field("children", &self.children)
            .field("behavior", &self.behavior_name())
            .finish()
    }
}

/// Executes the node `id` of `tree`, or returns `Error` if it does not exist.
pub(crate) fn execute_child<S>(tree: &Tree<S>, id: NodeId, ctx: &mut ExecutionContext<S>) -> Status {
    match tree.get_node(id) {
        Some(node) => node.execute(tree, ctx),
        None => {
            tracing::warn!(node = %id, "child node is missing from the tree");
            Status::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn type_names_round_trip() {
        for node_type in NodeType::iter() {
            let name: &'static str = node_type.into();
            assert_eq!(NodeType::from_str(name), Ok(node_type));
        }
        assert!(NodeType::from_str("Selector").is_err());
    }

    #[test]
    fn roles_fix_child_capacity() {
        assert_eq!(NodeType::Root.role().max_children(), Some(1));
        assert_eq!(NodeType::MemPriority.role().max_children(), None);
        assert_eq!(NodeType::MaxTime.role().max_children(), Some(1));
        assert!(!NodeType::Wait.role().takes_children());
    }

    #[test]
    fn fresh_kinds_carry_defaults() {
        let repeater: Node<()> = Node::new(NodeId(1), NodeKind::new(NodeType::Repeater));
        assert_eq!(repeater.times_repeat(), Some(1));
        assert_eq!(repeater.repeat_forever(), None);

        let until_fail: Node<()> = Node::new(NodeId(2), NodeKind::new(NodeType::RepeatUntilFail));
        assert_eq!(until_fail.times_repeat(), Some(0));
        assert_eq!(until_fail.repeat_forever(), Some(true));

        let action: Node<()> = Node::new(NodeId(3), NodeKind::new(NodeType::Action));
        assert_eq!(action.behavior_name(), None);
        assert_eq!(action.child(), None);
    }
}

//! The tree definition: an id-indexed arena of nodes with a designated root.
//!
//! A [`Tree`] exclusively owns its nodes. Nodes reference each other only by
//! [`NodeId`], so there are no ownership cycles and dropping the tree drops
//! every node.
//!
//! Every editing operation validates before it mutates: a rejected edit
//! returns a [`TreeError`] and leaves the tree exactly as it was.
//!
//! Execution happens through [`SharedTree`], which lets many contexts read
//! the same definition and sequences edits against in-flight ticks.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::error::{Result, TreeError};
use crate::node::{BoundBehavior, NodeKind};
use crate::{
    Behavior, ExecutionContext, Node, NodeId, NodeType, Position, Registry, Role, TreeConfig,
};

pub struct Tree<S> {
    pub(crate) nodes: BTreeMap<NodeId, Node<S>>,
    pub(crate) root: NodeId,
    pub(crate) next_id: u32,
    pub(crate) config: TreeConfig,
    pub(crate) registry: Arc<Registry<S>>,
}

impl<S> Tree<S> {
    /// Creates a tree holding only its root node, [`NodeId::ROOT`].
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        let mut tree = Self::empty(config, Arc::new(Registry::new()));
        tree.nodes
            .insert(NodeId::ROOT, Node::new(NodeId::ROOT, NodeKind::Root));
        tree.next_id = NodeId::ROOT.0 + 1;
        tree
    }

    /// Creates a tree whose named node types resolve through `registry`.
    pub fn with_registry(registry: Arc<Registry<S>>) -> Self {
        let mut tree = Self::new();
        tree.registry = registry;
        tree
    }

    /// A tree with no nodes; callers must install a root.
    pub(crate) fn empty(config: TreeConfig, registry: Arc<Registry<S>>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            root: NodeId::ROOT,
            next_id: 0,
            config,
            registry,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry<S>> {
        &self.registry
    }

    /// Wraps the tree for execution.
    pub fn into_shared(self) -> SharedTree<S> {
        SharedTree::new(self)
    }

    // ===== ids =====

    /// Reserves a fresh id. Ids are never handed out twice; once the id space
    /// is used up this returns [`TreeError::IdsExhausted`].
    pub fn new_id(&mut self) -> Result<NodeId> {
        let id = NodeId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(TreeError::IdsExhausted)?;
        Ok(id)
    }

    /// The id the next [`new_id`](Self::new_id) call will return.
    pub fn peek_next_id(&self) -> NodeId {
        NodeId(self.next_id)
    }

    // ===== node creation and removal =====

    pub fn add_node(&mut self, node_type: NodeType) -> Result<NodeId> {
        self.insert_kind(NodeKind::new(node_type))
    }

    /// Adds a node under an id obtained earlier from [`new_id`](Self::new_id),
    /// e.g. when undoing a removal.
    pub fn add_node_with_id(&mut self, id: NodeId, node_type: NodeType) -> Result<()> {
        self.insert_kind_with_id(id, NodeKind::new(node_type))
    }

    /// Adds a node by type name: a built-in [`NodeType`] name or a behavior
    /// registered in this tree's [`Registry`].
    pub fn add_named_node(&mut self, name: &str) -> Result<NodeId> {
        let kind = self.resolve_name(name)?;
        self.insert_kind(kind)
    }

    pub fn add_action(
        &mut self,
        name: impl Into<String>,
        behavior: impl Behavior<S> + 'static,
    ) -> Result<NodeId> {
        let bound = BoundBehavior::new(name, Arc::new(behavior));
        self.insert_kind(NodeKind::Action(Some(bound)))
    }

    pub fn add_condition(
        &mut self,
        name: impl Into<String>,
        behavior: impl Behavior<S> + 'static,
    ) -> Result<NodeId> {
        let bound = BoundBehavior::new(name, Arc::new(behavior));
        self.insert_kind(NodeKind::Condition(Some(bound)))
    }

    pub(crate) fn resolve_name(&self, name: &str) -> Result<NodeKind<S>> {
        if let Ok(node_type) = NodeType::from_str(name) {
            return Ok(NodeKind::new(node_type));
        }
        self.registry
            .resolve(name)
            .ok_or_else(|| TreeError::UnknownNodeType(name.to_owned()))
    }

    pub(crate) fn insert_kind(&mut self, kind: NodeKind<S>) -> Result<NodeId> {
        let id = self.new_id()?;
        tracing::debug!(node = %id, node_type = %kind.node_type(), "node added");
        self.nodes.insert(id, Node::new(id, kind));
        Ok(id)
    }

    /// Rejects `u32::MAX`, which [`new_id`](Self::new_id) never hands out.
    pub(crate) fn insert_kind_with_id(&mut self, id: NodeId, kind: NodeKind<S>) -> Result<()> {
        let Some(successor) = id.0.checked_add(1) else {
            return Err(TreeError::InvalidId(id));
        };
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        tracing::debug!(node = %id, node_type = %kind.node_type(), "node added");
        self.nodes.insert(id, Node::new(id, kind));
        self.next_id = self.next_id.max(successor);
        Ok(())
    }

    /// Removes a node. It is detached from its parent first, and its own
    /// children are left in the tree without a parent.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(TreeError::CannotRemoveRoot(id));
        }
        let node = self.nodes.remove(&id).ok_or(TreeError::NodeNotFound(id))?;

        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|&child| child != id);
        }
        for child in &node.children {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = None;
            }
        }

        tracing::debug!(node = %id, node_type = %node.node_type(), "node removed");
        Ok(())
    }

    // ===== lookup =====

    pub fn get_node(&self, id: NodeId) -> Option<&Node<S>> {
        self.nodes.get(&id)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node<S>> {
        self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<S>> {
        self.nodes.get_mut(&id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node<S>> + '_ {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Designates another `Root` node as the tree root.
    pub fn set_root(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if node.role() != Role::Root {
            return Err(TreeError::NotARoot {
                id,
                node_type: node.node_type(),
            });
        }
        self.root = id;
        Ok(())
    }

    /// Children of `id` in execution order; empty if the node does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(&id) {
            Some(node) => node.children(),
            None => &[],
        }
    }

    // ===== structure =====

    /// Returns `true` if `ancestor` lies on the parent chain of `id`
    /// (or is `id` itself).
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        // A well-formed tree has no parent chain longer than its node count.
        for _ in 0..=self.nodes.len() {
            match current {
                Some(node) if node == ancestor => return true,
                Some(node) => current = self.nodes.get(&node).and_then(|n| n.parent),
                None => return false,
            }
        }
        false
    }

    /// Checks that `child` may be placed under `parent`, ignoring capacity.
    pub(crate) fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;

        if !parent_node.role().takes_children() {
            return Err(TreeError::NotAParent {
                id: parent,
                node_type: parent_node.node_type(),
            });
        }
        if child == self.root || child_node.role() == Role::Root {
            return Err(TreeError::RootAsChild(child));
        }
        if let Some(existing) = child_node.parent {
            return Err(TreeError::AlreadyAttached {
                child,
                parent: existing,
            });
        }
        if self.is_ancestor(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }
        Ok(())
    }

    /// Attaches `child` under `parent`.
    ///
    /// Composites gain another child (re-sorted by `y`); decorators and roots
    /// replace their current child, which is left without a parent. The child
    /// must not already have a parent.
    pub fn connect(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_attach(parent, child)?;

        let role = self.node(parent)?.role();
        let replaced = match role {
            Role::Composite => None,
            _ => self.node(parent)?.children.first().copied(),
        };
        if let Some(old) = replaced {
            self.node_mut(old)?.parent = None;
        }

        let parent_node = self.node_mut(parent)?;
        if replaced.is_some() {
            parent_node.children.clear();
        }
        parent_node.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.sort_children(parent);

        tracing::debug!(%parent, %child, "nodes connected");
        Ok(())
    }

    pub fn disconnect(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.node(parent)?.has_child(child) {
            return Err(TreeError::NotAChild { parent, child });
        }
        self.node_mut(parent)?.children.retain(|&c| c != child);
        if let Some(child) = self.nodes.get_mut(&child) {
            child.parent = None;
        }
        tracing::debug!(%parent, %child, "nodes disconnected");
        Ok(())
    }

    /// Detaches every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in &children {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = None;
            }
        }
        tracing::debug!(node = %id, detached = children.len(), "children cleared");
        Ok(())
    }

    /// Moves a node; its parent's child order follows the new `y`.
    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<()> {
        let node = self.node_mut(id)?;
        node.position = position;
        if let Some(parent) = node.parent {
            self.sort_children(parent);
        }
        Ok(())
    }

    /// Re-derives a composite's child order from the children's `y`
    /// coordinates. Stable, so equal keys keep attachment order.
    pub(crate) fn sort_children(&mut self, parent: NodeId) {
        let Some(node) = self.nodes.get(&parent) else {
            return;
        };
        if node.role() != Role::Composite || node.children.len() < 2 {
            return;
        }

        let mut children = node.children.clone();
        children.sort_by_key(|id| self.nodes.get(id).map_or(i32::MAX, |child| child.position.y));
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children = children;
        }
    }

    // ===== typed properties =====

    fn mismatch(id: NodeId, actual: NodeType, expected: &'static str) -> TreeError {
        TreeError::TypeMismatch {
            id,
            expected,
            actual,
        }
    }

    pub fn set_times_repeat(&mut self, id: NodeId, times: u32) -> Result<()> {
        let node = self.node_mut(id)?;
        let actual = node.node_type();
        match &mut node.kind {
            NodeKind::Repeater { times_repeat } | NodeKind::RepeatUntilFail { times_repeat, .. } => {
                *times_repeat = times;
                Ok(())
            }
            _ => Err(Self::mismatch(id, actual, "Repeater or RepeatUntilFail")),
        }
    }

    pub fn set_repeat_forever(&mut self, id: NodeId, forever: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        let actual = node.node_type();
        match &mut node.kind {
            NodeKind::RepeatUntilFail { repeat_forever, .. } => {
                *repeat_forever = forever;
                Ok(())
            }
            _ => Err(Self::mismatch(id, actual, "RepeatUntilFail")),
        }
    }

    pub fn set_max_time(&mut self, id: NodeId, limit: Duration) -> Result<()> {
        let node = self.node_mut(id)?;
        let actual = node.node_type();
        match &mut node.kind {
            NodeKind::MaxTime { max_time } => {
                *max_time = limit;
                Ok(())
            }
            _ => Err(Self::mismatch(id, actual, "MaxTime")),
        }
    }

    pub fn set_time_delay(&mut self, id: NodeId, delay: Duration) -> Result<()> {
        let node = self.node_mut(id)?;
        let actual = node.node_type();
        match &mut node.kind {
            NodeKind::Wait { time_delay } => {
                *time_delay = delay;
                Ok(())
            }
            _ => Err(Self::mismatch(id, actual, "Wait")),
        }
    }

    /// Binds `behavior` to an `Action` or `Condition` leaf, replacing any
    /// previous binding.
    pub fn set_behavior(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        behavior: Arc<dyn Behavior<S>>,
    ) -> Result<()> {
        let node = self.node_mut(id)?;
        let actual = node.node_type();
        match &mut node.kind {
            NodeKind::Action(bound) | NodeKind::Condition(bound) => {
                *bound = Some(BoundBehavior::new(name, behavior));
                Ok(())
            }
            _ => Err(Self::mismatch(id, actual, "Action or Condition")),
        }
    }
}

impl<S> Default for Tree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for Tree<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("next_id", &self.next_id)
            .field("nodes", &self.nodes.values().collect::<Vec<_>>())
            .finish()
    }
}

/// A tree shared between execution contexts.
///
/// Each [`ExecutionContext::execute`] call holds the read lock for the whole
/// tick. Edits go through [`write`](Self::write), which waits for in-flight
/// ticks to finish. Leaf behaviors must not call `write` from inside a tick.
pub struct SharedTree<S> {
    inner: Arc<RwLock<Tree<S>>>,
}

impl<S> SharedTree<S> {
    pub fn new(tree: Tree<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Creates an execution context for `subject`.
    pub fn create_instance(&self, subject: S) -> ExecutionContext<S> {
        ExecutionContext::new(self.clone(), subject)
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Tree<S>>> {
        self.inner.read().map_err(|_| TreeError::LockPoisoned)
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Tree<S>>> {
        self.inner.write().map_err(|_| TreeError::LockPoisoned)
    }

    /// Returns `true` if both handles point at the same tree.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn inner(&self) -> &Arc<RwLock<Tree<S>>> {
        &self.inner
    }
}

impl<S> Clone for SharedTree<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> From<Tree<S>> for SharedTree<S> {
    fn from(tree: Tree<S>) -> Self {
        Self::new(tree)
    }
}

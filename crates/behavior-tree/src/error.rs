//! Errors raised when editing or loading a tree.
//!
//! Execution never produces these: misconfiguration that is only visible while
//! ticking surfaces as [`Status::Error`](crate::Status::Error) instead.

use thiserror::Error;

use crate::node::{NodeId, NodeType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("node id {0} is already in use")]
    DuplicateId(NodeId),

    #[error("node id {0} is outside the usable id range")]
    InvalidId(NodeId),

    #[error("every node id has been handed out")]
    IdsExhausted,

    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    #[error("node {0} is the tree root and cannot be removed")]
    CannotRemoveRoot(NodeId),

    #[error("node {id} is a {node_type}, not a root node")]
    NotARoot { id: NodeId, node_type: NodeType },

    #[error("node {id} is a {node_type} and cannot have children")]
    NotAParent { id: NodeId, node_type: NodeType },

    #[error("node {child} is already attached to parent {parent}")]
    AlreadyAttached { child: NodeId, parent: NodeId },

    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("node {0} is the tree root and cannot be attached as a child")]
    RootAsChild(NodeId),

    #[error("node {parent} already holds its only child {existing}")]
    ChildSlotTaken { parent: NodeId, existing: NodeId },

    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("node {id} is a {actual}, expected {expected}")]
    TypeMismatch {
        id: NodeId,
        expected: &'static str,
        actual: NodeType,
    },

    #[error("{node_type} has no property `{name}`")]
    UnknownProperty { node_type: NodeType, name: String },

    #[error("invalid value for property `{name}`: {reason}")]
    InvalidProperty { name: String, reason: String },

    #[error("behavior `{0}` is already registered")]
    DuplicateRegistration(String),

    #[error("tree lock was poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, TreeError>;

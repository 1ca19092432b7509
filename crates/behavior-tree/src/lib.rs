//! Tick-driven behavior tree engine.
//!
//! A [`Tree`] is an editable definition: an arena of typed nodes with a
//! designated root. Wrapped in a [`SharedTree`], one definition backs any
//! number of [`ExecutionContext`]s, one per controlled subject (an NPC, a
//! unit, a door). Each context carries its own blackboard, open-node set and
//! clock, so agents sharing a tree never see each other's progress.
//!
//! - **Four-valued status**: `Success`, `Failure`, `Running`, `Error`
//! - **Resumable nodes**: `MemSequence`/`MemPriority` pick up where they left
//!   off, `Wait`/`MaxTime` measure time from when they opened
//! - **Orphan cleanup**: running branches a composite abandons are closed at
//!   the end of the tick
//! - **Live editing**: nodes can be added, rewired and restored between ticks
//!
//! # Architecture
//!
//! - [`Behavior`]: user hooks for `Action` and `Condition` leaves
//! - [`Node`], [`NodeType`]: node data and the built-in node catalogue
//! - [`Tree`], [`SharedTree`]: definition, editing and sharing
//! - [`ExecutionContext`], [`Blackboard`]: per-subject execution state
//! - [`Registry`]: named leaf behaviors for `add_named_node` and snapshots
//! - [`NodeState`], [`TreeSnapshot`]: undo bags and persistence
//! - [`builder`]: shorthand for trees written in code
//!
//! ```
//! use behavior_tree::{ExecutionContext, NodeId, NodeType, Status, Tree};
//!
//! let mut tree: Tree<u32> = Tree::new();
//! let seq = tree.add_node(NodeType::Sequence).unwrap();
//! tree.connect(tree.root_id(), seq).unwrap();
//! let check = tree.add_condition("has_ammo", |_: NodeId, ctx: &mut ExecutionContext<u32>| {
//!     if *ctx.subject() > 0 { Status::Success } else { Status::Failure }
//! }).unwrap();
//! tree.connect(seq, check).unwrap();
//!
//! let tree = tree.into_shared();
//! assert_eq!(tree.create_instance(3).execute(), Status::Success);
//! assert_eq!(tree.create_instance(0).execute(), Status::Failure);
//! ```

pub mod behavior;
pub mod blackboard;
pub mod builder;
pub mod clock;
mod composite;
pub mod config;
pub mod context;
mod decorator;
pub mod error;
mod leaf;
pub mod node;
pub mod registry;
pub mod state;
pub mod status;
pub mod tree;
pub mod value;

#[cfg(test)]
mod testing;

// Re-export core types for ergonomic API
pub use behavior::Behavior;
pub use blackboard::Blackboard;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::TreeConfig;
pub use context::ExecutionContext;
pub use error::{Result, TreeError};
pub use node::{BoundBehavior, Node, NodeId, NodeType, Position, Role};
pub use registry::Registry;
pub use state::{Connection, NodeRecord, NodeState, Params, TreeSnapshot};
pub use status::Status;
pub use tree::{SharedTree, Tree};
pub use value::{NIL, Value};

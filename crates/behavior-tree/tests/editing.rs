//! Editor flows: undo/redo through node state bags, and saving a tree.

use std::sync::Arc;
use std::time::Duration;

use behavior_tree::{
    ExecutionContext, NodeId, NodeType, Position, Registry, Status, Tree, TreeError, Value,
};

fn chase(_: NodeId, _: &mut ExecutionContext<()>) -> Status {
    Status::Running
}

fn sees_player(_: NodeId, _: &mut ExecutionContext<()>) -> Status {
    Status::Success
}

fn registry() -> Arc<Registry<()>> {
    let mut registry = Registry::new();
    registry.register_action("chase", chase).unwrap();
    registry.register_condition("sees_player", sees_player).unwrap();
    Arc::new(registry)
}

#[test]
fn undo_delete_restores_the_node_under_its_old_id() {
    let mut tree = Tree::with_registry(registry());
    let seq = tree.add_named_node("Sequence").unwrap();
    tree.connect(tree.root_id(), seq).unwrap();
    let look = tree.add_named_node("sees_player").unwrap();
    let run = tree.add_named_node("chase").unwrap();
    tree.set_position(run, Position::new(0, 20)).unwrap();
    tree.connect(seq, look).unwrap();
    tree.connect(seq, run).unwrap();

    // Delete the sequence, remembering what the editor needs to undo it.
    let parent = tree.get_node(seq).and_then(|n| n.parent()).unwrap();
    let saved = tree.get_state(seq).unwrap();
    tree.remove_node(seq).unwrap();
    assert!(tree.children(tree.root_id()).is_empty());

    // Undo: same id, same state, reconnected to the same parent.
    tree.add_node_with_id(seq, saved.node_type).unwrap();
    tree.set_state(seq, &saved).unwrap();
    tree.connect(parent, seq).unwrap();

    assert_eq!(tree.get_state(seq).unwrap(), saved);
    assert_eq!(tree.children(seq), &[look, run]);
    let mut ctx = tree.into_shared().create_instance(());
    assert_eq!(ctx.execute(), Status::Running);
}

#[test]
fn undo_property_change_via_state() {
    let mut tree: Tree<()> = Tree::new();
    let wait = tree.add_named_node("Wait").unwrap();
    tree.set_time_delay(wait, Duration::from_secs(1)).unwrap();
    let before = tree.get_state(wait).unwrap();

    tree.set_time_delay(wait, Duration::from_secs(5)).unwrap();
    tree.set_position(wait, Position::new(40, 40)).unwrap();
    let after = tree.get_state(wait).unwrap();

    tree.set_state(wait, &before).unwrap();
    assert_eq!(tree.get_node(wait).and_then(|n| n.time_delay()), Some(Duration::from_secs(1)));
    assert_eq!(tree.get_node(wait).map(|n| n.position()), Some(Position::ORIGIN));

    // Redo.
    tree.set_state(wait, &after).unwrap();
    assert_eq!(after.params["time_delay"], Value::Float(5.0));
    assert_eq!(tree.get_node(wait).and_then(|n| n.time_delay()), Some(Duration::from_secs(5)));
}

#[test]
fn rejected_edits_leave_the_tree_unchanged() {
    let mut tree: Tree<()> = Tree::new();
    let seq = tree.add_node(NodeType::Sequence).unwrap();
    let inverter = tree.add_node(NodeType::Inverter).unwrap();
    let wait = tree.add_node(NodeType::Wait).unwrap();
    tree.connect(seq, inverter).unwrap();
    tree.connect(inverter, wait).unwrap();
    let before = tree.snapshot();

    assert_eq!(
        tree.connect(wait, inverter),
        Err(TreeError::NotAParent {
            id: wait,
            node_type: NodeType::Wait
        })
    );
    assert_eq!(
        tree.connect(inverter, seq),
        Err(TreeError::Cycle {
            parent: inverter,
            child: seq
        })
    );
    assert_eq!(
        tree.disconnect(tree.root_id(), wait),
        Err(TreeError::NotAChild {
            parent: NodeId::ROOT,
            child: wait
        })
    );
    assert_eq!(
        tree.add_named_node("Selector"),
        Err(TreeError::UnknownNodeType("Selector".to_owned()))
    );
    assert_eq!(tree.snapshot(), before);
}

#[cfg(feature = "serde")]
#[test]
fn saved_tree_loads_and_runs() {
    let registry = registry();
    let mut tree = Tree::with_registry(Arc::clone(&registry));
    let priority = tree.add_named_node("MemPriority").unwrap();
    tree.connect(tree.root_id(), priority).unwrap();
    let look = tree.add_named_node("sees_player").unwrap();
    tree.connect(priority, look).unwrap();
    let repeat = tree.add_named_node("Repeater").unwrap();
    tree.set_times_repeat(repeat, 3).unwrap();
    tree.set_position(repeat, Position::new(0, 10)).unwrap();
    tree.connect(priority, repeat).unwrap();
    let run = tree.add_named_node("chase").unwrap();
    tree.connect(repeat, run).unwrap();

    let json = serde_json::to_string_pretty(&tree.snapshot()).unwrap();
    let snapshot: behavior_tree::TreeSnapshot = serde_json::from_str(&json).unwrap();
    let loaded = Tree::from_snapshot(&snapshot, registry).unwrap();

    assert_eq!(loaded.len(), tree.len());
    assert_eq!(loaded.children(priority), &[look, repeat]);
    assert_eq!(loaded.get_node(repeat).and_then(|n| n.times_repeat()), Some(3));
    assert_eq!(loaded.get_node(run).and_then(|n| n.behavior_name()), Some("chase"));

    // New ids continue after the saved ones.
    let mut loaded = loaded;
    assert_eq!(loaded.add_node(NodeType::Wait).unwrap(), NodeId(5));
    assert_eq!(loaded.into_shared().create_instance(()).execute(), Status::Success);
}

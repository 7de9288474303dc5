//! Integration tests: undo/redo through the workspace history.
//!
//! Every scenario drives real mutators, flushes, then undoes and redoes,
//! checking both the document and the stacks.

use blox_core::event::Coordinate;
use blox_core::model::block::{BlockState, Slot};
use blox_core::model::comment::CommentState;
use blox_core::model::procedure::ProcedureModel;
use blox_core::{EngineConfig, EventEngine, EventError, Workspace, Workspaces};
use serde_json::json;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn setup_with(config: EngineConfig) -> (Rc<EventEngine>, Workspaces) {
    let engine = Rc::new(EventEngine::with_seed(config, 7));
    let mut workspaces = Workspaces::new();
    workspaces.insert(Workspace::new("W", Rc::clone(&engine)));
    (engine, workspaces)
}

fn setup() -> (Rc<EventEngine>, Workspaces) {
    setup_with(EngineConfig::default())
}

fn w(workspaces: &mut Workspaces) -> &mut Workspace {
    workspaces.get_by_id_mut("W").expect("workspace W")
}

fn stack() -> BlockState {
    BlockState::new("controls_if")
        .with_id("if")
        .statement()
        .at(10.0, 10.0)
        .with_input("IF0", Some(BlockState::new("logic_boolean").with_id("cond").value()))
        .with_next(
            BlockState::new("text_print")
                .with_id("print")
                .statement()
                .with_field("TEXT", "hi"),
        )
}

fn position(ws: &Workspace, id: &str) -> Option<Coordinate> {
    ws.block(id).map(|b| b.coordinate)
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[test]
fn undo_and_redo_move() {
    let (engine, mut workspaces) = setup();
    w(&mut workspaces).append_block(&stack()).expect("append");
    engine.run_until_idle(&mut workspaces);

    w(&mut workspaces).move_block_to("if", Coordinate::new(50.0, 60.0));
    engine.run_until_idle(&mut workspaces);

    let ws = w(&mut workspaces);
    ws.undo(false).expect("undo");
    assert_eq!(position(ws, "if"), Some(Coordinate::new(10.0, 10.0)));
    assert!(ws.history().can_redo());

    ws.undo(true).expect("redo");
    assert_eq!(position(ws, "if"), Some(Coordinate::new(50.0, 60.0)));
    assert!(!ws.history().can_redo());
}

#[test]
fn replay_events_are_not_recorded() {
    let (engine, mut workspaces) = setup();
    w(&mut workspaces).append_block(&stack()).expect("append");
    engine.run_until_idle(&mut workspaces);
    w(&mut workspaces).move_block_to("if", Coordinate::new(50.0, 60.0));
    engine.run_until_idle(&mut workspaces);

    w(&mut workspaces).undo(false).expect("undo");
    engine.run_until_idle(&mut workspaces);

    let ws = w(&mut workspaces);
    assert_eq!(ws.history().undo_stack().len(), 1);
    assert_eq!(ws.history().redo_stack().len(), 1);
}

#[test]
fn grouped_gesture_undoes_as_one() {
    let (engine, mut workspaces) = setup();
    engine.set_group(true);
    let ws = w(&mut workspaces);
    ws.append_block(&stack()).expect("append");
    ws.set_field_value("print", "TEXT", json!("bye"));
    engine.set_group(false);
    engine.run_until_idle(&mut workspaces);

    let ws = w(&mut workspaces);
    ws.undo(false).expect("undo");
    assert!(ws.block("if").is_none());
    assert!(ws.block("print").is_none());
    assert!(!ws.history().can_undo());

    ws.undo(true).expect("redo");
    assert_eq!(
        ws.block("print").and_then(|b| b.fields.get("TEXT")).cloned(),
        Some(json!("bye"))
    );
    assert_eq!(ws.descendant_ids("if"), vec!["if", "cond", "print"]);
}

#[test]
fn undo_delete_restores_connected_tree() {
    let (engine, mut workspaces) = setup();
    w(&mut workspaces).append_block(&stack()).expect("append");
    engine.run_until_idle(&mut workspaces);

    engine.set_group(true);
    assert!(w(&mut workspaces).dispose_block("print").expect("dispose"));
    engine.set_group(false);
    engine.run_until_idle(&mut workspaces);
    assert!(w(&mut workspaces).block("print").is_none());

    let ws = w(&mut workspaces);
    ws.undo(false).expect("undo");
    assert_eq!(ws.next_block("if").map(|b| b.id.as_str()), Some("print"));
    assert_eq!(ws.top_block_ids(), ["if".to_string()]);
}

#[test]
fn undo_connect_restores_previous_parent() {
    let (engine, mut workspaces) = setup();
    let ws = w(&mut workspaces);
    ws.append_block(&stack()).expect("append");
    ws.append_block(&BlockState::new("logic_boolean").with_id("other").value().at(90.0, 90.0))
        .expect("append");
    engine.run_until_idle(&mut workspaces);

    engine.set_group(true);
    assert!(w(&mut workspaces).connect("other", "if", Slot::Input("IF0".into())));
    engine.set_group(false);
    engine.run_until_idle(&mut workspaces);
    assert!(w(&mut workspaces).block("cond").is_some_and(|b| b.parent.is_none()));

    let ws = w(&mut workspaces);
    ws.undo(false).expect("undo");
    assert_eq!(ws.input_block("if", "IF0").map(|b| b.id.as_str()), Some("cond"));
    assert_eq!(position(ws, "other"), Some(Coordinate::new(90.0, 90.0)));
    assert!(ws.block("other").is_some_and(|b| b.parent.is_none()));
}

#[test]
fn shadow_field_edits_are_undoable() {
    let (engine, mut workspaces) = setup();
    let sum = BlockState::new("math_arithmetic")
        .with_id("p")
        .value()
        .at(0.0, 0.0)
        .with_input(
            "A",
            Some(
                BlockState::new("math_number")
                    .with_id("s")
                    .value()
                    .shadow()
                    .with_field("NUM", 1),
            ),
        );
    w(&mut workspaces).append_block(&sum).expect("append");
    engine.run_until_idle(&mut workspaces);
    assert_eq!(w(&mut workspaces).history().undo_stack().len(), 1);

    w(&mut workspaces).set_field_value("s", "NUM", json!(5));
    engine.run_until_idle(&mut workspaces);
    assert_eq!(w(&mut workspaces).history().undo_stack().len(), 2);

    let ws = w(&mut workspaces);
    ws.undo(false).expect("undo");
    let shadow = ws.block("s").expect("shadow survives undo");
    assert_eq!(shadow.fields.get("NUM"), Some(&json!(1)));
    assert!(ws.block("p").is_some());

    ws.undo(true).expect("redo");
    assert_eq!(ws.block("s").and_then(|b| b.fields.get("NUM")), Some(&json!(5)));
}

#[test]
fn bumped_shadow_move_is_not_undoable() {
    let (engine, mut workspaces) = setup();
    let sum = BlockState::new("math_arithmetic")
        .with_id("p")
        .value()
        .at(0.0, 0.0)
        .with_input(
            "A",
            Some(BlockState::new("math_number").with_id("s").value().shadow()),
        );
    w(&mut workspaces).append_block(&sum).expect("append");
    w(&mut workspaces)
        .append_block(&BlockState::new("math_number").with_id("n").value().at(90.0, 0.0))
        .expect("append");
    engine.run_until_idle(&mut workspaces);
    let before = w(&mut workspaces).history().undo_stack().len();

    w(&mut workspaces).connect("n", "p", Slot::Input("A".into()));
    engine.run_until_idle(&mut workspaces);
    let undo = w(&mut workspaces).history().undo_stack();
    assert_eq!(undo.len(), before + 1);
    assert_eq!(undo.last().map(blox_core::Event::entity_id), Some("n"));
}

// ---------------------------------------------------------------------------
// Comments, variables, procedures
// ---------------------------------------------------------------------------

#[test]
fn comment_edits_roundtrip() {
    let (engine, mut workspaces) = setup();
    w(&mut workspaces)
        .create_comment(&CommentState::new("draft").with_id("c"))
        .expect("comment");
    engine.run_until_idle(&mut workspaces);
    w(&mut workspaces).set_comment_content("c", "final");
    engine.run_until_idle(&mut workspaces);

    let ws = w(&mut workspaces);
    ws.undo(false).expect("undo");
    assert_eq!(ws.comment("c").map(|c| c.content.as_str()), Some("draft"));
    ws.undo(false).expect("undo");
    assert!(ws.comment("c").is_none());
    ws.undo(true).expect("redo");
    ws.undo(true).expect("redo");
    assert_eq!(ws.comment("c").map(|c| c.content.as_str()), Some("final"));
}

#[test]
fn variable_rename_undo() {
    let (engine, mut workspaces) = setup();
    w(&mut workspaces).create_variable("count", "", Some("v")).expect("var");
    engine.run_until_idle(&mut workspaces);
    w(&mut workspaces).rename_variable_by_id("v", "total");
    engine.run_until_idle(&mut workspaces);

    let ws = w(&mut workspaces);
    ws.undo(false).expect("undo");
    assert_eq!(ws.variable_map().get_by_id("v").map(|v| v.name.as_str()), Some("count"));
    ws.undo(false).expect("undo");
    assert!(ws.variable_map().is_empty());
}

#[test]
fn procedure_undo_replays_in_reverse() {
    let (engine, mut workspaces) = setup();
    engine.set_group(true);
    let ws = w(&mut workspaces);
    ws.add_procedure(ProcedureModel::new("p", "do_it")).expect("add");
    ws.rename_procedure("p", "do_more").expect("rename");
    ws.set_return_types("p", Some(vec!["Number".into()])).expect("return");
    engine.set_group(false);
    engine.run_until_idle(&mut workspaces);

    let ws = w(&mut workspaces);
    ws.undo(false).expect("undo");
    assert!(ws.procedure_map().is_empty());
    ws.undo(true).expect("redo");
    let model = ws.procedure_map().get("p").expect("procedure");
    assert_eq!(model.name, "do_more");
    assert_eq!(model.return_types, Some(vec!["Number".to_string()]));
}

#[test]
fn failed_undo_still_moves_batch_to_redo() {
    let (engine, mut workspaces) = setup();
    w(&mut workspaces)
        .add_procedure(ProcedureModel::new("p", "do_it"))
        .expect("add");
    engine.run_until_idle(&mut workspaces);
    w(&mut workspaces).rename_procedure("p", "do_more").expect("rename");
    engine.run_until_idle(&mut workspaces);
    {
        let _quiet = engine.suppress_undo();
        assert!(w(&mut workspaces).delete_procedure("p"));
        engine.run_until_idle(&mut workspaces);
    }
    assert_eq!(w(&mut workspaces).history().undo_stack().len(), 2);

    let ws = w(&mut workspaces);
    let err = ws.undo(false).expect_err("procedure is gone");
    assert!(matches!(err, EventError::ProcedureNotFound(ref id) if id == "p"));
    assert_eq!(ws.history().undo_stack().len(), 1);
    assert_eq!(ws.history().redo_stack().len(), 1);
}

// ---------------------------------------------------------------------------
// Stack management
// ---------------------------------------------------------------------------

#[test]
fn new_action_clears_redo() {
    let (engine, mut workspaces) = setup();
    w(&mut workspaces).append_block(&stack()).expect("append");
    engine.run_until_idle(&mut workspaces);
    w(&mut workspaces).undo(false).expect("undo");
    engine.run_until_idle(&mut workspaces);
    assert!(w(&mut workspaces).history().can_redo());

    w(&mut workspaces)
        .append_block(&BlockState::new("text").with_id("t"))
        .expect("append");
    engine.run_until_idle(&mut workspaces);
    assert!(!w(&mut workspaces).history().can_redo());
}

#[test]
fn clear_undo_discards_pending_events() {
    let (engine, mut workspaces) = setup();
    w(&mut workspaces).append_block(&stack()).expect("append");
    engine.run_until_idle(&mut workspaces);
    w(&mut workspaces).move_block_to("if", Coordinate::new(1.0, 2.0));
    w(&mut workspaces).clear_undo();
    engine.run_until_idle(&mut workspaces);

    let ws = w(&mut workspaces);
    assert!(!ws.history().can_undo());
    assert!(!ws.history().can_redo());
}

#[test]
fn history_is_capped() {
    let (engine, mut workspaces) = setup_with(EngineConfig {
        max_undo: 2,
        ..EngineConfig::default()
    });
    for i in 0..5 {
        w(&mut workspaces)
            .append_block(&BlockState::new("text").with_id(format!("t{i}")))
            .expect("append");
        engine.run_until_idle(&mut workspaces);
    }
    assert_eq!(w(&mut workspaces).history().undo_stack().len(), 2);
}

#[test]
fn undo_on_empty_history_is_a_no_op() {
    let (_engine, mut workspaces) = setup();
    let ws = w(&mut workspaces);
    ws.undo(false).expect("undo");
    ws.undo(true).expect("redo");
    assert!(!ws.history().can_undo());
}

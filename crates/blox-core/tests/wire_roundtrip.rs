//! Integration tests: wire encoding.
//!
//! Events captured from a scripted editing session, and one sample record of
//! every built-in kind, must survive `to_json` → `EventRegistry::decode`
//! unchanged. Replaying the decoded session log on a fresh workspace must
//! rebuild the same document, and running it backward must empty it.

use blox_core::event::ui::{Click, ClickTarget, ViewportChange};
use blox_core::event::{
    BlockMove, Capture, Coordinate, CustomEvent, EventPayload, Location, Size,
};
use blox_core::model::block::{BlockState, Slot};
use blox_core::model::comment::CommentState;
use blox_core::model::procedure::{ParameterModel, ProcedureModel};
use blox_core::{
    EngineConfig, Event, EventEngine, EventError, EventKind, EventRegistry, Workspace,
    WorkspaceState, Workspaces,
};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Run a representative editing session and return every delivered event
/// plus the final document.
fn scripted_session() -> (Vec<Event>, WorkspaceState) {
    let engine = Rc::new(EventEngine::with_seed(EngineConfig::default(), 99));
    let mut ws = Workspace::new("W", Rc::clone(&engine));
    let log: Rc<RefCell<Vec<Event>>> = Rc::default();
    let sink = Rc::clone(&log);
    ws.add_change_listener(move |_, event| {
        sink.borrow_mut().push(event.clone());
        Ok(())
    });
    let mut workspaces = Workspaces::new();
    workspaces.insert(ws);
    let step = |workspaces: &mut Workspaces, f: &dyn Fn(&mut Workspace)| {
        f(workspaces.get_by_id_mut("W").expect("workspace"));
        engine.run_until_idle(workspaces);
    };

    step(&mut workspaces, &|ws| {
        ws.create_variable("count", "", Some("v1")).expect("var");
        ws.append_block(
            &BlockState::new("controls_if")
                .with_id("if")
                .statement()
                .at(10.0, 10.0)
                .with_input("IF0", Some(BlockState::new("logic_boolean").with_id("cond").value()))
                .with_next(
                    BlockState::new("text_print")
                        .with_id("print")
                        .statement()
                        .with_field("TEXT", "hi"),
                ),
        )
        .expect("append");
        ws.append_block(&BlockState::new("logic_boolean").with_id("other").value().at(80.0, 0.0))
            .expect("append");
        ws.append_block(&BlockState::new("text").with_id("tmp").value().at(150.0, 0.0))
            .expect("append");
    });
    step(&mut workspaces, &|ws| {
        ws.move_block_to("other", Coordinate::new(90.0, 5.0));
    });
    step(&mut workspaces, &|ws| {
        ws.connect("other", "if", Slot::Input("IF0".into()));
    });
    step(&mut workspaces, &|ws| {
        ws.set_field_value("print", "TEXT", json!("hello"));
        ws.set_collapsed("if", true);
        ws.set_mutation("if", Some(r#"{"elseIfCount":0}"#.into()));
        ws.rename_variable_by_id("v1", "total");
    });
    step(&mut workspaces, &|ws| {
        ws.create_comment(&CommentState::new("note").with_id("c1").at(5.0, 5.0))
            .expect("comment");
    });
    step(&mut workspaces, &|ws| {
        ws.move_comment("c1", Coordinate::new(20.0, 30.0));
        ws.resize_comment("c1", Size::new(200.0, 100.0));
        ws.set_comment_content("c1", "edited");
        ws.set_comment_collapsed("c1", true);
    });
    step(&mut workspaces, &|ws| {
        ws.add_procedure(ProcedureModel::new("p1", "do_it")).expect("procedure");
    });
    step(&mut workspaces, &|ws| {
        let param = ParameterModel {
            id: "x1".into(),
            name: "x".into(),
        };
        ws.insert_parameter("p1", param, 0).expect("param");
        ws.rename_parameter("p1", "x1", "y").expect("rename param");
        ws.set_procedure_enabled("p1", false).expect("enable");
    });
    step(&mut workspaces, &|ws| {
        ws.set_field_value_intermediate("print", "TEXT", json!("hel"));
    });
    step(&mut workspaces, &|ws| {
        ws.finish_field_edit("print", "TEXT");
        ws.dispose_block("tmp").expect("dispose");
    });
    step(&mut workspaces, &|ws| {
        ws.create_comment(&CommentState::new("scratch").with_id("c2").at(0.0, 60.0))
            .expect("comment");
        ws.create_variable("scratch", "", Some("v2")).expect("var");
        ws.add_procedure(ProcedureModel::new("p2", "unused")).expect("procedure");
    });
    step(&mut workspaces, &|ws| {
        ws.delete_comment("c2");
        ws.delete_variable_by_id("v2");
        ws.change_variable_type("v1", "Number");
        ws.delete_procedure("p2");
    });
    step(&mut workspaces, &|ws| {
        ws.rename_procedure("p1", "run").expect("rename procedure");
        ws.set_return_types("p1", Some(vec!["Number".into()])).expect("return");
        ws.delete_parameter("p1", 0).expect("delete param");
    });
    step(&mut workspaces, &|ws| {
        ws.fire(EventPayload::Click(Click {
            block_id: Some("if".into()),
            target_type: ClickTarget::Block,
        }));
        ws.fire(EventPayload::ViewportChange(ViewportChange {
            view_top: 4.0,
            view_left: 2.0,
            scale: 1.5,
            old_scale: 1.0,
        }));
    });

    let state = workspaces.get_by_id("W").expect("workspace").state();
    let events = log.borrow().clone();
    (events, state)
}

/// One wire record per built-in kind.
fn sample_records() -> Vec<Value> {
    vec![
        json!({"kind": "create", "blockId": "b1",
               "json": {"type": "text", "id": "b1", "x": 10, "y": 20}, "ids": ["b1"]}),
        json!({"kind": "delete", "blockId": "b1",
               "oldJson": {"type": "text", "id": "b1", "x": 10, "y": 20}, "ids": ["b1"]}),
        json!({"kind": "change", "blockId": "b1", "element": "field", "name": "TEXT",
               "oldValue": "a", "newValue": "b"}),
        json!({"kind": "move", "blockId": "b1", "oldCoordinate": "0,0",
               "newParentId": "b2", "newInputName": "IF0", "reason": ["connect"]}),
        json!({"kind": "block_field_intermediate_change", "blockId": "b1", "name": "TEXT",
               "oldValue": "a", "newValue": "ab"}),
        json!({"kind": "comment_create", "commentId": "c1",
               "json": {"id": "c1", "text": "hi", "x": 1, "y": 2, "width": 160, "height": 80}}),
        json!({"kind": "comment_delete", "commentId": "c1",
               "json": {"id": "c1", "text": "hi", "x": 1, "y": 2, "width": 160, "height": 80}}),
        json!({"kind": "comment_change", "commentId": "c1",
               "oldContents": "hi", "newContents": "hello"}),
        json!({"kind": "comment_move", "commentId": "c1",
               "oldCoordinate": "1,2", "newCoordinate": "30,40"}),
        json!({"kind": "comment_resize", "commentId": "c1",
               "oldSize": {"width": 160, "height": 80}, "newSize": {"width": 200, "height": 90}}),
        json!({"kind": "comment_collapse", "commentId": "c1", "newCollapsed": true}),
        json!({"kind": "comment_drag", "commentId": "c1", "isStart": true}),
        json!({"kind": "var_create", "varId": "v1", "varType": "", "varName": "count"}),
        json!({"kind": "var_delete", "varId": "v1", "varType": "", "varName": "count"}),
        json!({"kind": "var_rename", "varId": "v1", "oldName": "count", "newName": "total"}),
        json!({"kind": "var_type_change", "varId": "v1", "oldType": "", "newType": "Number"}),
        json!({"kind": "procedure_create", "procedure": {"id": "p1", "name": "do_it"}}),
        json!({"kind": "procedure_delete",
               "procedure": {"id": "p1", "name": "do_it", "enabled": false,
                             "parameters": [{"id": "x1", "name": "x"}],
                             "returnTypes": ["Number"]}}),
        json!({"kind": "procedure_rename", "procedureId": "p1",
               "oldName": "do_it", "newName": "run"}),
        json!({"kind": "procedure_enable", "procedureId": "p1", "newState": false}),
        json!({"kind": "procedure_parameter_create", "procedureId": "p1",
               "parameter": {"id": "x1", "name": "x"}, "index": 0}),
        json!({"kind": "procedure_parameter_delete", "procedureId": "p1",
               "parameter": {"id": "x1", "name": "x"}, "index": 0}),
        json!({"kind": "procedure_parameter_rename", "procedureId": "p1", "parameterId": "x1",
               "oldName": "x", "newName": "y"}),
        json!({"kind": "procedure_change_return", "procedureId": "p1",
               "oldTypes": null, "newTypes": ["Number"]}),
        json!({"kind": "click", "blockId": "b1", "targetType": "block"}),
        json!({"kind": "ctrl_click", "blockId": "b1", "targetType": "block"}),
        json!({"kind": "marker_move", "blockId": "b1", "isCursor": true,
               "oldNode": "b0", "newNode": "b1"}),
        json!({"kind": "viewport_change", "viewTop": 4, "viewLeft": 2, "scale": 2, "oldScale": 1}),
        json!({"kind": "trashcan_open", "isOpen": true}),
        json!({"kind": "toolbox_item_select", "oldItem": "Logic", "newItem": "Loops"}),
        json!({"kind": "flyout_show"}),
        json!({"kind": "flyout_hide"}),
        json!({"kind": "flyout_zoom", "oldScale": 1, "newScale": 2}),
        json!({"kind": "bubble_open", "blockId": "b1", "isOpen": true, "bubbleType": "mutator"}),
        json!({"kind": "selected", "oldElementId": "b0", "newElementId": "b1"}),
        json!({"kind": "drag", "blockId": "b1", "isStart": true, "blocks": ["b1", "b2"]}),
        json!({"kind": "theme_change", "themeName": "dark"}),
        json!({"kind": "finished_loading"}),
        json!({"kind": "loading_error", "message": "unknown block type"}),
    ]
}

fn roundtrip(registry: &EventRegistry, event: &Event) -> Event {
    let json = event.to_json().expect("encode");
    registry.decode(&json, &event.workspace_id).expect("decode")
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

#[test]
fn session_events_roundtrip_exactly() {
    let registry = EventRegistry::with_builtins();
    let (events, _) = scripted_session();
    assert!(events.len() > 15, "session produced {} events", events.len());
    for event in &events {
        assert_eq!(&roundtrip(&registry, event), event, "kind {}", event.kind_str());
    }

    let kinds: BTreeSet<EventKind> = events.iter().filter_map(|e| e.payload.kind()).collect();
    let model_kinds = EventKind::ALL
        .into_iter()
        .filter(|k| !k.is_ui())
        .filter(|k| !matches!(k, EventKind::FinishedLoading | EventKind::LoadingError));
    for kind in model_kinds {
        assert!(kinds.contains(&kind), "session never fired {kind}");
    }
}

#[test]
fn every_builtin_kind_roundtrips() {
    let registry = EventRegistry::with_builtins();
    let samples = sample_records();
    let mut seen = BTreeSet::new();
    for record in &samples {
        let event = registry
            .decode(record, "W")
            .unwrap_or_else(|e| panic!("decode {record}: {e}"));
        let kind = event.payload.kind().expect("built-in kind");
        assert_eq!(kind.as_str(), record["kind"]);
        assert_eq!(roundtrip(&registry, &event), event, "kind {kind}");
        seen.insert(kind);
    }
    let all: BTreeSet<EventKind> = EventKind::ALL.into_iter().collect();
    assert_eq!(seen, all);
}

#[test]
fn envelope_fields_are_minimal() {
    let event = Event::new(
        "W",
        EventPayload::Click(Click {
            block_id: None,
            target_type: ClickTarget::Workspace,
        }),
    );
    let json = event.to_json().expect("encode");
    assert_eq!(json, json!({"kind": "click", "targetType": "workspace"}));

    let grouped = event.with_group("g1");
    let json = grouped.to_json().expect("encode");
    assert_eq!(json["groupId"], "g1");
    assert!(json.get("recordUndo").is_none());
}

#[test]
fn decodes_string_coordinates() {
    let registry = EventRegistry::with_builtins();
    let record = json!({
        "kind": "move",
        "groupId": "g",
        "blockId": "b1",
        "oldCoordinate": "0,0",
        "newCoordinate": "5,7",
    });
    let event = registry.decode(&record, "W").expect("decode");
    assert_eq!(event.group, "g");
    let EventPayload::BlockMove(mv) = &event.payload else {
        panic!("expected move");
    };
    assert_eq!(mv.old.coordinate, Some(Coordinate::new(0.0, 0.0)));
    assert_eq!(
        mv.new.recorded().and_then(|l| l.coordinate),
        Some(Coordinate::new(5.0, 7.0))
    );
}

#[test]
fn capturing_move_cannot_encode() {
    let event = Event::new(
        "W",
        EventPayload::BlockMove(BlockMove {
            block_id: "b".into(),
            old: Location::default(),
            new: Capture::Capturing,
            reason: vec![],
        }),
    );
    assert!(matches!(
        event.to_json(),
        Err(EventError::MissingField { field: "newCoordinate", .. })
    ));
}

#[test]
fn decode_errors_are_typed() {
    let registry = EventRegistry::with_builtins();
    assert!(matches!(
        registry.decode(&json!({"kind": "teleport"}), "W"),
        Err(EventError::UnknownKind(kind)) if kind == "teleport"
    ));
    assert!(matches!(
        registry.decode(&json!({"blockId": "b"}), "W"),
        Err(EventError::MalformedRecord(_))
    ));
    assert!(matches!(
        registry.decode(&json!({"kind": "move", "blockId": "b", "newCoordinate": "oops"}), "W"),
        Err(EventError::InvalidPayload { .. } | EventError::InvalidCoordinate(_))
    ));
}

#[test]
fn custom_kinds_roundtrip() {
    let mut registry = EventRegistry::with_builtins();
    registry
        .register("plugin_highlight", CustomEvent::decode_ui)
        .expect("register");
    assert!(matches!(
        registry.register("plugin_highlight", CustomEvent::decode),
        Err(EventError::DuplicateKind(_))
    ));

    let record = json!({"kind": "plugin_highlight", "blockId": "b7", "color": "red"});
    let event = registry.decode(&record, "W").expect("decode");
    assert!(event.is_ui());
    assert!(!event.record_undo);
    assert_eq!(event.entity_id(), "b7");
    assert_eq!(event.to_json().expect("encode"), record);
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

#[test]
fn decoded_log_replays_to_same_document() {
    let registry = EventRegistry::with_builtins();
    let (events, expected) = scripted_session();
    let decoded: Vec<Event> = events.iter().map(|e| roundtrip(&registry, e)).collect();

    let engine = Rc::new(EventEngine::with_seed(EngineConfig::default(), 5));
    let mut replica = Workspace::new("W", engine);
    for event in &decoded {
        event.run(true, &mut replica).expect("replay forward");
    }
    assert_eq!(replica.state(), expected);

    for event in decoded.iter().rev() {
        event.run(false, &mut replica).expect("replay backward");
    }
    assert_eq!(replica.state(), WorkspaceState::default());
}

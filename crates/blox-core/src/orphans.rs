//! Listener that disables blocks left dangling outside any stack and
//! re-enables them once they are attached to an enabled parent.

use crate::event::{Event, EventPayload};
use crate::model::Workspace;
use std::rc::Rc;
use tracing::trace;

/// Change listener: on `create` or `move`, enable the block's subtree if it
/// sits under an enabled parent; otherwise, if the block could attach to
/// something and no drag is in progress, disable it and its next chain.
///
/// The resulting `change` events are not recorded for undo.
///
/// # Errors
///
/// Fails on a create or move event with an empty block id.
pub fn disable_orphans(ws: &mut Workspace, event: &Event) -> anyhow::Result<()> {
    let block_id = match &event.payload {
        EventPayload::BlockCreate(create) => create.block_id.as_str(),
        EventPayload::BlockMove(mv) => mv.block_id.as_str(),
        _ => return Ok(()),
    };
    if block_id.is_empty() {
        anyhow::bail!("{} event without a block id", event.kind_str());
    }
    let Some(block) = ws.block(block_id) else {
        return Ok(());
    };
    let attachable = block.has_output || block.has_previous;
    let parent_enabled = ws.parent_block(block_id).map(|parent| parent.enabled);

    let engine = Rc::clone(ws.engine());
    let _suppressed = engine.suppress_undo();
    match parent_enabled {
        Some(true) => {
            for id in ws.descendant_ids(block_id) {
                ws.set_block_enabled(&id, true);
            }
        }
        _ if attachable && !ws.is_dragging() => {
            let mut current = Some(block_id.to_string());
            while let Some(id) = current {
                trace!(block_id = %id, "disabling orphan");
                ws.set_block_enabled(&id, false);
                current = ws.next_block(&id).map(|next| next.id.clone());
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::EventEngine;
    use crate::model::block::{BlockState, Slot};
    use crate::model::Workspaces;

    fn setup() -> (Rc<EventEngine>, Workspaces) {
        let config = EngineConfig {
            disable_orphans: true,
            ..EngineConfig::default()
        };
        let engine = Rc::new(EventEngine::with_seed(config, 11));
        let mut workspaces = Workspaces::new();
        workspaces.insert(Workspace::new("ws", Rc::clone(&engine)));
        (engine, workspaces)
    }

    fn ws(workspaces: &mut Workspaces) -> &mut Workspace {
        workspaces.get_by_id_mut("ws").expect("workspace")
    }

    #[test]
    fn orphaned_statement_chain_is_disabled() {
        let (engine, mut workspaces) = setup();
        let stack = BlockState::new("text_print")
            .with_id("a")
            .statement()
            .with_next(BlockState::new("text_print").with_id("b").statement());
        ws(&mut workspaces).append_block(&stack).expect("append");
        engine.run_until_idle(&mut workspaces);

        let ws = ws(&mut workspaces);
        assert!(ws.block("a").is_some_and(|b| !b.enabled));
        assert!(ws.block("b").is_some_and(|b| !b.enabled));
        // Only the create is undoable.
        assert_eq!(ws.history().undo_stack().len(), 1);
    }

    #[test]
    fn hat_blocks_stay_enabled() {
        let (engine, mut workspaces) = setup();
        ws(&mut workspaces)
            .append_block(&BlockState::new("event_start").with_id("hat"))
            .expect("append");
        engine.run_until_idle(&mut workspaces);
        assert!(ws(&mut workspaces).block("hat").is_some_and(|b| b.enabled));
    }

    #[test]
    fn connecting_to_enabled_parent_reenables() {
        let (engine, mut workspaces) = setup();
        let mut hat = BlockState::new("event_start").with_id("hat");
        hat.has_next = true;
        ws(&mut workspaces).append_block(&hat).expect("append");
        ws(&mut workspaces)
            .append_block(&BlockState::new("text_print").with_id("p").statement())
            .expect("append");
        engine.run_until_idle(&mut workspaces);
        assert!(ws(&mut workspaces).block("p").is_some_and(|b| !b.enabled));

        assert!(ws(&mut workspaces).connect("p", "hat", Slot::Next));
        engine.run_until_idle(&mut workspaces);
        let ws = ws(&mut workspaces);
        assert!(ws.block("p").is_some_and(|b| b.enabled));

        // Two creates and the connecting move; the enable toggles stay out.
        let undo = ws.history().undo_stack();
        assert_eq!(undo.len(), 3);
        assert!(matches!(
            undo.last().map(|e| &e.payload),
            Some(EventPayload::BlockMove(mv)) if mv.block_id == "p"
        ));
        assert!(!undo.iter().any(|e| matches!(e.payload, EventPayload::BlockChange(_))));
    }

    #[test]
    fn unplugged_chain_is_disabled() {
        let (engine, mut workspaces) = setup();
        let stack = BlockState::new("event_start").with_id("hat").with_next(
            BlockState::new("text_print")
                .with_id("a")
                .statement()
                .with_next(BlockState::new("text_print").with_id("b").statement()),
        );
        ws(&mut workspaces).append_block(&stack).expect("append");
        engine.run_until_idle(&mut workspaces);
        assert!(ws(&mut workspaces).block("a").is_some_and(|b| b.enabled));

        assert!(ws(&mut workspaces).unplug("a"));
        engine.run_until_idle(&mut workspaces);

        let ws = ws(&mut workspaces);
        assert!(ws.block("hat").is_some_and(|b| b.enabled));
        assert!(ws.block("a").is_some_and(|b| !b.enabled));
        assert!(ws.block("b").is_some_and(|b| !b.enabled));
        assert_eq!(ws.history().undo_stack().len(), 2);
    }

    #[test]
    fn dragging_defers_disabling() {
        let (engine, mut workspaces) = setup();
        ws(&mut workspaces)
            .append_block(&BlockState::new("text_print").with_id("p").statement())
            .expect("append");
        engine.run_until_idle(&mut workspaces);
        ws(&mut workspaces).set_block_enabled("p", true);
        ws(&mut workspaces).start_block_drag("p");
        ws(&mut workspaces).move_block_to("p", crate::event::Coordinate::new(40.0, 40.0));
        engine.run_until_idle(&mut workspaces);
        assert!(ws(&mut workspaces).block("p").is_some_and(|b| b.enabled));
    }
}

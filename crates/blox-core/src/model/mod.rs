//! In-memory document model: workspaces holding blocks, comments, variables
//! and procedures.
//!
//! Every public mutator fires the matching event through the workspace's
//! engine, so listeners and undo history see the same stream a replay would
//! produce.

pub mod block;
pub mod comment;
pub mod procedure;
pub mod variable;

use crate::engine::EventEngine;
use crate::error::EventError;
use crate::event::comment::{CommentCreate, CommentDelete, CommentMove, CommentResize};
use crate::event::ui::{BlockDrag, Notice};
use crate::event::{
    BlockChange, BlockCreate, BlockDelete, BlockFieldIntermediateChange, BlockMove, ChangeElement,
    ChangeReturn, CommentChange, CommentCollapse, Coordinate, Event, EventPayload, ParameterRename,
    ParameterSnapshot, ProcedureEnable, ProcedureRename, ProcedureSnapshot, Size, VarRename,
    VarSnapshot, VarTypeChange,
};
use crate::undo::UndoHistory;
use block::{Block, BlockState, InputState, ParentLink, Slot};
use comment::{CommentState, WorkspaceComment};
use procedure::{ParameterModel, ProcedureMap, ProcedureModel};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;
use tracing::error;
use variable::{VariableMap, VariableModel};

/// Callback invoked for every event delivered to a workspace.
pub type ChangeListener = Box<dyn FnMut(&mut Workspace, &Event) -> anyhow::Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Offset applied to a block bumped out of an occupied connection.
const BUMP_OFFSET: f64 = 25.0;

/// Serialized workspace contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceState {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedures: Vec<ProcedureModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<BlockState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<CommentState>,
}

pub struct Workspace {
    id: String,
    engine: Rc<EventEngine>,
    blocks: BTreeMap<String, Block>,
    /// Top-level block ids, oldest first.
    top_blocks: Vec<String>,
    comments: BTreeMap<String, WorkspaceComment>,
    variables: VariableMap,
    procedures: ProcedureMap,
    history: UndoHistory,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener: u64,
    removed_listeners: Vec<ListenerId>,
    /// Listeners taken out of `listeners` while an event is delivered.
    in_flight: Vec<ListenerId>,
    dragging: bool,
    /// Field values captured when an in-progress edit started.
    editing: BTreeMap<(String, String), Value>,
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("id", &self.id)
            .field("blocks", &self.blocks.len())
            .field("comments", &self.comments.len())
            .field("variables", &self.variables.len())
            .field("procedures", &self.procedures.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Workspace {
    #[must_use]
    pub fn new(id: impl Into<String>, engine: Rc<EventEngine>) -> Self {
        let max_undo = engine.config().max_undo;
        let install_orphans = engine.config().disable_orphans;
        let mut ws = Self {
            id: id.into(),
            engine,
            blocks: BTreeMap::new(),
            top_blocks: Vec::new(),
            comments: BTreeMap::new(),
            variables: VariableMap::default(),
            procedures: ProcedureMap::default(),
            history: UndoHistory::new(max_undo),
            listeners: Vec::new(),
            next_listener: 0,
            removed_listeners: Vec::new(),
            in_flight: Vec::new(),
            dragging: false,
            editing: BTreeMap::new(),
        };
        if install_orphans {
            ws.add_change_listener(crate::orphans::disable_orphans);
        }
        ws
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn engine(&self) -> &Rc<EventEngine> {
        &self.engine
    }

    // -----------------------------------------------------------------------
    // Events and listeners
    // -----------------------------------------------------------------------

    /// Bind `payload` to this workspace and the engine's current group.
    #[must_use]
    pub fn event(&self, payload: EventPayload) -> Event {
        self.engine.bind(&self.id, payload)
    }

    pub fn fire(&self, payload: EventPayload) {
        self.engine.fire(self.event(payload));
    }

    /// Creating, deleting or moving a shadow block is a side effect of its
    /// parent's connections, so those events never enter undo history.
    fn fire_block(&self, block_id: &str, payload: EventPayload) {
        let mut event = self.event(payload);
        if self.blocks.get(block_id).is_some_and(|b| b.shadow) {
            event.record_undo = false;
        }
        self.engine.fire(event);
    }

    pub fn add_change_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&mut Self, &Event) -> anyhow::Result<()> + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` is not registered. During delivery the
    /// listener is skipped for the rest of the current event.
    pub fn remove_change_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        if self.listeners.len() != before {
            return true;
        }
        if self.in_flight.contains(&id) && !self.removed_listeners.contains(&id) {
            self.removed_listeners.push(id);
            return true;
        }
        false
    }

    /// Record `event` for undo, then invoke every listener in registration
    /// order. A failing listener is logged and does not stop the others.
    pub fn fire_change_listener(&mut self, event: &Event) {
        self.history.record(event);

        let mut listeners = std::mem::take(&mut self.listeners);
        self.in_flight = listeners.iter().map(|(id, _)| *id).collect();
        for (id, listener) in &mut listeners {
            if self.removed_listeners.contains(id) {
                continue;
            }
            if let Err(err) = listener(self, event) {
                error!(
                    workspace_id = %self.id,
                    listener = id.0,
                    kind = event.kind_str(),
                    error = %err,
                    "change listener failed"
                );
            }
        }
        self.in_flight.clear();

        let added = std::mem::replace(&mut self.listeners, listeners);
        self.listeners.extend(added);
        let removed = std::mem::take(&mut self.removed_listeners);
        self.listeners.retain(|(id, _)| !removed.contains(id));
    }

    // -----------------------------------------------------------------------
    // Undo
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// Undo (or redo) the most recent group of events.
    ///
    /// # Errors
    ///
    /// Propagates replay errors; events after the failing one are not run.
    /// The whole batch has already moved to the opposite stack by then, so
    /// history reports it as undone even though the document is only partly
    /// rolled back.
    pub fn undo(&mut self, redo: bool) -> Result<(), EventError> {
        let batch = self.history.take_batch(redo);
        if batch.is_empty() {
            return Ok(());
        }
        let engine = Rc::clone(&self.engine);
        let _suppressed = engine.suppress_undo();
        for event in &batch {
            event.run(redo, self)?;
        }
        Ok(())
    }

    /// Drop both stacks and stop queued events from being recorded.
    pub fn clear_undo(&mut self) {
        self.history.clear();
        self.engine.clear_pending_undo();
    }

    pub(crate) fn squash_undo_tail(&mut self) {
        self.history.squash_tail();
    }

    // -----------------------------------------------------------------------
    // Block queries
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    #[must_use]
    pub fn top_block_ids(&self) -> &[String] {
        &self.top_blocks
    }

    fn child_at(&self, parent_id: &str, slot: &Slot) -> Option<&Block> {
        self.blocks.values().find(|b| {
            b.parent
                .as_ref()
                .is_some_and(|link| link.parent_id == parent_id && link.slot == *slot)
        })
    }

    #[must_use]
    pub fn parent_block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(self.blocks.get(id)?.parent_id()?)
    }

    /// The block attached to `id`'s next connection.
    #[must_use]
    pub fn next_block(&self, id: &str) -> Option<&Block> {
        self.child_at(id, &Slot::Next)
    }

    /// The block plugged into input `name` of `id`.
    #[must_use]
    pub fn input_block(&self, id: &str, name: &str) -> Option<&Block> {
        self.child_at(id, &Slot::Input(name.to_string()))
    }

    /// `id` and everything below it, pre-order: inputs in declaration order,
    /// then the next block.
    #[must_use]
    pub fn descendant_ids(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: &str, out: &mut Vec<String>) {
        let Some(block) = self.blocks.get(id) else {
            return;
        };
        out.push(block.id.clone());
        for name in &block.inputs {
            if let Some(child) = self.child_at(id, &Slot::Input(name.clone())) {
                self.collect_descendants(&child.id, out);
            }
        }
        if let Some(next) = self.child_at(id, &Slot::Next) {
            self.collect_descendants(&next.id, out);
        }
    }

    fn root_id<'a>(&'a self, mut id: &'a str) -> &'a str {
        while let Some(parent) = self.blocks.get(id).and_then(Block::parent_id) {
            id = parent;
        }
        id
    }

    /// Snapshot of the block tree rooted at `id`.
    #[must_use]
    pub fn block_state(&self, id: &str) -> Option<BlockState> {
        let block = self.blocks.get(id)?;
        let mut state = BlockState::new(block.block_type.as_str()).with_id(block.id.as_str());
        if block.parent.is_none() {
            state.x = Some(block.coordinate.x);
            state.y = Some(block.coordinate.y);
        }
        state.collapsed = block.collapsed;
        state.enabled = block.enabled;
        state.inline = block.inputs_inline;
        state.shadow = block.shadow;
        state.has_output = block.has_output;
        state.has_previous = block.has_previous;
        state.has_next = block.has_next;
        state.extra_state.clone_from(&block.mutation);
        state.comment.clone_from(&block.comment);
        state.fields.clone_from(&block.fields);
        for name in &block.inputs {
            let child = self
                .child_at(id, &Slot::Input(name.clone()))
                .and_then(|child| self.block_state(&child.id));
            state.inputs.insert(
                name.clone(),
                InputState {
                    block: child.map(Box::new),
                },
            );
        }
        state.next = self
            .child_at(id, &Slot::Next)
            .and_then(|next| self.block_state(&next.id))
            .map(Box::new);
        Some(state)
    }

    // -----------------------------------------------------------------------
    // Block lifecycle
    // -----------------------------------------------------------------------

    /// Insert a block tree as a new top-level stack and fire `create`.
    /// Blocks without an id get a generated one.
    ///
    /// # Errors
    ///
    /// [`EventError::DuplicateId`] if any id in the tree is already in use.
    pub fn append_block(&mut self, state: &BlockState) -> Result<String, EventError> {
        let mut seen = HashSet::new();
        for id in state.ids() {
            if self.blocks.contains_key(&id) || !seen.insert(id.clone()) {
                return Err(EventError::DuplicateId(id));
            }
        }
        let root_id = self.insert_tree(state, None);
        self.top_blocks.push(root_id.clone());
        if let Some(create) = BlockCreate::capture(self, &root_id) {
            self.fire_block(&root_id, EventPayload::BlockCreate(create));
        }
        Ok(root_id)
    }

    fn insert_tree(&mut self, state: &BlockState, parent: Option<ParentLink>) -> String {
        let id = state.id.clone().unwrap_or_else(|| self.engine.new_id());
        let block = Block {
            id: id.clone(),
            block_type: state.block_type.clone(),
            fields: state.fields.clone(),
            inputs: state.inputs.keys().cloned().collect(),
            parent,
            coordinate: Coordinate::new(state.x.unwrap_or(0.0), state.y.unwrap_or(0.0)),
            enabled: state.enabled,
            collapsed: state.collapsed,
            inputs_inline: state.inline,
            comment: state.comment.clone(),
            mutation: state.extra_state.clone(),
            shadow: state.shadow,
            has_output: state.has_output,
            has_previous: state.has_previous,
            has_next: state.has_next,
        };
        self.blocks.insert(id.clone(), block);
        for (name, input) in &state.inputs {
            if let Some(child) = &input.block {
                let link = ParentLink {
                    parent_id: id.clone(),
                    slot: Slot::Input(name.clone()),
                };
                self.insert_tree(child, Some(link));
            }
        }
        if let Some(next) = &state.next {
            let link = ParentLink {
                parent_id: id.clone(),
                slot: Slot::Next,
            };
            self.insert_tree(next, Some(link));
        }
        id
    }

    /// Unplug `id` if attached, fire `delete`, and remove it with its
    /// descendants. Returns `Ok(false)` if the block does not exist.
    ///
    /// # Errors
    ///
    /// [`EventError::ConnectedDelete`] if the block could not be detached.
    pub fn dispose_block(&mut self, id: &str) -> Result<bool, EventError> {
        if !self.blocks.contains_key(id) {
            return Ok(false);
        }
        self.unplug(id);
        if let Some(delete) = BlockDelete::capture(self, id)? {
            self.fire_block(id, EventPayload::BlockDelete(delete));
        }
        for gone in self.descendant_ids(id) {
            self.blocks.remove(&gone);
            self.editing.retain(|(block_id, _), _| *block_id != gone);
        }
        self.top_blocks.retain(|top| top != id);
        Ok(true)
    }

    fn detach(&mut self, id: &str) {
        if let Some(block) = self.blocks.get_mut(id) {
            if block.parent.take().is_some() {
                self.top_blocks.push(id.to_string());
            }
        }
    }

    /// Detach `id` to the top level at its stack's position plus `offset`,
    /// firing a move tagged with `reason`.
    fn release(&mut self, id: &str, offset: f64, reason: &str) -> bool {
        let Some(block) = self.blocks.get(id) else {
            return false;
        };
        if block.parent.is_none() {
            return false;
        }
        let Some(mut mv) = BlockMove::capture(self, id) else {
            return false;
        };
        let root = self.root_id(id);
        let xy = self
            .blocks
            .get(root)
            .map(|b| Coordinate::new(b.coordinate.x + offset, b.coordinate.y + offset))
            .unwrap_or_default();
        self.detach(id);
        if let Some(block) = self.blocks.get_mut(id) {
            block.coordinate = xy;
        }
        mv.record_new(self);
        mv.reason.push(reason.to_string());
        self.fire_block(id, EventPayload::BlockMove(mv));
        true
    }

    /// Disconnect `id` (and the stack below it) from its parent.
    pub fn unplug(&mut self, id: &str) -> bool {
        self.release(id, 0.0, "unplug")
    }

    /// Attach `child_id` to `parent_id` at `slot`. A block already occupying
    /// the slot is bumped to the top level.
    pub fn connect(&mut self, child_id: &str, parent_id: &str, slot: Slot) -> bool {
        let Some(parent) = self.blocks.get(parent_id) else {
            return false;
        };
        let slot_exists = match &slot {
            Slot::Input(name) => parent.inputs.contains(name),
            Slot::Next => parent.has_next,
        };
        if !slot_exists
            || !self.blocks.contains_key(child_id)
            || self.descendant_ids(child_id).iter().any(|id| id == parent_id)
        {
            return false;
        }
        let Some(mut mv) = BlockMove::capture(self, child_id) else {
            return false;
        };

        let occupant = self
            .child_at(parent_id, &slot)
            .map(|b| b.id.clone())
            .filter(|occupant| occupant != child_id);
        if let Some(occupant) = occupant {
            self.release(&occupant, BUMP_OFFSET, "bump");
        }

        self.detach(child_id);
        self.top_blocks.retain(|top| top != child_id);
        if let Some(block) = self.blocks.get_mut(child_id) {
            block.parent = Some(ParentLink {
                parent_id: parent_id.to_string(),
                slot,
            });
        }
        mv.record_new(self);
        mv.reason.push("connect".into());
        self.fire_block(child_id, EventPayload::BlockMove(mv));
        true
    }

    /// Move `id` to `xy` as a top-level block, detaching it if needed.
    pub fn move_block_to(&mut self, id: &str, xy: Coordinate) -> bool {
        let Some(mut mv) = BlockMove::capture(self, id) else {
            return false;
        };
        self.detach(id);
        if let Some(block) = self.blocks.get_mut(id) {
            block.coordinate = xy;
        }
        mv.record_new(self);
        mv.reason.push("drag".into());
        self.fire_block(id, EventPayload::BlockMove(mv));
        true
    }

    /// Fire `drag` start and mark the workspace as dragging.
    pub fn start_block_drag(&mut self, id: &str) -> bool {
        if !self.blocks.contains_key(id) {
            return false;
        }
        self.dragging = true;
        let blocks = self.descendant_ids(id);
        self.fire(EventPayload::BlockDrag(BlockDrag {
            block_id: Some(id.to_string()),
            is_start: true,
            blocks,
        }));
        true
    }

    pub fn end_block_drag(&mut self, id: &str) -> bool {
        if !self.blocks.contains_key(id) {
            return false;
        }
        self.dragging = false;
        let blocks = self.descendant_ids(id);
        self.fire(EventPayload::BlockDrag(BlockDrag {
            block_id: Some(id.to_string()),
            is_start: false,
            blocks,
        }));
        true
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    // -----------------------------------------------------------------------
    // Block properties
    // -----------------------------------------------------------------------

    /// Apply `update` to block `id` and fire a change if the value moved.
    /// `update` returns `(old, new)` or `None` if it could not apply.
    fn update_block<F>(&mut self, id: &str, element: ChangeElement, name: Option<&str>, update: F) -> bool
    where
        F: FnOnce(&mut Block) -> Option<(Value, Value)>,
    {
        let Some(block) = self.blocks.get_mut(id) else {
            return false;
        };
        let Some((old, new)) = update(block) else {
            return false;
        };
        if old != new {
            let change = BlockChange::new(id, element, name, old, new);
            self.fire(EventPayload::BlockChange(change));
        }
        true
    }

    /// Set an existing field. Returns `false` if the block or field is
    /// missing.
    pub fn set_field_value(&mut self, id: &str, name: &str, value: Value) -> bool {
        self.update_block(id, ChangeElement::Field, Some(name), |block| {
            let slot = block.fields.get_mut(name)?;
            let old = std::mem::replace(slot, value);
            Some((old, slot.clone()))
        })
    }

    /// Keystroke-level edit: updates the field and fires an intermediate
    /// change. Close the edit with [`Self::finish_field_edit`].
    pub fn set_field_value_intermediate(&mut self, id: &str, name: &str, value: Value) -> bool {
        let Some(old) = self.blocks.get(id).and_then(|b| b.fields.get(name)).cloned() else {
            return false;
        };
        self.editing
            .entry((id.to_string(), name.to_string()))
            .or_insert_with(|| old.clone());
        self.write_field_silently(id, name, value.clone());
        if old != value {
            let change = BlockFieldIntermediateChange {
                block_id: id.to_string(),
                name: name.to_string(),
                old_value: old,
                new_value: value,
            };
            self.fire(EventPayload::BlockFieldIntermediateChange(change));
        }
        true
    }

    /// Fire the completing change for an in-progress edit, spanning from the
    /// value before the first intermediate edit to the current value.
    pub fn finish_field_edit(&mut self, id: &str, name: &str) -> bool {
        let Some(current) = self.blocks.get(id).and_then(|b| b.fields.get(name)).cloned() else {
            return false;
        };
        let original = self
            .editing
            .remove(&(id.to_string(), name.to_string()))
            .unwrap_or_else(|| current.clone());
        let mut change = BlockChange::new(id, ChangeElement::Field, Some(name), original, current);
        change.completes_intermediate = true;
        self.fire(EventPayload::BlockChange(change));
        true
    }

    pub(crate) fn write_field_silently(&mut self, id: &str, name: &str, value: Value) -> bool {
        match self.blocks.get_mut(id).and_then(|b| b.fields.get_mut(name)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn set_block_enabled(&mut self, id: &str, enabled: bool) -> bool {
        self.update_block(id, ChangeElement::Disabled, None, |block| {
            let old = !block.enabled;
            block.enabled = enabled;
            Some((Value::Bool(old), Value::Bool(!enabled)))
        })
    }

    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) -> bool {
        self.update_block(id, ChangeElement::Collapsed, None, |block| {
            let old = std::mem::replace(&mut block.collapsed, collapsed);
            Some((Value::Bool(old), Value::Bool(collapsed)))
        })
    }

    pub fn set_inputs_inline(&mut self, id: &str, inline: bool) -> bool {
        self.update_block(id, ChangeElement::Inline, None, |block| {
            let old = block.inputs_inline.replace(inline);
            Some((Value::from(old), Value::Bool(inline)))
        })
    }

    pub fn set_block_comment(&mut self, id: &str, text: Option<String>) -> bool {
        self.update_block(id, ChangeElement::Comment, None, |block| {
            let old = std::mem::replace(&mut block.comment, text.clone());
            Some((Value::from(old), Value::from(text)))
        })
    }

    /// Replace the block's mutator extra state and fire a `mutation` change.
    pub fn set_mutation(&mut self, id: &str, extra_state: Option<String>) -> bool {
        self.update_block(id, ChangeElement::Mutation, None, |block| {
            let old = std::mem::replace(&mut block.mutation, extra_state.clone());
            Some((Value::from(old), Value::from(extra_state)))
        })
    }

    // -----------------------------------------------------------------------
    // Workspace comments
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn comment(&self, id: &str) -> Option<&WorkspaceComment> {
        self.comments.get(id)
    }

    pub fn comments(&self) -> impl Iterator<Item = &WorkspaceComment> {
        self.comments.values()
    }

    /// # Errors
    ///
    /// [`EventError::DuplicateId`] if the comment id is already in use.
    pub fn create_comment(&mut self, state: &CommentState) -> Result<String, EventError> {
        let id = state.id.clone().unwrap_or_else(|| self.engine.new_id());
        if self.comments.contains_key(&id) {
            return Err(EventError::DuplicateId(id));
        }
        self.comments.insert(
            id.clone(),
            WorkspaceComment {
                id: id.clone(),
                content: state.text.clone(),
                coordinate: Coordinate::new(state.x, state.y),
                size: Size::new(state.width, state.height),
                collapsed: state.collapsed,
            },
        );
        if let Some(create) = CommentCreate::capture(self, &id) {
            self.fire(EventPayload::CommentCreate(create));
        }
        Ok(id)
    }

    pub fn delete_comment(&mut self, id: &str) -> bool {
        let Some(delete) = CommentDelete::capture(self, id) else {
            return false;
        };
        self.fire(EventPayload::CommentDelete(delete));
        self.comments.remove(id);
        true
    }

    pub fn set_comment_content(&mut self, id: &str, text: &str) -> bool {
        let Some(comment) = self.comments.get_mut(id) else {
            return false;
        };
        let old_contents = std::mem::replace(&mut comment.content, text.to_string());
        if old_contents != text {
            self.fire(EventPayload::CommentChange(CommentChange {
                comment_id: id.to_string(),
                old_contents,
                new_contents: text.to_string(),
            }));
        }
        true
    }

    pub fn move_comment(&mut self, id: &str, xy: Coordinate) -> bool {
        let Some(mut mv) = CommentMove::capture(self, id) else {
            return false;
        };
        if let Some(comment) = self.comments.get_mut(id) {
            comment.coordinate = xy;
        }
        mv.record_new(self);
        self.fire(EventPayload::CommentMove(mv));
        true
    }

    pub fn resize_comment(&mut self, id: &str, size: Size) -> bool {
        let Some(mut resize) = CommentResize::capture(self, id) else {
            return false;
        };
        if let Some(comment) = self.comments.get_mut(id) {
            comment.size = size;
        }
        resize.record_new(self);
        self.fire(EventPayload::CommentResize(resize));
        true
    }

    pub fn set_comment_collapsed(&mut self, id: &str, collapsed: bool) -> bool {
        let Some(comment) = self.comments.get_mut(id) else {
            return false;
        };
        if std::mem::replace(&mut comment.collapsed, collapsed) != collapsed {
            self.fire(EventPayload::CommentCollapse(CommentCollapse {
                comment_id: id.to_string(),
                new_collapsed: collapsed,
            }));
        }
        true
    }

    // -----------------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn variable_map(&self) -> &VariableMap {
        &self.variables
    }

    /// Create a variable, or return the id of the existing variable with the
    /// same name and type.
    ///
    /// # Errors
    ///
    /// [`EventError::DuplicateId`] if `id` is taken, or if a variable with
    /// this name and type exists under a different id.
    pub fn create_variable(
        &mut self,
        name: &str,
        var_type: &str,
        id: Option<&str>,
    ) -> Result<String, EventError> {
        if let Some(existing) = self.variables.get(name, var_type) {
            if id.is_some_and(|id| id != existing.id) {
                return Err(EventError::DuplicateId(name.to_string()));
            }
            return Ok(existing.id.clone());
        }
        if let Some(id) = id {
            if self.variables.get_by_id(id).is_some() {
                return Err(EventError::DuplicateId(id.to_string()));
            }
        }
        let model = VariableModel {
            id: id.map_or_else(|| self.engine.new_id(), str::to_string),
            name: name.to_string(),
            var_type: var_type.to_string(),
        };
        let snapshot = VarSnapshot::from(&model);
        let id = model.id.clone();
        self.variables.insert(model);
        self.fire(EventPayload::VarCreate(snapshot));
        Ok(id)
    }

    pub fn delete_variable_by_id(&mut self, id: &str) -> bool {
        let Some(model) = self.variables.get_by_id(id) else {
            return false;
        };
        let snapshot = VarSnapshot::from(model);
        self.fire(EventPayload::VarDelete(snapshot));
        self.variables.remove(id);
        true
    }

    pub fn rename_variable_by_id(&mut self, id: &str, new_name: &str) -> bool {
        let Some(model) = self.variables.get_mut(id) else {
            return false;
        };
        let old_name = std::mem::replace(&mut model.name, new_name.to_string());
        self.fire(EventPayload::VarRename(VarRename {
            var_id: id.to_string(),
            old_name,
            new_name: new_name.to_string(),
        }));
        true
    }

    pub fn change_variable_type(&mut self, id: &str, new_type: &str) -> bool {
        let Some(model) = self.variables.get_mut(id) else {
            return false;
        };
        let old_type = std::mem::replace(&mut model.var_type, new_type.to_string());
        self.fire(EventPayload::VarTypeChange(VarTypeChange {
            var_id: id.to_string(),
            old_type,
            new_type: new_type.to_string(),
        }));
        true
    }

    // -----------------------------------------------------------------------
    // Procedures
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn procedure_map(&self) -> &ProcedureMap {
        &self.procedures
    }

    fn procedure_mut(&mut self, id: &str) -> Result<&mut ProcedureModel, EventError> {
        self.procedures
            .get_mut(id)
            .ok_or_else(|| EventError::ProcedureNotFound(id.to_string()))
    }

    /// # Errors
    ///
    /// [`EventError::DuplicateId`] if the procedure id is already in use.
    pub fn add_procedure(&mut self, model: ProcedureModel) -> Result<(), EventError> {
        if self.procedures.contains(&model.id) {
            return Err(EventError::DuplicateId(model.id));
        }
        let snapshot = ProcedureSnapshot {
            procedure: model.clone(),
        };
        self.procedures.insert(model);
        self.fire(EventPayload::ProcedureCreate(snapshot));
        Ok(())
    }

    pub fn delete_procedure(&mut self, id: &str) -> bool {
        let Some(model) = self.procedures.remove(id) else {
            return false;
        };
        self.fire(EventPayload::ProcedureDelete(ProcedureSnapshot { procedure: model }));
        true
    }

    /// # Errors
    ///
    /// [`EventError::ProcedureNotFound`] if `id` is not in the map.
    pub fn rename_procedure(&mut self, id: &str, name: &str) -> Result<(), EventError> {
        let model = self.procedure_mut(id)?;
        let old_name = std::mem::replace(&mut model.name, name.to_string());
        self.fire(EventPayload::ProcedureRename(ProcedureRename {
            procedure_id: id.to_string(),
            old_name,
            new_name: name.to_string(),
        }));
        Ok(())
    }

    /// # Errors
    ///
    /// [`EventError::ProcedureNotFound`] if `id` is not in the map.
    pub fn set_procedure_enabled(&mut self, id: &str, enabled: bool) -> Result<(), EventError> {
        let model = self.procedure_mut(id)?;
        if std::mem::replace(&mut model.enabled, enabled) != enabled {
            self.fire(EventPayload::ProcedureEnable(ProcedureEnable {
                procedure_id: id.to_string(),
                new_state: enabled,
            }));
        }
        Ok(())
    }

    /// Insert `parameter` at `index` (clamped to the parameter count).
    ///
    /// # Errors
    ///
    /// [`EventError::ProcedureNotFound`] if `procedure_id` is not in the map.
    pub fn insert_parameter(
        &mut self,
        procedure_id: &str,
        parameter: ParameterModel,
        index: usize,
    ) -> Result<(), EventError> {
        let model = self.procedure_mut(procedure_id)?;
        let index = index.min(model.parameters.len());
        model.parameters.insert(index, parameter.clone());
        self.fire(EventPayload::ProcedureParameterCreate(ParameterSnapshot {
            procedure_id: procedure_id.to_string(),
            parameter,
            index,
        }));
        Ok(())
    }

    /// # Errors
    ///
    /// [`EventError::ProcedureNotFound`] or [`EventError::ParameterNotFound`]
    /// if the procedure or index does not exist.
    pub fn delete_parameter(&mut self, procedure_id: &str, index: usize) -> Result<(), EventError> {
        let model = self.procedure_mut(procedure_id)?;
        if index >= model.parameters.len() {
            return Err(EventError::ParameterNotFound {
                procedure: procedure_id.to_string(),
                parameter: index.to_string(),
            });
        }
        let parameter = model.parameters.remove(index);
        self.fire(EventPayload::ProcedureParameterDelete(ParameterSnapshot {
            procedure_id: procedure_id.to_string(),
            parameter,
            index,
        }));
        Ok(())
    }

    /// # Errors
    ///
    /// [`EventError::ProcedureNotFound`] or [`EventError::ParameterNotFound`]
    /// if the procedure or parameter does not exist.
    pub fn rename_parameter(
        &mut self,
        procedure_id: &str,
        parameter_id: &str,
        name: &str,
    ) -> Result<(), EventError> {
        let model = self.procedure_mut(procedure_id)?;
        let parameter = model
            .parameters
            .iter_mut()
            .find(|p| p.id == parameter_id)
            .ok_or_else(|| EventError::ParameterNotFound {
                procedure: procedure_id.to_string(),
                parameter: parameter_id.to_string(),
            })?;
        let old_name = std::mem::replace(&mut parameter.name, name.to_string());
        self.fire(EventPayload::ProcedureParameterRename(ParameterRename {
            procedure_id: procedure_id.to_string(),
            parameter_id: parameter_id.to_string(),
            old_name,
            new_name: name.to_string(),
        }));
        Ok(())
    }

    /// # Errors
    ///
    /// [`EventError::ProcedureNotFound`] if `procedure_id` is not in the map.
    pub fn set_return_types(
        &mut self,
        procedure_id: &str,
        types: Option<Vec<String>>,
    ) -> Result<(), EventError> {
        let model = self.procedure_mut(procedure_id)?;
        let old_types = std::mem::replace(&mut model.return_types, types.clone());
        self.fire(EventPayload::ProcedureChangeReturn(ChangeReturn {
            procedure_id: procedure_id.to_string(),
            old_types,
            new_types: types,
        }));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Whole-workspace state
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> WorkspaceState {
        WorkspaceState {
            variables: self.variables.iter().cloned().collect(),
            procedures: self.procedures.iter().cloned().collect(),
            blocks: self
                .top_blocks
                .iter()
                .filter_map(|id| self.block_state(id))
                .collect(),
            comments: self.comments.values().map(WorkspaceComment::state).collect(),
        }
    }

    /// Load `state` with events disabled, then fire `finished_loading`.
    ///
    /// # Errors
    ///
    /// [`EventError::DuplicateId`] if anything in `state` collides with
    /// existing contents.
    pub fn load_state(&mut self, state: &WorkspaceState) -> Result<(), EventError> {
        self.engine.disable();
        let loaded = self.load_contents(state);
        self.engine.enable();
        loaded?;
        self.fire(EventPayload::FinishedLoading(Notice::default()));
        Ok(())
    }

    fn load_contents(&mut self, state: &WorkspaceState) -> Result<(), EventError> {
        for variable in &state.variables {
            self.create_variable(&variable.name, &variable.var_type, Some(&variable.id))?;
        }
        for procedure in &state.procedures {
            self.add_procedure(procedure.clone())?;
        }
        for block in &state.blocks {
            self.append_block(block)?;
        }
        for comment in &state.comments {
            self.create_comment(comment)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Workspace registry
// ---------------------------------------------------------------------------

/// Workspaces addressable by id, the lookup the engine delivers through.
#[derive(Debug, Default)]
pub struct Workspaces {
    by_id: BTreeMap<String, Workspace>,
}

impl Workspaces {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ws`, returning any workspace it replaced.
    pub fn insert(&mut self, ws: Workspace) -> Option<Workspace> {
        self.by_id.insert(ws.id.clone(), ws)
    }

    pub fn remove(&mut self, id: &str) -> Option<Workspace> {
        self.by_id.remove(id)
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Workspace> {
        self.by_id.get(id)
    }

    pub fn get_by_id_mut(&mut self, id: &str) -> Option<&mut Workspace> {
        self.by_id.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Workspace> {
        self.by_id.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

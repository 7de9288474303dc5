//! Block lifecycle payloads: create, delete, change, move, and in-progress
//! field edits.

use super::coord::{Capture, Coordinate};
use crate::error::EventError;
use crate::model::block::{BlockState, Slot};
use crate::model::Workspace;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

// ---------------------------------------------------------------------------
// Create / delete
// ---------------------------------------------------------------------------

/// A block tree was added. Carries a full snapshot so it can be re-inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockCreate {
    pub block_id: String,
    pub json: BlockState,
    /// Root and descendant ids, pre-order.
    pub ids: Vec<String>,
}

impl BlockCreate {
    /// Snapshot the live block `block_id`. `None` if it does not exist.
    #[must_use]
    pub fn capture(ws: &Workspace, block_id: &str) -> Option<Self> {
        Some(Self {
            block_id: block_id.to_string(),
            json: ws.block_state(block_id)?,
            ids: ws.descendant_ids(block_id),
        })
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        if forward {
            insert_snapshot(ws, &self.block_id, &self.json)
        } else {
            dispose_ids(ws, &self.block_id, &self.ids, "uncreate")
        }
    }
}

/// A block tree was removed. Symmetric to [`BlockCreate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDelete {
    pub block_id: String,
    pub old_json: BlockState,
    pub ids: Vec<String>,
}

impl BlockDelete {
    /// Snapshot a top-level block before it is disposed.
    ///
    /// # Errors
    ///
    /// [`EventError::ConnectedDelete`] if the block still has a parent.
    pub fn capture(ws: &Workspace, block_id: &str) -> Result<Option<Self>, EventError> {
        let Some(block) = ws.block(block_id) else {
            return Ok(None);
        };
        if block.parent.is_some() {
            return Err(EventError::ConnectedDelete(block_id.to_string()));
        }
        Ok(ws.block_state(block_id).map(|old_json| Self {
            block_id: block_id.to_string(),
            old_json,
            ids: ws.descendant_ids(block_id),
        }))
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        if forward {
            dispose_ids(ws, &self.block_id, &self.ids, "delete")
        } else {
            insert_snapshot(ws, &self.block_id, &self.old_json)
        }
    }
}

fn insert_snapshot(ws: &mut Workspace, block_id: &str, state: &BlockState) -> Result<(), EventError> {
    if ws.block(block_id).is_some() {
        warn!(block_id, "can't create block that already exists");
        return Ok(());
    }
    ws.append_block(state).map(|_| ())
}

fn dispose_ids(
    ws: &mut Workspace,
    root_id: &str,
    ids: &[String],
    verb: &str,
) -> Result<(), EventError> {
    for id in ids {
        if ws.block(id).is_some() {
            ws.dispose_block(id)?;
        } else if id == root_id {
            // Descendants vanish with their root; only the root is worth a warning.
            warn!(block_id = %id, "can't {verb} non-existent block");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Change
// ---------------------------------------------------------------------------

/// Which property of a block a [`BlockChange`] touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeElement {
    Field,
    Comment,
    Collapsed,
    Disabled,
    Inline,
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockChange {
    pub block_id: String,
    pub element: ChangeElement,
    /// Field name for `field` changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub old_value: Value,
    #[serde(default)]
    pub new_value: Value,
    /// Set on the change that closes a run of intermediate field edits.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub completes_intermediate: bool,
}

impl BlockChange {
    #[must_use]
    pub fn new(
        block_id: impl Into<String>,
        element: ChangeElement,
        name: Option<&str>,
        old_value: Value,
        new_value: Value,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            element,
            name: name.map(str::to_string),
            old_value,
            new_value,
            completes_intermediate: false,
        }
    }

    /// Listeners that skipped the intermediate edits must still see the
    /// completing change, so it is never null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        !self.completes_intermediate && self.old_value == self.new_value
    }

    #[must_use]
    pub fn same_target(&self, other: &Self) -> bool {
        self.element == other.element && self.name == other.name
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        let id = self.block_id.as_str();
        if ws.block(id).is_none() {
            warn!(block_id = id, "can't change non-existent block");
            return Ok(());
        }
        let value = if forward { &self.new_value } else { &self.old_value };
        match self.element {
            ChangeElement::Field => {
                let name = self.name.as_deref().unwrap_or_default();
                if !ws.set_field_value(id, name, value.clone()) {
                    warn!(block_id = id, field = name, "can't set non-existent field");
                }
            }
            ChangeElement::Comment => {
                let text = value.as_str().filter(|s| !s.is_empty()).map(str::to_string);
                ws.set_block_comment(id, text);
            }
            ChangeElement::Collapsed => {
                ws.set_collapsed(id, truthy(value));
            }
            ChangeElement::Disabled => {
                ws.set_block_enabled(id, !truthy(value));
            }
            ChangeElement::Inline => {
                ws.set_inputs_inline(id, truthy(value));
            }
            ChangeElement::Mutation => {
                // Re-applying a mutation fires its own follow-up change
                // carrying the extra state it replaced.
                ws.set_mutation(id, value.as_str().map(str::to_string));
            }
        }
        Ok(())
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A keystroke-level field edit. Followed by a completing [`BlockChange`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFieldIntermediateChange {
    pub block_id: String,
    pub name: String,
    #[serde(default)]
    pub old_value: Value,
    #[serde(default)]
    pub new_value: Value,
}

impl BlockFieldIntermediateChange {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.old_value == self.new_value
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        if ws.block(&self.block_id).is_none() {
            warn!(block_id = %self.block_id, "can't change non-existent block");
            return Ok(());
        }
        let value = if forward { &self.new_value } else { &self.old_value };
        if !ws.write_field_silently(&self.block_id, &self.name, value.clone()) {
            warn!(block_id = %self.block_id, field = %self.name, "can't set non-existent field");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// Where a block sits: attached to a parent input, attached to a parent's
/// next connection, or free at a coordinate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Location {
    pub parent_id: Option<String>,
    pub input_name: Option<String>,
    pub coordinate: Option<Coordinate>,
}

impl Location {
    /// Current location of a live block.
    #[must_use]
    pub fn of(ws: &Workspace, block_id: &str) -> Option<Self> {
        let block = ws.block(block_id)?;
        Some(match &block.parent {
            Some(link) => Self {
                parent_id: Some(link.parent_id.clone()),
                input_name: link.slot.input_name().map(str::to_string),
                coordinate: None,
            },
            None => Self {
                parent_id: None,
                input_name: None,
                coordinate: Some(block.coordinate),
            },
        })
    }
}

/// A block moved. The old location is captured at construction, the new one
/// by [`BlockMove::record_new`] once the gesture ends.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMove {
    pub block_id: String,
    pub old: Location,
    pub new: Capture<Location>,
    /// Why the move happened (`drag`, `bump`, `connect`, ...).
    pub reason: Vec<String>,
}

impl BlockMove {
    #[must_use]
    pub fn capture(ws: &Workspace, block_id: &str) -> Option<Self> {
        Some(Self {
            block_id: block_id.to_string(),
            old: Location::of(ws, block_id)?,
            new: Capture::Capturing,
            reason: Vec::new(),
        })
    }

    pub fn record_new(&mut self, ws: &Workspace) {
        self.new.record(Location::of(ws, &self.block_id).unwrap_or_default());
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.new.recorded().is_some_and(|new| *new == self.old)
    }

    /// Fold a later adjacent move of the same block into this one.
    pub fn absorb(&mut self, later: &Self) {
        self.new = later.new.clone();
        for reason in &later.reason {
            if !self.reason.contains(reason) {
                self.reason.push(reason.clone());
            }
        }
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        let target = if forward {
            self.new.recorded().ok_or_else(|| EventError::MissingField {
                kind: "move".into(),
                field: "newCoordinate",
            })?
        } else {
            &self.old
        };
        let id = self.block_id.as_str();
        let Some(block) = ws.block(id) else {
            warn!(block_id = id, "can't move non-existent block");
            return Ok(());
        };
        let has_previous = block.has_previous;
        if let Some(parent_id) = &target.parent_id {
            if ws.block(parent_id).is_none() {
                warn!(block_id = id, parent_id = %parent_id, "can't connect to non-existent block");
                return Ok(());
            }
        }

        if let Some(xy) = target.coordinate {
            ws.move_block_to(id, xy);
        } else if let Some(parent_id) = &target.parent_id {
            let slot = match &target.input_name {
                Some(name) => Slot::Input(name.clone()),
                None if has_previous => Slot::Next,
                None => {
                    warn!(block_id = id, "can't connect to non-existent input");
                    return Ok(());
                }
            };
            if !ws.connect(id, parent_id, slot) {
                warn!(block_id = id, input = ?target.input_name, "can't connect to non-existent input");
            }
        }
        Ok(())
    }

    pub(crate) fn to_wire(&self) -> Result<BlockMoveWire, EventError> {
        let new = self.new.recorded().ok_or_else(|| EventError::MissingField {
            kind: "move".into(),
            field: "newCoordinate",
        })?;
        Ok(BlockMoveWire {
            block_id: self.block_id.clone(),
            old_parent_id: self.old.parent_id.clone(),
            old_input_name: self.old.input_name.clone(),
            old_coordinate: self.old.coordinate,
            new_parent_id: new.parent_id.clone(),
            new_input_name: new.input_name.clone(),
            new_coordinate: new.coordinate,
            reason: self.reason.clone(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BlockMoveWire {
    block_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_input_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_coordinate: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_input_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_coordinate: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    reason: Vec<String>,
}

impl From<BlockMoveWire> for BlockMove {
    fn from(wire: BlockMoveWire) -> Self {
        Self {
            block_id: wire.block_id,
            old: Location {
                parent_id: wire.old_parent_id,
                input_name: wire.old_input_name,
                coordinate: wire.old_coordinate,
            },
            new: Capture::Recorded(Location {
                parent_id: wire.new_parent_id,
                input_name: wire.new_input_name,
                coordinate: wire.new_coordinate,
            }),
            reason: wire.reason,
        }
    }
}

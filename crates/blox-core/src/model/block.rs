//! Blocks and their serialized snapshots.

use crate::event::coord::Coordinate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Where a block is attached on its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// A named value or statement input.
    Input(String),
    /// The parent's next-statement connection.
    Next,
}

impl Slot {
    #[must_use]
    pub fn input_name(&self) -> Option<&str> {
        match self {
            Self::Input(name) => Some(name),
            Self::Next => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub parent_id: String,
    pub slot: Slot,
}

/// A live block in a workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub block_type: String,
    pub fields: BTreeMap<String, Value>,
    /// Declared input names, in declaration order.
    pub inputs: Vec<String>,
    pub parent: Option<ParentLink>,
    /// Position when top-level; ignored while attached.
    pub coordinate: Coordinate,
    pub enabled: bool,
    pub collapsed: bool,
    pub inputs_inline: Option<bool>,
    pub comment: Option<String>,
    /// Serialized mutator extra state.
    pub mutation: Option<String>,
    pub shadow: bool,
    pub has_output: bool,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Block {
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().map(|link| link.parent_id.as_str())
    }
}

/// Serialized block tree, used by create/delete events and workspace loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockState {
    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub shadow: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub has_output: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub has_previous: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub has_next: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, InputState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<BlockState>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Box<BlockState>>,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires &T -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_true(b: &bool) -> bool {
    *b
}

const fn default_true() -> bool {
    true
}

impl BlockState {
    #[must_use]
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            id: None,
            x: None,
            y: None,
            collapsed: false,
            enabled: true,
            inline: None,
            shadow: false,
            has_output: false,
            has_previous: false,
            has_next: false,
            extra_state: None,
            comment: None,
            fields: BTreeMap::new(),
            inputs: BTreeMap::new(),
            next: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub const fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Declare an input, optionally with a block already plugged into it.
    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>, block: Option<Self>) -> Self {
        self.inputs.insert(
            name.into(),
            InputState {
                block: block.map(Box::new),
            },
        );
        self
    }

    #[must_use]
    pub fn with_next(mut self, block: Self) -> Self {
        self.has_next = true;
        self.next = Some(Box::new(block));
        self
    }

    /// Value block: has an output connection.
    #[must_use]
    pub const fn value(mut self) -> Self {
        self.has_output = true;
        self
    }

    /// Statement block: has previous and next connections.
    #[must_use]
    pub const fn statement(mut self) -> Self {
        self.has_previous = true;
        self.has_next = true;
        self
    }

    #[must_use]
    pub const fn shadow(mut self) -> Self {
        self.shadow = true;
        self
    }

    #[must_use]
    pub fn with_extra_state(mut self, extra: impl Into<String>) -> Self {
        self.extra_state = Some(extra.into());
        self
    }

    /// Ids present in this tree, pre-order. Blocks without ids are skipped.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<String>) {
        if let Some(id) = &self.id {
            out.push(id.clone());
        }
        for input in self.inputs.values() {
            if let Some(child) = &input.block {
                child.collect_ids(out);
            }
        }
        if let Some(next) = &self.next {
            next.collect_ids(out);
        }
    }
}

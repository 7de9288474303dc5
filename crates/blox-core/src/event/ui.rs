//! UI payloads. These never enter undo history and have no replay effect.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickTarget {
    Block,
    Workspace,
    ZoomControls,
}

/// Payload for `click` and `ctrl_click`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Click {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    pub target_type: ClickTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerMove {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    pub is_cursor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_node: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportChange {
    pub view_top: f64,
    pub view_left: f64,
    pub scale: f64,
    pub old_scale: f64,
}

impl ViewportChange {
    /// Keep the newest view and the oldest scale.
    pub fn absorb(&mut self, later: &Self) {
        self.view_top = later.view_top;
        self.view_left = later.view_left;
        self.scale = later.scale;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashcanOpen {
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolboxItemSelect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_item: Option<String>,
}

impl ToolboxItemSelect {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.old_item == self.new_item
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlyoutZoom {
    pub old_scale: f64,
    pub new_scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleType {
    Mutator,
    Comment,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleOpen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    pub is_open: bool,
    pub bubble_type: BubbleType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selected {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_element_id: Option<String>,
}

impl Selected {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.old_element_id == self.new_element_id
    }
}

/// A block drag started or ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDrag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    pub is_start: bool,
    /// Ids of every block in the dragged stack.
    #[serde(default)]
    pub blocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeChange {
    pub theme_name: String,
}

/// Payload-less notifications: flyout show/hide and finished loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingError {
    pub message: String,
}

//! Free-floating workspace comments.

use crate::event::coord::{Coordinate, Size};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COMMENT_SIZE: Size = Size::new(160.0, 80.0);

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceComment {
    pub id: String,
    pub content: String,
    pub coordinate: Coordinate,
    pub size: Size,
    pub collapsed: bool,
}

impl WorkspaceComment {
    #[must_use]
    pub fn state(&self) -> CommentState {
        CommentState {
            id: Some(self.id.clone()),
            text: self.content.clone(),
            x: self.coordinate.x,
            y: self.coordinate.y,
            width: self.size.width,
            height: self.size.height,
            collapsed: self.collapsed,
        }
    }
}

/// Serialized comment, used by comment create/delete events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub collapsed: bool,
}

const fn default_width() -> f64 {
    DEFAULT_COMMENT_SIZE.width
}

const fn default_height() -> f64 {
    DEFAULT_COMMENT_SIZE.height
}

impl CommentState {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            x: 0.0,
            y: 0.0,
            width: DEFAULT_COMMENT_SIZE.width,
            height: DEFAULT_COMMENT_SIZE.height,
            collapsed: false,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub const fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

//! Workspace comment payloads.

use super::coord::{Capture, Coordinate, Size};
use crate::error::EventError;
use crate::model::comment::CommentState;
use crate::model::Workspace;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreate {
    pub comment_id: String,
    pub json: CommentState,
}

impl CommentCreate {
    #[must_use]
    pub fn capture(ws: &Workspace, comment_id: &str) -> Option<Self> {
        Some(Self {
            comment_id: comment_id.to_string(),
            json: ws.comment(comment_id)?.state(),
        })
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        if forward {
            recreate(ws, &self.comment_id, &self.json)
        } else {
            remove(ws, &self.comment_id);
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDelete {
    pub comment_id: String,
    pub json: CommentState,
}

impl CommentDelete {
    #[must_use]
    pub fn capture(ws: &Workspace, comment_id: &str) -> Option<Self> {
        CommentCreate::capture(ws, comment_id).map(|c| Self {
            comment_id: c.comment_id,
            json: c.json,
        })
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        if forward {
            remove(ws, &self.comment_id);
            Ok(())
        } else {
            recreate(ws, &self.comment_id, &self.json)
        }
    }
}

fn recreate(ws: &mut Workspace, comment_id: &str, json: &CommentState) -> Result<(), EventError> {
    if ws.comment(comment_id).is_some() {
        warn!(comment_id, "can't create comment that already exists");
        return Ok(());
    }
    let mut state = json.clone();
    state.id = Some(comment_id.to_string());
    ws.create_comment(&state).map(|_| ())
}

fn remove(ws: &mut Workspace, comment_id: &str) {
    if !ws.delete_comment(comment_id) {
        warn!(comment_id, "can't delete non-existent comment");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentChange {
    pub comment_id: String,
    pub old_contents: String,
    pub new_contents: String,
}

impl CommentChange {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.old_contents == self.new_contents
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) {
        let text = if forward { &self.new_contents } else { &self.old_contents };
        if !ws.set_comment_content(&self.comment_id, text) {
            warn!(comment_id = %self.comment_id, "can't change non-existent comment");
        }
    }
}

/// A comment moved. Two-phase like [`super::block::BlockMove`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommentMove {
    pub comment_id: String,
    pub old_coordinate: Coordinate,
    pub new_coordinate: Capture<Coordinate>,
}

impl CommentMove {
    #[must_use]
    pub fn capture(ws: &Workspace, comment_id: &str) -> Option<Self> {
        Some(Self {
            comment_id: comment_id.to_string(),
            old_coordinate: ws.comment(comment_id)?.coordinate,
            new_coordinate: Capture::Capturing,
        })
    }

    pub fn record_new(&mut self, ws: &Workspace) {
        if let Some(comment) = ws.comment(&self.comment_id) {
            self.new_coordinate.record(comment.coordinate);
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.new_coordinate
            .recorded()
            .is_some_and(|new| *new == self.old_coordinate)
    }

    pub fn absorb(&mut self, later: &Self) {
        self.new_coordinate = later.new_coordinate.clone();
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        let target = if forward {
            *self.new_coordinate.recorded().ok_or_else(|| EventError::MissingField {
                kind: "comment_move".into(),
                field: "newCoordinate",
            })?
        } else {
            self.old_coordinate
        };
        if !ws.move_comment(&self.comment_id, target) {
            warn!(comment_id = %self.comment_id, "can't move non-existent comment");
        }
        Ok(())
    }

    pub(crate) fn to_wire(&self) -> Result<CommentMoveWire, EventError> {
        let new_coordinate =
            *self.new_coordinate.recorded().ok_or_else(|| EventError::MissingField {
                kind: "comment_move".into(),
                field: "newCoordinate",
            })?;
        Ok(CommentMoveWire {
            comment_id: self.comment_id.clone(),
            old_coordinate: self.old_coordinate,
            new_coordinate,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentMoveWire {
    comment_id: String,
    old_coordinate: Coordinate,
    new_coordinate: Coordinate,
}

impl From<CommentMoveWire> for CommentMove {
    fn from(wire: CommentMoveWire) -> Self {
        Self {
            comment_id: wire.comment_id,
            old_coordinate: wire.old_coordinate,
            new_coordinate: Capture::Recorded(wire.new_coordinate),
        }
    }
}

/// A comment was resized. Two-phase like [`CommentMove`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommentResize {
    pub comment_id: String,
    pub old_size: Size,
    pub new_size: Capture<Size>,
}

impl CommentResize {
    #[must_use]
    pub fn capture(ws: &Workspace, comment_id: &str) -> Option<Self> {
        Some(Self {
            comment_id: comment_id.to_string(),
            old_size: ws.comment(comment_id)?.size,
            new_size: Capture::Capturing,
        })
    }

    pub fn record_new(&mut self, ws: &Workspace) {
        if let Some(comment) = ws.comment(&self.comment_id) {
            self.new_size.record(comment.size);
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.new_size.recorded().is_some_and(|new| *new == self.old_size)
    }

    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        let target = if forward {
            *self.new_size.recorded().ok_or_else(|| EventError::MissingField {
                kind: "comment_resize".into(),
                field: "newSize",
            })?
        } else {
            self.old_size
        };
        if !ws.resize_comment(&self.comment_id, target) {
            warn!(comment_id = %self.comment_id, "can't resize non-existent comment");
        }
        Ok(())
    }

    pub(crate) fn to_wire(&self) -> Result<CommentResizeWire, EventError> {
        let new_size = *self.new_size.recorded().ok_or_else(|| EventError::MissingField {
            kind: "comment_resize".into(),
            field: "newSize",
        })?;
        Ok(CommentResizeWire {
            comment_id: self.comment_id.clone(),
            old_size: self.old_size,
            new_size,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentResizeWire {
    comment_id: String,
    old_size: Size,
    new_size: Size,
}

impl From<CommentResizeWire> for CommentResize {
    fn from(wire: CommentResizeWire) -> Self {
        Self {
            comment_id: wire.comment_id,
            old_size: wire.old_size,
            new_size: Capture::Recorded(wire.new_size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCollapse {
    pub comment_id: String,
    pub new_collapsed: bool,
}

impl CommentCollapse {
    pub(crate) fn run(&self, forward: bool, ws: &mut Workspace) {
        let collapsed = if forward { self.new_collapsed } else { !self.new_collapsed };
        if !ws.set_comment_collapsed(&self.comment_id, collapsed) {
            warn!(comment_id = %self.comment_id, "can't collapse non-existent comment");
        }
    }
}

/// A comment drag started or ended. UI only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDrag {
    pub comment_id: String,
    pub is_start: bool,
}

//! Event records: one tagged payload per kind plus the envelope fields every
//! event carries (workspace, group, undo flag).
//!
//! Wire form is a flat JSON object:
//!
//! ```json
//! {"kind":"move","groupId":"k3Xa...","blockId":"b1","oldCoordinate":"0,0","newCoordinate":"10,5"}
//! ```
//!
//! `groupId` is omitted when empty and `recordUndo` only appears when it
//! differs from the kind's default.

pub mod block;
pub mod comment;
pub mod coord;
pub mod procedure;
pub mod registry;
pub mod types;
pub mod ui;
pub mod variable;

use crate::error::EventError;
use crate::model::Workspace;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

pub use block::{
    BlockChange, BlockCreate, BlockDelete, BlockFieldIntermediateChange, BlockMove, ChangeElement,
    Location,
};
pub use comment::{
    CommentChange, CommentCollapse, CommentCreate, CommentDelete, CommentDrag, CommentMove,
    CommentResize,
};
pub use coord::{Capture, Coordinate, Size};
pub use procedure::{
    ChangeReturn, ParameterRename, ParameterSnapshot, ProcedureEnable, ProcedureRename,
    ProcedureSnapshot,
};
pub use registry::{CustomEvent, Decoder, EventRegistry};
pub use types::{EventKind, UnknownEventKind};
pub use variable::{VarRename, VarSnapshot, VarTypeChange};

/// Kind-specific event data.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    BlockCreate(BlockCreate),
    BlockDelete(BlockDelete),
    BlockChange(BlockChange),
    BlockMove(BlockMove),
    BlockFieldIntermediateChange(BlockFieldIntermediateChange),

    CommentCreate(CommentCreate),
    CommentDelete(CommentDelete),
    CommentChange(CommentChange),
    CommentMove(CommentMove),
    CommentResize(CommentResize),
    CommentCollapse(CommentCollapse),
    CommentDrag(CommentDrag),

    VarCreate(VarSnapshot),
    VarDelete(VarSnapshot),
    VarRename(VarRename),
    VarTypeChange(VarTypeChange),

    ProcedureCreate(ProcedureSnapshot),
    ProcedureDelete(ProcedureSnapshot),
    ProcedureRename(ProcedureRename),
    ProcedureEnable(ProcedureEnable),
    ProcedureParameterCreate(ParameterSnapshot),
    ProcedureParameterDelete(ParameterSnapshot),
    ProcedureParameterRename(ParameterRename),
    ProcedureChangeReturn(ChangeReturn),

    Click(ui::Click),
    CtrlClick(ui::Click),
    MarkerMove(ui::MarkerMove),
    ViewportChange(ui::ViewportChange),
    TrashcanOpen(ui::TrashcanOpen),
    ToolboxItemSelect(ui::ToolboxItemSelect),
    FlyoutShow(ui::Notice),
    FlyoutHide(ui::Notice),
    FlyoutZoom(ui::FlyoutZoom),
    BubbleOpen(ui::BubbleOpen),
    Selected(ui::Selected),
    BlockDrag(ui::BlockDrag),
    ThemeChange(ui::ThemeChange),

    FinishedLoading(ui::Notice),
    LoadingError(ui::LoadingError),

    /// A host-registered kind the engine only routes and filters.
    Custom(CustomEvent),
}

fn parse<T: DeserializeOwned>(kind: EventKind, json: &Value) -> Result<T, EventError> {
    T::deserialize(json).map_err(|source| EventError::InvalidPayload {
        kind: kind.as_str().to_string(),
        source,
    })
}

fn encode<T: Serialize>(kind: &str, payload: &T) -> Result<Value, EventError> {
    serde_json::to_value(payload).map_err(|source| EventError::InvalidPayload {
        kind: kind.to_string(),
        source,
    })
}

impl EventPayload {
    /// Built-in kind, or `None` for custom payloads.
    #[must_use]
    pub const fn kind(&self) -> Option<EventKind> {
        Some(match self {
            Self::BlockCreate(_) => EventKind::BlockCreate,
            Self::BlockDelete(_) => EventKind::BlockDelete,
            Self::BlockChange(_) => EventKind::BlockChange,
            Self::BlockMove(_) => EventKind::BlockMove,
            Self::BlockFieldIntermediateChange(_) => EventKind::BlockFieldIntermediateChange,
            Self::CommentCreate(_) => EventKind::CommentCreate,
            Self::CommentDelete(_) => EventKind::CommentDelete,
            Self::CommentChange(_) => EventKind::CommentChange,
            Self::CommentMove(_) => EventKind::CommentMove,
            Self::CommentResize(_) => EventKind::CommentResize,
            Self::CommentCollapse(_) => EventKind::CommentCollapse,
            Self::CommentDrag(_) => EventKind::CommentDrag,
            Self::VarCreate(_) => EventKind::VarCreate,
            Self::VarDelete(_) => EventKind::VarDelete,
            Self::VarRename(_) => EventKind::VarRename,
            Self::VarTypeChange(_) => EventKind::VarTypeChange,
            Self::ProcedureCreate(_) => EventKind::ProcedureCreate,
            Self::ProcedureDelete(_) => EventKind::ProcedureDelete,
            Self::ProcedureRename(_) => EventKind::ProcedureRename,
            Self::ProcedureEnable(_) => EventKind::ProcedureEnable,
            Self::ProcedureParameterCreate(_) => EventKind::ProcedureParameterCreate,
            Self::ProcedureParameterDelete(_) => EventKind::ProcedureParameterDelete,
            Self::ProcedureParameterRename(_) => EventKind::ProcedureParameterRename,
            Self::ProcedureChangeReturn(_) => EventKind::ProcedureChangeReturn,
            Self::Click(_) => EventKind::Click,
            Self::CtrlClick(_) => EventKind::CtrlClick,
            Self::MarkerMove(_) => EventKind::MarkerMove,
            Self::ViewportChange(_) => EventKind::ViewportChange,
            Self::TrashcanOpen(_) => EventKind::TrashcanOpen,
            Self::ToolboxItemSelect(_) => EventKind::ToolboxItemSelect,
            Self::FlyoutShow(_) => EventKind::FlyoutShow,
            Self::FlyoutHide(_) => EventKind::FlyoutHide,
            Self::FlyoutZoom(_) => EventKind::FlyoutZoom,
            Self::BubbleOpen(_) => EventKind::BubbleOpen,
            Self::Selected(_) => EventKind::Selected,
            Self::BlockDrag(_) => EventKind::BlockDrag,
            Self::ThemeChange(_) => EventKind::ThemeChange,
            Self::FinishedLoading(_) => EventKind::FinishedLoading,
            Self::LoadingError(_) => EventKind::LoadingError,
            Self::Custom(_) => return None,
        })
    }

    /// Wire `kind` tag.
    #[must_use]
    pub fn kind_str(&self) -> &str {
        match (self, self.kind()) {
            (Self::Custom(custom), _) => &custom.kind,
            (_, Some(kind)) => kind.as_str(),
            (_, None) => "",
        }
    }

    #[must_use]
    pub fn is_ui(&self) -> bool {
        match self {
            Self::Custom(custom) => custom.is_ui,
            _ => self.kind().is_some_and(EventKind::is_ui),
        }
    }

    /// Whether events of this kind enter undo history unless told otherwise.
    #[must_use]
    pub fn default_record_undo(&self) -> bool {
        match self {
            Self::Custom(custom) => !custom.is_ui,
            _ => self.kind().is_some_and(EventKind::records_undo),
        }
    }

    /// Id of the entity this event is about, or `""`.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        match self {
            Self::BlockCreate(e) => &e.block_id,
            Self::BlockDelete(e) => &e.block_id,
            Self::BlockChange(e) => &e.block_id,
            Self::BlockMove(e) => &e.block_id,
            Self::BlockFieldIntermediateChange(e) => &e.block_id,
            Self::CommentCreate(e) => &e.comment_id,
            Self::CommentDelete(e) => &e.comment_id,
            Self::CommentChange(e) => &e.comment_id,
            Self::CommentMove(e) => &e.comment_id,
            Self::CommentResize(e) => &e.comment_id,
            Self::CommentCollapse(e) => &e.comment_id,
            Self::CommentDrag(e) => &e.comment_id,
            Self::VarCreate(e) | Self::VarDelete(e) => &e.var_id,
            Self::VarRename(e) => &e.var_id,
            Self::VarTypeChange(e) => &e.var_id,
            Self::ProcedureCreate(e) | Self::ProcedureDelete(e) => &e.procedure.id,
            Self::ProcedureRename(e) => &e.procedure_id,
            Self::ProcedureEnable(e) => &e.procedure_id,
            Self::ProcedureParameterCreate(e) | Self::ProcedureParameterDelete(e) => {
                &e.procedure_id
            }
            Self::ProcedureParameterRename(e) => &e.procedure_id,
            Self::ProcedureChangeReturn(e) => &e.procedure_id,
            Self::Click(e) | Self::CtrlClick(e) => e.block_id.as_deref().unwrap_or_default(),
            Self::MarkerMove(e) => e.block_id.as_deref().unwrap_or_default(),
            Self::BubbleOpen(e) => e.block_id.as_deref().unwrap_or_default(),
            Self::BlockDrag(e) => e.block_id.as_deref().unwrap_or_default(),
            Self::Custom(e) => e.entity_id.as_deref().unwrap_or_default(),
            Self::ViewportChange(_)
            | Self::TrashcanOpen(_)
            | Self::ToolboxItemSelect(_)
            | Self::FlyoutShow(_)
            | Self::FlyoutHide(_)
            | Self::FlyoutZoom(_)
            | Self::Selected(_)
            | Self::ThemeChange(_)
            | Self::FinishedLoading(_)
            | Self::LoadingError(_) => "",
        }
    }

    /// Wire name of the identity field that must be set before encoding.
    const fn identity_field(&self) -> Option<&'static str> {
        match self {
            Self::BlockCreate(_)
            | Self::BlockDelete(_)
            | Self::BlockChange(_)
            | Self::BlockMove(_)
            | Self::BlockFieldIntermediateChange(_) => Some("blockId"),
            Self::CommentCreate(_)
            | Self::CommentDelete(_)
            | Self::CommentChange(_)
            | Self::CommentMove(_)
            | Self::CommentResize(_)
            | Self::CommentCollapse(_)
            | Self::CommentDrag(_) => Some("commentId"),
            Self::VarCreate(_) | Self::VarDelete(_) | Self::VarRename(_) | Self::VarTypeChange(_) => {
                Some("varId")
            }
            Self::ProcedureCreate(_)
            | Self::ProcedureDelete(_)
            | Self::ProcedureRename(_)
            | Self::ProcedureEnable(_)
            | Self::ProcedureParameterCreate(_)
            | Self::ProcedureParameterDelete(_)
            | Self::ProcedureParameterRename(_)
            | Self::ProcedureChangeReturn(_) => Some("procedureId"),
            _ => None,
        }
    }

    /// True when applying the event would not change anything.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            Self::BlockChange(e) => e.is_null(),
            Self::BlockMove(e) => e.is_null(),
            Self::BlockFieldIntermediateChange(e) => e.is_null(),
            Self::CommentChange(e) => e.is_null(),
            Self::CommentMove(e) => e.is_null(),
            Self::CommentResize(e) => e.is_null(),
            Self::VarRename(e) => e.is_null(),
            Self::VarTypeChange(e) => e.is_null(),
            Self::ProcedureRename(e) => e.is_null(),
            Self::ProcedureParameterRename(e) => e.is_null(),
            Self::ProcedureChangeReturn(e) => e.is_null(),
            Self::ToolboxItemSelect(e) => e.is_null(),
            Self::Selected(e) => e.is_null(),
            _ => false,
        }
    }

    /// Apply the event to `ws` in the given direction.
    ///
    /// # Errors
    ///
    /// Returns an error when a two-phase payload is still capturing, or when
    /// a procedure event targets a procedure or parameter that does not
    /// exist.
    pub fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        match self {
            Self::BlockCreate(e) => e.run(forward, ws),
            Self::BlockDelete(e) => e.run(forward, ws),
            Self::BlockChange(e) => e.run(forward, ws),
            Self::BlockMove(e) => e.run(forward, ws),
            Self::BlockFieldIntermediateChange(e) => e.run(forward, ws),
            Self::CommentCreate(e) => e.run(forward, ws),
            Self::CommentDelete(e) => e.run(forward, ws),
            Self::CommentChange(e) => {
                e.run(forward, ws);
                Ok(())
            }
            Self::CommentMove(e) => e.run(forward, ws),
            Self::CommentResize(e) => e.run(forward, ws),
            Self::CommentCollapse(e) => {
                e.run(forward, ws);
                Ok(())
            }
            Self::VarCreate(e) => e.run_create(forward, ws),
            Self::VarDelete(e) => e.run_delete(forward, ws),
            Self::VarRename(e) => {
                e.run(forward, ws);
                Ok(())
            }
            Self::VarTypeChange(e) => {
                e.run(forward, ws);
                Ok(())
            }
            Self::ProcedureCreate(e) => e.run_create(forward, ws),
            Self::ProcedureDelete(e) => e.run_delete(forward, ws),
            Self::ProcedureRename(e) => e.run(forward, ws),
            Self::ProcedureEnable(e) => e.run(forward, ws),
            Self::ProcedureParameterCreate(e) => e.run_create(forward, ws),
            Self::ProcedureParameterDelete(e) => e.run_delete(forward, ws),
            Self::ProcedureParameterRename(e) => e.run(forward, ws),
            Self::ProcedureChangeReturn(e) => e.run(forward, ws),
            _ => Ok(()),
        }
    }

    /// Decode the payload fields of a wire record whose kind is `kind`.
    ///
    /// # Errors
    ///
    /// [`EventError::InvalidPayload`] when the record does not match the
    /// kind's schema.
    pub fn deserialize_for(kind: EventKind, json: &Value) -> Result<Self, EventError> {
        Ok(match kind {
            EventKind::BlockCreate => Self::BlockCreate(parse(kind, json)?),
            EventKind::BlockDelete => Self::BlockDelete(parse(kind, json)?),
            EventKind::BlockChange => Self::BlockChange(parse(kind, json)?),
            EventKind::BlockMove => {
                Self::BlockMove(parse::<block::BlockMoveWire>(kind, json)?.into())
            }
            EventKind::BlockFieldIntermediateChange => {
                Self::BlockFieldIntermediateChange(parse(kind, json)?)
            }
            EventKind::CommentCreate => Self::CommentCreate(parse(kind, json)?),
            EventKind::CommentDelete => Self::CommentDelete(parse(kind, json)?),
            EventKind::CommentChange => Self::CommentChange(parse(kind, json)?),
            EventKind::CommentMove => {
                Self::CommentMove(parse::<comment::CommentMoveWire>(kind, json)?.into())
            }
            EventKind::CommentResize => {
                Self::CommentResize(parse::<comment::CommentResizeWire>(kind, json)?.into())
            }
            EventKind::CommentCollapse => Self::CommentCollapse(parse(kind, json)?),
            EventKind::CommentDrag => Self::CommentDrag(parse(kind, json)?),
            EventKind::VarCreate => Self::VarCreate(parse(kind, json)?),
            EventKind::VarDelete => Self::VarDelete(parse(kind, json)?),
            EventKind::VarRename => Self::VarRename(parse(kind, json)?),
            EventKind::VarTypeChange => Self::VarTypeChange(parse(kind, json)?),
            EventKind::ProcedureCreate => Self::ProcedureCreate(parse(kind, json)?),
            EventKind::ProcedureDelete => Self::ProcedureDelete(parse(kind, json)?),
            EventKind::ProcedureRename => Self::ProcedureRename(parse(kind, json)?),
            EventKind::ProcedureEnable => Self::ProcedureEnable(parse(kind, json)?),
            EventKind::ProcedureParameterCreate => {
                Self::ProcedureParameterCreate(parse(kind, json)?)
            }
            EventKind::ProcedureParameterDelete => {
                Self::ProcedureParameterDelete(parse(kind, json)?)
            }
            EventKind::ProcedureParameterRename => {
                Self::ProcedureParameterRename(parse(kind, json)?)
            }
            EventKind::ProcedureChangeReturn => Self::ProcedureChangeReturn(parse(kind, json)?),
            EventKind::Click => Self::Click(parse(kind, json)?),
            EventKind::CtrlClick => Self::CtrlClick(parse(kind, json)?),
            EventKind::MarkerMove => Self::MarkerMove(parse(kind, json)?),
            EventKind::ViewportChange => Self::ViewportChange(parse(kind, json)?),
            EventKind::TrashcanOpen => Self::TrashcanOpen(parse(kind, json)?),
            EventKind::ToolboxItemSelect => Self::ToolboxItemSelect(parse(kind, json)?),
            EventKind::FlyoutShow => Self::FlyoutShow(parse(kind, json)?),
            EventKind::FlyoutHide => Self::FlyoutHide(parse(kind, json)?),
            EventKind::FlyoutZoom => Self::FlyoutZoom(parse(kind, json)?),
            EventKind::BubbleOpen => Self::BubbleOpen(parse(kind, json)?),
            EventKind::Selected => Self::Selected(parse(kind, json)?),
            EventKind::BlockDrag => Self::BlockDrag(parse(kind, json)?),
            EventKind::ThemeChange => Self::ThemeChange(parse(kind, json)?),
            EventKind::FinishedLoading => Self::FinishedLoading(parse(kind, json)?),
            EventKind::LoadingError => Self::LoadingError(parse(kind, json)?),
        })
    }

    fn to_value(&self) -> Result<Value, EventError> {
        let kind = self.kind_str();
        match self {
            Self::BlockCreate(e) => encode(kind, e),
            Self::BlockDelete(e) => encode(kind, e),
            Self::BlockChange(e) => encode(kind, e),
            Self::BlockMove(e) => encode(kind, &e.to_wire()?),
            Self::BlockFieldIntermediateChange(e) => encode(kind, e),
            Self::CommentCreate(e) => encode(kind, e),
            Self::CommentDelete(e) => encode(kind, e),
            Self::CommentChange(e) => encode(kind, e),
            Self::CommentMove(e) => encode(kind, &e.to_wire()?),
            Self::CommentResize(e) => encode(kind, &e.to_wire()?),
            Self::CommentCollapse(e) => encode(kind, e),
            Self::CommentDrag(e) => encode(kind, e),
            Self::VarCreate(e) | Self::VarDelete(e) => encode(kind, e),
            Self::VarRename(e) => encode(kind, e),
            Self::VarTypeChange(e) => encode(kind, e),
            Self::ProcedureCreate(e) | Self::ProcedureDelete(e) => encode(kind, e),
            Self::ProcedureRename(e) => encode(kind, e),
            Self::ProcedureEnable(e) => encode(kind, e),
            Self::ProcedureParameterCreate(e) | Self::ProcedureParameterDelete(e) => {
                encode(kind, e)
            }
            Self::ProcedureParameterRename(e) => encode(kind, e),
            Self::ProcedureChangeReturn(e) => encode(kind, e),
            Self::Click(e) | Self::CtrlClick(e) => encode(kind, e),
            Self::MarkerMove(e) => encode(kind, e),
            Self::ViewportChange(e) => encode(kind, e),
            Self::TrashcanOpen(e) => encode(kind, e),
            Self::ToolboxItemSelect(e) => encode(kind, e),
            Self::FlyoutShow(e) | Self::FlyoutHide(e) | Self::FinishedLoading(e) => {
                encode(kind, e)
            }
            Self::FlyoutZoom(e) => encode(kind, e),
            Self::BubbleOpen(e) => encode(kind, e),
            Self::Selected(e) => encode(kind, e),
            Self::BlockDrag(e) => encode(kind, e),
            Self::ThemeChange(e) => encode(kind, e),
            Self::LoadingError(e) => encode(kind, e),
            Self::Custom(e) => Ok(Value::Object(e.data.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Event envelope
// ---------------------------------------------------------------------------

/// A fired event: payload plus dispatch metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Target workspace. Events with an empty id are dropped at flush.
    pub workspace_id: String,
    /// Group id, `""` when ungrouped.
    pub group: String,
    pub record_undo: bool,
    pub payload: EventPayload,
}

impl Event {
    /// Ungrouped event with the kind's default undo flag.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            group: String::new(),
            record_undo: payload.default_record_undo(),
            payload,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    #[must_use]
    pub const fn kind(&self) -> Option<EventKind> {
        self.payload.kind()
    }

    #[must_use]
    pub fn kind_str(&self) -> &str {
        self.payload.kind_str()
    }

    #[must_use]
    pub fn is_ui(&self) -> bool {
        self.payload.is_ui()
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.payload.is_null()
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        self.payload.entity_id()
    }

    /// Apply this event to `ws`.
    ///
    /// # Errors
    ///
    /// See [`EventPayload::run`].
    pub fn run(&self, forward: bool, ws: &mut Workspace) -> Result<(), EventError> {
        self.payload.run(forward, ws)
    }

    /// Encode to the flat wire record.
    ///
    /// # Errors
    ///
    /// [`EventError::MissingField`] if the identity field is empty or a
    /// two-phase payload has not recorded its final value.
    pub fn to_json(&self) -> Result<Value, EventError> {
        if let Some(field) = self.payload.identity_field() {
            if self.entity_id().is_empty() {
                return Err(EventError::MissingField {
                    kind: self.kind_str().to_string(),
                    field,
                });
            }
        }
        let body = match self.payload.to_value()? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(EventError::MalformedRecord(format!(
                    "{} payload encoded as {other}",
                    self.kind_str()
                )));
            }
        };

        let mut record = Map::new();
        record.insert("kind".into(), Value::String(self.kind_str().to_string()));
        if !self.group.is_empty() {
            record.insert("groupId".into(), Value::String(self.group.clone()));
        }
        if self.record_undo != self.payload.default_record_undo() {
            record.insert("recordUndo".into(), Value::Bool(self.record_undo));
        }
        for (key, value) in body {
            record.entry(key).or_insert(value);
        }
        Ok(Value::Object(record))
    }
}

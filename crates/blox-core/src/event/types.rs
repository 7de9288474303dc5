//! Event kind enum covering every built-in event family.
//!
//! The string form is the wire `kind` tag. Block events keep the short legacy
//! tags (`create`, `move`, ...) while every other family is prefixed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every built-in event kind, grouped by family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    BlockCreate,
    BlockDelete,
    BlockChange,
    BlockMove,
    BlockFieldIntermediateChange,

    CommentCreate,
    CommentDelete,
    CommentChange,
    CommentMove,
    CommentResize,
    CommentCollapse,
    CommentDrag,

    VarCreate,
    VarDelete,
    VarRename,
    VarTypeChange,

    ProcedureCreate,
    ProcedureDelete,
    ProcedureRename,
    ProcedureEnable,
    ProcedureParameterCreate,
    ProcedureParameterDelete,
    ProcedureParameterRename,
    ProcedureChangeReturn,

    Click,
    CtrlClick,
    MarkerMove,
    ViewportChange,
    TrashcanOpen,
    ToolboxItemSelect,
    FlyoutShow,
    FlyoutHide,
    FlyoutZoom,
    BubbleOpen,
    Selected,
    BlockDrag,
    ThemeChange,

    FinishedLoading,
    LoadingError,
}

/// Error returned when parsing an unknown event kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventKind {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event kind '{}'", self.raw)
    }
}

impl std::error::Error for UnknownEventKind {}

impl EventKind {
    /// All built-in kinds in catalog order.
    pub const ALL: [Self; 39] = [
        Self::BlockCreate,
        Self::BlockDelete,
        Self::BlockChange,
        Self::BlockMove,
        Self::BlockFieldIntermediateChange,
        Self::CommentCreate,
        Self::CommentDelete,
        Self::CommentChange,
        Self::CommentMove,
        Self::CommentResize,
        Self::CommentCollapse,
        Self::CommentDrag,
        Self::VarCreate,
        Self::VarDelete,
        Self::VarRename,
        Self::VarTypeChange,
        Self::ProcedureCreate,
        Self::ProcedureDelete,
        Self::ProcedureRename,
        Self::ProcedureEnable,
        Self::ProcedureParameterCreate,
        Self::ProcedureParameterDelete,
        Self::ProcedureParameterRename,
        Self::ProcedureChangeReturn,
        Self::Click,
        Self::CtrlClick,
        Self::MarkerMove,
        Self::ViewportChange,
        Self::TrashcanOpen,
        Self::ToolboxItemSelect,
        Self::FlyoutShow,
        Self::FlyoutHide,
        Self::FlyoutZoom,
        Self::BubbleOpen,
        Self::Selected,
        Self::BlockDrag,
        Self::ThemeChange,
        Self::FinishedLoading,
        Self::LoadingError,
    ];

    /// Return the wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlockCreate => "create",
            Self::BlockDelete => "delete",
            Self::BlockChange => "change",
            Self::BlockMove => "move",
            Self::BlockFieldIntermediateChange => "block_field_intermediate_change",
            Self::CommentCreate => "comment_create",
            Self::CommentDelete => "comment_delete",
            Self::CommentChange => "comment_change",
            Self::CommentMove => "comment_move",
            Self::CommentResize => "comment_resize",
            Self::CommentCollapse => "comment_collapse",
            Self::CommentDrag => "comment_drag",
            Self::VarCreate => "var_create",
            Self::VarDelete => "var_delete",
            Self::VarRename => "var_rename",
            Self::VarTypeChange => "var_type_change",
            Self::ProcedureCreate => "procedure_create",
            Self::ProcedureDelete => "procedure_delete",
            Self::ProcedureRename => "procedure_rename",
            Self::ProcedureEnable => "procedure_enable",
            Self::ProcedureParameterCreate => "procedure_parameter_create",
            Self::ProcedureParameterDelete => "procedure_parameter_delete",
            Self::ProcedureParameterRename => "procedure_parameter_rename",
            Self::ProcedureChangeReturn => "procedure_change_return",
            Self::Click => "click",
            Self::CtrlClick => "ctrl_click",
            Self::MarkerMove => "marker_move",
            Self::ViewportChange => "viewport_change",
            Self::TrashcanOpen => "trashcan_open",
            Self::ToolboxItemSelect => "toolbox_item_select",
            Self::FlyoutShow => "flyout_show",
            Self::FlyoutHide => "flyout_hide",
            Self::FlyoutZoom => "flyout_zoom",
            Self::BubbleOpen => "bubble_open",
            Self::Selected => "selected",
            Self::BlockDrag => "drag",
            Self::ThemeChange => "theme_change",
            Self::FinishedLoading => "finished_loading",
            Self::LoadingError => "loading_error",
        }
    }

    /// UI kinds are notifications only: never undo-recorded, and coalesced
    /// into one merge bucket by the filter.
    #[must_use]
    pub const fn is_ui(self) -> bool {
        matches!(
            self,
            Self::CommentDrag
                | Self::Click
                | Self::CtrlClick
                | Self::MarkerMove
                | Self::ViewportChange
                | Self::TrashcanOpen
                | Self::ToolboxItemSelect
                | Self::FlyoutShow
                | Self::FlyoutHide
                | Self::FlyoutZoom
                | Self::BubbleOpen
                | Self::Selected
                | Self::BlockDrag
                | Self::ThemeChange
        )
    }

    /// Whether events of this kind enter undo history unless told otherwise.
    #[must_use]
    pub const fn records_undo(self) -> bool {
        !self.is_ui()
            && !matches!(
                self,
                Self::FinishedLoading | Self::LoadingError | Self::BlockFieldIntermediateChange
            )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind { raw: s.to_string() })
    }
}

impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tags_are_unique() {
        let mut seen = HashSet::new();
        for kind in EventKind::ALL {
            assert!(seen.insert(kind.as_str()), "duplicate tag {kind}");
        }
    }

    #[test]
    fn display_fromstr_roundtrip() {
        for kind in EventKind::ALL {
            let reparsed: EventKind = kind.to_string().parse().expect("should roundtrip");
            assert_eq!(kind, reparsed);
        }
    }

    #[test]
    fn block_kinds_keep_short_tags() {
        assert_eq!(EventKind::BlockCreate.as_str(), "create");
        assert_eq!(EventKind::BlockMove.as_str(), "move");
        assert_eq!(EventKind::BlockDrag.as_str(), "drag");
    }

    #[test]
    fn fromstr_rejects_unknown() {
        let err = "block_teleport".parse::<EventKind>().unwrap_err();
        assert_eq!(err.raw, "block_teleport");
        assert!("".parse::<EventKind>().is_err());
    }

    #[test]
    fn ui_family_membership() {
        assert!(EventKind::Click.is_ui());
        assert!(EventKind::ViewportChange.is_ui());
        assert!(EventKind::CommentDrag.is_ui());
        assert!(!EventKind::BlockMove.is_ui());
        assert!(!EventKind::FinishedLoading.is_ui());
        assert!(!EventKind::VarTypeChange.is_ui());
    }

    #[test]
    fn serde_json_uses_wire_tag() {
        let json = serde_json::to_string(&EventKind::VarCreate).expect("serialize");
        assert_eq!(json, "\"var_create\"");
        let kind: EventKind = serde_json::from_str("\"flyout_zoom\"").expect("deserialize");
        assert_eq!(kind, EventKind::FlyoutZoom);
        assert!(serde_json::from_str::<EventKind>("\"nope\"").is_err());
    }
}

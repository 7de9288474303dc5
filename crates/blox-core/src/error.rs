use std::fmt;

/// Machine-readable error codes for hosts that surface event failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    MalformedEvent,
    UnknownEventKind,
    DuplicateEventKind,
    InvalidPayload,
    DuplicateEntityId,
    ConnectedDelete,
    ModelDiverged,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::MalformedEvent => "E2001",
            Self::UnknownEventKind => "E2002",
            Self::DuplicateEventKind => "E2003",
            Self::InvalidPayload => "E2004",
            Self::DuplicateEntityId => "E3001",
            Self::ConnectedDelete => "E3002",
            Self::ModelDiverged => "E3003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::MalformedEvent => "Event is missing a required field",
            Self::UnknownEventKind => "Unknown event kind",
            Self::DuplicateEventKind => "Event kind registered twice",
            Self::InvalidPayload => "Event payload does not match its kind",
            Self::DuplicateEntityId => "Entity id already in use",
            Self::ConnectedDelete => "Connected blocks cannot be deleted",
            Self::ModelDiverged => "Event log and document model have diverged",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .blox/config.toml and retry."),
            Self::MalformedEvent => {
                Some("Construct the event from a live entity and record its final state first.")
            }
            Self::UnknownEventKind => Some("Register the kind before loading the change log."),
            Self::DuplicateEventKind => None,
            Self::InvalidPayload => Some("Check the change log was written by a compatible version."),
            Self::DuplicateEntityId => Some("Dispose the existing entity or load with fresh ids."),
            Self::ConnectedDelete => Some("Unplug the block from its parent before deleting it."),
            Self::ModelDiverged => Some("Reload the document; its history cannot be replayed safely."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while building, encoding, decoding, or replaying events.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// A field required for serialization or replay has not been captured.
    #[error("{kind} event is missing required field '{field}'")]
    MissingField { kind: String, field: &'static str },

    /// The wire record is not a JSON object or has no `kind` tag.
    #[error("malformed event record: {0}")]
    MalformedRecord(String),

    #[error("unknown event kind '{0}'")]
    UnknownKind(String),

    #[error("event kind '{0}' is already registered")]
    DuplicateKind(String),

    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid coordinate '{0}': expected \"x,y\"")]
    InvalidCoordinate(String),

    #[error("id '{0}' is already in use")]
    DuplicateId(String),

    #[error("block '{0}' is still connected to a parent and cannot be deleted")]
    ConnectedDelete(String),

    #[error("procedure '{0}' does not exist in the procedure map")]
    ProcedureNotFound(String),

    #[error("procedure '{procedure}' has no parameter '{parameter}'")]
    ParameterNotFound { procedure: String, parameter: String },
}

impl EventError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingField { .. } | Self::MalformedRecord(_) => ErrorCode::MalformedEvent,
            Self::UnknownKind(_) => ErrorCode::UnknownEventKind,
            Self::DuplicateKind(_) => ErrorCode::DuplicateEventKind,
            Self::InvalidPayload { .. } | Self::InvalidCoordinate(_) => ErrorCode::InvalidPayload,
            Self::DuplicateId(_) => ErrorCode::DuplicateEntityId,
            Self::ConnectedDelete(_) => ErrorCode::ConnectedDelete,
            Self::ProcedureNotFound(_) | Self::ParameterNotFound { .. } => {
                ErrorCode::ModelDiverged
            }
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, EventError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::MalformedEvent,
            ErrorCode::UnknownEventKind,
            ErrorCode::DuplicateEventKind,
            ErrorCode::InvalidPayload,
            ErrorCode::DuplicateEntityId,
            ErrorCode::ConnectedDelete,
            ErrorCode::ModelDiverged,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::UnknownEventKind.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn divergence_errors_share_a_code() {
        let a = EventError::ProcedureNotFound("p1".into());
        let b = EventError::ParameterNotFound {
            procedure: "p1".into(),
            parameter: "x".into(),
        };
        assert_eq!(a.code(), ErrorCode::ModelDiverged);
        assert_eq!(b.code(), ErrorCode::ModelDiverged);
        assert!(a.to_string().contains("p1"));
    }
}

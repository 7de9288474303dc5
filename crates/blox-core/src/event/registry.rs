//! Kind registry: maps wire `kind` tags to payload decoders.
//!
//! Built-in kinds are registered by [`EventRegistry::with_builtins`]; hosts
//! add their own kinds with [`EventRegistry::register`], typically decoding
//! them into [`CustomEvent`].

use super::{Event, EventKind, EventPayload};
use crate::error::EventError;
use crate::model::Workspace;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Turns a full wire record into a payload.
pub type Decoder = fn(&Value) -> Result<EventPayload, EventError>;

/// Envelope keys that never belong to a payload.
const ENVELOPE_KEYS: [&str; 4] = ["kind", "groupId", "recordUndo", "workspaceId"];

fn kind_of(json: &Value) -> Result<&str, EventError> {
    let object = json
        .as_object()
        .ok_or_else(|| EventError::MalformedRecord(format!("expected a JSON object, got {json}")))?;
    object
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| EventError::MalformedRecord("record has no string 'kind'".into()))
}

fn decode_builtin(json: &Value) -> Result<EventPayload, EventError> {
    let kind: EventKind = kind_of(json)?
        .parse()
        .map_err(|e: super::UnknownEventKind| EventError::UnknownKind(e.raw))?;
    EventPayload::deserialize_for(kind, json)
}

/// Payload of a host-defined kind. Routed and filtered like any other event;
/// replay is a no-op.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomEvent {
    pub kind: String,
    pub is_ui: bool,
    /// Value of `blockId` in the record, used as the merge bucket key.
    pub entity_id: Option<String>,
    /// Remaining payload fields, envelope keys removed.
    pub data: Map<String, Value>,
}

impl CustomEvent {
    fn from_record(json: &Value, is_ui: bool) -> Result<Self, EventError> {
        let kind = kind_of(json)?.to_string();
        let mut data = json.as_object().cloned().unwrap_or_default();
        for key in ENVELOPE_KEYS {
            data.remove(key);
        }
        let entity_id = data.get("blockId").and_then(Value::as_str).map(str::to_string);
        Ok(Self {
            kind,
            is_ui,
            entity_id,
            data,
        })
    }

    /// [`Decoder`] for custom model events.
    ///
    /// # Errors
    ///
    /// [`EventError::MalformedRecord`] when the record has no `kind`.
    pub fn decode(json: &Value) -> Result<EventPayload, EventError> {
        Self::from_record(json, false).map(EventPayload::Custom)
    }

    /// [`Decoder`] for custom UI events.
    ///
    /// # Errors
    ///
    /// [`EventError::MalformedRecord`] when the record has no `kind`.
    pub fn decode_ui(json: &Value) -> Result<EventPayload, EventError> {
        Self::from_record(json, true).map(EventPayload::Custom)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    decoders: BTreeMap<String, Decoder>,
}

impl EventRegistry {
    /// Empty registry. Most callers want [`Self::with_builtins`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for kind in EventKind::ALL {
            registry
                .decoders
                .insert(kind.as_str().to_string(), decode_builtin as Decoder);
        }
        registry
    }

    /// Register a decoder for `kind`.
    ///
    /// # Errors
    ///
    /// [`EventError::DuplicateKind`] if `kind` is already registered.
    pub fn register(&mut self, kind: &str, decoder: Decoder) -> Result<(), EventError> {
        if self.decoders.contains_key(kind) {
            return Err(EventError::DuplicateKind(kind.to_string()));
        }
        self.decoders.insert(kind.to_string(), decoder);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, kind: &str) -> Option<Decoder> {
        self.decoders.get(kind).copied()
    }

    /// Registered kind tags, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    /// Decode a wire record and bind it to `workspace_id`.
    ///
    /// # Errors
    ///
    /// - [`EventError::MalformedRecord`] if the record is not an object with
    ///   a string `kind`
    /// - [`EventError::UnknownKind`] if the kind is not registered
    /// - [`EventError::InvalidPayload`] if the fields do not match the kind
    pub fn decode(&self, json: &Value, workspace_id: &str) -> Result<Event, EventError> {
        let kind = kind_of(json)?;
        let decoder = self
            .get(kind)
            .ok_or_else(|| EventError::UnknownKind(kind.to_string()))?;
        let payload = decoder(json)?;
        let mut event = Event::new(workspace_id, payload);
        if let Some(group) = json.get("groupId").and_then(Value::as_str) {
            event.group = group.to_string();
        }
        if let Some(record_undo) = json.get("recordUndo").and_then(Value::as_bool) {
            event.record_undo = record_undo;
        }
        Ok(event)
    }

    /// Decode a wire record for the workspace `ws`.
    ///
    /// # Errors
    ///
    /// See [`Self::decode`].
    pub fn from_json(&self, json: &Value, ws: &Workspace) -> Result<Event, EventError> {
        self.decode(json, ws.id())
    }
}

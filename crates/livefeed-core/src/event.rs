// Event entity type
//
// An Event is the event-of-record: written once by the durable store and never
// mutated. The cache entry and the stream record are both derived from the
// serialized form produced here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque attribute set attached to an event.
///
/// Backed by `serde_json::Map` with `preserve_order`, so keys keep their
/// insertion order through serialization. The pipelines never inspect it.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Store-assigned event identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Feed owner identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub i64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Input for an insert: everything except the store-assigned fields
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub subject_id: SubjectId,
    pub event_type: String,
    pub payload: Payload,
}

impl NewEvent {
    pub fn new(subject_id: impl Into<SubjectId>, event_type: impl Into<String>, payload: Payload) -> Self {
        Self {
            subject_id: subject_id.into(),
            event_type: event_type.into(),
            payload,
        }
    }
}

/// A persisted activity event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub subject_id: SubjectId,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Build the persisted event from an insert input and the store-assigned fields
    pub fn from_new(new: NewEvent, id: EventId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            subject_id: new.subject_id,
            event_type: new.event_type,
            payload: new.payload,
            created_at,
        }
    }

    /// Serialized form shared by the cache entry and the stream record
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a serialized event (e.g. an `event:<id>` cache value)
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Convert a `serde_json::json!` object literal into a payload.
///
/// Non-object values are wrapped under a `"value"` key.
pub fn payload_from_value(value: serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Object(map) => map,
        other => {
            let mut map = Payload::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

// Database models (internal, may differ from the core Event type)

use chrono::{DateTime, Utc};
use livefeed_core::{Event, EventId, StoreError, SubjectId};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i64,
    pub subject_id: i64,
    pub event_type: String,
    pub payload: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let payload = match row.payload {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => Default::default(),
            other => {
                return Err(StoreError::Serialization(format!(
                    "event {} has a non-object payload: {}",
                    row.id, other
                )))
            }
        };

        Ok(Event {
            id: EventId(row.id),
            subject_id: SubjectId(row.subject_id),
            event_type: row.event_type,
            payload,
            created_at: row.created_at,
        })
    }
}

// Feed view and cache key layout
//
// A feed is never stored as a first-class entity. It exists either as a cache
// value under `feed:<subject>` or as a list computed from the store on demand.

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventId, SubjectId};

/// Cache key prefix for single events
pub const EVENT_KEY_PREFIX: &str = "event:";

/// Cache key prefix for subject feeds
pub const FEED_KEY_PREFIX: &str = "feed:";

/// Cache key for a single persisted event
pub fn event_key(id: EventId) -> String {
    format!("{EVENT_KEY_PREFIX}{id}")
}

/// Cache key for a subject's feed
pub fn feed_key(subject_id: SubjectId) -> String {
    format!("{FEED_KEY_PREFIX}{subject_id}")
}

/// Most-recent-first snapshot of a subject's events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feed {
    pub events: Vec<Event>,
}

impl Feed {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Serialized form stored under `feed:<subject>` and returned to callers
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Result of a feed read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRead {
    /// Serialized feed, byte-identical to what is cached
    pub body: String,
    /// Whether the body came from the cache
    pub hit: bool,
}

impl FeedRead {
    /// Parse the body back into typed events
    pub fn feed(&self) -> serde_json::Result<Feed> {
        Feed::from_json(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(event_key(EventId(1)), "event:1");
        assert_eq!(feed_key(SubjectId(42)), "feed:42");
    }

    #[test]
    fn test_empty_feed_serializes_as_array() {
        assert_eq!(Feed::default().to_json().unwrap(), "[]");
    }
}

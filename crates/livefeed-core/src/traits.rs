// Collaborator traits for pluggable backends
//
// The pipelines only talk to these traits:
// - In-memory implementations for examples and testing (crate::memory)
// - Postgres, moka and Iggy adapters for production (sibling crates)
//
// Every implementation must be safe for concurrent use and must bound each call
// with its own timeout; the pipelines never add timeouts of their own.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{CacheError, PipelineWarning, PublishError, StoreError};
use crate::event::{Event, EventId, NewEvent, SubjectId};

// ============================================================================
// EventStore - Durable event-of-record
// ============================================================================

/// Trait for the durable store holding the event-of-record
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert an event, returning it with the store-assigned id and created_at
    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError>;

    /// Most recent events for a subject, newest first, at most `limit`
    async fn recent_events(&self, subject_id: SubjectId, limit: usize) -> Result<Vec<Event>, StoreError>;

    /// Look up a single event by id
    async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError>;
}

// ============================================================================
// FeedCache - Key/value cache with per-key TTL
// ============================================================================

/// Trait for the key/value cache
#[async_trait]
pub trait FeedCache: Send + Sync {
    /// Get a live value; expired entries are absent
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set a value that expires after `ttl`
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

// ============================================================================
// EventPublisher - Append-only event stream
// ============================================================================

/// Trait for publishing serialized events to the stream
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a serialized event keyed by event id.
    ///
    /// Must complete or definitively fail before returning.
    async fn publish(&self, key: &str, value: &str) -> Result<(), PublishError>;
}

// ============================================================================
// PipelineMetrics - Observability collaborator
// ============================================================================

/// Trait for recording pipeline observations
///
/// Fire-and-forget: implementations must not fail or block for long.
pub trait PipelineMetrics: Send + Sync {
    fn record_cache_hit(&self);

    fn record_cache_miss(&self);

    fn record_warning(&self, warning: &PipelineWarning);
}

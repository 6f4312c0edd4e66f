// Error types for the ingestion and feed read pipelines
//
// Collaborator errors (StoreError, CacheError, PublishError) are produced by the
// adapters. PipelineError is what callers see; PipelineWarning carries the
// non-fatal cache/stream failures that never turn a success into a failure.

use std::time::Duration;

use thiserror::Error;

use crate::event::{EventId, SubjectId};

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors from the durable store adapter
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// The call did not complete within the adapter's timeout
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// An id was assigned but the commit could not be confirmed
    #[error("commit of event {id} unconfirmed: {reason}")]
    CommitUnconfirmed { id: EventId, reason: String },

    /// Row could not be decoded into an event
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from the cache adapter
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend error
    #[error("cache backend error: {0}")]
    Backend(String),

    /// The call did not complete within the adapter's timeout
    #[error("cache call timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors from the event publisher adapter
#[derive(Debug, Error)]
pub enum PublishError {
    /// Stream error
    #[error("stream error: {0}")]
    Stream(String),

    /// The call did not complete within the adapter's timeout
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    /// Publisher has no live connection
    #[error("publisher not connected")]
    NotConnected,
}

/// Errors returned to pipeline callers
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Insert failed; no cache or stream side effects happened
    #[error("failed to persist event: {0}")]
    StorePersistFailed(#[source] StoreError),

    /// Store assigned an id but the commit is unconfirmed; treated as failure
    #[error("event {id} insert unconfirmed: {source}")]
    StoreInsertPartial {
        id: EventId,
        #[source]
        source: StoreError,
    },

    /// Feed query failed; no stale fallback is served
    #[error("failed to query feed for subject {subject_id}: {source}")]
    FeedQueryFailed {
        subject_id: SubjectId,
        #[source]
        source: StoreError,
    },

    /// Single-event lookup failed
    #[error("failed to look up event {id}: {source}")]
    EventLookupFailed {
        id: EventId,
        #[source]
        source: StoreError,
    },

    /// Feed could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// Map an insert error, keeping unconfirmed commits distinguishable
    pub fn from_insert(err: StoreError) -> Self {
        match err {
            StoreError::CommitUnconfirmed { id, .. } => PipelineError::StoreInsertPartial { id, source: err },
            other => PipelineError::StorePersistFailed(other),
        }
    }

    pub fn feed_query(subject_id: SubjectId, source: StoreError) -> Self {
        PipelineError::FeedQueryFailed { subject_id, source }
    }

    pub fn event_lookup(id: EventId, source: StoreError) -> Self {
        PipelineError::EventLookupFailed { id, source }
    }

    /// Whether the store reported a timeout for this failure
    pub fn is_timeout(&self) -> bool {
        let source = match self {
            PipelineError::StorePersistFailed(source)
            | PipelineError::StoreInsertPartial { source, .. }
            | PipelineError::FeedQueryFailed { source, .. }
            | PipelineError::EventLookupFailed { source, .. } => source,
            PipelineError::Serialization(_) => return false,
        };
        matches!(source, StoreError::Timeout(_))
    }
}

/// Non-fatal failures surfaced alongside a successful result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineWarning {
    /// Cache population failed; only the fast-path read is affected
    #[error("cache populate failed for {key}: {error}")]
    CachePopulate { key: String, error: String },

    /// Stream publish failed; stream-only consumers will miss the event
    #[error("publish failed for {key}: {error}")]
    Publish { key: String, error: String },
}

impl PipelineWarning {
    pub fn cache_populate(key: impl Into<String>, error: impl ToString) -> Self {
        PipelineWarning::CachePopulate {
            key: key.into(),
            error: error.to_string(),
        }
    }

    pub fn publish(key: impl Into<String>, error: impl ToString) -> Self {
        PipelineWarning::Publish {
            key: key.into(),
            error: error.to_string(),
        }
    }

    pub fn is_publish(&self) -> bool {
        matches!(self, PipelineWarning::Publish { .. })
    }

    pub fn is_cache_populate(&self) -> bool {
        matches!(self, PipelineWarning::CachePopulate { .. })
    }
}

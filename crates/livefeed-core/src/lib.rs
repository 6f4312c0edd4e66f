// LiveFeed core pipelines
//
// This crate provides backend-agnostic implementations of the two coordinated
// flows of the activity feed service:
// - IngestionPipeline: persist to the store → populate `event:<id>` → publish to the stream
// - FeedReadPipeline: cache-aside read of `feed:<subject>` with store fallback
//
// Key design decisions:
// - Uses traits (EventStore, FeedCache, EventPublisher, PipelineMetrics) for pluggable backends
// - Store failures are fatal, cache/stream failures are warnings
// - Feed entries expire by TTL only; ingest never invalidates them
// - Handles are passed in explicitly, there are no process-wide clients
// - Timeouts belong to the adapters, the pipelines only map the resulting errors

pub mod config;
pub mod error;
pub mod event;
pub mod feed;
pub mod feed_read;
pub mod ingestion;
pub mod metrics;
pub mod traits;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use config::PipelineConfig;
pub use error::{CacheError, PipelineError, PipelineWarning, PublishError, Result, StoreError};
pub use event::{payload_from_value, Event, EventId, NewEvent, Payload, SubjectId};
pub use feed::{event_key, feed_key, Feed, FeedRead};
pub use feed_read::FeedReadPipeline;
pub use ingestion::{IngestOutcome, IngestionPipeline};
pub use memory::{CountingMetrics, MetricsSnapshot};
pub use metrics::{describe_metrics, CounterMetrics, NoopMetrics};
pub use traits::{EventPublisher, EventStore, FeedCache, PipelineMetrics};

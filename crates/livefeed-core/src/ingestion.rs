// Event ingestion pipeline
//
// persist → (cache populate ∥ stream publish)
//
// The store write is the authority: if it fails nothing else happens. Once the
// event is durable, cache and stream failures are reported as warnings and the
// ingestion still succeeds with the store-assigned id.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineWarning, Result};
use crate::event::{Event, EventId, NewEvent, Payload, SubjectId};
use crate::feed::event_key;
use crate::metrics::NoopMetrics;
use crate::traits::{EventPublisher, EventStore, FeedCache, PipelineMetrics};

/// Successful ingestion, with any non-fatal warnings
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    /// The persisted event, as returned by the store
    pub event: Event,
    /// Cache/stream failures that did not fail the ingestion
    pub warnings: Vec<PipelineWarning>,
}

impl IngestOutcome {
    pub fn event_id(&self) -> EventId {
        self.event.id
    }

    /// Whether the event reached the stream
    pub fn published(&self) -> bool {
        !self.warnings.iter().any(PipelineWarning::is_publish)
    }
}

/// Writes events to the store, the event cache and the stream
#[derive(Clone)]
pub struct IngestionPipeline {
    store: Arc<dyn EventStore>,
    cache: Arc<dyn FeedCache>,
    publisher: Arc<dyn EventPublisher>,
    metrics: Arc<dyn PipelineMetrics>,
    config: PipelineConfig,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn EventStore>,
        cache: Arc<dyn FeedCache>,
        publisher: Arc<dyn EventPublisher>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            cache,
            publisher,
            metrics: Arc::new(NoopMetrics),
            config,
        }
    }

    /// Report warnings to a metrics collaborator
    pub fn with_metrics(mut self, metrics: Arc<dyn PipelineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest a new event for a subject
    pub async fn ingest(
        &self,
        subject_id: SubjectId,
        event_type: impl Into<String>,
        payload: Payload,
    ) -> Result<IngestOutcome> {
        self.ingest_event(NewEvent::new(subject_id, event_type, payload))
            .await
    }

    #[instrument(skip(self, new), fields(subject_id = %new.subject_id, event_type = %new.event_type))]
    pub async fn ingest_event(&self, new: NewEvent) -> Result<IngestOutcome> {
        let event = self.store.insert_event(new).await.map_err(|e| {
            warn!(error = %e, "event insert failed");
            PipelineError::from_insert(e)
        })?;

        let warnings = self.fan_out(&event).await;
        for warning in &warnings {
            warn!(event_id = %event.id, %warning, "non-fatal ingestion failure");
            self.metrics.record_warning(warning);
        }

        debug!(event_id = %event.id, warnings = warnings.len(), "event ingested");
        Ok(IngestOutcome { event, warnings })
    }

    /// Populate `event:<id>` and publish to the stream, concurrently
    async fn fan_out(&self, event: &Event) -> Vec<PipelineWarning> {
        let cache_key = event_key(event.id);
        let stream_key = event.id.to_string();

        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                return vec![
                    PipelineWarning::cache_populate(&cache_key, &e),
                    PipelineWarning::publish(&stream_key, &e),
                ];
            }
        };

        let (cached, published) = tokio::join!(
            self.cache.set(&cache_key, json.clone(), self.config.event_ttl),
            self.publisher.publish(&stream_key, &json),
        );

        let mut warnings = Vec::new();
        if let Err(e) = cached {
            warnings.push(PipelineWarning::cache_populate(&cache_key, e));
        }
        if let Err(e) = published {
            warnings.push(PipelineWarning::publish(&stream_key, e));
        }
        warnings
    }

    /// Fast-path read of a single event.
    ///
    /// Serves `event:<id>` from the cache when present and parseable, otherwise
    /// reads the store. The cache is not repopulated on this path.
    #[instrument(skip(self), fields(event_id = %id))]
    pub async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        let key = event_key(id);
        match self.cache.get(&key).await {
            Ok(Some(json)) => match Event::from_json(&json) {
                Ok(event) => {
                    debug!("event served from cache");
                    return Ok(Some(event));
                }
                Err(e) => warn!(error = %e, "discarding unparseable cached event"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "event cache lookup failed, reading store"),
        }

        self.store
            .get_event(id)
            .await
            .map_err(|e| PipelineError::event_lookup(id, e))
    }
}

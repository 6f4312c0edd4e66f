// Feed read pipeline (cache-aside)
//
// 1. look up `feed:<subject>`
// 2. hit: return the cached body as is
// 3. miss: query the store, serialize, populate with the feed TTL, return
//
// A read is either entirely cache-derived or entirely store-derived. A store
// failure fails the read; no stale value is served. New events become visible
// once the cached feed expires, there is no invalidation on ingest.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineWarning, Result};
use crate::event::{Event, SubjectId};
use crate::feed::{feed_key, Feed, FeedRead};
use crate::metrics::NoopMetrics;
use crate::traits::{EventStore, FeedCache, PipelineMetrics};

/// Serves per-subject feeds through the cache
#[derive(Clone)]
pub struct FeedReadPipeline {
    store: Arc<dyn EventStore>,
    cache: Arc<dyn FeedCache>,
    metrics: Arc<dyn PipelineMetrics>,
    config: PipelineConfig,
}

impl FeedReadPipeline {
    pub fn new(store: Arc<dyn EventStore>, cache: Arc<dyn FeedCache>, config: PipelineConfig) -> Self {
        Self {
            store,
            cache,
            metrics: Arc::new(NoopMetrics),
            config,
        }
    }

    /// Record hits, misses and warnings on a metrics collaborator
    pub fn with_metrics(mut self, metrics: Arc<dyn PipelineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Serialized feed for a subject, most recent first
    #[instrument(skip(self), fields(subject_id = %subject_id))]
    pub async fn get_feed(&self, subject_id: SubjectId) -> Result<FeedRead> {
        let key = feed_key(subject_id);

        match self.cache.get(&key).await {
            Ok(Some(body)) => {
                self.metrics.record_cache_hit();
                debug!("feed cache hit");
                return Ok(FeedRead { body, hit: true });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "feed cache lookup failed, treating as miss"),
        }

        self.metrics.record_cache_miss();
        debug!("feed cache miss");

        let events = self
            .store
            .recent_events(subject_id, self.config.feed_limit)
            .await
            .map_err(|e| {
                warn!(error = %e, "feed query failed");
                PipelineError::feed_query(subject_id, e)
            })?;

        let body = Feed::new(events)
            .to_json()
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;

        if let Err(e) = self.cache.set(&key, body.clone(), self.config.feed_ttl).await {
            let warning = PipelineWarning::cache_populate(&key, e);
            warn!(%warning, "feed cache populate failed");
            self.metrics.record_warning(&warning);
        }

        Ok(FeedRead { body, hit: false })
    }

    /// Typed variant of [`get_feed`](Self::get_feed)
    pub async fn get_feed_events(&self, subject_id: SubjectId) -> Result<Vec<Event>> {
        let read = self.get_feed(subject_id).await?;
        let feed = read
            .feed()
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        Ok(feed.events)
    }
}

// Adapter wiring for CLI commands
//
// Builds the Postgres store, moka cache and Iggy publisher from the environment
// and hands them to the pipelines. The publisher is optional at startup: when
// Iggy is unreachable, ingestion still persists and every publish surfaces as a
// warning.
//
// The cache lives in this process: entries are shared by every request served
// through one Services value (`livefeed shell`), and lost when the process exits.

use std::sync::Arc;

use anyhow::{Context, Result};
use livefeed_cache::{CacheConfig, MokaFeedCache};
use livefeed_core::{describe_metrics, CounterMetrics, FeedReadPipeline, IngestionPipeline, PipelineConfig};
use livefeed_storage::{PgEventStore, StoreConfig};
use livefeed_stream::{IggyEventPublisher, StreamConfig};
use tracing::{info, warn};

pub struct Services {
    pub store: Arc<PgEventStore>,
    pub cache: Arc<MokaFeedCache>,
    pub metrics: Arc<CounterMetrics>,
    pub config: PipelineConfig,
}

impl Services {
    /// Connect the store and build the cache
    pub async fn connect(database_url: &str) -> Result<Self> {
        let store = connect_store(database_url).await?;
        let cache = MokaFeedCache::new(&CacheConfig::from_env());
        let config = PipelineConfig::from_env();
        describe_metrics();

        info!(
            event_ttl = ?config.event_ttl,
            feed_ttl = ?config.feed_ttl,
            feed_limit = config.feed_limit,
            "Pipelines configured"
        );

        Ok(Self {
            store: Arc::new(store),
            cache: Arc::new(cache),
            metrics: Arc::new(CounterMetrics::new()),
            config,
        })
    }

    /// Ingestion pipeline; `connect_stream` is false for read-only lookups
    pub async fn ingestion(&self, connect_stream: bool) -> Result<IngestionPipeline> {
        let publisher = IggyEventPublisher::new(StreamConfig::from_env())
            .context("Failed to build Iggy client")?;
        if connect_stream {
            if let Err(e) = publisher.connect().await {
                warn!(error = %e, "Iggy unavailable, events will be persisted without publishing");
            }
        }

        Ok(IngestionPipeline::new(
            self.store.clone(),
            self.cache.clone(),
            Arc::new(publisher),
            self.config.clone(),
        )
        .with_metrics(self.metrics.clone()))
    }

    pub fn feeds(&self) -> FeedReadPipeline {
        FeedReadPipeline::new(self.store.clone(), self.cache.clone(), self.config.clone())
            .with_metrics(self.metrics.clone())
    }
}

/// Open the Postgres pool, taking tuning knobs from the environment
pub async fn connect_store(database_url: &str) -> Result<PgEventStore> {
    let mut config = StoreConfig::from_env().unwrap_or_else(|| StoreConfig::new(database_url));
    config.database_url = database_url.to_string();

    PgEventStore::connect(&config)
        .await
        .context("Failed to connect to Postgres")
}

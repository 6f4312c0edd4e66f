// Activity feed example
//
// Ingests a few events and reads a feed twice using the in-memory collaborators.
//
// Run with: cargo run -p livefeed-core --example activity_feed

use livefeed_core::memory::{InMemoryEventPublisher, InMemoryEventStore, InMemoryFeedCache};
use livefeed_core::{payload_from_value, CountingMetrics, FeedReadPipeline, IngestionPipeline, PipelineConfig, SubjectId};
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "livefeed_core=debug".into()),
        )
        .init();

    let store = Arc::new(InMemoryEventStore::new());
    let cache = Arc::new(InMemoryFeedCache::new());
    let publisher = Arc::new(InMemoryEventPublisher::new());
    let metrics = Arc::new(CountingMetrics::new());
    let config = PipelineConfig::default();

    let ingestion = IngestionPipeline::new(store.clone(), cache.clone(), publisher.clone(), config.clone())
        .with_metrics(metrics.clone());
    let feeds = FeedReadPipeline::new(store, cache, config).with_metrics(metrics.clone());

    let subject = SubjectId(42);
    for (event_type, payload) in [
        ("like", json!({"post": 7})),
        ("comment", json!({"post": 7, "text": "nice"})),
        ("follow", json!({"target": 99})),
    ] {
        let outcome = ingestion
            .ingest(subject, event_type, payload_from_value(payload))
            .await?;
        println!("ingested {} as event {}", event_type, outcome.event_id());
    }

    let cold = feeds.get_feed(subject).await?;
    println!("cold read (hit={}): {}", cold.hit, cold.body);

    let warm = feeds.get_feed(subject).await?;
    println!("warm read (hit={}): {} bytes", warm.hit, warm.body.len());

    println!("stream records: {}", publisher.records().await.len());
    println!("metrics: {:?}", metrics.snapshot());

    Ok(())
}

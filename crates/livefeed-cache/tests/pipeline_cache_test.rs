// Pipelines running over MokaFeedCache
//
// One cache instance serves every request made through the same pipelines, the
// way `livefeed shell` wires it.

use std::sync::Arc;

use livefeed_cache::{CacheConfig, MokaFeedCache};
use livefeed_core::memory::{InMemoryEventPublisher, InMemoryEventStore};
use livefeed_core::{payload_from_value, FeedReadPipeline, IngestionPipeline, PipelineConfig, SubjectId};
use serde_json::json;

struct Pipelines {
    store: Arc<InMemoryEventStore>,
    ingestion: IngestionPipeline,
    feeds: FeedReadPipeline,
}

fn pipelines() -> Pipelines {
    let store = Arc::new(InMemoryEventStore::new());
    let cache = Arc::new(MokaFeedCache::new(&CacheConfig::default()));
    let publisher = Arc::new(InMemoryEventPublisher::new());
    let config = PipelineConfig::default();

    Pipelines {
        store: store.clone(),
        ingestion: IngestionPipeline::new(store.clone(), cache.clone(), publisher, config.clone()),
        feeds: FeedReadPipeline::new(store, cache, config),
    }
}

#[tokio::test]
async fn test_repeat_feed_reads_hit_the_shared_cache() {
    let p = pipelines();
    p.ingestion
        .ingest(SubjectId(42), "like", payload_from_value(json!({"post": 7})))
        .await
        .unwrap();

    let cold = p.feeds.get_feed(SubjectId(42)).await.unwrap();
    let warm = p.feeds.get_feed(SubjectId(42)).await.unwrap();

    assert!(!cold.hit);
    assert!(warm.hit);
    assert_eq!(warm.body, cold.body);
    assert_eq!(p.store.query_calls(), 1);
}

#[tokio::test]
async fn test_event_lookup_after_ingest_is_served_from_cache() {
    let p = pipelines();
    let outcome = p
        .ingestion
        .ingest(SubjectId(5), "follow", payload_from_value(json!({"target": 9})))
        .await
        .unwrap();

    // A store outage cannot affect a lookup the cache can answer
    p.store.set_fail_queries(true);
    let event = p.ingestion.get_event(outcome.event_id()).await.unwrap().unwrap();

    assert_eq!(event, outcome.event);
}

// In-memory implementations for examples and testing
//
// These implementations keep all data in memory, making them suitable for:
// - Standalone examples that don't need Postgres, a cache or a broker
// - Unit and integration tests (call counters and failure switches)
//
// The cache measures TTLs with tokio's clock, so tests can use
// `tokio::time::pause()` / `advance()` to step past an expiry.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::{CacheError, PipelineWarning, PublishError, StoreError};
use crate::event::{Event, EventId, NewEvent, SubjectId};
use crate::traits::{EventPublisher, EventStore, FeedCache, PipelineMetrics};

// ============================================================================
// InMemoryEventStore - Stores events in a Vec
// ============================================================================

/// How the in-memory store treats inserts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    /// Store the event and return it
    #[default]
    Succeed,
    /// Fail before assigning an id
    Fail,
    /// Assign an id, drop the event and report the commit as unconfirmed
    Unconfirmed,
}

/// In-memory event store
///
/// Ids start at 1 and increase by one per insert.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<Event>>,
    last_id: AtomicI64,
    insert_mode: Mutex<InsertMode>,
    fail_queries: AtomicBool,
    query_delay: Option<Duration>,
    insert_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl InMemoryEventStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every recent-events query
    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    pub fn set_insert_mode(&self, mode: InsertMode) {
        if let Ok(mut current) = self.insert_mode.lock() {
            *current = mode;
        }
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of insert_event calls, including failed ones
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// Number of recent_events calls, including failed ones
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// All stored events in insertion order
    pub async fn events(&self) -> Vec<Event> {
        self.events.read().await.clone()
    }

    /// Pre-populate with already persisted events (useful for testing)
    pub async fn seed(&self, events: Vec<Event>) {
        let max_id = events.iter().map(|e| e.id.0).max().unwrap_or(0);
        self.last_id.fetch_max(max_id, Ordering::SeqCst);
        self.events.write().await.extend(events);
    }

    fn insert_mode(&self) -> InsertMode {
        self.insert_mode.lock().map(|mode| *mode).unwrap_or_default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        match self.insert_mode() {
            InsertMode::Succeed => {}
            InsertMode::Fail => return Err(StoreError::Database("simulated insert failure".to_string())),
            InsertMode::Unconfirmed => {
                let id = EventId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);
                return Err(StoreError::CommitUnconfirmed {
                    id,
                    reason: "simulated lost commit acknowledgement".to_string(),
                });
            }
        }

        let mut events = self.events.write().await;
        let id = EventId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);
        let event = Event::from_new(event, id, Utc::now());
        events.push(event.clone());
        Ok(event)
    }

    async fn recent_events(&self, subject_id: SubjectId, limit: usize) -> Result<Vec<Event>, StoreError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.query_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated query failure".to_string()));
        }

        let mut events: Vec<Event> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        events.truncate(limit);
        Ok(events)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated query failure".to_string()));
        }
        Ok(self.events.read().await.iter().find(|e| e.id == id).cloned())
    }
}

// ============================================================================
// InMemoryFeedCache - HashMap with per-key expiry
// ============================================================================

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    /// None when the TTL is too large to represent: the entry never expires
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-memory TTL cache
///
/// Expired entries are treated as absent and dropped lazily on read.
#[derive(Debug, Default)]
pub struct InMemoryFeedCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    fail_gets: AtomicBool,
    fail_sets: AtomicBool,
    get_calls: AtomicUsize,
    set_calls: AtomicUsize,
}

impl InMemoryFeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Live value for a key, bypassing counters and failure switches
    pub async fn peek(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Live keys
    pub async fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.keys().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl FeedCache for InMemoryFeedCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("simulated get failure".to_string()));
        }

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("simulated set failure".to_string()));
        }

        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }
}

// ============================================================================
// InMemoryEventPublisher - Records published messages
// ============================================================================

/// A message as it was handed to the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    pub key: String,
    pub value: String,
}

/// In-memory append-only stream
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    records: RwLock<Vec<PublishedRecord>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of publish calls, including failed ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Records in publish order
    pub async fn records(&self) -> Vec<PublishedRecord> {
        self.records.read().await.clone()
    }

    /// Records published from `offset` onwards, like a consumer poll
    pub async fn poll_from(&self, offset: usize, max_count: usize) -> Vec<PublishedRecord> {
        self.records
            .read()
            .await
            .iter()
            .skip(offset)
            .take(max_count)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, key: &str, value: &str) -> Result<(), PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Stream("simulated broker outage".to_string()));
        }

        self.records.write().await.push(PublishedRecord {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// CountingMetrics - Plain counters for assertions
// ============================================================================

/// Point-in-time copy of [`CountingMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_populate_warnings: u64,
    pub publish_warnings: u64,
}

/// Lock-free counters for cache hits/misses and warnings
#[derive(Debug, Default)]
pub struct CountingMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_populate_warnings: AtomicU64,
    publish_warnings: AtomicU64,
}

impl CountingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_populate_warnings: self.cache_populate_warnings.load(Ordering::Relaxed),
            publish_warnings: self.publish_warnings.load(Ordering::Relaxed),
        }
    }
}

impl PipelineMetrics for CountingMetrics {
    fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_warning(&self, warning: &PipelineWarning) {
        match warning {
            PipelineWarning::CachePopulate { .. } => {
                self.cache_populate_warnings.fetch_add(1, Ordering::Relaxed);
            }
            PipelineWarning::Publish { .. } => {
                self.publish_warnings.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

// ============================================================================
// RecordingMetrics - Counters plus the warnings themselves
// ============================================================================

/// Metrics collaborator that keeps every warning it receives
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    counters: CountingMetrics,
    warnings: Mutex<Vec<PipelineWarning>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.counters.snapshot()
    }

    pub fn warnings(&self) -> Vec<PipelineWarning> {
        self.warnings.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl PipelineMetrics for RecordingMetrics {
    fn record_cache_hit(&self) {
        self.counters.record_cache_hit();
    }

    fn record_cache_miss(&self) {
        self.counters.record_cache_miss();
    }

    fn record_warning(&self, warning: &PipelineWarning) {
        self.counters.record_warning(warning);
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(warning.clone());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::payload_from_value;
    use serde_json::json;

    fn new_event(subject: i64, event_type: &str) -> NewEvent {
        NewEvent::new(subject, event_type, payload_from_value(json!({"n": 1})))
    }

    #[tokio::test]
    async fn test_store_assigns_incrementing_ids() {
        let store = InMemoryEventStore::new();

        let first = store.insert_event(new_event(1, "like")).await.unwrap();
        let second = store.insert_event(new_event(1, "share")).await.unwrap();

        assert_eq!(first.id, EventId(1));
        assert_eq!(second.id, EventId(2));
        assert_eq!(store.insert_calls(), 2);
    }

    #[tokio::test]
    async fn test_store_recent_events_newest_first_and_limited() {
        let store = InMemoryEventStore::new();
        for i in 0..5 {
            store.insert_event(new_event(7, &format!("t{i}"))).await.unwrap();
        }
        store.insert_event(new_event(8, "other")).await.unwrap();

        let events = store.recent_events(SubjectId(7), 3).await.unwrap();

        let ids: Vec<i64> = events.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![5, 4, 3]);
        assert_eq!(store.query_calls(), 1);
    }

    #[tokio::test]
    async fn test_store_unconfirmed_insert_is_not_visible() {
        let store = InMemoryEventStore::new();
        store.set_insert_mode(InsertMode::Unconfirmed);

        let err = store.insert_event(new_event(1, "like")).await.unwrap_err();

        assert!(matches!(err, StoreError::CommitUnconfirmed { id: EventId(1), .. }));
        assert!(store.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_seed_advances_ids() {
        let store = InMemoryEventStore::new();
        store
            .seed(vec![Event::from_new(new_event(1, "like"), EventId(10), Utc::now())])
            .await;

        let next = store.insert_event(new_event(1, "like")).await.unwrap();
        assert_eq!(next.id, EventId(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_entry_expires_after_ttl() {
        let cache = InMemoryFeedCache::new();
        cache.set("k", "v".to_string(), Duration::from_secs(5)).await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_failure_switches() {
        let cache = InMemoryFeedCache::new();
        cache.set_fail_sets(true);
        assert!(cache.set("k", "v".to_string(), Duration::from_secs(1)).await.is_err());

        cache.set_fail_gets(true);
        assert!(cache.get("k").await.is_err());
        assert_eq!(cache.get_calls(), 1);
        assert_eq!(cache.set_calls(), 1);
    }

    #[tokio::test]
    async fn test_publisher_records_in_order() {
        let publisher = InMemoryEventPublisher::new();
        publisher.publish("1", "a").await.unwrap();
        publisher.publish("2", "b").await.unwrap();

        let polled = publisher.poll_from(1, 10).await;
        assert_eq!(
            polled,
            vec![PublishedRecord {
                key: "2".to_string(),
                value: "b".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_publisher_failure_records_nothing() {
        let publisher = InMemoryEventPublisher::new();
        publisher.set_fail(true);

        assert!(publisher.publish("1", "a").await.is_err());
        assert_eq!(publisher.calls(), 1);
        assert!(publisher.records().await.is_empty());
    }

    #[test]
    fn test_counting_metrics() {
        let metrics = CountingMetrics::new();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_cache_miss();
        metrics.record_warning(&PipelineWarning::publish("1", "broker down"));

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                cache_hits: 1,
                cache_misses: 2,
                cache_populate_warnings: 0,
                publish_warnings: 1,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_huge_ttl_never_expires() {
        let cache = InMemoryFeedCache::new();
        cache.set("feed:1", "[]".to_string(), Duration::MAX).await.unwrap();

        tokio::time::advance(Duration::from_secs(10 * 365 * 24 * 3600)).await;

        assert_eq!(cache.get("feed:1").await.unwrap(), Some("[]".to_string()));
    }
}

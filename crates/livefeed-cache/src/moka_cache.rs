//! moka implementation of FeedCache
//!
//! Event keys and feed keys share one cache but expire on different schedules,
//! so the TTL travels with each entry and is applied through [`moka::Expiry`].
//! Expired entries are never returned, even before moka evicts them.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use livefeed_core::{CacheError, FeedCache};
use moka::future::Cache;
use moka::Expiry;
use tracing::{debug, instrument};

use crate::config::CacheConfig;

/// Cached value with the TTL it was written with
#[derive(Clone, Debug)]
struct CachedEntry {
    body: String,
    ttl: Duration,
}

/// Expiry policy that reads the TTL off each entry.
///
/// An overwrite restarts the clock with the new entry's TTL.
struct PerEntryTtl;

impl Expiry<String, CachedEntry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &CachedEntry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-process cache with per-key TTL
#[derive(Clone)]
pub struct MokaFeedCache {
    cache: Cache<String, CachedEntry>,
    timeout: Duration,
}

impl MokaFeedCache {
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            timeout: config.timeout,
        }
    }

    /// Number of live entries after pending maintenance has run
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    async fn bounded<T>(&self, fut: impl Future<Output = T>) -> Result<T, CacheError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout(self.timeout))
    }
}

impl Default for MokaFeedCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl FeedCache for MokaFeedCache {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entry = self.bounded(self.cache.get(key)).await?;
        debug!(hit = entry.is_some(), "cache get");
        Ok(entry.map(|e| e.body))
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::Backend(format!("refusing to cache {} with a zero TTL", key)));
        }

        let entry = CachedEntry { body: value, ttl };
        self.bounded(self.cache.insert(key.to_string(), entry)).await
    }
}

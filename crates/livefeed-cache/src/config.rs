// Cache configuration

use std::time::Duration;

use livefeed_core::config::env_millis;

/// Default cache capacity (number of entries)
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default upper bound for a single cache call
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries before eviction
    pub max_capacity: u64,

    /// Upper bound for every get/set
    pub timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_CACHE_CAPACITY,
            timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `LIVEFEED_CACHE_CAPACITY`: maximum entries (default: 10000)
    /// - `LIVEFEED_CACHE_TIMEOUT_MS`: per-call timeout (default: 250)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(capacity) = std::env::var("LIVEFEED_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_capacity = capacity;
        }
        if let Some(timeout) = env_millis("LIVEFEED_CACHE_TIMEOUT_MS") {
            config.timeout = timeout;
        }

        config
    }

    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::new();
        assert_eq!(config.max_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.timeout, DEFAULT_CACHE_TIMEOUT);
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::new()
            .with_max_capacity(16)
            .with_timeout(Duration::from_millis(10));
        assert_eq!(config.max_capacity, 16);
        assert_eq!(config.timeout, Duration::from_millis(10));
    }
}

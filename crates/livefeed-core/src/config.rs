// Pipeline configuration
//
// PipelineConfig is backend-agnostic: TTLs and the feed length. Connection
// settings for the concrete adapters live in their own crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by the ingestion and feed read pipelines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// TTL of the `event:<id>` entry written on ingestion
    #[serde(default = "default_event_ttl")]
    pub event_ttl: Duration,

    /// TTL of the `feed:<subject>` entry written on a read miss
    #[serde(default = "default_feed_ttl")]
    pub feed_ttl: Duration,

    /// Maximum number of events in a feed
    #[serde(default = "default_feed_limit")]
    pub feed_limit: usize,
}

fn default_event_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_feed_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_feed_limit() -> usize {
    20
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `LIVEFEED_EVENT_TTL_SECS`: event entry TTL (default: 600)
    /// - `LIVEFEED_FEED_TTL_SECS`: feed entry TTL (default: 300)
    /// - `LIVEFEED_FEED_LIMIT`: feed length (default: 20)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            event_ttl: env_secs("LIVEFEED_EVENT_TTL_SECS").unwrap_or(defaults.event_ttl),
            feed_ttl: env_secs("LIVEFEED_FEED_TTL_SECS").unwrap_or(defaults.feed_ttl),
            feed_limit: std::env::var("LIVEFEED_FEED_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.feed_limit),
        }
    }

    /// Set the event entry TTL
    pub fn with_event_ttl(mut self, ttl: Duration) -> Self {
        self.event_ttl = ttl;
        self
    }

    /// Set the feed entry TTL
    pub fn with_feed_ttl(mut self, ttl: Duration) -> Self {
        self.feed_ttl = ttl;
        self
    }

    /// Set the feed length
    pub fn with_feed_limit(mut self, limit: usize) -> Self {
        self.feed_limit = limit;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            event_ttl: default_event_ttl(),
            feed_ttl: default_feed_ttl(),
            feed_limit: default_feed_limit(),
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Read a millisecond duration from the environment
pub fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

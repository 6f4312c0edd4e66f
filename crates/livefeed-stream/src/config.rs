//! Configuration for the Iggy connection and the target stream/topic.

use std::time::Duration;

use livefeed_core::config::env_millis;

/// Default Iggy TCP address
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8090";

/// Default stream name
pub const DEFAULT_STREAM: &str = "livefeed";

/// Default topic name
pub const DEFAULT_TOPIC: &str = "events";

/// Partitions created with the topic
pub const DEFAULT_PARTITIONS: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Iggy server TCP address
    pub address: String,

    pub username: String,

    pub password: String,

    /// Stream the topic lives in
    pub stream: String,

    /// Topic events are published to
    pub topic: String,

    /// Partition count used when the topic has to be created
    pub partitions: u32,

    /// Upper bound for connect and for every publish
    pub timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            username: iggy::prelude::DEFAULT_ROOT_USERNAME.to_string(),
            password: iggy::prelude::DEFAULT_ROOT_PASSWORD.to_string(),
            stream: DEFAULT_STREAM.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            partitions: DEFAULT_PARTITIONS,
            timeout: Duration::from_secs(2),
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `LIVEFEED_IGGY_ADDRESS`: server address (default: 127.0.0.1:8090)
    /// - `LIVEFEED_IGGY_USERNAME` / `LIVEFEED_IGGY_PASSWORD`: credentials (default: root user)
    /// - `LIVEFEED_STREAM`: stream name (default: livefeed)
    /// - `LIVEFEED_TOPIC`: topic name (default: events)
    /// - `LIVEFEED_IGGY_TIMEOUT_MS`: connect/publish timeout (default: 2000)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(address) = std::env::var("LIVEFEED_IGGY_ADDRESS") {
            config.address = address;
        }
        if let Ok(username) = std::env::var("LIVEFEED_IGGY_USERNAME") {
            config.username = username;
        }
        if let Ok(password) = std::env::var("LIVEFEED_IGGY_PASSWORD") {
            config.password = password;
        }
        if let Ok(stream) = std::env::var("LIVEFEED_STREAM") {
            config.stream = stream;
        }
        if let Ok(topic) = std::env::var("LIVEFEED_TOPIC") {
            config.topic = topic;
        }
        if let Some(timeout) = env_millis("LIVEFEED_IGGY_TIMEOUT_MS") {
            config.timeout = timeout;
        }

        config
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn with_stream(mut self, stream: impl Into<String>, topic: impl Into<String>) -> Self {
        self.stream = stream.into();
        self.topic = topic.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

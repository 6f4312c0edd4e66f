// Store connection configuration

use std::time::Duration;

use livefeed_core::config::env_millis;

/// Postgres connection settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Postgres connection URL
    pub database_url: String,

    /// Pool size
    pub max_connections: u32,

    /// Upper bound for every store call, including pool acquisition
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            timeout: Duration::from_secs(5),
        }
    }

    /// Create configuration from environment variables
    ///
    /// Returns None if `DATABASE_URL` is not set.
    ///
    /// Environment variables:
    /// - `DATABASE_URL`: Postgres connection URL (required)
    /// - `LIVEFEED_DB_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `LIVEFEED_DB_TIMEOUT_MS`: per-call timeout (default: 5000)
    pub fn from_env() -> Option<Self> {
        let database_url = std::env::var("DATABASE_URL").ok()?;
        let mut config = Self::new(database_url);

        if let Some(max) = std::env::var("LIVEFEED_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_connections = max;
        }
        if let Some(timeout) = env_millis("LIVEFEED_DB_TIMEOUT_MS") {
            config.timeout = timeout;
        }

        Some(config)
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
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
        let config = StoreConfig::new("postgres://localhost/livefeed");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new("postgres://localhost/livefeed")
            .with_max_connections(2)
            .with_timeout(Duration::from_millis(200));
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.timeout, Duration::from_millis(200));
    }
}

//! Iggy implementation of EventPublisher.
//!
//! Records are sent to a single stream/topic and partitioned by message key,
//! so every record for a given event id lands on the same partition. Sends are
//! synchronous from the caller's point of view: `publish` returns once Iggy has
//! acknowledged the batch or the timeout elapses.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use iggy::prelude::*;
use livefeed_core::{EventPublisher, PublishError};
use tracing::{debug, info, instrument, warn};

use crate::config::StreamConfig;

/// Check if an Iggy error indicates a resource already exists.
fn is_already_exists_error(e: &IggyError) -> bool {
    let err_str = e.to_string();
    err_str.contains("already exists")
        || err_str.contains("already_exists")
        || err_str.contains("AlreadyExists")
}

/// Check if an Iggy error means the connection is gone.
fn is_connection_error(e: &IggyError) -> bool {
    is_connection_message(&e.to_string())
}

fn is_connection_message(message: &str) -> bool {
    let err_str = message.to_lowercase();
    err_str.contains("disconnected")
        || err_str.contains("not connected")
        || err_str.contains("connection reset")
        || err_str.contains("connection refused")
        || err_str.contains("connection closed")
        || err_str.contains("broken pipe")
}

fn stream_error(e: IggyError) -> PublishError {
    PublishError::Stream(e.to_string())
}

/// Iggy-backed implementation of EventPublisher.
///
/// Build with [`IggyEventPublisher::new`], then call
/// [`connect`](IggyEventPublisher::connect) before publishing. A connection
/// error during a send marks the publisher disconnected. The next publish makes
/// one bounded reconnect attempt and fails with [`PublishError::NotConnected`]
/// only if that attempt fails.
pub struct IggyEventPublisher {
    client: IggyClient,
    config: StreamConfig,
    stream_id: Identifier,
    topic_id: Identifier,
    connected: AtomicBool,
    reconnect_attempts: AtomicU64,
}

impl IggyEventPublisher {
    /// Create an unconnected publisher.
    pub fn new(config: StreamConfig) -> Result<Self, PublishError> {
        let client = IggyClient::builder()
            .with_tcp()
            .with_server_address(config.address.clone())
            .build()
            .map_err(stream_error)?;

        let stream_id = Identifier::named(&config.stream)
            .map_err(|e| PublishError::Stream(format!("Invalid stream name: {}", e)))?;
        let topic_id = Identifier::named(&config.topic)
            .map_err(|e| PublishError::Stream(format!("Invalid topic name: {}", e)))?;

        Ok(Self {
            client,
            config,
            stream_id,
            topic_id,
            connected: AtomicBool::new(false),
            reconnect_attempts: AtomicU64::new(0),
        })
    }

    /// Create a publisher and connect it.
    pub async fn connect_with(config: StreamConfig) -> Result<Self, PublishError> {
        let publisher = Self::new(config)?;
        publisher.connect().await?;
        Ok(publisher)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Check if connected to Iggy.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of reconnects attempted from `publish`
    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnect_attempts.load(Ordering::SeqCst)
    }

    /// Connect, authenticate, and create the stream/topic if they don't exist.
    pub async fn connect(&self) -> Result<(), PublishError> {
        self.bounded(self.provision()).await?;
        self.connected.store(true, Ordering::SeqCst);
        info!(
            stream = %self.config.stream,
            topic = %self.config.topic,
            "IggyEventPublisher connected and ready"
        );
        Ok(())
    }

    /// Drop any half-open connection and provision again
    async fn reconnect(&self) -> Result<(), PublishError> {
        self.reconnect_attempts.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "Disconnect before reconnect failed");
        }
        self.connect().await
    }

    async fn provision(&self) -> Result<(), PublishError> {
        self.client.connect().await.map_err(stream_error)?;
        info!("Connected to Iggy server at {}", self.config.address);

        self.client
            .login_user(&self.config.username, &self.config.password)
            .await
            .map_err(stream_error)?;
        debug!(user = %self.config.username, "Logged in to Iggy");

        let streams = self.client.get_streams().await.map_err(stream_error)?;
        if streams.iter().any(|s| s.name == self.config.stream) {
            debug!("Stream '{}' already exists", self.config.stream);
        } else {
            match self.client.create_stream(&self.config.stream).await {
                Ok(_) => info!("Created stream '{}'", self.config.stream),
                Err(e) if is_already_exists_error(&e) => {
                    debug!("Stream already exists (concurrent creation)");
                }
                Err(e) => return Err(stream_error(e)),
            }
        }

        match self
            .client
            .create_topic(
                &self.stream_id,
                &self.config.topic,
                self.config.partitions,
                CompressionAlgorithm::None,
                None, // replication_factor
                IggyExpiry::NeverExpire,
                MaxTopicSize::ServerDefault,
            )
            .await
        {
            Ok(_) => info!(
                "Created topic '{}' with {} partitions",
                self.config.topic, self.config.partitions
            ),
            Err(e) if is_already_exists_error(&e) => {
                debug!("Topic already exists");
            }
            Err(e) => return Err(stream_error(e)),
        }

        Ok(())
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, PublishError>>,
    ) -> Result<T, PublishError> {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| PublishError::Timeout(self.config.timeout))?
    }

    async fn send(&self, key: &str, value: &str) -> Result<(), PublishError> {
        let message = IggyMessage::builder()
            .payload(value.as_bytes().to_vec().into())
            .build()
            .map_err(stream_error)?;

        let partitioning = Partitioning::messages_key_str(key).map_err(|e| {
            PublishError::Stream(format!("Failed to create partition key '{}': {}", key, e))
        })?;

        let mut messages = [message];
        match self
            .client
            .send_messages(&self.stream_id, &self.topic_id, &partitioning, &mut messages)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                if is_connection_error(&e) {
                    warn!(error = %e, "Connection error, marking publisher disconnected");
                    self.connected.store(false, Ordering::SeqCst);
                }
                Err(stream_error(e))
            }
        }
    }
}

#[async_trait]
impl EventPublisher for IggyEventPublisher {
    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn publish(&self, key: &str, value: &str) -> Result<(), PublishError> {
        if !self.is_connected() {
            if let Err(e) = self.reconnect().await {
                warn!(error = %e, "Reconnect to Iggy failed");
                return Err(PublishError::NotConnected);
            }
        }

        self.bounded(self.send(key, value)).await?;
        debug!("Published event to Iggy");
        Ok(())
    }
}

//! Integration tests for IggyEventPublisher
//!
//! Run with: cargo test -p livefeed-stream --test iggy_integration_test -- --ignored
//!
//! Requirements:
//! - iggy-server running on LIVEFEED_IGGY_ADDRESS or 127.0.0.1:8090 with the default root user

use std::time::Duration;

use iggy::prelude::*;
use livefeed_core::{EventPublisher, PublishError};
use livefeed_stream::{IggyEventPublisher, StreamConfig};

fn test_config() -> StreamConfig {
    StreamConfig::from_env().with_stream("livefeed-test", "events")
}

/// Read every payload in the topic with a fresh consumer
async fn read_all(config: &StreamConfig) -> Vec<String> {
    let client = IggyClient::builder()
        .with_tcp()
        .with_server_address(config.address.clone())
        .build()
        .unwrap();
    client.connect().await.unwrap();
    client
        .login_user(&config.username, &config.password)
        .await
        .unwrap();

    let stream_id = Identifier::named(&config.stream).unwrap();
    let topic_id = Identifier::named(&config.topic).unwrap();
    let consumer = Consumer::new(Identifier::named("livefeed-test-reader").unwrap());

    let mut payloads = Vec::new();
    for partition_id in 0..config.partitions {
        let polled = client
            .poll_messages(
                &stream_id,
                &topic_id,
                Some(partition_id),
                &consumer,
                &PollingStrategy::offset(0),
                1000,
                false,
            )
            .await;

        if let Ok(polled) = polled {
            for msg in polled.messages {
                payloads.push(String::from_utf8_lossy(&msg.payload).to_string());
            }
        }
    }
    payloads
}

#[tokio::test]
#[ignore]
async fn test_connect_provisions_and_publishes() {
    let config = test_config();
    let publisher = IggyEventPublisher::connect_with(config.clone()).await.unwrap();
    assert!(publisher.is_connected());

    let marker = run_marker();
    let value = serde_json::json!({"id": 1, "marker": marker}).to_string();
    publisher.publish("1", &value).await.unwrap();

    let payloads = read_all(&config).await;
    assert!(payloads.iter().any(|p| p == &value));
}

#[tokio::test]
#[ignore]
async fn test_connect_is_idempotent_for_existing_topic() {
    let config = test_config();
    let first = IggyEventPublisher::connect_with(config.clone()).await.unwrap();
    let second = IggyEventPublisher::connect_with(config).await.unwrap();

    first.publish("2", "{\"id\":2}").await.unwrap();
    second.publish("2", "{\"id\":2}").await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_unreachable_server_times_out_or_fails() {
    let config = StreamConfig::new()
        .with_address("127.0.0.1:1")
        .with_timeout(Duration::from_millis(500));
    let publisher = IggyEventPublisher::new(config).unwrap();

    let err = publisher.connect().await.unwrap_err();
    assert!(matches!(err, PublishError::Stream(_) | PublishError::Timeout(_)));
    assert!(!publisher.is_connected());
}

/// Unique-enough marker for one test run
fn run_marker() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

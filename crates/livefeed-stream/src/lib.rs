// Event stream layer with Iggy
//
// This crate provides the production implementation of the core EventPublisher trait:
// - IggyEventPublisher: key-partitioned sends to a provisioned stream/topic

pub mod config;
pub mod publisher;

pub use config::StreamConfig;
pub use publisher::IggyEventPublisher;

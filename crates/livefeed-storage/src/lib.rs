// Postgres storage layer with sqlx
//
// This crate provides the database implementation of the core EventStore trait:
// - PgEventStore: append-only `events` table with per-subject recency queries

pub mod config;
pub mod event_store;
pub mod models;

pub use config::StoreConfig;
pub use event_store::PgEventStore;
pub use models::EventRow;

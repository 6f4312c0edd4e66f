// In-process cache layer with moka
//
// This crate provides the production implementation of the core FeedCache trait:
// - MokaFeedCache: bounded cache where every entry carries its own TTL

pub mod config;
pub mod moka_cache;

pub use config::CacheConfig;
pub use moka_cache::MokaFeedCache;

//! Cache Module
//!
//! Storage backends for the caching layer: a bounded in-process store with
//! TTL expiration and oldest-entry eviction, and a Redis client for caches
//! shared across instances. Both implement [`CacheBackend`].

pub mod backend;
pub mod entry;
mod glob;
pub mod local;
mod order;
pub mod redis;
mod stats;
mod table;


// Re-export public types
pub use backend::{BackendHealth, CacheBackend};
pub use entry::CacheEntry;
pub use glob::GlobPattern;
pub use local::LocalStore;
pub use order::OrderIndex;
pub use self::redis::RedisStore;
pub use stats::{BackendStats, CacheCounters};
pub use table::LocalTable;

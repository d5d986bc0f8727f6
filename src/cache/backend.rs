//! Backend contract shared by the local and distributed stores.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::cache::BackendStats;

/// Storage backend used by the cache façade.
///
/// Every method is non-throwing: implementations log their own failures and
/// degrade to a miss (`get`), a no-op (`set`, `delete`) or zero removals
/// (`invalidate_pattern`).
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Returns the serialized value for `key`, or `None` on miss or failure.
    async fn get(&self, key: &str) -> Option<String>;

    /// Stores a serialized value for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration);

    async fn delete(&self, key: &str);

    /// Removes every key matching the `*` glob. Returns the number removed.
    async fn invalidate_pattern(&self, pattern: &str) -> u64;

    async fn health_check(&self) -> BackendHealth;

    async fn stats(&self) -> BackendStats;

    /// Releases background work and connections. Safe to call twice.
    async fn shutdown(&self);
}

/// Health of a single backend.
#[derive(Debug, Clone, Serialize)]
pub struct BackendHealth {
    pub backend: &'static str,
    pub connected: bool,
    /// Round-trip latency of the health check
    pub latency_ms: Option<f64>,
    pub error: Option<String>,
}

impl BackendHealth {
    pub fn up(backend: &'static str, latency: Duration) -> Self {
        Self {
            backend,
            connected: true,
            latency_ms: Some(latency.as_secs_f64() * 1000.0),
            error: None,
        }
    }

    pub fn down(backend: &'static str, error: impl Into<String>) -> Self {
        Self {
            backend,
            connected: false,
            latency_ms: None,
            error: Some(error.into()),
        }
    }
}

/// Truncates a TTL to whole seconds, the resolution both backends store.
///
/// Truncation never extends freshness. A result of zero means the value would
/// be stale on arrival, and backends skip storing it.
pub fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs()
}

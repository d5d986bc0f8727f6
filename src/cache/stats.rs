//! Cache Statistics Module
//!
//! Tracks per-backend counters and the snapshot reported by `stats()`.

use serde::Serialize;

// == Cache Counters ==
/// Running counters kept by a backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheCounters {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent, expired or unreachable)
    pub misses: u64,
    /// Number of entries evicted to respect capacity
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }
}

// == Backend Stats ==
/// Point-in-time statistics for one backend.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStats {
    /// Backend name ("local" or "redis")
    pub backend: &'static str,
    /// Number of entries this cache holds, when the backend can count them
    pub size: Option<usize>,
    /// Keys in the whole Redis database, shared with other tenants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_size: Option<u64>,
    /// Capacity bound, when the backend has one
    pub capacity: Option<usize>,
    /// Resident keys (local backend only)
    pub keys: Vec<String>,
    /// Whether the backend is currently reachable
    pub connected: bool,
    #[serde(flatten)]
    pub counters: CacheCounters,
    /// Hit rate derived from the counters
    pub hit_rate: f64,
}

impl BackendStats {
    pub fn new(backend: &'static str, counters: CacheCounters) -> Self {
        let hit_rate = counters.hit_rate();
        Self {
            backend,
            size: None,
            database_size: None,
            capacity: None,
            keys: Vec::new(),
            connected: true,
            counters,
            hit_rate,
        }
    }
}

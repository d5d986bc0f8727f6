//! Cache Entry Module
//!
//! Defines the structure for individual local cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// Represents a single cache entry with value and freshness metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value, already serialized
    pub value: String,
    /// Storage timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Freshness window in seconds
    pub ttl_seconds: u64,
    /// Insertion sequence, breaks ties between entries stored in the same millisecond
    pub seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a cache entry stored at `stored_at` (Unix milliseconds).
    pub fn stored_at(value: String, ttl_seconds: u64, seq: u64, stored_at: u64) -> Self {
        Self {
            value,
            stored_at,
            ttl_seconds,
            seq,
        }
    }

    // == Expiry ==
    /// Unix millisecond instant from which the entry is stale.
    pub fn expires_at(&self) -> u64 {
        self.stored_at
            .saturating_add(self.ttl_seconds.saturating_mul(1000))
    }

    /// Checks expiry against a given clock reading.
    ///
    /// The boundary instant counts as expired: once the full TTL has elapsed
    /// the entry is never returned again.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at()
    }

    /// Ordering key by age: smallest is oldest.
    pub fn age_key(&self) -> (u64, u64) {
        (self.stored_at, self.seq)
    }

    /// Ordering key by expiry: smallest expires first.
    pub fn expiry_key(&self) -> (u64, u64) {
        (self.expires_at(), self.seq)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let now = current_timestamp_ms();
        let entry = CacheEntry::stored_at("\"value\"".to_string(), 60, 1, now);

        assert_eq!(entry.value, "\"value\"");
        assert_eq!(entry.ttl_seconds, 60);
        assert_eq!(entry.expires_at(), now + 60_000);
        assert!(!entry.is_expired_at(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::stored_at("v".to_string(), 10, 1, 5_000);

        assert!(!entry.is_expired_at(14_999));
        assert!(entry.is_expired_at(15_000), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(15_001));
    }

    #[test]
    fn test_zero_ttl_is_immediately_stale() {
        let entry = CacheEntry::stored_at("v".to_string(), 0, 1, 5_000);
        assert!(entry.is_expired_at(5_000));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::stored_at("v".to_string(), u64::MAX, 1, 5_000);
        assert_eq!(entry.expires_at(), u64::MAX);
    }

    #[test]
    fn test_ordering_keys() {
        let a = CacheEntry::stored_at("a".to_string(), 100, 1, 1_000);
        let b = CacheEntry::stored_at("b".to_string(), 1, 2, 1_000);

        assert!(a.age_key() < b.age_key(), "Same millisecond ties break on seq");
        assert!(b.expiry_key() < a.expiry_key(), "Shorter TTL expires first");
    }
}

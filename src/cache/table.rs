//! Local Table Module
//!
//! Single-threaded cache engine combining HashMap storage with two ordered
//! indexes: one by storage time for capacity eviction, one by expiry time for
//! the background sweep. Callers wrap it in a lock (see `LocalStore`).

use std::collections::HashMap;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{BackendStats, CacheCounters, CacheEntry, GlobPattern, OrderIndex};

// == Local Table ==
/// Bounded key/value table with per-entry TTL and oldest-entry eviction.
#[derive(Debug)]
pub struct LocalTable {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Keys ordered by storage time
    by_age: OrderIndex,
    /// Keys ordered by expiry time
    by_expiry: OrderIndex,
    /// Running counters
    counters: CacheCounters,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Next insertion sequence number
    next_seq: u64,
}

impl LocalTable {
    // == Constructor ==
    /// Creates a new table holding at most `max_entries` entries (at least one).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            by_age: OrderIndex::new(),
            by_expiry: OrderIndex::new(),
            counters: CacheCounters::new(),
            max_entries: max_entries.max(1),
            next_seq: 0,
        }
    }

    // == Set ==
    /// Stores a value with a TTL in seconds.
    ///
    /// Overwriting an existing key resets its storage time. If the table is at
    /// capacity and the key is new, the entry with the smallest storage time
    /// is evicted first.
    pub fn set(&mut self, key: String, value: String, ttl_seconds: u64) {
        self.set_at(key, value, ttl_seconds, current_timestamp_ms());
    }

    /// Stores a value as if written at `now_ms`.
    pub fn set_at(&mut self, key: String, value: String, ttl_seconds: u64, now_ms: u64) {
        if self.entries.contains_key(&key) {
            self.remove_entry(&key);
        } else if self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }

        self.next_seq += 1;
        let entry = CacheEntry::stored_at(value, ttl_seconds, self.next_seq, now_ms);
        self.by_age.insert(entry.age_key(), &key);
        self.by_expiry.insert(entry.expiry_key(), &key);
        self.entries.insert(key, entry);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<String> {
        self.get_at(key, current_timestamp_ms())
    }

    /// Retrieves a value as observed at `now_ms`.
    pub fn get_at(&mut self, key: &str, now_ms: u64) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_expired_at(now_ms) => true,
            Some(entry) => {
                let value = entry.value.clone();
                self.counters.record_hit();
                return Some(value);
            }
            None => false,
        };

        if expired {
            self.remove_entry(key);
            self.counters.record_expirations(1);
        }
        self.counters.record_miss();
        None
    }

    // == Delete ==
    /// Removes an entry by key. Returns true if it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Invalidate Pattern ==
    /// Removes every key matching `pattern`. Returns the number removed.
    pub fn invalidate_pattern(&mut self, pattern: &GlobPattern) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        for key in &matching {
            self.remove_entry(key);
        }
        matching.len()
    }

    // == Sweep Expired ==
    /// Removes up to `limit` expired entries, soonest-expiring first.
    ///
    /// Returns the number of entries removed. A result equal to `limit` means
    /// more expired entries may remain.
    pub fn sweep_expired(&mut self, now_ms: u64, limit: usize) -> usize {
        let mut removed = 0;

        while removed < limit {
            let due = match self.by_expiry.peek_first() {
                Some((&(expires_at, _), key)) if expires_at <= now_ms => key.clone(),
                _ => break,
            };
            self.remove_entry(&due);
            removed += 1;
        }

        self.counters.record_expirations(removed);
        removed
    }

    // == Stats ==
    /// Returns a statistics snapshot including resident keys.
    pub fn stats(&self) -> BackendStats {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();

        let mut stats = BackendStats::new("local", self.counters.clone());
        stats.size = Some(self.entries.len());
        stats.capacity = Some(self.max_entries);
        stats.keys = keys;
        stats
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Returns the current number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.by_age.pop_first() {
            if let Some(entry) = self.entries.remove(&key) {
                self.by_expiry.remove(entry.expiry_key());
                self.counters.record_eviction();
            }
        }
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.by_age.remove(entry.age_key());
        self.by_expiry.remove(entry.expiry_key());
        Some(entry)
    }
}

//! Ordered Key Index Module
//!
//! Secondary index over local entries, keyed by an `(instant, seq)` pair.
//! The local table keeps one index by storage time for capacity eviction and
//! one by expiry time for the background sweep.

use std::collections::BTreeMap;

// == Order Index ==
/// Keeps keys sorted by `(instant, seq)`.
///
/// - Front = smallest instant (oldest / soonest to expire)
/// - Back = largest instant
#[derive(Debug, Default)]
pub struct OrderIndex {
    order: BTreeMap<(u64, u64), String>,
}

impl OrderIndex {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
        }
    }

    // == Insert ==
    /// Records `key` at position `at`.
    pub fn insert(&mut self, at: (u64, u64), key: &str) {
        self.order.insert(at, key.to_string());
    }

    // == Remove ==
    /// Removes the key recorded at position `at`.
    pub fn remove(&mut self, at: (u64, u64)) -> Option<String> {
        self.order.remove(&at)
    }

    // == Pop First ==
    /// Returns and removes the front key.
    pub fn pop_first(&mut self) -> Option<((u64, u64), String)> {
        self.order.pop_first()
    }

    // == Peek First ==
    /// Returns the front position and key without removing it.
    pub fn peek_first(&self) -> Option<(&(u64, u64), &String)> {
        self.order.first_key_value()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_new() {
        let index = OrderIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_pop_first_returns_smallest_instant() {
        let mut index = OrderIndex::new();

        index.insert((300, 1), "c");
        index.insert((100, 2), "a");
        index.insert((200, 3), "b");

        assert_eq!(index.pop_first().map(|(_, k)| k), Some("a".to_string()));
        assert_eq!(index.pop_first().map(|(_, k)| k), Some("b".to_string()));
        assert_eq!(index.pop_first().map(|(_, k)| k), Some("c".to_string()));
        assert_eq!(index.pop_first(), None);
    }

    #[test]
    fn test_seq_breaks_ties() {
        let mut index = OrderIndex::new();

        index.insert((100, 7), "later");
        index.insert((100, 3), "earlier");

        assert_eq!(index.peek_first().map(|(_, k)| k.as_str()), Some("earlier"));
    }

    #[test]
    fn test_remove() {
        let mut index = OrderIndex::new();

        index.insert((1, 1), "key1");
        index.insert((2, 2), "key2");

        assert_eq!(index.remove((1, 1)), Some("key1".to_string()));
        assert_eq!(index.remove((1, 1)), None);
        assert_eq!(index.len(), 1);
    }
}

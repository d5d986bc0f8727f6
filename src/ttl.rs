//! TTL Policy Table
//!
//! Freshness windows per resource class. The table is built once at startup
//! and never mutated afterwards, so lookups need no synchronization.

use std::collections::HashMap;
use std::time::Duration;

/// Freshness tiers in seconds.
pub struct TtlTier;

impl TtlTier {
    /// Frequently changing content
    pub const SHORT: u64 = 5 * 60; // 5 min
    /// Semi-static content
    pub const MEDIUM: u64 = 60 * 60; // 1 hr
    /// Near-static content
    pub const LONG: u64 = 24 * 60 * 60; // 24 hr
}

const BUILT_IN: &[(&str, u64)] = &[
    // Changes many times a day
    ("events", TtlTier::SHORT),
    ("promotions", TtlTier::SHORT),
    ("notifications", TtlTier::SHORT),
    ("search", TtlTier::SHORT),
    // Edited occasionally
    ("shops", TtlTier::MEDIUM),
    ("categories", TtlTier::MEDIUM),
    ("articles", TtlTier::MEDIUM),
    ("media", TtlTier::MEDIUM),
    // Rarely edited
    ("pages", TtlTier::LONG),
    ("settings", TtlTier::LONG),
    ("navigation", TtlTier::LONG),
    ("footer", TtlTier::LONG),
];

/// Mapping from resource class to freshness window, with a default.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    classes: HashMap<String, u64>,
    default_seconds: u64,
}

impl TtlPolicy {
    /// Built-in table with `default_seconds` for unlisted classes.
    pub fn new(default_seconds: u64) -> Self {
        Self {
            classes: BUILT_IN
                .iter()
                .map(|(class, secs)| (class.to_string(), *secs))
                .collect(),
            default_seconds,
        }
    }

    /// Sets the window for `class`. Only available while building the policy.
    pub fn with_override(mut self, class: impl Into<String>, seconds: u64) -> Self {
        self.classes.insert(class.into(), seconds);
        self
    }

    pub fn seconds_for(&self, class: &str) -> u64 {
        self.classes
            .get(class)
            .copied()
            .unwrap_or(self.default_seconds)
    }

    pub fn ttl_for(&self, class: &str) -> Duration {
        Duration::from_secs(self.seconds_for(class))
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_seconds)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(TtlTier::MEDIUM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_are_ordered() {
        assert!(TtlTier::SHORT < TtlTier::MEDIUM);
        assert!(TtlTier::MEDIUM < TtlTier::LONG);
    }

    #[test]
    fn test_listed_classes() {
        let policy = TtlPolicy::new(3600);

        assert_eq!(policy.seconds_for("events"), TtlTier::SHORT);
        assert_eq!(policy.seconds_for("shops"), TtlTier::MEDIUM);
        assert_eq!(policy.ttl_for("pages"), Duration::from_secs(TtlTier::LONG));
    }

    #[test]
    fn test_unlisted_class_uses_default() {
        let policy = TtlPolicy::new(120);

        assert_eq!(policy.seconds_for("unknown"), 120);
        assert_eq!(policy.default_ttl(), Duration::from_secs(120));
    }

    #[test]
    fn test_override() {
        let policy = TtlPolicy::new(3600)
            .with_override("events", 30)
            .with_override("tickets", 10);

        assert_eq!(policy.seconds_for("events"), 30);
        assert_eq!(policy.seconds_for("tickets"), 10);
    }

    #[test]
    fn test_policy_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TtlPolicy>();
    }
}

//! Bounded Local Store
//!
//! Process-local backend: a `LocalTable` behind a single coarse lock plus an
//! optional background sweep. All operations are pure memory access and never
//! fail.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::backend::{ttl_seconds, BackendHealth, CacheBackend};
use crate::cache::{BackendStats, GlobPattern, LocalTable};
use crate::tasks::spawn_sweep_task;

// == Local Store ==
/// Shared handle to the in-process table. Cloning shares the same table.
#[derive(Clone)]
pub struct LocalStore {
    table: Arc<Mutex<LocalTable>>,
    sweep: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl LocalStore {
    /// Creates a store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            table: Arc::new(Mutex::new(LocalTable::new(max_entries))),
            sweep: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts the background expiry sweep, replacing any running one.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_sweep(&self, interval: Duration, batch_size: usize) {
        let handle = spawn_sweep_task(self.table.clone(), interval, batch_size);
        if let Some(previous) = self.sweep.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Returns true while a sweep task is running.
    pub fn sweep_running(&self) -> bool {
        self.sweep
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Cancels the background sweep, if any.
    pub fn stop_sweep(&self) {
        if let Some(handle) = self.sweep.lock().take() {
            handle.abort();
            debug!("local sweep cancelled");
        }
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        self.table.lock().get(key)
    }

    pub fn set_value(&self, key: &str, value: &str, ttl: Duration) {
        let secs = ttl_seconds(ttl);
        if secs == 0 {
            // A value stale on arrival still supersedes the previous one
            debug!(key = %key, "sub-second ttl, removing key locally");
            self.table.lock().delete(key);
            return;
        }
        self.table
            .lock()
            .set(key.to_string(), value.to_string(), secs);
    }

    pub fn delete_value(&self, key: &str) -> bool {
        self.table.lock().delete(key)
    }

    /// Removes every key matching the glob. Returns the number removed.
    pub fn invalidate_matching(&self, pattern: &str) -> usize {
        match GlobPattern::compile(pattern) {
            Ok(glob) => self.table.lock().invalidate_pattern(&glob),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "local invalidation skipped");
                0
            }
        }
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    pub fn snapshot(&self) -> BackendStats {
        self.table.lock().stats()
    }
}

#[async_trait]
impl CacheBackend for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.get_value(key)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        self.set_value(key, value, ttl);
    }

    async fn delete(&self, key: &str) {
        self.delete_value(key);
    }

    async fn invalidate_pattern(&self, pattern: &str) -> u64 {
        self.invalidate_matching(pattern) as u64
    }

    async fn health_check(&self) -> BackendHealth {
        let started = Instant::now();
        let _ = self.table.lock().len();
        BackendHealth::up("local", started.elapsed())
    }

    async fn stats(&self) -> BackendStats {
        self.snapshot()
    }

    async fn shutdown(&self) {
        self.stop_sweep();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backend_roundtrip() {
        let store = LocalStore::new(10);

        store
            .set("doc:events:1", "{\"id\":1}", Duration::from_secs(60))
            .await;

        assert_eq!(
            store.get("doc:events:1").await,
            Some("{\"id\":1}".to_string())
        );

        store.delete("doc:events:1").await;
        assert_eq!(store.get("doc:events:1").await, None);
    }

    #[tokio::test]
    async fn test_sub_second_ttl_is_not_stored() {
        let store = LocalStore::new(10);

        store.set("k", "v", Duration::from_millis(500)).await;

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sub_second_ttl_removes_superseded_value() {
        let store = LocalStore::new(10);

        store.set("doc:events:1", "v1", Duration::from_secs(60)).await;
        store.set("doc:events:1", "v2", Duration::from_millis(500)).await;

        assert_eq!(store.get("doc:events:1").await, None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_table() {
        let store = LocalStore::new(10);
        let other = store.clone();

        store.set("k", "v", Duration::from_secs(60)).await;

        assert_eq!(other.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_invalidate_pattern_counts() {
        let store = LocalStore::new(10);
        let ttl = Duration::from_secs(60);

        store.set("doc:events:1", "1", ttl).await;
        store.set("list:events:all", "[]", ttl).await;
        store.set("doc:shops:1", "1", ttl).await;

        assert_eq!(store.invalidate_pattern("*:events:*").await, 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_health_is_always_up() {
        let store = LocalStore::new(10);
        let health = store.health_check().await;

        assert_eq!(health.backend, "local");
        assert!(health.connected);
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweep() {
        let store = LocalStore::new(10);
        store.start_sweep(Duration::from_secs(60), 100);
        assert!(store.sweep_running());

        store.shutdown().await;
        assert!(!store.sweep_running());

        store.shutdown().await;
    }
}

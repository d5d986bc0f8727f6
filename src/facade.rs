//! Cache Façade
//!
//! The single entry point for request handlers and lifecycle hooks. It owns
//! the backends chosen by the strategy selector and hides their failures:
//! no public method here fails because of a backend. The only error that ever
//! reaches a caller is the one returned by the `fetch` closure given to
//! [`CacheFacade::wrap`].
//!
//! ## Lookup order
//!
//! ```text
//! get(key) → primary → fallback (hybrid only) → miss
//! set(key) → primary + fallback
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{BackendHealth, BackendStats, CacheBackend, LocalStore, RedisStore};
use crate::config::Config;
use crate::error::CacheResult;
use crate::keys;
use crate::strategy::{self, CacheMode};
use crate::ttl::TtlPolicy;

// == Cache Façade ==
/// Process-wide cache handle. Construct once at startup and share as
/// `Arc<CacheFacade>`; call [`CacheFacade::shutdown`] before exit.
pub struct CacheFacade {
    mode: CacheMode,
    primary: Arc<dyn CacheBackend>,
    fallback: Option<Arc<dyn CacheBackend>>,
    ttl: TtlPolicy,
    shut_down: AtomicBool,
}

impl CacheFacade {
    // == Constructors ==
    /// Builds the façade for the deployment described by `config`.
    ///
    /// Connects to Redis eagerly when the selected mode uses it; an
    /// unreachable server is logged and the client stays in lazy-reconnect
    /// mode. Starts the local sweep when the local store is in use. Must run
    /// inside a Tokio runtime.
    pub async fn from_config(config: &Config) -> Self {
        let mode = strategy::select_for(config);
        let ttl = TtlPolicy::new(config.default_ttl);

        let local = mode.uses_local().then(|| {
            let store = LocalStore::new(config.max_entries);
            store.start_sweep(
                Duration::from_secs(config.cleanup_interval.max(1)),
                config.sweep_batch_size,
            );
            Arc::new(store) as Arc<dyn CacheBackend>
        });

        let redis = if mode.uses_redis() {
            let store = RedisStore::new(config.redis.clone());
            if let Err(e) = store.connect().await {
                debug!(error = %e, "starting with Redis disconnected, will reconnect lazily");
            }
            Some(Arc::new(store) as Arc<dyn CacheBackend>)
        } else {
            None
        };

        match (redis, local) {
            (Some(redis), local) => Self::new(mode, redis, local, ttl),
            (None, Some(local)) => Self::new(mode, local, None, ttl),
            (None, None) => {
                // Unreachable with the current decision table; keep a local store
                Self::new(CacheMode::LocalOnly, Arc::new(LocalStore::new(config.max_entries)), None, ttl)
            }
        }
    }

    /// Assembles a façade from explicit backends.
    pub fn new(
        mode: CacheMode,
        primary: Arc<dyn CacheBackend>,
        fallback: Option<Arc<dyn CacheBackend>>,
        ttl: TtlPolicy,
    ) -> Self {
        info!(
            mode = %mode,
            primary = primary.name(),
            fallback = fallback.as_ref().map(|b| b.name()).unwrap_or("none"),
            "cache facade initialized"
        );
        Self {
            mode,
            primary,
            fallback,
            ttl,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Local-only façade around `store`.
    pub fn local(store: LocalStore, ttl: TtlPolicy) -> Self {
        Self::new(CacheMode::LocalOnly, Arc::new(store), None, ttl)
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    // == Reads ==
    /// Returns the cached value for `key`, decoded as `T`.
    ///
    /// Misses, backend failures and undecodable values all yield `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).await?;
        match decode(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "cached value could not be decoded, treating as miss");
                None
            }
        }
    }

    /// Returns the serialized value for `key`.
    pub async fn get_raw(&self, key: &str) -> Option<String> {
        if let Some(value) = self.primary.get(key).await {
            debug!(key = %key, backend = self.primary.name(), "cache hit");
            return Some(value);
        }

        if let Some(fallback) = &self.fallback {
            if let Some(value) = fallback.get(key).await {
                debug!(key = %key, backend = fallback.name(), "cache hit (fallback)");
                return Some(value);
            }
        }

        debug!(key = %key, "cache miss");
        None
    }

    // == Writes ==
    /// Stores `value` under `key` for `ttl` in every active backend.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match encode(value) {
            Ok(raw) => self.set_raw(key, &raw, ttl).await,
            Err(e) => warn!(key = %key, error = %e, "value could not be encoded, not cached"),
        }
    }

    /// Stores an already serialized value.
    pub async fn set_raw(&self, key: &str, raw: &str, ttl: Duration) {
        match &self.fallback {
            Some(fallback) => {
                tokio::join!(
                    self.primary.set(key, raw, ttl),
                    fallback.set(key, raw, ttl)
                );
            }
            None => self.primary.set(key, raw, ttl).await,
        }
    }

    // == Compute If Absent ==
    /// Returns the cached value for `key`, or runs `fetch`, caches its result
    /// for `ttl` and returns it.
    ///
    /// An error from `fetch` is returned unchanged and nothing is cached.
    /// Concurrent misses on the same key may each run `fetch`.
    pub async fn wrap<T, E, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let value = fetch().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }

    /// [`CacheFacade::wrap`] with the TTL policy's window for `class`.
    pub async fn wrap_class<T, E, F, Fut>(&self, class: &str, key: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let ttl = self.ttl.ttl_for(class);
        self.wrap(key, ttl, fetch).await
    }

    // == Invalidation ==
    /// Removes `key` from every active backend.
    pub async fn delete(&self, key: &str) {
        match &self.fallback {
            Some(fallback) => {
                tokio::join!(self.primary.delete(key), fallback.delete(key));
            }
            None => self.primary.delete(key).await,
        }
    }

    /// Removes every key matching the `*` glob. Returns the number removed
    /// across backends.
    pub async fn invalidate_pattern(&self, pattern: &str) -> u64 {
        let mut removed = self.primary.invalidate_pattern(pattern).await;
        if let Some(fallback) = &self.fallback {
            removed += fallback.invalidate_pattern(pattern).await;
        }
        debug!(pattern = %pattern, removed, "pattern invalidated");
        removed
    }

    /// Removes every key of a resource class, in every namespace.
    pub async fn invalidate_collection(&self, class: &str) -> u64 {
        let removed = self.invalidate_all(&keys::collection_patterns(class)).await;
        info!(class = %class, removed, "collection invalidated");
        removed
    }

    /// Removes one document (every locale) plus the class's cached queries,
    /// since a single change can alter any list result.
    pub async fn invalidate_document(&self, class: &str, id: &str) -> u64 {
        let mut patterns = keys::document_patterns(class, id);
        patterns.push(keys::list_pattern(class));
        let removed = self.invalidate_all(&patterns).await;
        info!(class = %class, id = %id, removed, "document invalidated");
        removed
    }

    /// Removes one slug-keyed document (every locale).
    pub async fn invalidate_slug(&self, class: &str, slug: &str) -> u64 {
        self.invalidate_all(&keys::slug_patterns(class, slug)).await
    }

    /// Removes one global (every locale).
    pub async fn invalidate_global(&self, name: &str) -> u64 {
        let removed = self.invalidate_all(&keys::global_patterns(name)).await;
        info!(name = %name, removed, "global invalidated");
        removed
    }

    async fn invalidate_all(&self, patterns: &[String]) -> u64 {
        let mut removed = 0;
        for pattern in patterns {
            removed += self.invalidate_pattern(pattern).await;
        }
        removed
    }

    // == Introspection ==
    /// Aggregated health of the active backends.
    pub async fn health_check(&self) -> HealthReport {
        let primary = self.primary.health_check().await;
        let fallback = match &self.fallback {
            Some(fallback) => Some(fallback.health_check().await),
            None => None,
        };
        HealthReport::new(self.mode, primary, fallback)
    }

    /// Statistics for each active backend, primary first.
    pub async fn stats(&self) -> Vec<BackendStats> {
        let mut stats = vec![self.primary.stats().await];
        if let Some(fallback) = &self.fallback {
            stats.push(fallback.stats().await);
        }
        stats
    }

    // == Shutdown ==
    /// Cancels background work and closes connections. Idempotent.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.primary.shutdown().await;
        if let Some(fallback) = &self.fallback {
            fallback.shutdown().await;
        }
        info!("cache facade shut down");
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned>(raw: &str) -> CacheResult<T> {
    Ok(serde_json::from_str(raw)?)
}

// == Health Report ==
/// Overall cache condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Primary backend reachable
    Healthy,
    /// Primary down, fallback serving
    Degraded,
    /// No backend reachable; every read goes to the source
    Unhealthy,
}

/// Health of the façade and its backends.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub mode: CacheMode,
    pub primary: BackendHealth,
    pub fallback: Option<BackendHealth>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn new(mode: CacheMode, primary: BackendHealth, fallback: Option<BackendHealth>) -> Self {
        let status = match (&primary, &fallback) {
            (p, _) if p.connected => HealthStatus::Healthy,
            (_, Some(f)) if f.connected => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        };
        Self {
            status,
            mode,
            primary,
            fallback,
            checked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    use crate::config::RedisSettings;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Event {
        id: u32,
        title: String,
    }

    fn event(id: u32) -> Event {
        Event {
            id,
            title: format!("Event {}", id),
        }
    }

    fn local_facade() -> CacheFacade {
        CacheFacade::local(LocalStore::new(100), TtlPolicy::new(3600))
    }

    fn unreachable_redis() -> RedisStore {
        RedisStore::new(RedisSettings {
            url: Some("redis://127.0.0.1:1/".to_string()),
            connect_timeout: Duration::from_millis(200),
            command_timeout: Duration::from_millis(200),
            max_retries: 0,
            reconnect_cooldown: Duration::from_secs(60),
            ..RedisSettings::default()
        })
    }

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_set_and_get_typed() {
        let cache = local_facade();

        cache.set("doc:events:1", &event(1), TTL).await;

        assert_eq!(cache.get::<Event>("doc:events:1").await, Some(event(1)));
        assert_eq!(cache.get::<Event>("doc:events:2").await, None);
    }

    #[tokio::test]
    async fn test_undecodable_value_is_a_miss() {
        let cache = local_facade();

        cache.set("doc:events:1", &"not an event", TTL).await;

        assert_eq!(cache.get::<Event>("doc:events:1").await, None);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = local_facade();

        cache
            .set("doc:events:1", &event(1), Duration::from_secs(1))
            .await;
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(cache.get::<Event>("doc:events:1").await, None);
    }

    #[tokio::test]
    async fn test_wrap_fetches_once_within_ttl() {
        let cache = local_facade();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Result<Event, String> = cache
                .wrap("doc:events:7", TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(event(7))
                })
                .await;
            assert_eq!(value, Ok(event(7)));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrap_propagates_fetch_error_and_caches_nothing() {
        let cache = local_facade();

        let result: Result<Event, String> = cache
            .wrap("doc:events:9", TTL, || async { Err("db down".to_string()) })
            .await;

        assert_eq!(result, Err("db down".to_string()));
        assert_eq!(cache.get_raw("doc:events:9").await, None);
    }

    #[tokio::test]
    async fn test_wrap_class_uses_policy_ttl() {
        let policy = TtlPolicy::new(3600).with_override("flash", 0);
        let cache = CacheFacade::local(LocalStore::new(10), policy);

        let _: Result<u32, ()> = cache.wrap_class("flash", "doc:flash:1", || async { Ok(1) }).await;

        // Zero-second policy means the value is never stored
        assert_eq!(cache.get_raw("doc:flash:1").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_document_cascades_to_lists() {
        let cache = local_facade();
        let list = keys::list_key("events", &json!({"page": 1}));

        cache.set(&list, &vec![event(42)], TTL).await;
        cache.set("doc:events:42", &event(42), TTL).await;
        cache.set("doc:events:42:fr", &event(42), TTL).await;
        cache.set("doc:events:420", &event(420), TTL).await;
        cache.set("doc:shops:42", &"shop", TTL).await;

        let removed = cache.invalidate_document("events", "42").await;

        assert_eq!(removed, 3);
        assert_eq!(cache.get_raw(&list).await, None);
        assert_eq!(cache.get_raw("doc:events:42").await, None);
        assert_eq!(cache.get_raw("doc:events:42:fr").await, None);
        assert!(cache.get_raw("doc:events:420").await.is_some());
        assert!(cache.get_raw("doc:shops:42").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_collection() {
        let cache = local_facade();

        cache.set("doc:events:1", &1, TTL).await;
        cache.set("doc:events:slug:fair", &1, TTL).await;
        cache.set(&keys::list_key("events", &json!({})), &1, TTL).await;
        cache.set("doc:shops:1", &1, TTL).await;

        assert_eq!(cache.invalidate_collection("events").await, 3);
        assert!(cache.get_raw("doc:shops:1").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_global() {
        let cache = local_facade();

        cache.set(&keys::global_key("footer", None), &1, TTL).await;
        cache.set(&keys::global_key("footer", Some("en")), &1, TTL).await;
        cache.set(&keys::global_key("header", None), &1, TTL).await;

        assert_eq!(cache.invalidate_global("footer").await, 2);
        assert!(cache.get_raw("global:header").await.is_some());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = local_facade();

        cache.set("doc:events:1", &1, TTL).await;
        cache.delete("doc:events:1").await;

        assert_eq!(cache.get_raw("doc:events:1").await, None);
    }

    #[tokio::test]
    async fn test_disconnected_distributed_primary_never_fails() {
        let cache = CacheFacade::new(
            CacheMode::DistributedOnly,
            Arc::new(unreachable_redis()),
            None,
            TtlPolicy::default(),
        );

        assert_eq!(cache.get::<Event>("doc:events:1").await, None);

        let value: Result<Event, String> = cache
            .wrap("doc:events:1", TTL, || async { Ok(event(1)) })
            .await;
        assert_eq!(value, Ok(event(1)));

        assert_eq!(cache.invalidate_document("events", "1").await, 0);

        let health = cache.health_check().await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_hybrid_serves_from_fallback_when_primary_down() {
        let local = LocalStore::new(100);
        let cache = CacheFacade::new(
            CacheMode::Hybrid,
            Arc::new(unreachable_redis()),
            Some(Arc::new(local.clone())),
            TtlPolicy::default(),
        );
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Result<Event, String> = cache
                .wrap("doc:events:5", TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(event(5))
                })
                .await;
            assert_eq!(value, Ok(event(5)));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(local.len(), 1);

        let health = cache.health_check().await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(cache.stats().await.len(), 2);
    }

    #[tokio::test]
    async fn test_from_config_local_only() {
        let cache = CacheFacade::from_config(&Config::default()).await;

        assert_eq!(cache.mode(), CacheMode::LocalOnly);
        let health = cache.health_check().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(health.fallback.is_none());

        cache.shutdown().await;
        cache.shutdown().await;
    }

    #[test]
    fn test_health_status_rules() {
        let up = || BackendHealth::up("local", Duration::ZERO);
        let down = || BackendHealth::down("redis", "refused");

        assert_eq!(
            HealthReport::new(CacheMode::LocalOnly, up(), None).status,
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthReport::new(CacheMode::Hybrid, down(), Some(up())).status,
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthReport::new(CacheMode::Hybrid, down(), Some(down())).status,
            HealthStatus::Unhealthy
        );
    }
}

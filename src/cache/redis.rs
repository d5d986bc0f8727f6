//! Distributed Store Client
//!
//! Redis-backed shared cache. Built on `ConnectionManager`, which multiplexes
//! one connection across concurrent callers and reconnects on its own after a
//! transport failure.
//!
//! ## Failure model
//!
//! The `try_*` methods surface every failure as a `CacheError`. The
//! `CacheBackend` impl wraps them and degrades: a failed `get` is a miss, a
//! failed `set`/`delete` is a no-op, a failed invalidation removes nothing.
//! Each command runs under `command_timeout`; connecting runs under
//! `connect_timeout`.
//!
//! ## Shutdown
//!
//! Every command holds a read guard on the connection slot while in flight.
//! `shutdown` takes the write guard, so it waits for those commands to finish
//! before dropping the connection.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, IntoConnectionInfo, RedisResult};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::cache::backend::{ttl_seconds, BackendHealth, CacheBackend};
use crate::cache::{BackendStats, CacheCounters, GlobPattern};
use crate::config::RedisSettings;
use crate::error::{CacheError, CacheResult};

/// Keys requested per SCAN round trip.
const SCAN_COUNT: usize = 500;

/// Keys deleted per DEL command.
const DELETE_CHUNK: usize = 500;

const MAX_CONNECT_BACKOFF: Duration = Duration::from_secs(5);

// == Redis Store ==
/// Client for the shared Redis cache.
pub struct RedisStore {
    client: Option<redis::Client>,
    slot: RwLock<Option<ConnectionManager>>,
    connected: AtomicBool,
    closed: AtomicBool,
    last_attempt: Mutex<Option<Instant>>,
    counters: Mutex<CacheCounters>,
    settings: RedisSettings,
}

impl RedisStore {
    // == Constructor ==
    /// Creates a disconnected client. Call [`RedisStore::connect`] to connect
    /// eagerly; otherwise the first command connects lazily.
    ///
    /// An unusable URL is logged and leaves the client permanently
    /// disconnected; it never fails construction.
    pub fn new(settings: RedisSettings) -> Self {
        let client = match build_client(&settings) {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "invalid Redis connection settings");
                None
            }
        };

        Self {
            client,
            slot: RwLock::new(None),
            connected: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            last_attempt: Mutex::new(None),
            counters: Mutex::new(CacheCounters::new()),
            settings,
        }
    }

    // == Connect ==
    /// Connects with up to `max_retries` retries and exponential backoff.
    pub async fn connect(&self) -> CacheResult<()> {
        let mut backoff = Duration::from_millis(100);
        let mut attempt = 0;

        loop {
            match self.connect_once().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.settings.max_retries => {
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "Redis connect failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_CONNECT_BACKOFF);
                    attempt += 1;
                }
                Err(e) => {
                    error!(error = %e, "Redis unavailable, continuing disconnected");
                    return Err(e);
                }
            }
        }
    }

    async fn connect_once(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Disconnected);
        }
        let client = self.client.clone().ok_or(CacheError::Disconnected)?;
        *self.last_attempt.lock() = Some(Instant::now());

        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(self.settings.max_retries)
            .set_connection_timeout(self.settings.connect_timeout)
            .set_response_timeout(self.settings.command_timeout);

        let manager = tokio::time::timeout(
            self.settings.connect_timeout,
            ConnectionManager::new_with_config(client, config),
        )
        .await
        .map_err(|_| CacheError::Timeout {
            operation: "CONNECT",
            millis: self.settings.connect_timeout.as_millis() as u64,
        })??;

        let mut slot = self.slot.write().await;
        if slot.is_none() {
            *slot = Some(manager);
        }
        self.connected.store(true, Ordering::Release);
        info!("Redis cache connected");
        Ok(())
    }

    /// Connects lazily when no connection exists, at most once per cooldown.
    async fn ensure_connected(&self) -> CacheResult<()> {
        if self.slot.read().await.is_some() {
            return Ok(());
        }

        let last_attempt = *self.last_attempt.lock();
        let due = last_attempt
            .map(|at| at.elapsed() >= self.settings.reconnect_cooldown)
            .unwrap_or(true);

        if due {
            self.connect_once().await
        } else {
            Err(CacheError::Disconnected)
        }
    }

    /// Runs one command under the slot read guard and the command timeout.
    async fn with_connection<T, F, Fut>(&self, operation: &'static str, command: F) -> CacheResult<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Disconnected);
        }
        self.ensure_connected().await?;

        let slot = self.slot.read().await;
        let conn = slot.as_ref().cloned().ok_or(CacheError::Disconnected)?;
        let outcome = tokio::time::timeout(self.settings.command_timeout, command(conn)).await;
        drop(slot);

        match outcome {
            Ok(Ok(value)) => {
                self.connected.store(true, Ordering::Release);
                Ok(value)
            }
            Ok(Err(e)) => {
                if e.is_io_error()
                    || e.is_connection_dropped()
                    || e.is_connection_refusal()
                    || e.is_timeout()
                {
                    self.connected.store(false, Ordering::Release);
                }
                Err(CacheError::Transport(e))
            }
            Err(_) => {
                self.connected.store(false, Ordering::Release);
                Err(CacheError::Timeout {
                    operation,
                    millis: self.settings.command_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Whether the last connection attempt or command succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Applies the configured namespace prefix.
    pub fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.settings.key_prefix, key)
    }

    // == Fallible Operations ==
    pub async fn try_get(&self, key: &str) -> CacheResult<Option<String>> {
        let key = self.prefixed(key);
        self.with_connection("GET", move |mut conn| async move {
            conn.get::<_, Option<String>>(key).await
        })
        .await
    }

    pub async fn try_set(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()> {
        let key = self.prefixed(key);
        let value = value.to_string();
        self.with_connection("SET", move |mut conn| async move {
            conn.set_ex::<_, _, ()>(key, value, ttl_secs).await
        })
        .await
    }

    pub async fn try_delete(&self, key: &str) -> CacheResult<()> {
        let key = self.prefixed(key);
        self.with_connection("DEL", move |mut conn| async move {
            conn.del::<_, ()>(key).await
        })
        .await
    }

    /// Enumerates keys matching the glob with SCAN, deleting each page as it
    /// arrives.
    ///
    /// Never issues KEYS, so large keyspaces are walked incrementally. A
    /// failure after some keys were removed keeps that progress and returns
    /// the partial count.
    pub async fn try_invalidate_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let glob = GlobPattern::compile(pattern)?;
        let matcher = glob.to_redis_match(&self.settings.key_prefix);
        let matcher = matcher.as_str();

        let removed = delete_scanned(
            move |cursor| self.scan_page(matcher, cursor),
            move |keys| self.delete_keys(keys),
        )
        .await?;

        debug!(pattern = %pattern, removed, "Redis pattern invalidated");
        Ok(removed)
    }

    async fn scan_page(&self, matcher: &str, cursor: u64) -> CacheResult<(u64, Vec<String>)> {
        let matcher = matcher.to_string();
        self.with_connection("SCAN", move |mut conn| async move {
            redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(matcher)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async::<(u64, Vec<String>)>(&mut conn)
                .await
        })
        .await
    }

    async fn delete_keys(&self, keys: Vec<String>) -> CacheResult<u64> {
        self.with_connection("DEL", move |mut conn| async move {
            conn.del::<_, u64>(keys).await
        })
        .await
    }

    /// Round-trip latency of a PING.
    pub async fn ping(&self) -> CacheResult<Duration> {
        let started = Instant::now();
        self.with_connection("PING", |mut conn| async move {
            redis::cmd("PING").query_async::<String>(&mut conn).await
        })
        .await?;
        Ok(started.elapsed())
    }

    /// Number of keys in the selected database, including keys outside the
    /// prefix.
    pub async fn db_size(&self) -> CacheResult<u64> {
        self.with_connection("DBSIZE", |mut conn| async move {
            redis::cmd("DBSIZE").query_async::<u64>(&mut conn).await
        })
        .await
    }

    fn record_hit(&self) {
        self.counters.lock().record_hit();
    }

    fn record_miss(&self) {
        self.counters.lock().record_miss();
    }
}

/// Walks SCAN pages from cursor 0 and deletes each page before fetching the
/// next. Returns the number of keys removed.
///
/// A failure before anything was removed is returned as is; a later failure
/// is logged and the partial count returned.
async fn delete_scanned<S, SF, D, DF>(mut scan: S, mut delete: D) -> CacheResult<u64>
where
    S: FnMut(u64) -> SF,
    SF: Future<Output = CacheResult<(u64, Vec<String>)>>,
    D: FnMut(Vec<String>) -> DF,
    DF: Future<Output = CacheResult<u64>>,
{
    let mut removed = 0;
    let mut cursor = 0;

    loop {
        let (next, batch) = match scan(cursor).await {
            Ok(page) => page,
            Err(e) => return keep_partial(removed, e),
        };

        for chunk in batch.chunks(DELETE_CHUNK) {
            match delete(chunk.to_vec()).await {
                Ok(deleted) => removed += deleted,
                Err(e) => return keep_partial(removed, e),
            }
        }

        cursor = next;
        if cursor == 0 {
            return Ok(removed);
        }
    }
}

fn keep_partial(removed: u64, error: CacheError) -> CacheResult<u64> {
    if removed == 0 {
        return Err(error);
    }
    warn!(removed, error = %error, "Redis invalidation interrupted, keeping partial progress");
    Ok(removed)
}

/// Transport failures are expected while Redis is down; anything else is a
/// caller or data problem.
fn report_failure(operation: &'static str, key: &str, error: &CacheError) {
    if error.is_transport() {
        warn!(operation = operation, key = %key, error = %error, "Redis command failed, degrading");
    } else {
        error!(operation = operation, key = %key, error = %error, "Redis command rejected");
    }
}

fn build_client(settings: &RedisSettings) -> CacheResult<Option<redis::Client>> {
    let Some(url) = settings.url.as_deref() else {
        return Ok(None);
    };

    let mut info = url.into_connection_info()?;
    if let Some(password) = &settings.password {
        info.redis.password = Some(password.clone());
    }

    Ok(Some(redis::Client::open(info)?))
}

#[async_trait]
impl CacheBackend for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Option<String> {
        match self.try_get(key).await {
            Ok(Some(value)) => {
                debug!(key = %key, "cache hit (redis)");
                self.record_hit();
                Some(value)
            }
            Ok(None) => {
                self.record_miss();
                None
            }
            Err(e) => {
                report_failure("GET", key, &e);
                self.record_miss();
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let secs = ttl_seconds(ttl);
        if secs == 0 {
            // A value stale on arrival still supersedes the previous one
            debug!(key = %key, "sub-second ttl, removing key from Redis");
            self.delete(key).await;
            return;
        }
        if let Err(e) = self.try_set(key, value, secs).await {
            report_failure("SET", key, &e);
        }
    }

    async fn delete(&self, key: &str) {
        if let Err(e) = self.try_delete(key).await {
            report_failure("DEL", key, &e);
        }
    }

    async fn invalidate_pattern(&self, pattern: &str) -> u64 {
        match self.try_invalidate_pattern(pattern).await {
            Ok(removed) => removed,
            Err(e) => {
                report_failure("SCAN", pattern, &e);
                0
            }
        }
    }

    async fn health_check(&self) -> BackendHealth {
        match self.ping().await {
            Ok(latency) => BackendHealth::up("redis", latency),
            Err(e) => BackendHealth::down("redis", e.to_string()),
        }
    }

    async fn stats(&self) -> BackendStats {
        let mut stats = BackendStats::new("redis", self.counters.lock().clone());
        match self.db_size().await {
            Ok(size) => stats.database_size = Some(size),
            Err(e) => debug!(error = %e, "Redis DBSIZE unavailable"),
        }
        stats.connected = self.is_connected();
        stats
    }

    async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut slot = self.slot.write().await;
        if slot.take().is_some() {
            info!("Redis connection closed");
        }
        self.connected.store(false, Ordering::Release);
    }
}

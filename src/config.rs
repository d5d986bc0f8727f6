//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment name (e.g. "development", "staging", "production")
    pub deploy_env: String,
    /// Whether several process instances share one cache
    pub cluster_mode: bool,
    /// Maximum number of entries the local store can hold
    pub max_entries: usize,
    /// Default TTL in seconds for resource classes without a policy entry
    pub default_ttl: u64,
    /// HTTP server port for the ops surface
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// Maximum number of expired entries removed per sweep lock hold
    pub sweep_batch_size: usize,
    /// Distributed backend settings
    pub redis: RedisSettings,
}

/// Connection settings for the distributed backend.
#[derive(Debug, Clone)]
pub struct RedisSettings {
    /// Connection URL; `None` means no distributed backend is configured
    pub url: Option<String>,
    /// Password injected into the connection info when set
    pub password: Option<String>,
    /// Prefix applied to every stored key
    pub key_prefix: String,
    /// Deadline for establishing a connection
    pub connect_timeout: Duration,
    /// Deadline for each individual command
    pub command_timeout: Duration,
    /// Bounded retry count for connecting and reconnecting
    pub max_retries: usize,
    /// Minimum delay between lazy reconnect attempts
    pub reconnect_cooldown: Duration,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: None,
            password: None,
            key_prefix: "cache:".to_string(),
            connect_timeout: Duration::from_millis(3000),
            command_timeout: Duration::from_millis(2000),
            max_retries: 3,
            reconnect_cooldown: Duration::from_millis(5000),
        }
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEPLOY_ENV` - Deployment environment (default: development)
    /// - `CLUSTER_MODE` - Shared cache across instances (default: false)
    /// - `REDIS_URL` - Distributed backend address (default: unset)
    /// - `REDIS_PASSWORD` - Distributed backend password (default: unset)
    /// - `REDIS_KEY_PREFIX` - Prefix for stored keys (default: "cache:")
    /// - `REDIS_CONNECT_TIMEOUT_MS` - Connect deadline (default: 3000)
    /// - `REDIS_COMMAND_TIMEOUT_MS` - Per-command deadline (default: 2000)
    /// - `REDIS_MAX_RETRIES` - Bounded connect retries (default: 3)
    /// - `REDIS_RECONNECT_COOLDOWN_MS` - Lazy reconnect spacing (default: 5000)
    /// - `LOCAL_MAX_ENTRIES` - Local store capacity (default: 1000)
    /// - `DEFAULT_TTL` - Fallback TTL in seconds (default: 3600)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `SWEEP_BATCH_SIZE` - Entries removed per sweep batch (default: 500)
    /// - `SERVER_PORT` - Ops HTTP port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let redis_defaults = RedisSettings::default();

        Self {
            deploy_env: env::var("DEPLOY_ENV").unwrap_or(defaults.deploy_env),
            cluster_mode: env::var("CLUSTER_MODE")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.cluster_mode),
            max_entries: parse_var("LOCAL_MAX_ENTRIES", defaults.max_entries),
            default_ttl: parse_var("DEFAULT_TTL", defaults.default_ttl),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL", defaults.cleanup_interval),
            sweep_batch_size: parse_var("SWEEP_BATCH_SIZE", defaults.sweep_batch_size),
            redis: RedisSettings {
                url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
                password: env::var("REDIS_PASSWORD").ok().filter(|v| !v.is_empty()),
                key_prefix: env::var("REDIS_KEY_PREFIX").unwrap_or(redis_defaults.key_prefix),
                connect_timeout: Duration::from_millis(parse_var(
                    "REDIS_CONNECT_TIMEOUT_MS",
                    redis_defaults.connect_timeout.as_millis() as u64,
                )),
                command_timeout: Duration::from_millis(parse_var(
                    "REDIS_COMMAND_TIMEOUT_MS",
                    redis_defaults.command_timeout.as_millis() as u64,
                )),
                max_retries: parse_var("REDIS_MAX_RETRIES", redis_defaults.max_retries),
                reconnect_cooldown: Duration::from_millis(parse_var(
                    "REDIS_RECONNECT_COOLDOWN_MS",
                    redis_defaults.reconnect_cooldown.as_millis() as u64,
                )),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deploy_env: "development".to_string(),
            cluster_mode: false,
            max_entries: 1000,
            default_ttl: 3600,
            server_port: 3000,
            cleanup_interval: 60,
            sweep_batch_size: 500,
            redis: RedisSettings::default(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

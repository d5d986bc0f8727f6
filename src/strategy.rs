//! Strategy Selector
//!
//! Decides once, at startup, which backends the process uses. Nothing else in
//! the crate looks at the deployment environment.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;

/// Backend arrangement for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Local store only
    LocalOnly,
    /// Redis only
    DistributedOnly,
    /// Redis primary, local fallback
    Hybrid,
}

impl CacheMode {
    pub fn uses_redis(self) -> bool {
        matches!(self, CacheMode::DistributedOnly | CacheMode::Hybrid)
    }

    pub fn uses_local(self) -> bool {
        matches!(self, CacheMode::LocalOnly | CacheMode::Hybrid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CacheMode::LocalOnly => "local_only",
            CacheMode::DistributedOnly => "distributed_only",
            CacheMode::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment signals the selection depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub clustered: bool,
    pub production: bool,
    pub redis_configured: bool,
}

impl Deployment {
    pub fn from_config(config: &Config) -> Self {
        Self {
            clustered: config.cluster_mode,
            production: is_production(&config.deploy_env),
            redis_configured: config.redis.url.is_some(),
        }
    }
}

/// Maps deployment signals to a mode.
///
/// | clustered | production | mode |
/// |---|---|---|
/// | yes | yes | distributed-only |
/// | yes | no | hybrid |
/// | no | any | local-only |
///
/// A clustered deployment without a Redis URL falls back to local-only.
pub fn select(deployment: Deployment) -> CacheMode {
    match deployment {
        Deployment {
            clustered: true,
            redis_configured: false,
            ..
        } => {
            warn!("cluster mode requested without REDIS_URL, using local cache only");
            CacheMode::LocalOnly
        }
        Deployment {
            clustered: true,
            production: true,
            ..
        } => CacheMode::DistributedOnly,
        Deployment {
            clustered: true, ..
        } => CacheMode::Hybrid,
        Deployment {
            clustered: false, ..
        } => CacheMode::LocalOnly,
    }
}

/// Selects the mode for `config` and logs the decision.
pub fn select_for(config: &Config) -> CacheMode {
    let deployment = Deployment::from_config(config);
    let mode = select(deployment);
    info!(
        mode = %mode,
        deploy_env = %config.deploy_env,
        clustered = deployment.clustered,
        "cache strategy selected"
    );
    mode
}

fn is_production(deploy_env: &str) -> bool {
    matches!(
        deploy_env.trim().to_ascii_lowercase().as_str(),
        "production" | "prod"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment(clustered: bool, production: bool) -> Deployment {
        Deployment {
            clustered,
            production,
            redis_configured: true,
        }
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(select(deployment(true, true)), CacheMode::DistributedOnly);
        assert_eq!(select(deployment(true, false)), CacheMode::Hybrid);
        assert_eq!(select(deployment(false, false)), CacheMode::LocalOnly);
        assert_eq!(select(deployment(false, true)), CacheMode::LocalOnly);
    }

    #[test]
    fn test_cluster_without_redis_is_local() {
        let signals = Deployment {
            clustered: true,
            production: true,
            redis_configured: false,
        };
        assert_eq!(select(signals), CacheMode::LocalOnly);
    }

    #[test]
    fn test_production_detection() {
        assert!(is_production("production"));
        assert!(is_production(" PROD "));
        assert!(!is_production("staging"));
        assert!(!is_production("development"));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.cluster_mode = true;
        config.deploy_env = "staging".to_string();
        config.redis.url = Some("redis://127.0.0.1:6379".to_string());

        assert_eq!(select_for(&config), CacheMode::Hybrid);
    }

    #[test]
    fn test_mode_flags() {
        assert!(CacheMode::Hybrid.uses_redis());
        assert!(CacheMode::Hybrid.uses_local());
        assert!(!CacheMode::DistributedOnly.uses_local());
        assert!(!CacheMode::LocalOnly.uses_redis());
        assert_eq!(CacheMode::LocalOnly.to_string(), "local_only");
    }
}

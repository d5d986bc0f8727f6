//! Adaptive Cache - caching layer between request handlers and a slow data store
//!
//! Picks a local, distributed or hybrid backend at startup, enforces
//! per-resource-class freshness, and invalidates by key pattern when records
//! change. A cache failure never becomes a request failure.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod facade;
pub mod hooks;
pub mod keys;
pub mod models;
pub mod strategy;
pub mod tasks;
pub mod ttl;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, CacheResult};
pub use facade::{CacheFacade, HealthReport, HealthStatus};
pub use hooks::{LifecycleHooks, MutationEvent, Operation};
pub use strategy::CacheMode;
pub use ttl::TtlPolicy;

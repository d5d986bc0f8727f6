//! Response DTOs for the ops API
//!
//! Defines the structure of outgoing HTTP response bodies. The health
//! endpoint serializes [`crate::facade::HealthReport`] directly.

use serde::Serialize;

use crate::cache::BackendStats;
use crate::strategy::CacheMode;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Active cache mode
    pub mode: CacheMode,
    /// Per-backend statistics, primary first
    pub backends: Vec<BackendStats>,
}

impl StatsResponse {
    pub fn new(mode: CacheMode, backends: Vec<BackendStats>) -> Self {
        Self { mode, backends }
    }
}

/// Response body for the mutation hook (POST /hooks/mutation)
#[derive(Debug, Clone, Serialize)]
pub struct HookAcceptedResponse {
    /// Acknowledgement message
    pub message: String,
    pub class: String,
    pub id: String,
}

impl HookAcceptedResponse {
    pub fn new(class: impl Into<String>, id: impl Into<String>) -> Self {
        let class = class.into();
        let id = id.into();
        Self {
            message: format!("Invalidation scheduled for {} '{}'", class, id),
            class,
            id,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

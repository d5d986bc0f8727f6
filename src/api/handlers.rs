//! API Handlers
//!
//! HTTP request handlers for the ops endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::error::{CacheError, CacheResult};
use crate::facade::{CacheFacade, HealthReport, HealthStatus};
use crate::hooks::LifecycleHooks;
use crate::models::{HookAcceptedResponse, MutationRequest, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide cache façade
    pub cache: Arc<CacheFacade>,
    /// Mutation hooks bound to the same façade
    pub hooks: LifecycleHooks,
}

impl AppState {
    /// Creates a new AppState around the façade with default hooks.
    pub fn new(cache: Arc<CacheFacade>) -> Self {
        let hooks = LifecycleHooks::new(cache.clone());
        Self { cache, hooks }
    }

    /// Creates a new AppState with pre-configured hooks.
    pub fn with_hooks(cache: Arc<CacheFacade>, hooks: LifecycleHooks) -> Self {
        Self { cache, hooks }
    }
}

/// Handler for GET /health
///
/// Returns 200 while at least one backend serves, 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.cache.health_check().await;
    let status = match report.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(report))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let backends = state.cache.stats().await;
    Json(StatsResponse::new(state.cache.mode(), backends))
}

/// Handler for POST /hooks/mutation
///
/// Schedules invalidation for the mutated record and returns immediately.
pub async fn mutation_hook_handler(
    State(state): State<AppState>,
    Json(req): Json<MutationRequest>,
) -> CacheResult<(StatusCode, Json<HookAcceptedResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let response = HookAcceptedResponse::new(&req.class, &req.id);
    state.hooks.spawn_mutation(req.into_event());

    Ok((StatusCode::ACCEPTED, Json(response)))
}

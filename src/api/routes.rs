//! API Routes
//!
//! Configures the Axum router with the ops endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, mutation_hook_handler, stats_handler, AppState};

/// Creates the ops router.
///
/// # Endpoints
/// - `GET /health` - Aggregated backend health
/// - `GET /stats` - Per-backend statistics
/// - `POST /hooks/mutation` - Invalidate after a data-layer write
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/hooks/mutation", post(mutation_hook_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

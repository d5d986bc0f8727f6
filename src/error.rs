//! Error types for the caching layer
//!
//! Provides unified error handling using thiserror. Almost every variant here
//! is recovered inside the cache (logged and treated as a miss); only
//! `InvalidRequest` ever reaches a caller, through the ops HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the caching layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The distributed backend rejected or failed a command
    #[error("Transport error: {0}")]
    Transport(#[from] redis::RedisError),

    /// A distributed backend call exceeded its deadline
    #[error("Timed out after {millis}ms during {operation}")]
    Timeout { operation: &'static str, millis: u64 },

    /// No connection to the distributed backend is available
    #[error("Distributed backend disconnected")]
    Disconnected,

    /// A value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Returns true when the error came from the network path to the
    /// distributed backend rather than from the data itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CacheError::Transport(_) | CacheError::Timeout { .. } | CacheError::Disconnected
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Serialization(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Transport(_) | CacheError::Timeout { .. } | CacheError::Disconnected => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching layer.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

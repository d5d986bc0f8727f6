//! API Module
//!
//! HTTP handlers and routing for the cache ops surface.
//!
//! # Endpoints
//! - `GET /health` - Aggregated backend health
//! - `GET /stats` - Per-backend statistics
//! - `POST /hooks/mutation` - Mutation webhook for out-of-process data layers

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of the cache.
//!
//! # Tasks
//! - TTL Sweep: Removes expired local cache entries at configured intervals

mod sweep;

pub use sweep::{spawn_sweep_task, sweep_in_batches};

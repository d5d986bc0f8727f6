//! TTL Sweep Task
//!
//! Background task that periodically removes expired local cache entries.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::LocalTable;

/// Spawns a background task that periodically sweeps expired entries.
///
/// Each run removes expired entries in batches of `batch_size`, releasing the
/// table lock and yielding between batches so request handlers are never
/// blocked for a full table scan.
///
/// # Returns
/// A JoinHandle for the spawned task, which is aborted on shutdown.
///
/// # Example
/// ```ignore
/// let table = Arc::new(Mutex::new(LocalTable::new(1000)));
/// let sweep_handle = spawn_sweep_task(table.clone(), Duration::from_secs(60), 500);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(
    table: Arc<Mutex<LocalTable>>,
    interval: Duration,
    batch_size: usize,
) -> JoinHandle<()> {
    let batch_size = batch_size.max(1);

    tokio::spawn(async move {
        info!(
            "Starting TTL sweep task with interval of {} seconds",
            interval.as_secs_f64()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = sweep_in_batches(&table, batch_size).await;

            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}

/// Removes every currently expired entry, one batch per lock hold.
pub async fn sweep_in_batches(table: &Mutex<LocalTable>, batch_size: usize) -> usize {
    let now = current_timestamp_ms();
    let mut total = 0;

    loop {
        let removed = table.lock().sweep_expired(now, batch_size);
        total += removed;
        if removed < batch_size {
            break;
        }
        tokio::task::yield_now().await;
    }

    total
}

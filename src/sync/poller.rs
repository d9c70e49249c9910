//! Poller
//!
//! Periodic full-list fetch from the query endpoint. A failed tick is
//! silently skipped (logged at warn, nothing mutated) and the next tick is
//! attempted unchanged; snapshot application is idempotent, so an
//! occasional overlapping tick is harmless.

use std::sync::Arc;
use std::time::Duration;

use crate::sync::client::IncidentApi;
use crate::sync::store::IncidentStore;

/// One poll tick: fetch and hand the full list to the reconciler.
pub async fn poll_once<A: IncidentApi>(api: &A, store: &IncidentStore, limit: usize) {
    match api.list_incidents(limit).await {
        Ok(records) => {
            log::debug!("poll tick: {} incidents", records.len());
            store.apply_snapshot(records);
        }
        Err(e) => {
            // Transient channel failure: skip the tick, no partial update.
            log::warn!("poll tick skipped: {}", e);
        }
    }
}

/// Poll loop. Runs until the owning session aborts the task.
pub async fn run_poller<A: IncidentApi>(
    api: A,
    store: Arc<IncidentStore>,
    interval: Duration,
    limit: usize,
) {
    log::info!("poller started (every {:?}, limit {})", interval, limit);
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        poll_once(&api, &store, limit).await;
    }
}

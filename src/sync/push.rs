//! Push Listener
//!
//! Consumes individual incident-update events from a long-lived push
//! channel and forwards each as an upsert. Delivery is at-most-once with no
//! ordering guarantee; on disconnect the listener reconnects without
//! replay, leaving recovery of missed events to the next poll snapshot.
//!
//! The transport itself (websocket, SSE, ...) sits behind `PushTransport`
//! so the listener logic stays independent of the wire.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::incident::Incident;
use crate::sync::client::SyncError;
use crate::sync::store::IncidentStore;

/// One logical event from the push channel.
#[derive(Debug)]
pub enum PushEvent {
    /// A full incident record, merged into the store as an upsert.
    IncidentUpdate(serde_json::Value),
    /// Admin/system cleared the incident list.
    IncidentsCleared,
}

/// Connection factory for the push channel. Each successful `connect`
/// yields a stream of events that ends when the connection drops.
pub trait PushTransport {
    fn connect(
        &mut self,
    ) -> impl Future<Output = Result<mpsc::Receiver<PushEvent>, SyncError>> + Send;
}

/// Apply one push event to the store. Malformed payloads are discarded
/// without touching the store.
pub fn handle_push_event(store: &IncidentStore, event: PushEvent) {
    match event {
        PushEvent::IncidentUpdate(payload) => match serde_json::from_value::<Incident>(payload) {
            Ok(record) if !record.id.is_empty() => store.apply_upsert(record),
            Ok(_) => log::warn!("push record with empty id discarded"),
            Err(e) => log::warn!("malformed push record discarded: {}", e),
        },
        PushEvent::IncidentsCleared => {
            log::info!("incidents cleared by system/admin");
            store.clear_synced();
        }
    }
}

/// Listener loop: connect, drain events, reconnect on loss. Runs until the
/// owning session aborts the task. No local synthesis, no replay.
pub async fn run_push_listener<T: PushTransport>(
    mut transport: T,
    store: Arc<IncidentStore>,
    reconnect_delay: Duration,
) {
    loop {
        match transport.connect().await {
            Ok(mut events) => {
                log::info!("push channel connected");
                while let Some(event) = events.recv().await {
                    handle_push_event(&store, event);
                }
                log::warn!(
                    "push channel closed, reconnecting in {:?}",
                    reconnect_delay
                );
            }
            Err(e) => {
                log::warn!(
                    "push connect failed: {}, retrying in {:?}",
                    e,
                    reconnect_delay
                );
            }
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

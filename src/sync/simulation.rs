//! Simulation Driver
//!
//! Demo/offline aid: periodically advances incidents through plausible
//! transitions so a disconnected dashboard stays visually alive. Only runs
//! when the session is in offline/demo mode, never against a live backend.
//! Advancement goes through the command dispatcher; with no backend the
//! requests fail and the optimistic state simply stays, which is exactly
//! the effect wanted here.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::incident::{Incident, IncidentStatus, ResolutionType};
use crate::sync::client::IncidentApi;
use crate::sync::commands::CommandDispatcher;
use crate::sync::store::IncidentStore;

/// Chance per tick that one eligible incident advances a step.
const ADVANCE_PROBABILITY: f64 = 0.8;

/// The driver only advances work assigned to somebody other than the
/// local responder; the local user's own incidents stay put.
fn assigned_to_other(incident: &Incident, local_responder: &str) -> bool {
    incident
        .assigned_responder
        .as_deref()
        .map(|r| r != local_responder)
        .unwrap_or(false)
}

/// Pick a random eligible incident id, or None. Separated from the async
/// path so the rng never lives across an await.
fn pick_target(candidates: &[Incident]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }
    let mut rng = rand::thread_rng();
    if !rng.gen_bool(ADVANCE_PROBABILITY) {
        return None;
    }
    let index = rng.gen_range(0..candidates.len());
    Some(candidates[index].id.clone())
}

/// One simulation step: maybe verify one dispatched incident, maybe
/// resolve one confirmed incident. Incidents assigned to the local
/// responder are left alone; only "other people's" work advances.
pub async fn simulate_tick<A: IncidentApi>(
    dispatcher: &CommandDispatcher<A>,
    store: &IncidentStore,
    local_responder: &str,
) {
    let incidents = store.incidents();

    let dispatched: Vec<Incident> = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Dispatched && assigned_to_other(i, local_responder))
        .cloned()
        .collect();
    if let Some(id) = pick_target(&dispatched) {
        log::debug!("simulation: confirming {}", id);
        let _ = dispatcher.confirm(&id).await;
    }

    let confirmed: Vec<Incident> = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Confirmed && assigned_to_other(i, local_responder))
        .cloned()
        .collect();
    if let Some(id) = pick_target(&confirmed) {
        log::debug!("simulation: resolving {}", id);
        let _ = dispatcher.resolve(&id, ResolutionType::Resolved).await;
    }
}

/// Simulation loop. Runs until the owning session aborts the task.
pub async fn run_simulation<A: IncidentApi>(
    dispatcher: Arc<CommandDispatcher<A>>,
    store: Arc<IncidentStore>,
    local_responder: String,
    interval: Duration,
) {
    log::info!("simulation driver started (every {:?})", interval);
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        simulate_tick(dispatcher.as_ref(), &store, &local_responder).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::Severity;
    use crate::sync::alert::AlertGate;
    use crate::sync::client::{FeedbackType, SyncError};

    /// Offline backend: every call fails like a dead network.
    struct DeadApi;

    impl IncidentApi for DeadApi {
        async fn list_incidents(&self, _limit: usize) -> Result<Vec<Incident>, SyncError> {
            Err(SyncError::Network("offline".to_string()))
        }

        async fn resolve(&self, _id: &str, _r: ResolutionType) -> Result<(), SyncError> {
            Err(SyncError::Network("offline".to_string()))
        }

        async fn feedback(&self, _id: &str, _f: FeedbackType) -> Result<(), SyncError> {
            Err(SyncError::Network("offline".to_string()))
        }

        async fn dispatch(&self, _id: &str, _responder: &str) -> Result<(), SyncError> {
            Err(SyncError::Network("offline".to_string()))
        }

        async fn ack_all(&self) -> Result<(), SyncError> {
            Err(SyncError::Network("offline".to_string()))
        }
    }

    fn incident(id: &str, status: IncidentStatus, responder: Option<&str>) -> Incident {
        Incident {
            id: id.to_string(),
            kind: "violence".to_string(),
            severity: Severity::High,
            location: "Platform 2".to_string(),
            camera_id: "CAM-07".to_string(),
            timestamp: "2026-08-26T10:15:00Z".parse().unwrap(),
            confidence: 90.0,
            status,
            assigned_responder: responder.map(|r| r.to_string()),
            resolution_type: None,
            people_count: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_own_and_unassigned_incidents_left_alone() {
        let (gate, _rx) = AlertGate::new();
        let store = Arc::new(IncidentStore::new(gate));
        let dispatcher = CommandDispatcher::new(DeadApi, store.clone());

        store.apply_snapshot(vec![
            incident("mine", IncidentStatus::Dispatched, Some("me")),
            incident("nobody", IncidentStatus::Dispatched, None),
        ]);

        // No eligible candidates, so no tick can advance anything.
        for _ in 0..20 {
            simulate_tick(&dispatcher, &store, "me").await;
        }
        assert_eq!(
            store.get("mine").unwrap().status,
            IncidentStatus::Dispatched
        );
        assert_eq!(
            store.get("nobody").unwrap().status,
            IncidentStatus::Dispatched
        );
    }

    #[tokio::test]
    async fn test_eventually_advances_others_work_offline() {
        let (gate, _rx) = AlertGate::new();
        let store = Arc::new(IncidentStore::new(gate));
        let dispatcher = CommandDispatcher::new(DeadApi, store.clone());

        store.apply_snapshot(vec![incident(
            "theirs",
            IncidentStatus::Dispatched,
            Some("officer-3"),
        )]);

        // 0.8 chance per tick; 60 ticks makes a miss astronomically
        // unlikely. The backend is dead, so the optimistic state is what
        // keeps the demo moving.
        for _ in 0..60 {
            simulate_tick(&dispatcher, &store, "me").await;
        }
        let theirs = store.get("theirs").unwrap();
        assert_eq!(theirs.status, IncidentStatus::Resolved);
        assert_eq!(theirs.resolution_type, Some(ResolutionType::Resolved));
    }
}

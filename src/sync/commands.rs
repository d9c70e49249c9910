//! Command Dispatcher
//!
//! Executes user-initiated status transitions against the backend. Each
//! command marks its id as pending (which parks conflicting channel
//! records), applies the optimistic local transition immediately, then
//! confirms or compensates against the backend response:
//!
//! - success: pending cleared, parked backend record applied if any
//! - 404: the incident is stale upstream and removed locally
//! - other failure: pending cleared, optimistic state left in place; the
//!   next poll snapshot corrects any residual mismatch

use std::sync::Arc;

use crate::incident::{CommandKind, IncidentStatus, ResolutionType};
use crate::sync::client::{FeedbackType, IncidentApi, SyncError};
use crate::sync::store::IncidentStore;

pub struct CommandDispatcher<A: IncidentApi> {
    api: A,
    store: Arc<IncidentStore>,
}

impl<A: IncidentApi> CommandDispatcher<A> {
    pub fn new(api: A, store: Arc<IncidentStore>) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &Arc<IncidentStore> {
        &self.store
    }

    /// Resolve an incident, recording how it ended.
    pub async fn resolve(&self, id: &str, resolution: ResolutionType) -> Result<(), SyncError> {
        self.store.begin_command(id, CommandKind::Resolve, |inc| {
            inc.status = IncidentStatus::Resolved;
            inc.resolution_type = Some(resolution);
        });
        let result = self.api.resolve(id, resolution).await;
        self.finish(id, "resolve", result)
    }

    /// Dismiss a detection as a false positive, keeping the record for
    /// reporting.
    pub async fn dismiss(&self, id: &str) -> Result<(), SyncError> {
        self.store.begin_command(id, CommandKind::Dismiss, |inc| {
            inc.status = IncidentStatus::Dismissed;
            inc.resolution_type = Some(ResolutionType::Dismissed);
        });
        let result = self.api.resolve(id, ResolutionType::Dismissed).await;
        self.finish(id, "dismiss", result)
    }

    /// Confirm a detection as a true positive.
    pub async fn confirm(&self, id: &str) -> Result<(), SyncError> {
        self.store.begin_command(id, CommandKind::Confirm, |inc| {
            inc.status = IncidentStatus::Confirmed;
        });
        let result = self.api.feedback(id, FeedbackType::Confirm).await;
        self.finish(id, "confirm", result)
    }

    /// Reject a detection as a false positive and delete the record.
    ///
    /// Local removal happens up front, independent of the network outcome:
    /// a rejected detection has no further relevance to the active view.
    /// The pending tag stays until the request settles so channel records
    /// arriving mid-flight cannot resurrect the incident.
    pub async fn reject(&self, id: &str) -> Result<(), SyncError> {
        self.store.begin_command(id, CommandKind::Reject, |_| {});
        self.store.discard_keep_pending(id);

        let result = self.api.feedback(id, FeedbackType::Reject).await;
        // The record is gone locally either way; only release the tag.
        self.store.remove(id);
        match result {
            Ok(()) | Err(SyncError::NotFound) => Ok(()),
            Err(e) => {
                log::error!("reject {} failed: {}", id, e);
                Err(e)
            }
        }
    }

    /// Assign a responder and mark the incident dispatched.
    pub async fn dispatch(&self, id: &str, responder_id: &str) -> Result<(), SyncError> {
        self.store.begin_command(id, CommandKind::Dispatch, |inc| {
            inc.status = IncidentStatus::Dispatched;
            inc.assigned_responder = Some(responder_id.to_string());
        });
        let result = self.api.dispatch(id, responder_id).await;
        self.finish(id, "dispatch", result)
    }

    /// Acknowledge every active incident in one shot.
    ///
    /// Blanket optimistic update without per-id pending tags; the next
    /// snapshot reconciles stragglers.
    pub async fn ack_all(&self) -> Result<(), SyncError> {
        self.store.acknowledge_active();
        match self.api.ack_all().await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("ack-all failed: {}", e);
                Err(e)
            }
        }
    }

    fn finish(&self, id: &str, name: &str, result: Result<(), SyncError>) -> Result<(), SyncError> {
        match result {
            Ok(()) => {
                self.store.complete_command(id);
                Ok(())
            }
            Err(SyncError::NotFound) => {
                // Compensation, not a retry: the backend no longer knows
                // this id, so neither should we.
                log::warn!("{} {}: gone upstream, removed locally", name, id);
                self.store.remove(id);
                Err(SyncError::NotFound)
            }
            Err(e) => {
                log::error!("{} {} failed: {}", name, id, e);
                self.store.abort_command(id);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::{Incident, Severity};
    use crate::sync::alert::AlertGate;
    use parking_lot::Mutex;

    /// Backend double returning one configured result for every command.
    #[derive(Clone)]
    struct MockApi {
        command_result: Arc<Mutex<Result<(), SyncError>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockApi {
        fn ok() -> Self {
            Self::with_result(Ok(()))
        }

        fn with_result(result: Result<(), SyncError>) -> Self {
            Self {
                command_result: Arc::new(Mutex::new(result)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn record(&self, call: String) -> Result<(), SyncError> {
            self.calls.lock().push(call);
            self.command_result.lock().clone()
        }
    }

    impl IncidentApi for MockApi {
        async fn list_incidents(&self, _limit: usize) -> Result<Vec<Incident>, SyncError> {
            Ok(Vec::new())
        }

        async fn resolve(&self, id: &str, resolution: ResolutionType) -> Result<(), SyncError> {
            self.record(format!("resolve:{}:{:?}", id, resolution))
        }

        async fn feedback(&self, id: &str, feedback: FeedbackType) -> Result<(), SyncError> {
            self.record(format!("feedback:{}:{:?}", id, feedback))
        }

        async fn dispatch(&self, id: &str, responder_id: &str) -> Result<(), SyncError> {
            self.record(format!("dispatch:{}:{}", id, responder_id))
        }

        async fn ack_all(&self) -> Result<(), SyncError> {
            self.record("ack-all".to_string())
        }
    }

    fn incident(id: &str) -> Incident {
        Incident {
            id: id.to_string(),
            kind: "violence".to_string(),
            severity: Severity::High,
            location: "Platform 2".to_string(),
            camera_id: "CAM-07".to_string(),
            timestamp: "2026-08-26T10:15:00Z".parse().unwrap(),
            confidence: 92.5,
            status: IncidentStatus::Active,
            assigned_responder: None,
            resolution_type: None,
            people_count: None,
            description: None,
        }
    }

    fn dispatcher(api: MockApi) -> CommandDispatcher<MockApi> {
        let (gate, _rx) = AlertGate::new();
        let store = Arc::new(IncidentStore::new(gate));
        CommandDispatcher::new(api, store)
    }

    #[tokio::test]
    async fn test_full_workflow_preserves_immutable_fields() {
        let dispatcher = dispatcher(MockApi::ok());
        dispatcher.store().apply_snapshot(vec![incident("A")]);
        let before = dispatcher.store().get("A").unwrap();

        dispatcher.dispatch("A", "officer-7").await.unwrap();
        assert_eq!(
            dispatcher.store().get("A").unwrap().status,
            IncidentStatus::Dispatched
        );

        dispatcher.confirm("A").await.unwrap();
        assert_eq!(
            dispatcher.store().get("A").unwrap().status,
            IncidentStatus::Confirmed
        );

        dispatcher
            .resolve("A", ResolutionType::Resolved)
            .await
            .unwrap();

        let after = dispatcher.store().get("A").unwrap();
        assert_eq!(after.status, IncidentStatus::Resolved);
        assert_eq!(after.resolution_type, Some(ResolutionType::Resolved));
        assert_eq!(after.assigned_responder.as_deref(), Some("officer-7"));
        // Immutable fields never change across the workflow.
        assert_eq!(after.location, before.location);
        assert_eq!(after.timestamp, before.timestamp);
        assert_eq!(after.confidence, before.confidence);
        assert!(!dispatcher.store().has_pending("A"));
    }

    #[tokio::test]
    async fn test_not_found_removes_incident() {
        let dispatcher = dispatcher(MockApi::with_result(Err(SyncError::NotFound)));
        dispatcher.store().apply_snapshot(vec![incident("B")]);

        let err = dispatcher.dismiss("B").await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound));
        assert!(dispatcher.store().get("B").is_none());
        assert!(!dispatcher.store().has_pending("B"));
    }

    #[tokio::test]
    async fn test_dismiss_unknown_id_does_not_crash() {
        // The id was already deleted upstream and is not in the store.
        let dispatcher = dispatcher(MockApi::with_result(Err(SyncError::NotFound)));

        let err = dispatcher.dismiss("ghost").await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound));
        assert!(dispatcher.store().is_empty());
        assert!(!dispatcher.store().has_pending("ghost"));
    }

    #[tokio::test]
    async fn test_other_failure_keeps_optimistic_state() {
        let dispatcher = dispatcher(MockApi::with_result(Err(SyncError::Server(500))));
        dispatcher.store().apply_snapshot(vec![incident("C")]);

        let err = dispatcher.confirm("C").await.unwrap_err();
        assert!(matches!(err, SyncError::Server(500)));

        // Optimistic state stays; pending tag is released.
        let c = dispatcher.store().get("C").unwrap();
        assert_eq!(c.status, IncidentStatus::Confirmed);
        assert!(!dispatcher.store().has_pending("C"));
    }

    #[tokio::test]
    async fn test_reject_removes_locally_even_on_failure() {
        let dispatcher = dispatcher(MockApi::with_result(Err(SyncError::Server(502))));
        dispatcher.store().apply_snapshot(vec![incident("D")]);

        let err = dispatcher.reject("D").await.unwrap_err();
        assert!(matches!(err, SyncError::Server(502)));
        assert!(dispatcher.store().get("D").is_none());
        assert!(!dispatcher.store().has_pending("D"));
    }

    #[tokio::test]
    async fn test_dismiss_uses_resolve_endpoint() {
        let api = MockApi::ok();
        let dispatcher = dispatcher(api.clone());
        dispatcher.store().apply_snapshot(vec![incident("E")]);

        dispatcher.dismiss("E").await.unwrap();
        assert_eq!(api.calls(), vec!["resolve:E:Dismissed"]);

        let e = dispatcher.store().get("E").unwrap();
        assert_eq!(e.status, IncidentStatus::Dismissed);
        assert_eq!(e.resolution_type, Some(ResolutionType::Dismissed));
    }

    #[tokio::test]
    async fn test_ack_all_is_optimistic() {
        let dispatcher = dispatcher(MockApi::with_result(Err(SyncError::Server(503))));
        dispatcher.store().apply_snapshot(vec![incident("F")]);

        let err = dispatcher.ack_all().await.unwrap_err();
        assert!(matches!(err, SyncError::Server(503)));
        assert_eq!(
            dispatcher.store().get("F").unwrap().status,
            IncidentStatus::Acknowledged
        );
    }

    #[tokio::test]
    async fn test_pending_blocks_channel_updates_until_settled() {
        let api = MockApi::ok();
        let dispatcher = dispatcher(api);
        dispatcher.store().apply_snapshot(vec![incident("G")]);

        // Simulate a stale channel record racing the command: the store
        // parks it while pending, and the command's success applies it.
        dispatcher
            .store()
            .begin_command("G", CommandKind::Confirm, |inc| {
                inc.status = IncidentStatus::Confirmed;
            });
        dispatcher.store().apply_upsert(incident("G"));
        assert_eq!(
            dispatcher.store().get("G").unwrap().status,
            IncidentStatus::Confirmed
        );
        dispatcher.store().complete_command("G");
        assert_eq!(
            dispatcher.store().get("G").unwrap().status,
            IncidentStatus::Active
        );
    }
}

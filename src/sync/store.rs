//! Reconciler / Store
//!
//! The single authoritative in-memory incident collection. Poll snapshots
//! and push upserts both funnel through here, as do the command
//! dispatcher's optimistic mutations, so every read-modify-write runs under
//! one lock. Within one operation the sequence is strictly
//! observe -> diff -> alert -> commit.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::incident::{CommandKind, Incident, IncidentStatus};
use crate::sync::alert::AlertGate;

/// In-flight optimistic command for one incident id.
///
/// While present, externally sourced records for the id are parked in
/// `deferred` instead of overwriting the optimistic state the user is
/// looking at. Latest record wins; it is applied when the command resolves.
struct PendingCommand {
    kind: CommandKind,
    deferred: Option<Incident>,
}

#[derive(Default)]
struct StoreInner {
    incidents: HashMap<String, Incident>,
    pending: HashMap<String, PendingCommand>,
}

/// Authoritative incident store keyed by id.
///
/// Owns the alert gate so the newly-observed diff and the alert decision
/// happen atomically with the commit.
pub struct IncidentStore {
    inner: Mutex<StoreInner>,
    alerts: AlertGate,
}

impl IncidentStore {
    pub fn new(alerts: AlertGate) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            alerts,
        }
    }

    pub fn alerts(&self) -> &AlertGate {
        &self.alerts
    }

    /// Replace the collection with a full poll snapshot.
    ///
    /// Ids absent from the snapshot are dropped unless a command is pending
    /// for them: an in-flight optimistic action must not be erased by a
    /// stale snapshot that predates the backend's confirmation. Ids present
    /// in the snapshot keep their optimistic local state while pending; the
    /// backend record is parked for when the command resolves.
    pub fn apply_snapshot(&self, records: Vec<Incident>) {
        let mut inner = self.inner.lock();
        let StoreInner { incidents, pending } = &mut *inner;

        let fresh: Vec<Incident> = records
            .iter()
            .filter(|r| {
                !r.id.is_empty() && !incidents.contains_key(&r.id) && r.status.is_alertable()
            })
            .cloned()
            .collect();
        self.alerts.process_batch(&fresh);

        let mut next: HashMap<String, Incident> = HashMap::with_capacity(records.len());
        for record in records {
            if record.id.is_empty() {
                log::warn!("snapshot record with empty id discarded");
                continue;
            }
            if let Some(p) = pending.get_mut(&record.id) {
                // Park the backend record; only the local copy stays
                // visible. A pending id with no local entry (an in-flight
                // reject) must not reappear here.
                if let Some(local) = incidents.get(&record.id) {
                    next.insert(record.id.clone(), local.clone());
                }
                p.deferred = Some(record);
            } else {
                next.insert(record.id.clone(), record);
            }
        }

        // Pending entries missing from the snapshot survive it.
        for (id, incident) in incidents.iter() {
            if pending.contains_key(id) && !next.contains_key(id) {
                next.insert(id.clone(), incident.clone());
            }
        }

        *incidents = next;
    }

    /// Insert or overwrite one record from the push channel.
    ///
    /// The backend record is authoritative and replaces the entry wholesale,
    /// unless a command is pending for the id, in which case it is parked
    /// until the command resolves.
    pub fn apply_upsert(&self, record: Incident) {
        if record.id.is_empty() {
            log::warn!("upsert record with empty id discarded");
            return;
        }
        let mut inner = self.inner.lock();
        let StoreInner { incidents, pending } = &mut *inner;

        if !incidents.contains_key(&record.id) && record.status.is_alertable() {
            self.alerts.process_batch(std::slice::from_ref(&record));
        }

        if let Some(p) = pending.get_mut(&record.id) {
            log::debug!(
                "upsert for {} parked behind pending {:?}",
                record.id,
                p.kind
            );
            p.deferred = Some(record);
            return;
        }
        incidents.insert(record.id.clone(), record);
    }

    /// Drop every incident without a pending command. Push-channel
    /// `incidents_cleared` handling.
    pub fn clear_synced(&self) {
        self.apply_snapshot(Vec::new());
    }

    /// Mark `id` as having an in-flight command and apply the optimistic
    /// transition if the incident is currently present.
    ///
    /// The id does not have to exist: commands on unknown ids still go to
    /// the backend, whose 404 is the compensation signal.
    pub fn begin_command<F>(&self, id: &str, kind: CommandKind, transition: F)
    where
        F: FnOnce(&mut Incident),
    {
        let mut inner = self.inner.lock();
        let StoreInner { incidents, pending } = &mut *inner;
        pending.insert(
            id.to_string(),
            PendingCommand {
                kind,
                deferred: None,
            },
        );
        if let Some(incident) = incidents.get_mut(id) {
            transition(incident);
        }
    }

    /// Command confirmed by the backend: clear the pending tag and apply
    /// any record parked while it was in flight (backend wins over the
    /// optimistic guess).
    pub fn complete_command(&self, id: &str) {
        let mut inner = self.inner.lock();
        if let Some(p) = inner.pending.remove(id) {
            if let Some(record) = p.deferred {
                inner.incidents.insert(record.id.clone(), record);
            }
        }
    }

    /// Command failed for a reason other than not-found: clear the pending
    /// tag but leave the optimistic state in place. Any record parked while
    /// the command was in flight predates the failure and is dropped rather
    /// than visibly reverting the user's action; the next successful poll
    /// corrects any residual mismatch.
    pub fn abort_command(&self, id: &str) {
        self.inner.lock().pending.remove(id);
    }

    /// Remove `id` entirely, pending tag included. Compensation for a 404
    /// and the rejection path.
    pub fn remove(&self, id: &str) {
        let mut inner = self.inner.lock();
        inner.incidents.remove(id);
        inner.pending.remove(id);
    }

    /// Remove the incident record but keep its pending tag, so channel
    /// records arriving mid-flight cannot resurrect it. Used by `reject`.
    pub fn discard_keep_pending(&self, id: &str) {
        self.inner.lock().incidents.remove(id);
    }

    /// Blanket optimistic transition of every `active` incident to
    /// `acknowledged` (ack-all).
    pub fn acknowledge_active(&self) {
        let mut inner = self.inner.lock();
        for incident in inner.incidents.values_mut() {
            if incident.status == IncidentStatus::Active {
                incident.status = IncidentStatus::Acknowledged;
            }
        }
    }

    pub fn has_pending(&self, id: &str) -> bool {
        self.inner.lock().pending.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Incident> {
        self.inner.lock().incidents.get(id).cloned()
    }

    /// Full collection, newest first.
    pub fn incidents(&self) -> Vec<Incident> {
        let inner = self.inner.lock();
        let mut list: Vec<Incident> = inner.incidents.values().cloned().collect();
        list.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        list
    }

    /// Subset shown in active-incident views, newest first.
    pub fn active_incidents(&self) -> Vec<Incident> {
        let mut list: Vec<Incident> = self
            .inner
            .lock()
            .incidents
            .values()
            .filter(|i| i.status.is_active_view())
            .cloned()
            .collect();
        list.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        list
    }

    pub fn len(&self) -> usize {
        self.inner.lock().incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().incidents.is_empty()
    }
}

//! Alert Gate
//!
//! Deduplicates "new incident" events across the polling and push channels
//! and decides whether to surface a user-facing alert. Fires at most once
//! per incident id for the lifetime of the session, no matter which channel
//! observed the incident first or how often it is re-delivered.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::incident::Incident;

/// A user-facing alert for one newly observed incident.
///
/// `sound` is false when audio is muted; the visual notification itself is
/// never suppressed by the mute flag.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub incident: Incident,
    pub title: String,
    pub sound: bool,
}

/// Deduplicated alert emitter.
///
/// The "already alerted" set only ever grows. Membership test-and-insert
/// happens under one lock, so concurrent poll/push deliveries cannot both
/// win the race for the same id.
pub struct AlertGate {
    alerted: Mutex<HashSet<String>>,
    sound_enabled: AtomicBool,
    offline: AtomicBool,
    tx: mpsc::UnboundedSender<AlertEvent>,
}

impl AlertGate {
    /// Create a gate plus the receiving end of its notification feed.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlertEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gate = Self {
            alerted: Mutex::new(HashSet::new()),
            sound_enabled: AtomicBool::new(true),
            offline: AtomicBool::new(false),
            tx,
        };
        (gate, rx)
    }

    /// Process a batch of newly observed active incidents, emitting one
    /// alert per id never seen before.
    pub fn process_batch(&self, fresh: &[Incident]) {
        if fresh.is_empty() {
            return;
        }
        // Offline/demo sessions never alert.
        if self.offline.load(Ordering::Relaxed) {
            return;
        }

        let sound = self.sound_enabled.load(Ordering::Relaxed);
        let mut alerted = self.alerted.lock();
        for incident in fresh {
            if !alerted.insert(incident.id.clone()) {
                continue;
            }
            let event = AlertEvent {
                title: alert_title(incident),
                incident: incident.clone(),
                sound,
            };
            log::info!("alert: {}", event.title);
            // Receiver gone means the session is tearing down; drop silently.
            let _ = self.tx.send(event);
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    /// Flip the global sound flag, returning the new value.
    pub fn toggle_sound(&self) -> bool {
        let enabled = !self.sound_enabled.fetch_xor(true, Ordering::Relaxed);
        log::info!(
            "alert sounds {}",
            if enabled { "enabled" } else { "disabled" }
        );
        enabled
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }
}

/// Human-readable alert title for a newly detected incident.
pub fn alert_title(incident: &Incident) -> String {
    match incident.kind.as_str() {
        "violence" => {
            let people = incident
                .people_count
                .map(|n| format!(" ({} people)", n))
                .unwrap_or_default();
            format!("Violence detected{} at {}", people, incident.location)
        }
        "crash" => format!(
            "Crash detected at {} ({})",
            incident.location, incident.camera_id
        ),
        _ => format!(
            "Incident detected at {} ({})",
            incident.location, incident.camera_id
        ),
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Incident severity, ordered `critical > high > medium > low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Incident response workflow status.
///
/// `active -> {dispatched, acknowledged} -> confirmed -> resolved`, with a
/// direct `active -> resolved` branch for admin resolution and
/// `dismissed` as a resolved-equivalent for false positives that keeps the
/// record for reporting. Rejection removes the record entirely and has no
/// status of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Active,
    Dispatched,
    Acknowledged,
    Confirmed,
    Resolved,
    Dismissed,
}

impl IncidentStatus {
    /// Statuses shown in the active-incident views.
    pub fn is_active_view(&self) -> bool {
        matches!(self, Self::Active | Self::Dispatched | Self::Acknowledged)
    }

    /// Statuses that qualify a newly observed incident for an alert.
    pub fn is_alertable(&self) -> bool {
        matches!(self, Self::Active | Self::Dispatched)
    }

    /// Terminal statuses. Transitions never move backward out of these
    /// except through paths this system does not define.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Dismissed)
    }
}

/// Outcome recorded when an incident leaves the active workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionType {
    Resolved,
    NotResolved,
    Dismissed,
}

/// Kind of user command currently in flight for an incident.
///
/// Kept as an explicit tag (not a boolean) because a pending command must
/// also suppress conflicting channel upserts, not just reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Resolve,
    Dismiss,
    Confirm,
    Reject,
    Dispatch,
}

/// A detected event record tracked through the response workflow.
///
/// `id` is the sole merge key across channels. `location`, `camera_id`,
/// `timestamp` and `confidence` are immutable for the incident's lifetime;
/// only `status`, `assigned_responder` and `resolution_type` change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    /// Detection type (`violence`, `crash`, ...). Open set: unknown values
    /// are preserved verbatim.
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub location: String,
    pub camera_id: String,
    /// Creation time, assigned by the backend (ISO-8601 on the wire).
    pub timestamp: DateTime<Utc>,
    /// Detection confidence, 0-100.
    pub confidence: f32,
    pub status: IncidentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_responder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_type: Option<ResolutionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

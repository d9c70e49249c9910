//! Vigil Incident Realtime Sync Core
//!
//! Keeps a client's view of surveillance incidents consistent while updates
//! arrive from two independent, unreliable channels (a periodic REST poll and
//! an asynchronous push feed) and the same client issues optimistic
//! state-changing commands that can race with both. A deduplicated alert gate
//! fires at most once per newly observed incident, regardless of which
//! channel saw it first.

pub mod constants;
pub mod incident;
pub mod sync;

pub use incident::{CommandKind, Incident, IncidentStatus, ResolutionType, Severity};
pub use sync::alert::{AlertEvent, AlertGate};
pub use sync::client::{ApiClient, FeedbackType, IncidentApi, SyncError};
pub use sync::commands::CommandDispatcher;
pub use sync::store::IncidentStore;
pub use sync::{SyncConfig, SyncSession};

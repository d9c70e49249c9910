//! Incident Model
//!
//! The canonical incident entity and its status state machine. No
//! dependencies on the sync machinery; everything else builds on this.

pub mod types;

pub use types::{CommandKind, Incident, IncidentStatus, ResolutionType, Severity};

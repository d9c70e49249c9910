//! Backend API Client
//!
//! HTTP client for the incident query and command endpoints, plus the
//! `IncidentApi` trait the command dispatcher and poller are written
//! against so the backend can be mocked in tests.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::incident::{Incident, ResolutionType};

/// Errors surfaced by the sync core.
///
/// Channel failures (`Network`, `Server`) are transient and handled at the
/// component boundary; `NotFound` is a compensation signal, never a retry.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server error: status {0}")]
    Server(u16),
    #[error("incident not found upstream")]
    NotFound,
    #[error("malformed payload: {0}")]
    Parse(String),
}

/// User feedback on a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Confirm,
    Reject,
}

/// Backend operations the sync core depends on.
pub trait IncidentApi {
    /// Fetch up to `limit` most-recent incidents.
    fn list_incidents(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Incident>, SyncError>> + Send;

    /// Resolve an incident with the given resolution type.
    fn resolve(
        &self,
        id: &str,
        resolution: ResolutionType,
    ) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Submit true/false-positive feedback.
    fn feedback(
        &self,
        id: &str,
        feedback: FeedbackType,
    ) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Assign a responder to an incident.
    fn dispatch(
        &self,
        id: &str,
        responder_id: &str,
    ) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Acknowledge every active incident.
    fn ack_all(&self) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// Concrete `reqwest`-backed API client.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// POST a command body, mapping 404 to `SyncError::NotFound`.
    async fn post_command(&self, path: &str, body: serde_json::Value) -> Result<(), SyncError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            reqwest::StatusCode::NOT_FOUND => Err(SyncError::NotFound),
            s => Err(SyncError::Server(s.as_u16())),
        }
    }
}

impl IncidentApi for ApiClient {
    async fn list_incidents(&self, limit: usize) -> Result<Vec<Incident>, SyncError> {
        let url = format!("{}/api/incidents?limit={}", self.base_url, limit);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Server(response.status().as_u16()));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SyncError::Parse(e.to_string()))?;

        parse_incident_list(payload)
    }

    async fn resolve(&self, id: &str, resolution: ResolutionType) -> Result<(), SyncError> {
        self.post_command(
            &format!("/api/incidents/{}/resolve", id),
            serde_json::json!({ "resolutionType": resolution }),
        )
        .await
    }

    async fn feedback(&self, id: &str, feedback: FeedbackType) -> Result<(), SyncError> {
        self.post_command(
            &format!("/api/incidents/{}/feedback", id),
            serde_json::json!({ "feedbackType": feedback }),
        )
        .await
    }

    async fn dispatch(&self, id: &str, responder_id: &str) -> Result<(), SyncError> {
        self.post_command(
            &format!("/api/incidents/{}/dispatch", id),
            serde_json::json!({ "responderId": responder_id }),
        )
        .await
    }

    async fn ack_all(&self) -> Result<(), SyncError> {
        self.post_command("/api/incidents/ack-all", serde_json::json!({}))
            .await
    }
}

/// Validate a poll response: a non-array payload discards the whole batch,
/// a malformed record discards only that record.
fn parse_incident_list(payload: serde_json::Value) -> Result<Vec<Incident>, SyncError> {
    let items = match payload {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(SyncError::Parse(format!(
                "expected incident array, got {}",
                value_kind(&other)
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<Incident>(item) {
            Ok(record) if !record.id.is_empty() => records.push(record),
            Ok(_) => log::warn!("poll record with empty id discarded"),
            Err(e) => log::warn!("malformed poll record discarded: {}", e),
        }
    }
    Ok(records)
}

fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

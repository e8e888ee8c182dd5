use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The wire shape of `POST /events`. `kind` is a bare string here (not
/// [`eventflow_core::EventKind`]) so an unrecognized kind produces a
/// [`eventflow_core::StructuralError::UnrecognizedKind`] with the offending
/// value, rather than an opaque serde deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRequest {
    pub kind: String,
    #[serde(default)]
    pub fingerprint: Option<Uuid>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default = "serde_json::Value::default")]
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedResponse {
    pub fingerprint: Uuid,
    pub status: &'static str,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueStatsResponse {
    pub queue_length: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceDescriptor {
    pub service: &'static str,
    pub version: &'static str,
}

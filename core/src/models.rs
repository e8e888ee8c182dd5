use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The enumerated set of recognized event kinds. `custom` is the catch-all
/// for anything that doesn't warrant its own variant yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Purchase,
    UserSignup,
    PageView,
    Custom,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Purchase => "purchase",
            EventKind::UserSignup => "user_signup",
            EventKind::PageView => "page_view",
            EventKind::Custom => "custom",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structurally-validated, in-flight submission carried from the
/// ingestion handler through the queue payload to the worker processor.
///
/// `properties` stays an opaque `serde_json::Value` blob (a schemaless map)
/// rather than a tagged-variant-per-kind payload: kinds are open-ended via
/// the `custom` catch-all, so kind-specific shape is validated lazily in the
/// worker's VALIDATE/ENRICH steps rather than encoded in the type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSubmission {
    pub kind: EventKind,
    pub fingerprint: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    #[serde(default = "serde_json::Value::default")]
    pub properties: serde_json::Value,
}

impl EventSubmission {
    /// The correlation id is defined as equal to the fingerprint.
    pub fn correlation_id(&self) -> Uuid {
        self.fingerprint
    }
}

/// Audit record of every accepted submission. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RawRecord {
    pub id: Uuid,
    pub fingerprint: Uuid,
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

/// Terminal success record. Unique on fingerprint; never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcessedRecord {
    pub id: Uuid,
    pub fingerprint: Uuid,
    pub kind: String,
    pub subject_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub properties: serde_json::Value,
    pub processed_at: DateTime<Utc>,
    pub status: String,
    pub enrichment: serde_json::Value,
    pub retry_count: i32,
}

/// Terminal failure record (DLQ). Fingerprint is NOT unique — a repeat
/// attempt for the same fingerprint may append another row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FailedRecord {
    pub id: Uuid,
    pub fingerprint: Uuid,
    pub payload: serde_json::Value,
    pub error_message: String,
    pub failed_at: DateTime<Utc>,
    pub retry_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_round_trips_through_json() {
        for kind in [
            EventKind::Purchase,
            EventKind::UserSignup,
            EventKind::PageView,
            EventKind::Custom,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: EventKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn correlation_id_equals_fingerprint() {
        let submission = EventSubmission {
            kind: EventKind::PageView,
            fingerprint: Uuid::nil(),
            subject_id: None,
            occurred_at: Utc::now(),
            properties: serde_json::json!({}),
        };
        assert_eq!(submission.correlation_id(), submission.fingerprint);
    }
}

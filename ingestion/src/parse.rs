use chrono::Utc;
use eventflow_core::{EventKind, EventSubmission, StructuralError};
use uuid::Uuid;

use crate::models::EventRequest;

/// Structural validation: assigns a fingerprint if absent, defaults
/// `occurred_at` to server time, and rejects an unrecognized `kind` before
/// any durable write happens. Synchronous and pure — no I/O, no awaits.
pub fn parse_submission(req: EventRequest) -> Result<EventSubmission, StructuralError> {
    let kind = match req.kind.as_str() {
        "purchase" => EventKind::Purchase,
        "user_signup" => EventKind::UserSignup,
        "page_view" => EventKind::PageView,
        "custom" => EventKind::Custom,
        other => return Err(StructuralError::UnrecognizedKind(other.to_string())),
    };

    Ok(EventSubmission {
        kind,
        fingerprint: req.fingerprint.unwrap_or_else(Uuid::new_v4),
        subject_id: req.subject_id,
        occurred_at: req.occurred_at.unwrap_or_else(Utc::now),
        properties: req.properties,
    })
}

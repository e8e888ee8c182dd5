use chrono::Utc;

use crate::models::{EventKind, EventSubmission};

/// Deterministic, non-I/O augmentation computed at the worker's ENRICH step:
/// processed-at timestamp, the processing worker's id, and kind-specific
/// tags. Pure over `submission` + config — any enrichment that could fail is
/// the caller's concern (treated as a PERSIST failure), not this function's.
pub fn enrich(submission: &EventSubmission, worker_id: &str, high_value_threshold: f64) -> serde_json::Value {
    let mut fields = serde_json::Map::new();
    fields.insert(
        "processed_at".to_string(),
        serde_json::Value::String(Utc::now().to_rfc3339()),
    );
    fields.insert("worker_id".to_string(), serde_json::Value::String(worker_id.to_string()));

    if let Some(tag) = tag_for(submission, high_value_threshold) {
        fields.insert("tag".to_string(), serde_json::Value::String(tag.to_string()));
    }

    serde_json::Value::Object(fields)
}

fn tag_for(submission: &EventSubmission, high_value_threshold: f64) -> Option<&'static str> {
    if submission.kind != EventKind::Purchase {
        return None;
    }
    let amount = submission.properties.get("amount")?.as_f64()?;
    (amount >= high_value_threshold).then_some("high_value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn submission(amount: f64) -> EventSubmission {
        EventSubmission {
            kind: EventKind::Purchase,
            fingerprint: Uuid::new_v4(),
            subject_id: Some("u1".to_string()),
            occurred_at: Utc::now(),
            properties: serde_json::json!({"amount": amount, "product": "W"}),
        }
    }

    #[test]
    fn tags_purchase_above_threshold_as_high_value() {
        let enrichment = enrich(&submission(5000.0), "worker-1", 1000.0);
        assert_eq!(enrichment["tag"], "high_value");
    }

    #[test]
    fn does_not_tag_purchase_below_threshold() {
        let enrichment = enrich(&submission(99.99), "worker-1", 1000.0);
        assert!(enrichment.get("tag").is_none());
    }

    #[test]
    fn always_sets_worker_id_and_processed_at() {
        let enrichment = enrich(&submission(1.0), "worker-2", 1000.0);
        assert_eq!(enrichment["worker_id"], "worker-2");
        assert!(enrichment.get("processed_at").is_some());
    }

    #[test]
    fn non_purchase_kinds_are_never_tagged() {
        let mut s = submission(9999.0);
        s.kind = EventKind::PageView;
        let enrichment = enrich(&s, "worker-1", 1000.0);
        assert!(enrichment.get("tag").is_none());
    }
}

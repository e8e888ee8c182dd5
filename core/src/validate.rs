use crate::error::ValidationError;
use crate::models::{EventKind, EventSubmission};

/// Applies per-kind business rules at the worker's VALIDATE step. Mirrors
/// the two required examples from the spec body exactly; `page_view` and
/// `custom` carry no additional constraints today.
pub fn validate(submission: &EventSubmission) -> Result<(), ValidationError> {
    match submission.kind {
        EventKind::Purchase => {
            let amount = submission
                .properties
                .get("amount")
                .and_then(|v| v.as_f64());
            match amount {
                Some(a) if a > 0.0 => Ok(()),
                _ => Err(ValidationError::PurchaseMissingAmount),
            }
        }
        EventKind::UserSignup => match submission.subject_id.as_deref() {
            Some(s) if !s.trim().is_empty() => Ok(()),
            _ => Err(ValidationError::SignupMissingSubjectId),
        },
        EventKind::PageView | EventKind::Custom => Ok(()),
    }
}

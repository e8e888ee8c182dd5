use axum::http::StatusCode;
use eventflow_core::{StoreError, StructuralError};
use platform_http_contracts::{ApiError, ErrorBody};

/// Every failure mode `submit` can surface over HTTP, mapped onto a 4xx/5xx
/// split: structural failures never reach a durable write and are 400s;
/// everything after a passed validation is a 500 (store or queue).
pub enum IngestError {
    Structural(StructuralError),
    Store(StoreError),
    Queue(queue_adapter::QueueError),
}

impl From<StructuralError> for IngestError {
    fn from(e: StructuralError) -> Self {
        IngestError::Structural(e)
    }
}

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        IngestError::Store(e)
    }
}

impl From<queue_adapter::QueueError> for IngestError {
    fn from(e: queue_adapter::QueueError) -> Self {
        IngestError::Queue(e)
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Structural(e) => ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorBody::new("structural_error", e.to_string()),
            ),
            IngestError::Store(StoreError::UniqueViolation) => ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorBody::new(
                    "duplicate_fingerprint",
                    "an event with this fingerprint was already submitted",
                ),
            ),
            IngestError::Store(e) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("store_error", e.to_string()),
            ),
            IngestError::Queue(e) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("queue_error", e.to_string()),
            ),
        }
    }
}

impl axum::response::IntoResponse for IngestError {
    fn into_response(self) -> axum::response::Response {
        ApiError::from(self).into_response()
    }
}

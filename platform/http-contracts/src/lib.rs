//! Shared HTTP response shapes — pagination envelopes, field errors, and a
//! uniform error response — so every service binary in the workspace returns
//! the same JSON shape for the same class of failure.

use serde::Serialize;
use utoipa::ToSchema;

/// A single field-level validation complaint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// The uniform error body returned by every 4xx/5xx response in the
/// workspace: `{"error": {"code": "...", "message": "...", "fields": [...]}}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorDetail {
    /// Stable machine-readable code, e.g. `structural_error`, `store_unavailable`.
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<FieldError>,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                fields: Vec::new(),
            },
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldError>) -> Self {
        self.error.fields = fields;
        self
    }
}

#[cfg(feature = "axum")]
mod axum_support {
    use super::ErrorBody;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;

    /// Pairs an [`ErrorBody`] with the status code it should be served with.
    pub struct ApiError {
        pub status: StatusCode,
        pub body: ErrorBody,
    }

    impl ApiError {
        pub fn new(status: StatusCode, body: ErrorBody) -> Self {
            Self { status, body }
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            (self.status, Json(self.body)).into_response()
        }
    }
}

#[cfg(feature = "axum")]
pub use axum_support::ApiError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_omits_empty_fields() {
        let body = ErrorBody::new("structural_error", "missing kind");
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["error"]["fields"].as_array().is_none());
    }

    #[test]
    fn error_body_includes_fields_when_present() {
        let body = ErrorBody::new("structural_error", "invalid submission").with_fields(vec![
            FieldError {
                field: "kind".to_string(),
                message: "unrecognized kind".to_string(),
            },
        ]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"]["fields"][0]["field"], "kind");
    }
}

//! Shared health-check types and an axum response helper, used by every
//! service binary so `/health` endpoints report a consistent shape.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The health of one dependency (store, queue, ...).
#[derive(Debug, Clone, Serialize)]
pub struct ComponentStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentStatus {
    pub fn ok() -> Self {
        Self {
            healthy: true,
            detail: None,
        }
    }

    pub fn down(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            detail: Some(detail.into()),
        }
    }
}

/// A probe a service binary can run against one of its dependencies.
#[async_trait::async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> ComponentStatus;
}

/// The aggregate health report returned by `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub components: BTreeMap<String, ComponentStatus>,
    pub version: String,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    /// Builds a report from named component checks, deriving overall status
    /// ("healthy" only if every component is healthy).
    pub fn new(
        components: impl IntoIterator<Item = (String, ComponentStatus)>,
        version: impl Into<String>,
    ) -> Self {
        let components: BTreeMap<_, _> = components.into_iter().collect();
        let status = if components.values().all(|c| c.healthy) {
            "healthy"
        } else {
            "degraded"
        };
        Self {
            status,
            components,
            version: version.into(),
            checked_at: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Converts a [`HealthReport`] into the `(status_code, Json)` pair the spec's
/// `/health` contract requires: 200 when every component is healthy, 503
/// otherwise.
pub fn into_response(report: HealthReport) -> (StatusCode, Json<HealthReport>) {
    let code = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_healthy_components_yield_200() {
        let report = HealthReport::new(
            [
                ("store".to_string(), ComponentStatus::ok()),
                ("queue".to_string(), ComponentStatus::ok()),
            ],
            "0.1.0",
        );
        let (code, _) = into_response(report);
        assert_eq!(code, StatusCode::OK);
    }

    #[test]
    fn one_unhealthy_component_yields_503() {
        let report = HealthReport::new(
            [
                ("store".to_string(), ComponentStatus::ok()),
                ("queue".to_string(), ComponentStatus::down("timeout")),
            ],
            "0.1.0",
        );
        let (code, _) = into_response(report);
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
    }
}

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use eventflow_core::repos::raw;
use health::{into_response, ComponentStatus, HealthCheck, HealthReport};
use tracing::Instrument;

use crate::error::IngestError;
use crate::models::{AcceptedResponse, EventRequest, QueueStatsResponse, ServiceDescriptor};
use crate::parse::parse_submission;
use crate::state::AppState;

/// `POST /events` — the ingestion service's one durable-write path.
///
/// 1. Structural validation (synchronous, pure, no writes).
/// 2. Insert the raw audit record. Failure here (including a fingerprint the
///    caller already submitted) is a client error and the event is NOT
///    enqueued.
/// 3. Enqueue a `QueueEntry` carrying the serialized submission. A failure
///    here is a server error even though the raw record is already
///    committed — an accepted, tolerable orphan per the error design (§7).
/// 4. Respond "accepted" without waiting on worker processing.
pub async fn submit_event(
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> Result<(axum::http::StatusCode, Json<AcceptedResponse>), IngestError> {
    let submission = parse_submission(req)?;
    let fingerprint = submission.fingerprint;

    let span = tracing::info_span!(
        "submit_event",
        fingerprint = %fingerprint,
        kind = %submission.kind,
    );

    async move {
        let payload = serde_json::to_value(&submission).map_err(|e| {
            eventflow_core::StructuralError::MalformedField {
                field: "properties",
                reason: e.to_string(),
            }
        })?;

        let raw_record = raw::insert_raw(&state.pool, fingerprint, &payload, Utc::now()).await?;

        let publish_result = state.queue.publish(payload.to_string().into_bytes()).await;
        if let Err(e) = &publish_result {
            tracing::error!(fingerprint = %fingerprint, error = %e, "enqueue failed after raw insert committed");
        }
        let _entry_id = publish_result?;

        state
            .metrics
            .events_received_total
            .with_label_values(&[submission.kind.as_str()])
            .inc();

        tracing::info!(fingerprint = %fingerprint, "event accepted");

        Ok((
            axum::http::StatusCode::ACCEPTED,
            Json(AcceptedResponse {
                fingerprint,
                status: "accepted",
                received_at: raw_record.received_at,
            }),
        ))
    }
    .instrument(span)
    .await
}

struct StorePing(sqlx::PgPool);

#[async_trait::async_trait]
impl HealthCheck for StorePing {
    async fn check(&self) -> ComponentStatus {
        match sqlx::query("SELECT 1").execute(&self.0).await {
            Ok(_) => ComponentStatus::ok(),
            Err(e) => ComponentStatus::down(e.to_string()),
        }
    }
}

struct QueuePing(Arc<dyn queue_adapter::QueueAdapter>);

#[async_trait::async_trait]
impl HealthCheck for QueuePing {
    async fn check(&self) -> ComponentStatus {
        match self.0.length().await {
            Ok(_) => ComponentStatus::ok(),
            Err(e) => ComponentStatus::down(e.to_string()),
        }
    }
}

/// `GET /health` — probes both dependencies independently; 503 if either is
/// unhealthy.
pub async fn health(
    State(state): State<AppState>,
) -> (axum::http::StatusCode, Json<HealthReport>) {
    let store = StorePing(state.pool.clone());
    let queue = QueuePing(state.queue.clone());

    let report = HealthReport::new(
        [
            ("store".to_string(), store.check().await),
            ("queue".to_string(), queue.check().await),
        ],
        env!("CARGO_PKG_VERSION"),
    );

    into_response(report)
}

/// `GET /metrics/summary` — current queue length and pending-entry count.
pub async fn queue_stats(
    State(state): State<AppState>,
) -> Result<Json<QueueStatsResponse>, IngestError> {
    let queue_length = state.queue.length().await?;
    let pending = state
        .queue
        .pending_count(&state.config.shared.consumer_group)
        .await?;
    Ok(Json(QueueStatsResponse {
        queue_length,
        pending,
    }))
}

/// `GET /` — service descriptor.
pub async fn root() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        service: "eventflow-ingestion",
        version: env!("CARGO_PKG_VERSION"),
    })
}

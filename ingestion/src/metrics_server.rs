//! Prometheus text-exposition server for `/metrics`, bound to a port
//! distinct from the main ingestion HTTP surface.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::get, Router};
use eventflow_core::Metrics;

#[derive(Clone)]
struct MetricsState {
    metrics: Arc<Metrics>,
}

async fn render(State(state): State<MetricsState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics error: {e}")),
    }
}

/// Serves the Prometheus registry on `port` until the process exits. Spawned
/// alongside the main ingestion router; failure to bind is fatal.
pub async fn serve(metrics: Arc<Metrics>, port: u16) -> Result<(), std::io::Error> {
    let app = Router::new()
        .route("/metrics", get(render))
        .with_state(MetricsState { metrics });

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "metrics server listening");
    axum::serve(listener, app).await
}

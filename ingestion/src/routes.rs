use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the ingestion HTTP surface: `POST /events`, `GET /health`,
/// `GET /metrics/summary`, `GET /`. Prometheus `/metrics` is
/// served separately on its own port — see `metrics_server`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", post(handlers::submit_event))
        .route("/health", get(handlers::health))
        .route("/metrics/summary", get(handlers::queue_stats))
        .route("/", get(handlers::root))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

mod config;
mod error;
mod handlers;
mod metrics_server;
mod models;
mod parse;
mod routes;
mod state;

use std::sync::Arc;

use eventflow_core::db;
use eventflow_core::Metrics;
use queue_adapter::{QueueAdapter, RedisStreamsQueue};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.shared.store_url, 0).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("migrations applied");

    let queue = RedisStreamsQueue::connect(&config.shared.queue_url, &config.shared.stream_name)
        .await?;
    queue.ensure_group(&config.shared.consumer_group).await?;
    let queue: Arc<dyn QueueAdapter> = Arc::new(queue);

    let metrics = Arc::new(Metrics::new());

    let metrics_port = config.shared.metrics_port;
    let metrics_for_server = metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = metrics_server::serve(metrics_for_server, metrics_port).await {
            tracing::error!(error = %e, "metrics server exited");
        }
    });

    let state = AppState {
        pool,
        queue,
        metrics,
        config: config.clone(),
    };

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "ingestion service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Waits for either Ctrl-C or SIGTERM so the ingestion HTTP listener stops
/// accepting new connections and in-flight requests drain before exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

use std::sync::Arc;

use eventflow_core::db;
use eventflow_core::Metrics;
use futures::future::join_all;
use queue_adapter::retry::RetryConfig;
use queue_adapter::{QueueAdapter, RedisStreamsQueue};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worker::config::Config;
use worker::consumer::{self, WorkerContext};
use worker::{metrics_sampler, metrics_server};

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

    let pool = db::create_pool(&config.shared.store_url, config.worker_count).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("migrations applied");

    let metrics = Arc::new(Metrics::new());

    let metrics_port = config.shared.metrics_port;
    let metrics_for_server = metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = metrics_server::serve(metrics_for_server, metrics_port).await {
            tracing::error!(error = %e, "metrics server exited");
        }
    });

    // One queue connection per worker (preferred per §5), each against the
    // same stream/consumer group.
    let mut queues: Vec<Arc<dyn QueueAdapter>> = Vec::with_capacity(config.worker_count as usize);
    for _ in 0..config.worker_count {
        let queue =
            RedisStreamsQueue::connect(&config.shared.queue_url, &config.shared.stream_name).await?;
        queues.push(Arc::new(queue));
    }
    queues[0].ensure_group(&config.shared.consumer_group).await?;

    tokio::spawn(metrics_sampler::run(
        queues[0].clone(),
        metrics.clone(),
        config.shared.consumer_group.clone(),
    ));

    let retry_config = RetryConfig {
        max_attempts: config.shared.max_retries,
        initial_backoff: config.shared.retry_base,
        max_backoff: config.shared.retry_max,
    };

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut handles = Vec::with_capacity(config.worker_count as usize);

    for (ordinal, queue) in (1..=config.worker_count).zip(queues) {
        let ctx = WorkerContext {
            pool: pool.clone(),
            queue,
            metrics: metrics.clone(),
            worker_id: config.worker_id(ordinal),
            stream_consumer_group: config.shared.consumer_group.clone(),
            idle_reclaim: config.shared.idle_reclaim,
            block_timeout: config.shared.block_timeout,
            high_value_threshold: config.shared.high_value_threshold,
            retry_config: retry_config.clone(),
        };
        let shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(consumer::run(ctx, shutdown_rx)));
    }

    tracing::info!(worker_count = config.worker_count, "worker pool started");

    shutdown_signal().await;
    tracing::info!("shutdown signal received, draining in-flight entries");
    let _ = shutdown_tx.send(());

    if tokio::time::timeout(config.shutdown_deadline, join_all(handles))
        .await
        .is_err()
    {
        tracing::warn!(
            deadline_s = config.shutdown_deadline.as_secs(),
            "shutdown deadline exceeded, abandoning in-flight entries to reclaim-stale"
        );
    }

    Ok(())
}

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
}

//! The per-worker consume/process/ack loop (spec §4.2 recovery policy,
//! §5 suspension points and graceful shutdown).

use std::sync::Arc;
use std::time::Duration;

use eventflow_core::models::EventSubmission;
use eventflow_core::Metrics;
use queue_adapter::retry::RetryConfig;
use queue_adapter::{QueueAdapter, QueueEntry};
use sqlx::PgPool;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::processor::{self, Outcome};

/// Maximum entries pulled per `consume`/`reclaim-stale` call. Not spec-
/// mandated; bounded so a single cycle can't starve the shutdown check.
const MAX_BATCH: usize = 10;

#[derive(Clone)]
pub struct WorkerContext {
    pub pool: PgPool,
    pub queue: Arc<dyn QueueAdapter>,
    pub metrics: Arc<Metrics>,
    pub worker_id: String,
    pub stream_consumer_group: String,
    pub idle_reclaim: Duration,
    pub block_timeout: Duration,
    pub high_value_threshold: f64,
    pub retry_config: RetryConfig,
}

/// Runs one worker's receive-process-ack loop until `shutdown_rx` fires.
///
/// Every cycle: reclaim-stale first (the sole mechanism recovering entries
/// orphaned by a crashed worker between PERSIST and ACK), then consume fresh
/// entries, process each to a terminal outcome, and ack unconditionally.
/// `consume`'s block timeout bounds how long a cycle can run so the shutdown
/// flag is never starved.
pub async fn run(ctx: WorkerContext, mut shutdown_rx: broadcast::Receiver<()>) {
    ctx.metrics.active_workers.inc();
    tracing::info!(worker_id = %ctx.worker_id, "worker started");

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let reclaimed = ctx
            .queue
            .reclaim_stale(
                &ctx.stream_consumer_group,
                &ctx.worker_id,
                ctx.idle_reclaim,
                MAX_BATCH,
            )
            .await;
        let reclaimed = match reclaimed {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(worker_id = %ctx.worker_id, error = %e, "reclaim-stale failed, continuing");
                Vec::new()
            }
        };

        let fresh = ctx
            .queue
            .consume(
                &ctx.stream_consumer_group,
                &ctx.worker_id,
                MAX_BATCH,
                ctx.block_timeout,
            )
            .await;
        let fresh = match fresh {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(worker_id = %ctx.worker_id, error = %e, "consume failed, continuing");
                Vec::new()
            }
        };

        for entry in reclaimed.into_iter().chain(fresh) {
            process_one(&ctx, entry).await;
        }
    }

    ctx.metrics.active_workers.dec();
    tracing::info!(worker_id = %ctx.worker_id, "worker stopped");
}

async fn process_one(ctx: &WorkerContext, entry: QueueEntry) {
    let submission: EventSubmission = match serde_json::from_slice(&entry.payload) {
        Ok(s) => s,
        Err(e) => {
            // A malformed payload can never become a valid submission; there
            // is no fingerprint to key a dead-letter row on, so it is logged
            // and acked rather than retried forever.
            tracing::error!(entry_id = %entry.entry_id, error = %e, "undeserializable queue payload, acking and dropping");
            let _ = ctx.queue.ack(&ctx.stream_consumer_group, &entry.entry_id).await;
            return;
        }
    };

    let fingerprint = submission.fingerprint;
    let kind = submission.kind;
    let span = tracing::info_span!(
        "process_entry",
        fingerprint = %fingerprint,
        worker_id = %ctx.worker_id,
        kind = %kind,
    );

    async {
        let raw_payload = serde_json::to_value(&submission).unwrap_or(serde_json::Value::Null);

        let outcome = processor::process_entry(
            &ctx.pool,
            &ctx.metrics,
            &ctx.retry_config,
            &ctx.worker_id,
            ctx.high_value_threshold,
            submission,
            &raw_payload,
        )
        .await;

        match &outcome {
            Outcome::Duplicate => tracing::info!("duplicate"),
            Outcome::Processed(_) => tracing::info!("processed"),
            Outcome::Rejected(r) => tracing::info!(error = %r.error_message, "rejected"),
            Outcome::DeadLetter(r) => tracing::info!(error = %r.error_message, "dead-lettered"),
        }

        // ACK is unconditional and best-effort: at-least-once redelivery safely
        // re-observes the now-present processed/failed row on a retry (§4.3, §7).
        if let Err(e) = ctx.queue.ack(&ctx.stream_consumer_group, &entry.entry_id).await {
            tracing::warn!(fingerprint = %fingerprint, error = %e, "ack failed, relying on redelivery");
        }
    }
    .instrument(span)
    .await;
}

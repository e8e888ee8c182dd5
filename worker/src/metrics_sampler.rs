//! Periodically samples `queue_depth` and `pending_messages` into the shared
//! registry (spec §9 Open Question: sampled on a fixed interval rather than
//! per-request, since no scrape cadence is prescribed).

use std::sync::Arc;
use std::time::Duration;

use eventflow_core::Metrics;
use queue_adapter::QueueAdapter;

const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// Runs until the process exits — there is no graceful-shutdown requirement
/// on this task since it only ever reads, never holds a queue entry.
pub async fn run(queue: Arc<dyn QueueAdapter>, metrics: Arc<Metrics>, consumer_group: String) {
    let mut interval = tokio::time::interval(SAMPLE_INTERVAL);
    loop {
        interval.tick().await;

        match queue.length().await {
            Ok(len) => metrics.queue_depth.set(len),
            Err(e) => tracing::warn!(error = %e, "queue length sample failed"),
        }

        match queue.pending_count(&consumer_group).await {
            Ok(pending) => metrics.pending_messages.set(pending),
            Err(e) => tracing::warn!(error = %e, "pending-count sample failed"),
        }
    }
}

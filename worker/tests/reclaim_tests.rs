//! Scenario 5 (§8): a worker that persists successfully but crashes before
//! acking leaves its entry pending; `reclaim-stale` hands it to another
//! worker once it has been idle past the threshold, which observes the
//! already-committed `ProcessedRecord` as a duplicate and acks.

mod common;

use std::time::Duration;

use chrono::Utc;
use eventflow_core::models::{EventKind, EventSubmission};
use eventflow_core::Metrics;
use queue_adapter::retry::RetryConfig;
use queue_adapter::{InMemoryQueue, QueueAdapter};
use serial_test::serial;
use uuid::Uuid;
use worker::processor::{process_entry, Outcome};

#[tokio::test]
#[serial]
async fn crashed_worker_entry_is_reclaimed_and_observed_as_duplicate() {
    let pool = common::setup_test_db().await;
    common::cleanup(&pool).await;

    let queue = InMemoryQueue::new();
    let group = "event_processors";
    queue.ensure_group(group).await.unwrap();

    let fingerprint = Uuid::new_v4();
    let submission = EventSubmission {
        kind: EventKind::PageView,
        fingerprint,
        subject_id: Some("u1".to_string()),
        occurred_at: Utc::now(),
        properties: serde_json::json!({"page": "/"}),
    };
    let payload = serde_json::to_vec(&submission).unwrap();
    queue.publish(payload).await.unwrap();

    // Worker A consumes and successfully persists, but crashes before ack —
    // the entry stays in the group's pending set.
    let entries = queue
        .consume(group, "worker-a", 10, Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);

    let metrics = Metrics::new();
    let retry_config = RetryConfig::default();
    let raw_payload = serde_json::to_value(&submission).unwrap();
    let outcome_a = process_entry(
        &pool,
        &metrics,
        &retry_config,
        "worker-a",
        1000.0,
        submission.clone(),
        &raw_payload,
    )
    .await;
    assert!(matches!(outcome_a, Outcome::Processed(_)));
    // Deliberately no ack — simulating the crash.

    assert_eq!(queue.pending_count(group).await.unwrap(), 1);

    // Past the idle threshold, worker B reclaims the same entry.
    let reclaimed = queue
        .reclaim_stale(group, "worker-b", Duration::from_millis(0), 10)
        .await
        .unwrap();
    assert_eq!(reclaimed.len(), 1);

    let outcome_b = process_entry(
        &pool,
        &metrics,
        &retry_config,
        "worker-b",
        1000.0,
        submission,
        &raw_payload,
    )
    .await;
    assert!(matches!(outcome_b, Outcome::Duplicate));

    queue.ack(group, &reclaimed[0].entry_id).await.unwrap();
    assert_eq!(queue.pending_count(group).await.unwrap(), 0);

    let processed_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM processed_events WHERE fingerprint = $1")
            .bind(fingerprint)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(processed_count, 1);

    assert_eq!(
        metrics
            .events_duplicate_total
            .with_label_values(&["page_view"])
            .get(),
        1
    );
}

//! Integration tests for the worker processing state machine against a real
//! Postgres instance (spec §8 scenarios 1–4). Gated by `TEST_DATABASE_URL`
//! and `#[serial]` since every test shares one database.

mod common;

use chrono::Utc;
use eventflow_core::models::{EventKind, EventSubmission};
use eventflow_core::Metrics;
use queue_adapter::retry::RetryConfig;
use serial_test::serial;
use uuid::Uuid;
use worker::processor::{process_entry, Outcome};

fn submission(kind: EventKind, fingerprint: Uuid, subject_id: Option<&str>, properties: serde_json::Value) -> EventSubmission {
    EventSubmission {
        kind,
        fingerprint,
        subject_id: subject_id.map(str::to_string),
        occurred_at: Utc::now(),
        properties,
    }
}

/// Scenario 1: happy-path purchase is persisted as completed, untagged.
#[tokio::test]
#[serial]
async fn happy_path_purchase_is_processed() {
    let pool = common::setup_test_db().await;
    common::cleanup(&pool).await;

    let fingerprint = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
    let s = submission(
        EventKind::Purchase,
        fingerprint,
        Some("u1"),
        serde_json::json!({"amount": 99.99, "product": "W"}),
    );
    let payload = serde_json::to_value(&s).unwrap();
    let metrics = Metrics::new();
    let retry_config = RetryConfig::default();

    let outcome = process_entry(&pool, &metrics, &retry_config, "worker-1", 1000.0, s, &payload).await;

    match outcome {
        Outcome::Processed(record) => {
            assert_eq!(record.status, "completed");
            assert_eq!(record.enrichment["worker_id"], "worker-1");
            assert!(record.enrichment.get("tag").is_none());
            assert_eq!(record.retry_count, 0);
        }
        other => panic!("expected Processed, got {other:?}"),
    }

    let processed_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM processed_events WHERE fingerprint = $1")
            .bind(fingerprint)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(processed_count, 1);
}

/// Scenario 2: a purchase at or above the high-value threshold is tagged.
#[tokio::test]
#[serial]
async fn high_value_purchase_is_tagged() {
    let pool = common::setup_test_db().await;
    common::cleanup(&pool).await;

    let s = submission(
        EventKind::Purchase,
        Uuid::new_v4(),
        Some("u1"),
        serde_json::json!({"amount": 5000, "product": "W"}),
    );
    let payload = serde_json::to_value(&s).unwrap();
    let metrics = Metrics::new();
    let retry_config = RetryConfig::default();

    let outcome = process_entry(&pool, &metrics, &retry_config, "worker-1", 1000.0, s, &payload).await;

    match outcome {
        Outcome::Processed(record) => assert_eq!(record.enrichment["tag"], "high_value"),
        other => panic!("expected Processed, got {other:?}"),
    }
}

/// Scenario 3: a purchase missing `amount` is rejected — no retries, no
/// processed row, a failed row mentioning the missing field.
#[tokio::test]
#[serial]
async fn invalid_purchase_is_rejected_without_retry() {
    let pool = common::setup_test_db().await;
    common::cleanup(&pool).await;

    let fingerprint = Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap();
    let s = submission(EventKind::Purchase, fingerprint, Some("u1"), serde_json::json!({}));
    let payload = serde_json::to_value(&s).unwrap();
    let metrics = Metrics::new();
    let retry_config = RetryConfig::default();

    let outcome = process_entry(&pool, &metrics, &retry_config, "worker-1", 1000.0, s, &payload).await;

    match outcome {
        Outcome::Rejected(record) => {
            assert!(record.error_message.contains("amount"));
            assert_eq!(record.retry_count, 0);
        }
        other => panic!("expected Rejected, got {other:?}"),
    }

    let processed_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM processed_events WHERE fingerprint = $1")
            .bind(fingerprint)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(processed_count, 0);

    let failed_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM failed_events WHERE fingerprint = $1")
        .bind(fingerprint)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(failed_count, 1);
}

/// Scenario 4 / P1: a second delivery of an already-processed fingerprint is
/// suppressed — no second processed row, no failed row.
#[tokio::test]
#[serial]
async fn duplicate_delivery_after_success_is_suppressed() {
    let pool = common::setup_test_db().await;
    common::cleanup(&pool).await;

    let fingerprint = Uuid::new_v4();
    let properties = serde_json::json!({"amount": 42.0, "product": "W"});
    let first = submission(EventKind::Purchase, fingerprint, Some("u1"), properties.clone());
    let payload = serde_json::to_value(&first).unwrap();
    let metrics = Metrics::new();
    let retry_config = RetryConfig::default();

    let first_outcome =
        process_entry(&pool, &metrics, &retry_config, "worker-1", 1000.0, first, &payload).await;
    assert!(matches!(first_outcome, Outcome::Processed(_)));

    let second = submission(EventKind::Purchase, fingerprint, Some("u1"), properties);
    let second_payload = serde_json::to_value(&second).unwrap();
    let second_outcome = process_entry(
        &pool,
        &metrics,
        &retry_config,
        "worker-2",
        1000.0,
        second,
        &second_payload,
    )
    .await;
    assert!(matches!(second_outcome, Outcome::Duplicate));

    let processed_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM processed_events WHERE fingerprint = $1")
            .bind(fingerprint)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(processed_count, 1);
}

/// `user_signup` without a `subject_id` is rejected the same way a purchase
/// without `amount` is — both are VALIDATE-step failures, no retry.
#[tokio::test]
#[serial]
async fn signup_without_subject_id_is_rejected() {
    let pool = common::setup_test_db().await;
    common::cleanup(&pool).await;

    let s = submission(EventKind::UserSignup, Uuid::new_v4(), None, serde_json::json!({}));
    let payload = serde_json::to_value(&s).unwrap();
    let metrics = Metrics::new();
    let retry_config = RetryConfig::default();

    let outcome = process_entry(&pool, &metrics, &retry_config, "worker-1", 1000.0, s, &payload).await;

    match outcome {
        Outcome::Rejected(record) => assert!(record.error_message.contains("subject_id")),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

//! The per-entry processing state machine (spec §4.3): RECEIVED → dedup →
//! VALIDATE → ENRICH → PERSIST (with retry) → PROCESSED | DEAD_LETTER, or
//! RECEIVED → DUPLICATE, or VALIDATE → REJECTED. The caller acks the queue
//! entry after `process_entry` returns, regardless of outcome — acking is
//! unconditional on every terminal state per the acknowledgment invariant.

use eventflow_core::error::{PersistOutcome, StoreError};
use eventflow_core::models::{EventSubmission, FailedRecord, ProcessedRecord};
use eventflow_core::{enrich, repos, validate, Metrics};
use sqlx::PgPool;

use queue_adapter::retry::RetryConfig;

/// The terminal state a single entry lands in. `Duplicate` covers both the
/// RECEIVED-time dedup short-circuit and a race lost at PERSIST time — both
/// are observationally identical (no new write, ack, increment the counter).
#[derive(Debug)]
pub enum Outcome {
    Duplicate,
    Processed(ProcessedRecord),
    Rejected(FailedRecord),
    DeadLetter(FailedRecord),
}

/// Runs one entry through the full state machine. Never panics; every store
/// interaction is retried or downgraded to a dead-letter write rather than
/// propagated as an error, since the caller's only remaining action either
/// way is to ack and move on to the next entry.
pub async fn process_entry(
    pool: &PgPool,
    metrics: &Metrics,
    retry_config: &RetryConfig,
    worker_id: &str,
    high_value_threshold: f64,
    submission: EventSubmission,
    raw_payload: &serde_json::Value,
) -> Outcome {
    let kind = submission.kind.as_str();
    let fingerprint = submission.fingerprint;
    let started_at = std::time::Instant::now();

    let outcome = process_entry_inner(
        pool,
        metrics,
        retry_config,
        worker_id,
        high_value_threshold,
        submission,
        raw_payload,
    )
    .await;

    let duration_label = match &outcome {
        Outcome::Duplicate => "duplicate",
        Outcome::Processed(_) => "processed",
        Outcome::Rejected(_) | Outcome::DeadLetter(_) => "dead_letter",
    };
    metrics
        .event_processing_duration_seconds
        .with_label_values(&[duration_label])
        .observe(started_at.elapsed().as_secs_f64());

    match &outcome {
        Outcome::Duplicate => {
            metrics.events_duplicate_total.with_label_values(&[kind]).inc();
            tracing::info!(%fingerprint, kind, "duplicate delivery suppressed");
        }
        Outcome::Processed(_) => {
            metrics.events_processed_total.with_label_values(&[kind]).inc();
        }
        Outcome::Rejected(_) => {
            metrics
                .events_failed_total
                .with_label_values(&["validation"])
                .inc();
        }
        Outcome::DeadLetter(_) => {
            metrics
                .events_failed_total
                .with_label_values(&["persist_exhausted"])
                .inc();
        }
    }

    outcome
}

async fn process_entry_inner(
    pool: &PgPool,
    metrics: &Metrics,
    retry_config: &RetryConfig,
    worker_id: &str,
    high_value_threshold: f64,
    submission: EventSubmission,
    raw_payload: &serde_json::Value,
) -> Outcome {
    // RECEIVED → dedup lookup.
    match repos::processed::exists_processed(pool, submission.fingerprint).await {
        Ok(true) => return Outcome::Duplicate,
        Ok(false) => {}
        Err(e) => {
            // A dedup-lookup failure is itself a transient store error; there
            // is no safe default other than treating the entry as not-yet-seen
            // and letting PERSIST's own unique-violation handling catch a true
            // duplicate. Log loudly since this masks a real outage.
            tracing::warn!(error = %e, "dedup lookup failed, proceeding as not-yet-seen");
        }
    }

    // VALIDATE.
    if let Err(validation_error) = validate::validate(&submission) {
        let failed = match repos::failed::insert_failed(
            pool,
            submission.fingerprint,
            raw_payload,
            &validation_error.to_string(),
            0,
        )
        .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, "failed to record validation rejection");
                synthetic_failed_record(submission.fingerprint, raw_payload, &validation_error.to_string(), 0)
            }
        };
        return Outcome::Rejected(failed);
    }

    // ENRICH — pure, infallible by construction; nothing here performs I/O.
    let enrichment = enrich::enrich(&submission, worker_id, high_value_threshold);

    // PERSIST, with retry for transient store errors only. A unique-violation
    // is reported by `insert_processed` as `PersistOutcome::Duplicate`, not an
    // `Err`, so it never enters the retry loop — it is a race lost against
    // another worker on the same fingerprint, observationally a duplicate.
    match persist_with_retry(pool, retry_config, &submission, &enrichment).await {
        PersistAttempt::Inserted(record) => Outcome::Processed(record),
        PersistAttempt::Duplicate => Outcome::Duplicate,
        PersistAttempt::Exhausted { last_error, attempts } => {
            let failed = match repos::failed::insert_failed(
                pool,
                submission.fingerprint,
                raw_payload,
                &last_error,
                attempts as i32,
            )
            .await
            {
                Ok(record) => record,
                Err(e) => {
                    tracing::error!(error = %e, "failed to record persist exhaustion");
                    synthetic_failed_record(submission.fingerprint, raw_payload, &last_error, attempts as i32)
                }
            };
            Outcome::DeadLetter(failed)
        }
    }
}

enum PersistAttempt {
    Inserted(ProcessedRecord),
    Duplicate,
    Exhausted { last_error: String, attempts: u32 },
}

/// Each attempt runs in its own transaction (spec §4.3). Backoff is
/// 2s/4s/8s, capped at 10s, bounded at `retry_config.max_attempts` (3)
/// total attempts including the first.
async fn persist_with_retry(
    pool: &PgPool,
    retry_config: &RetryConfig,
    submission: &EventSubmission,
    enrichment: &serde_json::Value,
) -> PersistAttempt {
    let mut attempt = 0u32;
    let mut backoff = retry_config.initial_backoff;
    let mut last_error = String::new();

    loop {
        attempt += 1;

        let outcome = persist_once(pool, submission, enrichment, (attempt - 1) as i32).await;
        match outcome {
            Ok(PersistOutcome::Inserted(record)) => return PersistAttempt::Inserted(record),
            Ok(PersistOutcome::Duplicate) => return PersistAttempt::Duplicate,
            Err(StoreError::UniqueViolation) => return PersistAttempt::Duplicate,
            Err(StoreError::Transient(msg)) => {
                last_error = msg;
                if attempt >= retry_config.max_attempts {
                    return PersistAttempt::Exhausted {
                        last_error,
                        attempts: attempt,
                    };
                }
                tracing::warn!(
                    fingerprint = %submission.fingerprint,
                    attempt,
                    backoff_ms = backoff.as_millis(),
                    error = %last_error,
                    "persist attempt failed, retrying after backoff"
                );
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, retry_config.max_backoff);
            }
        }
    }
}

async fn persist_once(
    pool: &PgPool,
    submission: &EventSubmission,
    enrichment: &serde_json::Value,
    retry_count: i32,
) -> Result<PersistOutcome<ProcessedRecord>, StoreError> {
    let mut tx = pool.begin().await.map_err(StoreError::from_sqlx)?;

    let result = repos::processed::insert_processed(
        &mut tx,
        submission.fingerprint,
        submission.kind.as_str(),
        submission.subject_id.as_deref(),
        submission.occurred_at,
        &submission.properties,
        enrichment,
        retry_count,
    )
    .await?;

    match &result {
        PersistOutcome::Inserted(_) => {
            tx.commit().await.map_err(StoreError::from_sqlx)?;
        }
        PersistOutcome::Duplicate => {
            // Nothing was written; rolling back (vs. committing a no-op) is
            // cosmetic but avoids holding the transaction open needlessly.
            let _ = tx.rollback().await;
        }
    }

    Ok(result)
}

/// Used only when the store is unavailable for the *failed_events* write
/// itself (a dead-lettered or rejected event that can't even be recorded).
/// Keeps the in-memory `Outcome` shape consistent for the caller (metrics,
/// logging) without a second store round-trip once one has already failed;
/// it is never persisted.
fn synthetic_failed_record(
    fingerprint: uuid::Uuid,
    payload: &serde_json::Value,
    error_message: &str,
    retry_count: i32,
) -> FailedRecord {
    FailedRecord {
        id: uuid::Uuid::nil(),
        fingerprint,
        payload: payload.clone(),
        error_message: error_message.to_string(),
        failed_at: chrono::Utc::now(),
        retry_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_failed_record_carries_the_given_fields() {
        let fingerprint = uuid::Uuid::new_v4();
        let payload = serde_json::json!({"kind": "purchase"});
        let record = synthetic_failed_record(fingerprint, &payload, "store unavailable", 2);
        assert_eq!(record.fingerprint, fingerprint);
        assert_eq!(record.error_message, "store unavailable");
        assert_eq!(record.retry_count, 2);
        assert_eq!(record.payload, payload);
    }

    #[test]
    fn retry_config_default_matches_spec_backoff_window() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_backoff, std::time::Duration::from_secs(2));
        assert_eq!(config.max_backoff, std::time::Duration::from_secs(10));
    }
}

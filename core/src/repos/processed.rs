use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{PersistOutcome, StoreError};
use crate::models::ProcessedRecord;

/// Point lookup on the unique index — the dedup check at the top of the
/// worker state machine.
pub async fn exists_processed(pool: &PgPool, fingerprint: Uuid) -> Result<bool, StoreError> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM processed_events WHERE fingerprint = $1)",
    )
    .bind(fingerprint)
    .fetch_one(pool)
    .await
    .map_err(StoreError::from_sqlx)
}

/// Inserts the terminal success record inside `tx` (each PERSIST attempt
/// runs in a fresh transaction). A unique-constraint violation means another
/// worker won the race on this fingerprint — reported as
/// [`PersistOutcome::Duplicate`] rather than an error so the caller acks
/// instead of retrying.
#[allow(clippy::too_many_arguments)]
pub async fn insert_processed(
    tx: &mut Transaction<'_, Postgres>,
    fingerprint: Uuid,
    kind: &str,
    subject_id: Option<&str>,
    occurred_at: chrono::DateTime<chrono::Utc>,
    properties: &serde_json::Value,
    enrichment: &serde_json::Value,
    retry_count: i32,
) -> Result<PersistOutcome<ProcessedRecord>, StoreError> {
    let result = sqlx::query_as::<_, ProcessedRecord>(
        r#"
        INSERT INTO processed_events
            (id, fingerprint, kind, subject_id, occurred_at, properties, processed_at, status, enrichment, retry_count)
        VALUES
            (gen_random_uuid(), $1, $2, $3, $4, $5, now(), 'completed', $6, $7)
        RETURNING id, fingerprint, kind, subject_id, occurred_at, properties, processed_at, status, enrichment, retry_count
        "#,
    )
    .bind(fingerprint)
    .bind(kind)
    .bind(subject_id)
    .bind(occurred_at)
    .bind(properties)
    .bind(enrichment)
    .bind(retry_count)
    .fetch_one(&mut **tx)
    .await;

    match result {
        Ok(record) => Ok(PersistOutcome::Inserted(record)),
        Err(err) => match StoreError::from_sqlx(err) {
            StoreError::UniqueViolation => Ok(PersistOutcome::Duplicate),
            transient => Err(transient),
        },
    }
}

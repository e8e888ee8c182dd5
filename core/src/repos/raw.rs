use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::RawRecord;

/// Inserts the audit record for a newly-accepted submission. Fails with
/// [`StoreError::UniqueViolation`] if `fingerprint` was already recorded —
/// the caller (ingestion) surfaces that as a client error and does not
/// enqueue.
pub async fn insert_raw(
    pool: &PgPool,
    fingerprint: Uuid,
    payload: &serde_json::Value,
    received_at: DateTime<Utc>,
) -> Result<RawRecord, StoreError> {
    sqlx::query_as::<_, RawRecord>(
        r#"
        INSERT INTO raw_events (id, fingerprint, payload, received_at)
        VALUES (gen_random_uuid(), $1, $2, $3)
        RETURNING id, fingerprint, payload, received_at
        "#,
    )
    .bind(fingerprint)
    .bind(payload)
    .bind(received_at)
    .fetch_one(pool)
    .await
    .map_err(StoreError::from_sqlx)
}

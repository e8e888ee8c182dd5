use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::FailedRecord;

/// Pure append — no uniqueness constraint. A repeat delivery of the same
/// fingerprint that fails again is expected to add another row.
pub async fn insert_failed(
    pool: &PgPool,
    fingerprint: Uuid,
    payload: &serde_json::Value,
    error_message: &str,
    retry_count: i32,
) -> Result<FailedRecord, StoreError> {
    sqlx::query_as::<_, FailedRecord>(
        r#"
        INSERT INTO failed_events (id, fingerprint, payload, error_message, failed_at, retry_count)
        VALUES (gen_random_uuid(), $1, $2, $3, now(), $4)
        RETURNING id, fingerprint, payload, error_message, failed_at, retry_count
        "#,
    )
    .bind(fingerprint)
    .bind(payload)
    .bind(error_message)
    .bind(retry_count)
    .fetch_one(pool)
    .await
    .map_err(StoreError::from_sqlx)
}

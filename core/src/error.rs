/// Raised synchronously and purely at ingestion, before any durable write.
#[derive(Debug, thiserror::Error)]
pub enum StructuralError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unrecognized kind: {0:?}")]
    UnrecognizedKind(String),

    #[error("malformed field {field}: {reason}")]
    MalformedField { field: &'static str, reason: String },
}

/// Kind-specific semantic rule violation detected at the worker VALIDATE
/// step. Always permanent — routed straight to the dead-letter queue.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("purchase requires a positive numeric amount")]
    PurchaseMissingAmount,

    #[error("user_signup requires a non-empty subject_id")]
    SignupMissingSubjectId,
}

/// Store-layer failure. `Transient` retries with backoff; `Unique` signals a
/// fingerprint collision the caller should treat as a race, not a failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable or timed out: {0}")]
    Transient(String),

    #[error("unique constraint violated")]
    UniqueViolation,
}

impl StoreError {
    /// Postgres SQLSTATE 23505 is a unique-constraint violation; every other
    /// `sqlx::Error` is treated as transient (connection loss, pool
    /// exhaustion, statement timeout) and eligible for retry.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::UniqueViolation;
            }
        }
        StoreError::Transient(err.to_string())
    }
}

/// Outcome of the worker's PERSIST step, distinguishing a genuine failure
/// from a lost race against another worker on the same fingerprint.
#[derive(Debug)]
pub enum PersistOutcome<T> {
    Inserted(T),
    Duplicate,
}

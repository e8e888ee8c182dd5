/// Errors that can occur when using a [`crate::QueueAdapter`].
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue connection error: {0}")]
    Connection(String),

    #[error("queue command failed: {0}")]
    Command(String),

    #[error("unexpected queue protocol reply: {0}")]
    Protocol(String),

    #[error("queue payload serialization error: {0}")]
    Serialization(String),
}

pub type QueueResult<T> = Result<T, QueueError>;

impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            QueueError::Connection(err.to_string())
        } else {
            QueueError::Command(err.to_string())
        }
    }
}

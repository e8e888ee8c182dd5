//! # Queue Adapter
//!
//! A consumer-group queue abstraction with per-consumer pending-entry
//! tracking and idle-based reclaim, matching the semantics of an
//! append-only log with server-assigned monotonic entry ids and
//! at-least-once delivery.
//!
//! ## Implementations
//!
//! - [`RedisStreamsQueue`] — production implementation over Redis Streams
//!   (`XADD`/`XGROUP`/`XREADGROUP`/`XAUTOCLAIM`/`XACK`/`XPENDING`/`XLEN`).
//! - [`InMemoryQueue`] — dev/test implementation with identical
//!   consumer-group semantics, no network dependency.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use queue_adapter::{InMemoryQueue, QueueAdapter};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = InMemoryQueue::new();
//! queue.ensure_group("event_processors").await?;
//! queue.publish(b"payload".to_vec()).await?;
//!
//! let entries = queue
//!     .consume("event_processors", "worker-1", 10, Duration::from_secs(5))
//!     .await?;
//! for entry in entries {
//!     queue.ack("event_processors", &entry.entry_id).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod in_memory;
mod redis_streams;
pub mod retry;

pub use error::{QueueError, QueueResult};
pub use in_memory::InMemoryQueue;
pub use redis_streams::RedisStreamsQueue;

use std::time::Duration;

use async_trait::async_trait;

/// One delivered (or reclaimed) entry and its opaque payload.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub entry_id: String,
    pub payload: Vec<u8>,
}

/// Uniform at-least-once consumer interface over an append-only stream with
/// consumer groups.
#[async_trait]
pub trait QueueAdapter: Send + Sync {
    /// Appends `payload` to the stream, returning the server-assigned entry id.
    async fn publish(&self, payload: Vec<u8>) -> QueueResult<String>;

    /// Idempotently creates `group` positioned at the current tail. A
    /// concurrently-created group must not surface as an error.
    async fn ensure_group(&self, group: &str) -> QueueResult<()>;

    /// Reads entries newly delivered to `consumer_id` within `group`,
    /// blocking up to `block` for at least one entry. Returns an empty list
    /// on timeout.
    async fn consume(
        &self,
        group: &str,
        consumer_id: &str,
        max_batch: usize,
        block: Duration,
    ) -> QueueResult<Vec<QueueEntry>>;

    /// Returns entries delivered to some consumer in `group` that have been
    /// pending longer than `idle_threshold`, reassigned to `consumer_id`.
    /// Ordering of returned entries is unspecified.
    async fn reclaim_stale(
        &self,
        group: &str,
        consumer_id: &str,
        idle_threshold: Duration,
        max_batch: usize,
    ) -> QueueResult<Vec<QueueEntry>>;

    /// Removes `entry_id` from `group`'s pending set. Idempotent on
    /// already-acked entries.
    async fn ack(&self, group: &str, entry_id: &str) -> QueueResult<()>;

    /// Count of entries delivered but not yet acknowledged within `group`.
    async fn pending_count(&self, group: &str) -> QueueResult<i64>;

    /// Total entries currently in the stream.
    async fn length(&self) -> QueueResult<i64>;
}

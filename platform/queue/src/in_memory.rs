use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{QueueError, QueueResult};
use crate::{QueueAdapter, QueueEntry};

struct Pending {
    consumer_id: String,
    delivered_at: Instant,
    payload: Vec<u8>,
}

struct GroupState {
    /// Index into `backlog` of the next entry this group hasn't yet delivered.
    cursor: usize,
    pending: HashMap<String, Pending>,
}

struct Inner {
    backlog: Vec<(String, Vec<u8>)>,
    groups: HashMap<String, GroupState>,
    next_id: u64,
}

/// Dev/test [`QueueAdapter`] that reproduces Redis Streams consumer-group
/// semantics (cursor-based delivery, per-consumer pending set, idle-based
/// reclaim) without a network dependency.
pub struct InMemoryQueue {
    inner: Mutex<Inner>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                backlog: Vec::new(),
                groups: HashMap::new(),
                next_id: 0,
            }),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[async_trait]
impl QueueAdapter for InMemoryQueue {
    async fn publish(&self, payload: Vec<u8>) -> QueueResult<String> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = format!("{}-0", inner.next_id);
        inner.backlog.push((id.clone(), payload));
        Ok(id)
    }

    async fn ensure_group(&self, group: &str) -> QueueResult<()> {
        let mut inner = self.inner.lock().await;
        let cursor = inner.backlog.len();
        inner.groups.entry(group.to_string()).or_insert(GroupState {
            cursor,
            pending: HashMap::new(),
        });
        Ok(())
    }

    async fn consume(
        &self,
        group: &str,
        consumer_id: &str,
        max_batch: usize,
        block: Duration,
    ) -> QueueResult<Vec<QueueEntry>> {
        let deadline = Instant::now() + block;
        loop {
            {
                let mut inner = self.inner.lock().await;
                let Inner {
                    backlog, groups, ..
                } = &mut *inner;
                let state = groups
                    .get_mut(group)
                    .ok_or_else(|| QueueError::Command(format!("NOGROUP: {group}")))?;

                let mut out = Vec::new();
                while out.len() < max_batch && state.cursor < backlog.len() {
                    let (id, payload) = backlog[state.cursor].clone();
                    state.pending.insert(
                        id.clone(),
                        Pending {
                            consumer_id: consumer_id.to_string(),
                            delivered_at: Instant::now(),
                            payload: payload.clone(),
                        },
                    );
                    out.push(QueueEntry {
                        entry_id: id,
                        payload,
                    });
                    state.cursor += 1;
                }
                if !out.is_empty() {
                    return Ok(out);
                }
            }

            if Instant::now() >= deadline {
                return Ok(Vec::new());
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now()))).await;
        }
    }

    async fn reclaim_stale(
        &self,
        group: &str,
        consumer_id: &str,
        idle_threshold: Duration,
        max_batch: usize,
    ) -> QueueResult<Vec<QueueEntry>> {
        let mut inner = self.inner.lock().await;
        let state = inner
            .groups
            .get_mut(group)
            .ok_or_else(|| QueueError::Command(format!("NOGROUP: {group}")))?;

        let stale_ids: Vec<String> = state
            .pending
            .iter()
            .filter(|(_, p)| p.delivered_at.elapsed() >= idle_threshold)
            .take(max_batch)
            .map(|(id, _)| id.clone())
            .collect();

        let mut out = Vec::new();
        for id in stale_ids {
            if let Some(p) = state.pending.get_mut(&id) {
                p.consumer_id = consumer_id.to_string();
                p.delivered_at = Instant::now();
                out.push(QueueEntry {
                    entry_id: id,
                    payload: p.payload.clone(),
                });
            }
        }
        Ok(out)
    }

    async fn ack(&self, group: &str, entry_id: &str) -> QueueResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(state) = inner.groups.get_mut(group) {
            state.pending.remove(entry_id);
        }
        Ok(())
    }

    async fn pending_count(&self, group: &str) -> QueueResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .groups
            .get(group)
            .map(|s| s.pending.len() as i64)
            .unwrap_or(0))
    }

    async fn length(&self) -> QueueResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner.backlog.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn consume_delivers_in_publish_order() {
        let q = InMemoryQueue::new();
        q.ensure_group("g").await.unwrap();
        q.publish(b"one".to_vec()).await.unwrap();
        q.publish(b"two".to_vec()).await.unwrap();

        let entries = q
            .consume("g", "c1", 10, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].payload, b"one");
        assert_eq!(entries[1].payload, b"two");
        assert_eq!(q.pending_count("g").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn ack_clears_pending_and_is_idempotent() {
        let q = InMemoryQueue::new();
        q.ensure_group("g").await.unwrap();
        q.publish(b"one".to_vec()).await.unwrap();
        let entries = q
            .consume("g", "c1", 10, Duration::from_millis(50))
            .await
            .unwrap();

        q.ack("g", &entries[0].entry_id).await.unwrap();
        assert_eq!(q.pending_count("g").await.unwrap(), 0);
        // Acking again must not error.
        q.ack("g", &entries[0].entry_id).await.unwrap();
    }

    #[tokio::test]
    async fn reclaim_stale_reassigns_idle_entries() {
        let q = InMemoryQueue::new();
        q.ensure_group("g").await.unwrap();
        q.publish(b"one".to_vec()).await.unwrap();
        q.consume("g", "c1", 10, Duration::from_millis(50))
            .await
            .unwrap();

        // Not idle yet.
        let reclaimed = q
            .reclaim_stale("g", "c2", Duration::from_secs(60), 10)
            .await
            .unwrap();
        assert!(reclaimed.is_empty());

        let reclaimed = q
            .reclaim_stale("g", "c2", Duration::from_millis(0), 10)
            .await
            .unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(q.pending_count("g").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn consume_times_out_with_no_new_entries() {
        let q = InMemoryQueue::new();
        q.ensure_group("g").await.unwrap();
        let entries = q
            .consume("g", "c1", 10, Duration::from_millis(30))
            .await
            .unwrap();
        assert!(entries.is_empty());
    }
}

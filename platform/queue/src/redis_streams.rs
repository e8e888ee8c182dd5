use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{from_redis_value, Value};

use crate::error::{QueueError, QueueResult};
use crate::{QueueAdapter, QueueEntry};

/// Production [`QueueAdapter`] backed by Redis Streams.
///
/// Consumer groups, pending-entry tracking and idle-reclaim map directly onto
/// `XGROUP`, `XREADGROUP`, `XAUTOCLAIM`, `XACK`, `XPENDING` and `XLEN`.
pub struct RedisStreamsQueue {
    conn: ConnectionManager,
    stream_name: String,
}

impl RedisStreamsQueue {
    pub async fn connect(redis_url: &str, stream_name: impl Into<String>) -> QueueResult<Self> {
        let client =
            redis::Client::open(redis_url).map_err(|e| QueueError::Connection(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(QueueError::from)?;
        Ok(Self {
            conn,
            stream_name: stream_name.into(),
        })
    }
}

#[async_trait]
impl QueueAdapter for RedisStreamsQueue {
    async fn publish(&self, payload: Vec<u8>) -> QueueResult<String> {
        let mut conn = self.conn.clone();
        let id: String = redis::cmd("XADD")
            .arg(&self.stream_name)
            .arg("*")
            .arg("payload")
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(QueueError::from)?;
        Ok(id)
    }

    async fn ensure_group(&self, group: &str) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream_name)
            .arg(group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => Ok(()),
            // A concurrently-created group is not an error — idempotent by contract.
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(QueueError::from(e)),
        }
    }

    async fn consume(
        &self,
        group: &str,
        consumer_id: &str,
        max_batch: usize,
        block: Duration,
    ) -> QueueResult<Vec<QueueEntry>> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(group)
            .arg(consumer_id)
            .arg("COUNT")
            .arg(max_batch)
            .arg("BLOCK")
            .arg(block.as_millis() as i64)
            .arg("STREAMS")
            .arg(&self.stream_name)
            .arg(">")
            .query_async(&mut conn)
            .await
            .map_err(QueueError::from)?;

        parse_xreadgroup_reply(reply)
    }

    async fn reclaim_stale(
        &self,
        group: &str,
        consumer_id: &str,
        idle_threshold: Duration,
        max_batch: usize,
    ) -> QueueResult<Vec<QueueEntry>> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("XAUTOCLAIM")
            .arg(&self.stream_name)
            .arg(group)
            .arg(consumer_id)
            .arg(idle_threshold.as_millis() as i64)
            .arg("0-0")
            .arg("COUNT")
            .arg(max_batch)
            .query_async(&mut conn)
            .await
            .map_err(QueueError::from)?;

        let mut top = match reply {
            Value::Bulk(v) => v,
            other => return Err(protocol_error("XAUTOCLAIM", &other)),
        };
        if top.len() < 2 {
            return Err(QueueError::Protocol(
                "XAUTOCLAIM reply had fewer than 2 elements".into(),
            ));
        }
        // [next-cursor, entries, (deleted-ids, Redis 7+ only)]
        let entries = top.remove(1);
        parse_entry_array(entries)
    }

    async fn ack(&self, group: &str, entry_id: &str) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("XACK")
            .arg(&self.stream_name)
            .arg(group)
            .arg(entry_id)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(QueueError::from)?;
        Ok(())
    }

    async fn pending_count(&self, group: &str) -> QueueResult<i64> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("XPENDING")
            .arg(&self.stream_name)
            .arg(group)
            .query_async(&mut conn)
            .await
            .map_err(QueueError::from)?;

        match reply {
            Value::Nil => Ok(0),
            Value::Bulk(fields) if !fields.is_empty() => {
                from_redis_value::<i64>(&fields[0]).map_err(QueueError::from)
            }
            other => Err(protocol_error("XPENDING", &other)),
        }
    }

    async fn length(&self) -> QueueResult<i64> {
        let mut conn = self.conn.clone();
        redis::cmd("XLEN")
            .arg(&self.stream_name)
            .query_async(&mut conn)
            .await
            .map_err(QueueError::from)
    }
}

fn protocol_error(command: &str, value: &Value) -> QueueError {
    QueueError::Protocol(format!("unexpected {command} reply: {value:?}"))
}

/// Parses an `XREADGROUP` reply: `[[stream_name, [[id, [field, value, ...]], ...]], ...]`.
fn parse_xreadgroup_reply(reply: Value) -> QueueResult<Vec<QueueEntry>> {
    let streams = match reply {
        Value::Nil => return Ok(Vec::new()),
        Value::Bulk(v) => v,
        other => return Err(protocol_error("XREADGROUP", &other)),
    };

    let mut out = Vec::new();
    for stream_entry in streams {
        let mut pair = match stream_entry {
            Value::Bulk(p) if p.len() == 2 => p,
            other => return Err(protocol_error("XREADGROUP stream entry", &other)),
        };
        let entries = pair.remove(1);
        out.extend(parse_entry_array(entries)?);
    }
    Ok(out)
}

/// Parses a bare entry array: `[[id, [field, value, ...]], ...]`.
fn parse_entry_array(value: Value) -> QueueResult<Vec<QueueEntry>> {
    let entries = match value {
        Value::Nil => return Ok(Vec::new()),
        Value::Bulk(v) => v,
        other => return Err(protocol_error("stream entry array", &other)),
    };

    let mut out = Vec::new();
    for entry in entries {
        let fields = match entry {
            Value::Bulk(f) if f.len() == 2 => f,
            // XAUTOCLAIM can report tombstoned ids with a nil field list.
            Value::Bulk(_) => continue,
            other => return Err(protocol_error("stream entry", &other)),
        };
        let entry_id: String = from_redis_value(&fields[0]).map_err(QueueError::from)?;
        let payload = extract_payload_field(&fields[1])?;
        out.push(QueueEntry { entry_id, payload });
    }
    Ok(out)
}

/// The field-value list is flat: `[name, value, name, value, ...]`.
fn extract_payload_field(value: &Value) -> QueueResult<Vec<u8>> {
    let kv = match value {
        Value::Bulk(kv) => kv,
        other => return Err(protocol_error("entry field list", other)),
    };

    let mut iter = kv.iter();
    while let (Some(key), Some(val)) = (iter.next(), iter.next()) {
        let key: String = from_redis_value(key).map_err(QueueError::from)?;
        if key == "payload" {
            return from_redis_value::<Vec<u8>>(val).map_err(QueueError::from);
        }
    }
    Err(QueueError::Protocol("entry missing payload field".into()))
}

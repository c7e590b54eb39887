//! Redis-backed implementation of [`DurableQueue`].
//!
//! The main list is a plain FIFO: `enqueue` does `RPUSH` (append to tail), `dequeue`
//! does a blocking `BLPOP` (pop from head), so Redis list index 0 is always the next
//! entry due out — consistent with the dead-letter list, which uses the same
//! convention.

use super::RedisKeys;
use crate::queue::{DurableQueue, QueueList};
use async_trait::async_trait;
use deadpool_redis::Pool;
use pipeline_core::{CorrelationId, DeadLetterEntry, JobId, PipelineError, QueueEntry, Result};
use pipeline_resilience::RetryPolicy;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, warn};

/// Redis-backed durable queue (C1).
pub struct RedisDurableQueue {
    pool: Pool,
    keys: RedisKeys,
    retry: RetryPolicy,
}

impl RedisDurableQueue {
    /// Creates a new durable queue over the given pool, with keys prefixed by
    /// `key_prefix`.
    #[must_use]
    pub fn new(pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            keys: RedisKeys::new(key_prefix),
            retry: RetryPolicy::default(),
        }
    }

    /// Gets a pooled connection, retrying transient pool/connection failures with
    /// the resilience crate's exponential backoff policy.
    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        self.retry
            .execute(|| async { self.pool.get().await.map_err(PipelineError::from) })
            .await
    }

    fn list_key(&self, list: QueueList) -> String {
        match list {
            QueueList::Main => self.keys.main(),
            QueueList::DeadLetter => self.keys.deadletter(),
        }
    }

    /// Scans a list, deserializing entries and skipping (with a warning) any that
    /// fail to parse as JSON — a corrupted dead-letter entry must never take down a
    /// range read.
    async fn scan(&self, list: QueueList) -> Result<Vec<QueueEntry>> {
        let mut conn = self.conn().await?;
        let raw: Vec<String> = conn.lrange(&self.list_key(list), 0, -1).await?;

        Ok(raw
            .into_iter()
            .filter_map(|json| match serde_json::from_str::<QueueEntry>(&json) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping corrupted queue entry");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl DurableQueue for RedisDurableQueue {
    async fn enqueue(&self, entry: QueueEntry) -> Result<()> {
        let mut conn = self.conn().await?;
        let json = serde_json::to_string(&entry)?;

        let _: () = conn.rpush(&self.keys.main(), &json).await?;

        debug!(job_id = %entry.job_id, title = %entry.title, "enqueued job");
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<QueueEntry>> {
        let mut conn = self.conn().await?;

        let result: Option<(String, String)> = conn
            .blpop(&self.keys.main(), timeout.as_secs_f64())
            .await?;

        let Some((_key, json)) = result else {
            return Ok(None);
        };

        match serde_json::from_str::<QueueEntry>(&json) {
            Ok(entry) => {
                debug!(job_id = %entry.job_id, "dequeued job");
                Ok(Some(entry))
            }
            Err(e) => Err(PipelineError::DataCorruption(format!(
                "dequeued entry is not valid JSON: {e}"
            ))),
        }
    }

    async fn length(&self, list: QueueList) -> Result<u64> {
        let mut conn = self.conn().await?;
        let len: u64 = conn.llen(&self.list_key(list)).await?;
        Ok(len)
    }

    async fn range(&self, list: QueueList, offset: usize, limit: usize) -> Result<Vec<QueueEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.conn().await?;
        let stop = offset as isize + limit as isize - 1;

        let raw: Vec<String> = conn
            .lrange(&self.list_key(list), offset as isize, stop)
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|json| serde_json::from_str::<QueueEntry>(&json).ok())
            .collect())
    }

    async fn remove_at(&self, list: QueueList, position: usize) -> Result<bool> {
        let mut conn = self.conn().await?;
        let key = self.list_key(list);

        let raw: Option<String> = conn.lindex(&key, position as isize).await?;
        let Some(json) = raw else {
            return Ok(false);
        };

        let removed: i64 = conn.lrem(&key, 1, &json).await?;
        Ok(removed > 0)
    }

    async fn move_to_deadletter(&self, entry: DeadLetterEntry) -> Result<()> {
        let mut conn = self.conn().await?;
        let main_key = self.keys.main();

        // Best-effort: pop the pre-failure form from the main list if it's still
        // there. If the caller already dequeued it, this is a no-op.
        let raw_main: Vec<String> = conn.lrange(&main_key, 0, -1).await?;
        if let Some(raw) = raw_main.into_iter().find(|json| {
            serde_json::from_str::<QueueEntry>(json)
                .map(|e| e.job_id == entry.entry.job_id)
                .unwrap_or(false)
        }) {
            let _: i64 = conn.lrem(&main_key, 1, &raw).await?;
        }

        let dlq_json = serde_json::to_string(&entry)?;
        let _: () = conn.rpush(&self.keys.deadletter(), &dlq_json).await?;

        warn!(
            job_id = %entry.entry.job_id,
            reason = %entry.error_reason,
            "moved job to dead-letter"
        );
        Ok(())
    }

    async fn clear(&self, list: QueueList) -> Result<u64> {
        let mut conn = self.conn().await?;
        let key = self.list_key(list);

        let len: u64 = conn.llen(&key).await?;
        let _: () = conn.del(&key).await?;
        Ok(len)
    }

    async fn find(&self, job_id: JobId) -> Result<Option<QueueEntry>> {
        for list in [QueueList::Main, QueueList::DeadLetter] {
            if let Some(entry) = self
                .scan(list)
                .await?
                .into_iter()
                .find(|e| e.job_id == job_id)
            {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    async fn find_by_correlation(&self, correlation_id: CorrelationId) -> Result<Vec<QueueEntry>> {
        let mut found = Vec::new();
        for list in [QueueList::Main, QueueList::DeadLetter] {
            found.extend(
                self.scan(list)
                    .await?
                    .into_iter()
                    .filter(|e| e.correlation_id == correlation_id),
            );
        }
        Ok(found)
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }
}

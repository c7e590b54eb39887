//! Queue Manager (C12): paginated view and batch mutation of the main and
//! dead-letter lists.

use chrono::{DateTime, Utc};
use pipeline_core::{CorrelationId, DeadLetterEntry, Job, PipelineError, Result};
use pipeline_queue::{DurableQueue, QueueList};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

const OPERATION_HISTORY_LIMIT: usize = 100;

/// Which queue a C12 operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    Main,
    DeadLetter,
}

impl From<QueueKind> for QueueList {
    fn from(kind: QueueKind) -> Self {
        match kind {
            QueueKind::Main => QueueList::Main,
            QueueKind::DeadLetter => QueueList::DeadLetter,
        }
    }
}

/// `GET /api/queue/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub timestamp: DateTime<Utc>,
    pub main_length: u64,
    pub deadletter_length: u64,
    pub oldest_queued_at: Option<DateTime<Utc>>,
    pub newest_queued_at: Option<DateTime<Utc>>,
    pub health: String,
}

/// One page of `GET /api/queue/contents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuePage {
    pub offset: usize,
    pub total_returned: usize,
    pub entries: Vec<QueueItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub position: usize,
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub queued_at: DateTime<Utc>,
    pub retry_count: u32,
    pub correlation_id: String,
}

/// A batch mutation over a set of queue positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOp {
    Delete,
    Retry,
    MoveToMain,
    MoveToDeadletter,
    Clear,
}

/// `POST /api/queue/batch-operation` result, also appended to the operation
/// history ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOperationResult {
    pub operation: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// How to sort entries for [`QueueManager::reorder`].
#[derive(Debug, Clone)]
pub enum ReorderCriterion {
    Priority,
    RetryCount,
    QueuedAt,
    ExplicitPermutation(Vec<usize>),
}

/// Reads and mutates a [`DurableQueue`]'s main and dead-letter lists, keeping an
/// in-process history of the last [`OPERATION_HISTORY_LIMIT`] batch operations.
///
/// The history does not survive a restart: it exists for the operator dashboard's
/// "recent activity" view, not as an audit log.
pub struct QueueManager {
    queue: Arc<dyn DurableQueue>,
    operation_history: RwLock<VecDeque<BatchOperationResult>>,
}

impl QueueManager {
    #[must_use]
    pub fn new(queue: Arc<dyn DurableQueue>) -> Self {
        Self { queue, operation_history: RwLock::new(VecDeque::new()) }
    }

    /// `GET /api/queue/stats`.
    pub async fn stats(&self) -> Result<QueueStats> {
        let main_length = self.queue.length(QueueList::Main).await?;
        let deadletter_length = self.queue.length(QueueList::DeadLetter).await?;

        let oldest = self.queue.range(QueueList::Main, 0, 1).await?.into_iter().next();
        let newest = if main_length > 0 {
            self.queue.range(QueueList::Main, (main_length as usize).saturating_sub(1), 1).await?.into_iter().next()
        } else {
            None
        };

        let health = if deadletter_length > 50 {
            "critical"
        } else if main_length > 1000 {
            "degraded"
        } else {
            "healthy"
        };

        Ok(QueueStats {
            timestamp: Utc::now(),
            main_length,
            deadletter_length,
            oldest_queued_at: oldest.map(|j| j.queued_at),
            newest_queued_at: newest.map(|j| j.queued_at),
            health: health.to_string(),
        })
    }

    /// `GET /api/queue/contents`.
    pub async fn contents(&self, kind: QueueKind, offset: usize, limit: usize) -> Result<QueuePage> {
        let entries = self.queue.range(kind.into(), offset, limit).await?;
        let total_returned = entries.len();
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, job)| QueueItem {
                position: offset + i,
                job_id: job.job_id.to_string(),
                title: job.title,
                company: job.company,
                queued_at: job.queued_at,
                retry_count: job.retry_count,
                correlation_id: job.correlation_id.to_string(),
            })
            .collect();

        Ok(QueuePage { offset, total_returned, entries })
    }

    /// `POST /api/queue/batch-operation`. Positions are sorted descending before
    /// mutation so removing one doesn't shift the index of another still pending.
    /// The destination for `move_to_main`/`move_to_deadletter` is implied by `op`.
    pub async fn batch_operation(
        &self,
        op: BatchOp,
        source: QueueKind,
        mut positions: Vec<usize>,
    ) -> Result<BatchOperationResult> {
        let start = std::time::Instant::now();
        positions.sort_unstable_by(|a, b| b.cmp(a));
        positions.dedup();

        let mut successful = 0usize;
        let mut errors = Vec::new();

        if op == BatchOp::Clear {
            let warning = format!("clearing queue {source:?}");
            warn!("{warning}");
            let removed = self.queue.clear(source.into()).await?;
            successful = removed as usize;
        } else {
            for position in &positions {
                match self.apply_one(op, source, *position).await {
                    Ok(()) => successful += 1,
                    Err(e) => errors.push(format!("position {position}: {e}")),
                }
            }
        }

        let result = BatchOperationResult {
            operation: format!("{op:?}"),
            total: positions.len().max(successful),
            successful,
            failed: errors.len(),
            errors,
            duration_ms: start.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        };

        self.record(result.clone()).await;
        Ok(result)
    }

    async fn apply_one(&self, op: BatchOp, source: QueueKind, position: usize) -> Result<()> {
        match op {
            BatchOp::Delete => {
                self.queue.remove_at(source.into(), position).await?;
                Ok(())
            }
            BatchOp::Retry => {
                let entries = self.queue.range(source.into(), position, 1).await?;
                let job = entries.into_iter().next().ok_or_else(|| PipelineError::not_found("queue_entry", position))?;
                self.queue.remove_at(source.into(), position).await?;

                let mut retried: Job = job;
                retried.retry_count = 0;
                retried.correlation_id = CorrelationId::new();
                self.queue.enqueue(retried).await
            }
            BatchOp::MoveToMain => self.move_entry(source, position, QueueKind::Main).await,
            BatchOp::MoveToDeadletter => self.move_entry(source, position, QueueKind::DeadLetter).await,
            BatchOp::Clear => unreachable!("handled by caller"),
        }
    }

    async fn move_entry(&self, source: QueueKind, position: usize, destination: QueueKind) -> Result<()> {
        let entries = self.queue.range(source.into(), position, 1).await?;
        let job = entries.into_iter().next().ok_or_else(|| PipelineError::not_found("queue_entry", position))?;
        self.queue.remove_at(source.into(), position).await?;

        match destination {
            QueueKind::Main => self.queue.enqueue(job).await,
            QueueKind::DeadLetter => {
                let entry = DeadLetterEntry::from_entry(job, "moved_by_operator", Some("queue_manager".to_string()));
                self.queue.move_to_deadletter(entry).await
            }
        }
    }

    /// `POST /api/queue/reorder`. Reads the full list, sorts in memory, clears, and
    /// rewrites; corrupted entries (unused here since entries are always well-typed)
    /// would sort last under any criterion.
    pub async fn reorder(&self, kind: QueueKind, criterion: ReorderCriterion) -> Result<usize> {
        let list: QueueList = kind.into();
        let len = self.queue.length(list).await? as usize;
        let mut entries = self.queue.range(list, 0, len).await?;

        match criterion {
            ReorderCriterion::Priority => entries.sort_by(|a, b| b.retry_count.cmp(&a.retry_count)),
            ReorderCriterion::RetryCount => entries.sort_by_key(|j| j.retry_count),
            ReorderCriterion::QueuedAt => entries.sort_by_key(|j| j.queued_at),
            ReorderCriterion::ExplicitPermutation(order) => {
                let mut reordered = Vec::with_capacity(entries.len());
                for &index in &order {
                    if let Some(job) = entries.get(index) {
                        reordered.push(job.clone());
                    }
                }
                entries = reordered;
            }
        }

        self.queue.clear(list).await?;
        for entry in &entries {
            self.queue.enqueue(entry.clone()).await?;
        }

        Ok(entries.len())
    }

    async fn record(&self, result: BatchOperationResult) {
        let mut history = self.operation_history.write().await;
        history.push_back(result);
        if history.len() > OPERATION_HISTORY_LIMIT {
            history.pop_front();
        }
    }

    /// `GET /api/queue/operations/history`.
    pub async fn operation_history(&self) -> Vec<BatchOperationResult> {
        self.operation_history.read().await.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline_core::{JobId, QueueEntry};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct InMemoryQueue {
        main: StdMutex<Vec<Job>>,
        dead: StdMutex<Vec<Job>>,
    }

    #[async_trait]
    impl DurableQueue for InMemoryQueue {
        async fn enqueue(&self, entry: QueueEntry) -> Result<()> {
            self.main.lock().unwrap().push(entry);
            Ok(())
        }
        async fn dequeue(&self, _timeout: Duration) -> Result<Option<QueueEntry>> {
            Ok(self.main.lock().unwrap().pop())
        }
        async fn length(&self, list: QueueList) -> Result<u64> {
            Ok(match list {
                QueueList::Main => self.main.lock().unwrap().len() as u64,
                QueueList::DeadLetter => self.dead.lock().unwrap().len() as u64,
            })
        }
        async fn range(&self, list: QueueList, offset: usize, limit: usize) -> Result<Vec<QueueEntry>> {
            let source = match list {
                QueueList::Main => self.main.lock().unwrap().clone(),
                QueueList::DeadLetter => self.dead.lock().unwrap().clone(),
            };
            Ok(source.into_iter().skip(offset).take(limit).collect())
        }
        async fn remove_at(&self, list: QueueList, position: usize) -> Result<bool> {
            let mut source = match list {
                QueueList::Main => self.main.lock().unwrap(),
                QueueList::DeadLetter => self.dead.lock().unwrap(),
            };
            if position < source.len() {
                source.remove(position);
                Ok(true)
            } else {
                Ok(false)
            }
        }
        async fn move_to_deadletter(&self, entry: DeadLetterEntry) -> Result<()> {
            self.dead.lock().unwrap().push(entry.entry);
            Ok(())
        }
        async fn clear(&self, list: QueueList) -> Result<u64> {
            let mut source = match list {
                QueueList::Main => self.main.lock().unwrap(),
                QueueList::DeadLetter => self.dead.lock().unwrap(),
            };
            let len = source.len() as u64;
            source.clear();
            Ok(len)
        }
        async fn find(&self, _job_id: JobId) -> Result<Option<QueueEntry>> {
            Ok(None)
        }
        async fn find_by_correlation(&self, _correlation_id: CorrelationId) -> Result<Vec<QueueEntry>> {
            Ok(Vec::new())
        }
        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn queue_with(jobs: Vec<Job>) -> Arc<InMemoryQueue> {
        Arc::new(InMemoryQueue { main: StdMutex::new(jobs), dead: StdMutex::new(Vec::new()) })
    }

    #[tokio::test]
    async fn test_contents_paginates_with_positions() {
        let queue = queue_with(vec![Job::new("A", "Acme", None), Job::new("B", "Beta", None)]);
        let manager = QueueManager::new(queue);

        let page = manager.contents(QueueKind::Main, 0, 10).await.unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].position, 0);
        assert_eq!(page.entries[1].position, 1);
    }

    #[tokio::test]
    async fn test_batch_delete_removes_descending_positions_safely() {
        let queue = queue_with(vec![
            Job::new("A", "Acme", None),
            Job::new("B", "Beta", None),
            Job::new("C", "Gamma", None),
        ]);
        let manager = QueueManager::new(queue.clone());

        let result = manager.batch_operation(BatchOp::Delete, QueueKind::Main, vec![0, 2]).await.unwrap();
        assert_eq!(result.successful, 2);
        assert_eq!(queue.main.lock().unwrap().len(), 1);
        assert_eq!(queue.main.lock().unwrap()[0].title, "B");
    }

    #[tokio::test]
    async fn test_clear_logs_and_empties_queue() {
        let queue = queue_with(vec![Job::new("A", "Acme", None)]);
        let manager = QueueManager::new(queue.clone());

        let result = manager.batch_operation(BatchOp::Clear, QueueKind::Main, vec![]).await.unwrap();
        assert_eq!(result.successful, 1);
        assert_eq!(queue.main.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_operation_history_is_recorded() {
        let queue = queue_with(vec![Job::new("A", "Acme", None)]);
        let manager = QueueManager::new(queue);

        manager.batch_operation(BatchOp::Delete, QueueKind::Main, vec![0]).await.unwrap();
        let history = manager.operation_history().await;
        assert_eq!(history.len(), 1);
    }
}

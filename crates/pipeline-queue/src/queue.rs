//! The durable queue abstraction (C1): a FIFO main list with a sibling dead-letter
//! list, supporting blocking dequeue, paginated reads, and atomic moves.

use async_trait::async_trait;
use pipeline_core::{CorrelationId, DeadLetterEntry, JobId, QueueEntry, Result};
use std::time::Duration;

/// Which list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueList {
    /// The main FIFO list jobs are dequeued from.
    Main,
    /// The dead-letter list terminal failures land in.
    DeadLetter,
}

/// Durable FIFO queue with a dead-letter sibling list.
///
/// No at-most-once guarantee: a crash between [`DurableQueue::dequeue`] and the
/// caller's downstream ack can redeliver the same entry.
#[async_trait]
pub trait DurableQueue: Send + Sync {
    /// Appends an entry to the tail of the main list.
    async fn enqueue(&self, entry: QueueEntry) -> Result<()>;

    /// Blocking pop from the head of the main list, bounded by `timeout`.
    ///
    /// Returns `Ok(None)` on timeout, not an error.
    async fn dequeue(&self, timeout: Duration) -> Result<Option<QueueEntry>>;

    /// Length of the given list.
    async fn length(&self, list: QueueList) -> Result<u64>;

    /// Paginated read of `list` without removing anything, head-first.
    async fn range(&self, list: QueueList, offset: usize, limit: usize) -> Result<Vec<QueueEntry>>;

    /// Removes the entry at the given 0-indexed position in `list`.
    ///
    /// Returns `Ok(true)` if an entry was removed.
    async fn remove_at(&self, list: QueueList, position: usize) -> Result<bool>;

    /// Moves an entry to the dead-letter list, atomically popping it from the main
    /// list first if it is still there.
    async fn move_to_deadletter(&self, entry: DeadLetterEntry) -> Result<()>;

    /// Empties a list.
    async fn clear(&self, list: QueueList) -> Result<u64>;

    /// Looks up a job by ID across both lists, without removing it.
    async fn find(&self, job_id: JobId) -> Result<Option<QueueEntry>>;

    /// Looks up every entry sharing a correlation ID, across both lists.
    async fn find_by_correlation(&self, correlation_id: CorrelationId) -> Result<Vec<QueueEntry>>;

    /// Pings the backing store.
    async fn health_check(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_list_equality() {
        assert_eq!(QueueList::Main, QueueList::Main);
        assert_ne!(QueueList::Main, QueueList::DeadLetter);
    }
}

//! # Pipeline Queue
//!
//! The durable queue (C1): a Redis-backed FIFO list with a sibling dead-letter list.
//!
//! ```text
//! enqueue ──▶ RPUSH main ──▶ BLPOP main ──▶ dequeue
//!                                   │
//!                         (terminal failure)
//!                                   ▼
//!                          RPUSH dlq ──▶ range/remove_at/clear
//! ```
//!
//! No at-most-once guarantee: a crash between [`queue::DurableQueue::dequeue`] and
//! the caller's downstream ack can redeliver the same entry.

pub mod queue;
pub mod redis;

pub use queue::{DurableQueue, QueueList};
pub use redis::{create_pool, RedisDurableQueue, RedisKeys};

/// Re-export of commonly used types for downstream crates.
pub mod prelude {
    pub use crate::queue::{DurableQueue, QueueList};
    pub use crate::redis::RedisDurableQueue;
    pub use pipeline_core::{CorrelationId, DeadLetterEntry, Job, JobId, JobStatus, QueueEntry};
}

//! Observability Hub (C14): the composition root tying the health monitor,
//! real-time monitor, error visualization, and queue manager together.
//!
//! Built once at startup and threaded into the supervisor and API layer as `Arc`
//! handles, replacing the module-level singletons a script-style dashboard would
//! reach for.

use crate::errors::ErrorVisualization;
use crate::health::{HealthMonitor, PushChannelProbe};
use crate::queue_manager::QueueManager;
use crate::realtime::RealTimeMonitor;
use pipeline_queue::DurableQueue;
use pipeline_store::JobStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

/// Owns C9-C12 and runs their background loops together.
pub struct ObservabilityHub {
    pub health: Arc<HealthMonitor>,
    pub realtime: Arc<RealTimeMonitor>,
    pub errors: Arc<ErrorVisualization>,
    pub queue_manager: Arc<QueueManager>,
}

impl ObservabilityHub {
    /// `push_tx` is the broadcast channel backing the push plane; construct it with
    /// [`crate::realtime::new_push_channel`] and reuse the same sender to build
    /// `push_channel` (e.g. [`crate::realtime::BroadcastPushProbe`]) so the health
    /// monitor's probe reflects the same broadcaster the real-time monitor sends on.
    #[must_use]
    pub fn new(
        queue: Arc<dyn DurableQueue>,
        store: Arc<dyn JobStore>,
        push_channel: Arc<dyn PushChannelProbe>,
        push_tx: broadcast::Sender<crate::realtime::PushEvent>,
        health_check_interval: Duration,
        alert_cooldown: Duration,
        broadcast_interval: Duration,
    ) -> Self {
        let health = Arc::new(HealthMonitor::new(
            queue.clone(),
            store.clone(),
            push_channel,
            health_check_interval,
            alert_cooldown,
            push_tx.clone(),
        ));
        let realtime =
            Arc::new(RealTimeMonitor::new(queue.clone(), store, health.clone(), broadcast_interval, push_tx));
        let errors = Arc::new(ErrorVisualization::new(queue.clone()));
        let queue_manager = Arc::new(QueueManager::new(queue));

        Self { health, realtime, errors, queue_manager }
    }

    /// Spawns the health and real-time monitor loops; returns their join handles so
    /// the caller can await them at shutdown. C11/C12 are read/mutate-on-demand and
    /// have no background loop of their own.
    pub fn spawn_background_loops(&self, shutdown: &broadcast::Sender<()>) -> Vec<tokio::task::JoinHandle<()>> {
        info!("observability hub starting background loops");
        let health = self.health.clone();
        let health_shutdown = shutdown.subscribe();
        let health_handle = tokio::spawn(async move { health.run(health_shutdown).await });

        let realtime = self.realtime.clone();
        let realtime_shutdown = shutdown.subscribe();
        let realtime_handle = tokio::spawn(async move { realtime.run(realtime_shutdown).await });

        vec![health_handle, realtime_handle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::AlwaysResponsive;
    use async_trait::async_trait;
    use pipeline_core::{CorrelationId, DeadLetterEntry, Job, JobId, QueueEntry, Result};
    use pipeline_queue::QueueList;
    use pipeline_store::{AddOutcome, StoreStats, StoredJobRecord};

    struct EmptyQueue;

    #[async_trait]
    impl DurableQueue for EmptyQueue {
        async fn enqueue(&self, _entry: QueueEntry) -> Result<()> {
            Ok(())
        }
        async fn dequeue(&self, _timeout: Duration) -> Result<Option<QueueEntry>> {
            Ok(None)
        }
        async fn length(&self, _list: QueueList) -> Result<u64> {
            Ok(0)
        }
        async fn range(&self, _list: QueueList, _offset: usize, _limit: usize) -> Result<Vec<QueueEntry>> {
            Ok(Vec::new())
        }
        async fn remove_at(&self, _list: QueueList, _position: usize) -> Result<bool> {
            Ok(false)
        }
        async fn move_to_deadletter(&self, _entry: DeadLetterEntry) -> Result<()> {
            Ok(())
        }
        async fn clear(&self, _list: QueueList) -> Result<u64> {
            Ok(0)
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

    struct EmptyStore;

    #[async_trait]
    impl JobStore for EmptyStore {
        async fn add_job(&self, _job: &Job, _analysis_data: Option<&serde_json::Value>) -> Result<AddOutcome> {
            Ok(AddOutcome::Inserted)
        }
        async fn lookup_by_hash(&self, _content_hash: &str) -> Result<Option<StoredJobRecord>> {
            Ok(None)
        }
        async fn count(&self) -> Result<u64> {
            Ok(0)
        }
        async fn stats(&self) -> Result<StoreStats> {
            Ok(StoreStats::default())
        }
        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_hub_spawns_and_shuts_down_cleanly() {
        let hub = ObservabilityHub::new(
            Arc::new(EmptyQueue),
            Arc::new(EmptyStore),
            Arc::new(AlwaysResponsive),
            crate::realtime::new_push_channel(),
            Duration::from_millis(20),
            Duration::from_secs(900),
            Duration::from_millis(20),
        );

        let (shutdown_tx, _) = broadcast::channel(1);
        let handles = hub.spawn_background_loops(&shutdown_tx);
        assert_eq!(handles.len(), 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
        }
    }
}

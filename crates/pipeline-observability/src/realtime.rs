//! Real-Time Monitor (C10): samples queue depths and store stats on a fixed
//! interval, keeps a bounded history, and broadcasts snapshots on the push channel.

use crate::health::{HealthMonitor, PushChannelProbe};
use crate::system::SystemSampler;
use chrono::{DateTime, Utc};
use pipeline_queue::{DurableQueue, QueueList};
use pipeline_store::JobStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

const HISTORY_LIMIT: usize = 100;
const TREND_SAMPLE_WINDOW: usize = 5;
const TREND_THRESHOLD_PCT: f64 = 10.0;

/// One sample of pipeline throughput and health, broadcast as
/// `pipeline_metrics_update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineMetrics {
    pub timestamp: DateTime<Utc>,
    pub jobs_in_queue: u64,
    pub jobs_in_deadletter: u64,
    pub total_jobs_processed: u64,
    pub jobs_processed_today: u64,
    pub success_rate: f64,
    pub avg_processing_time: f64,
    pub active_workers: u64,
    pub system_health: String,
}

/// One sample of host resource usage and connectivity, broadcast as
/// `system_status_update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
    pub queue_connected: bool,
    pub store_connected: bool,
    pub push_connections: usize,
    pub overall_status: String,
}

/// Direction of a sampled value over the trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleTrend {
    Increasing,
    Decreasing,
    Stable,
}

/// A broadcastable push-channel event. Mirrors the `{type, ...}` envelope in
/// `SPEC_FULL.md` §4.13.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    PipelineMetricsUpdate { metrics: PipelineMetrics },
    SystemStatusUpdate { status: SystemStatus },
    HealthStatusUpdate { snapshot: crate::health::HealthSnapshot },
    ErrorAlert { message: String, error_type: String, job_id: Option<String> },
    QueueOperationCompleted { result: crate::queue_manager::BatchOperationResult },
    QueueCleared { queue: String, removed: u64 },
    QueueReordered { queue: String, count: usize },
    TestBroadcast { message: String },
}

/// Creates the broadcast channel backing the push plane; shared by the health
/// monitor (to send alerts) and the real-time monitor (to send samples) so both
/// land on the same set of subscribers.
#[must_use]
pub fn new_push_channel() -> broadcast::Sender<PushEvent> {
    broadcast::channel(256).0
}

/// Reports the push channel responsive while it still has at least one connected
/// subscriber. Used in production in place of [`crate::health::AlwaysResponsive`],
/// which never reflects real broadcaster state.
#[derive(Clone)]
pub struct BroadcastPushProbe {
    push_tx: broadcast::Sender<PushEvent>,
}

impl BroadcastPushProbe {
    #[must_use]
    pub fn new(push_tx: broadcast::Sender<PushEvent>) -> Self {
        Self { push_tx }
    }
}

impl PushChannelProbe for BroadcastPushProbe {
    fn is_responsive(&self) -> bool {
        self.push_tx.receiver_count() > 0
    }
}

/// Cooperative sampling loop over the queue and store, maintaining bounded history
/// and broadcasting snapshots to subscribers of `push_tx`.
pub struct RealTimeMonitor {
    queue: Arc<dyn DurableQueue>,
    store: Arc<dyn JobStore>,
    health: Arc<HealthMonitor>,
    broadcast_interval: Duration,
    push_tx: broadcast::Sender<PushEvent>,
    metrics_history: RwLock<Vec<PipelineMetrics>>,
    status_history: RwLock<Vec<SystemStatus>>,
    system: SystemSampler,
    enabled: std::sync::atomic::AtomicBool,
}

impl RealTimeMonitor {
    #[must_use]
    pub fn new(
        queue: Arc<dyn DurableQueue>,
        store: Arc<dyn JobStore>,
        health: Arc<HealthMonitor>,
        broadcast_interval: Duration,
        push_tx: broadcast::Sender<PushEvent>,
    ) -> Self {
        Self {
            queue,
            store,
            health,
            broadcast_interval,
            push_tx,
            metrics_history: RwLock::new(Vec::new()),
            status_history: RwLock::new(Vec::new()),
            system: SystemSampler::new(),
            enabled: std::sync::atomic::AtomicBool::new(true),
        }
    }

    /// Subscribes to push-channel events; a lagged receiver drops messages rather
    /// than blocking the broadcaster.
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.push_tx.subscribe()
    }

    /// Broadcasts an out-of-band push event, e.g. a test broadcast or an alert
    /// raised by another component. Returns the number of active subscribers.
    pub fn broadcast(&self, event: PushEvent) -> usize {
        self.push_tx.send(event).map(|_| self.push_tx.receiver_count()).unwrap_or(0)
    }

    /// Number of active push-channel subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.push_tx.receiver_count()
    }

    /// Pauses or resumes the sampling loop without tearing down the task; `run`
    /// keeps ticking but skips sampling while disabled.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether the sampling loop is currently active.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Runs the sampling loop until `shutdown` fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        info!(interval = ?self.broadcast_interval, "real-time monitor started");
        let mut ticker = tokio::time::interval(self.broadcast_interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("real-time monitor shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    if !self.is_enabled() {
                        continue;
                    }
                    self.sample_pipeline_metrics().await;
                    self.sample_system_status().await;
                }
            }
        }
    }

    async fn sample_pipeline_metrics(&self) {
        let jobs_in_queue = self.queue.length(QueueList::Main).await.unwrap_or(0);
        let jobs_in_deadletter = self.queue.length(QueueList::DeadLetter).await.unwrap_or(0);
        let stats = self.store.stats().await.unwrap_or_default();

        let total_jobs_processed = stats.total as u64;
        let failed = stats
            .by_status
            .iter()
            .find(|s| s.status == "failed")
            .map_or(0, |s| s.count as u64);
        let success_rate = if total_jobs_processed == 0 {
            100.0
        } else {
            (total_jobs_processed.saturating_sub(failed) as f64 / total_jobs_processed as f64) * 100.0
        };

        let health = self.health.check_once().await;
        let system_health = format!("{:?}", health.overall).to_lowercase();

        let metrics = PipelineMetrics {
            timestamp: Utc::now(),
            jobs_in_queue,
            jobs_in_deadletter,
            total_jobs_processed,
            jobs_processed_today: stats.last_24h as u64,
            success_rate,
            avg_processing_time: 0.0,
            active_workers: 0,
            system_health,
        };

        {
            let mut history = self.metrics_history.write().await;
            history.push(metrics.clone());
            if history.len() > HISTORY_LIMIT {
                let overflow = history.len() - HISTORY_LIMIT;
                history.drain(0..overflow);
            }
        }

        if self.push_tx.send(PushEvent::PipelineMetricsUpdate { metrics }).is_err() {
            warn!("no subscribers for pipeline metrics broadcast");
        }
    }

    async fn sample_system_status(&self) {
        let usage = self.system.sample().await;
        let (cpu_percent, memory_percent, disk_percent) =
            (usage.cpu_percent, usage.memory_percent, usage.disk_percent);

        let queue_connected = self.queue.health_check().await.is_ok();
        let store_connected = self.store.health_check().await.is_ok();
        let health = self.health.check_once().await;

        let status = SystemStatus {
            timestamp: Utc::now(),
            cpu_percent,
            memory_percent,
            disk_percent,
            queue_connected,
            store_connected,
            push_connections: self.push_tx.receiver_count(),
            overall_status: format!("{:?}", health.overall).to_lowercase(),
        };

        {
            let mut history = self.status_history.write().await;
            history.push(status.clone());
            if history.len() > HISTORY_LIMIT {
                let overflow = history.len() - HISTORY_LIMIT;
                history.drain(0..overflow);
            }
        }

        if self.push_tx.send(PushEvent::SystemStatusUpdate { status }).is_err() {
            warn!("no subscribers for system status broadcast");
        }
    }

    /// Returns the bounded metrics history, oldest first.
    pub async fn metrics_history(&self) -> Vec<PipelineMetrics> {
        self.metrics_history.read().await.clone()
    }

    /// Returns the bounded status history, oldest first.
    pub async fn status_history(&self) -> Vec<SystemStatus> {
        self.status_history.read().await.clone()
    }

    /// Samples pipeline metrics on demand (outside the regular ticker), recording and
    /// broadcasting the result like any other sample; used by `GET
    /// /api/realtime/current-metrics` and `GET /api/pipeline/metrics`.
    pub async fn current_metrics(&self) -> PipelineMetrics {
        self.sample_pipeline_metrics().await;
        self.metrics_history.read().await.last().cloned().expect("just sampled")
    }

    /// Samples system status on demand; used by `GET /api/realtime/current-status` and
    /// `GET /api/pipeline/live-stats`.
    pub async fn current_status(&self) -> SystemStatus {
        self.sample_system_status().await;
        self.status_history.read().await.last().cloned().expect("just sampled")
    }

    /// Trend of `jobs_in_queue` over the last [`TREND_SAMPLE_WINDOW`] samples:
    /// compares the mean of the first half against the second half.
    pub async fn queue_depth_trend(&self) -> SampleTrend {
        let history = self.metrics_history.read().await;
        let values: Vec<f64> = history
            .iter()
            .rev()
            .take(TREND_SAMPLE_WINDOW)
            .map(|m| m.jobs_in_queue as f64)
            .collect();
        trend_of(&values)
    }
}

/// Compares the first half of `values` (oldest) against the second half (newest); a
/// move of at least [`TREND_THRESHOLD_PCT`] counts as increasing/decreasing.
pub(crate) fn trend_of(values: &[f64]) -> SampleTrend {
    if values.len() < 2 {
        return SampleTrend::Stable;
    }
    let mut ordered = values.to_vec();
    ordered.reverse();
    let mid = ordered.len() / 2;
    let (first_half, second_half) = ordered.split_at(mid.max(1));
    let first_avg = first_half.iter().sum::<f64>() / first_half.len() as f64;
    let second_avg = second_half.iter().sum::<f64>() / second_half.len().max(1) as f64;

    if first_avg == 0.0 {
        return if second_avg > 0.0 { SampleTrend::Increasing } else { SampleTrend::Stable };
    }

    let change_pct = ((second_avg - first_avg) / first_avg) * 100.0;
    if change_pct >= TREND_THRESHOLD_PCT {
        SampleTrend::Increasing
    } else if change_pct <= -TREND_THRESHOLD_PCT {
        SampleTrend::Decreasing
    } else {
        SampleTrend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::AlwaysResponsive;
    use async_trait::async_trait;
    use pipeline_core::{CorrelationId, DeadLetterEntry, Job, JobId, Result};
    use pipeline_store::{AddOutcome, JobStore, StoreStats};

    struct StubQueue {
        main_len: u64,
    }

    #[async_trait]
    impl DurableQueue for StubQueue {
        async fn enqueue(&self, _entry: pipeline_core::QueueEntry) -> Result<()> {
            Ok(())
        }
        async fn dequeue(&self, _timeout: Duration) -> Result<Option<pipeline_core::QueueEntry>> {
            Ok(None)
        }
        async fn length(&self, list: QueueList) -> Result<u64> {
            Ok(match list {
                QueueList::Main => self.main_len,
                QueueList::DeadLetter => 0,
            })
        }
        async fn range(&self, _list: QueueList, _offset: usize, _limit: usize) -> Result<Vec<pipeline_core::QueueEntry>> {
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
        async fn find(&self, _job_id: JobId) -> Result<Option<pipeline_core::QueueEntry>> {
            Ok(None)
        }
        async fn find_by_correlation(&self, _correlation_id: CorrelationId) -> Result<Vec<pipeline_core::QueueEntry>> {
            Ok(Vec::new())
        }
        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    struct StubStore;

    #[async_trait]
    impl JobStore for StubStore {
        async fn add_job(&self, _job: &Job, _analysis_data: Option<&serde_json::Value>) -> Result<AddOutcome> {
            Ok(AddOutcome::Inserted)
        }
        async fn lookup_by_hash(&self, _content_hash: &str) -> Result<Option<pipeline_store::StoredJobRecord>> {
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

    fn monitor(main_len: u64) -> RealTimeMonitor {
        let queue: Arc<dyn DurableQueue> = Arc::new(StubQueue { main_len });
        let store: Arc<dyn JobStore> = Arc::new(StubStore);
        let (push_tx, _) = broadcast::channel(256);
        let health = Arc::new(HealthMonitor::new(
            queue.clone(),
            store.clone(),
            Arc::new(AlwaysResponsive),
            Duration::from_secs(30),
            Duration::from_secs(900),
            push_tx.clone(),
        ));
        RealTimeMonitor::new(queue, store, health, Duration::from_secs(5), push_tx)
    }

    #[tokio::test]
    async fn test_sample_pipeline_metrics_records_history_and_broadcasts() {
        let rtm = monitor(7);
        let mut rx = rtm.subscribe();

        rtm.sample_pipeline_metrics().await;

        let history = rtm.metrics_history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].jobs_in_queue, 7);
        assert_eq!(history[0].success_rate, 100.0);

        match rx.try_recv().expect("broadcast event") {
            PushEvent::PipelineMetricsUpdate { metrics } => assert_eq!(metrics.jobs_in_queue, 7),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sample_system_status_records_history_and_broadcasts() {
        let rtm = monitor(0);
        let mut rx = rtm.subscribe();

        rtm.sample_system_status().await;

        let history = rtm.status_history().await;
        assert_eq!(history.len(), 1);
        assert!(history[0].queue_connected);
        assert!(history[0].store_connected);

        match rx.try_recv().expect("broadcast event") {
            PushEvent::SystemStatusUpdate { status } => assert!(status.queue_connected),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_queue_depth_trend_detects_increase() {
        let rtm = monitor(0);
        for len in [10, 10, 20, 20] {
            let queue: Arc<dyn DurableQueue> = Arc::new(StubQueue { main_len: len });
            let jobs_in_queue = queue.length(QueueList::Main).await.unwrap();
            let mut history = rtm.metrics_history.write().await;
            history.push(PipelineMetrics {
                timestamp: chrono::DateTime::from_timestamp(0, 0).unwrap(),
                jobs_in_queue,
                jobs_in_deadletter: 0,
                total_jobs_processed: 0,
                jobs_processed_today: 0,
                success_rate: 100.0,
                avg_processing_time: 0.0,
                active_workers: 0,
                system_health: "healthy".to_string(),
            });
        }
        assert_eq!(rtm.queue_depth_trend().await, SampleTrend::Increasing);
    }

    #[test]
    fn test_trend_of_detects_increase() {
        assert_eq!(trend_of(&[10.0, 10.0, 20.0, 20.0]), SampleTrend::Increasing);
    }

    #[test]
    fn test_trend_of_detects_decrease() {
        assert_eq!(trend_of(&[20.0, 20.0, 10.0, 10.0]), SampleTrend::Decreasing);
    }

    #[test]
    fn test_trend_of_stable_within_threshold() {
        assert_eq!(trend_of(&[10.0, 10.0, 10.2, 10.1]), SampleTrend::Stable);
    }
}

//! Pipeline Supervisor (C8): owns the processing→analysis and analysis→storage
//! channels, a worker pool per stage, and graceful shutdown.

use crate::analyzer::JobAnalyzer;
use crate::stages::{analysis, processing, storage, AnalyzedJob};
use pipeline_config::PipelineConfig;
use pipeline_core::Job;
use pipeline_queue::DurableQueue;
use pipeline_store::JobStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Bounded backoff before a panicked worker is replaced.
const RESTART_BACKOFF: Duration = Duration::from_secs(2);

/// Owns the pipeline's worker pools. `start` spawns every worker; `shutdown` signals
/// them to drain and stop, in stage order, within a hard deadline.
pub struct PipelineSupervisor {
    queue: Arc<dyn DurableQueue>,
    store: Arc<dyn JobStore>,
    analyzer: Arc<dyn JobAnalyzer>,
    config: Arc<PipelineConfig>,
    dequeue_timeout: Duration,
    shutdown_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PipelineSupervisor {
    #[must_use]
    pub fn new(
        queue: Arc<dyn DurableQueue>,
        store: Arc<dyn JobStore>,
        analyzer: Arc<dyn JobAnalyzer>,
        config: Arc<PipelineConfig>,
        dequeue_timeout: Duration,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            queue,
            store,
            analyzer,
            config,
            dequeue_timeout,
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the configured worker pools for all three stages.
    pub async fn start(&self) {
        crate::metrics::register_metrics();

        let capacity = self.config.stage_channel_capacity;
        let (proc_tx, analysis_rx) = mpsc::channel::<Job>(capacity);
        let analysis_rx = Arc::new(Mutex::new(analysis_rx));
        let (analysis_tx, storage_rx) = mpsc::channel::<AnalyzedJob>(capacity);
        let storage_rx = Arc::new(Mutex::new(storage_rx));

        let mut handles = self.handles.lock().await;

        for _ in 0..self.config.processing_workers.max(1) {
            handles.push(self.spawn_processing_worker(proc_tx.clone()));
        }
        for _ in 0..self.config.analysis_workers.max(1) {
            handles.push(self.spawn_analysis_worker(analysis_rx.clone(), analysis_tx.clone()));
        }
        for _ in 0..self.config.storage_workers.max(1) {
            handles.push(self.spawn_storage_worker(storage_rx.clone()));
        }

        info!(
            processing_workers = self.config.processing_workers,
            analysis_workers = self.config.analysis_workers,
            storage_workers = self.config.storage_workers,
            "pipeline supervisor started"
        );
    }

    fn spawn_processing_worker(&self, tx: mpsc::Sender<Job>) -> JoinHandle<()> {
        let queue = self.queue.clone();
        let config = self.config.clone();
        let timeout = self.dequeue_timeout;
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(Self::supervised("processing", move || {
            let queue = queue.clone();
            let tx = tx.clone();
            let config = config.clone();
            let shutdown = shutdown_tx.subscribe();
            processing::run(queue, tx, config, timeout, shutdown)
        }))
    }

    fn spawn_analysis_worker(
        &self,
        rx: Arc<Mutex<mpsc::Receiver<Job>>>,
        tx: mpsc::Sender<AnalyzedJob>,
    ) -> JoinHandle<()> {
        let analyzer = self.analyzer.clone();
        let timeout = self.config.analyzer_timeout();
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(Self::supervised("analysis", move || {
            let rx = rx.clone();
            let tx = tx.clone();
            let analyzer = analyzer.clone();
            let shutdown = shutdown_tx.subscribe();
            analysis::run(rx, tx, analyzer, timeout, shutdown)
        }))
    }

    fn spawn_storage_worker(&self, rx: Arc<Mutex<mpsc::Receiver<AnalyzedJob>>>) -> JoinHandle<()> {
        let store = self.store.clone();
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(Self::supervised("storage", move || {
            let rx = rx.clone();
            let store = store.clone();
            let shutdown = shutdown_tx.subscribe();
            storage::run(rx, store, shutdown)
        }))
    }

    /// Runs `make_future()` to completion, restarting it after a bounded backoff if
    /// it panics. A clean return (shutdown observed or channel closed) ends the loop;
    /// only a panic triggers a respawn.
    async fn supervised<F, Fut>(stage: &'static str, make_future: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        loop {
            match tokio::spawn(make_future()).await {
                Ok(()) => break,
                Err(join_err) if join_err.is_panic() => {
                    warn!(stage, error = %join_err, "worker panicked, restarting after backoff");
                    metrics::counter!(crate::metrics::names::WORKER_RESTARTS_TOTAL).increment(1);
                    tokio::time::sleep(RESTART_BACKOFF).await;
                }
                Err(_cancelled) => break,
            }
        }
    }

    /// Signals every worker to stop accepting new work and waits up to `deadline`
    /// for in-flight jobs to drain before returning.
    pub async fn shutdown(&self, deadline: Duration) {
        info!("pipeline supervisor shutting down");
        let _ = self.shutdown_tx.send(());

        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        let join_all = futures_util_join_all(handles);

        if tokio::time::timeout(deadline, join_all).await.is_err() {
            warn!(?deadline, "pipeline supervisor shutdown deadline exceeded, workers cancelled");
        }
    }
}

async fn futures_util_join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::NoopAnalyzer;
    use async_trait::async_trait;
    use pipeline_core::{CorrelationId, DeadLetterEntry, JobId, QueueEntry, Result};
    use pipeline_queue::QueueList;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    struct EmptyQueue {
        dequeued: AtomicUsize,
    }

    #[async_trait]
    impl DurableQueue for EmptyQueue {
        async fn enqueue(&self, _entry: QueueEntry) -> Result<()> {
            Ok(())
        }
        async fn dequeue(&self, timeout: StdDuration) -> Result<Option<QueueEntry>> {
            self.dequeued.fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(timeout.min(StdDuration::from_millis(5))).await;
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
        async fn add_job(
            &self,
            _job: &pipeline_core::Job,
            _analysis_data: Option<&serde_json::Value>,
        ) -> Result<pipeline_store::AddOutcome> {
            Ok(pipeline_store::AddOutcome::Inserted)
        }
        async fn lookup_by_hash(&self, _content_hash: &str) -> Result<Option<pipeline_store::StoredJobRecord>> {
            Ok(None)
        }
        async fn count(&self) -> Result<u64> {
            Ok(0)
        }
        async fn stats(&self) -> Result<pipeline_store::StoreStats> {
            Ok(pipeline_store::StoreStats::default())
        }
        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_supervisor_starts_and_shuts_down_cleanly() {
        let queue = Arc::new(EmptyQueue { dequeued: AtomicUsize::new(0) });
        let store = Arc::new(EmptyStore);
        let analyzer = Arc::new(NoopAnalyzer);
        let mut config = PipelineConfig::default();
        config.processing_workers = 1;
        config.analysis_workers = 1;
        config.storage_workers = 1;

        let supervisor = PipelineSupervisor::new(
            queue,
            store,
            analyzer,
            Arc::new(config),
            StdDuration::from_millis(10),
        );

        supervisor.start().await;
        tokio::time::sleep(StdDuration::from_millis(20)).await;
        supervisor.shutdown(StdDuration::from_secs(1)).await;
    }
}

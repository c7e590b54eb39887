//! Health Monitor (C9): periodic checks of the queue, store, system resources, and
//! push channel, rolled up into an overall status with trend and alert cooldown.

use crate::realtime::PushEvent;
use crate::system::SystemSampler;
use chrono::{DateTime, Utc};
use pipeline_queue::{DurableQueue, QueueList};
use pipeline_resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
use pipeline_store::JobStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

/// Trips the queue/store circuit breakers after this many consecutive failures,
/// matching the previous fixed "3 consecutive checks" threshold.
const COMPONENT_FAILURE_THRESHOLD: u64 = 3;

const MAIN_QUEUE_DEGRADED_LENGTH: u64 = 1000;
const DEADLETTER_CRITICAL_LENGTH: u64 = 50;
const QUEUE_DEGRADED_RESPONSE: Duration = Duration::from_secs(2);
const STORE_DEGRADED_RESPONSE: Duration = Duration::from_secs(5);
const CPU_MEM_DEGRADED_PCT: f32 = 75.0;
const DISK_DEGRADED_PCT: f32 = 75.0;
const CPU_MEM_CRITICAL_PCT: f32 = 90.0;
const DISK_CRITICAL_PCT: f32 = 95.0;
const HISTORY_LIMIT: usize = 100;

/// Per-component health status, worst-component-wins rolls up to the same scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Critical,
}

impl ComponentStatus {
    fn worse(self, other: Self) -> Self {
        use ComponentStatus::{Critical, Degraded, Healthy};
        match (self, other) {
            (Critical, _) | (_, Critical) => Critical,
            (Degraded, _) | (_, Degraded) => Degraded,
            (Healthy, Healthy) => Healthy,
        }
    }
}

/// Result of checking a single component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub response_time_ms: u64,
    pub details: String,
}

/// A full health snapshot across every monitored component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub overall: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub trend: Trend,
}

/// Direction of status movement relative to the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Degrading,
    Unknown,
}

fn rank(status: ComponentStatus) -> u8 {
    match status {
        ComponentStatus::Healthy => 0,
        ComponentStatus::Degraded => 1,
        ComponentStatus::Critical => 2,
    }
}

fn trend_from(previous: Option<ComponentStatus>, latest: ComponentStatus) -> Trend {
    match previous {
        None => Trend::Unknown,
        Some(prev) => match rank(latest).cmp(&rank(prev)) {
            std::cmp::Ordering::Less => Trend::Improving,
            std::cmp::Ordering::Equal => Trend::Stable,
            std::cmp::Ordering::Greater => Trend::Degrading,
        },
    }
}

/// Whether the push channel manager is responsive.
pub trait PushChannelProbe: Send + Sync {
    fn is_responsive(&self) -> bool;
}

/// A probe that is always responsive; used in tests where no real broadcaster is
/// wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysResponsive;

impl PushChannelProbe for AlwaysResponsive {
    fn is_responsive(&self) -> bool {
        true
    }
}

/// Periodic health-check loop over the queue, store, system resources, and push
/// channel, with bounded history and cooldown-gated alerts.
pub struct HealthMonitor {
    queue: Arc<dyn DurableQueue>,
    store: Arc<dyn JobStore>,
    push_channel: Arc<dyn PushChannelProbe>,
    check_interval: Duration,
    alert_cooldown: Duration,
    history: RwLock<Vec<HealthSnapshot>>,
    last_alert: RwLock<HashMap<String, Instant>>,
    queue_breaker: CircuitBreaker,
    store_breaker: CircuitBreaker,
    system: SystemSampler,
    push_tx: broadcast::Sender<PushEvent>,
}

impl HealthMonitor {
    #[must_use]
    pub fn new(
        queue: Arc<dyn DurableQueue>,
        store: Arc<dyn JobStore>,
        push_channel: Arc<dyn PushChannelProbe>,
        check_interval: Duration,
        alert_cooldown: Duration,
        push_tx: broadcast::Sender<PushEvent>,
    ) -> Self {
        Self {
            queue,
            store,
            push_channel,
            check_interval,
            alert_cooldown,
            history: RwLock::new(Vec::new()),
            last_alert: RwLock::new(HashMap::new()),
            queue_breaker: CircuitBreaker::new(
                "queue",
                CircuitBreakerConfig { failure_threshold: COMPONENT_FAILURE_THRESHOLD, ..Default::default() },
            ),
            store_breaker: CircuitBreaker::new(
                "store",
                CircuitBreakerConfig { failure_threshold: COMPONENT_FAILURE_THRESHOLD, ..Default::default() },
            ),
            system: SystemSampler::new(),
            push_tx,
        }
    }

    /// Runs the check loop until `shutdown` fires.
    pub async fn run(&self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(interval = ?self.check_interval, "health monitor started");
        let mut ticker = tokio::time::interval(self.check_interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("health monitor shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    let snapshot = self.check_once().await;
                    self.record(snapshot).await;
                }
            }
        }
    }

    /// Performs one round of checks and returns the resulting snapshot without
    /// touching history; `run` is the production entry point, this is for tests and
    /// on-demand API calls.
    pub async fn check_once(&self) -> HealthSnapshot {
        let mut components = HashMap::new();
        components.insert("queue".to_string(), self.check_queue().await);
        components.insert("store".to_string(), self.check_store().await);
        components.insert("system".to_string(), self.check_system().await);
        components.insert("push_channel".to_string(), self.check_push_channel());

        let pipeline = self.check_pipeline(&components);
        components.insert("pipeline".to_string(), pipeline);

        let overall = Self::roll_up(&components);
        let previous = self.history.read().await.last().map(|s| s.overall);
        let trend = trend_from(previous, overall);

        HealthSnapshot {
            timestamp: Utc::now(),
            overall,
            components,
            trend,
        }
    }

    fn roll_up(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        let degraded_count = components
            .values()
            .filter(|c| c.status == ComponentStatus::Degraded)
            .count();

        let worst = components
            .values()
            .fold(ComponentStatus::Healthy, |acc, c| acc.worse(c.status));

        if worst == ComponentStatus::Degraded && degraded_count >= 2 {
            ComponentStatus::Critical
        } else {
            worst
        }
    }

    async fn check_queue(&self) -> ComponentHealth {
        let start = Instant::now();
        let result = self.queue_breaker.call(|| self.queue.health_check()).await;
        let elapsed = start.elapsed();

        match result {
            Err(CircuitBreakerError::Open(name)) => {
                return ComponentHealth {
                    status: ComponentStatus::Critical,
                    response_time_ms: elapsed.as_millis() as u64,
                    details: format!("circuit breaker '{name}' open after repeated queue failures"),
                };
            }
            Err(CircuitBreakerError::Failure(e)) => {
                return ComponentHealth {
                    status: ComponentStatus::Critical,
                    response_time_ms: elapsed.as_millis() as u64,
                    details: format!("queue health check failed: {e}"),
                };
            }
            Ok(()) => {}
        }

        let main_len = self.queue.length(QueueList::Main).await.unwrap_or(0);
        let dead_len = self.queue.length(QueueList::DeadLetter).await.unwrap_or(0);

        let status = if dead_len > DEADLETTER_CRITICAL_LENGTH {
            ComponentStatus::Critical
        } else if main_len > MAIN_QUEUE_DEGRADED_LENGTH || elapsed > QUEUE_DEGRADED_RESPONSE {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        };

        ComponentHealth {
            status,
            response_time_ms: elapsed.as_millis() as u64,
            details: format!("main_length={main_len} deadletter_length={dead_len}"),
        }
    }

    async fn check_store(&self) -> ComponentHealth {
        let start = Instant::now();
        let result = self.store_breaker.call(|| self.store.health_check()).await;
        let elapsed = start.elapsed();

        match result {
            Err(CircuitBreakerError::Open(name)) => {
                return ComponentHealth {
                    status: ComponentStatus::Critical,
                    response_time_ms: elapsed.as_millis() as u64,
                    details: format!("circuit breaker '{name}' open after repeated store failures"),
                };
            }
            Err(CircuitBreakerError::Failure(e)) => {
                return ComponentHealth {
                    status: ComponentStatus::Critical,
                    response_time_ms: elapsed.as_millis() as u64,
                    details: format!("store unreachable: {e}"),
                };
            }
            Ok(()) => {}
        }

        let status = if elapsed > STORE_DEGRADED_RESPONSE {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        };

        ComponentHealth {
            status,
            response_time_ms: elapsed.as_millis() as u64,
            details: "store reachable".to_string(),
        }
    }

    async fn check_system(&self) -> ComponentHealth {
        let usage = self.system.sample().await;
        let (cpu_pct, mem_pct, disk_pct) = (usage.cpu_percent, usage.memory_percent, usage.disk_percent);

        let status = if cpu_pct >= CPU_MEM_CRITICAL_PCT
            || mem_pct >= CPU_MEM_CRITICAL_PCT
            || disk_pct >= DISK_CRITICAL_PCT
        {
            ComponentStatus::Critical
        } else if cpu_pct >= CPU_MEM_DEGRADED_PCT
            || mem_pct >= CPU_MEM_DEGRADED_PCT
            || disk_pct >= DISK_DEGRADED_PCT
        {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        };

        ComponentHealth {
            status,
            response_time_ms: 0,
            details: format!("cpu={cpu_pct:.1}% mem={mem_pct:.1}% disk={disk_pct:.1}%"),
        }
    }

    fn check_push_channel(&self) -> ComponentHealth {
        let status = if self.push_channel.is_responsive() {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Critical
        };

        ComponentHealth {
            status,
            response_time_ms: 0,
            details: "push channel manager responsiveness".to_string(),
        }
    }

    fn check_pipeline(&self, components: &HashMap<String, ComponentHealth>) -> ComponentHealth {
        let queue_status = components
            .get("queue")
            .map(|c| c.status)
            .unwrap_or(ComponentStatus::Healthy);

        ComponentHealth {
            status: queue_status,
            response_time_ms: 0,
            details: "derived from queue depth".to_string(),
        }
    }

    async fn record(&self, snapshot: HealthSnapshot) {
        self.maybe_alert(&snapshot).await;

        let mut history = self.history.write().await;
        history.push(snapshot);
        if history.len() > HISTORY_LIMIT {
            let overflow = history.len() - HISTORY_LIMIT;
            history.drain(0..overflow);
        }
    }

    async fn maybe_alert(&self, snapshot: &HealthSnapshot) {
        let previous_overall = self.history.read().await.last().map(|s| s.overall);
        if previous_overall == Some(snapshot.overall) {
            return;
        }

        let key = "overall".to_string();
        let mut last_alert = self.last_alert.write().await;
        let now = Instant::now();
        if let Some(last) = last_alert.get(&key) {
            if now.duration_since(*last) < self.alert_cooldown {
                return;
            }
        }
        last_alert.insert(key, now);
        drop(last_alert);

        warn!(status = ?snapshot.overall, "health status transition");
        let _ = self.push_tx.send(PushEvent::HealthStatusUpdate { snapshot: snapshot.clone() });

        if snapshot.overall != ComponentStatus::Healthy {
            let unhealthy: Vec<&str> = snapshot
                .components
                .iter()
                .filter(|(_, c)| c.status != ComponentStatus::Healthy)
                .map(|(name, _)| name.as_str())
                .collect();
            let _ = self.push_tx.send(PushEvent::ErrorAlert {
                message: format!("health status degraded to {:?}: {}", snapshot.overall, unhealthy.join(", ")),
                error_type: "health_transition".to_string(),
                job_id: None,
            });
        }
    }

    /// Returns a copy of the bounded snapshot history, oldest first.
    pub async fn history(&self) -> Vec<HealthSnapshot> {
        self.history.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline_core::{CorrelationId, DeadLetterEntry, Job, JobId, PipelineError, QueueEntry, Result};

    struct HealthyQueue;

    #[async_trait]
    impl DurableQueue for HealthyQueue {
        async fn enqueue(&self, _entry: QueueEntry) -> Result<()> {
            Ok(())
        }
        async fn dequeue(&self, _timeout: Duration) -> Result<Option<QueueEntry>> {
            Ok(None)
        }
        async fn length(&self, _list: QueueList) -> Result<u64> {
            Ok(3)
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

    struct UnreachableStore;

    #[async_trait]
    impl JobStore for UnreachableStore {
        async fn add_job(
            &self,
            _job: &Job,
            _analysis_data: Option<&serde_json::Value>,
        ) -> Result<pipeline_store::AddOutcome> {
            Err(PipelineError::internal("unreachable"))
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
            Err(PipelineError::internal("unreachable"))
        }
    }

    #[tokio::test]
    async fn test_healthy_components_roll_up_healthy() {
        let (push_tx, _) = broadcast::channel(16);
        let monitor = HealthMonitor::new(
            Arc::new(HealthyQueue),
            Arc::new(UnreachableStore),
            Arc::new(AlwaysResponsive),
            Duration::from_secs(30),
            Duration::from_secs(900),
            push_tx,
        );

        let snapshot = monitor.check_once().await;
        assert_eq!(snapshot.components["store"].status, ComponentStatus::Critical);
        assert_eq!(snapshot.overall, ComponentStatus::Critical);
        assert_eq!(snapshot.trend, Trend::Unknown);
    }

    #[test]
    fn test_two_degraded_components_escalate_to_critical() {
        let mut components = HashMap::new();
        components.insert(
            "a".to_string(),
            ComponentHealth { status: ComponentStatus::Degraded, response_time_ms: 0, details: String::new() },
        );
        components.insert(
            "b".to_string(),
            ComponentHealth { status: ComponentStatus::Degraded, response_time_ms: 0, details: String::new() },
        );
        assert_eq!(HealthMonitor::roll_up(&components), ComponentStatus::Critical);
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(trend_from(Some(ComponentStatus::Healthy), ComponentStatus::Degraded), Trend::Degrading);
        assert_eq!(trend_from(Some(ComponentStatus::Degraded), ComponentStatus::Healthy), Trend::Improving);
        assert_eq!(trend_from(Some(ComponentStatus::Healthy), ComponentStatus::Healthy), Trend::Stable);
        assert_eq!(trend_from(None, ComponentStatus::Healthy), Trend::Unknown);
    }
}

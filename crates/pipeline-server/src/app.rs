//! Application builder: wires configuration into a runnable supervisor + router.

use axum::Router;
use pipeline_config::AppConfig;
use pipeline_core::Result;
use pipeline_engine::{NoopAnalyzer, PipelineSupervisor};
use pipeline_observability::health::PushChannelProbe;
use pipeline_observability::realtime::{new_push_channel, BroadcastPushProbe};
use pipeline_observability::ObservabilityHub;
use pipeline_queue::{DurableQueue, RedisDurableQueue};
use pipeline_store::{JobStore, PostgresJobStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

/// Everything needed to serve traffic and process jobs: the bound router, the
/// pipeline supervisor, the observability hub, and a shutdown signal shared by
/// both the HTTP server and every background loop.
pub struct RunningApp {
    pub router: Router,
    pub config: AppConfig,
    pub supervisor: Arc<PipelineSupervisor>,
    pub hub: Arc<ObservabilityHub>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub background_handles: Vec<JoinHandle<()>>,
}

impl RunningApp {
    /// Signals the supervisor and every background loop to stop, waiting up to
    /// `deadline` for in-flight work to drain.
    pub async fn shutdown(self, deadline: std::time::Duration) {
        let _ = self.shutdown_tx.send(());
        self.supervisor.shutdown(deadline).await;
        for handle in self.background_handles {
            let _ = handle.await;
        }
    }
}

/// Builds a [`RunningApp`] from configuration.
pub struct AppBuilder {
    config: Option<AppConfig>,
}

impl AppBuilder {
    /// Creates a new application builder.
    #[must_use]
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Opens the queue and store connections, spawns the pipeline supervisor and
    /// observability background loops, and builds the API router.
    pub async fn build(self) -> Result<RunningApp> {
        let config = self.config.unwrap_or_default();

        let redis_pool = pipeline_queue::create_pool(&config.queue).await?;
        let queue: Arc<dyn DurableQueue> =
            Arc::new(RedisDurableQueue::new(redis_pool, config.queue.key_prefix.clone()));

        let db_pool = pipeline_store::create_pool(&config.store).await?;
        let store: Arc<dyn JobStore> = Arc::new(PostgresJobStore::new(db_pool));

        let analyzer = Arc::new(NoopAnalyzer);
        let pipeline_config = Arc::new(config.pipeline.clone());
        let supervisor = Arc::new(PipelineSupervisor::new(
            queue.clone(),
            store.clone(),
            analyzer,
            pipeline_config,
            config.queue.dequeue_timeout(),
        ));

        let push_tx = new_push_channel();
        let push_probe: Arc<dyn PushChannelProbe> = Arc::new(BroadcastPushProbe::new(push_tx.clone()));
        let hub = Arc::new(ObservabilityHub::new(
            queue,
            store,
            push_probe,
            push_tx,
            config.observability.health_check_interval(),
            config.observability.health_alert_cooldown(),
            config.observability.broadcast_interval(),
        ));

        let (shutdown_tx, _) = broadcast::channel(16);
        let background_handles = hub.spawn_background_loops(&shutdown_tx);

        supervisor.start().await;
        info!("pipeline supervisor and observability loops started");

        let state = pipeline_api::AppState::new(hub.clone());
        let router = pipeline_api::create_router(state, &config.server);

        Ok(RunningApp { router, config, supervisor, hub, shutdown_tx, background_handles })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_builder_new_has_no_config() {
        let builder = AppBuilder::new();
        assert!(builder.config.is_none());
    }

    #[test]
    fn test_app_builder_default_has_no_config() {
        let builder = AppBuilder::default();
        assert!(builder.config.is_none());
    }

    #[test]
    fn test_app_builder_with_config_stores_it() {
        let config = AppConfig::default();
        let builder = AppBuilder::new().with_config(config);
        assert!(builder.config.is_some());
    }
}

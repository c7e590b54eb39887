//! Postgres connection pool for the job store.

use pipeline_config::StoreConfig;
use pipeline_core::{PipelineError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Owns the Postgres pool backing the job store.
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Opens a new pool per `config`.
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| PipelineError::Configuration(format!("failed to connect to store: {e}")))?;

        Ok(Self { pool })
    }

    /// Runs an `SELECT 1` against the pool.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Applies pending migrations from the crate's `migrations/` directory.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("running job store migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PipelineError::Configuration(format!("migration failed: {e}")))?;
        info!("job store migrations applied");
        Ok(())
    }

    /// Closes the pool, waiting for outstanding connections to finish.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        warn!("closing job store connection pool");
        self.pool.close().await;
    }
}

impl Deref for DatabasePool {
    type Target = PgPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}

/// Opens the pool and runs migrations, returning a shared handle.
pub async fn create_pool(config: &StoreConfig) -> Result<Arc<DatabasePool>> {
    let pool = DatabasePool::new(config).await?;
    pool.run_migrations().await?;
    Ok(Arc::new(pool))
}

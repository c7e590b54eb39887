//! Redis-backed durable queue implementation.

mod queue;

pub use queue::RedisDurableQueue;

use deadpool_redis::{Config, Pool, Runtime};
use pipeline_config::QueueConfig;
use pipeline_core::{PipelineError, Result};
use tracing::info;

/// Creates a Redis connection pool for the durable queue.
pub async fn create_pool(config: &QueueConfig) -> Result<Pool> {
    info!("creating Redis connection pool for the durable queue");

    let cfg = Config::from_url(&config.url);

    let pool = cfg
        .builder()
        .map_err(|e| PipelineError::Configuration(format!("invalid Redis config: {e}")))?
        .max_size(config.pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| PipelineError::Configuration(format!("failed to create pool: {e}")))?;

    let mut conn = pool.get().await?;
    redis::cmd("PING").query_async::<String>(&mut *conn).await?;

    info!("Redis connection pool created successfully");
    Ok(pool)
}

/// Redis key builder for the durable queue.
pub struct RedisKeys {
    prefix: String,
}

impl RedisKeys {
    /// Creates a new key builder with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Main FIFO list key.
    #[must_use]
    pub fn main(&self) -> String {
        format!("{}:queue:main", self.prefix)
    }

    /// Dead-letter list key.
    #[must_use]
    pub fn deadletter(&self) -> String {
        format!("{}:queue:dlq", self.prefix)
    }
}

impl Default for RedisKeys {
    fn default() -> Self {
        Self::new("pipeline")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_keys() {
        let keys = RedisKeys::new("test");
        assert_eq!(keys.main(), "test:queue:main");
        assert_eq!(keys.deadletter(), "test:queue:dlq");
    }
}

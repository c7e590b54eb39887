//! Application configuration structures.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// REST/WebSocket server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Durable queue (Redis) configuration.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Job store (Postgres) configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Pipeline processing configuration.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppMetadata::default(),
            server: ServerConfig::default(),
            queue: QueueConfig::default(),
            store: StoreConfig::default(),
            pipeline: PipelineConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "job-pipeline".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// REST/WebSocket server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Enable CORS.
    pub cors_enabled: bool,
    /// CORS allowed origins.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_size: 10 * 1024 * 1024,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// Returns the server bind address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Durable queue (Redis) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Redis URL.
    pub url: String,
    /// Connection pool size.
    pub pool_size: usize,
    /// Key prefix for queue/dead-letter Redis keys.
    pub key_prefix: String,
    /// Blocking dequeue timeout in seconds (`BRPOP` timeout).
    pub dequeue_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
            key_prefix: "pipeline".to_string(),
            dequeue_timeout_secs: 5,
        }
    }
}

impl QueueConfig {
    /// Returns the blocking dequeue timeout as a Duration.
    #[must_use]
    pub const fn dequeue_timeout(&self) -> Duration {
        Duration::from_secs(self.dequeue_timeout_secs)
    }
}

/// Job store (Postgres) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database URL.
    pub url: String,
    /// Minimum connection pool size.
    pub min_connections: u32,
    /// Maximum connection pool size.
    pub max_connections: u32,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds.
    pub idle_timeout_secs: u64,
    /// Enable SQL query logging.
    pub log_queries: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL").unwrap_or_default(),
            min_connections: 5,
            max_connections: 20,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
            log_queries: false,
        }
    }
}

impl StoreConfig {
    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the idle timeout as a Duration.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Action a suitability rule takes when its keyword matches a job title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuitabilityAction {
    /// The job title is suitable; stop evaluating further rules.
    Accept,
    /// The job title is unsuitable; fail processing with `SuitabilityFailed`.
    Reject,
}

/// A single keyword-matching suitability rule (case-insensitive substring match
/// against the job title).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuitabilityRule {
    /// Keyword to match, case-insensitively, as a substring of the title.
    pub keyword: String,
    /// Action to take when the keyword matches.
    pub action: SuitabilityAction,
}

impl SuitabilityRule {
    fn reject(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            action: SuitabilityAction::Reject,
        }
    }

    fn accept(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            action: SuitabilityAction::Accept,
        }
    }
}

fn default_suitability_rules() -> Vec<SuitabilityRule> {
    vec![
        SuitabilityRule::reject("senior"),
        SuitabilityRule::reject("sr."),
        SuitabilityRule::reject("lead"),
        SuitabilityRule::reject("principal"),
        SuitabilityRule::reject("manager"),
        SuitabilityRule::accept("junior"),
        SuitabilityRule::accept("jr."),
        SuitabilityRule::accept("entry"),
        SuitabilityRule::accept("graduate"),
        SuitabilityRule::accept("intern"),
    ]
}

/// Pipeline processing configuration: retry policy, suitability rules, worker
/// pool sizes, and the analyzer's execution budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum automatic retry attempts before a job moves to dead-letter.
    pub max_retries: u32,
    /// Base backoff delay for retries, in milliseconds.
    pub retry_backoff_base_ms: u64,
    /// Keyword-based suitability rules, evaluated in order.
    #[serde(default = "default_suitability_rules")]
    pub suitability_rules: Vec<SuitabilityRule>,
    /// Timeout for the analysis stage's external analyzer call, in seconds.
    pub analyzer_timeout_secs: u64,
    /// Number of concurrent processing-stage workers.
    pub processing_workers: usize,
    /// Number of concurrent analysis-stage workers.
    pub analysis_workers: usize,
    /// Number of concurrent storage-stage workers.
    pub storage_workers: usize,
    /// Bounded channel capacity between pipeline stages.
    pub stage_channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff_base_ms: 500,
            suitability_rules: default_suitability_rules(),
            analyzer_timeout_secs: 10,
            processing_workers: 4,
            analysis_workers: 4,
            storage_workers: 4,
            stage_channel_capacity: 256,
        }
    }
}

impl PipelineConfig {
    /// Returns the analyzer timeout as a Duration.
    #[must_use]
    pub const fn analyzer_timeout(&self) -> Duration {
        Duration::from_secs(self.analyzer_timeout_secs)
    }

    /// Returns the retry backoff base as a Duration.
    #[must_use]
    pub const fn retry_backoff_base(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_base_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
    /// Enable metrics.
    pub metrics_enabled: bool,
    /// Metrics endpoint path.
    pub metrics_path: String,
    /// Enable request tracing.
    pub tracing_enabled: bool,
    /// Health check sampling interval, in seconds.
    pub health_check_interval_secs: u64,
    /// Minimum seconds between repeated alerts for the same component.
    pub health_alert_cooldown_secs: u64,
    /// Real-time monitor's pipeline metrics/system status sampling interval,
    /// in seconds.
    pub broadcast_interval_secs: u64,
    /// CPU usage percentage that marks the system health check as critical.
    pub cpu_critical_pct: f32,
    /// Memory usage percentage that marks the system health check as critical.
    pub memory_critical_pct: f32,
    /// Disk usage percentage that marks the system health check as critical.
    pub disk_critical_pct: f32,
    /// Size of the in-memory metrics/event history rings (C10/C12).
    pub history_capacity: usize,

    // OpenTelemetry settings
    /// Service name for distributed tracing.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// OTLP endpoint URL (e.g., "http://localhost:4317").
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    /// Sampling ratio for traces (0.0 to 1.0).
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_service_name() -> String {
    "job-pipeline".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_path: "/metrics".to_string(),
            tracing_enabled: true,
            health_check_interval_secs: 30,
            health_alert_cooldown_secs: 900,
            broadcast_interval_secs: 5,
            cpu_critical_pct: 90.0,
            memory_critical_pct: 90.0,
            disk_critical_pct: 90.0,
            history_capacity: 200,
            service_name: default_service_name(),
            otlp_endpoint: None,
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

impl ObservabilityConfig {
    /// Converts to `pipeline_core::telemetry::TelemetryConfig`.
    #[must_use]
    pub fn to_telemetry_config(&self) -> pipeline_core::telemetry::TelemetryConfig {
        pipeline_core::telemetry::TelemetryConfig {
            enabled: self.tracing_enabled && self.otlp_endpoint.is_some(),
            service_name: self.service_name.clone(),
            otlp_endpoint: self.otlp_endpoint.clone(),
            sampling_ratio: self.sampling_ratio,
            console_output: self.log_format == "pretty",
        }
    }

    /// Returns the health check interval as a Duration.
    #[must_use]
    pub const fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    /// Returns the alert cooldown as a Duration.
    #[must_use]
    pub const fn health_alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.health_alert_cooldown_secs)
    }

    /// Returns the real-time broadcast interval as a Duration.
    #[must_use]
    pub const fn broadcast_interval(&self) -> Duration {
        Duration::from_secs(self.broadcast_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.app.name, "job-pipeline");
        assert_eq!(config.app.environment, "development");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_app_config_serialization_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.app.name, parsed.app.name);
        assert_eq!(config.server.port, parsed.server.port);
        assert_eq!(config.store.url, parsed.store.url);
    }

    #[test]
    fn test_server_config_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_server_config_custom_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..ServerConfig::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_queue_config_default() {
        let config = QueueConfig::default();
        assert_eq!(config.url, "redis://localhost:6379");
        assert_eq!(config.dequeue_timeout().as_secs(), 5);
    }

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.connect_timeout().as_secs(), 30);
    }

    #[test]
    fn test_pipeline_config_default_suitability_rules() {
        let config = PipelineConfig::default();
        assert!(config
            .suitability_rules
            .iter()
            .any(|r| r.keyword == "senior" && r.action == SuitabilityAction::Reject));
        assert!(config
            .suitability_rules
            .iter()
            .any(|r| r.keyword == "junior" && r.action == SuitabilityAction::Accept));
    }

    #[test]
    fn test_pipeline_config_default_retry_budget() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_backoff_base().as_millis(), 500);
    }

    #[test]
    fn test_observability_config_to_telemetry_config_no_endpoint() {
        let config = ObservabilityConfig::default();
        let telemetry = config.to_telemetry_config();
        assert!(!telemetry.enabled);
        assert_eq!(telemetry.service_name, "job-pipeline");
    }

    #[test]
    fn test_observability_config_to_telemetry_config_with_endpoint() {
        let config = ObservabilityConfig {
            otlp_endpoint: Some("http://localhost:4317".to_string()),
            ..ObservabilityConfig::default()
        };
        let telemetry = config.to_telemetry_config();
        assert!(telemetry.enabled);
        assert_eq!(telemetry.otlp_endpoint, Some("http://localhost:4317".to_string()));
    }
}

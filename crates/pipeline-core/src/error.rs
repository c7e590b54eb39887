//! Unified error taxonomy shared across every pipeline crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the job pipeline.
///
/// Variants map directly onto the error taxonomy in `SPEC_FULL.md` §7, plus the
/// infrastructure variants every layer needs (`Redis`, `Sqlx`, `Serialization`, `Io`).
#[derive(Error, Debug)]
pub enum PipelineError {
    // ============ Processing-stage taxonomy (§7) ============
    /// Required fields (`title`/`company`) missing from the job payload.
    #[error("missing required fields: {0}")]
    MissingRequiredFields(String),

    /// Job title failed the suitability policy.
    #[error("suitability check failed: {0}")]
    SuitabilityFailed(String),

    /// Retry count exceeded `max_retries`.
    #[error("max retries exceeded for job {job_id}: {attempts} attempts")]
    MaxRetriesExceeded { job_id: String, attempts: u32 },

    /// The external analyzer failed; non-fatal, job continues with empty annotations.
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    /// Storage stage failed to persist the job; terminal.
    #[error("database save failed: {0}")]
    DatabaseSaveFailed(String),

    /// Transient connectivity failure to the queue or store backend.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Dead-letter entry could not be parsed as valid JSON.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Rate limit exceeded talking to an external dependency.
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Authentication failed talking to an external dependency.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Permission denied talking to an external dependency.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// System resource exhaustion (CPU/memory/disk).
    #[error("system resource exhausted: {0}")]
    SystemResourceExhausted(String),

    // ============ Generic domain errors ============
    /// Resource not found.
    #[error("not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error not covered by the processing-stage taxonomy above.
    #[error("validation error: {0}")]
    Validation(String),

    /// Conflict error (e.g. duplicate entry).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Invalid state transition requested.
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    // ============ Infrastructure errors ============
    /// Redis error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool error.
    #[error("redis pool error: {0}")]
    RedisPool(#[from] deadpool_redis::PoolError),

    /// Postgres error.
    #[cfg(feature = "sqlx")]
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation timed out.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// A circuit breaker guarding this dependency is open; request rejected without
    /// being attempted.
    #[error("circuit breaker '{0}' is open")]
    CircuitOpen(String),

    /// Internal error that does not fit another variant.
    #[error("internal error: {0}")]
    Internal(String),

    /// Generic error wrapper for the composition root.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Returns the HTTP status code this error should surface as, per `SPEC_FULL.md`
    /// §6 ("error codes 400 (validation) / 404 (missing) / 500 (internal)").
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::MissingRequiredFields(_)
            | Self::SuitabilityFailed(_)
            | Self::Validation(_)
            | Self::InvalidState { .. } => 400,
            Self::Conflict(_) => 409,
            Self::RateLimitExceeded(_) => 429,
            Self::AuthenticationFailed(_) => 401,
            Self::PermissionDenied(_) => 403,
            Self::Timeout(_) | Self::ConnectionFailed(_) | Self::CircuitOpen(_) => 503,
            _ => 500,
        }
    }

    /// Returns a machine-readable error code matching the taxonomy names in
    /// `SPEC_FULL.md` §7 verbatim, so log records and error-visualization buckets
    /// (C11) can key on a stable string.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingRequiredFields(_) => "missing_required_fields",
            Self::SuitabilityFailed(_) => "suitability_failed",
            Self::MaxRetriesExceeded { .. } => "max_retries_exceeded",
            Self::AnalysisFailed(_) => "analysis_failed",
            Self::DatabaseSaveFailed(_) => "database_save_failed",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::DataCorruption(_) => "data_corruption",
            Self::RateLimitExceeded(_) => "rate_limit_exceeded",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::PermissionDenied(_) => "permission_denied",
            Self::SystemResourceExhausted(_) => "system_resource_exhausted",
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::InvalidState { .. } => "invalid_state",
            Self::Configuration(_) => "configuration_error",
            Self::Redis(_) | Self::RedisPool(_) => "connection_failed",
            #[cfg(feature = "sqlx")]
            Self::Sqlx(_) => "database_save_failed",
            Self::Serialization(_) => "data_corruption",
            Self::Io(_) => "connection_failed",
            Self::Timeout(_) => "connection_failed",
            Self::CircuitOpen(_) => "connection_failed",
            Self::Internal(_) | Self::Other(_) => "internal_error",
        }
    }

    /// Whether this error class is eligible for the queue's retry-with-backoff
    /// policy (transient, per §7's `connection_failed` classification).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::Redis(_)
                | Self::RedisPool(_)
                | Self::Timeout(_)
                | Self::Io(_)
                | Self::CircuitOpen(_)
        )
    }

    /// Whether this error is terminal: the job must move to dead-letter rather than
    /// be retried, regardless of remaining retry budget.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredFields(_)
                | Self::SuitabilityFailed(_)
                | Self::MaxRetriesExceeded { .. }
                | Self::DatabaseSaveFailed(_)
                | Self::DataCorruption(_)
        )
    }

    /// Whether this error should be escalated to a critical health alert (§7).
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded(_)
                | Self::AuthenticationFailed(_)
                | Self::PermissionDenied(_)
                | Self::SystemResourceExhausted(_)
                | Self::MissingRequiredFields(_)
        )
    }

    /// Creates a not-found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

impl From<serde_json::Error> for PipelineError {
    // explicit inherent From above via #[from]; kept for call sites matching on ()
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

/// Serializable error envelope for API responses (§6: "responses carry a timestamp
/// and a component-specific envelope").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Machine-readable error code, matching `PipelineError::error_code()`.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Request trace ID for debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response from a `PipelineError`.
    #[must_use]
    pub fn from_error(error: &PipelineError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            trace_id: None,
        }
    }

    /// Sets the trace ID.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

impl From<&PipelineError> for ErrorResponse {
    fn from(error: &PipelineError) -> Self {
        Self::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_codes() {
        assert_eq!(PipelineError::not_found("job", 1).http_status(), 404);
        assert_eq!(
            PipelineError::MissingRequiredFields("title".into()).http_status(),
            400
        );
        assert_eq!(PipelineError::conflict("duplicate").http_status(), 409);
        assert_eq!(
            PipelineError::RateLimitExceeded("backoff".into()).http_status(),
            429
        );
    }

    #[test]
    fn test_error_codes_match_taxonomy_strings() {
        assert_eq!(
            PipelineError::MissingRequiredFields("x".into()).error_code(),
            "missing_required_fields"
        );
        assert_eq!(
            PipelineError::SuitabilityFailed("x".into()).error_code(),
            "suitability_failed"
        );
        assert_eq!(
            PipelineError::MaxRetriesExceeded {
                job_id: "1".into(),
                attempts: 4
            }
            .error_code(),
            "max_retries_exceeded"
        );
        assert_eq!(
            PipelineError::DataCorruption("bad json".into()).error_code(),
            "data_corruption"
        );
    }

    #[test]
    fn test_retryable_vs_terminal_classification() {
        assert!(PipelineError::ConnectionFailed("down".into()).is_retryable());
        assert!(!PipelineError::ConnectionFailed("down".into()).is_terminal());

        assert!(PipelineError::MaxRetriesExceeded {
            job_id: "1".into(),
            attempts: 4
        }
        .is_terminal());
        assert!(!PipelineError::MaxRetriesExceeded {
            job_id: "1".into(),
            attempts: 4
        }
        .is_retryable());
    }

    #[test]
    fn test_critical_classification() {
        assert!(PipelineError::SystemResourceExhausted("disk".into()).is_critical());
        assert!(!PipelineError::AnalysisFailed("oops".into()).is_critical());
    }

    #[test]
    fn test_error_response_from_error() {
        let err = PipelineError::not_found("job", "abc");
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.code, "not_found");
        assert!(!response.message.is_empty());
        assert!(response.trace_id.is_none());
    }

    #[test]
    fn test_error_response_with_trace_id() {
        let err = PipelineError::conflict("duplicate content_hash");
        let response = ErrorResponse::from_error(&err).with_trace_id("trace-123");
        assert_eq!(response.trace_id, Some("trace-123".to_string()));
    }
}

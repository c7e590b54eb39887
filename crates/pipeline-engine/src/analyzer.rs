//! The analysis-stage analyzer boundary (C6): pluggable, synchronous, pure-CPU.
//!
//! The pipeline must not depend on any particular annotation schema, so the trait's
//! return type is an opaque JSON value.

use pipeline_core::{Job, Result};
use serde_json::Value;

/// Produces arbitrary annotations for a job. Implementations are synchronous and run
/// via `tokio::task::spawn_blocking`, so a slow analyzer never blocks the reactor.
pub trait JobAnalyzer: Send + Sync {
    fn analyze(&self, job: &Job) -> Result<Value>;

    /// True when this implementation stands in for "no analyzer configured"
    /// rather than running real analysis. The analysis stage uses this to log
    /// `analysis_skipped` instead of `analysis_completed`.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Used when no analyzer is configured; every job passes through with empty
/// annotations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalyzer;

impl JobAnalyzer for NoopAnalyzer {
    fn analyze(&self, _job: &Job) -> Result<Value> {
        Ok(Value::Object(serde_json::Map::new()))
    }

    fn is_noop(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::Job;

    #[test]
    fn test_noop_analyzer_returns_empty_object() {
        let job = Job::new("Engineer", "Acme", None);
        let result = NoopAnalyzer.analyze(&job).unwrap();
        assert_eq!(result, Value::Object(serde_json::Map::new()));
    }
}

//! Correlation Logger (C3): one structured tracing event per pipeline occurrence.
//!
//! Never mutates the job it logs about. Emitting is non-blocking by construction —
//! `tracing` macros never await, so a slow subscriber can only ever stall the
//! subscriber's own I/O, not the stage that called this function.

use pipeline_core::{CorrelationId, Job};
use tracing::{debug, error, info, warn};

/// Severity for a correlation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Emits one correlation event for `job` at `stage`, tagged `event`.
pub fn log_job_event(correlation_id: CorrelationId, stage: &str, event: &str, job: &Job, level: LogLevel) {
    match level {
        LogLevel::Debug => debug!(
            correlation_id = %correlation_id,
            stage,
            event,
            job_id = %job.job_id,
            job_title = %job.title,
            job_company = %job.company,
            job_status = ?job.status,
            retry_count = job.retry_count,
            "job event"
        ),
        LogLevel::Info => info!(
            correlation_id = %correlation_id,
            stage,
            event,
            job_id = %job.job_id,
            job_title = %job.title,
            job_company = %job.company,
            job_status = ?job.status,
            retry_count = job.retry_count,
            "job event"
        ),
        LogLevel::Warn => warn!(
            correlation_id = %correlation_id,
            stage,
            event,
            job_id = %job.job_id,
            job_title = %job.title,
            job_company = %job.company,
            job_status = ?job.status,
            retry_count = job.retry_count,
            "job event"
        ),
        LogLevel::Error => error!(
            correlation_id = %correlation_id,
            stage,
            event,
            job_id = %job.job_id,
            job_title = %job.title,
            job_company = %job.company,
            job_status = ?job.status,
            retry_count = job.retry_count,
            "job event"
        ),
    }
}

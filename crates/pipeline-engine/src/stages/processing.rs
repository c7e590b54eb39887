//! Processing stage (C5): validates, applies suitability rules, and enforces the
//! retry ceiling before handing a job to analysis.

use crate::correlation::{log_job_event, LogLevel};
use crate::metrics::names;
use pipeline_config::{PipelineConfig, SuitabilityAction, SuitabilityRule};
use pipeline_core::{DeadLetterEntry, Job, JobStatus};
use pipeline_queue::DurableQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

/// Runs one processing-stage worker until `shutdown` fires or the queue is gone.
pub async fn run(
    queue: Arc<dyn DurableQueue>,
    tx: mpsc::Sender<Job>,
    config: Arc<PipelineConfig>,
    dequeue_timeout: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!("processing stage worker started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                info!("processing stage worker shutting down");
                break;
            }
            result = queue.dequeue(dequeue_timeout) => {
                match result {
                    Ok(Some(job)) => handle_job(&queue, &tx, &config, job).await,
                    Ok(None) => continue,
                    Err(e) => {
                        error!(error = %e, "processing stage dequeue failed");
                        metrics::counter!(names::STAGE_ERRORS_TOTAL).increment(1);
                    }
                }
            }
        }
    }
}

async fn handle_job(queue: &Arc<dyn DurableQueue>, tx: &mpsc::Sender<Job>, config: &PipelineConfig, mut job: Job) {
    job.status = JobStatus::Processing;
    log_job_event(job.correlation_id, "processing", "job_received", &job, LogLevel::Info);

    if !job.has_required_fields() {
        return reject(queue, job, "missing_required_fields", LogLevel::Error).await;
    }

    if !is_suitable(&job.title, &config.suitability_rules) {
        return reject(queue, job, "suitability_failed", LogLevel::Warn).await;
    }

    if job.retry_count > config.max_retries {
        info!(
            retry_count = job.retry_count,
            max_retries = config.max_retries,
            "job exceeded retry ceiling"
        );
        return reject(queue, job, "max_retries_exceeded", LogLevel::Error).await;
    }

    log_job_event(job.correlation_id, "processing", "job_processed_successfully", &job, LogLevel::Info);
    metrics::counter!(names::JOBS_PROCESSED_TOTAL).increment(1);

    if tx.send(job).await.is_err() {
        error!("analysis channel closed, dropping job");
    }
}

async fn reject(queue: &Arc<dyn DurableQueue>, mut job: Job, reason: &str, level: LogLevel) {
    job.mark_failed(reason, "processing");
    log_job_event(job.correlation_id, "processing", reason, &job, level);
    metrics::counter!(names::JOBS_FAILED_TOTAL).increment(1);

    let correlation_id = job.correlation_id;
    let entry = DeadLetterEntry::from_entry(job, reason.to_string(), Some("processing".to_string()));
    if let Err(e) = queue.move_to_deadletter(entry).await {
        error!(error = %e, %correlation_id, "failed to move rejected job to dead-letter");
    }
}

/// Evaluates keyword suitability rules in order; the first match decides. No match
/// defaults to accept.
fn is_suitable(title: &str, rules: &[SuitabilityRule]) -> bool {
    let title = title.to_lowercase();
    for rule in rules {
        if title.contains(&rule.keyword.to_lowercase()) {
            return matches!(rule.action, SuitabilityAction::Accept);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<SuitabilityRule> {
        PipelineConfig::default().suitability_rules
    }

    #[test]
    fn test_senior_titles_rejected() {
        assert!(!is_suitable("Senior Backend Engineer", &rules()));
        assert!(!is_suitable("Engineering Manager", &rules()));
    }

    #[test]
    fn test_entry_level_titles_accepted() {
        assert!(is_suitable("Junior Developer", &rules()));
        assert!(is_suitable("Graduate Software Engineer", &rules()));
    }

    #[test]
    fn test_mid_level_titles_default_accepted() {
        assert!(is_suitable("Backend Engineer", &rules()));
    }
}

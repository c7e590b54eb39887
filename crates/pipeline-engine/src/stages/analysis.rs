//! Analysis stage (C6): invokes the external analyzer on a bounded blocking pool.
//! Analyzer failure is non-fatal — the job is forwarded with empty annotations.

use super::AnalyzedJob;
use crate::analyzer::JobAnalyzer;
use crate::correlation::{log_job_event, LogLevel};
use crate::metrics::names;
use pipeline_core::{Job, JobStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{error, info, warn};

/// `rx` is shared: every worker in the stage's pool locks it to pull the next job,
/// so the pool behaves as N consumers draining one channel rather than N independent
/// queues.
pub async fn run(
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    tx: mpsc::Sender<AnalyzedJob>,
    analyzer: Arc<dyn JobAnalyzer>,
    analyzer_timeout: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!("analysis stage worker started");

    loop {
        let maybe_job = {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("analysis stage worker shutting down");
                    return;
                }
                job = async { rx.lock().await.recv().await } => job,
            }
        };

        match maybe_job {
            Some(job) => handle_job(job, &tx, analyzer.clone(), analyzer_timeout).await,
            None => {
                info!("analysis stage upstream channel closed");
                break;
            }
        }
    }
}

async fn handle_job(
    mut job: Job,
    tx: &mpsc::Sender<AnalyzedJob>,
    analyzer: Arc<dyn JobAnalyzer>,
    analyzer_timeout: Duration,
) {
    job.status = JobStatus::Analyzed;
    log_job_event(job.correlation_id, "analysis", "job_received", &job, LogLevel::Info);

    if analyzer.is_noop() {
        log_job_event(job.correlation_id, "analysis", "analysis_skipped", &job, LogLevel::Info);
        log_job_event(job.correlation_id, "analysis", "job_analyzed_successfully", &job, LogLevel::Info);
        metrics::counter!(names::JOBS_ANALYZED_TOTAL).increment(1);

        if tx.send(AnalyzedJob { job, analysis_data: None }).await.is_err() {
            error!("storage channel closed, dropping analyzed job");
        }
        return;
    }

    log_job_event(job.correlation_id, "analysis", "analysis_started", &job, LogLevel::Info);

    let job_for_analysis = job.clone();
    let outcome = tokio::time::timeout(
        analyzer_timeout,
        tokio::task::spawn_blocking(move || analyzer.analyze(&job_for_analysis)),
    )
    .await;

    let analysis_data = match outcome {
        Ok(Ok(Ok(value))) => {
            log_job_event(job.correlation_id, "analysis", "analysis_completed", &job, LogLevel::Info);
            Some(value)
        }
        Ok(Ok(Err(e))) => {
            warn!(correlation_id = %job.correlation_id, error = %e, "analysis_failed");
            log_job_event(job.correlation_id, "analysis", "analysis_failed", &job, LogLevel::Warn);
            metrics::counter!(names::ANALYSIS_FAILED_TOTAL).increment(1);
            None
        }
        Ok(Err(join_err)) => {
            error!(correlation_id = %job.correlation_id, error = %join_err, "analyzer task panicked");
            log_job_event(job.correlation_id, "analysis", "analysis_failed", &job, LogLevel::Error);
            metrics::counter!(names::ANALYSIS_FAILED_TOTAL).increment(1);
            None
        }
        Err(_elapsed) => {
            warn!(correlation_id = %job.correlation_id, timeout = ?analyzer_timeout, "analyzer timed out");
            log_job_event(job.correlation_id, "analysis", "analysis_failed", &job, LogLevel::Warn);
            metrics::counter!(names::ANALYSIS_FAILED_TOTAL).increment(1);
            None
        }
    };

    log_job_event(job.correlation_id, "analysis", "job_analyzed_successfully", &job, LogLevel::Info);
    metrics::counter!(names::JOBS_ANALYZED_TOTAL).increment(1);

    if tx.send(AnalyzedJob { job, analysis_data }).await.is_err() {
        error!("storage channel closed, dropping analyzed job");
    }
}

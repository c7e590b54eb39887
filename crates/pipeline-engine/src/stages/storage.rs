//! Storage stage (C7): persists an analyzed job and classifies the outcome.
//!
//! This is a terminal step — storage errors are not re-enqueued. An operator who
//! wants to retry a failed save does so explicitly via the Queue Manager (C12).

use super::AnalyzedJob;
use crate::correlation::{log_job_event, LogLevel};
use crate::metrics::names;
use pipeline_core::JobStatus;
use pipeline_store::{AddOutcome, JobStore};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{error, info};

/// `rx` is shared across the stage's worker pool; see [`super::analysis::run`].
pub async fn run(
    rx: Arc<Mutex<mpsc::Receiver<AnalyzedJob>>>,
    store: Arc<dyn JobStore>,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!("storage stage worker started");

    loop {
        let maybe_job = {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("storage stage worker shutting down");
                    return;
                }
                job = async { rx.lock().await.recv().await } => job,
            }
        };

        match maybe_job {
            Some(analyzed) => handle_job(analyzed, &store).await,
            None => {
                info!("storage stage upstream channel closed");
                break;
            }
        }
    }
}

async fn handle_job(analyzed: AnalyzedJob, store: &Arc<dyn JobStore>) {
    let AnalyzedJob { mut job, analysis_data } = analyzed;
    job.status = JobStatus::Saved;
    log_job_event(job.correlation_id, "storage", "job_received", &job, LogLevel::Info);
    log_job_event(job.correlation_id, "storage", "database_save_started", &job, LogLevel::Info);

    match store.add_job(&job, analysis_data.as_ref()).await {
        Ok(AddOutcome::Inserted) => {
            log_job_event(job.correlation_id, "storage", "job_saved_successfully", &job, LogLevel::Info);
            metrics::counter!(names::JOBS_SAVED_TOTAL).increment(1);
        }
        Ok(AddOutcome::Duplicate) => {
            job.status = JobStatus::Duplicate;
            log_job_event(job.correlation_id, "storage", "job_duplicate", &job, LogLevel::Info);
            metrics::counter!(names::JOBS_DUPLICATES_TOTAL).increment(1);
        }
        Err(e) => {
            job.mark_failed(format!("database_save_failed: {e}"), "storage");
            error!(correlation_id = %job.correlation_id, error = %e, "database_save_failed");
            log_job_event(job.correlation_id, "storage", "database_save_failed", &job, LogLevel::Error);
            metrics::counter!(names::DATABASE_SAVE_FAILED_TOTAL).increment(1);
        }
    }
}

//! Metric names for the pipeline stages (C4 Metrics Registry façade).

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Metric names for the processing/analysis/storage stages.
pub mod names {
    /// Total jobs accepted by the processing stage.
    pub const JOBS_PROCESSED_TOTAL: &str = "job_pipeline_jobs_processed_total";
    /// Total jobs rejected by the processing stage (validation/suitability/retries).
    pub const JOBS_FAILED_TOTAL: &str = "job_pipeline_jobs_failed_total";
    /// Total jobs that completed the analysis stage.
    pub const JOBS_ANALYZED_TOTAL: &str = "job_pipeline_jobs_analyzed_total";
    /// Total analyzer invocations that failed (job still forwarded).
    pub const ANALYSIS_FAILED_TOTAL: &str = "job_pipeline_analysis_failed_total";
    /// Total jobs newly inserted by the storage stage.
    pub const JOBS_SAVED_TOTAL: &str = "job_pipeline_jobs_saved_total";
    /// Total jobs rejected by the storage stage as duplicates.
    pub const JOBS_DUPLICATES_TOTAL: &str = "job_pipeline_jobs_duplicates_total";
    /// Total storage-stage database errors.
    pub const DATABASE_SAVE_FAILED_TOTAL: &str = "job_pipeline_database_save_failed_total";
    /// Total unexpected per-stage errors.
    pub const STAGE_ERRORS_TOTAL: &str = "job_pipeline_stage_errors_total";
    /// Total worker restarts after a panic.
    pub const WORKER_RESTARTS_TOTAL: &str = "job_pipeline_worker_restarts_total";

    /// Currently active workers, by stage.
    pub const WORKERS_ACTIVE: &str = "job_pipeline_workers_active";

    /// Processing-stage job duration in seconds.
    pub const PROCESSING_DURATION_SECONDS: &str = "job_pipeline_processing_duration_seconds";
    /// Analysis-stage job duration in seconds.
    pub const ANALYSIS_DURATION_SECONDS: &str = "job_pipeline_analysis_duration_seconds";
    /// Storage-stage job duration in seconds.
    pub const STORAGE_DURATION_SECONDS: &str = "job_pipeline_storage_duration_seconds";
}

/// Registers descriptions for every metric this crate emits.
pub fn register_metrics() {
    describe_counter!(names::JOBS_PROCESSED_TOTAL, "Total jobs accepted by the processing stage");
    describe_counter!(names::JOBS_FAILED_TOTAL, "Total jobs rejected by the processing stage");
    describe_counter!(names::JOBS_ANALYZED_TOTAL, "Total jobs that completed the analysis stage");
    describe_counter!(names::ANALYSIS_FAILED_TOTAL, "Total analyzer invocations that failed");
    describe_counter!(names::JOBS_SAVED_TOTAL, "Total jobs newly inserted by the storage stage");
    describe_counter!(names::JOBS_DUPLICATES_TOTAL, "Total jobs rejected by the storage stage as duplicates");
    describe_counter!(names::DATABASE_SAVE_FAILED_TOTAL, "Total storage-stage database errors");
    describe_counter!(names::STAGE_ERRORS_TOTAL, "Total unexpected per-stage errors");
    describe_counter!(names::WORKER_RESTARTS_TOTAL, "Total worker restarts after a panic");

    describe_gauge!(names::WORKERS_ACTIVE, "Currently active workers, by stage");

    describe_histogram!(names::PROCESSING_DURATION_SECONDS, "Processing-stage job duration in seconds");
    describe_histogram!(names::ANALYSIS_DURATION_SECONDS, "Analysis-stage job duration in seconds");
    describe_histogram!(names::STORAGE_DURATION_SECONDS, "Storage-stage job duration in seconds");
}

//! Error visualization and dead-letter triage controller.

use crate::responses::{ok, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use pipeline_observability::errors::{ErrorDetails, ErrorSummary, ErrorTimeline, ErrorVisualization, FailedJobsAnalysis};
use pipeline_observability::health::ComponentStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Creates the `/api/errors` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/failed-jobs", get(failed_jobs))
        .route("/timeline", get(timeline))
        .route("/patterns", get(patterns))
        .route("/categories", get(categories))
        .route("/dashboard-data", get(dashboard_data))
        .route("/health-impact", get(health_impact))
        .route("/job/:id", get(job_details))
}

async fn total_jobs(state: &AppState) -> u64 {
    match state.hub.queue_manager.stats().await {
        Ok(stats) => stats.main_length + stats.deadletter_length,
        Err(_) => 0,
    }
}

/// `GET /api/errors/summary`.
async fn summary(State(state): State<AppState>) -> ApiResult<ErrorSummary> {
    let total = total_jobs(&state).await;
    ok(state.hub.errors.summary(total).await)
}

/// `GET /api/errors/failed-jobs`.
async fn failed_jobs(State(state): State<AppState>) -> ApiResult<FailedJobsAnalysis> {
    ok(state.hub.errors.failed_jobs_analysis().await)
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    #[serde(default = "TimelineQuery::default_hours")]
    pub hours: i64,
}

impl TimelineQuery {
    fn default_hours() -> i64 {
        24
    }
}

/// `GET /api/errors/timeline?hours=H`.
async fn timeline(State(state): State<AppState>, Query(params): Query<TimelineQuery>) -> ApiResult<ErrorTimeline> {
    ok(state.hub.errors.timeline(params.hours).await)
}

#[derive(Debug, Serialize)]
pub struct ErrorPatterns {
    pub correlation_clusters: HashMap<String, u64>,
    pub error_type_counts: HashMap<String, usize>,
}

/// `GET /api/errors/patterns` — recurring correlation clusters and per-type volume,
/// assembled from [`FailedJobsAnalysis`] rather than a dedicated C11 method.
async fn patterns(State(state): State<AppState>) -> ApiResult<ErrorPatterns> {
    let analysis = state.hub.errors.failed_jobs_analysis().await;
    let error_type_counts = analysis.by_error_type.iter().map(|(k, v)| (k.clone(), v.len())).collect();
    ok(ErrorPatterns { correlation_clusters: analysis.correlation_clusters, error_type_counts })
}

#[derive(Debug, Serialize)]
pub struct ErrorCategories {
    pub critical: Vec<String>,
    pub normal: Vec<String>,
}

/// `GET /api/errors/categories` — error types split by the configured critical-error
/// classes.
async fn categories(State(state): State<AppState>) -> ApiResult<ErrorCategories> {
    let analysis = state.hub.errors.failed_jobs_analysis().await;
    let (mut critical, mut normal) = (Vec::new(), Vec::new());
    for error_type in analysis.by_error_type.keys() {
        if ErrorVisualization::is_critical_error_type(error_type) {
            critical.push(error_type.clone());
        } else {
            normal.push(error_type.clone());
        }
    }
    ok(ErrorCategories { critical, normal })
}

#[derive(Debug, Serialize)]
pub struct ErrorsDashboardData {
    pub summary: ErrorSummary,
    pub failed_jobs: FailedJobsAnalysis,
    pub timeline: ErrorTimeline,
}

/// `GET /api/errors/dashboard-data`.
async fn dashboard_data(State(state): State<AppState>) -> ApiResult<ErrorsDashboardData> {
    let total = total_jobs(&state).await;
    let summary = state.hub.errors.summary(total).await;
    let failed_jobs = state.hub.errors.failed_jobs_analysis().await;
    let timeline = state.hub.errors.timeline(TimelineQuery::default_hours()).await;
    ok(ErrorsDashboardData { summary, failed_jobs, timeline })
}

#[derive(Debug, Serialize)]
pub struct ErrorHealthImpact {
    pub critical_error_count: u64,
    pub queue_status: ComponentStatus,
    pub pipeline_status: ComponentStatus,
}

/// `GET /api/errors/health-impact` — cross-references C11's critical-error count with
/// C9's current queue/pipeline component status.
async fn health_impact(State(state): State<AppState>) -> ApiResult<ErrorHealthImpact> {
    let total = total_jobs(&state).await;
    let summary = state.hub.errors.summary(total).await;
    let snapshot = state.hub.health.check_once().await;
    let queue_status = snapshot.components.get("queue").map(|c| c.status).unwrap_or(ComponentStatus::Healthy);
    let pipeline_status = snapshot.components.get("pipeline").map(|c| c.status).unwrap_or(ComponentStatus::Healthy);
    ok(ErrorHealthImpact { critical_error_count: summary.critical_count, queue_status, pipeline_status })
}

/// `GET /api/errors/job/{id}`.
async fn job_details(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ErrorDetails> {
    let details = state.hub.errors.details(&id).await?;
    ok(details)
}

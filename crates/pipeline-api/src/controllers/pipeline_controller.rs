//! Pipeline throughput and live system metrics.

use crate::responses::{ok, ApiResult};
use crate::state::AppState;
use axum::{extract::State, routing::get, Router};
use pipeline_observability::realtime::{PipelineMetrics, SystemStatus};

/// Creates the `/api/pipeline` router.
pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics)).route("/live-stats", get(live_stats))
}

/// `GET /api/pipeline/metrics`.
async fn metrics(State(state): State<AppState>) -> ApiResult<PipelineMetrics> {
    ok(state.hub.realtime.current_metrics().await)
}

/// `GET /api/pipeline/live-stats`.
async fn live_stats(State(state): State<AppState>) -> ApiResult<SystemStatus> {
    ok(state.hub.realtime.current_status().await)
}

//! Health check controller.

use crate::responses::{ok, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use pipeline_observability::health::HealthSnapshot;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness/readiness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Creates the liveness/readiness router, mounted outside any API gate.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
}

/// Creates the `/api/health` router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/pipeline-health", get(pipeline_health))
        .route("/history", get(history))
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, body = HealthResponse)))]
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy".to_string(), version: env!("CARGO_PKG_VERSION").to_string() })
}

#[utoipa::path(get, path = "/ready", tag = "health", responses((status = 200, description = "ready")))]
async fn readiness_check() -> impl IntoResponse {
    StatusCode::OK
}

#[utoipa::path(get, path = "/live", tag = "health", responses((status = 200, description = "alive")))]
async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}

/// `GET /api/health/pipeline-health`.
async fn pipeline_health(State(state): State<AppState>) -> ApiResult<HealthSnapshot> {
    let snapshot = state.hub.health.check_once().await;
    ok(snapshot)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// `GET /api/health/history?limit`.
async fn history(State(state): State<AppState>, Query(params): Query<HistoryQuery>) -> ApiResult<Vec<HealthSnapshot>> {
    let mut history = state.hub.health.history().await;
    if let Some(limit) = params.limit {
        let start = history.len().saturating_sub(limit);
        history = history.split_off(start);
    }
    ok(history)
}

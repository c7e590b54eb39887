//! Queue administration controller: paginated contents, batch mutation, and reorder.

use crate::responses::{ok, ApiResult, AppError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use pipeline_core::PipelineError;
use pipeline_observability::health::ComponentStatus;
use pipeline_observability::queue_manager::{
    BatchOp, BatchOperationResult, QueueItem, QueueKind, QueuePage, QueueStats, ReorderCriterion,
};
use serde::{Deserialize, Serialize};

/// Creates the `/api/queue` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/contents", get(contents))
        .route("/operations/history", get(operations_history))
        .route("/dashboard-data", get(dashboard_data))
        .route("/health", get(health))
        .route("/batch-operation", post(batch_operation))
        .route("/clear", delete(clear))
        .route("/reorder", post(reorder))
}

fn parse_queue_kind(s: &str) -> Result<QueueKind, AppError> {
    match s {
        "main" => Ok(QueueKind::Main),
        "deadletter" | "dead_letter" => Ok(QueueKind::DeadLetter),
        other => Err(AppError(PipelineError::validation(format!("unknown queue kind: {other}")))),
    }
}

fn parse_batch_op(s: &str) -> Result<BatchOp, AppError> {
    match s {
        "delete" => Ok(BatchOp::Delete),
        "retry" => Ok(BatchOp::Retry),
        "move_to_main" => Ok(BatchOp::MoveToMain),
        "move_to_deadletter" => Ok(BatchOp::MoveToDeadletter),
        "clear" => Ok(BatchOp::Clear),
        other => Err(AppError(PipelineError::validation(format!("unknown batch operation: {other}")))),
    }
}

/// `GET /api/queue/stats`.
async fn stats(State(state): State<AppState>) -> ApiResult<QueueStats> {
    ok(state.hub.queue_manager.stats().await?)
}

#[derive(Debug, Deserialize)]
pub struct ContentsQuery {
    #[serde(default = "ContentsQuery::default_queue")]
    pub queue: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "ContentsQuery::default_limit")]
    pub limit: usize,
}

impl ContentsQuery {
    fn default_queue() -> String {
        "main".to_string()
    }
    fn default_limit() -> usize {
        50
    }
}

/// `GET /api/queue/contents?queue=&offset=&limit=`.
async fn contents(State(state): State<AppState>, Query(params): Query<ContentsQuery>) -> ApiResult<QueuePage> {
    let kind = parse_queue_kind(&params.queue)?;
    ok(state.hub.queue_manager.contents(kind, params.offset, params.limit).await?)
}

/// `GET /api/queue/operations/history`.
async fn operations_history(State(state): State<AppState>) -> ApiResult<Vec<BatchOperationResult>> {
    ok(state.hub.queue_manager.operation_history().await)
}

#[derive(Debug, Serialize)]
pub struct QueueDashboardData {
    pub stats: QueueStats,
    pub recent_operations: Vec<BatchOperationResult>,
    pub main_preview: Vec<QueueItem>,
}

/// `GET /api/queue/dashboard-data`.
async fn dashboard_data(State(state): State<AppState>) -> ApiResult<QueueDashboardData> {
    let stats = state.hub.queue_manager.stats().await?;
    let recent_operations = state.hub.queue_manager.operation_history().await;
    let main_preview = state.hub.queue_manager.contents(QueueKind::Main, 0, 20).await?.entries;
    ok(QueueDashboardData { stats, recent_operations, main_preview })
}

#[derive(Debug, Serialize)]
pub struct QueueHealth {
    pub status: ComponentStatus,
    pub details: String,
}

/// `GET /api/queue/health`.
async fn health(State(state): State<AppState>) -> ApiResult<QueueHealth> {
    let snapshot = state.hub.health.check_once().await;
    let component = snapshot.components.get("queue").cloned().unwrap_or(pipeline_observability::health::ComponentHealth {
        status: ComponentStatus::Healthy,
        response_time_ms: 0,
        details: "no queue component reported".to_string(),
    });
    ok(QueueHealth { status: component.status, details: component.details })
}

#[derive(Debug, Deserialize)]
pub struct BatchOperationRequest {
    pub operation: String,
    pub queue: String,
    #[serde(default)]
    pub positions: Vec<usize>,
}

/// `POST /api/queue/batch-operation`.
async fn batch_operation(
    State(state): State<AppState>,
    Json(request): Json<BatchOperationRequest>,
) -> ApiResult<BatchOperationResult> {
    let op = parse_batch_op(&request.operation)?;
    let source = parse_queue_kind(&request.queue)?;
    let result = state.hub.queue_manager.batch_operation(op, source, request.positions).await?;
    state.hub.realtime.broadcast(pipeline_observability::realtime::PushEvent::QueueOperationCompleted {
        result: result.clone(),
    });
    ok(result)
}

#[derive(Debug, Deserialize)]
pub struct ClearQuery {
    pub queue: String,
}

/// `DELETE /api/queue/clear?queue=`.
async fn clear(State(state): State<AppState>, Query(params): Query<ClearQuery>) -> Result<StatusCode, AppError> {
    let source = parse_queue_kind(&params.queue)?;
    let result = state.hub.queue_manager.batch_operation(BatchOp::Clear, source, Vec::new()).await?;
    state.hub.realtime.broadcast(pipeline_observability::realtime::PushEvent::QueueCleared {
        queue: params.queue,
        removed: result.successful as u64,
    });
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub queue: String,
    pub criterion: String,
    #[serde(default)]
    pub order: Option<Vec<usize>>,
}

/// `POST /api/queue/reorder`.
async fn reorder(State(state): State<AppState>, Json(request): Json<ReorderRequest>) -> ApiResult<usize> {
    let kind = parse_queue_kind(&request.queue)?;
    let criterion = match request.criterion.as_str() {
        "priority" => ReorderCriterion::Priority,
        "retry_count" => ReorderCriterion::RetryCount,
        "queued_at" => ReorderCriterion::QueuedAt,
        "explicit_permutation" => {
            ReorderCriterion::ExplicitPermutation(request.order.ok_or_else(|| {
                AppError(PipelineError::validation("explicit_permutation requires an order array"))
            })?)
        }
        other => return Err(AppError(PipelineError::validation(format!("unknown reorder criterion: {other}")))),
    };

    let count = state.hub.queue_manager.reorder(kind, criterion).await?;
    state.hub.realtime.broadcast(pipeline_observability::realtime::PushEvent::QueueReordered {
        queue: request.queue,
        count,
    });
    ok(count)
}

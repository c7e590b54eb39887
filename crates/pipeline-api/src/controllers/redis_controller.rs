//! Redis-backed queue status and dead-letter listing.

use crate::extractors::PaginationQuery;
use crate::responses::{ok, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use pipeline_observability::queue_manager::{QueueKind, QueuePage, QueueStats};

/// Creates the `/api/redis` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/queue-status", get(queue_status))
        .route("/dead-letter", get(dead_letter))
}

/// `GET /api/redis/queue-status`.
async fn queue_status(State(state): State<AppState>) -> ApiResult<QueueStats> {
    let stats = state.hub.queue_manager.stats().await?;
    ok(stats)
}

/// `GET /api/redis/dead-letter?limit&offset`.
async fn dead_letter(State(state): State<AppState>, Query(page): Query<PaginationQuery>) -> ApiResult<QueuePage> {
    let entries = state.hub.queue_manager.contents(QueueKind::DeadLetter, page.offset, page.limit).await?;
    ok(entries)
}

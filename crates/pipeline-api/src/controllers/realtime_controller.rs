//! Real-time monitor controls and the push-plane WebSocket.

use crate::responses::{ok, ApiResult};
use crate::state::AppState;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use pipeline_observability::realtime::{PipelineMetrics, PushEvent, SystemStatus};
use serde::Serialize;
use tracing::{debug, warn};

/// Creates the `/api/realtime` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start))
        .route("/stop", post(stop))
        .route("/status", get(status))
        .route("/current-metrics", get(current_metrics))
        .route("/current-status", get(current_status))
        .route("/metrics-history", get(metrics_history))
        .route("/status-history", get(status_history))
        .route("/dashboard-data", get(dashboard_data))
        .route("/websocket-info", get(websocket_info))
        .route("/broadcast-test", post(broadcast_test))
        .route("/ws", get(websocket_handler))
}

#[derive(Debug, Serialize)]
pub struct RealtimeStatus {
    pub enabled: bool,
    pub subscriber_count: usize,
}

/// `POST /api/realtime/start`.
async fn start(State(state): State<AppState>) -> ApiResult<RealtimeStatus> {
    state.hub.realtime.set_enabled(true);
    ok(RealtimeStatus { enabled: true, subscriber_count: state.hub.realtime.subscriber_count() })
}

/// `POST /api/realtime/stop`.
async fn stop(State(state): State<AppState>) -> ApiResult<RealtimeStatus> {
    state.hub.realtime.set_enabled(false);
    ok(RealtimeStatus { enabled: false, subscriber_count: state.hub.realtime.subscriber_count() })
}

/// `GET /api/realtime/status`.
async fn status(State(state): State<AppState>) -> ApiResult<RealtimeStatus> {
    ok(RealtimeStatus {
        enabled: state.hub.realtime.is_enabled(),
        subscriber_count: state.hub.realtime.subscriber_count(),
    })
}

/// `GET /api/realtime/current-metrics`.
async fn current_metrics(State(state): State<AppState>) -> ApiResult<PipelineMetrics> {
    ok(state.hub.realtime.current_metrics().await)
}

/// `GET /api/realtime/current-status`.
async fn current_status(State(state): State<AppState>) -> ApiResult<SystemStatus> {
    ok(state.hub.realtime.current_status().await)
}

/// `GET /api/realtime/metrics-history`.
async fn metrics_history(State(state): State<AppState>) -> ApiResult<Vec<PipelineMetrics>> {
    ok(state.hub.realtime.metrics_history().await)
}

/// `GET /api/realtime/status-history`.
async fn status_history(State(state): State<AppState>) -> ApiResult<Vec<SystemStatus>> {
    ok(state.hub.realtime.status_history().await)
}

#[derive(Debug, Serialize)]
pub struct RealtimeDashboardData {
    pub status: RealtimeStatus,
    pub metrics_history: Vec<PipelineMetrics>,
    pub status_history: Vec<SystemStatus>,
}

/// `GET /api/realtime/dashboard-data`.
async fn dashboard_data(State(state): State<AppState>) -> ApiResult<RealtimeDashboardData> {
    ok(RealtimeDashboardData {
        status: RealtimeStatus {
            enabled: state.hub.realtime.is_enabled(),
            subscriber_count: state.hub.realtime.subscriber_count(),
        },
        metrics_history: state.hub.realtime.metrics_history().await,
        status_history: state.hub.realtime.status_history().await,
    })
}

#[derive(Debug, Serialize)]
pub struct WebsocketInfo {
    pub path: String,
    pub subscriber_count: usize,
}

/// `GET /api/realtime/websocket-info`.
async fn websocket_info(State(state): State<AppState>) -> ApiResult<WebsocketInfo> {
    ok(WebsocketInfo { path: "/api/realtime/ws".to_string(), subscriber_count: state.hub.realtime.subscriber_count() })
}

#[derive(Debug, serde::Deserialize)]
pub struct BroadcastTestRequest {
    #[serde(default = "BroadcastTestRequest::default_message")]
    pub message: String,
}

impl BroadcastTestRequest {
    fn default_message() -> String {
        "test broadcast".to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct BroadcastTestResult {
    pub delivered_to: usize,
}

/// `POST /api/realtime/broadcast-test`.
async fn broadcast_test(
    State(state): State<AppState>,
    Json(request): Json<BroadcastTestRequest>,
) -> ApiResult<BroadcastTestResult> {
    let delivered_to = state.hub.realtime.broadcast(PushEvent::TestBroadcast { message: request.message });
    ok(BroadcastTestResult { delivered_to })
}

/// `GET /api/realtime/ws` — upgrades to the push-plane WebSocket.
async fn websocket_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forwards every [`PushEvent`] to the socket as JSON until the client disconnects or
/// the subscriber falls behind and is evicted; a failed send to one socket never
/// blocks any other subscriber, since each connection owns its own receiver.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut rx = state.hub.realtime.subscribe();
    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!(error = %e, "failed to serialize push event");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            debug!("push-channel subscriber disconnected");
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "push-channel subscriber lagged, dropping buffered events");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => continue,
                }
            }
        }
    }
}

//! # Pipeline API
//!
//! REST API and push-channel layer for the job pipeline observability platform.
//! Exposes C9-C12 (health, real-time metrics, error visualization, queue
//! administration) over HTTP and a WebSocket push channel.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use openapi::*;
pub use router::*;
pub use state::*;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use pipeline_config::ServerConfig;
    use pipeline_core::{CorrelationId, DeadLetterEntry, Job, JobId, QueueEntry, Result};
    use pipeline_observability::health::AlwaysResponsive;
    use pipeline_observability::ObservabilityHub;
    use pipeline_queue::{DurableQueue, QueueList};
    use pipeline_store::{AddOutcome, JobStore, StoreStats, StoredJobRecord};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestQueue {
        main: Vec<Job>,
    }

    #[async_trait]
    impl DurableQueue for TestQueue {
        async fn enqueue(&self, _entry: QueueEntry) -> Result<()> {
            Ok(())
        }
        async fn dequeue(&self, _timeout: Duration) -> Result<Option<QueueEntry>> {
            Ok(None)
        }
        async fn length(&self, list: QueueList) -> Result<u64> {
            Ok(match list {
                QueueList::Main => self.main.len() as u64,
                QueueList::DeadLetter => 0,
            })
        }
        async fn range(&self, list: QueueList, offset: usize, limit: usize) -> Result<Vec<QueueEntry>> {
            Ok(match list {
                QueueList::Main => self.main.iter().skip(offset).take(limit).cloned().collect(),
                QueueList::DeadLetter => Vec::new(),
            })
        }
        async fn remove_at(&self, _list: QueueList, _position: usize) -> Result<bool> {
            Ok(false)
        }
        async fn move_to_deadletter(&self, _entry: DeadLetterEntry) -> Result<()> {
            Ok(())
        }
        async fn clear(&self, _list: QueueList) -> Result<u64> {
            Ok(0)
        }
        async fn find(&self, _job_id: JobId) -> Result<Option<QueueEntry>> {
            Ok(None)
        }
        async fn find_by_correlation(&self, _correlation_id: CorrelationId) -> Result<Vec<QueueEntry>> {
            Ok(Vec::new())
        }
        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    struct TestStore;

    #[async_trait]
    impl JobStore for TestStore {
        async fn add_job(&self, _job: &Job, _analysis_data: Option<&serde_json::Value>) -> Result<AddOutcome> {
            Ok(AddOutcome::Inserted)
        }
        async fn lookup_by_hash(&self, _content_hash: &str) -> Result<Option<StoredJobRecord>> {
            Ok(None)
        }
        async fn count(&self) -> Result<u64> {
            Ok(0)
        }
        async fn stats(&self) -> Result<StoreStats> {
            Ok(StoreStats { total: 0, by_status: Vec::new(), last_24h: 0 })
        }
        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn test_router() -> axum::Router {
        let queue: Arc<dyn DurableQueue> = Arc::new(TestQueue { main: vec![Job::new("Engineer", "Acme", None)] });
        let store: Arc<dyn JobStore> = Arc::new(TestStore);
        let hub = Arc::new(ObservabilityHub::new(
            queue,
            store,
            Arc::new(AlwaysResponsive),
            pipeline_observability::realtime::new_push_channel(),
            Duration::from_secs(30),
            Duration::from_secs(900),
            Duration::from_secs(5),
        ));
        let state = state::AppState::new(hub);
        router::create_router(state, &ServerConfig::default())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_liveness_endpoint_returns_ok() {
        let app = test_router();
        let response =
            app.oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_endpoint_reports_status() {
        let app = test_router();
        let response =
            app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_pipeline_health_endpoint_uses_hub() {
        let app = test_router();
        let response = app
            .oneshot(Request::builder().uri("/api/health/pipeline-health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["success"].as_bool().unwrap());
        assert!(body["data"]["components"].is_object());
    }

    #[tokio::test]
    async fn test_queue_status_reports_main_length() {
        let app = test_router();
        let response = app
            .oneshot(Request::builder().uri("/api/redis/queue-status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["main_length"], 1);
    }

    #[tokio::test]
    async fn test_queue_contents_paginates_main_queue() {
        let app = test_router();
        let response = app
            .oneshot(Request::builder().uri("/api/queue/contents?queue=main&offset=0&limit=10").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_queue_contents_rejects_unknown_queue_kind() {
        let app = test_router();
        let response = app
            .oneshot(Request::builder().uri("/api/queue/contents?queue=bogus").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_errors_summary_endpoint_responds() {
        let app = test_router();
        let response = app
            .oneshot(Request::builder().uri("/api/errors/summary").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["total_errors"], 0);
    }

    #[tokio::test]
    async fn test_realtime_broadcast_test_reports_zero_subscribers() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/realtime/broadcast-test")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["delivered_to"], 0);
    }

    #[tokio::test]
    async fn test_unknown_job_details_returns_404() {
        let app = test_router();
        let response = app
            .oneshot(Request::builder().uri("/api/errors/job/does-not-exist").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_swagger_ui_is_mounted() {
        let app = test_router();
        let response =
            app.oneshot(Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

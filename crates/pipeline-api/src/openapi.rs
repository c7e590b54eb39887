//! OpenAPI documentation configuration.
//!
//! Generates the OpenAPI/Swagger documentation for the pipeline observability REST API.

use crate::controllers::health_controller::HealthResponse;
use pipeline_core::ErrorResponse;
use utoipa::OpenApi;

/// OpenAPI documentation for the job pipeline observability API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Job Pipeline Observability API",
        version = "1.0.0",
        description = "REST API for job pipeline health, metrics, error visualization, and queue administration",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    paths(
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(HealthResponse, ErrorResponse)
    ),
    tags(
        (name = "health", description = "Liveness, readiness, and pipeline health endpoints"),
        (name = "redis", description = "Queue status and dead-letter listing"),
        (name = "pipeline", description = "Throughput and live system metrics"),
        (name = "errors", description = "Error visualization and dead-letter triage"),
        (name = "queue", description = "Queue contents, batch operations, and reorder"),
        (name = "realtime", description = "Real-time monitor controls and push-plane WebSocket"),
    )
)]
pub struct ApiDoc;


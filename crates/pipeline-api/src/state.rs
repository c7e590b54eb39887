//! Application state for Axum handlers.

use pipeline_observability::ObservabilityHub;
use std::sync::Arc;

/// Shared application state: a single handle to the observability hub, threaded
/// into every controller via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<ObservabilityHub>,
}

impl AppState {
    /// Creates a new application state.
    #[must_use]
    pub fn new(hub: Arc<ObservabilityHub>) -> Self {
        Self { hub }
    }
}

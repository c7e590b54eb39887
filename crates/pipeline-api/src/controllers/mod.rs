//! REST API controllers.

pub mod errors_controller;
pub mod health_controller;
pub mod pipeline_controller;
pub mod queue_controller;
pub mod realtime_controller;
pub mod redis_controller;

pub use health_controller::*;

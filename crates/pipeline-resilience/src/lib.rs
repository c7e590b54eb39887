//! # Pipeline Resilience
//!
//! Resilience patterns shared by the queue, store, and observability crates:
//! circuit breaker, retry-with-backoff, and timeout wrapping.

pub mod circuit_breaker;
pub mod retry;
pub mod timeout;

pub use circuit_breaker::*;
pub use retry::*;
pub use timeout::*;

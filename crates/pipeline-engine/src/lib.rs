//! # Pipeline Engine
//!
//! The three worker stages (C5-C7: processing, analysis, storage) and the
//! supervisor (C8) that owns their channels, worker pools, and shutdown.
//!
//! ```text
//! DurableQueue ──▶ processing ──▶ analysis ──▶ storage ──▶ JobStore
//!                       │              │            │
//!                   dead-letter   (best effort)  dead-letter on terminal failure
//! ```
//!
//! Analysis failure is non-fatal: a job that times out or whose analyzer errors
//! still reaches storage, just without annotations. Storage failure is terminal
//! for the job; it is not re-enqueued automatically.

pub mod analyzer;
pub mod correlation;
pub mod metrics;
pub mod stages;
pub mod supervisor;

pub use analyzer::{JobAnalyzer, NoopAnalyzer};
pub use stages::AnalyzedJob;
pub use supervisor::PipelineSupervisor;

/// Re-export of commonly used types for downstream crates.
pub mod prelude {
    pub use crate::analyzer::{JobAnalyzer, NoopAnalyzer};
    pub use crate::correlation::{log_job_event, LogLevel};
    pub use crate::stages::AnalyzedJob;
    pub use crate::supervisor::PipelineSupervisor;
}

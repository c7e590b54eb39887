//! The three pipeline stages (C5-C7): processing, analysis, storage.

pub mod analysis;
pub mod processing;
pub mod storage;

use pipeline_core::Job;
use serde_json::Value;

/// Wire form carried on the analysis→storage channel: a job plus whatever
/// annotations the analyzer produced for it.
#[derive(Debug, Clone)]
pub struct AnalyzedJob {
    pub job: Job,
    pub analysis_data: Option<Value>,
}

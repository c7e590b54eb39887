//! The persisted form of a [`Job`] once it has passed through the store.

use chrono::{DateTime, Utc};
use pipeline_core::Job;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A job row as it sits in the `jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredJobRecord {
    #[serde(flatten)]
    pub job: Job,
    pub applied: bool,
    pub analysis_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The outcome of [`crate::store::JobStore::add_job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new row was inserted.
    Inserted,
    /// `content_hash` already existed; no row was written.
    Duplicate,
}

/// Aggregate counts returned by [`crate::store::JobStore::stats`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total: i64,
    pub by_status: Vec<StatusCount>,
    pub last_24h: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

//! The `Job` record and its queue/dead-letter wire forms — the data model every
//! pipeline crate passes around.

use crate::id::{CorrelationId, JobId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use sha2::{Digest, Sha256};

/// Lifecycle state of a job as it moves through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Freshly scraped, not yet enqueued for processing.
    Scraped,
    /// Dequeued and running through the processing stage.
    Processing,
    /// Processing succeeded and the analyzer has annotated it (or skipped, non-fatally).
    Analyzed,
    /// Persisted to the store.
    Saved,
    /// Rejected by the store as a duplicate `content_hash`.
    Duplicate,
    /// Exhausted retries or hit a terminal error; moved to dead-letter.
    Failed,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Scraped
    }
}

/// A unit of work flowing through the pipeline.
///
/// `content_hash` is derived from `title + company + url` (lowercased) and is the
/// dedup key the store enforces uniqueness on; see [`Job::compute_content_hash`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub content_hash: String,

    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub posted_date: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub search_keyword: Option<String>,
    pub scraped_at: DateTime<Utc>,

    /// Fields the scraper emitted that this schema doesn't name explicitly.
    #[serde(default)]
    pub raw_data: Map<String, serde_json::Value>,

    pub status: JobStatus,
    pub correlation_id: CorrelationId,

    #[serde(default)]
    pub retry_count: u32,
    pub queued_at: DateTime<Utc>,
    #[serde(default)]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_reason: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
}

impl Job {
    /// Builds a fresh job from scraper output, assigning `job_id`, `correlation_id`,
    /// and `content_hash`.
    #[must_use]
    pub fn new(title: impl Into<String>, company: impl Into<String>, url: Option<String>) -> Self {
        let title = title.into();
        let company = company.into();
        let content_hash = Self::compute_content_hash(&title, &company, url.as_deref());
        let now = Utc::now();

        Self {
            job_id: JobId::new(),
            content_hash,
            title,
            company,
            location: None,
            url,
            summary: None,
            salary: None,
            job_type: None,
            posted_date: None,
            site: None,
            search_keyword: None,
            scraped_at: now,
            raw_data: Map::new(),
            status: JobStatus::Scraped,
            correlation_id: CorrelationId::new(),
            retry_count: 0,
            queued_at: now,
            failed_at: None,
            error_reason: None,
            stage: None,
        }
    }

    /// Derives the dedup hash from lowercased `title + company + url`.
    #[must_use]
    pub fn compute_content_hash(title: &str, company: &str, url: Option<&str>) -> String {
        let mut input = format!("{}{}", title.to_lowercase(), company.to_lowercase());
        if let Some(url) = url {
            input.push_str(&url.to_lowercase());
        }

        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// True once `title` and `company` are both non-empty, the requirement for a
    /// job to leave the processing stage.
    #[must_use]
    pub fn has_required_fields(&self) -> bool {
        !self.title.trim().is_empty() && !self.company.trim().is_empty()
    }

    /// Marks the job as failed, recording the reason, stage, and timestamp.
    pub fn mark_failed(&mut self, reason: impl Into<String>, stage: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error_reason = Some(reason.into());
        self.stage = Some(stage.into());
        self.failed_at = Some(Utc::now());
    }
}

/// Wire form of a [`Job`] as it sits in a durable queue list (C1). Serializes
/// identically to `Job` today; kept as a distinct type so the queue's wire format can
/// diverge from the in-process domain type without touching call sites.
pub type QueueEntry = Job;

/// A [`QueueEntry`] that has been moved to the dead-letter list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    #[serde(flatten)]
    pub entry: QueueEntry,
    pub error_reason: String,
    pub failed_at: DateTime<Utc>,
    #[serde(default)]
    pub stage: Option<String>,
}

impl DeadLetterEntry {
    /// Wraps a queue entry that has just failed terminally.
    #[must_use]
    pub fn from_entry(mut entry: QueueEntry, reason: impl Into<String>, stage: Option<String>) -> Self {
        let reason = reason.into();
        entry.mark_failed(reason.clone(), stage.clone().unwrap_or_default());
        let failed_at = entry.failed_at.unwrap_or_else(Utc::now);

        Self {
            entry,
            error_reason: reason,
            failed_at,
            stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_case_insensitive() {
        let a = Job::compute_content_hash("Senior Engineer", "Acme", Some("https://x/1"));
        let b = Job::compute_content_hash("senior engineer", "ACME", Some("HTTPS://X/1"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_hash_without_url() {
        let a = Job::compute_content_hash("Engineer", "Acme", None);
        let b = Job::compute_content_hash("Engineer", "Acme", None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_has_required_fields() {
        let job = Job::new("Engineer", "Acme", None);
        assert!(job.has_required_fields());

        let mut blank = job.clone();
        blank.title = "   ".to_string();
        assert!(!blank.has_required_fields());
    }

    #[test]
    fn test_mark_failed_sets_terminal_fields() {
        let mut job = Job::new("Engineer", "Acme", None);
        job.mark_failed("analyzer timeout", "analysis");

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_reason.as_deref(), Some("analyzer timeout"));
        assert_eq!(job.stage.as_deref(), Some("analysis"));
        assert!(job.failed_at.is_some());
    }

    #[test]
    fn test_dead_letter_entry_from_entry() {
        let job = Job::new("Engineer", "Acme", None);
        let correlation_id = job.correlation_id;
        let dlq = DeadLetterEntry::from_entry(job, "max retries exceeded", Some("processing".to_string()));

        assert_eq!(dlq.entry.correlation_id, correlation_id);
        assert_eq!(dlq.error_reason, "max retries exceeded");
        assert_eq!(dlq.stage.as_deref(), Some("processing"));
    }
}

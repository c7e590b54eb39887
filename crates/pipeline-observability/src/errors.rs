//! Error Visualization (C11): reads the dead-letter list and buckets failures by
//! type, stage, company, and time for dashboards and operator triage.

use crate::realtime::SampleTrend;
use chrono::{DateTime, TimeZone, Timelike, Utc};
use pipeline_core::{DeadLetterEntry, PipelineError};
use pipeline_queue::{DurableQueue, QueueList};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const RECENT_WINDOW_HOURS: i64 = 1;
const TOP_N_ERROR_TYPES: usize = 5;
const HIGH_RETRY_THRESHOLD: u32 = 2;

const CRITICAL_ERROR_CLASSES: &[&str] = &[
    "rate_limit_exceeded",
    "authentication_failed",
    "permission_denied",
    "system_resource_exhausted",
    "data_corruption",
];

/// Top-level error statistics, `GET /api/errors/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub timestamp: DateTime<Utc>,
    pub total_errors: u64,
    pub error_rate_percent: f64,
    pub critical_count: u64,
    pub recent_count: u64,
    pub top_error_types: Vec<ErrorTypeCount>,
    pub trend: SampleTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorTypeCount {
    pub error_type: String,
    pub count: u64,
    pub percentage: f64,
}

/// Per-error breakdown, `GET /api/errors/failed-jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedJobsAnalysis {
    pub by_error_type: HashMap<String, Vec<JobErrorExample>>,
    pub by_stage: HashMap<String, u64>,
    pub by_company: HashMap<String, u64>,
    pub hourly_distribution: HashMap<u32, u64>,
    pub retry_count_histogram: HashMap<u32, u64>,
    pub correlation_clusters: HashMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobErrorExample {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub error_reason: String,
    pub retry_count: u32,
}

/// Hourly error buckets, `GET /api/errors/timeline`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorTimeline {
    pub buckets: Vec<ErrorTimelineBucket>,
    pub trend: SampleTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorTimelineBucket {
    pub hour: DateTime<Utc>,
    pub count: u64,
    pub by_type: HashMap<String, u64>,
}

/// A single dead-letter entry plus related entries, `GET /api/errors/job/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub entry: DeadLetterEntry,
    pub related_by_correlation: Vec<DeadLetterEntry>,
    pub related_by_company: Vec<DeadLetterEntry>,
    pub related_by_type: Vec<DeadLetterEntry>,
}

/// Reads and summarizes the dead-letter list. Holds no state of its own; every call
/// re-reads `queue` so results always reflect the current dead-letter contents.
pub struct ErrorVisualization {
    queue: Arc<dyn DurableQueue>,
}

impl ErrorVisualization {
    #[must_use]
    pub fn new(queue: Arc<dyn DurableQueue>) -> Self {
        Self { queue }
    }

    async fn all_entries(&self) -> Vec<DeadLetterEntry> {
        let len = self.queue.length(QueueList::DeadLetter).await.unwrap_or(0) as usize;
        self.dead_letter_page(0, len.max(1)).await
    }

    /// Reads a page of the dead-letter list as [`DeadLetterEntry`], decoding corrupt
    /// rows into a synthetic `data_corruption` entry rather than dropping them.
    async fn dead_letter_page(&self, offset: usize, limit: usize) -> Vec<DeadLetterEntry> {
        let entries = self.queue.range(QueueList::DeadLetter, offset, limit).await.unwrap_or_default();
        entries
            .into_iter()
            .map(|job| DeadLetterEntry {
                error_reason: job.error_reason.clone().unwrap_or_else(|| "unknown".to_string()),
                failed_at: job.failed_at.unwrap_or_else(Utc::now),
                stage: job.stage.clone(),
                entry: job,
            })
            .collect()
    }

    fn error_type_of(entry: &DeadLetterEntry) -> String {
        error_type_from_reason(&entry.error_reason)
    }

    fn is_critical(entry: &DeadLetterEntry) -> bool {
        entry.entry.retry_count > HIGH_RETRY_THRESHOLD
            || CRITICAL_ERROR_CLASSES.contains(&Self::error_type_of(entry).as_str())
    }

    /// Whether an error type string is in the configured critical-error classes;
    /// exposed for the API layer's `/api/errors/categories` breakdown.
    #[must_use]
    pub fn is_critical_error_type(error_type: &str) -> bool {
        CRITICAL_ERROR_CLASSES.contains(&error_type)
    }

    /// `GET /api/errors/summary`.
    pub async fn summary(&self, total_jobs: u64) -> ErrorSummary {
        let entries = self.all_entries().await;
        let total_errors = entries.len() as u64;
        let error_rate_percent = if total_jobs == 0 { 0.0 } else { (total_errors as f64 / total_jobs as f64) * 100.0 };

        let mut counts: HashMap<String, u64> = HashMap::new();
        for entry in &entries {
            *counts.entry(Self::error_type_of(entry)).or_insert(0) += 1;
        }
        let mut top: Vec<_> = counts.into_iter().collect();
        top.sort_by(|a, b| b.1.cmp(&a.1));
        top.truncate(TOP_N_ERROR_TYPES);
        let top_error_types = top
            .into_iter()
            .map(|(error_type, count)| ErrorTypeCount {
                percentage: if total_errors == 0 { 0.0 } else { (count as f64 / total_errors as f64) * 100.0 },
                error_type,
                count,
            })
            .collect();

        let critical_count = entries.iter().filter(|e| Self::is_critical(e)).count() as u64;

        let cutoff = Utc::now() - chrono::Duration::hours(RECENT_WINDOW_HOURS);
        let recent_count = entries.iter().filter(|e| e.failed_at > cutoff).count() as u64;

        ErrorSummary {
            timestamp: Utc::now(),
            total_errors,
            error_rate_percent,
            critical_count,
            recent_count,
            top_error_types,
            trend: SampleTrend::Stable,
        }
    }

    /// `GET /api/errors/failed-jobs`.
    pub async fn failed_jobs_analysis(&self) -> FailedJobsAnalysis {
        let entries = self.all_entries().await;

        let mut by_error_type: HashMap<String, Vec<JobErrorExample>> = HashMap::new();
        let mut by_stage: HashMap<String, u64> = HashMap::new();
        let mut by_company: HashMap<String, u64> = HashMap::new();
        let mut hourly_distribution: HashMap<u32, u64> = HashMap::new();
        let mut retry_count_histogram: HashMap<u32, u64> = HashMap::new();
        let mut correlation_clusters: HashMap<String, u64> = HashMap::new();

        for entry in &entries {
            let error_type = Self::error_type_of(entry);
            by_error_type.entry(error_type).or_default().push(JobErrorExample {
                job_id: entry.entry.job_id.to_string(),
                title: entry.entry.title.clone(),
                company: entry.entry.company.clone(),
                error_reason: entry.error_reason.clone(),
                retry_count: entry.entry.retry_count,
            });

            if let Some(stage) = &entry.stage {
                *by_stage.entry(stage.clone()).or_insert(0) += 1;
            }
            *by_company.entry(entry.entry.company.clone()).or_insert(0) += 1;
            *hourly_distribution.entry(entry.failed_at.hour()).or_insert(0) += 1;
            *retry_count_histogram.entry(entry.entry.retry_count).or_insert(0) += 1;
            *correlation_clusters.entry(entry.entry.correlation_id.to_string()).or_insert(0) += 1;
        }

        correlation_clusters.retain(|_, count| *count > 1);

        FailedJobsAnalysis {
            by_error_type,
            by_stage,
            by_company,
            hourly_distribution,
            retry_count_histogram,
            correlation_clusters,
        }
    }

    /// `GET /api/errors/timeline?hours=H`.
    pub async fn timeline(&self, hours: i64) -> ErrorTimeline {
        let entries = self.all_entries().await;
        let now = Utc::now();
        let mut buckets: Vec<ErrorTimelineBucket> = (0..hours)
            .rev()
            .map(|offset| {
                let ts = now - chrono::Duration::hours(offset);
                let hour = ts
                    .date_naive()
                    .and_hms_opt(ts.hour(), 0, 0)
                    .and_then(|naive| Utc.from_local_datetime(&naive).single())
                    .unwrap_or(now);
                ErrorTimelineBucket { hour, count: 0, by_type: HashMap::new() }
            })
            .collect();

        for entry in &entries {
            let age_hours = (now - entry.failed_at).num_hours();
            if age_hours < 0 || age_hours >= hours {
                continue;
            }
            let index = (hours - 1 - age_hours) as usize;
            if let Some(bucket) = buckets.get_mut(index) {
                bucket.count += 1;
                *bucket.by_type.entry(Self::error_type_of(entry)).or_insert(0) += 1;
            }
        }

        let counts: Vec<f64> = buckets.iter().map(|b| b.count as f64).collect();
        let trend = crate::realtime::trend_of(&counts);

        ErrorTimeline { buckets, trend }
    }

    /// `GET /api/errors/job/{id}`.
    pub async fn details(&self, job_id: &str) -> Result<ErrorDetails, PipelineError> {
        let entries = self.all_entries().await;
        let entry = entries
            .iter()
            .find(|e| e.entry.job_id.to_string() == job_id)
            .cloned()
            .ok_or_else(|| PipelineError::not_found("dead_letter_entry", job_id))?;

        let related_by_correlation = entries
            .iter()
            .filter(|e| e.entry.job_id.to_string() != job_id && e.entry.correlation_id == entry.entry.correlation_id)
            .cloned()
            .collect();
        let related_by_company = entries
            .iter()
            .filter(|e| e.entry.job_id.to_string() != job_id && e.entry.company == entry.entry.company)
            .cloned()
            .collect();
        let related_by_type = entries
            .iter()
            .filter(|e| e.entry.job_id.to_string() != job_id && Self::error_type_of(e) == Self::error_type_of(&entry))
            .cloned()
            .collect();

        Ok(ErrorDetails { entry, related_by_correlation, related_by_company, related_by_type })
    }
}

/// Maps a free-form error reason string onto the stable taxonomy codes from
/// `PipelineError::error_code`, falling back to `"unknown"`.
fn error_type_from_reason(reason: &str) -> String {
    const KNOWN: &[&str] = &[
        "missing_required_fields",
        "suitability_failed",
        "max_retries_exceeded",
        "analysis_failed",
        "database_save_failed",
        "connection_failed",
        "data_corruption",
        "rate_limit_exceeded",
        "authentication_failed",
        "permission_denied",
        "system_resource_exhausted",
    ];
    for code in KNOWN {
        if reason.starts_with(code) {
            return (*code).to_string();
        }
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_from_reason_matches_known_prefix() {
        assert_eq!(error_type_from_reason("max_retries_exceeded"), "max_retries_exceeded");
        assert_eq!(error_type_from_reason("suitability_failed"), "suitability_failed");
        assert_eq!(error_type_from_reason("something unexpected"), "unknown");
    }
}

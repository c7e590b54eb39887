//! The deduplicating job store (C2): `add_job` is race-safe against concurrent
//! inserts of the same `content_hash`, via a unique index and `ON CONFLICT DO
//! NOTHING` rather than a check-then-insert.

use crate::pool::DatabasePool;
use crate::record::{AddOutcome, StatusCount, StoredJobRecord, StoreStats};
use async_trait::async_trait;
use pipeline_core::{CorrelationId, Job, JobId, JobStatus, PipelineError, Result};
use sqlx::Row;
use std::sync::Arc;
use tracing::{debug, info};

/// Persistence surface for scraped jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts `job` (plus its analysis annotations, if any), deduplicating on
    /// `content_hash`. Returns [`AddOutcome::Duplicate`] without error if the hash
    /// already exists.
    async fn add_job(
        &self,
        job: &Job,
        analysis_data: Option<&serde_json::Value>,
    ) -> Result<AddOutcome>;

    /// Looks a stored job up by its content hash.
    async fn lookup_by_hash(&self, content_hash: &str) -> Result<Option<StoredJobRecord>>;

    /// Total number of stored jobs.
    async fn count(&self) -> Result<u64>;

    /// Aggregate counts: total, by status, and jobs added in the last 24 hours.
    async fn stats(&self) -> Result<StoreStats>;

    async fn health_check(&self) -> Result<()>;
}

/// Postgres-backed [`JobStore`].
pub struct PostgresJobStore {
    pool: Arc<DatabasePool>,
}

impl PostgresJobStore {
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    fn pg(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

fn row_to_record(row: sqlx::postgres::PgRow) -> Result<StoredJobRecord> {
    let job_id: uuid::Uuid = row.try_get("job_id")?;
    let correlation_id: uuid::Uuid = row.try_get("correlation_id")?;
    let status: String = row.try_get("status")?;
    let raw_data: serde_json::Value = row.try_get("raw_data")?;

    let job = Job {
        job_id: JobId::from_uuid(job_id),
        content_hash: row.try_get("content_hash")?,
        title: row.try_get("title")?,
        company: row.try_get("company")?,
        location: row.try_get("location")?,
        url: row.try_get("url")?,
        summary: row.try_get("summary")?,
        salary: row.try_get("salary")?,
        job_type: row.try_get("job_type")?,
        posted_date: row.try_get("posted_date")?,
        site: row.try_get("site")?,
        search_keyword: row.try_get("search_keyword")?,
        scraped_at: row.try_get("scraped_at")?,
        raw_data: match raw_data {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        },
        status: status_from_str(&status)?,
        correlation_id: CorrelationId::from(correlation_id),
        retry_count: row.try_get::<i32, _>("retry_count")? as u32,
        queued_at: row.try_get("queued_at")?,
        failed_at: row.try_get("failed_at")?,
        error_reason: row.try_get("error_reason")?,
        stage: row.try_get("stage")?,
    };

    Ok(StoredJobRecord {
        job,
        applied: row.try_get("applied")?,
        analysis_data: row.try_get("analysis_data")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn status_from_str(s: &str) -> Result<JobStatus> {
    match s {
        "scraped" => Ok(JobStatus::Scraped),
        "processing" => Ok(JobStatus::Processing),
        "analyzed" => Ok(JobStatus::Analyzed),
        "saved" => Ok(JobStatus::Saved),
        "duplicate" => Ok(JobStatus::Duplicate),
        "failed" => Ok(JobStatus::Failed),
        other => Err(PipelineError::DataCorruption(format!(
            "unknown job status in store row: {other}"
        ))),
    }
}

fn status_as_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Scraped => "scraped",
        JobStatus::Processing => "processing",
        JobStatus::Analyzed => "analyzed",
        JobStatus::Saved => "saved",
        JobStatus::Duplicate => "duplicate",
        JobStatus::Failed => "failed",
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn add_job(
        &self,
        job: &Job,
        analysis_data: Option<&serde_json::Value>,
    ) -> Result<AddOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (
                job_id, content_hash, title, company, location, url, summary, salary,
                job_type, posted_date, site, search_keyword, scraped_at, raw_data,
                status, correlation_id, retry_count, queued_at, failed_at, error_reason,
                stage, analysis_data
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21, $22
            )
            ON CONFLICT (content_hash) DO NOTHING
            "#,
        )
        .bind(job.job_id.into_inner())
        .bind(&job.content_hash)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.url)
        .bind(&job.summary)
        .bind(&job.salary)
        .bind(&job.job_type)
        .bind(&job.posted_date)
        .bind(&job.site)
        .bind(&job.search_keyword)
        .bind(job.scraped_at)
        .bind(serde_json::Value::Object(job.raw_data.clone()))
        .bind(status_as_str(job.status))
        .bind(job.correlation_id.into_inner())
        .bind(job.retry_count as i32)
        .bind(job.queued_at)
        .bind(job.failed_at)
        .bind(&job.error_reason)
        .bind(&job.stage)
        .bind(analysis_data.cloned())
        .execute(self.pg())
        .await?;

        if result.rows_affected() == 0 {
            debug!(content_hash = %job.content_hash, "duplicate job, skipped insert");
            Ok(AddOutcome::Duplicate)
        } else {
            info!(job_id = %job.job_id, "inserted job into store");
            Ok(AddOutcome::Inserted)
        }
    }

    async fn lookup_by_hash(&self, content_hash: &str) -> Result<Option<StoredJobRecord>> {
        let row = sqlx::query("SELECT * FROM jobs WHERE content_hash = $1")
            .bind(content_hash)
            .fetch_optional(self.pg())
            .await?;

        row.map(row_to_record).transpose()
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM jobs")
            .fetch_one(self.pg())
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count as u64)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let total_row = sqlx::query("SELECT COUNT(*) AS count FROM jobs")
            .fetch_one(self.pg())
            .await?;
        let total: i64 = total_row.try_get("count")?;

        let status_rows = sqlx::query("SELECT status, COUNT(*) AS count FROM jobs GROUP BY status")
            .fetch_all(self.pg())
            .await?;
        let by_status = status_rows
            .into_iter()
            .map(|row| {
                Ok(StatusCount {
                    status: row.try_get::<String, _>("status")?,
                    count: row.try_get::<i64, _>("count")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let last_24h_row = sqlx::query(
            "SELECT COUNT(*) AS count FROM jobs WHERE created_at >= now() - interval '24 hours'",
        )
        .fetch_one(self.pg())
        .await?;
        let last_24h: i64 = last_24h_row.try_get("count")?;

        Ok(StoreStats {
            total,
            by_status,
            last_24h,
        })
    }

    async fn health_check(&self) -> Result<()> {
        self.pool.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            JobStatus::Scraped,
            JobStatus::Processing,
            JobStatus::Analyzed,
            JobStatus::Saved,
            JobStatus::Duplicate,
            JobStatus::Failed,
        ] {
            let s = status_as_str(status);
            assert_eq!(status_from_str(s).unwrap(), status);
        }
    }

    #[test]
    fn test_status_from_unknown_str_errors() {
        assert!(status_from_str("bogus").is_err());
    }
}

//! PostgreSQL-backed job queue.
//!
//! The queue is the only shared coordination point between the dispatch
//! endpoint (writer), the workers (reader/writer) and the status endpoint
//! (reader). Claiming uses `FOR UPDATE SKIP LOCKED`, so at most one worker
//! executes a given job at a time; no other locking exists anywhere in the
//! pipeline.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::job::{ErrorKind, Job, JobPriority, JOB_COLUMNS};

/// A claimed job ready for execution.
#[derive(Debug)]
pub struct ClaimedJob {
    /// The job ID
    pub id: Uuid,
    /// The raw job record
    pub job: Job,
}

impl ClaimedJob {
    /// Deserialize the command payload.
    pub fn deserialize<C: DeserializeOwned>(&self) -> Result<C> {
        let args = self
            .job
            .args
            .as_ref()
            .ok_or_else(|| anyhow!("job {} has no args", self.id))?;
        serde_json::from_value(args.clone())
            .map_err(|e| anyhow!("failed to deserialize command: {}", e))
    }

    /// Get the command type (job_type)
    pub fn command_type(&self) -> &str {
        &self.job.job_type
    }
}

/// Metadata for command serialization.
///
/// Commands implement this trait to provide their job type and policies.
pub trait CommandMeta {
    /// The command type name (used as job_type).
    fn command_type(&self) -> &'static str;

    /// Optional priority override.
    fn priority(&self) -> JobPriority {
        JobPriority::Normal
    }

    /// Maximum retries for this command.
    fn max_retries(&self) -> i32 {
        3
    }
}

/// Trait for job queue operations.
///
/// Constructed explicitly at startup and passed to the dispatch endpoint,
/// the workers and the status endpoint as a dependency.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Durably enqueue a serialized command. Returns the new job id.
    ///
    /// This is the only suspension point on the dispatch path - a single
    /// insert, never a wait on execution.
    async fn enqueue_raw(
        &self,
        job_type: &str,
        args: serde_json::Value,
        priority: JobPriority,
        max_retries: i32,
    ) -> Result<Uuid>;

    /// Claim up to `limit` jobs for processing.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` for concurrent-safe claiming. Jobs
    /// whose lease expired while `running` are reclaimed here too.
    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedJob>>;

    /// Mark a job as successfully completed, storing its result payload.
    async fn mark_succeeded(&self, job_id: Uuid, result: serde_json::Value) -> Result<()>;

    /// Mark a job as failed.
    ///
    /// A retryable failure with retries remaining sends the same row back
    /// to `pending` with an exponential-backoff `next_run_at`; anything
    /// else is terminal.
    async fn mark_failed(&self, job_id: Uuid, error: &str, kind: ErrorKind) -> Result<()>;

    /// Extend the lease for a running job (heartbeat).
    async fn heartbeat(&self, job_id: Uuid) -> Result<()>;

    /// Read a job row by id (status endpoint).
    async fn find(&self, job_id: Uuid) -> Result<Option<Job>>;
}

/// Typed enqueue on top of the object-safe [`JobQueue`].
#[async_trait]
pub trait JobQueueExt: JobQueue {
    async fn enqueue<C>(&self, command: C) -> Result<Uuid>
    where
        C: CommandMeta + Serialize + Send,
    {
        let args = serde_json::to_value(&command)?;
        self.enqueue_raw(
            command.command_type(),
            args,
            command.priority(),
            command.max_retries(),
        )
        .await
    }
}

impl<Q: JobQueue + ?Sized> JobQueueExt for Q {}

/// Exponential backoff for retry scheduling, capped at one hour.
pub(crate) fn retry_delay_secs(retry_count: i32) -> i64 {
    2i64.pow(retry_count.clamp(0, 12) as u32).min(3600)
}

/// PostgreSQL-backed job queue implementation.
pub struct PostgresJobQueue {
    pool: PgPool,
    default_lease_ms: i64,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            default_lease_ms: 60_000, // 1 minute
        }
    }

    /// Create with a custom lease duration.
    pub fn with_lease_duration(pool: PgPool, lease_ms: i64) -> Self {
        Self {
            pool,
            default_lease_ms: lease_ms,
        }
    }
}

#[async_trait]
impl JobQueue for PostgresJobQueue {
    async fn enqueue_raw(
        &self,
        job_type: &str,
        args: serde_json::Value,
        priority: JobPriority,
        max_retries: i32,
    ) -> Result<Uuid> {
        let job = Job::for_command(job_type, args, priority, max_retries, self.default_lease_ms);
        let inserted = job.insert(&self.pool).await?;

        info!(job_id = %inserted.id, job_type = %job_type, "job enqueued");
        Ok(inserted.id)
    }

    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedJob>> {
        let sql = format!(
            r#"
            WITH next_jobs AS (
                SELECT id
                FROM jobs
                WHERE
                    (status = 'pending' AND (next_run_at IS NULL OR next_run_at <= NOW()))
                    OR (status = 'running' AND lease_expires_at < NOW())
                ORDER BY priority, COALESCE(next_run_at, created_at)
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE jobs
            SET
                status = 'running',
                lease_expires_at = NOW() + ($2 || ' milliseconds')::INTERVAL,
                worker_id = $3,
                updated_at = NOW()
            WHERE id IN (SELECT id FROM next_jobs)
            RETURNING {JOB_COLUMNS}
            "#
        );
        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(limit)
            .bind(self.default_lease_ms.to_string())
            .bind(worker_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs
            .into_iter()
            .map(|job| ClaimedJob { id: job.id, job })
            .collect())
    }

    async fn mark_succeeded(&self, job_id: Uuid, result: serde_json::Value) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'succeeded',
                result = $1,
                error_message = NULL,
                error_kind = NULL,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(result)
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str, kind: ErrorKind) -> Result<()> {
        let job = Job::find_by_id(job_id, &self.pool)
            .await?
            .ok_or_else(|| anyhow!("job {} not found", job_id))?;

        if kind.should_retry() && job.has_retries_left() {
            let delay_secs = retry_delay_secs(job.retry_count);
            let retry_at = Utc::now() + chrono::Duration::seconds(delay_secs);

            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'pending',
                    retry_count = retry_count + 1,
                    next_run_at = $1,
                    error_message = $2,
                    error_kind = $3,
                    lease_expires_at = NULL,
                    worker_id = NULL,
                    updated_at = NOW()
                WHERE id = $4
                "#,
            )
            .bind(retry_at)
            .bind(error)
            .bind(kind)
            .bind(job_id)
            .execute(&self.pool)
            .await?;

            info!(
                job_id = %job_id,
                retry_at = %retry_at,
                attempt = job.retry_count + 1,
                "job scheduled for retry"
            );
        } else {
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'failed',
                    error_message = $1,
                    error_kind = $2,
                    updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(error)
            .bind(kind)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn heartbeat(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET lease_expires_at = NOW() + ($1 || ' milliseconds')::INTERVAL,
                updated_at = NOW()
            WHERE id = $2 AND status = 'running'
            "#,
        )
        .bind(self.default_lease_ms.to_string())
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, job_id: Uuid) -> Result<Option<Job>> {
        Job::find_by_id(job_id, &self.pool).await
    }
}

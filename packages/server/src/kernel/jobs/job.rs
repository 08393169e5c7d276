//! Job row model for background scrape execution.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

/// `PENDING -> RUNNING -> {SUCCEEDED, FAILED}`. Transitions happen only
/// through the queue; a retried job goes back to `Pending` in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_priority", rename_all = "snake_case")]
pub enum JobPriority {
    Critical,
    High,
    #[default]
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "error_kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transient error - will retry if attempts remain
    #[default]
    Retryable,
    /// Permanent error - will not retry
    NonRetryable,
}

impl ErrorKind {
    /// Whether this error kind should trigger a retry
    pub fn should_retry(&self) -> bool {
        matches!(self, ErrorKind::Retryable)
    }
}

// ============================================================================
// Job Model
// ============================================================================

/// Column list shared by every query that reads a full job row.
pub(crate) const JOB_COLUMNS: &str = "id, job_type, args, status, priority, max_retries, \
     retry_count, next_run_at, lease_duration_ms, lease_expires_at, worker_id, \
     result, error_message, error_kind, created_at, updated_at";

#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Job {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub job_type: String,

    // Payload
    #[builder(default, setter(strip_option))]
    pub args: Option<serde_json::Value>,

    // State
    #[builder(default)]
    pub status: JobStatus,
    #[builder(default)]
    pub priority: JobPriority,

    // Retry policy
    #[builder(default = 3)]
    pub max_retries: i32,
    #[builder(default = 0)]
    pub retry_count: i32,
    #[builder(default, setter(strip_option))]
    pub next_run_at: Option<DateTime<Utc>>,

    // Lease management
    #[builder(default = 60_000)] // 1 minute
    pub lease_duration_ms: i64,
    #[builder(default, setter(strip_option))]
    pub lease_expires_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub worker_id: Option<String>,

    // Outcome
    #[builder(default, setter(strip_option))]
    pub result: Option<serde_json::Value>,
    #[builder(default, setter(strip_option))]
    pub error_message: Option<String>,
    #[builder(default, setter(strip_option))]
    pub error_kind: Option<ErrorKind>,

    // Timestamps
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a job for a serialized command.
    pub fn for_command(
        job_type: &str,
        args: serde_json::Value,
        priority: JobPriority,
        max_retries: i32,
        lease_duration_ms: i64,
    ) -> Self {
        Self::builder()
            .job_type(job_type.to_string())
            .args(args)
            .priority(priority)
            .max_retries(max_retries)
            .lease_duration_ms(lease_duration_ms)
            .build()
    }

    /// Check if the job is ready to run
    pub fn is_ready(&self) -> bool {
        if self.status != JobStatus::Pending {
            return false;
        }

        match self.next_run_at {
            None => true,
            Some(next_run) => next_run <= Utc::now(),
        }
    }

    pub fn has_retries_left(&self) -> bool {
        self.retry_count < self.max_retries
    }

    pub async fn find_by_id(id: Uuid, db: &PgPool) -> Result<Option<Self>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        let job = sqlx::query_as::<_, Self>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;

        Ok(job)
    }

    pub async fn insert(&self, db: &PgPool) -> Result<Self> {
        let sql = format!(
            r#"
            INSERT INTO jobs (
                id, job_type, args, status, priority, max_retries,
                retry_count, next_run_at, lease_duration_ms, lease_expires_at, worker_id,
                result, error_message, error_kind, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {JOB_COLUMNS}
            "#
        );
        let job = sqlx::query_as::<_, Self>(&sql)
            .bind(self.id)
            .bind(&self.job_type)
            .bind(&self.args)
            .bind(self.status)
            .bind(self.priority)
            .bind(self.max_retries)
            .bind(self.retry_count)
            .bind(self.next_run_at)
            .bind(self.lease_duration_ms)
            .bind(self.lease_expires_at)
            .bind(&self.worker_id)
            .bind(&self.result)
            .bind(&self.error_message)
            .bind(self.error_kind)
            .bind(self.created_at)
            .bind(self.updated_at)
            .fetch_one(db)
            .await?;

        Ok(job)
    }
}

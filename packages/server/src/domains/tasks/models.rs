//! Task rows produced by the ingestion endpoint.
//!
//! Scraped incidents become task rows. Inserts commit one row at a time -
//! the ingestion contract is per-record, not batched, so one bad record
//! never rolls back its neighbors.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::domains::scraping::{IncidentRecord, Priority, TaskStatus};

#[derive(FromRow, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub deadline: NaiveDateTime,
    pub user_id: i32,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable task, before the database assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub deadline: NaiveDateTime,
    pub user_id: i32,
    pub status: TaskStatus,
}

impl From<IncidentRecord> for NewTask {
    fn from(record: IncidentRecord) -> Self {
        Self {
            title: record.title,
            description: record.description,
            priority: record.priority,
            deadline: record.deadline,
            user_id: record.user_id,
            status: record.status,
        }
    }
}

/// Persistence seam for task rows.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert one task; commits independently of any other record.
    async fn insert(&self, task: NewTask) -> Result<Task>;

    /// Liveness probe for the health endpoint.
    async fn health_check(&self) -> Result<()>;
}

pub struct PostgresTaskStore {
    pool: PgPool,
}

impl PostgresTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn insert(&self, task: NewTask) -> Result<Task> {
        let inserted = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, priority, deadline, user_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, priority, deadline, user_id, status,
                      created_at, updated_at
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.deadline)
        .bind(task.user_id)
        .bind(task.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn health_check(&self) -> Result<()> {
        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await
        .map_err(|_| anyhow::anyhow!("health query timeout (>5s)"))??;

        Ok(())
    }
}

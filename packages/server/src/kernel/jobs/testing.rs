//! In-memory job queue for tests.
//!
//! Mirrors the PostgreSQL queue's state machine (including in-place retry
//! with backoff) without a database, so router and runner tests run
//! entirely in-process.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::job::{ErrorKind, Job, JobPriority, JobStatus};
use super::queue::{retry_delay_secs, ClaimedJob, JobQueue};

#[derive(Default)]
pub struct InMemoryJobQueue {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs ever enqueued (any status).
    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of one job row, for assertions.
    pub fn get(&self, job_id: Uuid) -> Option<Job> {
        self.jobs.lock().unwrap().get(&job_id).cloned()
    }

    /// Seed a pre-built job row, for status endpoint tests.
    pub fn seed(&self, job: Job) -> Uuid {
        let id = job.id;
        self.jobs.lock().unwrap().insert(id, job);
        id
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue_raw(
        &self,
        job_type: &str,
        args: serde_json::Value,
        priority: JobPriority,
        max_retries: i32,
    ) -> Result<Uuid> {
        let job = Job::for_command(job_type, args, priority, max_retries, 60_000);
        let id = job.id;
        self.jobs.lock().unwrap().insert(id, job);
        Ok(id)
    }

    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedJob>> {
        let mut jobs = self.jobs.lock().unwrap();

        let mut ready: Vec<Uuid> = jobs
            .values()
            .filter(|job| job.is_ready())
            .map(|job| job.id)
            .collect();
        ready.sort_by_key(|id| jobs[id].created_at);
        ready.truncate(limit.max(0) as usize);

        let mut claimed = Vec::with_capacity(ready.len());
        for id in ready {
            if let Some(job) = jobs.get_mut(&id) {
                job.status = JobStatus::Running;
                job.worker_id = Some(worker_id.to_string());
                job.lease_expires_at =
                    Some(Utc::now() + chrono::Duration::milliseconds(job.lease_duration_ms));
                job.updated_at = Utc::now();
                claimed.push(ClaimedJob {
                    id,
                    job: job.clone(),
                });
            }
        }

        Ok(claimed)
    }

    async fn mark_succeeded(&self, job_id: Uuid, result: serde_json::Value) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| anyhow!("job {} not found", job_id))?;
        job.status = JobStatus::Succeeded;
        job.result = Some(result);
        job.error_message = None;
        job.error_kind = None;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str, kind: ErrorKind) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| anyhow!("job {} not found", job_id))?;

        if kind.should_retry() && job.has_retries_left() {
            job.status = JobStatus::Pending;
            job.next_run_at =
                Some(Utc::now() + chrono::Duration::seconds(retry_delay_secs(job.retry_count)));
            job.retry_count += 1;
            job.lease_expires_at = None;
            job.worker_id = None;
        } else {
            job.status = JobStatus::Failed;
        }
        job.error_message = Some(error.to_string());
        job.error_kind = Some(kind);
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn heartbeat(&self, job_id: Uuid) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&job_id) {
            if job.status == JobStatus::Running {
                job.lease_expires_at =
                    Some(Utc::now() + chrono::Duration::milliseconds(job.lease_duration_ms));
                job.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn find(&self, job_id: Uuid) -> Result<Option<Job>> {
        Ok(self.jobs.lock().unwrap().get(&job_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_then_claim_runs_the_state_machine() {
        let queue = InMemoryJobQueue::new();
        let id = queue
            .enqueue_raw(
                "scrape_incidents",
                serde_json::json!({"url": "u"}),
                JobPriority::Normal,
                3,
            )
            .await
            .unwrap();

        assert_eq!(queue.get(id).unwrap().status, JobStatus::Pending);

        let claimed = queue.claim("w1", 10).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(queue.get(id).unwrap().status, JobStatus::Running);

        queue
            .mark_succeeded(id, serde_json::json!([1, 2]))
            .await
            .unwrap();
        let job = queue.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.result, Some(serde_json::json!([1, 2])));
    }

    #[tokio::test]
    async fn running_jobs_are_not_reclaimed() {
        let queue = InMemoryJobQueue::new();
        queue
            .enqueue_raw(
                "scrape_incidents",
                serde_json::json!({}),
                JobPriority::Normal,
                3,
            )
            .await
            .unwrap();

        assert_eq!(queue.claim("w1", 10).await.unwrap().len(), 1);
        assert_eq!(queue.claim("w2", 10).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn retryable_failure_requeues_with_backoff() {
        let queue = InMemoryJobQueue::new();
        let id = queue
            .enqueue_raw(
                "scrape_incidents",
                serde_json::json!({}),
                JobPriority::Normal,
                3,
            )
            .await
            .unwrap();
        queue.claim("w1", 1).await.unwrap();

        queue
            .mark_failed(id, "connection reset", ErrorKind::Retryable)
            .await
            .unwrap();

        let job = queue.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 1);
        assert!(job.next_run_at.unwrap() > Utc::now());
    }

    #[tokio::test]
    async fn non_retryable_failure_is_terminal() {
        let queue = InMemoryJobQueue::new();
        let id = queue
            .enqueue_raw(
                "scrape_incidents",
                serde_json::json!({}),
                JobPriority::Normal,
                3,
            )
            .await
            .unwrap();
        queue.claim("w1", 1).await.unwrap();

        queue
            .mark_failed(id, "callback rejected with HTTP 404", ErrorKind::NonRetryable)
            .await
            .unwrap();

        let job = queue.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_kind, Some(ErrorKind::NonRetryable));
    }

    #[tokio::test]
    async fn retries_exhaust_into_failed() {
        let queue = InMemoryJobQueue::new();
        let id = queue
            .enqueue_raw(
                "scrape_incidents",
                serde_json::json!({}),
                JobPriority::Normal,
                0,
            )
            .await
            .unwrap();
        queue.claim("w1", 1).await.unwrap();

        queue
            .mark_failed(id, "connection reset", ErrorKind::Retryable)
            .await
            .unwrap();

        assert_eq!(queue.get(id).unwrap().status, JobStatus::Failed);
    }
}

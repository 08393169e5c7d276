//! Job runner service for processing background jobs.
//!
//! The `JobRunner` is a background service that:
//! - Polls the queue for ready jobs
//! - Deserializes and executes jobs using the registry
//! - Stores results and handles status updates (succeeded/failed)
//! - Classifies failures for the queue's retry policy
//!
//! # Architecture
//!
//! ```text
//! JobRunner
//!     │
//!     ├─► Poll queue (claim jobs, SKIP LOCKED)
//!     ├─► Execute via JobRegistry (deserialize + call handler)
//!     └─► Mark succeeded with result / failed (queue handles retries)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::job::ErrorKind;
use super::queue::JobQueue;
use super::registry::SharedJobRegistry;
use crate::common::{ConfigurationError, DeliveryError};
use crate::kernel::ServerDeps;

/// Configuration for the job runner.
#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    /// Maximum number of jobs to claim at once
    pub batch_size: i64,
    /// How long to wait when no jobs are available
    pub poll_interval: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            poll_interval: Duration::from_secs(5),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl JobRunnerConfig {
    /// Create a new config with a specific worker ID.
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }
}

/// Background service that processes jobs from the queue.
///
/// Retries are handled by the job queue's `mark_failed` implementation;
/// the runner only classifies the error.
pub struct JobRunner {
    job_queue: Arc<dyn JobQueue>,
    registry: SharedJobRegistry,
    deps: Arc<ServerDeps>,
    config: JobRunnerConfig,
    shutdown: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new(
        job_queue: Arc<dyn JobQueue>,
        registry: SharedJobRegistry,
        deps: Arc<ServerDeps>,
    ) -> Self {
        Self {
            job_queue,
            registry,
            deps,
            config: JobRunnerConfig::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create with custom configuration.
    pub fn with_config(
        job_queue: Arc<dyn JobQueue>,
        registry: SharedJobRegistry,
        deps: Arc<ServerDeps>,
        config: JobRunnerConfig,
    ) -> Self {
        Self {
            job_queue,
            registry,
            deps,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a shutdown handle for graceful shutdown.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Request shutdown of the runner.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Run the job runner until shutdown is requested.
    pub async fn run(self) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "job runner starting"
        );

        loop {
            if self.is_shutdown_requested() {
                break;
            }

            let jobs = match self
                .job_queue
                .claim(&self.config.worker_id, self.config.batch_size)
                .await
            {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!(error = %e, "failed to claim jobs");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            if jobs.is_empty() {
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }

            debug!(count = jobs.len(), "claimed jobs");

            for job in jobs {
                if self.is_shutdown_requested() {
                    break;
                }

                let job_id = job.id;
                let job_type = job.command_type().to_string();

                debug!(job_id = %job_id, job_type = %job_type, "executing job");

                let result = self.registry.execute(&job, self.deps.clone()).await;

                match result {
                    Ok(payload) => {
                        info!(job_id = %job_id, job_type = %job_type, "job succeeded");
                        if let Err(e) = self.job_queue.mark_succeeded(job_id, payload).await {
                            error!(job_id = %job_id, error = %e, "failed to mark job as succeeded");
                        }
                    }
                    Err(e) => {
                        warn!(job_id = %job_id, job_type = %job_type, error = %e, "job failed");

                        let error_kind = classify_error(&e);

                        if let Err(mark_err) = self
                            .job_queue
                            .mark_failed(job_id, &e.to_string(), error_kind)
                            .await
                        {
                            error!(job_id = %job_id, error = %mark_err, "failed to mark job as failed");
                        }
                    }
                }
            }
        }

        info!(worker_id = %self.config.worker_id, "job runner stopped");
        Ok(())
    }

    /// Run until a shutdown signal is received.
    ///
    /// Convenience method that listens for Ctrl+C.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let shutdown = self.shutdown_handle();

        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
            shutdown.store(true, Ordering::SeqCst);
        });

        self.run().await
    }
}

/// Classify an error to determine retry behavior.
///
/// Typed pipeline errors carry their own retry semantics; anything else
/// falls back to string heuristics, defaulting to retryable (network
/// errors, timeouts).
fn classify_error(error: &anyhow::Error) -> ErrorKind {
    if let Some(delivery) = error.downcast_ref::<DeliveryError>() {
        return if delivery.is_retryable() {
            ErrorKind::Retryable
        } else {
            ErrorKind::NonRetryable
        };
    }

    if error.downcast_ref::<ConfigurationError>().is_some() {
        return ErrorKind::NonRetryable;
    }

    let error_str = error.to_string().to_lowercase();

    // Non-retryable: a payload that does not deserialize never will
    if error_str.contains("deserialize") || error_str.contains("unknown job type") {
        return ErrorKind::NonRetryable;
    }

    ErrorKind::Retryable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = JobRunnerConfig::default();
        assert_eq!(config.batch_size, 10);
        assert!(config.worker_id.starts_with("worker-"));
    }

    #[test]
    fn config_with_worker_id() {
        let config = JobRunnerConfig::with_worker_id("my-worker");
        assert_eq!(config.worker_id, "my-worker");
    }

    #[test]
    fn network_errors_are_retryable() {
        let error = anyhow::anyhow!("connection timeout");
        assert_eq!(classify_error(&error), ErrorKind::Retryable);
    }

    #[test]
    fn rejected_callback_is_not_retryable() {
        let error = anyhow::Error::new(DeliveryError::CallbackRejected { status: 422 });
        assert_eq!(classify_error(&error), ErrorKind::NonRetryable);
    }

    #[test]
    fn callback_server_error_is_retryable() {
        let error = anyhow::Error::new(DeliveryError::CallbackRejected { status: 502 });
        assert_eq!(classify_error(&error), ErrorKind::Retryable);
    }

    #[test]
    fn unsupported_source_is_not_retryable() {
        let error = anyhow::Error::new(ConfigurationError {
            url: "https://unknown.example".to_string(),
        });
        assert_eq!(classify_error(&error), ErrorKind::NonRetryable);
    }

    #[test]
    fn deserialize_failures_are_not_retryable() {
        let error = anyhow::anyhow!("Failed to deserialize scrape_incidents: missing field");
        assert_eq!(classify_error(&error), ErrorKind::NonRetryable);
    }
}

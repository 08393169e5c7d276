//! Server dependencies (using traits for testability)
//!
//! Central dependency container passed to route handlers and job handlers.
//! Every collaborator sits behind a trait so tests can substitute
//! in-memory or mock implementations.

use std::sync::Arc;
use std::time::Duration;

use crate::domains::scraping::IncidentExtractor;
use crate::domains::tasks::TaskStore;
use crate::kernel::jobs::JobQueue;

/// Dependencies shared by the HTTP layer and the job workers.
#[derive(Clone)]
pub struct ServerDeps {
    /// Durable job queue (broker + result store in one).
    pub jobs: Arc<dyn JobQueue>,
    /// Persistence behind the ingestion endpoint.
    pub task_store: Arc<dyn TaskStore>,
    /// Converts a status page into incident records.
    pub extractor: Arc<dyn IncidentExtractor>,
    /// Client for callback delivery. Shared across jobs - unlike the
    /// scrape session, callback POSTs carry no per-job state.
    pub http: reqwest::Client,
}

impl ServerDeps {
    pub fn new(
        jobs: Arc<dyn JobQueue>,
        task_store: Arc<dyn TaskStore>,
        extractor: Arc<dyn IncidentExtractor>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            jobs,
            task_store,
            extractor,
            http,
        }
    }

    /// Build the callback delivery client.
    pub fn build_http_client(timeout_secs: u64) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default()
    }
}

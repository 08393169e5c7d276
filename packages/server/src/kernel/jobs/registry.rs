//! Job registry for deserializing and executing jobs.
//!
//! The registry maps job type strings (e.g., "scrape_incidents") to
//! handlers that deserialize the JSON payload and run the job logic. The
//! JobRunner claims rows from the queue and dispatches them through here
//! without knowing the concrete command types.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;

use super::queue::{ClaimedJob, CommandMeta};
use crate::kernel::ServerDeps;

/// Type alias for the async handler function.
///
/// Handlers receive the raw payload plus ServerDeps and return the job's
/// result payload, which the runner stores on the job row.
type BoxedHandler = Box<
    dyn Fn(
            serde_json::Value,
            Arc<ServerDeps>,
        ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send>>
        + Send
        + Sync,
>;

struct JobRegistration {
    handler: BoxedHandler,
}

/// Registry that maps job type strings to handlers.
///
/// Each domain registers its job types at startup.
///
/// # Example
///
/// ```ignore
/// let mut registry = JobRegistry::new();
/// registry.register::<ScrapeIncidentsJob, _, _>(
///     ScrapeIncidentsJob::JOB_TYPE,
///     handle_scrape_incidents,
/// );
/// ```
#[derive(Default)]
pub struct JobRegistry {
    registrations: HashMap<&'static str, JobRegistration>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
        }
    }

    /// Register a job type with its handler.
    pub fn register<J, F, Fut>(&mut self, job_type: &'static str, handler: F)
    where
        J: CommandMeta + DeserializeOwned + Send + Sync + 'static,
        F: Fn(J, Arc<ServerDeps>) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<serde_json::Value>> + Send + 'static,
    {
        let boxed_handler: BoxedHandler = Box::new(move |value, deps| {
            let handler = handler.clone();
            Box::pin(async move {
                let job: J = serde_json::from_value(value)
                    .map_err(|e| anyhow!("Failed to deserialize {}: {}", job_type, e))?;
                handler(job, deps).await
            })
        });

        self.registrations.insert(
            job_type,
            JobRegistration {
                handler: boxed_handler,
            },
        );
    }

    /// Execute a claimed job using its registered handler.
    ///
    /// Returns an error if:
    /// - The job type is not registered
    /// - The JSON payload cannot be deserialized
    /// - The handler returns an error
    pub async fn execute(
        &self,
        job: &ClaimedJob,
        deps: Arc<ServerDeps>,
    ) -> Result<serde_json::Value> {
        let job_type = job.command_type();
        let registration = self
            .registrations
            .get(job_type)
            .ok_or_else(|| anyhow!("Unknown job type: {}", job_type))?;

        let args = job
            .job
            .args
            .clone()
            .ok_or_else(|| anyhow!("Job {} has no args", job.id))?;

        (registration.handler)(args, deps).await
    }

    /// Check if a job type is registered.
    pub fn is_registered(&self, job_type: &str) -> bool {
        self.registrations.contains_key(job_type)
    }

    /// Get all registered job types.
    pub fn registered_types(&self) -> Vec<&'static str> {
        self.registrations.keys().copied().collect()
    }
}

/// Thread-safe registry wrapped in Arc.
pub type SharedJobRegistry = Arc<JobRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct TestJob {
        pub name: String,
    }

    impl CommandMeta for TestJob {
        fn command_type(&self) -> &'static str {
            "test_job"
        }
    }

    #[test]
    fn register_and_check() {
        let mut registry = JobRegistry::new();
        registry.register::<TestJob, _, _>("test_job", |_job, _deps| async move {
            Ok(serde_json::Value::Null)
        });

        assert!(registry.is_registered("test_job"));
        assert!(!registry.is_registered("unknown_job"));
    }

    #[test]
    fn registered_types_lists_everything() {
        let mut registry = JobRegistry::new();
        registry.register::<TestJob, _, _>("test_job", |_job, _deps| async move {
            Ok(serde_json::Value::Null)
        });

        let types = registry.registered_types();
        assert!(types.contains(&"test_job"));
    }
}

//! ScrapeIncidentsJob - background job for scraping a status page.
//!
//! The dispatch endpoint enqueues this job and returns immediately with a
//! job id; a worker picks it up, extracts incident records and delivers
//! them to the caller-supplied callback URL.

use serde::{Deserialize, Serialize};

use crate::kernel::jobs::CommandMeta;

/// Job to scrape one status page and deliver the records via callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeIncidentsJob {
    /// The status page to scrape (must be on the allow-list)
    pub url: String,
    /// Where the worker POSTs the extracted records
    pub callback_url: String,
}

impl ScrapeIncidentsJob {
    /// The job type identifier used in the jobs table.
    pub const JOB_TYPE: &'static str = "scrape_incidents";

    pub fn new(url: impl Into<String>, callback_url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            callback_url: callback_url.into(),
        }
    }
}

impl CommandMeta for ScrapeIncidentsJob {
    fn command_type(&self) -> &'static str {
        Self::JOB_TYPE
    }

    fn max_retries(&self) -> i32 {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_creation() {
        let job = ScrapeIncidentsJob::new(
            "https://status.msk.cloud.vk.com/incidents",
            "http://localhost:8000/tasks/callback/",
        );
        assert_eq!(job.url, "https://status.msk.cloud.vk.com/incidents");
        assert_eq!(job.callback_url, "http://localhost:8000/tasks/callback/");
    }

    #[test]
    fn command_meta() {
        let job = ScrapeIncidentsJob::new("u", "cb");
        assert_eq!(job.command_type(), "scrape_incidents");
        assert_eq!(job.max_retries(), 3);
    }

    #[test]
    fn serialization_round_trips() {
        let job = ScrapeIncidentsJob::new("u", "cb");
        let json = serde_json::to_string(&job).unwrap();
        let parsed: ScrapeIncidentsJob = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.url, job.url);
        assert_eq!(parsed.callback_url, job.callback_url);
    }
}

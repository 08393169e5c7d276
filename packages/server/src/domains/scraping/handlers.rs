//! Job handlers for the scraping domain.
//!
//! Registered with the JobRegistry and called by the JobRunner.
//!
//! ## Pipeline flow
//!
//! ```text
//! ScrapeIncidentsJob → extract records → POST callback_url → terminal
//! ```
//!
//! The handler's return value (the record array) becomes the job's stored
//! result, which the status endpoint serves once the job has succeeded.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use super::extractor::ExtractionOutcome;
use super::jobs::ScrapeIncidentsJob;
use super::records::IncidentRecord;
use super::sites::SourceSite;
use crate::common::{ConfigurationError, DeliveryError};
use crate::kernel::jobs::JobRegistry;
use crate::kernel::ServerDeps;

/// Cap on records delivered per run. Bounds the callback payload and
/// keeps one job from flooding the ingestion endpoint.
pub const MAX_RECORDS_PER_RUN: usize = 5;

/// Register all scraping job types.
pub fn register_scraping_jobs(registry: &mut JobRegistry) {
    registry.register::<ScrapeIncidentsJob, _, _>(
        ScrapeIncidentsJob::JOB_TYPE,
        handle_scrape_incidents,
    );
}

/// Apply the skip-vs-abort policy to one extraction run: drop failed
/// records with a warning, keep at most [`MAX_RECORDS_PER_RUN`] successes.
///
/// Returns the kept records and the number skipped.
fn collect_records(outcome: ExtractionOutcome, url: &str) -> (Vec<IncidentRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for item in outcome {
        match item {
            Ok(record) => {
                records.push(record);
                if records.len() >= MAX_RECORDS_PER_RUN {
                    break;
                }
            }
            Err(e) => {
                skipped += 1;
                warn!(url = %url, error = %e, "skipping unparseable incident");
            }
        }
    }

    (records, skipped)
}

/// Handle ScrapeIncidentsJob.
///
/// Extracts incident records from the job's URL and performs exactly one
/// callback POST with the full sequence - also when it is empty.
pub async fn handle_scrape_incidents(
    job: ScrapeIncidentsJob,
    deps: Arc<ServerDeps>,
) -> Result<serde_json::Value> {
    info!(url = %job.url, "handling scrape job");

    let site = SourceSite::from_url(&job.url).ok_or(ConfigurationError {
        url: job.url.clone(),
    })?;

    // The scrape session lives inside extract() and is torn down on every
    // exit path, including the error ones.
    let outcome = deps.extractor.extract(site).await?;
    let (records, skipped) = collect_records(outcome, &job.url);

    info!(
        url = %job.url,
        records = records.len(),
        skipped = skipped,
        callback_url = %job.callback_url,
        "delivering scrape results"
    );

    let response = deps
        .http
        .post(&job.callback_url)
        .json(&records)
        .send()
        .await
        .map_err(DeliveryError::CallbackFailed)?;

    let status = response.status();
    if !status.is_success() {
        return Err(DeliveryError::CallbackRejected {
            status: status.as_u16(),
        }
        .into());
    }

    Ok(serde_json::to_value(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ExtractionError;
    use crate::domains::scraping::records::{Priority, TaskStatus};
    use chrono::NaiveDate;

    fn record(title: &str) -> IncidentRecord {
        IncidentRecord {
            title: title.to_string(),
            description: "d".to_string(),
            priority: Priority::High,
            deadline: NaiveDate::from_ymd_opt(2024, 3, 12)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap(),
            user_id: 1,
            status: TaskStatus::Completed,
        }
    }

    fn missing(selector: &str) -> Result<IncidentRecord, ExtractionError> {
        Err(ExtractionError::MissingElement {
            selector: selector.to_string(),
        })
    }

    #[test]
    fn keeps_all_records_under_the_cap() {
        let outcome = vec![Ok(record("a")), Ok(record("b"))];
        let (records, skipped) = collect_records(outcome, "u");
        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn stops_at_the_cap() {
        let outcome = (0..8).map(|i| Ok(record(&format!("r{i}")))).collect();
        let (records, _) = collect_records(outcome, "u");
        assert_eq!(records.len(), MAX_RECORDS_PER_RUN);
    }

    #[test]
    fn failed_records_are_skipped_not_fatal() {
        let outcome = vec![Ok(record("a")), missing(".title"), Ok(record("c"))];
        let (records, skipped) = collect_records(outcome, "u");
        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(records[0].title, "a");
        assert_eq!(records[1].title, "c");
    }

    #[test]
    fn skipped_records_do_not_count_toward_the_cap() {
        let mut outcome: ExtractionOutcome = (0..4).map(|_| missing(".title")).collect();
        outcome.extend((0..5).map(|i| Ok(record(&format!("r{i}")))));
        let (records, skipped) = collect_records(outcome, "u");
        assert_eq!(records.len(), 5);
        assert_eq!(skipped, 4);
    }

    #[test]
    fn empty_outcome_yields_empty_payload() {
        let (records, skipped) = collect_records(vec![], "u");
        assert!(records.is_empty());
        assert_eq!(skipped, 0);
    }
}

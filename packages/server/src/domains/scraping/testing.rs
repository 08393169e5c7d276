//! Mock extractor for tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Mutex;

use super::extractor::{ExtractionOutcome, IncidentExtractor};
use super::records::IncidentRecord;
use super::sites::SourceSite;
use crate::common::ExtractionError;

/// Serves canned extraction outcomes instead of fetching pages.
#[derive(Default)]
pub struct MockExtractor {
    outcome: Mutex<Vec<Result<IncidentRecord, ExtractionError>>>,
    fail_extraction: bool,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every extraction returns clones of these records.
    pub fn with_records(records: Vec<IncidentRecord>) -> Self {
        Self {
            outcome: Mutex::new(records.into_iter().map(Ok).collect()),
            fail_extraction: false,
        }
    }

    /// Mixed outcome: some records parse, some do not.
    pub fn with_outcome(outcome: Vec<Result<IncidentRecord, ExtractionError>>) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            fail_extraction: false,
        }
    }

    /// Every extraction fails outright (page unreachable).
    pub fn failing() -> Self {
        Self {
            outcome: Mutex::new(Vec::new()),
            fail_extraction: true,
        }
    }
}

#[async_trait]
impl IncidentExtractor for MockExtractor {
    async fn extract(&self, _site: SourceSite) -> Result<ExtractionOutcome> {
        if self.fail_extraction {
            bail!("simulated fetch failure");
        }

        let outcome = self.outcome.lock().unwrap();
        Ok(outcome
            .iter()
            .map(|item| match item {
                Ok(record) => Ok(record.clone()),
                Err(ExtractionError::MissingElement { selector }) => {
                    Err(ExtractionError::MissingElement {
                        selector: selector.clone(),
                    })
                }
                Err(ExtractionError::DateFormat { raw }) => {
                    Err(ExtractionError::DateFormat { raw: raw.clone() })
                }
                Err(ExtractionError::Fetch { .. }) => Err(ExtractionError::MissingElement {
                    selector: "fetch".to_string(),
                }),
            })
            .collect())
    }
}

//! Error taxonomy for the scrape pipeline.
//!
//! Every failure here is scoped to a single job or a single record; nothing
//! in this module is fatal to the service process. The job runner uses
//! these types to decide between retrying and failing a job permanently.

use thiserror::Error;

/// A single page element could not be turned into an incident record.
///
/// Recovered locally: the consumer substitutes a sentinel value or skips
/// the one record. Never aborts the run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("element not found: {selector}")]
    MissingElement { selector: String },

    #[error("unparseable deadline: {raw}")]
    DateFormat { raw: String },

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The requested URL has no scrape rule set configured.
///
/// Surfaced to the dispatch caller as HTTP 400 before anything is
/// enqueued; non-retryable if a stale job hits it inside the worker.
#[derive(Debug, Error)]
#[error("no scrape rules configured for {url}")]
pub struct ConfigurationError {
    pub url: String,
}

/// The callback POST to the caller-supplied URL did not succeed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The callback endpoint answered with a non-success status.
    #[error("callback rejected with HTTP {status}")]
    CallbackRejected { status: u16 },

    /// The request never completed (connect failure, timeout, DNS).
    #[error("callback request failed: {0}")]
    CallbackFailed(#[from] reqwest::Error),
}

impl DeliveryError {
    /// 4xx answers are a caller problem and will not improve on retry;
    /// network failures and 5xx answers may.
    pub fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::CallbackRejected { status } => *status >= 500,
            DeliveryError::CallbackFailed(_) => true,
        }
    }
}

/// A single record in a callback batch failed to persist.
///
/// Logged and dropped; the rest of the batch continues.
#[derive(Debug, Error)]
#[error("failed to persist task '{title}': {source}")]
pub struct PersistenceError {
    pub title: String,
    #[source]
    pub source: anyhow::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_from_callback_are_fatal() {
        let err = DeliveryError::CallbackRejected { status: 404 };
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_errors_from_callback_are_retryable() {
        let err = DeliveryError::CallbackRejected { status: 503 };
        assert!(err.is_retryable());
    }

    #[test]
    fn configuration_error_names_the_url() {
        let err = ConfigurationError {
            url: "https://example.com".to_string(),
        };
        assert!(err.to_string().contains("https://example.com"));
    }
}

//! Incident extraction - fetches a status page and parses incident records.
//!
//! This implementation:
//! - Uses reqwest for HTTP requests
//! - Uses scraper crate for HTML parsing with per-site CSS selector sets
//!
//! One extraction run is one scrape session: the HTTP client lives for a
//! single job and is dropped on every exit path (success, empty result,
//! error). Parsing is separated from fetching so the selector logic can be
//! exercised against fixture pages.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use super::assign::AssignmentStrategy;
use super::records::{IncidentRecord, Priority, TaskStatus, DESCRIPTION_FALLBACK};
use super::sites::{parse_vk_deadline, parse_yandex_deadline, DeadlineRule, SourceSite};
use crate::common::ExtractionError;

/// Per-record extraction results for one run. The consumer decides the
/// skip-vs-abort policy and how many successes it wants.
pub type ExtractionOutcome = Vec<Result<IncidentRecord, ExtractionError>>;

/// Converts a remote status page into incident records.
#[async_trait]
pub trait IncidentExtractor: Send + Sync {
    async fn extract(&self, site: SourceSite) -> Result<ExtractionOutcome>;
}

/// Extractor backed by reqwest + scraper.
pub struct PageExtractor {
    assigner: Arc<dyn AssignmentStrategy>,
}

impl PageExtractor {
    pub fn new(assigner: Arc<dyn AssignmentStrategy>) -> Self {
        Self { assigner }
    }

    /// Build the per-job HTTP client.
    fn build_client() -> Result<reqwest::Client> {
        // Use a browser-like User-Agent to avoid bot detection
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "ru-RU,ru;q=0.8,en-US,en;q=0.5".parse().unwrap(),
        );

        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")
    }

    /// Fetch raw HTML from a URL
    async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|source| ExtractionError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        response
            .text()
            .await
            .context("Failed to read response body")
    }
}

#[async_trait]
impl IncidentExtractor for PageExtractor {
    async fn extract(&self, site: SourceSite) -> Result<ExtractionOutcome> {
        let url = site.url();
        info!(url = %url, "starting scrape session");

        let client = Self::build_client()?;
        let html = Self::fetch_html(&client, url).await?;
        let outcome = parse_incidents(&html, site, self.assigner.as_ref());

        info!(
            url = %url,
            candidates = outcome.len(),
            "scrape session finished"
        );
        Ok(outcome)
    }
}

fn parse_selector(raw: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(raw).map_err(|_| ExtractionError::MissingElement {
        selector: raw.to_string(),
    })
}

fn select_text(scope: ElementRef<'_>, raw: &str) -> Result<String, ExtractionError> {
    let selector = parse_selector(raw)?;
    scope
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .ok_or_else(|| ExtractionError::MissingElement {
            selector: raw.to_string(),
        })
}

/// Parse all incident containers on a page into records.
///
/// Each container parses independently; a broken one becomes an `Err`
/// entry without touching its neighbors.
pub fn parse_incidents(
    html: &str,
    site: SourceSite,
    assigner: &dyn AssignmentStrategy,
) -> ExtractionOutcome {
    let document = Html::parse_document(html);
    let selectors = site.selectors();

    let container = match parse_selector(selectors.incident_container) {
        Ok(s) => s,
        Err(e) => return vec![Err(e)],
    };

    let incidents: Vec<_> = document.select(&container).collect();
    if incidents.is_empty() {
        info!(url = %site.url(), "no incidents found on the page");
    }

    incidents
        .into_iter()
        .map(|incident| parse_incident(incident, site, assigner))
        .collect()
}

fn parse_incident(
    incident: ElementRef<'_>,
    site: SourceSite,
    assigner: &dyn AssignmentStrategy,
) -> Result<IncidentRecord, ExtractionError> {
    let selectors = site.selectors();

    let title = select_text(incident, selectors.title)?;
    debug!(title = %title, "found incident");

    let description = select_text(incident, selectors.description)
        .unwrap_or_else(|_| DESCRIPTION_FALLBACK.to_string());

    let status_text = select_text(incident, selectors.status)?;
    let priority = if status_text == "Resolved" {
        Priority::Low
    } else {
        Priority::High
    };

    let deadline = match selectors.deadline {
        DeadlineRule::SplitDateAndTime { date, time_range } => {
            let date_text = select_text(incident, date)?;
            let range_text = select_text(incident, time_range)?;
            parse_vk_deadline(&date_text, &range_text)?
        }
        DeadlineRule::DatetimeAttr { selector } => {
            let sel = parse_selector(selector)?;
            let attr = incident
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("datetime"))
                .ok_or_else(|| ExtractionError::MissingElement {
                    selector: selector.to_string(),
                })?;
            parse_yandex_deadline(attr)?
        }
    };

    Ok(IncidentRecord {
        title,
        description,
        priority,
        deadline,
        user_id: assigner.assign(),
        // Scraped incidents are already over by the time we ingest them.
        status: TaskStatus::Completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::scraping::assign::FixedAssigner;
    use chrono::NaiveDate;

    fn vk_incident(title: &str, status: &str, date: &str, time_range: &str) -> String {
        format!(
            r#"<div class="Incident_main__3YJVa">
                <div class="Incident_title__ypk3E">{title}</div>
                <div class="Incident_reactMarkdown__2t1b9">Details about {title}</div>
                <div class="Incident_label__BSSWu">{status}</div>
                <div class="Incident_date__lqPM_">{date}</div>
                <div class="Incident_humanizedTime__3gxDb">{time_range}</div>
            </div>"#
        )
    }

    fn page(body: &str) -> String {
        format!("<html><body>{body}</body></html>")
    }

    #[test]
    fn parses_every_container_on_the_page() {
        let html = page(&format!(
            "{}{}{}",
            vk_incident("One", "Resolved", "12 марта", "14:30 — 15:10"),
            vk_incident("Two", "Investigating", "13 марта", "09:00 — 09:45"),
            vk_incident("Three", "Resolved", "14 марта", "22:05 — 23:00"),
        ));

        let outcome = parse_incidents(&html, SourceSite::VkCloudStatus, &FixedAssigner(1));
        assert_eq!(outcome.len(), 3);
        assert!(outcome.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn resolved_incidents_get_low_priority() {
        let html = page(&vk_incident("One", "Resolved", "12 марта", "14:30"));
        let outcome = parse_incidents(&html, SourceSite::VkCloudStatus, &FixedAssigner(1));
        let record = outcome[0].as_ref().unwrap();
        assert_eq!(record.priority, Priority::Low);
    }

    #[test]
    fn open_incidents_get_high_priority() {
        let html = page(&vk_incident("One", "Investigating", "12 марта", "14:30"));
        let outcome = parse_incidents(&html, SourceSite::VkCloudStatus, &FixedAssigner(1));
        let record = outcome[0].as_ref().unwrap();
        assert_eq!(record.priority, Priority::High);
    }

    #[test]
    fn every_record_is_marked_completed() {
        let html = page(&vk_incident("One", "Investigating", "12 марта", "14:30"));
        let outcome = parse_incidents(&html, SourceSite::VkCloudStatus, &FixedAssigner(1));
        assert_eq!(outcome[0].as_ref().unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn missing_description_falls_back_to_sentinel() {
        let html = page(
            r#"<div class="Incident_main__3YJVa">
                <div class="Incident_title__ypk3E">Quiet incident</div>
                <div class="Incident_label__BSSWu">Resolved</div>
                <div class="Incident_date__lqPM_">12 марта</div>
                <div class="Incident_humanizedTime__3gxDb">14:30</div>
            </div>"#,
        );
        let outcome = parse_incidents(&html, SourceSite::VkCloudStatus, &FixedAssigner(1));
        let record = outcome[0].as_ref().unwrap();
        assert_eq!(record.description, DESCRIPTION_FALLBACK);
    }

    #[test]
    fn missing_title_fails_only_that_record() {
        let broken = r#"<div class="Incident_main__3YJVa">
            <div class="Incident_label__BSSWu">Resolved</div>
            <div class="Incident_date__lqPM_">12 марта</div>
            <div class="Incident_humanizedTime__3gxDb">14:30</div>
        </div>"#;
        let html = page(&format!(
            "{}{}{}",
            vk_incident("First", "Resolved", "12 марта", "14:30"),
            broken,
            vk_incident("Third", "Resolved", "13 марта", "15:00"),
        ));

        let outcome = parse_incidents(&html, SourceSite::VkCloudStatus, &FixedAssigner(1));
        assert_eq!(outcome.len(), 3);
        assert!(outcome[0].is_ok());
        assert!(matches!(
            outcome[1],
            Err(ExtractionError::MissingElement { .. })
        ));
        assert!(outcome[2].is_ok());
    }

    #[test]
    fn unparseable_date_fails_only_that_record() {
        let html = page(&format!(
            "{}{}",
            vk_incident("Bad date", "Resolved", "someday", "14:30"),
            vk_incident("Good", "Resolved", "12 марта", "14:30"),
        ));
        let outcome = parse_incidents(&html, SourceSite::VkCloudStatus, &FixedAssigner(1));
        assert!(matches!(outcome[0], Err(ExtractionError::DateFormat { .. })));
        assert!(outcome[1].is_ok());
    }

    #[test]
    fn assigner_decides_the_user_id() {
        let html = page(&vk_incident("One", "Resolved", "12 марта", "14:30"));
        let outcome = parse_incidents(&html, SourceSite::VkCloudStatus, &FixedAssigner(3));
        assert_eq!(outcome[0].as_ref().unwrap().user_id, 3);
    }

    #[test]
    fn vk_deadline_uses_leading_range_time() {
        let html = page(&vk_incident("One", "Resolved", "12 марта", "14:30 — 15:10"));
        let outcome = parse_incidents(&html, SourceSite::VkCloudStatus, &FixedAssigner(1));
        assert_eq!(
            outcome[0].as_ref().unwrap().deadline,
            NaiveDate::from_ymd_opt(2024, 3, 12)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn yandex_incidents_parse_from_datetime_attribute() {
        let html = page(
            r#"<div class="mc-incident-item__container">
                <div class="mc-incident-item__title">Object storage errors</div>
                <div class="mc-incident-comment__content">Elevated 5xx rate</div>
                <div class="mc-incident-comment__type">Resolved</div>
                <time class="mc-incident-date__date" datetime="2024-05-12T08:30:15.123Z">12 May</time>
            </div>"#,
        );
        let outcome = parse_incidents(&html, SourceSite::YandexCloudTimeline, &FixedAssigner(2));
        let record = outcome[0].as_ref().unwrap();
        assert_eq!(record.title, "Object storage errors");
        assert_eq!(record.user_id, 2);
        assert_eq!(
            record.deadline,
            NaiveDate::from_ymd_opt(2024, 5, 12)
                .unwrap()
                .and_hms_micro_opt(8, 30, 15, 123_000)
                .unwrap()
        );
    }

    #[test]
    fn empty_page_yields_no_records() {
        let outcome = parse_incidents(
            &page(""),
            SourceSite::VkCloudStatus,
            &FixedAssigner(1),
        );
        assert!(outcome.is_empty());
    }
}

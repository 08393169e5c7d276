//! Supported status pages and their scrape rule sets.
//!
//! Each supported site is one [`SourceSite`] variant carrying its CSS
//! selector set and its own deadline-parsing rules. Dispatch validates
//! membership here before a job is ever enqueued, so a worker cycle is
//! never spent on a URL we have no rules for.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::common::ExtractionError;

/// How a site exposes the incident timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineRule {
    /// Two text nodes: a day-and-month date plus a humanized time range.
    SplitDateAndTime {
        date: &'static str,
        time_range: &'static str,
    },
    /// A single element with a machine-readable `datetime` attribute.
    DatetimeAttr { selector: &'static str },
}

/// CSS selector set for one supported site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteSelectors {
    pub incident_container: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub status: &'static str,
    pub deadline: DeadlineRule,
}

/// A status page we know how to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSite {
    VkCloudStatus,
    YandexCloudTimeline,
}

const VK_CLOUD_URL: &str = "https://status.msk.cloud.vk.com/incidents";
const YANDEX_CLOUD_URL: &str = "https://status.yandex.cloud/ru/timeline";

const VK_CLOUD_SELECTORS: SiteSelectors = SiteSelectors {
    incident_container: ".Incident_main__3YJVa",
    title: ".Incident_title__ypk3E",
    description: ".Incident_reactMarkdown__2t1b9",
    status: ".Incident_label__BSSWu",
    deadline: DeadlineRule::SplitDateAndTime {
        date: ".Incident_date__lqPM_",
        time_range: ".Incident_humanizedTime__3gxDb",
    },
};

const YANDEX_CLOUD_SELECTORS: SiteSelectors = SiteSelectors {
    incident_container: ".mc-incident-item__container",
    title: ".mc-incident-item__title",
    description: ".mc-incident-comment__content",
    status: ".mc-incident-comment__type",
    deadline: DeadlineRule::DatetimeAttr {
        selector: ".mc-incident-date__date",
    },
};

impl SourceSite {
    pub const ALL: [SourceSite; 2] = [SourceSite::VkCloudStatus, SourceSite::YandexCloudTimeline];

    /// Allow-list lookup. Exact match only — rule sets are tied to a
    /// concrete page, not a domain.
    pub fn from_url(url: &str) -> Option<Self> {
        match url {
            VK_CLOUD_URL => Some(SourceSite::VkCloudStatus),
            YANDEX_CLOUD_URL => Some(SourceSite::YandexCloudTimeline),
            _ => None,
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            SourceSite::VkCloudStatus => VK_CLOUD_URL,
            SourceSite::YandexCloudTimeline => YANDEX_CLOUD_URL,
        }
    }

    pub fn selectors(&self) -> &'static SiteSelectors {
        match self {
            SourceSite::VkCloudStatus => &VK_CLOUD_SELECTORS,
            SourceSite::YandexCloudTimeline => &YANDEX_CLOUD_SELECTORS,
        }
    }
}

/// Russian genitive month names as they appear on the VK status page.
fn month_number(name: &str) -> Option<u32> {
    let number = match name {
        "января" => 1,
        "февраля" => 2,
        "марта" => 3,
        "апреля" => 4,
        "мая" => 5,
        "июня" => 6,
        "июля" => 7,
        "августа" => 8,
        "сентября" => 9,
        "октября" => 10,
        "ноября" => 11,
        "декабря" => 12,
        _ => return None,
    };
    Some(number)
}

/// The VK page omits the year entirely.
const VK_ASSUMED_YEAR: i32 = 2024;

/// Parse the VK status page's split date ("12 марта") and humanized time
/// range into one timestamp.
///
/// A range containing "в" marks an incident that only has a start time
/// ("началось в 12:30"); those fall back to midnight. Otherwise the
/// leading `HH:MM` of the range is the incident end.
pub fn parse_vk_deadline(date: &str, time_range: &str) -> Result<NaiveDateTime, ExtractionError> {
    let raw = format!("{date} {time_range}");
    let mut parts = date.split_whitespace();

    let day: u32 = parts
        .next()
        .and_then(|d| d.parse().ok())
        .ok_or_else(|| ExtractionError::DateFormat { raw: raw.clone() })?;
    let month = parts
        .next()
        .and_then(month_number)
        .ok_or_else(|| ExtractionError::DateFormat { raw: raw.clone() })?;

    let time = if time_range.contains('в') {
        NaiveTime::from_hms_opt(0, 0, 0).unwrap()
    } else {
        let hhmm: String = time_range.trim().chars().take(5).collect();
        NaiveTime::parse_from_str(hhmm.trim(), "%H:%M")
            .map_err(|_| ExtractionError::DateFormat { raw: raw.clone() })?
    };

    NaiveDate::from_ymd_opt(VK_ASSUMED_YEAR, month, day)
        .map(|d| d.and_time(time))
        .ok_or(ExtractionError::DateFormat { raw })
}

/// Parse the Yandex timeline's `datetime` attribute
/// (`2024-05-12T08:30:15.123Z`).
pub fn parse_yandex_deadline(datetime_attr: &str) -> Result<NaiveDateTime, ExtractionError> {
    NaiveDateTime::parse_from_str(datetime_attr, "%Y-%m-%dT%H:%M:%S%.fZ").map_err(|_| {
        ExtractionError::DateFormat {
            raw: datetime_attr.to_string(),
        }
    })
}

//! Incident records extracted from status pages.
//!
//! An [`IncidentRecord`] is transient: produced by the extractor, carried
//! in the callback payload, then persisted as a task row by the ingestion
//! endpoint. The wire format is fixed — in particular the `deadline` field
//! travels as `YYYY-MM-DD HH:MM:SS.ffffff` and the ingestion side parses
//! exactly that pattern.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Substituted when a source page has no description element for an incident.
pub const DESCRIPTION_FALLBACK: &str = "Description not found";

/// Task priority. Incident extraction only ever produces `Low` (resolved
/// incidents) or `High` (everything else); the other levels exist for the
/// task rows the tracker stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Task lifecycle status. Scraped incidents are historical by the time we
/// see them, so the extractor pins them to `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Completed,
    Deferred,
}

/// One scraped incident, shaped for the callback payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[serde(with = "deadline_format")]
    pub deadline: NaiveDateTime,
    pub user_id: i32,
    pub status: TaskStatus,
}

/// Serde adapter for the fixed callback timestamp pattern.
///
/// Six fractional digits always, both directions — the ingestion endpoint
/// rejects anything else.
pub mod deadline_format {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

    pub fn serialize<S>(deadline: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&deadline.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

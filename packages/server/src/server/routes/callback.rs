//! Ingestion endpoint: persist callback records as task rows.

use axum::{extract::Extension, Json};
use serde_json::json;
use tracing::{debug, error, info};

use crate::common::PersistenceError;
use crate::domains::scraping::IncidentRecord;
use crate::domains::tasks::NewTask;
use crate::server::app::AppState;

/// `POST /tasks/callback/`
///
/// Every record is attempted independently - one insert, one commit. A
/// malformed or unpersistable record is logged and dropped without
/// touching its neighbors, and the response reports success regardless of
/// how many rows made it. Callers needing per-record outcomes must consult
/// the logs. Replays insert duplicate rows; there is no dedup.
pub async fn callback_handler(
    Extension(state): Extension<AppState>,
    Json(payload): Json<Vec<serde_json::Value>>,
) -> Json<serde_json::Value> {
    let total = payload.len();
    let mut inserted = 0usize;
    let mut failed = 0usize;

    for (index, raw) in payload.into_iter().enumerate() {
        let record: IncidentRecord = match serde_json::from_value(raw) {
            Ok(record) => record,
            Err(e) => {
                failed += 1;
                error!(index = index, error = %e, "skipping malformed callback record");
                continue;
            }
        };

        let title = record.title.clone();
        match state.deps.task_store.insert(NewTask::from(record)).await {
            Ok(task) => {
                inserted += 1;
                debug!(task_id = task.id, title = %task.title, "task persisted");
            }
            Err(e) => {
                failed += 1;
                let err = PersistenceError { title, source: e };
                error!(index = index, error = %err, "failed to persist task");
            }
        }
    }

    info!(total, inserted, failed, "callback batch processed");

    Json(json!({ "detail": "Tasks added to the database" }))
}

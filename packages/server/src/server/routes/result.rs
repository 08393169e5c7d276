//! Status endpoint: report a job's state and, once succeeded, its result.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::kernel::jobs::JobStatus;
use crate::server::app::AppState;
use crate::server::routes::internal_error;

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

/// Queue states map onto the wire statuses the original callers poll for.
fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "PENDING",
        JobStatus::Running => "RUNNING",
        JobStatus::Succeeded => "SUCCESS",
        JobStatus::Failed => "FAILURE",
    }
}

/// `GET /result/{task_id}`
///
/// Job ids are opaque but not access-controlled; anyone holding an id may
/// poll it.
pub async fn result_handler(
    Extension(state): Extension<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<ResultResponse>, (StatusCode, Json<serde_json::Value>)> {
    let job = state
        .deps
        .jobs
        .find(task_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Task not found" })),
            )
        })?;

    let result = match job.status {
        JobStatus::Succeeded => job.result,
        _ => None,
    };

    Ok(Json(ResultResponse {
        status: status_label(job.status),
        result,
    }))
}

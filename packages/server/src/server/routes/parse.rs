//! Dispatch endpoint: accept a scrape request, enqueue, return the job id.

use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;
use uuid::Uuid;

use crate::common::ConfigurationError;
use crate::domains::scraping::{ScrapeIncidentsJob, SourceSite};
use crate::kernel::jobs::JobQueueExt;
use crate::server::app::AppState;
use crate::server::routes::internal_error;

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub url: String,
    pub callback_url: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub task_id: Uuid,
}

/// `POST /parse/`
///
/// Validates the source against the allow-list before enqueueing, so an
/// unsupported URL never costs a worker cycle. The only suspension point
/// on the happy path is the enqueue insert itself; the response does not
/// wait on extraction.
pub async fn parse_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<ParseResponse>, (StatusCode, Json<serde_json::Value>)> {
    if SourceSite::from_url(&request.url).is_none() {
        let err = ConfigurationError { url: request.url };
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": err.to_string() })),
        ));
    }

    if Url::parse(&request.callback_url).is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": format!("invalid callback_url: {}", request.callback_url) })),
        ));
    }

    let task_id = state
        .deps
        .jobs
        .enqueue(ScrapeIncidentsJob::new(request.url, request.callback_url))
        .await
        .map_err(internal_error)?;

    Ok(Json(ParseResponse { task_id }))
}

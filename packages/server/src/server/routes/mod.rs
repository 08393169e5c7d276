// HTTP routes
pub mod callback;
pub mod health;
pub mod parse;
pub mod result;

pub use callback::*;
pub use health::*;
pub use parse::*;
pub use result::*;

use axum::{http::StatusCode, Json};
use serde_json::json;
use tracing::error;

/// Collapse an internal failure into a 500 without leaking details.
pub(crate) fn internal_error(err: anyhow::Error) -> (StatusCode, Json<serde_json::Value>) {
    error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error" })),
    )
}

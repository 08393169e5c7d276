//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{callback_handler, health_handler, parse_handler, result_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router.
///
/// The dispatch, status and ingestion endpoints share one state; actual
/// scrape work happens in worker processes pulling from the queue inside
/// `deps.jobs`, never in a request handler.
pub fn build_app(deps: Arc<ServerDeps>) -> Router {
    let app_state = AppState { deps };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/parse/", post(parse_handler))
        .route("/result/:task_id", get(result_handler))
        .route("/tasks/callback/", post(callback_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

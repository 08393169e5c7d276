//! Shared test harness: in-memory queue, task store and mock extractor
//! wired into the real router, so tests run without Postgres or network.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request};
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;

use tracker_core::domains::scraping::testing::MockExtractor;
use tracker_core::domains::scraping::{IncidentExtractor, IncidentRecord, Priority, TaskStatus};
use tracker_core::domains::tasks::testing::InMemoryTaskStore;
use tracker_core::kernel::jobs::testing::InMemoryJobQueue;
use tracker_core::kernel::ServerDeps;
use tracker_core::server::build_app;

pub const VK_URL: &str = "https://status.msk.cloud.vk.com/incidents";

pub struct TestHarness {
    pub queue: Arc<InMemoryJobQueue>,
    pub store: Arc<InMemoryTaskStore>,
    pub deps: Arc<ServerDeps>,
}

impl TestHarness {
    pub fn with_extractor(extractor: Arc<dyn IncidentExtractor>) -> Self {
        let queue = Arc::new(InMemoryJobQueue::new());
        let store = Arc::new(InMemoryTaskStore::new());
        let deps = Arc::new(ServerDeps::new(
            queue.clone(),
            store.clone(),
            extractor,
            reqwest::Client::new(),
        ));
        Self { queue, store, deps }
    }

    pub fn new() -> Self {
        Self::with_extractor(Arc::new(MockExtractor::new()))
    }

    pub fn with_records(records: Vec<IncidentRecord>) -> Self {
        Self::with_extractor(Arc::new(MockExtractor::with_records(records)))
    }

    pub fn app(&self) -> Router {
        build_app(self.deps.clone())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn sample_record(title: &str) -> IncidentRecord {
    IncidentRecord {
        title: title.to_string(),
        description: format!("Details about {title}"),
        priority: Priority::High,
        deadline: NaiveDate::from_ymd_opt(2024, 3, 12)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap(),
        user_id: 2,
        status: TaskStatus::Completed,
    }
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

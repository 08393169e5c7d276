// Worker process entry point.
//
// Pulls scrape jobs from the shared Postgres-backed queue and executes
// them. Any number of these processes can run against the same queue; the
// SKIP LOCKED claim guarantees a job lands on exactly one of them.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tracker_core::domains::scraping::{register_scraping_jobs, PageExtractor, RandomAssigner};
use tracker_core::domains::tasks::PostgresTaskStore;
use tracker_core::kernel::jobs::{JobRegistry, JobRunner, JobRunnerConfig, PostgresJobQueue};
use tracker_core::kernel::ServerDeps;
use tracker_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tracker_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting scrape worker");

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // The server process owns migrations; workers only expect the schema
    // to exist already.

    let deps = Arc::new(ServerDeps::new(
        Arc::new(PostgresJobQueue::new(pool.clone())),
        Arc::new(PostgresTaskStore::new(pool.clone())),
        Arc::new(PageExtractor::new(Arc::new(RandomAssigner::default()))),
        ServerDeps::build_http_client(config.callback_timeout_secs),
    ));

    let mut registry = JobRegistry::new();
    register_scraping_jobs(&mut registry);
    let registry = Arc::new(registry);

    let runner_config = match &config.worker_id {
        Some(id) => JobRunnerConfig::with_worker_id(id.clone()),
        None => JobRunnerConfig::default(),
    };

    let runner = JobRunner::with_config(deps.jobs.clone(), registry, deps, runner_config);
    runner.run_until_shutdown().await
}

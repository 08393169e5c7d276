// Main entry point for the API server

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tracker_core::domains::scraping::{register_scraping_jobs, PageExtractor, RandomAssigner};
use tracker_core::domains::tasks::PostgresTaskStore;
use tracker_core::kernel::jobs::{JobRegistry, JobRunner, JobRunnerConfig, PostgresJobQueue};
use tracker_core::kernel::ServerDeps;
use tracker_core::server::build_app;
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

    tracing::info!("Starting task tracker scrape API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire dependencies
    let deps = Arc::new(ServerDeps::new(
        Arc::new(PostgresJobQueue::new(pool.clone())),
        Arc::new(PostgresTaskStore::new(pool.clone())),
        Arc::new(PageExtractor::new(Arc::new(RandomAssigner::default()))),
        ServerDeps::build_http_client(config.callback_timeout_secs),
    ));

    // Optionally run a worker inside this process (development)
    if config.run_worker_inline {
        let mut registry = JobRegistry::new();
        register_scraping_jobs(&mut registry);
        let registry = Arc::new(registry);
        let runner_config = match &config.worker_id {
            Some(id) => JobRunnerConfig::with_worker_id(id.clone()),
            None => JobRunnerConfig::default(),
        };
        let runner = JobRunner::with_config(
            deps.jobs.clone(),
            registry,
            deps.clone(),
            runner_config,
        );
        tokio::spawn(async move {
            if let Err(e) = runner.run().await {
                tracing::error!(error = %e, "inline job runner exited with error");
            }
        });
        tracing::info!("Inline job runner started");
    }

    // Build application
    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Stable worker id; a random one is generated per process if unset.
    pub worker_id: Option<String>,
    /// Timeout for callback delivery POSTs.
    pub callback_timeout_secs: u64,
    /// Run a job runner inside the API process (development convenience;
    /// production runs dedicated worker processes).
    pub run_worker_inline: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            worker_id: env::var("WORKER_ID").ok(),
            callback_timeout_secs: env::var("CALLBACK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("CALLBACK_TIMEOUT_SECS must be a valid number")?,
            run_worker_inline: env::var("RUN_WORKER_INLINE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

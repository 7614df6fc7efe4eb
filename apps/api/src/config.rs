use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_API_BASE;

const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 60;

/// Application configuration loaded from environment variables.
///
/// A missing `GEMINI_API_KEY` is not a startup error: it surfaces per request as
/// `MISSING_API_KEY` so operators see it in responses and logs.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    /// In-process history when unset.
    pub redis_url: Option<String>,
    /// Upper bound on one provider round trip.
    pub attempt_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let attempt_timeout_secs = match optional_env("ALIGN_ATTEMPT_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("ALIGN_ATTEMPT_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_ATTEMPT_TIMEOUT_SECS,
        };

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_api_base: optional_env("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            redis_url: optional_env("REDIS_URL"),
            attempt_timeout: Duration::from_secs(attempt_timeout_secs),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads `key`, treating blank values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// crates/client/src/config.rs
//! Environment-driven client configuration.

use std::time::Duration;

use goat_jobs::config::DEFAULT_POLL_DEADLINE;
use goat_jobs::PollConfig;

/// Default backend for local development.
const DEFAULT_API_URL: &str = "http://localhost:8787";

/// Connection settings for the GOAT backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GOAT_API_URL env var. Defaults to the local dev backend.
    pub api_url: String,
    /// GOAT_API_TOKEN env var. Attached as a bearer credential to every
    /// call; the client treats it as an opaque string.
    pub api_token: Option<String>,
    /// GOAT_POLL_DEADLINE_SECS env var; cap on total polling per job.
    pub poll_deadline: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: std::env::var("GOAT_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_token: std::env::var("GOAT_API_TOKEN").ok(),
            poll_deadline: std::env::var("GOAT_POLL_DEADLINE_SECS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_DEADLINE),
        }
    }
}

impl ClientConfig {
    /// Explicit constructor for tests and embedding. No env reads.
    pub fn new(api_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_token,
            poll_deadline: DEFAULT_POLL_DEADLINE,
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig::with_deadline(self.poll_deadline)
    }
}

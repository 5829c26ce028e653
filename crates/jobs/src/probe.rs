// crates/jobs/src/probe.rs
//! Transport seam for status checks.

use async_trait::async_trait;
use goat_types::{JobId, StatusResponse};
use thiserror::Error;

/// A status check failed before a payload could be classified.
///
/// Distinct from a backend-reported job failure: this means the check
/// itself could not be completed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("status request failed: {0}")]
    Transport(String),

    #[error("status endpoint returned HTTP {0}")]
    Status(u16),

    #[error("status body was not valid JSON: {0}")]
    Decode(String),
}

/// One status check against the backend.
///
/// Implementations: `GoatApi` (the HTTP client in `goat-client`) in
/// production, scripted fakes in tests.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Fetch the current raw status of `id`. Exactly one request; no
    /// retries at this layer.
    async fn fetch_status(&self, id: &JobId) -> Result<StatusResponse, ProbeError>;
}

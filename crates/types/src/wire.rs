// crates/types/src/wire.rs
//! Wire shapes for the backend job API.
//!
//! `StatusResponse` is deliberately lenient: every field optional, unknown
//! fields ignored. Classifying a surprising payload is the projection
//! step's job, not serde's.

use serde::{Deserialize, Serialize};

/// Successful submission response body.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
}

/// Raw status payload for one poll tick.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body for a memory-video generation submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub clips: Vec<String>,
    pub template: String,
    pub voice_style: String,
}

// crates/client/src/api.rs
//! HTTP client for the GOAT backend job API.
//!
//! Submissions return a `job_id` the caller is expected to poll. `GoatApi`
//! also implements [`StatusProbe`] so the registry drives those polls
//! through the same client and credentials.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use goat_jobs::{ProbeError, StatusProbe};
use goat_types::{GenerationRequest, JobHandle, JobId, JobKind, StatusResponse, SubmitResponse};
use reqwest::multipart;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ClientConfig;

/// A submission did not produce a usable job handle.
///
/// None of these register anything: a job exists only once the backend has
/// acknowledged it with a non-empty id.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submission request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("submission endpoint returned HTTP {0}")]
    Status(u16),

    #[error("submission response was unusable: {0}")]
    MalformedBody(String),

    #[error("could not read {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Hard cap on any single backend request. Status checks hitting a dead
/// connection fail here instead of holding their poll loop open.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Uploads move whole clips, so they get a wider cap than control calls.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for the GOAT backend job endpoints.
pub struct GoatApi {
    client: reqwest::Client,
    config: ClientConfig,
}

impl GoatApi {
    pub fn new(config: ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }

    /// POST /api/generation/submit: queue a memory-video render.
    pub async fn submit_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<JobHandle, SubmitError> {
        let url = format!("{}/api/generation/submit", self.config.api_url);
        let response = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await?;
        submission_handle(response, JobKind::VideoGeneration).await
    }

    /// POST /api/upload/submit: hand a local clip to the ingest pipeline.
    pub async fn submit_upload(&self, path: &Path) -> Result<JobHandle, SubmitError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SubmitError::File {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let url = format!("{}/api/upload/submit", self.config.api_url);
        let response = self
            .authorized(self.client.post(&url))
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;
        submission_handle(response, JobKind::UploadProcessing).await
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Shared tail of both submissions: status check, body decode, handle.
async fn submission_handle(
    response: reqwest::Response,
    kind: JobKind,
) -> Result<JobHandle, SubmitError> {
    let status = response.status();
    if !status.is_success() {
        warn!(%status, %kind, "submission rejected");
        return Err(SubmitError::Status(status.as_u16()));
    }

    let body: SubmitResponse = response
        .json()
        .await
        .map_err(|e| SubmitError::MalformedBody(e.to_string()))?;
    if body.job_id.is_empty() {
        return Err(SubmitError::MalformedBody("empty job_id".to_string()));
    }

    let handle = JobHandle::new(JobId::new(body.job_id), kind);
    info!(job_id = %handle.id, %kind, "job submitted");
    Ok(handle)
}

#[async_trait]
impl StatusProbe for GoatApi {
    async fn fetch_status(&self, id: &JobId) -> Result<StatusResponse, ProbeError> {
        let url = format!("{}/api/jobs/{}/status", self.config.api_url, id);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        response
            .json::<StatusResponse>()
            .await
            .map_err(|e| ProbeError::Decode(e.to_string()))
    }
}

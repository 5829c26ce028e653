// crates/types/src/job.rs
//! Job identity: id, kind, and the immutable submission handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque job identifier assigned by the backend at submission time.
///
/// Never fabricated client-side and never reused across two submissions
/// within one registry lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of submitted work. Fixes the status-poll cadence for the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    VideoGeneration,
    UploadProcessing,
}

impl JobKind {
    /// Interval between status checks for this kind.
    ///
    /// Generation jobs run minutes; upload processing finishes in seconds
    /// and gets the tighter cadence.
    pub fn poll_interval(&self) -> Duration {
        match self {
            JobKind::VideoGeneration => Duration::from_millis(5000),
            JobKind::UploadProcessing => Duration::from_millis(2000),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::VideoGeneration => "video-generation",
            JobKind::UploadProcessing => "upload-processing",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable identity of one submitted job.
///
/// Constructed only from a successful submission response; carries no
/// mutable state. Live status is observed through the registry, not here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHandle {
    pub id: JobId,
    pub kind: JobKind,
    pub submitted_at: DateTime<Utc>,
}

impl JobHandle {
    pub fn new(id: JobId, kind: JobKind) -> Self {
        Self {
            id,
            kind,
            submitted_at: Utc::now(),
        }
    }
}

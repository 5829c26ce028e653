// crates/types/src/status.rs
//! The closed status set a tracked job moves through.

use serde::Serialize;
use std::fmt;

/// Current state of a tracked job.
///
/// Closed set: callers can match exhaustively. `Complete` is the only
/// state carrying a result payload, `Failed` the only one carrying
/// failure detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum JobStatus {
    Pending,
    Running,
    Complete { result: serde_json::Value },
    Failed { failure: JobFailure },
}

impl JobStatus {
    /// Terminal states end polling; no further status follows.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete { .. } | JobStatus::Failed { .. })
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => f.write_str("pending"),
            JobStatus::Running => f.write_str("running"),
            JobStatus::Complete { .. } => f.write_str("complete"),
            JobStatus::Failed { failure } => write!(f, "failed: {failure}"),
        }
    }
}

/// Why a job ended in `Failed`.
///
/// Distinguishes a backend-reported business failure from a client-side
/// polling breakdown so callers never confuse "the work failed" with
/// "we lost sight of the work".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum JobFailure {
    /// The backend reported the job itself failed.
    Backend { detail: String },
    /// A status check failed at the network layer.
    Transport { detail: String },
    /// The status payload carried no recognizable state field.
    Malformed { detail: String },
    /// Total polling time exceeded the configured deadline.
    DeadlineExceeded { waited_secs: u64 },
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailure::Backend { detail } => write!(f, "job failed: {detail}"),
            JobFailure::Transport { detail } => write!(f, "status check failed: {detail}"),
            JobFailure::Malformed { detail } => write!(f, "unusable status payload: {detail}"),
            JobFailure::DeadlineExceeded { waited_secs } => {
                write!(f, "no terminal state after {waited_secs}s")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Complete {
            result: serde_json::Value::Null
        }
        .is_terminal());
        assert!(JobStatus::Failed {
            failure: JobFailure::Backend {
                detail: "boom".into()
            }
        }
        .is_terminal());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(JobStatus::Pending.to_string(), "pending");
        assert_eq!(JobStatus::Running.to_string(), "running");

        let failed = JobStatus::Failed {
            failure: JobFailure::Backend {
                detail: "codec unsupported".into(),
            },
        };
        assert_eq!(failed.to_string(), "failed: job failed: codec unsupported");
    }

    #[test]
    fn test_failure_display() {
        let f = JobFailure::Transport {
            detail: "connection refused".into(),
        };
        assert_eq!(f.to_string(), "status check failed: connection refused");

        let f = JobFailure::DeadlineExceeded { waited_secs: 600 };
        assert_eq!(f.to_string(), "no terminal state after 600s");
    }

    #[test]
    fn test_status_serialize_tagged() {
        let status = JobStatus::Complete {
            result: serde_json::json!({ "url": "https://cdn.example/video.mp4" }),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"state\":\"complete\""));
        assert!(json.contains("video.mp4"));

        let status = JobStatus::Failed {
            failure: JobFailure::Malformed {
                detail: "no status field".into(),
            },
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"state\":\"failed\""));
        assert!(json.contains("\"reason\":\"malformed\""));
    }
}

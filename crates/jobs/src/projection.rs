// crates/jobs/src/projection.rs
//! Pure classification of raw status payloads.

use goat_types::{JobFailure, JobStatus, StatusResponse};

/// Map a raw backend payload onto the closed `JobStatus` set.
///
/// Unknown in-progress vocabulary maps to `Running` so a new backend
/// status string never terminates polling early. A payload with no
/// usable `status` field is terminal `Failed`: progress cannot be
/// assumed from a shape we do not understand.
pub fn project_status(raw: &StatusResponse) -> JobStatus {
    let Some(state) = raw
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return JobStatus::Failed {
            failure: JobFailure::Malformed {
                detail: "response carried no status field".to_string(),
            },
        };
    };

    match state.to_ascii_lowercase().as_str() {
        "completed" | "complete" | "done" => JobStatus::Complete {
            result: raw.result.clone().unwrap_or(serde_json::Value::Null),
        },
        "failed" | "error" => JobStatus::Failed {
            failure: JobFailure::Backend {
                detail: raw
                    .error
                    .clone()
                    .unwrap_or_else(|| "job failed without detail".to_string()),
            },
        },
        "pending" | "queued" => JobStatus::Pending,
        _ => JobStatus::Running,
    }
}

// crates/jobs/src/poller.rs
//! The per-job poll loop.

use std::sync::Arc;
use std::time::Duration;

use goat_types::{JobFailure, JobHandle, JobStatus};
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::probe::StatusProbe;
use crate::projection::project_status;

/// Poll `handle` until a terminal status, cancellation, or the deadline.
///
/// Publishes status changes into `status_tx` and returns the terminal
/// status it published, or `None` when the token was cancelled first.
/// The deadline caps each individual check as well as the overall wait,
/// so a request that never resolves ends the job as `DeadlineExceeded`
/// instead of stalling the loop. A cancelled job publishes nothing
/// further, even if a check was already in flight when the cancel
/// landed.
pub(crate) async fn poll_until_terminal(
    handle: JobHandle,
    probe: Arc<dyn StatusProbe>,
    status_tx: watch::Sender<JobStatus>,
    cancel: CancellationToken,
    deadline: Duration,
) -> Option<JobStatus> {
    let period = handle.kind.poll_interval();
    // First check fires one full period after start: an immediate check
    // is guaranteed to see "pending".
    let mut ticker = time::interval_at(Instant::now() + period, period);
    // A check still outstanding when the next tick comes due means that
    // tick is skipped, never overlapped.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();

    tracing::debug!(
        job_id = %handle.id,
        kind = %handle.kind,
        interval_ms = period.as_millis() as u64,
        "poll loop started"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            _ = ticker.tick() => {}
        }

        let waited = started.elapsed();
        if waited >= deadline {
            let status = JobStatus::Failed {
                failure: JobFailure::DeadlineExceeded {
                    waited_secs: waited.as_secs(),
                },
            };
            tracing::warn!(
                job_id = %handle.id,
                waited_secs = waited.as_secs(),
                "poll deadline exceeded"
            );
            publish(&status_tx, &status);
            return Some(status);
        }

        // The check itself gets only the time left before the deadline;
        // a request that never resolves must not stall the loop.
        let outcome = time::timeout(
            deadline.saturating_sub(waited),
            probe.fetch_status(&handle.id),
        )
        .await;

        // A cancel that landed while the check was in flight wins: the
        // response is stale and must not surface.
        if cancel.is_cancelled() {
            return None;
        }

        let status = match outcome {
            Ok(Ok(raw)) => project_status(&raw),
            Ok(Err(err)) => {
                tracing::warn!(
                    job_id = %handle.id,
                    error = %err,
                    "status check failed; ending polling"
                );
                JobStatus::Failed {
                    failure: JobFailure::Transport {
                        detail: err.to_string(),
                    },
                }
            }
            Err(_) => {
                let waited = started.elapsed();
                tracing::warn!(
                    job_id = %handle.id,
                    waited_secs = waited.as_secs(),
                    "status check still unresolved at the poll deadline"
                );
                JobStatus::Failed {
                    failure: JobFailure::DeadlineExceeded {
                        waited_secs: waited.as_secs(),
                    },
                }
            }
        };

        tracing::debug!(job_id = %handle.id, status = %status, "status check");

        let terminal = status.is_terminal();
        publish(&status_tx, &status);
        if terminal {
            return Some(status);
        }
    }
}

/// Publish only real changes so repeated "running" ticks do not wake
/// subscribers.
fn publish(status_tx: &watch::Sender<JobStatus>, status: &JobStatus) {
    status_tx.send_if_modified(|current| {
        if current == status {
            false
        } else {
            *current = status.clone();
            true
        }
    });
}

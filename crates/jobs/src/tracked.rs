// crates/jobs/src/tracked.rs
//! Caller-facing view of one registered job.

use goat_types::{JobHandle, JobId, JobStatus};
use tokio::sync::watch;

use crate::registry::JobRegistry;

/// Observer handed out by `JobRegistry::register`.
///
/// Holds the immutable handle, the subscribable current status, and the
/// way back to the registry for cancellation. Dropping a `TrackedJob`
/// does not stop the job; only cancellation does.
pub struct TrackedJob {
    handle: JobHandle,
    status: watch::Receiver<JobStatus>,
    registry: JobRegistry,
}

impl TrackedJob {
    pub(crate) fn new(
        handle: JobHandle,
        status: watch::Receiver<JobStatus>,
        registry: JobRegistry,
    ) -> Self {
        Self {
            handle,
            status,
            registry,
        }
    }

    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    pub fn id(&self) -> &JobId {
        &self.handle.id
    }

    /// Current status snapshot.
    pub fn status(&self) -> JobStatus {
        self.status.borrow().clone()
    }

    /// A fresh receiver for callers running their own change loop.
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.status.clone()
    }

    /// Ask the registry to stop polling this job. Idempotent.
    pub fn cancel(&self) {
        self.registry.cancel(&self.handle.id);
    }

    /// Wait until the job reaches a terminal status and return it.
    ///
    /// Returns `None` if the job was cancelled first; a cancelled job
    /// never produces a terminal notification.
    pub async fn wait_terminal(&mut self) -> Option<JobStatus> {
        loop {
            let current = self.status.borrow_and_update().clone();
            if current.is_terminal() {
                return Some(current);
            }
            if self.status.changed().await.is_err() {
                return None;
            }
        }
    }
}

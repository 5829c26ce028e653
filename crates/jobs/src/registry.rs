// crates/jobs/src/registry.rs
//! Process-wide table of in-flight jobs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use goat_types::{JobHandle, JobId, JobStatus};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::config::PollConfig;
use crate::poller::poll_until_terminal;
use crate::probe::StatusProbe;
use crate::tracked::TrackedJob;

/// Registry-wide lifecycle event, one stream across all jobs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum JobEvent {
    Registered { handle: JobHandle },
    StatusChanged { id: JobId, status: JobStatus },
    Cancelled { id: JobId },
}

struct Entry {
    handle: JobHandle,
    status_rx: watch::Receiver<JobStatus>,
    cancel: CancellationToken,
}

/// Owner of every in-flight job's polling lifecycle.
///
/// Cloning is cheap; every clone operates on the same table. Only the
/// registry starts or stops poll loops: callers observe through the
/// `TrackedJob` it hands out and cancel through the registry API, so a
/// discarded caller can never leak a timer or stop someone else's job.
#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    jobs: RwLock<HashMap<JobId, Entry>>,
    events_tx: broadcast::Sender<JobEvent>,
    config: PollConfig,
}

impl JobRegistry {
    pub fn new(config: PollConfig) -> Self {
        let (events_tx, _) = broadcast::channel(config.event_capacity);
        Self {
            inner: Arc::new(RegistryInner {
                jobs: RwLock::new(HashMap::new()),
                events_tx,
                config,
            }),
        }
    }

    /// Start tracking a freshly submitted job.
    ///
    /// Spawns the poll loop for `handle` wired to `probe` and returns the
    /// caller-facing view. Registering an id that is already in flight is
    /// a caller bug: it is logged and ignored, and the returned
    /// `TrackedJob` observes the job already running.
    pub fn register(&self, handle: JobHandle, probe: Arc<dyn StatusProbe>) -> TrackedJob {
        let (status_tx, status_rx) = watch::channel(JobStatus::Pending);
        let cancel = CancellationToken::new();

        match self.inner.jobs.write() {
            Ok(mut jobs) => {
                if let Some(existing) = jobs.get(&handle.id) {
                    tracing::warn!(job_id = %handle.id, "duplicate job registration ignored");
                    return TrackedJob::new(
                        existing.handle.clone(),
                        existing.status_rx.clone(),
                        self.clone(),
                    );
                }
                jobs.insert(
                    handle.id.clone(),
                    Entry {
                        handle: handle.clone(),
                        status_rx: status_rx.clone(),
                        cancel: cancel.clone(),
                    },
                );
            }
            Err(e) => tracing::error!("RwLock poisoned writing jobs map: {e}"),
        }

        tracing::info!(job_id = %handle.id, kind = %handle.kind, "job registered");
        let _ = self.inner.events_tx.send(JobEvent::Registered {
            handle: handle.clone(),
        });

        // Forward per-job status changes onto the registry-wide stream.
        let events_tx = self.inner.events_tx.clone();
        let mut fwd_rx = status_rx.clone();
        let fwd_id = handle.id.clone();
        tokio::spawn(async move {
            while fwd_rx.changed().await.is_ok() {
                let status = fwd_rx.borrow_and_update().clone();
                let terminal = status.is_terminal();
                let _ = events_tx.send(JobEvent::StatusChanged {
                    id: fwd_id.clone(),
                    status,
                });
                if terminal {
                    break;
                }
            }
        });

        // The poll task owns the send side; the entry only observes. On a
        // terminal status the task evicts its own entry.
        let inner = Arc::clone(&self.inner);
        let task_handle = handle.clone();
        tokio::spawn(async move {
            let id = task_handle.id.clone();
            let deadline = inner.config.deadline;
            if let Some(status) =
                poll_until_terminal(task_handle, probe, status_tx, cancel, deadline).await
            {
                match inner.jobs.write() {
                    Ok(mut jobs) => {
                        jobs.remove(&id);
                    }
                    Err(e) => tracing::error!("RwLock poisoned evicting job: {e}"),
                }
                tracing::info!(job_id = %id, status = %status, "job finished");
            }
        });

        TrackedJob::new(handle, status_rx, self.clone())
    }

    /// Stop polling `id` and drop it from the table.
    ///
    /// Idempotent: unknown and already-finished ids are a safe no-op. No
    /// status notification follows a cancel, even for a check already in
    /// flight.
    pub fn cancel(&self, id: &JobId) {
        let entry = match self.inner.jobs.write() {
            Ok(mut jobs) => jobs.remove(id),
            Err(e) => {
                tracing::error!("RwLock poisoned cancelling job: {e}");
                None
            }
        };
        let Some(entry) = entry else {
            return;
        };

        entry.cancel.cancel();
        tracing::info!(job_id = %id, "job cancelled");
        let _ = self
            .inner
            .events_tx
            .send(JobEvent::Cancelled { id: id.clone() });
    }

    /// Cancel every in-flight job. Teardown path: leaves no live poll
    /// loops behind.
    pub fn cancel_all(&self) {
        let drained: Vec<Entry> = match self.inner.jobs.write() {
            Ok(mut jobs) => jobs.drain().map(|(_, entry)| entry).collect(),
            Err(e) => {
                tracing::error!("RwLock poisoned draining jobs map: {e}");
                Vec::new()
            }
        };
        if drained.is_empty() {
            return;
        }

        for entry in &drained {
            entry.cancel.cancel();
            let _ = self.inner.events_tx.send(JobEvent::Cancelled {
                id: entry.handle.id.clone(),
            });
        }
        tracing::info!(count = drained.len(), "cancelled all in-flight jobs");
    }

    /// Subscribe to lifecycle events across all jobs.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.events_tx.subscribe()
    }

    /// Current status of an in-flight job. `None` once a job has finished
    /// and been evicted, or was never registered; callers that need the
    /// final status hold on to their `TrackedJob`.
    pub fn status_of(&self, id: &JobId) -> Option<JobStatus> {
        match self.inner.jobs.read() {
            Ok(jobs) => jobs.get(id).map(|entry| entry.status_rx.borrow().clone()),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                None
            }
        }
    }

    /// Handles of all jobs still being polled.
    pub fn active_jobs(&self) -> Vec<JobHandle> {
        match self.inner.jobs.read() {
            Ok(jobs) => jobs
                .values()
                .filter(|entry| !entry.status_rx.borrow().is_terminal())
                .map(|entry| entry.handle.clone())
                .collect(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.jobs.read() {
            Ok(jobs) => jobs.len(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;
    use async_trait::async_trait;
    use goat_types::{JobKind, StatusResponse};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedProbe {
        script: Mutex<VecDeque<StatusResponse>>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new(steps: Vec<StatusResponse>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusProbe for ScriptedProbe {
        async fn fetch_status(&self, _id: &JobId) -> Result<StatusResponse, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.script.lock().unwrap().pop_front();
            Ok(step.unwrap_or_else(|| StatusResponse {
                status: Some("running".into()),
                ..Default::default()
            }))
        }
    }

    fn running() -> StatusResponse {
        StatusResponse {
            status: Some("running".into()),
            ..Default::default()
        }
    }

    fn completed() -> StatusResponse {
        StatusResponse {
            status: Some("completed".into()),
            result: Some(serde_json::json!({ "ok": true })),
            error: None,
        }
    }

    fn handle(id: &str, kind: JobKind) -> JobHandle {
        JobHandle::new(JobId::new(id), kind)
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_polls_to_terminal_and_evicts() {
        let registry = JobRegistry::default();
        let probe = ScriptedProbe::new(vec![running(), completed()]);

        let mut tracked = registry.register(
            handle("gen-1", JobKind::VideoGeneration),
            probe.clone(),
        );
        assert_eq!(registry.len(), 1);

        let status = tracked.wait_terminal().await.expect("not cancelled");
        assert!(matches!(status, JobStatus::Complete { .. }));
        assert_eq!(probe.calls(), 2);

        // The poll task removes its own entry after the terminal publish.
        tokio::task::yield_now().await;
        assert!(registry.is_empty());
        assert_eq!(registry.status_of(&JobId::new("gen-1")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_registration_is_a_noop_observing_the_original() {
        let registry = JobRegistry::default();
        let first_probe = ScriptedProbe::new(vec![running(), running(), completed()]);
        let second_probe = ScriptedProbe::new(vec![completed()]);

        let _first = registry.register(
            handle("dup-1", JobKind::VideoGeneration),
            first_probe.clone(),
        );
        let mut second = registry.register(
            handle("dup-1", JobKind::VideoGeneration),
            second_probe.clone(),
        );

        assert_eq!(registry.len(), 1);

        // The second probe never runs; the second view tracks the first task.
        let status = second.wait_terminal().await.expect("not cancelled");
        assert!(matches!(status, JobStatus::Complete { .. }));
        assert_eq!(second_probe.calls(), 0);
        assert_eq!(first_probe.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_stops_polling() {
        let registry = JobRegistry::default();
        let probe = ScriptedProbe::new(vec![]);

        let id = JobId::new("up-1");
        let _tracked = registry.register(
            handle("up-1", JobKind::UploadProcessing),
            probe.clone(),
        );
        tokio::task::yield_now().await;

        registry.cancel(&id);
        assert!(registry.is_empty());

        // Second cancel and unknown-id cancel are safe no-ops.
        registry.cancel(&id);
        registry.cancel(&JobId::new("never-registered"));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelling_one_job_leaves_the_other_untouched() {
        let registry = JobRegistry::default();
        let gen_probe = ScriptedProbe::new(vec![running(), completed()]);
        let upload_probe = ScriptedProbe::new(vec![]);

        let mut gen = registry.register(
            handle("gen-1", JobKind::VideoGeneration),
            gen_probe.clone(),
        );
        let upload = registry.register(
            handle("up-1", JobKind::UploadProcessing),
            upload_probe.clone(),
        );

        tokio::task::yield_now().await;
        upload.cancel();

        let status = gen.wait_terminal().await.expect("not cancelled");
        assert!(matches!(status, JobStatus::Complete { .. }));
        assert_eq!(gen_probe.calls(), 2);
        assert_eq!(upload_probe.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_leaves_no_live_poll_loops() {
        let registry = JobRegistry::default();
        let probe = ScriptedProbe::new(vec![]);

        let _a = registry.register(
            handle("a", JobKind::VideoGeneration),
            probe.clone(),
        );
        let _b = registry.register(
            handle("b", JobKind::UploadProcessing),
            probe.clone(),
        );
        assert_eq!(registry.len(), 2);

        registry.cancel_all();
        assert!(registry.is_empty());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_jobs_lists_only_in_flight_handles() {
        let registry = JobRegistry::default();
        let fast = ScriptedProbe::new(vec![completed()]);
        let slow = ScriptedProbe::new(vec![]);

        let mut done = registry.register(
            handle("done", JobKind::UploadProcessing),
            fast.clone(),
        );
        let _pending = registry.register(
            handle("pending", JobKind::VideoGeneration),
            slow.clone(),
        );

        done.wait_terminal().await.expect("not cancelled");
        tokio::task::yield_now().await;

        let active = registry.active_jobs();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, JobId::new("pending"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_stream_covers_the_job_lifecycle_in_order() {
        let registry = JobRegistry::default();
        let mut events = registry.subscribe();
        let probe = ScriptedProbe::new(vec![running(), completed()]);

        let _tracked = registry.register(
            handle("ev-1", JobKind::UploadProcessing),
            probe.clone(),
        );

        match events.recv().await.unwrap() {
            JobEvent::Registered { handle } => assert_eq!(handle.id, JobId::new("ev-1")),
            other => panic!("expected Registered, got {other:?}"),
        }
        match events.recv().await.unwrap() {
            JobEvent::StatusChanged { status, .. } => assert_eq!(status, JobStatus::Running),
            other => panic!("expected StatusChanged, got {other:?}"),
        }
        match events.recv().await.unwrap() {
            JobEvent::StatusChanged { status, .. } => {
                assert!(matches!(status, JobStatus::Complete { .. }))
            }
            other => panic!("expected StatusChanged, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_emits_a_cancelled_event_and_no_status() {
        let registry = JobRegistry::default();
        let mut events = registry.subscribe();
        let probe = ScriptedProbe::new(vec![]);

        let id = JobId::new("cx-1");
        let _tracked = registry.register(
            handle("cx-1", JobKind::VideoGeneration),
            probe.clone(),
        );
        tokio::task::yield_now().await;
        registry.cancel(&id);

        assert!(matches!(
            events.recv().await.unwrap(),
            JobEvent::Registered { .. }
        ));
        match events.recv().await.unwrap() {
            JobEvent::Cancelled { id: got } => assert_eq!(got, id),
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_of_reports_in_flight_jobs() {
        let registry = JobRegistry::default();
        let probe = ScriptedProbe::new(vec![]);

        let id = JobId::new("st-1");
        let _tracked = registry.register(
            handle("st-1", JobKind::UploadProcessing),
            probe.clone(),
        );

        assert_eq!(registry.status_of(&id), Some(JobStatus::Pending));
        tokio::time::sleep(Duration::from_millis(2100)).await;
        tokio::task::yield_now().await;
        assert_eq!(registry.status_of(&id), Some(JobStatus::Running));
    }

    #[test]
    fn test_registry_default_is_empty() {
        let registry = JobRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.active_jobs().is_empty());
    }
}

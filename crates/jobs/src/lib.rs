// crates/jobs/src/lib.rs
//! Client-side tracking of long-running backend jobs.
//!
//! Provides:
//! - `JobRegistry`: owner of every in-flight job's polling lifecycle
//! - `TrackedJob`: caller-facing view, subscribable status plus cancellation
//! - `StatusProbe`: transport seam, one status check wide
//! - `project_status`: classification of raw payloads into `JobStatus`

pub mod config;
mod poller;
pub mod probe;
pub mod projection;
pub mod registry;
pub mod tracked;

pub use config::PollConfig;
pub use probe::{ProbeError, StatusProbe};
pub use projection::project_status;
pub use registry::{JobEvent, JobRegistry};
pub use tracked::TrackedJob;

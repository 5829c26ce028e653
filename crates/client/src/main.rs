// crates/client/src/main.rs
//! GOAT job client binary.
//!
//! Submits work to the backend, registers the job for polling, and follows
//! it to a terminal state with a TUI spinner. Exit code is the job outcome:
//! completed jobs print their result JSON, failed jobs exit non-zero.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use goat_client::{ClientConfig, GoatApi};
use goat_jobs::{JobRegistry, TrackedJob};
use goat_types::{GenerationRequest, JobHandle, JobId, JobKind, JobStatus};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "goat", version, about = "Submit and watch GOAT backend jobs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Queue a memory-video generation job from existing clips.
    Generate {
        /// Clip ids to stitch, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        clips: Vec<String>,
        /// Render template name.
        #[arg(long, default_value = "memories")]
        template: String,
        /// Narration voice style.
        #[arg(long, default_value = "warm")]
        voice: String,
    },
    /// Upload a local clip for ingest processing.
    Upload {
        /// Path to the clip file.
        path: PathBuf,
    },
    /// Re-attach to an already submitted job and watch it finish.
    Watch {
        /// Job id returned at submission time.
        job_id: String,
        /// Job kind; sets the poll cadence.
        #[arg(long, default_value = "video-generation")]
        kind: String,
    },
}

fn parse_kind(raw: &str) -> Result<JobKind> {
    match raw {
        "video-generation" | "generation" => Ok(JobKind::VideoGeneration),
        "upload-processing" | "upload" => Ok(JobKind::UploadProcessing),
        other => anyhow::bail!("unknown job kind: {other}"),
    }
}

/// Follow one tracked job to its end with a status spinner.
///
/// Ctrl-C cancels every registered job before exiting, so no poll loop
/// outlives the watch.
async fn watch_to_terminal(
    registry: &JobRegistry,
    mut tracked: TrackedJob,
) -> Result<Option<JobStatus>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .expect("valid spinner template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut rx = tracked.subscribe();
    loop {
        let status = rx.borrow_and_update().clone();
        pb.set_message(format!("{} \u{2014} {}", tracked.id(), status));
        if status.is_terminal() {
            break;
        }
        tokio::select! {
            _ = &mut ctrl_c => {
                pb.finish_and_clear();
                registry.cancel_all();
                anyhow::bail!("interrupted; polling cancelled");
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    pb.finish_and_clear();

    Ok(tracked.wait_terminal().await)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Quiet by default, RUST_LOG overrides. Result JSON owns stdout, so
    // logs go to stderr with the spinner.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::default();
    let registry = JobRegistry::new(config.poll_config());
    let api = Arc::new(GoatApi::new(config));

    let handle = match cli.cmd {
        Cmd::Generate {
            clips,
            template,
            voice,
        } => {
            let request = GenerationRequest {
                clips,
                template,
                voice_style: voice,
            };
            let handle = api.submit_generation(&request).await?;
            eprintln!("  \u{2713} generation job {} submitted", handle.id);
            handle
        }
        Cmd::Upload { path } => {
            let handle = api.submit_upload(&path).await?;
            eprintln!("  \u{2713} upload job {} submitted", handle.id);
            handle
        }
        Cmd::Watch { job_id, kind } => {
            let kind = parse_kind(&kind)?;
            JobHandle::new(JobId::new(job_id), kind)
        }
    };

    let tracked = registry.register(handle, api);
    match watch_to_terminal(&registry, tracked).await? {
        Some(JobStatus::Complete { result }) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Some(JobStatus::Failed { failure }) => Err(anyhow::anyhow!("{failure}")),
        _ => Err(anyhow::anyhow!("job ended without a terminal status")),
    }
}

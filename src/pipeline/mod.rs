//! The ingestion pipeline: watcher, queue, worker, cleanup.
//!
//! Each submodule implements exactly one stage; keeping them separate
//! makes each independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! watch ──▶ queue ──▶ worker ──▶ output  or  quarantine
//! (notify)  (mpsc)   (transform)  (writer)    (cleanup)
//! ```
//!
//! 1. [`watch`]   — non-recursive create-event watcher; filters lock
//!    markers and foreign extensions, settles, enqueues
//! 2. [`job`]     — the queued unit and its job-scoped flags
//! 3. [`worker`]  — the single consumer; runs each transformation in
//!    `spawn_blocking` and catches every per-job error at the boundary
//! 4. [`cleanup`] — success scrub, failure purge + bounded-retry
//!    quarantine move
//!
//! [`run`] wires the stages into the daemon loop; [`process_file`] runs
//! one job without the watcher (tests, one-shot CLI use).

pub mod cleanup;
pub mod job;
pub mod watch;
pub mod worker;

pub use job::{Job, JobState};
pub use worker::process_job;

use crate::config::PipelineConfig;
use crate::error::{JobError, SolardocError};
use crate::errorlog::ErrorLog;
use crate::model::{DocumentSummary, SourceDocument};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Run the daemon until interrupted: watch the input directory, process
/// jobs strictly sequentially, drain the queue on shutdown so the
/// in-flight job finishes.
pub async fn run(config: PipelineConfig) -> Result<(), SolardocError> {
    for dir in [&config.watch_dir, &config.output_dir, &config.quarantine_dir] {
        std::fs::create_dir_all(dir).map_err(|source| SolardocError::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }

    let config = Arc::new(config);
    let log = Arc::new(ErrorLog::new(config.error_log.clone()));
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    let watch_handle = watch::spawn(&config, tx)?;
    let worker = tokio::spawn(worker::run_worker(rx, Arc::clone(&config), log));

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| SolardocError::Internal(format!("interrupt handler failed: {e}")))?;
    info!("interrupt received, draining job queue");

    // Dropping the watcher drops the queue's only sender; the worker
    // finishes the jobs already queued, then stops.
    drop(watch_handle);
    worker
        .await
        .map_err(|e| SolardocError::Internal(format!("worker task failed: {e}")))?;
    Ok(())
}

/// Transform a single source document without the watcher.
pub fn process_file(path: &Path, config: &PipelineConfig) -> Result<PathBuf, JobError> {
    let job = Job::new(path).ok_or_else(|| JobError::Internal(format!(
        "path has no usable file name: '{}'",
        path.display()
    )))?;
    worker::process_job(&job, config)
}

/// Summarise a source document's extracted shape without running the
/// rule engine. Useful for triaging quarantined files: figures are
/// counted, not normalised, so the working folder is left untouched.
pub fn inspect(path: &Path, config: &PipelineConfig) -> Result<DocumentSummary, JobError> {
    let mut raw = config.resolve_reader().open(path)?;
    raw.strip_title_prefix();
    let work_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let doc = SourceDocument::extract(&raw, Vec::new());
    let mut summary = DocumentSummary::of(&doc);
    summary.images = config.resolve_extractor().count(path, work_dir)?;
    Ok(summary)
}

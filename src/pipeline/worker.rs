//! The consumer: one worker draining the job queue strictly
//! sequentially.
//!
//! A job's whole transformation is synchronous document work, so it runs
//! inside `spawn_blocking`; the worker awaits each job before popping the
//! next one. That single-worker sequencing is the pipeline's only
//! concurrency control — cursors and the consumer-figure flag are
//! job-scoped and never observed by two jobs at once.
//!
//! Every [`JobError`] is caught here, at the job boundary: it is logged
//! with an incrementing sequence number, the source is quarantined, and
//! the loop moves on. The pipeline never dies because one document was
//! malformed.

use crate::config::PipelineConfig;
use crate::error::JobError;
use crate::errorlog::ErrorLog;
use crate::frontmatter::FrontMatter;
use crate::model::SourceDocument;
use crate::output;
use crate::pipeline::cleanup;
use crate::pipeline::job::{Job, JobState};
use crate::rules::{self, EngineOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

/// Drain the queue until every sender is gone.
pub async fn run_worker(
    mut rx: UnboundedReceiver<Job>,
    config: Arc<PipelineConfig>,
    log: Arc<ErrorLog>,
) {
    while let Some(mut job) = rx.recv().await {
        job.state = JobState::Processing;
        info!(file = %job.file_name, "job started");

        let blocking_job = job.clone();
        let blocking_config = Arc::clone(&config);
        let result =
            tokio::task::spawn_blocking(move || process_job(&blocking_job, &blocking_config))
                .await
                .unwrap_or_else(|join_err| {
                    Err(JobError::Internal(format!("job task panicked: {join_err}")))
                });

        match result {
            Ok(output_path) => {
                job.state = JobState::Succeeded;
                info!(file = %job.file_name, output = %output_path.display(), "job succeeded");
                cleanup::scrub_working_folder(&job, &config);
            }
            Err(err) => {
                job.state = JobState::Failed;
                let seq = log.append(&job.file_name, &err);
                error!(file = %job.file_name, seq, error = %err, "job failed");
                cleanup::purge_and_quarantine(&job, &config);
            }
        }
    }
    info!("job queue closed, worker stopping");
}

/// Run one job's full transformation: read, extract, traverse, assemble,
/// persist. Synchronous on purpose — callers decide the threading.
pub fn process_job(job: &Job, config: &PipelineConfig) -> Result<PathBuf, JobError> {
    let mut raw = config.resolve_reader().open(&job.source_path)?;
    raw.strip_title_prefix();

    let images = config
        .resolve_extractor()
        .extract(&job.source_path, job.work_dir())?;
    let doc = SourceDocument::extract(&raw, images);
    let front_matter = FrontMatter::extract(&raw)?;

    let outcome = rules::transform(
        &doc,
        &EngineOptions {
            first_table_index: config.first_table_index,
            first_image_index: config.first_image_index,
            skip_consumer_figure: job.suppress_consumer_figure(),
        },
    )?;
    info!(
        file = %job.file_name,
        tables = outcome.table_cursor,
        figures = outcome.image_cursor,
        blocks = outcome.ops.len(),
        "transformation complete"
    );

    let output_doc = output::assemble(&front_matter, &outcome.ops, &raw, &config.template)?;

    std::fs::create_dir_all(&config.output_dir).map_err(|source| JobError::WorkDir {
        path: config.output_dir.clone(),
        source,
    })?;
    let output_path = config.output_path(&job.file_name);
    config.resolve_writer().write(&output_doc, &output_path)?;
    Ok(output_path)
}

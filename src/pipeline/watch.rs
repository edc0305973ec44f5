//! The producer: a non-recursive directory watcher that turns file
//! creation events into queued jobs.
//!
//! The watcher callback runs on `notify`'s own thread and never touches
//! document content; it filters the event, sleeps out the settle delay
//! (the creating process may still be writing), and forwards a [`Job`]
//! into the queue. Blocking that thread during the delay is fine — there
//! is exactly one producer and ordering is preserved.

use crate::config::PipelineConfig;
use crate::error::SolardocError;
use crate::pipeline::job::Job;
use notify::event::{CreateKind, EventKind};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Running watcher; dropping it detaches from the directory, which in
/// turn closes the job queue once the sender is gone.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
}

/// Should this created path become a job?
///
/// Directories, wrong extensions, and lock-marker files are ignored.
pub fn eligible(path: &Path, extension: &str, lock_marker_prefix: &str) -> bool {
    if path.is_dir() {
        return false;
    }
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if !has_extension {
        return false;
    }
    !path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(lock_marker_prefix))
}

/// Attach a watcher to the configured directory and start forwarding
/// jobs into `tx`.
pub fn spawn(
    config: &PipelineConfig,
    tx: UnboundedSender<Job>,
) -> Result<WatchHandle, SolardocError> {
    let extension = config.watch_extension.clone();
    let lock_prefix = config.lock_marker_prefix.clone();
    let settle = Duration::from_millis(config.settle_delay_ms);

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "watch event error");
                return;
            }
        };
        if !matches!(event.kind, EventKind::Create(CreateKind::File | CreateKind::Any)) {
            return;
        }
        for path in event.paths {
            if !eligible(&path, &extension, &lock_prefix) {
                debug!(path = %path.display(), "created path ignored");
                continue;
            }
            // Let the creating process finish writing before the worker
            // opens the file.
            std::thread::sleep(settle);
            match Job::new(&path) {
                Some(job) => {
                    info!(file = %job.file_name, "new source document queued");
                    if tx.send(job).is_err() {
                        debug!("job queue closed, event dropped");
                    }
                }
                None => warn!(path = %path.display(), "created path has no usable file name"),
            }
        }
    })?;

    watcher.watch(&config.watch_dir, RecursiveMode::NonRecursive)?;
    info!(dir = %config.watch_dir.display(), "watching for new source documents");
    Ok(WatchHandle { _watcher: watcher })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn eligibility_filters_extension_and_lock_markers() {
        assert!(eligible(Path::new("/in/report.json"), "json", "~$"));
        assert!(eligible(Path::new("/in/REPORT.JSON"), "json", "~$"));
        assert!(!eligible(Path::new("/in/report.txt"), "json", "~$"));
        assert!(!eligible(Path::new("/in/~$report.json"), "json", "~$"));
        assert!(!eligible(Path::new("/in/report"), "json", "~$"));
    }

    #[test]
    fn eligibility_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let sub: PathBuf = dir.path().join("folder.json");
        std::fs::create_dir(&sub).unwrap();
        assert!(!eligible(&sub, "json", "~$"));
    }

    #[tokio::test]
    async fn created_file_arrives_as_a_job() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::builder(dir.path())
            .settle_delay_ms(0)
            .build()
            .unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _handle = spawn(&config, tx).unwrap();

        std::fs::write(dir.path().join("report.json"), b"{}").unwrap();

        let job = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("watcher did not deliver within 5s")
            .expect("queue closed unexpectedly");
        assert_eq!(job.file_name, "report.json");
    }
}

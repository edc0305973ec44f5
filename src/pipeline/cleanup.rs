//! Post-job filesystem hygiene: working-folder scrubbing on success,
//! artifact purge and quarantine on failure.
//!
//! Everything here is best-effort except the quarantine move itself: a
//! leftover render directory is an annoyance, but a failed source that
//! silently stays in the watch folder would be re-processed on the next
//! daemon start, so the move gets bounded retries and a warning when it
//! ultimately fails.

use crate::config::PipelineConfig;
use crate::pipeline::job::Job;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// After success: remove the job's working artifacts — extracted image
/// directories, non-source-extension files (rendered PDFs, lock markers),
/// and the processed source itself.
pub fn scrub_working_folder(job: &Job, config: &PipelineConfig) {
    let dir = job.work_dir();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "working folder not readable, scrub skipped");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let remove = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else if path == job.source_path || !keeps_extension(&path, &config.watch_extension) {
            fs::remove_file(&path)
        } else {
            continue;
        };
        if let Err(e) = remove {
            warn!(path = %path.display(), error = %e, "could not remove working artifact");
        } else {
            debug!(path = %path.display(), "working artifact removed");
        }
    }
}

/// After failure: purge non-source artifacts, then move the source file
/// (if still present under its original name) to quarantine.
pub fn purge_and_quarantine(job: &Job, config: &PipelineConfig) {
    let dir = job.work_dir();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "working folder not readable, purge skipped");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Err(e) = fs::remove_dir_all(&path) {
                warn!(path = %path.display(), error = %e, "could not remove artifact directory");
            }
        } else if !keeps_extension(&path, &config.watch_extension) {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "could not remove artifact file");
            }
        }
    }

    if job.source_path.is_file() {
        let target = config.quarantine_dir.join(&job.file_name);
        if move_with_retry(
            &job.source_path,
            &target,
            config.move_retries,
            Duration::from_millis(config.move_retry_delay_ms),
        ) {
            info!(file = %job.file_name, target = %target.display(), "source quarantined");
        }
    }
}

/// Rename with a cross-device copy fallback, retried a bounded number of
/// times to ride out transient locks from concurrent readers.
pub fn move_with_retry(src: &Path, dst: &Path, retries: u32, delay: Duration) -> bool {
    for attempt in 1..=retries {
        match fs::rename(src, dst) {
            Ok(()) => return true,
            Err(_) => {
                // Rename fails across filesystems; fall back to copy+remove.
                if fs::copy(src, dst).is_ok() && fs::remove_file(src).is_ok() {
                    return true;
                }
            }
        }
        if attempt < retries {
            std::thread::sleep(delay);
        }
    }
    warn!(src = %src.display(), dst = %dst.display(), retries, "move failed after all retries");
    false
}

fn keeps_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(quarantine: &Path) -> PipelineConfig {
        PipelineConfig::builder("input")
            .quarantine_dir(quarantine)
            .move_retry_delay_ms(0)
            .build()
            .unwrap()
    }

    #[test]
    fn scrub_removes_artifacts_and_the_processed_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.json");
        std::fs::write(&source, b"{}").unwrap();
        std::fs::write(dir.path().join("report.pdf"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("images")).unwrap();
        let keeper = dir.path().join("other.json");
        std::fs::write(&keeper, b"{}").unwrap();

        let job = Job::new(&source).unwrap();
        scrub_working_folder(&job, &config(Path::new("q")));

        assert!(!source.exists());
        assert!(!dir.path().join("report.pdf").exists());
        assert!(!dir.path().join("images").exists());
        // Other queued sources survive the scrub.
        assert!(keeper.exists());
    }

    #[test]
    fn quarantine_preserves_the_original_file_name() {
        let work = tempfile::tempdir().unwrap();
        let quarantine = tempfile::tempdir().unwrap();
        let source = work.path().join("0042-report.json");
        std::fs::write(&source, b"{}").unwrap();
        std::fs::write(work.path().join("leftover.pdf"), b"x").unwrap();

        let job = Job::new(&source).unwrap();
        purge_and_quarantine(&job, &config(quarantine.path()));

        assert!(!source.exists());
        assert!(quarantine.path().join("0042-report.json").is_file());
        assert!(!work.path().join("leftover.pdf").exists());
    }

    #[test]
    fn move_with_retry_gives_up_after_bounded_attempts() {
        let missing = PathBuf::from("/nonexistent/src.json");
        let moved = move_with_retry(
            &missing,
            Path::new("/nonexistent/dst.json"),
            2,
            Duration::from_millis(0),
        );
        assert!(!moved);
    }
}

//! The plain-text failure log.
//!
//! One entry per failed job: an incrementing sequence number, a local
//! timestamp, the job's file name, and the full error chain. The log is
//! append-only and meant for operators triaging the quarantine folder;
//! structured diagnostics go through `tracing` separately.

use crate::error::JobError;
use chrono::Local;
use std::error::Error;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

/// Append-only failure log with a process-lifetime entry counter.
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    counter: AtomicU64,
}

impl ErrorLog {
    pub fn new(path: PathBuf) -> Self {
        ErrorLog {
            path,
            counter: AtomicU64::new(0),
        }
    }

    /// Record one failed job and return its sequence number.
    ///
    /// Logging must never fail a shutdown path, so write errors are
    /// reported through `tracing` and swallowed.
    pub fn append(&self, file_name: &str, err: &JobError) -> u64 {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S");

        let mut entry = format!("\n\n{n}\n{ts} ERROR job '{file_name}': {err}\n");
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = writeln!(entry, "  caused by: {cause}");
            source = cause.source();
        }

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(entry.as_bytes()));
        if let Err(io_err) = result {
            error!(path = %self.path.display(), %io_err, "failed to write error log entry");
        }
        n
    }

    /// Entries written so far by this process.
    pub fn entries(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Resource;

    fn sample_err() -> JobError {
        JobError::StructuralMismatch {
            resource: Resource::Table,
            wanted: 3,
            available: 2,
        }
    }

    #[test]
    fn entries_carry_incrementing_sequence_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(dir.path().join("error_log.txt"));
        assert_eq!(log.append("a.json", &sample_err()), 1);
        assert_eq!(log.append("b.json", &sample_err()), 2);
        assert_eq!(log.entries(), 2);

        let text = std::fs::read_to_string(dir.path().join("error_log.txt")).unwrap();
        assert!(text.contains("\n1\n"), "got: {text}");
        assert!(text.contains("\n2\n"), "got: {text}");
        assert!(text.contains("job 'a.json'"), "got: {text}");
        assert!(text.contains("table index 3"), "got: {text}");
    }

    #[test]
    fn unwritable_log_path_does_not_panic() {
        let log = ErrorLog::new(PathBuf::from("/nonexistent-dir/error_log.txt"));
        assert_eq!(log.append("a.json", &sample_err()), 1);
    }
}

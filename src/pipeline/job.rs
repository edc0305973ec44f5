//! One job: a single source-document-to-output-document transformation.

use std::path::{Path, PathBuf};

/// Lifecycle of a job, from notification to outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Processing,
    Succeeded,
    Failed,
}

/// One queued transformation unit.
#[derive(Debug, Clone)]
pub struct Job {
    /// Base file name, preserved for output naming and quarantine.
    pub file_name: String,
    pub source_path: PathBuf,
    pub state: JobState,
}

impl Job {
    /// Build a job from a created file's path. `None` when the path has
    /// no UTF-8 base name.
    pub fn new(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        Some(Job {
            file_name,
            source_path: path.to_path_buf(),
            state: JobState::Queued,
        })
    }

    /// Jobs whose file name starts with '0' are internal consumption
    /// estimates; their consumer-results figure is suppressed. Derived
    /// here once so the flag travels with the job instead of living in
    /// process state.
    pub fn suppress_consumer_figure(&self) -> bool {
        self.file_name.starts_with('0')
    }

    /// Directory the job's working artifacts (extracted images, renders)
    /// live in.
    pub fn work_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_figure_suppression_follows_the_leading_digit() {
        let a = Job::new(Path::new("/in/0042-report.json")).unwrap();
        assert!(a.suppress_consumer_figure());
        let b = Job::new(Path::new("/in/report.json")).unwrap();
        assert!(!b.suppress_consumer_figure());
    }

    #[test]
    fn job_starts_queued_with_its_base_name() {
        let job = Job::new(Path::new("/in/report.json")).unwrap();
        assert_eq!(job.file_name, "report.json");
        assert_eq!(job.state, JobState::Queued);
        assert_eq!(job.work_dir(), Path::new("/in"));
    }
}

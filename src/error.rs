//! Error types for the solardoc library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SolardocError`] — **Fatal**: the pipeline itself cannot start or
//!   continue (bad directories, watcher initialisation failure). Returned
//!   from [`crate::pipeline::run`].
//!
//! * [`JobError`] — **Per-job**: one source document failed to transform
//!   (missing file, structural mismatch, write failure). Caught at the job
//!   boundary by the worker, logged with an incrementing sequence number,
//!   and answered with quarantine — the pipeline keeps running.
//!
//! The separation is what keeps the daemon resilient: a single malformed
//! input never corrupts the pipeline's ability to process subsequent
//! inputs.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that stop the pipeline (never raised for a single job).
#[derive(Debug, Error)]
pub enum SolardocError {
    /// A configured directory could not be created.
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The filesystem watch service could not be initialised or attached.
    #[error("file watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error (worker task panicked, signal handler failed).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Which positional source sequence a cursor indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Table,
    Image,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Table => f.write_str("table"),
            Resource::Image => f.write_str("image"),
        }
    }
}

/// All errors that fail a single job.
///
/// Every variant is caught at the job boundary in
/// [`crate::pipeline::worker`]; none of them propagate out of the worker
/// loop. `StructuralMismatch` and `ParagraphOutOfRange` form the
/// structural-mismatch class: the source document's shape does not match
/// what a triggered rule assumes, so no partial output is ever persisted
/// for the job.
#[derive(Debug, Error)]
pub enum JobError {
    // ── Input-access errors ───────────────────────────────────────────────
    /// Source document was not found at the given path.
    #[error("source document not found: '{path}'")]
    SourceNotFound { path: PathBuf },

    /// Source document exists but could not be read.
    #[error("failed to read source document '{path}': {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source document was read but does not parse as a raw document.
    #[error("source document '{path}' is malformed: {detail}")]
    MalformedSource { path: PathBuf, detail: String },

    // ── Structural-mismatch errors ────────────────────────────────────────
    /// A rule consumed a table/image cursor beyond the available count.
    #[error("structural mismatch: {resource} index {wanted} consumed but source has {available}")]
    StructuralMismatch {
        resource: Resource,
        wanted: usize,
        available: usize,
    },

    /// A rule assumed a paragraph at a position past the flat sequence end.
    #[error("structural mismatch: '{context}' expects paragraph {index} but source has {available}")]
    ParagraphOutOfRange {
        context: &'static str,
        index: usize,
        available: usize,
    },

    /// A rule's heading trigger fired but its anchor paragraph is absent
    /// from the flat paragraph sequence.
    #[error("structural mismatch: anchor paragraph '{marker}' not found")]
    MissingAnchor { marker: String },

    /// A named front-matter field was not where the template assumes it.
    #[error("front-matter field '{field}' missing: {detail}")]
    FrontMatter { field: &'static str, detail: String },

    // ── Formatting/rendering errors ───────────────────────────────────────
    /// An extracted image could not be decoded or flattened.
    #[error("image '{path}' could not be processed: {detail}")]
    ImageProcessing { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output document.
    #[error("failed to write output '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Job working-folder I/O failed.
    #[error("working folder I/O at '{path}': {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl JobError {
    /// True when the source's shape contradicted a triggered rule's
    /// assumptions (as opposed to input-access or output I/O failures).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            JobError::StructuralMismatch { .. }
                | JobError::ParagraphOutOfRange { .. }
                | JobError::MissingAnchor { .. }
                | JobError::FrontMatter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_mismatch_display() {
        let e = JobError::StructuralMismatch {
            resource: Resource::Table,
            wanted: 7,
            available: 5,
        };
        let msg = e.to_string();
        assert!(msg.contains("table index 7"), "got: {msg}");
        assert!(msg.contains("has 5"), "got: {msg}");
    }

    #[test]
    fn structural_classification() {
        assert!(JobError::MissingAnchor {
            marker: "AC-Netz".into()
        }
        .is_structural());
        assert!(!JobError::SourceNotFound {
            path: PathBuf::from("x.json")
        }
        .is_structural());
    }

    #[test]
    fn resource_display() {
        assert_eq!(Resource::Table.to_string(), "table");
        assert_eq!(Resource::Image.to_string(), "image");
    }
}

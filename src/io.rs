//! Collaborator interfaces and their JSON/filesystem default
//! implementations.
//!
//! The pipeline never touches document formats directly; it talks to
//! three trait objects configured on [`crate::config::PipelineConfig`]:
//! a reader that opens a source file into a [`RawDocument`], a writer
//! that persists an [`OutputDocument`], and an image extractor that
//! resolves a job's figure sequence. The defaults read and write JSON
//! and scan the job's `images/` directory; deployments with a real
//! document backend swap in their own implementations.

use crate::error::JobError;
use crate::images;
use crate::model::RawDocument;
use crate::output::OutputDocument;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

// ── Traits ───────────────────────────────────────────────────────────────

/// Opens one source document.
pub trait SourceReader: Send + Sync {
    /// Must report a distinguishable [`JobError::SourceNotFound`] when the
    /// path is absent.
    fn open(&self, path: &Path) -> Result<RawDocument, JobError>;
}

/// Persists one output document.
pub trait DocumentWriter: Send + Sync {
    fn write(&self, doc: &OutputDocument, path: &Path) -> Result<(), JobError>;

    /// File extension of the persisted format, without the dot.
    fn extension(&self) -> &'static str {
        "json"
    }
}

/// Produces a job's ordered figure sequence.
pub trait ImageExtractor: Send + Sync {
    /// Paths must come back in render order, already de-duplicated, and
    /// free of transparency.
    fn extract(&self, source: &Path, work_dir: &Path) -> Result<Vec<PathBuf>, JobError>;

    /// Number of figures [`extract`](Self::extract) would produce.
    /// Implementations that can count without normalising should override
    /// this so read-only callers leave the working folder untouched.
    fn count(&self, source: &Path, work_dir: &Path) -> Result<usize, JobError> {
        Ok(self.extract(source, work_dir)?.len())
    }
}

// ── Default implementations ──────────────────────────────────────────────

/// Reads a [`RawDocument`] serialized as JSON.
#[derive(Debug, Default)]
pub struct JsonReader;

impl SourceReader for JsonReader {
    fn open(&self, path: &Path) -> Result<RawDocument, JobError> {
        if !path.exists() {
            return Err(JobError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path).map_err(|source| JobError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| JobError::MalformedSource {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

/// Writes the output document as pretty-printed JSON, atomically.
#[derive(Debug, Default)]
pub struct JsonWriter;

impl DocumentWriter for JsonWriter {
    /// Writes to a temp file in the target directory, then renames into
    /// place, so a crashed job never leaves a partial output file.
    fn write(&self, doc: &OutputDocument, path: &Path) -> Result<(), JobError> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp =
            tempfile::NamedTempFile::new_in(parent).map_err(|source| JobError::OutputWrite {
                path: path.to_path_buf(),
                source,
            })?;
        let json = serde_json::to_vec_pretty(doc).map_err(|e| {
            JobError::Internal(format!("output serialisation failed: {e}"))
        })?;
        tmp.write_all(&json).map_err(|source| JobError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tmp.persist(path).map_err(|e| JobError::OutputWrite {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        debug!(path = %path.display(), "output document persisted");
        Ok(())
    }
}

/// Scans the job's `images/` directory for figures numbered from a fixed
/// offset, flattening transparent rasters as it goes.
#[derive(Debug)]
pub struct DirImageExtractor {
    /// Number of the first figure file the renderer writes.
    pub first_number: usize,
}

impl Default for DirImageExtractor {
    fn default() -> Self {
        DirImageExtractor { first_number: 1 }
    }
}

impl ImageExtractor for DirImageExtractor {
    /// Collects `{work_dir}/images/{n}.{ext}` for n = first_number, …
    /// until the first gap. A missing `images/` directory yields an empty
    /// sequence, not an error; absence is only a problem once a rule
    /// tries to consume a figure.
    fn extract(&self, _source: &Path, work_dir: &Path) -> Result<Vec<PathBuf>, JobError> {
        let dir = work_dir.join("images");
        let mut found = Vec::new();
        if !dir.is_dir() {
            return Ok(found);
        }
        let mut n = self.first_number;
        while let Some(path) = images::find_numbered(&dir, n) {
            found.push(images::composite_to_jpeg(&path)?);
            n += 1;
        }
        debug!(count = found.len(), dir = %dir.display(), "figures collected");
        Ok(found)
    }

    /// Counts the numbered candidates only; nothing is decoded or
    /// flattened.
    fn count(&self, _source: &Path, work_dir: &Path) -> Result<usize, JobError> {
        let dir = work_dir.join("images");
        let mut n = self.first_number;
        while images::find_numbered(&dir, n).is_some() {
            n += 1;
        }
        Ok(n - self.first_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawParagraph;
    use image::RgbImage;

    #[test]
    fn json_reader_distinguishes_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonReader.open(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, JobError::SourceNotFound { .. }), "got: {err}");
    }

    #[test]
    fn json_reader_reports_malformed_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let err = JsonReader.open(&path).unwrap_err();
        assert!(matches!(err, JobError::MalformedSource { .. }), "got: {err}");
    }

    #[test]
    fn json_round_trip_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let raw = RawDocument {
            paragraphs: vec![RawParagraph::heading(2, "PV-Anlage")],
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_vec(&raw).unwrap()).unwrap();
        let read = JsonReader.open(&path).unwrap();
        assert_eq!(read.paragraphs[0].text, "PV-Anlage");
        assert_eq!(read.paragraphs[0].style, "Heading 2");
    }

    #[test]
    fn extractor_collects_until_first_gap() {
        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        std::fs::create_dir(&images_dir).unwrap();
        for n in [1usize, 2, 4] {
            RgbImage::new(2, 2)
                .save(images_dir.join(format!("{n}.png")))
                .unwrap();
        }
        let found = DirImageExtractor::default()
            .extract(Path::new("ignored"), dir.path())
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("images/1.png"));
    }

    #[test]
    fn counting_figures_leaves_the_working_folder_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        std::fs::create_dir(&images_dir).unwrap();
        image::RgbaImage::new(2, 2)
            .save(images_dir.join("1.png"))
            .unwrap();

        let count = DirImageExtractor::default()
            .count(Path::new("ignored"), dir.path())
            .unwrap();
        assert_eq!(count, 1);
        // Unlike extract, no flattened sibling was written.
        assert!(!images_dir.join("1.jpg").exists());
    }

    #[test]
    fn extractor_tolerates_missing_images_dir() {
        let dir = tempfile::tempdir().unwrap();
        let found = DirImageExtractor::default()
            .extract(Path::new("ignored"), dir.path())
            .unwrap();
        assert!(found.is_empty());
    }
}

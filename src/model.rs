//! Document model: raw collaborator data and the extracted source model.
//!
//! ## Two representations
//!
//! [`RawDocument`] is the shape the document-source reader collaborator
//! hands us: ordered paragraphs with style names and runs, ordered tables,
//! text boxes, header/footer paragraphs. It stays around for the whole job
//! because the output builder copies tables out of it by value and the
//! front-matter extractor reads fixed cells from it.
//!
//! [`SourceDocument`] is the queryable model the section rule engine works
//! on: heading lists per level, the flat non-empty paragraph sequence, the
//! table count, and the externally extracted image sequence. It is built
//! once per job, read-only thereafter, and discarded at job end.

use crate::error::JobError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix stripped from the source title before extraction.
pub const TITLE_PREFIX: &str = "Projektbericht - ";

// ── Raw collaborator shapes ──────────────────────────────────────────────

/// One formatted run inside a paragraph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    /// Hex colour like "FAA820", if the run carries one.
    #[serde(default)]
    pub color: Option<String>,
    /// Font size in half-points, if the run carries one.
    #[serde(default)]
    pub size: Option<u32>,
}

/// One paragraph with its style name and runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawParagraph {
    /// Paragraph style name, e.g. "Heading 2" or "Normal".
    #[serde(default)]
    pub style: String,
    pub text: String,
    #[serde(default)]
    pub runs: Vec<RawRun>,
}

impl RawParagraph {
    /// Plain paragraph with no style or runs (test/fixture convenience).
    pub fn plain(text: impl Into<String>) -> Self {
        RawParagraph {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Heading paragraph at the given level.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        RawParagraph {
            style: format!("Heading {level}"),
            text: text.into(),
            ..Default::default()
        }
    }
}

/// One table cell: a list of paragraph texts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCell {
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

impl RawCell {
    pub fn new(text: impl Into<String>) -> Self {
        RawCell {
            paragraphs: vec![text.into()],
        }
    }

    /// First paragraph of the cell, if any.
    pub fn first_paragraph(&self) -> Option<&str> {
        self.paragraphs.first().map(String::as_str)
    }
}

/// One table: rows of cells, copied into the output by value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    /// Cell at (row, col), if present.
    pub fn cell(&self, row: usize, col: usize) -> Option<&RawCell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// The raw source document as exposed by the reader collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    pub paragraphs: Vec<RawParagraph>,
    #[serde(default)]
    pub tables: Vec<RawTable>,
    /// Floating text-box contents (address block, offer number).
    #[serde(default)]
    pub text_boxes: Vec<String>,
    #[serde(default)]
    pub header_paragraphs: Vec<String>,
    #[serde(default)]
    pub footer_paragraphs: Vec<String>,
}

impl RawDocument {
    /// Remove the generator's report prefix from the first paragraph that
    /// carries it. The upstream tool titles every document
    /// "Projektbericht - {name}"; the output template wants only the name.
    pub fn strip_title_prefix(&mut self) {
        for para in &mut self.paragraphs {
            if let Some(rest) = para.text.strip_prefix(TITLE_PREFIX) {
                para.text = rest.to_string();
                break;
            }
        }
    }
}

// ── Heading index ────────────────────────────────────────────────────────

/// Ordered heading texts per level, extracted once per job.
///
/// Rules test membership against these lists (exact or substring) and look
/// up level-1 chapter headings by running ordinal.
#[derive(Debug, Clone, Default)]
pub struct HeadingIndex {
    level1: Vec<String>,
    level2: Vec<String>,
    level3: Vec<String>,
}

impl HeadingIndex {
    /// Classify headings by paragraph style-name prefix.
    pub fn from_paragraphs(paragraphs: &[RawParagraph]) -> Self {
        let pick = |prefix: &str| -> Vec<String> {
            paragraphs
                .iter()
                .filter(|p| p.style.starts_with(prefix))
                .map(|p| p.text.clone())
                .collect()
        };
        HeadingIndex {
            level1: pick("Heading 1"),
            level2: pick("Heading 2"),
            level3: pick("Heading 3"),
        }
    }

    pub fn level1(&self) -> &[String] {
        &self.level1
    }

    pub fn level2(&self) -> &[String] {
        &self.level2
    }

    pub fn level3(&self) -> &[String] {
        &self.level3
    }

    /// Level-1 heading at the given running ordinal, if the document has
    /// that many chapters.
    pub fn level1_at(&self, ordinal: usize) -> Option<&str> {
        self.level1.get(ordinal).map(String::as_str)
    }

    /// Exact membership in the level-1 list.
    pub fn has_level1(&self, marker: &str) -> bool {
        self.level1.iter().any(|h| h == marker)
    }

    /// Exact membership in the level-2 list.
    pub fn has_level2(&self, marker: &str) -> bool {
        self.level2.iter().any(|h| h == marker)
    }

    /// Substring membership in the level-2 list.
    pub fn level2_contains(&self, marker: &str) -> bool {
        self.level2.iter().any(|h| h.contains(marker))
    }

    /// Is this paragraph text one of the level-1 chapter headings?
    /// Used as the stop condition for scan loops that run "until the next
    /// chapter".
    pub fn is_level1(&self, text: &str) -> bool {
        self.has_level1(text)
    }
}

// ── Extracted source model ───────────────────────────────────────────────

/// The queryable, read-only model one job's rules traverse.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub headings: HeadingIndex,
    /// Flat sequence of trimmed, non-empty paragraph texts in document
    /// order (headings included, matching how the source numbers them).
    pub paragraphs: Vec<String>,
    /// Number of table elements in document order.
    pub table_count: usize,
    /// Ordered image paths produced by the image-extractor collaborator.
    pub images: Vec<PathBuf>,
}

impl SourceDocument {
    /// Build the model deterministically from document order.
    ///
    /// A paragraph enters the flat sequence only when its trimmed text is
    /// non-empty. Tables are counted, never reordered; rules reference
    /// them purely by positional index.
    pub fn extract(raw: &RawDocument, images: Vec<PathBuf>) -> Self {
        let paragraphs = raw
            .paragraphs
            .iter()
            .filter(|p| !p.text.trim().is_empty())
            .map(|p| p.text.trim().to_string())
            .collect();

        SourceDocument {
            headings: HeadingIndex::from_paragraphs(&raw.paragraphs),
            paragraphs,
            table_count: raw.tables.len(),
            images,
        }
    }

    pub fn paragraph(&self, index: usize) -> Option<&str> {
        self.paragraphs.get(index).map(String::as_str)
    }

    /// Paragraph at `index`, or a structural-mismatch error naming the
    /// rule that assumed its presence.
    pub fn require_paragraph(&self, index: usize, context: &'static str) -> Result<&str, JobError> {
        self.paragraph(index)
            .ok_or_else(|| JobError::ParagraphOutOfRange {
                context,
                index,
                available: self.paragraphs.len(),
            })
    }

    /// Index of the first paragraph exactly equal to `marker`.
    pub fn find_paragraph(&self, marker: &str) -> Option<usize> {
        self.paragraphs.iter().position(|p| p == marker)
    }

    /// Index of the first paragraph containing `marker` as a substring.
    pub fn find_paragraph_containing(&self, marker: &str) -> Option<usize> {
        self.paragraphs.iter().position(|p| p.contains(marker))
    }

    /// Exact membership in the flat paragraph sequence.
    pub fn contains_paragraph(&self, text: &str) -> bool {
        self.paragraphs.iter().any(|p| p == text)
    }
}

/// Cheap per-document summary for the `inspect` surface (no rule engine).
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub level1_headings: usize,
    pub level2_headings: usize,
    pub level3_headings: usize,
    pub paragraphs: usize,
    pub tables: usize,
    pub images: usize,
}

impl DocumentSummary {
    pub fn of(doc: &SourceDocument) -> Self {
        DocumentSummary {
            level1_headings: doc.headings.level1().len(),
            level2_headings: doc.headings.level2().len(),
            level3_headings: doc.headings.level3().len(),
            paragraphs: doc.paragraphs.len(),
            tables: doc.table_count,
            images: doc.images.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw() -> RawDocument {
        RawDocument {
            paragraphs: vec![
                RawParagraph::plain("12.03.2025"),
                RawParagraph::heading(1, "Projektbericht - Anlage Musterstrasse"),
                RawParagraph::plain("   "),
                RawParagraph::heading(2, "PV-Anlage"),
                RawParagraph::plain("Dachanlage Süd"),
                RawParagraph::heading(2, "Ertragsprognose"),
                RawParagraph::heading(3, "Details"),
            ],
            tables: vec![RawTable::default(), RawTable::default()],
            ..Default::default()
        }
    }

    #[test]
    fn heading_index_classifies_by_style_prefix() {
        let raw = sample_raw();
        let idx = HeadingIndex::from_paragraphs(&raw.paragraphs);
        assert_eq!(idx.level1().len(), 1);
        assert_eq!(idx.level2(), &["PV-Anlage", "Ertragsprognose"]);
        assert_eq!(idx.level3(), &["Details"]);
    }

    #[test]
    fn flat_sequence_skips_blank_paragraphs() {
        let doc = SourceDocument::extract(&sample_raw(), vec![]);
        assert_eq!(doc.paragraphs.len(), 6);
        assert!(!doc.paragraphs.iter().any(|p| p.trim().is_empty()));
    }

    #[test]
    fn table_count_matches_document_order() {
        let doc = SourceDocument::extract(&sample_raw(), vec![]);
        assert_eq!(doc.table_count, 2);
    }

    #[test]
    fn strip_title_prefix_removes_only_first_match() {
        let mut raw = sample_raw();
        raw.strip_title_prefix();
        assert_eq!(raw.paragraphs[1].text, "Anlage Musterstrasse");
    }

    #[test]
    fn membership_tests() {
        let doc = SourceDocument::extract(&sample_raw(), vec![]);
        assert!(doc.headings.has_level2("PV-Anlage"));
        assert!(!doc.headings.has_level2("Datenblatt Batterie"));
        assert!(doc.headings.level2_contains("Ertrag"));
        assert_eq!(doc.find_paragraph("PV-Anlage"), Some(2));
        assert_eq!(doc.find_paragraph_containing("Dachanlage"), Some(3));
    }

    #[test]
    fn require_paragraph_fails_loudly_past_end() {
        let doc = SourceDocument::extract(&sample_raw(), vec![]);
        let err = doc.require_paragraph(99, "PV-Anlage").unwrap_err();
        assert!(err.is_structural(), "got: {err}");
    }

    #[test]
    fn ordinal_lookup_degrades_to_none() {
        let doc = SourceDocument::extract(&sample_raw(), vec![]);
        assert!(doc.headings.level1_at(0).is_some());
        assert!(doc.headings.level1_at(1).is_none());
    }
}

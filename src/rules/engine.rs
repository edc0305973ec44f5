//! Catalog traversal: turns one source document into the ordered emit-op
//! sequence of the output body.
//!
//! The engine walks [`CATALOG`] once, start to finish, with no rule
//! re-entry. Cursor state lives in a job-scoped [`Cursors`] value created
//! here; any consumption past the source's table or image count aborts
//! the whole transformation (partial documents are not acceptable
//! output). Paragraph-scan loops, by contrast, stop gracefully when the
//! flat sequence runs out — a short document ends sections early, it does
//! not fail them.

use crate::cursor::Cursors;
use crate::error::JobError;
use crate::model::SourceDocument;
use crate::output::ImageSize;
use crate::rules::{
    CatalogEntry, EmitOp, EmitPlan, H3Source, ResultFigure, ResultSub, SectionRule, TriggerMode,
    CATALOG, FIGURE_SIZE,
};
use std::path::PathBuf;
use tracing::{debug, trace};

/// Caption token that marks trailing-figure paragraphs.
const CAPTION_MARKER: &str = "Abbildung";

/// Job-scoped knobs for one transformation.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// First usable index into the source's table sequence.
    pub first_table_index: usize,
    /// First usable index into the extracted image sequence.
    pub first_image_index: usize,
    /// Suppress the consumer-results figure (derived from the job's file
    /// name, passed explicitly so jobs stay independent).
    pub skip_consumer_figure: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            first_table_index: 0,
            first_image_index: 0,
            skip_consumer_figure: false,
        }
    }
}

/// The emit-op sequence plus final cursor positions (exposed for tests
/// and logging).
#[derive(Debug)]
pub struct TransformOutcome {
    pub ops: Vec<EmitOp>,
    pub table_cursor: usize,
    pub image_cursor: usize,
}

/// Run the full catalog against one source document.
pub fn transform(
    doc: &SourceDocument,
    opts: &EngineOptions,
) -> Result<TransformOutcome, JobError> {
    let mut t = Traversal {
        doc,
        opts,
        cursors: Cursors::new(
            opts.first_table_index,
            opts.first_image_index,
            doc.table_count,
            doc.images.len(),
        ),
        ops: Vec::new(),
        chapter_ordinal: 0,
    };

    for entry in CATALOG.iter() {
        match entry {
            CatalogEntry::Chapter { number } => t.chapter(*number),
            CatalogEntry::PageBreak => t.ops.push(EmitOp::PageBreak),
            CatalogEntry::Rule(rule) => t.apply(rule)?,
            CatalogEntry::StaticChapter { title, asset, size } => {
                t.ops.push(EmitOp::Heading {
                    level: 1,
                    text: (*title).into(),
                });
                t.ops.push(EmitOp::TemplateImage {
                    asset: (*asset).into(),
                    size: *size,
                });
            }
        }
    }

    Ok(TransformOutcome {
        table_cursor: t.cursors.table_position(),
        image_cursor: t.cursors.image_position(),
        ops: t.ops,
    })
}

struct Traversal<'a> {
    doc: &'a SourceDocument,
    opts: &'a EngineOptions,
    cursors: Cursors,
    ops: Vec<EmitOp>,
    chapter_ordinal: usize,
}

impl Traversal<'_> {
    /// Numbered chapter heading, looked up by running ordinal into the
    /// level-1 list. Short documents omit the heading rather than fail.
    fn chapter(&mut self, number: usize) {
        match self.doc.headings.level1_at(self.chapter_ordinal) {
            Some(title) => {
                self.ops.push(EmitOp::Heading {
                    level: 1,
                    text: format!("{number}. {title}"),
                });
                self.chapter_ordinal += 1;
            }
            None => debug!(number, "chapter heading omitted, source has no more level-1 headings"),
        }
    }

    fn apply(&mut self, rule: &SectionRule) -> Result<(), JobError> {
        let marker = rule.kind.marker();
        let triggered = match rule.trigger {
            TriggerMode::ExactLevel2 => self.doc.headings.has_level2(marker),
            TriggerMode::SubstringLevel2 => self.doc.headings.level2_contains(marker),
            TriggerMode::ExactLevel1 => self.doc.headings.has_level1(marker),
        };
        if !triggered {
            trace!(section = ?rule.kind, marker, "marker absent, section skipped");
            return Ok(());
        }
        if rule.page_break_before {
            self.ops.push(EmitOp::PageBreak);
        }
        debug!(section = ?rule.kind, "section triggered");

        match rule.plan {
            EmitPlan::TableSection { h3, figure } => {
                let anchor = self.anchor(marker, rule.trigger)?;
                self.table_section(marker, anchor, h3, figure)
            }
            EmitPlan::FixedSubsections {
                subs,
                trailing_figure,
            } => self.fixed_subsections(marker, subs, trailing_figure),
            EmitPlan::RepeatByPrefix {
                marker: sub_marker,
                starts_with,
                stride,
                area_heading,
                figure,
            } => self.repeat_by_prefix(marker, sub_marker, starts_with, stride, area_heading, figure),
            EmitPlan::RepeatUntilStop { stops } => self.repeat_until_stop(marker, stops),
            EmitPlan::RepeatUntilNextChapter => self.repeat_until_next_chapter(marker),
            EmitPlan::WiringScan => self.wiring_scan(marker),
            EmitPlan::ResultsOverview { subs } => self.results_overview(marker, subs),
            EmitPlan::FigureOnly { size } => {
                self.heading(2, marker);
                self.figure(size)
            }
            EmitPlan::FigureScan { size } => self.figure_scan(marker, size),
            EmitPlan::HeadingOnly { h3 } => {
                self.heading(2, marker);
                let anchor = self.anchor(marker, rule.trigger)?;
                let text = self.h3_text(h3, anchor, marker)?;
                self.heading(3, &text);
                Ok(())
            }
        }
    }

    // ── Emit plans ────────────────────────────────────────────────────────

    fn table_section(
        &mut self,
        marker: &'static str,
        anchor: usize,
        h3: H3Source,
        figure: bool,
    ) -> Result<(), JobError> {
        self.heading(2, marker);
        let text = self.h3_text(h3, anchor, marker)?;
        self.heading(3, &text);
        self.table_copy(None)?;
        if figure {
            self.figure(FIGURE_SIZE)?;
        }
        Ok(())
    }

    fn fixed_subsections(
        &mut self,
        marker: &str,
        subs: &[&str],
        trailing_figure: bool,
    ) -> Result<(), JobError> {
        self.heading(2, marker);
        for sub in subs {
            self.heading(3, sub);
            self.table_copy(None)?;
        }
        if trailing_figure {
            self.ops.push(EmitOp::Spacer);
            self.figure(FIGURE_SIZE)?;
        }
        Ok(())
    }

    fn repeat_by_prefix(
        &mut self,
        marker: &str,
        sub_marker: &str,
        starts_with: bool,
        stride: usize,
        area_heading: bool,
        figure: bool,
    ) -> Result<(), JobError> {
        self.heading(2, marker);
        let anchor = self.anchor_exact(marker)?;
        let mut i = anchor + 1;
        let mut matched = 0usize;
        while let Some(p) = self.doc.paragraph(i) {
            let hit = if starts_with {
                p.starts_with(sub_marker)
            } else {
                p.contains(sub_marker)
            };
            if !hit {
                break;
            }
            let p = p.to_string();
            if area_heading {
                self.heading(2, &p);
                let sub = self.doc.require_paragraph(i + 1, "module area")?.to_string();
                self.heading(3, &sub);
            } else {
                self.heading(3, &p);
            }
            self.table_copy(None)?;
            if figure {
                self.ops.push(EmitOp::Spacer);
                self.figure(FIGURE_SIZE)?;
            }
            matched += 1;
            i += stride;
        }
        if matched == 0 {
            debug!(section = marker, "repeat scan matched no subsections");
        }
        Ok(())
    }

    fn repeat_until_stop(&mut self, marker: &str, stops: &[&str]) -> Result<(), JobError> {
        self.heading(2, marker);
        let anchor = self.anchor_exact(marker)?;
        let mut i = anchor;
        while let Some(next) = self.doc.paragraph(i + 1) {
            if stops.iter().any(|s| next.starts_with(s)) {
                break;
            }
            let next = next.to_string();
            self.heading(3, &next);
            self.table_copy(None)?;
            i += 1;
        }
        Ok(())
    }

    fn repeat_until_next_chapter(&mut self, marker: &str) -> Result<(), JobError> {
        self.heading(2, marker);
        let anchor = self.anchor_exact(marker)?;
        let mut i = anchor;
        while let Some(next) = self.doc.paragraph(i + 1) {
            if self.doc.headings.is_level1(next) {
                break;
            }
            let next = next.to_string();
            self.heading(3, &next);
            self.table_copy(None)?;
            i += 1;
        }
        Ok(())
    }

    /// Inverter wiring: each "Verschaltung…" paragraph opens a subheading
    /// with one table; further "Wechselrichter…" paragraphs under the
    /// same subheading attach extra tables. The scan ends at the next
    /// chapter heading.
    fn wiring_scan(&mut self, marker: &str) -> Result<(), JobError> {
        self.heading(2, marker);
        let anchor = self.anchor_exact(marker)?;
        let mut i = anchor + 1;
        while let Some(p) = self.doc.paragraph(i) {
            if p.starts_with("Verschaltung") {
                let p = p.to_string();
                self.heading(3, &p);
                self.table_copy(None)?;
                while let Some(next) = self.doc.paragraph(i + 1) {
                    if next.starts_with("Verschaltung") || self.doc.headings.is_level1(next) {
                        break;
                    }
                    i += 1;
                    if self
                        .doc
                        .paragraph(i)
                        .is_some_and(|q| q.starts_with("Wechselrichter"))
                    {
                        self.table_copy(None)?;
                    }
                }
            }
            if self
                .doc
                .paragraph(i + 1)
                .is_some_and(|next| self.doc.headings.is_level1(next))
            {
                break;
            }
            i += 1;
        }
        Ok(())
    }

    fn results_overview(&mut self, marker: &str, subs: &[ResultSub]) -> Result<(), JobError> {
        self.heading(2, marker);
        let anchor = self.anchor_exact(marker)?;
        let mut pos = anchor + 1;
        for sub in subs {
            if !self.doc.contains_paragraph(sub.marker) {
                continue;
            }
            self.heading(3, sub.marker);
            let picture = match sub.figure {
                ResultFigure::InTable => Some(self.take_image_path()?),
                ResultFigure::InTableUnlessSuppressed => {
                    if self.opts.skip_consumer_figure {
                        None
                    } else {
                        Some(self.take_image_path()?)
                    }
                }
                ResultFigure::None => None,
            };
            self.table_copy(picture)?;
            pos += 1;
        }
        self.ops.push(EmitOp::Spacer);
        while let Some(p) = self.doc.paragraph(pos) {
            if !p.contains(CAPTION_MARKER) {
                break;
            }
            self.figure(FIGURE_SIZE)?;
            pos += 1;
        }
        Ok(())
    }

    fn figure_scan(&mut self, marker: &str, size: ImageSize) -> Result<(), JobError> {
        self.heading(2, marker);
        let anchor = self.anchor_exact(marker)?;
        let mut i = anchor;
        let mut matched = 0usize;
        while let Some(next) = self.doc.paragraph(i + 1) {
            if !next.contains(CAPTION_MARKER) {
                break;
            }
            self.figure(size)?;
            matched += 1;
            i += 1;
        }
        if matched == 0 {
            debug!(section = marker, "no caption paragraphs followed the heading");
        }
        Ok(())
    }

    // ── Primitive emissions ───────────────────────────────────────────────

    fn heading(&mut self, level: u8, text: &str) {
        self.ops.push(EmitOp::Heading {
            level,
            text: text.to_string(),
        });
    }

    fn table_copy(&mut self, picture: Option<PathBuf>) -> Result<(), JobError> {
        let source_index = self.cursors.take_table()?;
        trace!(source_index, "table consumed");
        self.ops.push(EmitOp::TableCopy {
            source_index,
            picture,
        });
        Ok(())
    }

    fn figure(&mut self, size: ImageSize) -> Result<(), JobError> {
        let path = self.take_image_path()?;
        self.ops.push(EmitOp::Image { path, size });
        Ok(())
    }

    fn take_image_path(&mut self) -> Result<PathBuf, JobError> {
        let index = self.cursors.take_image()?;
        trace!(index, "image consumed");
        Ok(self.doc.images[index].clone())
    }

    // ── Anchors ───────────────────────────────────────────────────────────

    fn anchor(&self, marker: &str, trigger: TriggerMode) -> Result<usize, JobError> {
        match trigger {
            TriggerMode::SubstringLevel2 => self.anchor_containing(marker),
            _ => self.anchor_exact(marker),
        }
    }

    fn anchor_exact(&self, marker: &str) -> Result<usize, JobError> {
        self.doc
            .find_paragraph(marker)
            .ok_or_else(|| JobError::MissingAnchor {
                marker: marker.to_string(),
            })
    }

    fn anchor_containing(&self, marker: &str) -> Result<usize, JobError> {
        self.doc
            .find_paragraph_containing(marker)
            .ok_or_else(|| JobError::MissingAnchor {
                marker: marker.to_string(),
            })
    }

    fn h3_text(
        &self,
        source: H3Source,
        anchor: usize,
        context: &'static str,
    ) -> Result<String, JobError> {
        match source {
            H3Source::Literal(s) => Ok(s.to_string()),
            H3Source::AfterAnchor(n) => Ok(self
                .doc
                .require_paragraph(anchor + n, context)?
                .to_string()),
        }
    }
}

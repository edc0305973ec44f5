//! Output document assembly.
//!
//! The rule engine emits a flat op sequence that references tables by
//! source index; this module resolves those references into embedded
//! table copies, prepends the template's fixed front-matter (cover
//! figure, title lines with marker substitution, table-of-contents
//! field), and attaches the header/footer and styling directives the
//! writer materialises. Assembly is a pure function of its inputs — the
//! source document is never mutated.

use crate::config::TemplateConfig;
use crate::error::{JobError, Resource};
use crate::frontmatter::FrontMatter;
use crate::model::{RawDocument, RawTable};
use crate::rules::EmitOp;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Physical figure size in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width_in: f32,
    pub height_in: f32,
}

impl ImageSize {
    pub const fn new(width_in: f32, height_in: f32) -> Self {
        ImageSize {
            width_in,
            height_in,
        }
    }
}

/// One materialised block of the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutBlock {
    Heading { level: u8, text: String },
    /// Large accent-coloured cover line.
    TitleLine { text: String },
    /// Empty spacing paragraph.
    Spacer,
    PageBreak,
    /// Table-of-contents field, updated on open.
    TocField,
    /// A source table embedded by value, optionally with a small figure
    /// placed in its first row.
    TableCopy {
        table: RawTable,
        picture: Option<PathBuf>,
    },
    /// A job-extracted figure at a physical size.
    Image { path: PathBuf, size: ImageSize },
    /// A fixed template asset (cover, company pages).
    TemplateImage { asset: String, size: ImageSize },
}

/// Global styling directives, applied by the writer as a final pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSheet {
    pub font_family: String,
    pub accent_color: [u8; 3],
    /// Hex border colour for the uniform table grid.
    pub table_border_color: String,
    /// Darken each table's first-row bottom border.
    pub darken_header_rule: bool,
    /// Strip vertical borders from copied tables.
    pub remove_vertical_borders: bool,
}

/// First-page header content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub address_lines: Vec<String>,
    pub date: String,
    pub offer_id: Option<String>,
    pub company_name: String,
    pub tagline: String,
    /// Template asset the writer places in the header's logo cell.
    pub logo_asset: String,
}

/// The complete in-memory output representation handed to the writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDocument {
    pub front_matter: Vec<OutBlock>,
    pub body: Vec<OutBlock>,
    pub header: HeaderBlock,
    pub footer_lines: Vec<String>,
    pub styles: StyleSheet,
    pub with_toc: bool,
    pub with_page_numbers: bool,
}

/// Resolve the engine's op sequence against the raw document and wrap it
/// in the template's fixed front and back matter.
pub fn assemble(
    fm: &FrontMatter,
    ops: &[EmitOp],
    raw: &RawDocument,
    tpl: &TemplateConfig,
) -> Result<OutputDocument, JobError> {
    let mut front_matter = vec![
        OutBlock::TemplateImage {
            asset: tpl.cover_asset.clone(),
            size: ImageSize::new(6.0, 4.0),
        },
        OutBlock::Spacer,
        OutBlock::TitleLine {
            text: tpl.title_line.replace("0.00", &fm.power_kw),
        },
        OutBlock::TitleLine {
            text: tpl.module_line.replace(
                '0',
                fm.module_display_name.as_deref().unwrap_or(&fm.module),
            ),
        },
    ];
    for slot in 0..3 {
        if let Some(line) = fm.address_slot(slot) {
            front_matter.push(OutBlock::TitleLine { text: line.into() });
        }
    }
    front_matter.push(OutBlock::TitleLine {
        text: fm.date.clone(),
    });
    front_matter.push(OutBlock::Spacer);
    front_matter.push(OutBlock::Heading {
        level: 1,
        text: "INHALTSVERZEICHNIS".into(),
    });
    front_matter.push(OutBlock::TocField);
    front_matter.push(OutBlock::PageBreak);

    let body = ops
        .iter()
        .map(|op| resolve(op, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OutputDocument {
        front_matter,
        body,
        header: HeaderBlock {
            address_lines: fm.address_lines.clone(),
            date: fm.date.clone(),
            offer_id: fm.offer_id.clone(),
            company_name: tpl.company_name.clone(),
            tagline: tpl.company_tagline.clone(),
            logo_asset: tpl.header_logo_asset.clone(),
        },
        footer_lines: tpl.footer_lines.clone(),
        styles: StyleSheet {
            font_family: tpl.font_family.clone(),
            accent_color: tpl.accent_color,
            table_border_color: tpl.table_border_color.clone(),
            darken_header_rule: true,
            remove_vertical_borders: true,
        },
        with_toc: true,
        with_page_numbers: true,
    })
}

fn resolve(op: &EmitOp, raw: &RawDocument) -> Result<OutBlock, JobError> {
    Ok(match op {
        EmitOp::Heading { level, text } => OutBlock::Heading {
            level: *level,
            text: text.clone(),
        },
        EmitOp::Spacer => OutBlock::Spacer,
        EmitOp::PageBreak => OutBlock::PageBreak,
        EmitOp::TableCopy {
            source_index,
            picture,
        } => {
            let table = raw.tables.get(*source_index).cloned().ok_or(
                JobError::StructuralMismatch {
                    resource: Resource::Table,
                    wanted: *source_index,
                    available: raw.tables.len(),
                },
            )?;
            OutBlock::TableCopy {
                table,
                picture: picture.clone(),
            }
        }
        EmitOp::Image { path, size } => OutBlock::Image {
            path: path.clone(),
            size: *size,
        },
        EmitOp::TemplateImage { asset, size } => OutBlock::TemplateImage {
            asset: asset.clone(),
            size: *size,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawCell, RawParagraph};

    fn fm() -> FrontMatter {
        FrontMatter {
            offer_id: Some("AN-2024-1411".into()),
            power_kw: "9.84 kWp".into(),
            module: "Vendor Module 400W".into(),
            module_display_name: None,
            date: "12.03.2025".into(),
            address_lines: vec![
                "Musterstrasse 1".into(),
                "4000 Basel".into(),
                "4000 Basel, Schweiz".into(),
            ],
        }
    }

    fn raw_with_tables(n: usize) -> RawDocument {
        RawDocument {
            paragraphs: vec![RawParagraph::plain("12.03.2025")],
            tables: (0..n)
                .map(|i| RawTable {
                    rows: vec![vec![RawCell::new(format!("t{i}"))]],
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn title_lines_substitute_power_and_module_markers() {
        let tpl = TemplateConfig::default();
        let doc = assemble(&fm(), &[], &raw_with_tables(0), &tpl).unwrap();
        let titles: Vec<&str> = doc
            .front_matter
            .iter()
            .filter_map(|b| match b {
                OutBlock::TitleLine { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(titles[0].contains("9.84 kWp"), "got: {titles:?}");
        assert!(titles[1].contains("Vendor Module 400W"), "got: {titles:?}");
        // Address slots come out first/third/second.
        assert_eq!(titles[2], "Musterstrasse 1");
        assert_eq!(titles[3], "4000 Basel, Schweiz");
        assert_eq!(titles[4], "4000 Basel");
        assert_eq!(titles[5], "12.03.2025");
    }

    #[test]
    fn table_copies_embed_by_value_in_op_order() {
        let ops = vec![
            EmitOp::TableCopy {
                source_index: 1,
                picture: None,
            },
            EmitOp::TableCopy {
                source_index: 0,
                picture: None,
            },
        ];
        let doc = assemble(&fm(), &ops, &raw_with_tables(2), &TemplateConfig::default()).unwrap();
        let texts: Vec<String> = doc
            .body
            .iter()
            .filter_map(|b| match b {
                OutBlock::TableCopy { table, .. } => {
                    table.cell(0, 0).and_then(|c| c.first_paragraph()).map(String::from)
                }
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["t1", "t0"]);
    }

    #[test]
    fn unresolvable_table_index_is_a_structural_mismatch() {
        let ops = vec![EmitOp::TableCopy {
            source_index: 5,
            picture: None,
        }];
        let err = assemble(&fm(), &ops, &raw_with_tables(2), &TemplateConfig::default())
            .unwrap_err();
        assert!(err.is_structural(), "got: {err}");
    }

    #[test]
    fn header_carries_the_template_logo_asset() {
        let doc = assemble(&fm(), &[], &raw_with_tables(0), &TemplateConfig::default()).unwrap();
        assert_eq!(doc.header.logo_asset, "template_images/header.png");
        assert_eq!(doc.header.company_name, "Solardach24 GmbH");
    }

    #[test]
    fn front_matter_ends_with_toc_and_page_break() {
        let doc = assemble(&fm(), &[], &raw_with_tables(0), &TemplateConfig::default()).unwrap();
        let n = doc.front_matter.len();
        assert!(matches!(doc.front_matter[n - 2], OutBlock::TocField));
        assert!(matches!(doc.front_matter[n - 1], OutBlock::PageBreak));
    }
}

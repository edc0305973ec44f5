//! Front-matter extraction: offer id, system power, module name, date,
//! and the customer address block.
//!
//! The source generator always puts these values in the same physical
//! places (a text box for the offer number, fixed table cells for power
//! and module, the first paragraph for the date). That positional coupling
//! is fragile, so it is confined to this module: [`FrontMatter::extract`]
//! names every field and fails loudly with a [`JobError::FrontMatter`]
//! when the assumed shape is absent, instead of silently misplacing
//! content further down the pipeline.

use crate::error::JobError;
use crate::model::RawDocument;

/// Text-box prefix that marks the offer number rather than an address.
const OFFER_PREFIX: &str = "Angebotsnr.";

/// Named front-matter fields for one job.
#[derive(Debug, Clone)]
pub struct FrontMatter {
    /// Offer number, e.g. "AN-2024-1411" (text after the marker prefix).
    pub offer_id: Option<String>,
    /// System power as printed in the source, e.g. "9.84 kWp".
    pub power_kw: String,
    /// Module name as printed in the source.
    pub module: String,
    /// Shortened module name for the cover line, when the datasheet table
    /// is present.
    pub module_display_name: Option<String>,
    /// Report date (the source's first paragraph).
    pub date: String,
    /// Deduplicated address lines in first-seen order, from all sources.
    pub address_lines: Vec<String>,
}

impl FrontMatter {
    /// Pull every named field out of its fixed position in the raw
    /// document.
    ///
    /// Address lines are gathered from every non-offer text box first,
    /// then from the address table cell (both its paragraphs when two are
    /// present), parsed per [`parse_address`] and deduplicated preserving
    /// first-seen order.
    pub fn extract(raw: &RawDocument) -> Result<Self, JobError> {
        let mut offer_id = None;
        let mut address_lines = Vec::new();

        for text in &raw.text_boxes {
            if let Some(rest) = text.strip_prefix(OFFER_PREFIX) {
                offer_id = Some(rest.trim().to_string());
            } else {
                address_lines.extend(parse_address(text));
            }
        }

        let date = raw
            .paragraphs
            .first()
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| JobError::FrontMatter {
                field: "date",
                detail: "source has no paragraphs".into(),
            })?;

        let power_kw = fixed_cell(raw, 1, 2, 1, "power")?;
        let module = fixed_cell(raw, 1, 4, 1, "module")?;

        // The address table is the first table; its cell (1, 0) carries
        // one or two address paragraphs.
        if let Some(cell) = raw.tables.first().and_then(|t| t.cell(1, 0)) {
            for para in cell.paragraphs.iter().take(2) {
                address_lines.extend(parse_address(para));
            }
        }

        let address_lines = dedup_preserving_order(address_lines);

        let module_display_name = raw
            .tables
            .get(5)
            .and_then(|t| t.cell(1, 1))
            .and_then(|c| c.first_paragraph())
            .and_then(derive_module_display_name);

        Ok(FrontMatter {
            offer_id,
            power_kw,
            module,
            module_display_name,
            date,
            address_lines,
        })
    }

    /// Address line assigned to the given cover slot, if present.
    ///
    /// The cover template shows the lines in the fixed order first, third,
    /// second (street, country line, city line).
    pub fn address_slot(&self, slot: usize) -> Option<&str> {
        const SLOT_ORDER: [usize; 3] = [0, 2, 1];
        SLOT_ORDER
            .get(slot)
            .and_then(|&i| self.address_lines.get(i))
            .map(String::as_str)
    }
}

fn fixed_cell(
    raw: &RawDocument,
    table: usize,
    row: usize,
    col: usize,
    field: &'static str,
) -> Result<String, JobError> {
    raw.tables
        .get(table)
        .and_then(|t| t.cell(row, col))
        .and_then(|c| c.first_paragraph())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| JobError::FrontMatter {
            field,
            detail: format!("table {table} cell ({row}, {col}) absent"),
        })
}

/// Split an address text into display lines.
///
/// Comma-delimited addresses keep the city and country together: with
/// more than two comma parts, the last two are combined into one
/// "city, country" line. Texts without commas are split on line breaks.
pub fn parse_address(text: &str) -> Vec<String> {
    if text.contains(',') {
        let parts: Vec<String> = text.split(',').map(|p| p.trim().to_string()).collect();
        if parts.len() > 2 {
            let mut lines = parts[..parts.len() - 2].to_vec();
            lines.push(parts[parts.len() - 2..].join(", "));
            lines
        } else {
            parts
        }
    } else {
        text.lines().map(|l| l.trim().to_string()).collect()
    }
}

/// Drop duplicate and empty lines, keeping the first occurrence of each.
pub fn dedup_preserving_order(lines: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    for line in lines {
        let line = line.trim().to_string();
        if !line.is_empty() && !seen.contains(&line) {
            seen.push(line);
        }
    }
    seen
}

/// Shorten a datasheet module name for the cover line. The cell reads
/// "21 x Vendor Module 400W …" with the quantity first, so the name is
/// everything after the first 'x', truncated to its first five
/// whitespace-separated components. Cells without the count separator
/// yield no display name.
fn derive_module_display_name(cell_text: &str) -> Option<String> {
    let (_, name) = cell_text.split_once('x')?;
    Some(
        name.split_whitespace()
            .take(5)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawCell, RawDocument, RawParagraph, RawTable};

    fn table_from(cells: &[(usize, usize, &str)], rows: usize, cols: usize) -> RawTable {
        let mut t = RawTable {
            rows: vec![vec![RawCell::default(); cols]; rows],
        };
        for &(r, c, text) in cells {
            t.rows[r][c] = RawCell::new(text);
        }
        t
    }

    fn sample_raw() -> RawDocument {
        RawDocument {
            paragraphs: vec![RawParagraph::plain("12.03.2025")],
            tables: vec![
                table_from(&[(1, 0, "Musterstrasse 1, 4000 Basel, Schweiz")], 2, 1),
                table_from(&[(2, 1, "9.84 kWp"), (4, 1, "Vendor Module 400W")], 5, 2),
            ],
            text_boxes: vec![
                "Angebotsnr. AN-2024-1411".into(),
                "Musterstrasse 1\n4000 Basel".into(),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn comma_address_combines_last_two_parts() {
        assert_eq!(
            parse_address("Musterstrasse 1, 4000 Basel, Schweiz"),
            vec!["Musterstrasse 1", "4000 Basel, Schweiz"]
        );
    }

    #[test]
    fn two_part_comma_address_stays_as_is() {
        assert_eq!(
            parse_address("Musterstrasse 1, 4000 Basel"),
            vec!["Musterstrasse 1", "4000 Basel"]
        );
    }

    #[test]
    fn plain_address_splits_on_line_breaks() {
        assert_eq!(
            parse_address("Musterstrasse 1\n4000 Basel"),
            vec!["Musterstrasse 1", "4000 Basel"]
        );
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        let lines = vec!["A".into(), "B".into(), "A".into(), "C".into()];
        assert_eq!(dedup_preserving_order(lines), vec!["A", "B", "C"]);
    }

    #[test]
    fn dedup_drops_empty_lines() {
        let lines = vec!["A".into(), "  ".into(), "B".into()];
        assert_eq!(dedup_preserving_order(lines), vec!["A", "B"]);
    }

    #[test]
    fn extract_pulls_every_named_field() {
        let fm = FrontMatter::extract(&sample_raw()).unwrap();
        assert_eq!(fm.offer_id.as_deref(), Some("AN-2024-1411"));
        assert_eq!(fm.power_kw, "9.84 kWp");
        assert_eq!(fm.module, "Vendor Module 400W");
        assert_eq!(fm.date, "12.03.2025");
        assert_eq!(
            fm.address_lines,
            vec!["Musterstrasse 1", "4000 Basel", "4000 Basel, Schweiz"]
        );
    }

    #[test]
    fn extract_fails_loudly_on_missing_power_cell() {
        let mut raw = sample_raw();
        raw.tables.truncate(1);
        let err = FrontMatter::extract(&raw).unwrap_err();
        assert!(err.is_structural(), "got: {err}");
        assert!(err.to_string().contains("power"), "got: {err}");
    }

    #[test]
    fn cover_slots_come_out_in_first_third_second_order() {
        let fm = FrontMatter::extract(&sample_raw()).unwrap();
        assert_eq!(fm.address_slot(0), Some("Musterstrasse 1"));
        assert_eq!(fm.address_slot(1), Some("4000 Basel, Schweiz"));
        assert_eq!(fm.address_slot(2), Some("4000 Basel"));
    }

    #[test]
    fn module_display_name_keeps_five_words_after_the_count() {
        let name =
            derive_module_display_name("21 x Vendor Solar Mono Black Series Plus 400W");
        assert_eq!(name.as_deref(), Some("Vendor Solar Mono Black Series"));
    }

    #[test]
    fn cell_without_a_count_separator_yields_no_display_name() {
        assert!(derive_module_display_name("Vendor Module 400W").is_none());
    }

    #[test]
    fn display_name_flows_from_the_datasheet_table() {
        let mut raw = sample_raw();
        while raw.tables.len() < 5 {
            raw.tables.push(RawTable::default());
        }
        raw.tables
            .push(table_from(&[(1, 1, "9 x IBC MonoSol 375 MS Halbzellen Glas")], 2, 2));
        let fm = FrontMatter::extract(&raw).unwrap();
        assert_eq!(
            fm.module_display_name.as_deref(),
            Some("IBC MonoSol 375 MS Halbzellen")
        );
    }

    #[test]
    fn missing_datasheet_table_leaves_display_name_unset() {
        let fm = FrontMatter::extract(&sample_raw()).unwrap();
        assert!(fm.module_display_name.is_none());
    }
}

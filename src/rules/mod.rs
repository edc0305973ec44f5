//! Section rules: the static catalog mapping source headings onto the
//! fixed 12-chapter output template.
//!
//! ## Why a static catalog
//!
//! The source generator emits a known set of German section headings in a
//! known order, but almost every section is optional and several repeat a
//! variable number of times. Rather than scattering string literals
//! through the traversal, every section is one [`SectionRule`]: a
//! [`SectionKind`] tag carrying its marker text, a [`TriggerMode`] saying
//! how the marker is matched, and an [`EmitPlan`] describing what the
//! section emits. The engine ([`engine::transform`]) walks the catalog in
//! order and switches on tags, never re-comparing ad-hoc strings.
//!
//! Rules are deliberately brittle-but-explicit: a rule fires only when
//! its exact textual marker is present, so an absent marker silently
//! skips that chapter's content instead of guessing.

pub mod engine;

use crate::output::ImageSize;
use once_cell::sync::Lazy;
use std::path::PathBuf;

pub use engine::{transform, EngineOptions, TransformOutcome};

/// Default figure size for section illustrations.
pub const FIGURE_SIZE: ImageSize = ImageSize::new(6.0, 4.0);
/// Portrait size used by the plan chapters (circuit, site, dimension,
/// string plans) and the Sankey diagram.
pub const PLAN_SIZE: ImageSize = ImageSize::new(5.5, 6.5);
/// Wide-and-short size for the surroundings photo.
pub const SURROUNDINGS_SIZE: ImageSize = ImageSize::new(5.5, 3.5);

// ── Section tags ─────────────────────────────────────────────────────────

/// Every section of the output template, tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    PvSystem,
    YieldForecast,
    Overview,
    ModuleAreas,
    HorizonPlanning,
    InverterWiring,
    AcGrid,
    BatterySystems,
    TotalResults,
    PerAreaResults,
    EnergyBalance,
    ModuleDatasheets,
    InverterDatasheets,
    BatterySystemDatasheets,
    BatteryDatasheets,
    CircuitDiagram,
    SitePlan,
    DimensionPlan,
    StringPlan,
    PartsList,
    Surroundings,
}

impl SectionKind {
    /// The literal heading text that triggers this section and titles it
    /// in the output.
    pub fn marker(self) -> &'static str {
        match self {
            SectionKind::PvSystem => "PV-Anlage",
            SectionKind::YieldForecast => "Ertragsprognose",
            SectionKind::Overview => "Überblick",
            SectionKind::ModuleAreas => "Modulflächen",
            SectionKind::HorizonPlanning => "Horizontlinie, 3D-Planung",
            SectionKind::InverterWiring => "Wechselrichterverschaltung",
            SectionKind::AcGrid => "AC-Netz",
            SectionKind::BatterySystems => "Batteriesysteme",
            SectionKind::TotalResults => "Ergebnisse Gesamtanlage",
            SectionKind::PerAreaResults => "Ergebnisse pro Modulfläche",
            SectionKind::EnergyBalance => "Energiebilanz Sankey-Diagramm",
            SectionKind::ModuleDatasheets => "Datenblatt PV-Modul",
            SectionKind::InverterDatasheets => "Datenblatt Wechselrichter",
            SectionKind::BatterySystemDatasheets => "Datenblatt Batteriesystem",
            SectionKind::BatteryDatasheets => "Datenblatt Batterie",
            SectionKind::CircuitDiagram => "Schaltplan",
            SectionKind::SitePlan => "Übersichtsplan",
            SectionKind::DimensionPlan => "Bemaßungsplan",
            SectionKind::StringPlan => "Strangplan",
            SectionKind::PartsList => "Stückliste",
            SectionKind::Surroundings => "Umgebung",
        }
    }
}

/// How a rule's marker is tested against the heading index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Marker must equal a level-2 heading exactly.
    ExactLevel2,
    /// Marker must appear as a substring of some level-2 heading.
    SubstringLevel2,
    /// Marker must equal a level-1 heading exactly.
    ExactLevel1,
}

/// Where a section's level-3 subheading text comes from.
#[derive(Debug, Clone, Copy)]
pub enum H3Source {
    /// A fixed literal.
    Literal(&'static str),
    /// The paragraph this many positions after the section's anchor.
    AfterAnchor(usize),
}

/// How one total-results subsection attaches its figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFigure {
    /// Figure is placed inside the copied table's first row.
    InTable,
    /// As `InTable`, unless the job suppresses consumer figures.
    InTableUnlessSuppressed,
    /// No figure.
    None,
}

/// One fixed subsection of the total-results chapter.
#[derive(Debug, Clone, Copy)]
pub struct ResultSub {
    pub marker: &'static str,
    pub figure: ResultFigure,
}

/// What a triggered section emits.
#[derive(Debug, Clone, Copy)]
pub enum EmitPlan {
    /// h2, one h3, one table copy, optionally one figure.
    TableSection { h3: H3Source, figure: bool },
    /// h2 plus a fixed list of h3+table subsections, optionally followed
    /// by a spacer and one figure.
    FixedSubsections {
        subs: &'static [&'static str],
        trailing_figure: bool,
    },
    /// h2, then a greedy scan from the anchor: while the paragraph at the
    /// scan position matches the marker, emit a subsection and advance by
    /// `stride`. `area_heading` additionally emits the matched paragraph
    /// as its own h2 and the following paragraph as h3.
    RepeatByPrefix {
        marker: &'static str,
        starts_with: bool,
        stride: usize,
        area_heading: bool,
        figure: bool,
    },
    /// h2, then h3+table per paragraph until one starts with any stop
    /// marker.
    RepeatUntilStop { stops: &'static [&'static str] },
    /// h2, then h3+table per paragraph until the next level-1 chapter
    /// heading (or paragraph exhaustion).
    RepeatUntilNextChapter,
    /// h2, then the inverter-wiring scan: "Verschaltung…" subheadings
    /// each with a table, plus extra "Wechselrichter…" tables under the
    /// same subheading, stopping at the next chapter.
    WiringScan,
    /// h2, the fixed result subsections (figure-in-table placement), then
    /// a spacer and a trailing caption-marker figure scan.
    ResultsOverview { subs: &'static [ResultSub] },
    /// h2 and exactly one figure.
    FigureOnly { size: ImageSize },
    /// h2, then one figure per following "Abbildung" caption paragraph.
    FigureScan { size: ImageSize },
    /// h2 and one h3, nothing else.
    HeadingOnly { h3: H3Source },
}

/// One trigger/emit pair of the template.
#[derive(Debug, Clone, Copy)]
pub struct SectionRule {
    pub kind: SectionKind,
    pub trigger: TriggerMode,
    /// Emit a page break before this section when it fires.
    pub page_break_before: bool,
    pub plan: EmitPlan,
}

/// One entry of the ordered catalog.
#[derive(Debug, Clone, Copy)]
pub enum CatalogEntry {
    /// Numbered chapter heading, text looked up by level-1 ordinal with
    /// graceful omission when the source has fewer chapters.
    Chapter { number: usize },
    /// Unconditional page break.
    PageBreak,
    Rule(SectionRule),
    /// Fixed company page: numbered title plus one template asset.
    StaticChapter {
        title: &'static str,
        asset: &'static str,
        size: ImageSize,
    },
}

/// What the engine emits; table copies stay index-valued until assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum EmitOp {
    Heading { level: u8, text: String },
    Spacer,
    PageBreak,
    TableCopy {
        source_index: usize,
        picture: Option<PathBuf>,
    },
    Image { path: PathBuf, size: ImageSize },
    TemplateImage { asset: String, size: ImageSize },
}

const fn rule(kind: SectionKind, trigger: TriggerMode, plan: EmitPlan) -> CatalogEntry {
    CatalogEntry::Rule(SectionRule {
        kind,
        trigger,
        page_break_before: false,
        plan,
    })
}

/// Paragraph prefixes that end the inverter-datasheet scan.
static INVERTER_STOPS: [&str; 7] = [
    "Datenblatt Batteriesystem",
    "Datenblatt Batterie",
    "Schaltplan",
    "Übersichtsplan",
    "Bemaßungsplan",
    "Strangplan",
    "Stückliste",
];

/// Fixed subsections of the total-results chapter, in template order.
static TOTAL_RESULT_SUBS: [ResultSub; 4] = [
    ResultSub {
        marker: "PV-Anlage",
        figure: ResultFigure::InTable,
    },
    ResultSub {
        marker: "Verbraucher",
        figure: ResultFigure::InTableUnlessSuppressed,
    },
    ResultSub {
        marker: "Batteriesystem",
        figure: ResultFigure::None,
    },
    ResultSub {
        marker: "Autarkiegrad",
        figure: ResultFigure::None,
    },
];

/// The ordered section catalog encoding the fixed chapter order 1…12.
pub static CATALOG: Lazy<Vec<CatalogEntry>> = Lazy::new(|| {
    use CatalogEntry::{Chapter, PageBreak, StaticChapter};
    use EmitPlan::*;
    use SectionKind as K;
    use TriggerMode::{ExactLevel1, ExactLevel2, SubstringLevel2};

    vec![
        // Chapter 1 — system and yield.
        Chapter { number: 1 },
        rule(
            K::PvSystem,
            SubstringLevel2,
            TableSection {
                h3: H3Source::AfterAnchor(4),
                figure: true,
            },
        ),
        rule(
            K::YieldForecast,
            ExactLevel2,
            TableSection {
                h3: H3Source::Literal("Ertragsprognose"),
                figure: false,
            },
        ),
        PageBreak,
        // Chapter 2 — layout and wiring.
        Chapter { number: 2 },
        rule(
            K::Overview,
            ExactLevel2,
            FixedSubsections {
                subs: &["Anlagendaten", "Klimadaten", "Verbrauch"],
                trailing_figure: true,
            },
        ),
        CatalogEntry::Rule(SectionRule {
            kind: K::ModuleAreas,
            trigger: ExactLevel2,
            page_break_before: true,
            plan: RepeatByPrefix {
                marker: "Modulfläche",
                starts_with: false,
                stride: 3,
                area_heading: true,
                figure: true,
            },
        }),
        rule(K::HorizonPlanning, ExactLevel2, FigureOnly { size: FIGURE_SIZE }),
        PageBreak,
        rule(K::InverterWiring, ExactLevel2, WiringScan),
        rule(
            K::AcGrid,
            ExactLevel2,
            TableSection {
                h3: H3Source::AfterAnchor(1),
                figure: false,
            },
        ),
        rule(
            K::BatterySystems,
            ExactLevel2,
            RepeatByPrefix {
                marker: "Batteriesystem",
                starts_with: false,
                stride: 1,
                area_heading: false,
                figure: false,
            },
        ),
        PageBreak,
        // Chapter 3 — results.
        Chapter { number: 3 },
        rule(
            K::TotalResults,
            ExactLevel2,
            ResultsOverview {
                subs: &TOTAL_RESULT_SUBS,
            },
        ),
        rule(K::PerAreaResults, ExactLevel2, RepeatUntilNextChapter),
        // Chapter 4 — energy balance and datasheets.
        Chapter { number: 4 },
        rule(K::EnergyBalance, ExactLevel1, FigureOnly { size: PLAN_SIZE }),
        rule(
            K::ModuleDatasheets,
            ExactLevel2,
            RepeatByPrefix {
                marker: "PV-Modul",
                starts_with: false,
                stride: 1,
                area_heading: false,
                figure: false,
            },
        ),
        rule(
            K::InverterDatasheets,
            ExactLevel2,
            RepeatUntilStop {
                stops: &INVERTER_STOPS,
            },
        ),
        rule(
            K::BatterySystemDatasheets,
            ExactLevel2,
            RepeatByPrefix {
                marker: "Batteriesystem",
                starts_with: true,
                stride: 1,
                area_heading: false,
                figure: false,
            },
        ),
        rule(K::BatteryDatasheets, ExactLevel2, RepeatUntilNextChapter),
        PageBreak,
        // Chapter 5 — plans.
        Chapter { number: 5 },
        rule(K::CircuitDiagram, ExactLevel2, FigureScan { size: PLAN_SIZE }),
        rule(K::SitePlan, ExactLevel2, FigureScan { size: PLAN_SIZE }),
        rule(K::DimensionPlan, ExactLevel2, FigureScan { size: PLAN_SIZE }),
        PageBreak,
        rule(K::StringPlan, ExactLevel2, FigureScan { size: PLAN_SIZE }),
        rule(
            K::PartsList,
            ExactLevel2,
            HeadingOnly {
                h3: H3Source::AfterAnchor(1),
            },
        ),
        rule(
            K::Surroundings,
            ExactLevel2,
            FigureOnly {
                size: SURROUNDINGS_SIZE,
            },
        ),
        PageBreak,
        // Chapters 6–12 — fixed company pages.
        StaticChapter {
            title: "6. Warum Solardach24 GmbH?",
            asset: "template_images/image2.png",
            size: ImageSize::new(6.5, 7.0),
        },
        StaticChapter {
            title: "7. Wer wir sind.",
            asset: "template_images/image3.png",
            size: ImageSize::new(6.5, 7.0),
        },
        StaticChapter {
            title: "8. Unser Haustechnik-Partner. Für Ihre persönliche Energiewende.",
            asset: "template_images/image4.png",
            size: ImageSize::new(5.8, 5.5),
        },
        StaticChapter {
            title: "9. Unsere Elektropartner. Für Ihre Sicherheit.",
            asset: "template_images/image5.png",
            size: ImageSize::new(6.0, 6.0),
        },
        StaticChapter {
            title: "10. Unser Versicherungspartner. Exklusiv bei der Solardach24.",
            asset: "template_images/image6.png",
            size: ImageSize::new(5.0, 6.0),
        },
        StaticChapter {
            title: "11. Unsere Lieferanten. Für die besten Komponenten.",
            asset: "template_images/image7.png",
            size: ImageSize::new(6.0, 6.0),
        },
        StaticChapter {
            title: "12. Gesellschaftliches Engagement und Mitgliedschaften",
            asset: "template_images/image8.png",
            size: ImageSize::new(6.0, 6.0),
        },
    ]
});

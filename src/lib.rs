//! # solardoc
//!
//! Rebuild auto-generated solar-installation proposal reports into a
//! standardized, styled template document.
//!
//! ## Why this crate?
//!
//! The planning tool exports loosely structured project reports: optional
//! sections, a variable number of module areas and battery systems, and
//! tables/figures that carry no stable identifiers — only their position.
//! This crate watches an input directory, extracts each report's
//! heading/table/image sequence, and re-emits it through a fixed
//! 12-chapter template. Two monotonic cursors keep every table copy and
//! figure aligned with its source position, and a single malformed input
//! quarantines itself without stopping the pipeline.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source document
//!  │
//!  ├─ 1. Watch     create event, settle delay, FIFO queue (single worker)
//!  ├─ 2. Extract   heading index + flat paragraphs + table count + figures
//!  ├─ 3. Traverse  section rule catalog, cursor-consuming emit plans
//!  ├─ 4. Assemble  front-matter substitution, header/footer, styling
//!  └─ 5. Persist   {name}-output.json  — or quarantine + error log entry
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use solardoc::{pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder("input")
//!         .output_dir("output")
//!         .quarantine_dir("invalid")
//!         .build()?;
//!     // Runs until interrupted; queued jobs finish before shutdown.
//!     pipeline::run(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `solardoc` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! solardoc = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod cursor;
pub mod error;
pub mod errorlog;
pub mod frontmatter;
pub mod images;
pub mod io;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod rules;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, TemplateConfig};
pub use error::{JobError, SolardocError};
pub use model::{DocumentSummary, RawDocument, SourceDocument};
pub use output::{OutBlock, OutputDocument};
pub use pipeline::{inspect, process_file};

//! Pipeline configuration.
//!
//! Everything one daemon instance needs is controlled through
//! [`PipelineConfig`], built via its [`PipelineConfigBuilder`]: the
//! watched/output/quarantine directories, watcher filtering knobs, cursor
//! start offsets, the output template constants, and the three
//! collaborator trait objects (reader, writer, image extractor).
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about, and `build()`
//! validates the combination up front so the daemon never discovers a bad
//! configuration mid-job.

use crate::error::SolardocError;
use crate::io::{
    DirImageExtractor, DocumentWriter, ImageExtractor, JsonReader, JsonWriter, SourceReader,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fixed template constants baked into every output document.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// Cover title line; its literal "0.00" marker is replaced with the
    /// extracted system power.
    pub title_line: String,
    /// Cover module line; its literal "0" marker is replaced with the
    /// extracted module name.
    pub module_line: String,
    /// Template asset used as the cover figure.
    pub cover_asset: String,
    /// Template asset embedded in the first-page header.
    pub header_logo_asset: String,
    pub company_name: String,
    pub company_tagline: String,
    /// Centred footer lines, top to bottom.
    pub footer_lines: Vec<String>,
    /// Font family applied uniformly across all runs.
    pub font_family: String,
    /// RGB accent colour for title lines and company branding.
    pub accent_color: [u8; 3],
    /// Hex border colour for the uniform table grid.
    pub table_border_color: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig {
            title_line: "Ihre Solaranlage mit 0.00".into(),
            module_line: "0".into(),
            cover_asset: "template_images/image1.png".into(),
            header_logo_asset: "template_images/header.png".into(),
            company_name: "Solardach24 GmbH".into(),
            company_tagline: "Sicher und zuverlässig".into(),
            footer_lines: vec![
                "Solardach24 GmbH".into(),
                "Reinacherstrasse 261 ∙ 4053 Basel".into(),
                "Collègegasse 9 ∙ 2502 Biel/Bienne".into(),
                "+41 61 511 22 22 ∙ office@solardach24.ch ∙ CHE-152.292-000".into(),
            ],
            font_family: "Barlow".into(),
            accent_color: [250, 168, 32],
            table_border_color: "E8E9EB".into(),
        }
    }
}

/// Configuration for one pipeline instance.
///
/// # Example
/// ```rust
/// use solardoc::PipelineConfig;
///
/// let config = PipelineConfig::builder("input")
///     .output_dir("output")
///     .quarantine_dir("invalid")
///     .settle_delay_ms(500)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Directory watched for new source files (non-recursive).
    pub watch_dir: PathBuf,
    /// Where output documents land. Default: `output`.
    pub output_dir: PathBuf,
    /// Where failed jobs' source files are moved. Default: `invalid`.
    pub quarantine_dir: PathBuf,
    /// Plain-text failure log path. Default: `error_log.txt`.
    pub error_log: PathBuf,
    /// Extension (without dot) a created file must have to become a job.
    /// Default: `json`.
    pub watch_extension: String,
    /// File-name prefix marking transient editor lock files. Default: `~$`.
    pub lock_marker_prefix: String,
    /// Delay between the create event and enqueueing, giving the writer
    /// time to finish. Default: 1000 ms.
    pub settle_delay_ms: u64,
    /// Bounded retries for the quarantine move, tolerating transient
    /// locks from concurrent readers. Default: 5.
    pub move_retries: u32,
    /// Delay between quarantine-move retries. Default: 1000 ms.
    pub move_retry_delay_ms: u64,
    /// First usable index into each job's table sequence. Default: 0.
    /// Deployments whose sources lead with non-content tables (address
    /// block, cover data) set this past them.
    pub first_table_index: usize,
    /// First usable index into each job's image sequence. Default: 0.
    pub first_image_index: usize,
    /// Output template constants.
    pub template: TemplateConfig,
    reader: Option<Arc<dyn SourceReader>>,
    writer: Option<Arc<dyn DocumentWriter>>,
    extractor: Option<Arc<dyn ImageExtractor>>,
}

impl PipelineConfig {
    pub fn builder(watch_dir: impl Into<PathBuf>) -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: PipelineConfig {
                watch_dir: watch_dir.into(),
                output_dir: PathBuf::from("output"),
                quarantine_dir: PathBuf::from("invalid"),
                error_log: PathBuf::from("error_log.txt"),
                watch_extension: "json".into(),
                lock_marker_prefix: "~$".into(),
                settle_delay_ms: 1000,
                move_retries: 5,
                move_retry_delay_ms: 1000,
                first_table_index: 0,
                first_image_index: 0,
                template: TemplateConfig::default(),
                reader: None,
                writer: None,
                extractor: None,
            },
        }
    }

    /// The configured source reader, or the JSON default.
    pub fn resolve_reader(&self) -> Arc<dyn SourceReader> {
        self.reader.clone().unwrap_or_else(|| Arc::new(JsonReader))
    }

    /// The configured document writer, or the JSON default.
    pub fn resolve_writer(&self) -> Arc<dyn DocumentWriter> {
        self.writer.clone().unwrap_or_else(|| Arc::new(JsonWriter))
    }

    /// The configured image extractor, or the directory-scan default.
    pub fn resolve_extractor(&self) -> Arc<dyn ImageExtractor> {
        self.extractor
            .clone()
            .unwrap_or_else(|| Arc::new(DirImageExtractor::default()))
    }

    /// Output path for a job: `{stem}-output.{ext}` in the output
    /// directory.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        self.output_dir
            .join(format!("{stem}-output.{}", self.resolve_writer().extension()))
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("watch_dir", &self.watch_dir)
            .field("output_dir", &self.output_dir)
            .field("quarantine_dir", &self.quarantine_dir)
            .field("error_log", &self.error_log)
            .field("watch_extension", &self.watch_extension)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("move_retries", &self.move_retries)
            .field("first_table_index", &self.first_table_index)
            .field("first_image_index", &self.first_image_index)
            .field("reader", &self.reader.as_ref().map(|_| "<custom>"))
            .field("writer", &self.writer.as_ref().map(|_| "<custom>"))
            .field("extractor", &self.extractor.as_ref().map(|_| "<custom>"))
            .finish_non_exhaustive()
    }
}

/// Builder for [`PipelineConfig`]. Created via [`PipelineConfig::builder`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn quarantine_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.quarantine_dir = dir.into();
        self
    }

    pub fn error_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.error_log = path.into();
        self
    }

    pub fn watch_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.watch_extension = ext.into();
        self
    }

    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.settle_delay_ms = ms;
        self
    }

    /// Clamped to at least one attempt.
    pub fn move_retries(mut self, retries: u32) -> Self {
        self.config.move_retries = retries.max(1);
        self
    }

    pub fn move_retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.move_retry_delay_ms = ms;
        self
    }

    pub fn first_table_index(mut self, index: usize) -> Self {
        self.config.first_table_index = index;
        self
    }

    pub fn first_image_index(mut self, index: usize) -> Self {
        self.config.first_image_index = index;
        self
    }

    pub fn template(mut self, template: TemplateConfig) -> Self {
        self.config.template = template;
        self
    }

    pub fn reader(mut self, reader: Arc<dyn SourceReader>) -> Self {
        self.config.reader = Some(reader);
        self
    }

    pub fn writer(mut self, writer: Arc<dyn DocumentWriter>) -> Self {
        self.config.writer = Some(writer);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn ImageExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    /// Validate and produce the final configuration.
    pub fn build(self) -> Result<PipelineConfig, SolardocError> {
        let c = self.config;
        if c.watch_dir.as_os_str().is_empty() {
            return Err(SolardocError::InvalidConfig(
                "watch directory must not be empty".into(),
            ));
        }
        if c.watch_extension.is_empty() || c.watch_extension.starts_with('.') {
            return Err(SolardocError::InvalidConfig(format!(
                "watch extension must be a bare extension, got '{}'",
                c.watch_extension
            )));
        }
        if c.watch_dir == c.quarantine_dir {
            return Err(SolardocError::InvalidConfig(
                "quarantine directory must differ from the watch directory".into(),
            ));
        }
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let cfg = PipelineConfig::builder("input").build().unwrap();
        assert_eq!(cfg.watch_extension, "json");
        assert_eq!(cfg.settle_delay_ms, 1000);
        assert_eq!(cfg.move_retries, 5);
        assert_eq!(cfg.first_table_index, 0);
    }

    #[test]
    fn output_path_appends_marker_and_extension() {
        let cfg = PipelineConfig::builder("input")
            .output_dir("out")
            .build()
            .unwrap();
        assert_eq!(
            cfg.output_path("0042-report.json"),
            PathBuf::from("out/0042-report-output.json")
        );
    }

    #[test]
    fn dotted_extension_is_rejected() {
        let err = PipelineConfig::builder("input")
            .watch_extension(".json")
            .build()
            .unwrap_err();
        assert!(matches!(err, SolardocError::InvalidConfig(_)), "got: {err}");
    }

    #[test]
    fn quarantine_must_not_alias_watch_dir() {
        let err = PipelineConfig::builder("input")
            .quarantine_dir("input")
            .build()
            .unwrap_err();
        assert!(matches!(err, SolardocError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_collaborators() {
        let cfg = PipelineConfig::builder("input")
            .reader(Arc::new(JsonReader))
            .build()
            .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(dbg.contains("<custom>"), "got: {dbg}");
        assert!(!dbg.contains("JsonReader"), "got: {dbg}");
    }
}

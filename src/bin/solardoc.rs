//! CLI binary for solardoc.
//!
//! A thin shim over the library crate: maps flags and environment
//! variables to a `PipelineConfig` and runs the watch daemon until
//! interrupted, or processes/inspects a single file and exits.

use anyhow::{Context, Result};
use clap::Parser;
use solardoc::{pipeline, PipelineConfig};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "solardoc",
    version,
    about = "Rebuild solar proposal reports into the company template",
    long_about = "Watches an input directory for exported proposal reports and rebuilds \
                  each one into the fixed 12-chapter company template. Failed documents \
                  are moved to the quarantine directory and logged; the daemon keeps \
                  running. Paths are environment-fixable so a deployment needs no flags."
)]
struct Cli {
    /// Directory watched for new source documents.
    #[arg(long, env = "SOLARDOC_INPUT_DIR", default_value = "input")]
    input_dir: PathBuf,

    /// Directory output documents are written to.
    #[arg(long, env = "SOLARDOC_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Directory failed source documents are moved to.
    #[arg(long, env = "SOLARDOC_QUARANTINE_DIR", default_value = "invalid")]
    quarantine_dir: PathBuf,

    /// Plain-text failure log.
    #[arg(long, env = "SOLARDOC_ERROR_LOG", default_value = "error_log.txt")]
    error_log: PathBuf,

    /// Milliseconds to wait after a create event before reading the file.
    #[arg(long, env = "SOLARDOC_SETTLE_DELAY_MS", default_value_t = 1000)]
    settle_delay_ms: u64,

    /// First usable table index in each source document.
    #[arg(long, env = "SOLARDOC_FIRST_TABLE_INDEX", default_value_t = 0)]
    first_table_index: usize,

    /// First usable image index in each source document.
    #[arg(long, env = "SOLARDOC_FIRST_IMAGE_INDEX", default_value_t = 0)]
    first_image_index: usize,

    /// Process one file and exit instead of watching.
    #[arg(long, value_name = "FILE", conflicts_with = "inspect")]
    once: Option<PathBuf>,

    /// Print a source document's extracted shape as JSON and exit.
    #[arg(long, value_name = "FILE")]
    inspect: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, env = "SOLARDOC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SOLARDOC_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let config = PipelineConfig::builder(&cli.input_dir)
        .output_dir(&cli.output_dir)
        .quarantine_dir(&cli.quarantine_dir)
        .error_log(&cli.error_log)
        .settle_delay_ms(cli.settle_delay_ms)
        .first_table_index(cli.first_table_index)
        .first_image_index(cli.first_image_index)
        .build()
        .context("invalid configuration")?;

    if let Some(path) = cli.inspect {
        let summary = pipeline::inspect(&path, &config)
            .with_context(|| format!("failed to inspect '{}'", path.display()))?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if let Some(path) = cli.once {
        let output = pipeline::process_file(&path, &config)
            .with_context(|| format!("failed to process '{}'", path.display()))?;
        println!("{}", output.display());
        return Ok(());
    }

    pipeline::run(config).await.context("pipeline failed")?;
    Ok(())
}

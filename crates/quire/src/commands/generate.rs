//! `quire generate` command implementation.

use std::path::PathBuf;

use clap::Args;
use quire_build::{BuildOptions, BuildReport, ERROR_REPORT_NAME, SiteBuilder};
use quire_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the generate command.
#[derive(Args)]
pub(crate) struct GenerateArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Meta directory with templates and footer (overrides config).
    #[arg(short, long)]
    meta_dir: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Whitelist/exclude pattern file (overrides config).
    #[arg(short, long)]
    filter: Option<PathBuf>,

    /// Number of parallel render lanes (overrides config).
    #[arg(long, env = "QUIRE_LANES")]
    lanes: Option<usize>,

    /// Ignore every cache and regenerate the whole site.
    #[arg(long)]
    clean: bool,

    /// Disable caching.
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose output (per-phase timing logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl GenerateArgs {
    /// Execute the generate command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the build cannot run, or
    /// any file failed to build.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            meta_dir: self.meta_dir,
            output_dir: self.output_dir,
            filter_file: self.filter,
            lanes: self.lanes,
            cache_enabled: self.no_cache.then_some(false),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let options = BuildOptions::from_config(&config).with_clean(self.clean);

        output.field("Source", options.source_dir.display());
        output.field("Output", options.output_dir.display());
        if self.clean {
            output.info("Clean build: ignoring caches");
        }

        let mut builder = SiteBuilder::new(options)?;
        let report = builder.build().await?;

        summarize(&output, &report);
        if report.is_success() {
            output.success(&format!(
                "Site generated in {}",
                builder.options().output_dir.display()
            ));
            return Ok(());
        }

        let report_path = builder.options().output_dir.join(ERROR_REPORT_NAME);
        Err(CliError::FilesFailed(
            report.errors.len(),
            report_path.display().to_string(),
        ))
    }
}

fn summarize(output: &Output, report: &BuildReport) {
    output.info(&format!(
        "{} documents: {} rendered, {} unchanged; {} assets copied; {} outputs removed",
        report.documents, report.rendered, report.skipped, report.copied, report.removed
    ));
    if report.nav_cache_hit {
        output.detail("navigation restored from cache");
    }
    for error in &report.errors {
        output.warning(&format!("Failed: {error}"));
    }
}

//! `quire serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use quire_config::{CliSettings, Config};
use quire_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
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

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (per-phase timing logs).
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable live reload (default: enabled).
    #[arg(long)]
    live_reload: Option<bool>,

    /// Disable live reload.
    #[arg(long, conflicts_with = "live_reload")]
    no_live_reload: bool,

    /// Enable caching (default: enabled).
    #[arg(long)]
    cache: Option<bool>,

    /// Disable caching.
    #[arg(long, conflicts_with = "cache")]
    no_cache: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting server on http://{}:{}",
            config.server.host, config.server.port
        ));
        output.field("Source", config.build_resolved.source_dir.display());
        output.field("Output", config.build_resolved.output_dir.display());
        if !config.build_resolved.cache_enabled {
            output.field("Cache", "disabled");
        }
        let live_reload = if config.live_reload.enabled { "enabled" } else { "disabled" };
        output.field("Live reload", live_reload);

        let server_config = server_config_from_config(&config, version.to_owned());
        run_server(server_config).await?;

        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.port,
            source_dir: self.source_dir.clone(),
            meta_dir: self.meta_dir.clone(),
            output_dir: self.output_dir.clone(),
            filter_file: self.filter.clone(),
            lanes: None,
            cache_enabled: self.resolve_cache_enabled(),
            live_reload_enabled: self.resolve_live_reload_enabled(),
        }
    }

    /// Resolve `cache_enabled` from --cache/--no-cache flags.
    fn resolve_cache_enabled(&self) -> Option<bool> {
        self.no_cache.then_some(false).or(self.cache)
    }

    /// Resolve `live_reload_enabled` from --live-reload/--no-live-reload flags.
    fn resolve_live_reload_enabled(&self) -> Option<bool> {
        self.no_live_reload.then_some(false).or(self.live_reload)
    }
}

//! Build options.

use std::path::PathBuf;

use quire_config::Config;
use quire_source::CACHE_DIR_NAME;

use crate::error::BuildError;

/// Inputs of one build.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Source root.
    pub source_dir: PathBuf,
    /// Meta directory with templates and footer.
    pub meta_dir: Option<PathBuf>,
    /// Output root.
    pub output_dir: PathBuf,
    /// Whitelist/exclude pattern file.
    pub filter_file: Option<PathBuf>,
    /// Per-folder config file name.
    pub meta_filename: String,
    /// Parallel render lanes.
    pub lanes: usize,
    /// Documents per render batch.
    pub render_batch_size: usize,
    /// Files per concurrent I/O batch.
    pub io_batch_size: usize,
    /// Whether caches are loaded and saved.
    pub cache_enabled: bool,
    /// Ignore every cache and regenerate everything.
    pub clean: bool,
}

impl BuildOptions {
    /// Options with defaults for everything but the two roots.
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            meta_dir: None,
            output_dir: output_dir.into(),
            filter_file: None,
            meta_filename: "meta.yaml".to_owned(),
            lanes: 2,
            render_batch_size: 64,
            io_batch_size: 32,
            cache_enabled: true,
            clean: false,
        }
    }

    /// Options from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let build = &config.build_resolved;
        Self {
            source_dir: build.source_dir.clone(),
            meta_dir: build.meta_dir.clone(),
            output_dir: build.output_dir.clone(),
            filter_file: build.filter_file.clone(),
            meta_filename: config.metadata.name.clone(),
            lanes: build.lanes,
            render_batch_size: build.render_batch_size,
            io_batch_size: build.io_batch_size,
            cache_enabled: build.cache_enabled,
            clean: false,
        }
    }

    /// Set the clean flag.
    #[must_use]
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Cache directory inside the source root.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.source_dir.join(CACHE_DIR_NAME)
    }
}

/// Summary of a build or rebuild.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Documents found.
    pub documents: usize,
    /// Documents rendered and written.
    pub rendered: usize,
    /// Documents whose fingerprint was unchanged.
    pub skipped: usize,
    /// Static files copied.
    pub copied: usize,
    /// Outputs removed because their source is gone.
    pub removed: usize,
    /// Whether navigation was restored from the cache.
    pub nav_cache_hit: bool,
    /// Per-file failures.
    pub errors: Vec<BuildError>,
}

impl BuildReport {
    /// Whether no file failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

//! Configuration management for quire.
//!
//! Parses `quire.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `build.source_dir`
//! - `build.meta_dir`
//! - `build.output_dir`
//!
//! ## Example
//!
//! ```toml
//! [build]
//! source_dir = "docs"
//! meta_dir = "meta"
//! output_dir = "${QUIRE_OUT:-site}"
//! lanes = 4
//!
//! [server]
//! port = 8080
//! ```

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override source directory.
    pub source_dir: Option<PathBuf>,
    /// Override meta directory.
    pub meta_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override whitelist/exclude file.
    pub filter_file: Option<PathBuf>,
    /// Override number of render lanes.
    pub lanes: Option<usize>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override live reload enabled flag.
    pub live_reload_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quire.toml";

/// Name of the per-source-root cache directory.
const CACHE_DIR_NAME: &str = ".quire";

const DEFAULT_RENDER_BATCH: usize = 64;
const DEFAULT_IO_BATCH: usize = 32;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Build configuration (paths are relative strings from TOML).
    #[serde(default)]
    build: BuildConfigRaw,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,
    /// Metadata configuration.
    pub metadata: MetadataConfig,
    /// Search configuration.
    pub search: SearchConfig,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    #[allow(clippy::derivable_impls)]
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
        }
    }
}

/// Raw build configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    meta_dir: Option<String>,
    output_dir: Option<String>,
    filter_file: Option<String>,
    lanes: Option<usize>,
    render_batch_size: Option<usize>,
    io_batch_size: Option<usize>,
    cache_enabled: Option<bool>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Source directory with documents and assets.
    pub source_dir: PathBuf,
    /// Meta directory with templates and footer, if any.
    pub meta_dir: Option<PathBuf>,
    /// Output directory for the generated site.
    pub output_dir: PathBuf,
    /// Whitelist/exclude pattern file, if any.
    pub filter_file: Option<PathBuf>,
    /// Number of parallel render lanes.
    pub lanes: usize,
    /// Documents per render batch.
    pub render_batch_size: usize,
    /// Files per concurrent I/O batch.
    pub io_batch_size: usize,
    /// Whether caches are loaded and saved.
    pub cache_enabled: bool,
}

impl BuildConfig {
    /// Cache directory path (`<source>/.quire/`).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.source_dir.join(CACHE_DIR_NAME)
    }
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Whether live reload is enabled.
    pub enabled: bool,
    /// Quiet period before a file change is acted on, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 150,
        }
    }
}

/// Metadata configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Filename for per-folder config files.
    pub name: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            name: "meta.yaml".to_owned(),
        }
    }
}

/// Search configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Whether the dev server answers `/api/search`. The search artifacts
    /// are written on every build regardless.
    pub enabled: bool,
    /// Maximum hits returned by the dev server search endpoint.
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_results: 20,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`QUIRE_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Number of lanes when not configured.
fn default_lanes() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quire.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated after CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(meta_dir) = &settings.meta_dir {
            self.build_resolved.meta_dir = Some(meta_dir.clone());
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(filter_file) = &settings.filter_file {
            self.build_resolved.filter_file = Some(filter_file.clone());
        }
        if let Some(lanes) = settings.lanes {
            self.build_resolved.lanes = lanes;
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.build_resolved.cache_enabled = cache_enabled;
        }
        if let Some(live_reload_enabled) = settings.live_reload_enabled {
            self.live_reload.enabled = live_reload_enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            build: BuildConfigRaw::default(),
            live_reload: LiveReloadConfig::default(),
            metadata: MetadataConfig::default(),
            search: SearchConfig::default(),
            build_resolved: BuildConfig {
                source_dir: base.join("docs"),
                meta_dir: None,
                output_dir: base.join("site"),
                filter_file: None,
                lanes: default_lanes(),
                render_batch_size: DEFAULT_RENDER_BATCH,
                io_batch_size: DEFAULT_IO_BATCH,
                cache_enabled: true,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // `${VAR}` must be resolved before paths are joined
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Reject values the server or the build cannot work with. Runs at the
    /// end of [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_build()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // An ephemeral port would leave the dev server unreachable by URL
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate build configuration.
    fn validate_build(&self) -> Result<(), ConfigError> {
        const MAX_LANES: usize = 256;

        require_non_empty(&self.metadata.name, "metadata.name")?;

        let build = &self.build_resolved;
        if build.lanes == 0 {
            return Err(ConfigError::Validation(
                "build.lanes must be greater than 0".to_owned(),
            ));
        }
        if build.lanes > MAX_LANES {
            return Err(ConfigError::Validation(format!(
                "build.lanes cannot exceed {MAX_LANES}"
            )));
        }
        if build.render_batch_size == 0 {
            return Err(ConfigError::Validation(
                "build.render_batch_size must be greater than 0".to_owned(),
            ));
        }
        if build.io_batch_size == 0 {
            return Err(ConfigError::Validation(
                "build.io_batch_size must be greater than 0".to_owned(),
            ));
        }
        if build.output_dir == build.source_dir {
            return Err(ConfigError::Validation(
                "build.output_dir must differ from build.source_dir".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        let build = &mut self.build;
        for (value, field) in [
            (&mut build.source_dir, "build.source_dir"),
            (&mut build.meta_dir, "build.meta_dir"),
            (&mut build.output_dir, "build.output_dir"),
        ] {
            if let Some(raw) = value.as_deref() {
                *value = Some(expand::expand_env(raw, field)?);
            }
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref(), "docs"),
            meta_dir: self.build.meta_dir.as_deref().map(|d| config_dir.join(d)),
            output_dir: resolve(self.build.output_dir.as_deref(), "site"),
            filter_file: self.build.filter_file.as_deref().map(|f| config_dir.join(f)),
            lanes: self.build.lanes.unwrap_or_else(default_lanes),
            render_batch_size: self.build.render_batch_size.unwrap_or(DEFAULT_RENDER_BATCH),
            io_batch_size: self.build.io_batch_size.unwrap_or(DEFAULT_IO_BATCH),
            cache_enabled: self.build.cache_enabled.unwrap_or(true),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7979);
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/test/docs"));
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/test/site"));
        assert_eq!(
            config.build_resolved.cache_dir(),
            PathBuf::from("/test/docs/.quire")
        );
        assert_eq!(config.build_resolved.meta_dir, None);
        assert!(config.build_resolved.cache_enabled);
        assert!(config.build_resolved.lanes >= 1);
        assert!(config.live_reload.enabled);
        assert_eq!(config.live_reload.debounce_ms, 150);
        assert_eq!(config.metadata.name, "meta.yaml");
        assert!(config.search.enabled);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7979);
    }

    #[test]
    fn test_parse_sections() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000

[live_reload]
enabled = false
debounce_ms = 500

[metadata]
name = "folder.yaml"

[search]
max_results = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert!(!config.live_reload.enabled);
        assert_eq!(config.live_reload.debounce_ms, 500);
        assert_eq!(config.metadata.name, "folder.yaml");
        assert_eq!(config.search.max_results, 5);
        assert!(config.search.enabled);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[build]
source_dir = "content"
meta_dir = "theme"
output_dir = "public"
filter_file = "build.list"
lanes = 3
render_batch_size = 10
io_batch_size = 4
cache_enabled = false
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        let build = &config.build_resolved;
        assert_eq!(build.source_dir, PathBuf::from("/project/content"));
        assert_eq!(build.meta_dir, Some(PathBuf::from("/project/theme")));
        assert_eq!(build.output_dir, PathBuf::from("/project/public"));
        assert_eq!(build.filter_file, Some(PathBuf::from("/project/build.list")));
        assert_eq!(build.lanes, 3);
        assert_eq!(build.render_batch_size, 10);
        assert_eq!(build.io_batch_size, 4);
        assert!(!build.cache_enabled);
        assert_eq!(build.cache_dir(), PathBuf::from("/project/content/.quire"));
    }

    #[test]
    fn test_load_from_file_and_discovered_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quire.toml");
        std::fs::write(&path, "[build]\nsource_dir = \"src\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.build_resolved.source_dir, dir.path().join("src"));
        assert_eq!(config.build_resolved.output_dir, dir.path().join("site"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/quire.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quire.toml");
        std::fs::write(&path, "[build\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_apply_cli_settings_multiple() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let settings = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            port: Some(3000),
            source_dir: Some(PathBuf::from("/custom/docs")),
            meta_dir: Some(PathBuf::from("/custom/meta")),
            output_dir: Some(PathBuf::from("/custom/out")),
            filter_file: Some(PathBuf::from("/custom/list")),
            lanes: Some(2),
            cache_enabled: Some(false),
            live_reload_enabled: Some(false),
        };

        config.apply_cli_settings(&settings);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/custom/docs"));
        assert_eq!(config.build_resolved.meta_dir, Some(PathBuf::from("/custom/meta")));
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/custom/out"));
        assert_eq!(config.build_resolved.filter_file, Some(PathBuf::from("/custom/list")));
        assert_eq!(config.build_resolved.lanes, 2);
        assert!(!config.build_resolved.cache_enabled);
        assert!(!config.live_reload.enabled);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.server.port, 7979);
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/test/docs"));
    }

    #[test]
    fn test_expand_env_vars_host_and_paths() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("QUIRE_TEST_HOST", "0.0.0.0");
            std::env::remove_var("QUIRE_TEST_OUT");
        }

        let toml = r#"
[server]
host = "${QUIRE_TEST_HOST}"

[build]
output_dir = "${QUIRE_TEST_OUT:-public}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        config.resolve_paths(Path::new("/p"));

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/p/public"));

        unsafe {
            std::env::remove_var("QUIRE_TEST_HOST");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("QUIRE_MISSING_VAR_TEST");
        }

        let toml = r#"
[build]
source_dir = "${QUIRE_MISSING_VAR_TEST}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("QUIRE_MISSING_VAR_TEST"));
        assert!(err.to_string().contains("build.source_dir"));
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default_with_base(Path::new("/test")).validate().is_ok());
    }

    #[test]
    fn test_validate_server_host_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.host cannot be empty"));
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;
        assert!(config.validate().unwrap_err().to_string().contains("server.port"));
    }

    #[test]
    fn test_validate_build_limits() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.build_resolved.lanes = 0;
        assert!(config.validate().unwrap_err().to_string().contains("build.lanes"));

        let mut config = Config::default_with_base(Path::new("/test"));
        config.build_resolved.lanes = 1000;
        assert!(config.validate().unwrap_err().to_string().contains("cannot exceed"));

        let mut config = Config::default_with_base(Path::new("/test"));
        config.build_resolved.render_batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default_with_base(Path::new("/test"));
        config.build_resolved.io_batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_output_differs_from_source() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.build_resolved.output_dir = config.build_resolved.source_dir.clone();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }
}

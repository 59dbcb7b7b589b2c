//! CLI error types.

use quire_build::RunError;
use quire_config::ConfigError;
use quire_server::ServerError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Build(#[from] RunError),

    #[error("{0}")]
    Server(#[from] ServerError),

    /// The site was generated but some files failed.
    #[error("{0} file(s) failed to build, see {1}")]
    FilesFailed(usize, String),
}

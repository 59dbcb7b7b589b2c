//! Server errors.

use quire_build::RunError;

/// Failure that prevents the dev server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The builder could not be created.
    #[error(transparent)]
    Build(#[from] RunError),

    /// The file watcher could not be started.
    #[error("Failed to watch files: {0}")]
    Watch(#[from] notify::Error),

    /// `host:port` is not a socket address.
    #[error("Invalid address {address}: {source}")]
    Address {
        /// The rejected address.
        address: String,
        /// Parse error.
        source: std::net::AddrParseError,
    },

    /// Binding or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

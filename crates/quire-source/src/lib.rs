//! Source tree discovery for quire.
//!
//! This crate knows how a documentation source tree is laid out:
//!
//! - [`Scanner`] walks the tree once per build and returns a [`SourceTree`]
//! - [`RenderKind`] classifies files by extension into a closed set of kinds
//! - [`SourceFilter`] applies an optional whitelist/exclude file
//! - [`ChangeEvent`] and [`EventDebouncer`] carry file-watch notifications
//!   into dev mode
//! - [`parse_frontmatter`] reads the YAML header shared by every document
//!   format
//!
//! The scanner never reads file contents; that is left to the build
//! pipeline.

mod debouncer;
mod event;
mod filter;
mod frontmatter;
mod kind;
mod scanner;

pub use debouncer::EventDebouncer;
pub use event::{ChangeEvent, ChangeKind};
pub use filter::SourceFilter;
pub use frontmatter::{parse_frontmatter, split_frontmatter};
pub use kind::{
    CACHE_DIR_NAME, ICON_FILE_NAMES, MENU_OVERRIDE_NAMES, RenderKind, is_icon_file, is_image,
    is_index_file, is_menu_override, is_skipped_name,
};
pub use scanner::{Scanner, SourceDir, SourceFile, SourceKind, SourceTree, file_url_path};

/// Error returned when the source tree cannot be discovered.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source root itself cannot be read.
    #[error("Cannot read source directory {}: {source}", path.display())]
    Unreadable {
        /// Source root.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The filter file cannot be read.
    #[error("Cannot read filter file {}: {source}", path.display())]
    FilterFile {
        /// Filter file path.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A filter pattern is not a valid glob.
    #[error("Invalid filter pattern '{pattern}': {message}")]
    FilterPattern {
        /// Offending pattern.
        pattern: String,
        /// Parser message.
        message: String,
    },
}

//! Typed change events fed into dev mode.

use std::path::PathBuf;

/// Kind of filesystem change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// File or directory was created.
    Created,
    /// File content or metadata changed.
    Modified,
    /// File or directory was removed.
    Removed,
}

impl ChangeKind {
    /// Lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// A single change to one path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Absolute path that changed.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Create a new event.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

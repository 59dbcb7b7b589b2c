//! Build errors.
//!
//! Two levels:
//!
//! - [`RunError`] aborts the whole build (source root unreadable, output
//!   root not writable, render pool unavailable).
//! - [`BuildError`] records a failure of one file. It is collected into the
//!   run's error list and never stops other files from being built.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use quire_source::SourceError;
use serde::{Deserialize, Serialize};

/// Name of the error report written to the output root.
pub const ERROR_REPORT_NAME: &str = "build-errors.json";

/// Failure that aborts a build.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The source tree or the filter file cannot be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The output root cannot be created or written.
    #[error("Output directory {} is not writable: {source}", path.display())]
    OutputNotWritable {
        /// Output root.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The render lanes could not be started.
    #[error(transparent)]
    Render(#[from] quire_render::RenderError),

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Step of the pipeline in which a file failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Reading the source file.
    Read,
    /// Rendering markup to HTML.
    Render,
    /// Applying the page template.
    Template,
    /// Writing the output file.
    Write,
    /// Copying a static asset.
    Copy,
    /// Writing a site-wide artifact.
    Artifact,
}

impl Phase {
    /// Lowercase name used in logs and the report.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Render => "render",
            Self::Template => "template",
            Self::Write => "write",
            Self::Copy => "copy",
            Self::Artifact => "artifact",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildError {
    /// Source path relative to the source root, or the artifact name.
    pub file: String,
    /// Where it failed.
    pub phase: Phase,
    /// Human-readable cause.
    pub message: String,
}

impl BuildError {
    /// Create an error record.
    #[must_use]
    pub fn new(file: impl Into<String>, phase: Phase, message: impl fmt::Display) -> Self {
        Self {
            file: file.into(),
            phase,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.file, self.phase, self.message)
    }
}

/// Contents of `build-errors.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// Each failed file once, sorted.
    pub failed_files: Vec<String>,
    /// Every error in the order it happened.
    pub errors: Vec<BuildError>,
}

impl ErrorReport {
    /// Build the report for a list of errors.
    #[must_use]
    pub fn from_errors(errors: &[BuildError]) -> Self {
        let failed: BTreeSet<&str> = errors.iter().map(|e| e.file.as_str()).collect();
        Self {
            failed_files: failed.into_iter().map(str::to_owned).collect(),
            errors: errors.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_lists_each_file_once() {
        let errors = vec![
            BuildError::new("b.md", Phase::Render, "bad"),
            BuildError::new("a.md", Phase::Read, "gone"),
            BuildError::new("b.md", Phase::Write, "full"),
        ];

        let report = ErrorReport::from_errors(&errors);

        assert_eq!(report.failed_files, vec!["a.md", "b.md"]);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn test_report_json_shape() {
        let report = ErrorReport::from_errors(&[BuildError::new("x.md", Phase::Template, "template not found: wide")]);

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "failedFiles": ["x.md"],
                "errors": [{"file": "x.md", "phase": "template", "message": "template not found: wide"}]
            })
        );
    }

    #[test]
    fn test_build_error_display() {
        let error = BuildError::new("a/b.md", Phase::Render, "renderer panicked: boom");
        assert_eq!(error.to_string(), "a/b.md (render): renderer panicked: boom");
    }
}

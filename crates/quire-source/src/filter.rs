//! Whitelist/exclude filtering of source files.
//!
//! A filter file holds one glob pattern per line, relative to the source
//! root. Lines starting with `#` are comments. A line starting with `!` is
//! an exclude pattern; any other line is a whitelist pattern. When at least
//! one whitelist pattern exists, only matching files are built.

use std::path::Path;

use glob::{MatchOptions, Pattern};

use crate::SourceError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled whitelist/exclude patterns.
#[derive(Clone, Debug, Default)]
pub struct SourceFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl SourceFilter {
    /// Load a filter from a file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds an invalid glob.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::FilterFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse filter text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::FilterPattern`] for an invalid glob.
    pub fn parse(content: &str) -> Result<Self, SourceError> {
        let mut filter = Self::default();
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (negated, raw) = match line.strip_prefix('!') {
                Some(rest) => (true, rest.trim()),
                None => (false, line),
            };
            let pattern = Pattern::new(raw).map_err(|e| SourceError::FilterPattern {
                pattern: raw.to_owned(),
                message: e.msg.to_owned(),
            })?;
            if negated {
                filter.exclude.push(pattern);
            } else {
                filter.include.push(pattern);
            }
        }
        Ok(filter)
    }

    /// Whether the filter has no patterns at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Whether a file (relative to the source root) should be built.
    #[must_use]
    pub fn allows(&self, relative: &Path) -> bool {
        let matches = |p: &Pattern| p.matches_path_with(relative, MATCH_OPTIONS);
        if self.exclude.iter().any(matches) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(matches)
    }
}

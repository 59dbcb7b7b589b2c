//! Frontmatter and title of a source document.

use quire_source::parse_frontmatter;
use serde::Deserialize;

/// Frontmatter fields understood by the build.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DocumentMeta {
    /// Page title.
    pub title: Option<String>,
    /// Named template from the meta directory.
    pub template: Option<String>,
}

/// A document split into metadata and body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedDocument<'a> {
    /// Resolved title.
    pub title: String,
    /// Named template, if any.
    pub template: Option<String>,
    /// Body without frontmatter.
    pub body: &'a str,
}

/// Parse frontmatter and resolve the title.
///
/// The title is the frontmatter `title`, else the first level-one heading
/// (`# Title` or `= Title =`), else `stem`.
#[must_use]
pub fn parse_document<'a>(content: &'a str, stem: &str) -> ParsedDocument<'a> {
    let (meta, body): (DocumentMeta, _) = parse_frontmatter(content);
    let title = meta
        .title
        .filter(|t| !t.trim().is_empty())
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| stem.to_owned());
    ParsedDocument {
        title,
        template: meta.template.filter(|t| !t.trim().is_empty()),
        body,
    }
}

fn first_heading(body: &str) -> Option<String> {
    body.lines().find_map(|line| {
        if let Some(rest) = line.strip_prefix("# ") {
            return Some(rest.trim().trim_end_matches('#').trim_end().to_owned());
        }
        let inner = line.strip_prefix("= ")?.trim_end().strip_suffix(" =")?;
        Some(inner.trim().to_owned())
    })
}

//! The render collaborator and its default implementation.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use quire_source::RenderKind;
use regex::Regex;

use crate::error::RenderError;

static WIKI_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]*))?\]\]").unwrap());

static WIKI_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(={1,6})[ \t]+(.+?)[ \t]+=+[ \t]*$").unwrap());

static COMPONENT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:import|export)\s.*$").unwrap());

/// Where a document lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderContext {
    /// Absolute directory of the document.
    pub dir: PathBuf,
    /// File name of the document.
    pub basename: String,
    /// Absolute source root.
    pub source_root: PathBuf,
}

impl RenderContext {
    /// Context for `relative` (path of the document under `source_root`).
    #[must_use]
    pub fn new(source_root: impl Into<PathBuf>, relative: impl AsRef<Path>) -> Self {
        let source_root = source_root.into();
        let relative = relative.as_ref();
        let dir = match relative.parent() {
            Some(parent) => source_root.join(parent),
            None => source_root.clone(),
        };
        let basename = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            dir,
            basename,
            source_root,
        }
    }
}

/// Renders one document body (frontmatter already removed) to HTML.
///
/// Implementations must be thread-safe: lane-eligible kinds are rendered on
/// pool threads concurrently.
pub trait Renderer: Send + Sync {
    /// Render `content` of the given kind.
    fn render(&self, content: &str, kind: RenderKind, ctx: &RenderContext) -> Result<String, RenderError>;
}

/// Built-in renderer.
///
/// - Markdown is rendered with GitHub-flavored extensions.
/// - Wiki markup is markdown with `[[target|label]]` links and `== Heading ==`
///   headings, rewritten to markdown first.
/// - Component documents are markdown whose `import`/`export` lines are
///   dropped.
#[derive(Clone, Debug, Default)]
pub struct DefaultRenderer {
    _private: (),
}

impl DefaultRenderer {
    /// Create the default renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn markdown(content: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES;
        let parser = Parser::new_ext(content, options);
        let mut out = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

impl Renderer for DefaultRenderer {
    fn render(&self, content: &str, kind: RenderKind, _ctx: &RenderContext) -> Result<String, RenderError> {
        match kind {
            RenderKind::Markdown => Ok(Self::markdown(content)),
            RenderKind::Wiki => Ok(Self::markdown(&wiki_to_markdown(content))),
            RenderKind::Component => Ok(Self::markdown(&COMPONENT_LINE_RE.replace_all(content, ""))),
            RenderKind::Static | RenderKind::Unsupported => Err(RenderError::Unsupported(kind)),
        }
    }
}

/// Rewrite wiki links and headings to markdown.
fn wiki_to_markdown(content: &str) -> String {
    let linked = WIKI_LINK_RE.replace_all(content, |caps: &regex::Captures<'_>| {
        let target = caps[1].trim();
        let label = caps
            .get(2)
            .map(|l| l.as_str().trim())
            .filter(|l| !l.is_empty())
            .unwrap_or(target);
        format!("[{label}]({})", target.replace(' ', "%20"))
    });
    WIKI_HEADING_RE
        .replace_all(&linked, |caps: &regex::Captures<'_>| {
            format!("{} {}", "#".repeat(caps[1].len()), &caps[2])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> RenderContext {
        RenderContext::new("/src", "guide/page.md")
    }

    #[test]
    fn test_context_paths() {
        let ctx = ctx();
        assert_eq!(ctx.dir, PathBuf::from("/src/guide"));
        assert_eq!(ctx.basename, "page.md");
        assert_eq!(ctx.source_root, PathBuf::from("/src"));

        let top = RenderContext::new("/src", "index.md");
        assert_eq!(top.dir, PathBuf::from("/src"));
    }

    #[test]
    fn test_markdown() {
        let html = DefaultRenderer::new()
            .render("# Title\n\n| a |\n|---|\n| 1 |\n", RenderKind::Markdown, &ctx())
            .unwrap();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_wiki_links_and_headings() {
        assert_eq!(
            wiki_to_markdown("== Setup ==\nSee [[install|the installer]] and [[api ref]]."),
            "## Setup\nSee [the installer](install) and [api ref](api%20ref)."
        );

        let html = DefaultRenderer::new()
            .render("= Top =\n[[b]]", RenderKind::Wiki, &ctx())
            .unwrap();
        assert!(html.contains("<h1>Top</h1>"));
        assert!(html.contains("<a href=\"b\">b</a>"));
    }

    #[test]
    fn test_component_drops_module_lines() {
        let html = DefaultRenderer::new()
            .render(
                "import Chart from './chart'\nexport const meta = {}\n\n# Charts\n",
                RenderKind::Component,
                &ctx(),
            )
            .unwrap();
        assert_eq!(html.trim(), "<h1>Charts</h1>");
    }

    #[test]
    fn test_static_is_unsupported() {
        let err = DefaultRenderer::new()
            .render("x", RenderKind::Static, &ctx())
            .unwrap_err();
        assert!(matches!(err, RenderError::Unsupported(RenderKind::Static)));
    }
}

//! Page templates.
//!
//! Templates come from the meta directory:
//!
//! ```text
//! <meta>/
//! +-- template.html        # default page template
//! +-- templates/
//! |   +-- wide.html        # selected with `template: wide`
//! +-- footer.md            # rendered into {{footer}}
//! ```
//!
//! Tokens are `{{title}}`, `{{content}}`, `{{menu}}`, `{{footer}}`,
//! `{{path}}` and `{{menu_position}}`. Substitution is a single pass, so a
//! token appearing inside inserted content is left alone.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use quire_source::RenderKind;
use regex::{Captures, Regex};

use crate::error::RenderError;
use crate::renderer::{RenderContext, Renderer};

/// Template used when the meta directory has no `template.html`.
pub const BUILTIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}}</title>
</head>
<body class="menu-{{menu_position}}" data-path="{{path}}">
<aside>
{{menu}}
</aside>
<main>
<article>
{{content}}
</article>
</main>
<footer>
{{footer}}
</footer>
</body>
</html>
"#;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").unwrap());

/// Values substituted into a template.
#[derive(Clone, Copy, Debug)]
pub struct PageContext<'a> {
    /// Page title (escaped on insertion).
    pub title: &'a str,
    /// Rendered document HTML.
    pub content: &'a str,
    /// Menu HTML.
    pub menu: &'a str,
    /// Footer HTML.
    pub footer: &'a str,
    /// Site path of the page.
    pub path: &'a str,
    /// `side` or `top`.
    pub menu_position: &'a str,
}

/// One page template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    /// Wrap template source.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Template source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute every known token. Unknown tokens are kept.
    #[must_use]
    pub fn render(&self, page: &PageContext<'_>) -> String {
        TOKEN_RE
            .replace_all(&self.source, |caps: &Captures<'_>| match &caps[1] {
                "title" => escape(page.title),
                "content" => page.content.to_owned(),
                "menu" => page.menu.to_owned(),
                "footer" => page.footer.to_owned(),
                "path" => escape(page.path),
                "menu_position" => page.menu_position.to_owned(),
                _ => caps[0].to_owned(),
            })
            .into_owned()
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new(BUILTIN_TEMPLATE)
    }
}

/// The default template, named templates and rendered footer.
#[derive(Clone, Debug, Default)]
pub struct Templates {
    default: Template,
    named: BTreeMap<String, Template>,
    footer: String,
}

impl Templates {
    /// Load templates and footer from the meta directory.
    ///
    /// Missing files fall back to the built-in template and an empty footer.
    /// Unreadable files are logged and treated as missing.
    #[must_use]
    pub fn load(meta_dir: Option<&Path>, renderer: &dyn Renderer) -> Self {
        let Some(meta_dir) = meta_dir else {
            return Self::default();
        };

        let default = read_optional(&meta_dir.join("template.html"))
            .map(Template::new)
            .unwrap_or_default();

        let mut named = BTreeMap::new();
        let templates_dir = meta_dir.join("templates");
        if let Ok(entries) = std::fs::read_dir(&templates_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("html") {
                    continue;
                }
                let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                    continue;
                };
                if let Some(source) = read_optional(&path) {
                    named.insert(name, Template::new(source));
                }
            }
        }

        let footer = read_optional(&meta_dir.join("footer.md"))
            .map(|md| {
                let ctx = RenderContext::new(meta_dir, "footer.md");
                renderer
                    .render(&md, RenderKind::Markdown, &ctx)
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Failed to render footer");
                        String::new()
                    })
            })
            .unwrap_or_default();

        tracing::debug!(named = named.len(), "Loaded templates");
        Self {
            default,
            named,
            footer,
        }
    }

    /// Build from parts.
    #[must_use]
    pub fn from_parts(default: Template, named: BTreeMap<String, Template>, footer: impl Into<String>) -> Self {
        Self {
            default,
            named,
            footer: footer.into(),
        }
    }

    /// The template for a page: the named one if requested, else the
    /// default. A requested name that does not exist is an error.
    pub fn resolve(&self, name: Option<&str>) -> Result<&Template, RenderError> {
        match name {
            None => Ok(&self.default),
            Some(name) => self
                .named
                .get(name)
                .ok_or_else(|| RenderError::TemplateNotFound(name.to_owned())),
        }
    }

    /// Rendered footer HTML.
    #[must_use]
    pub fn footer(&self) -> &str {
        &self.footer
    }

    /// Everything that affects page output, for fingerprinting.
    #[must_use]
    pub fn fingerprint_source(&self) -> String {
        let mut out = String::with_capacity(self.default.source.len() + self.footer.len());
        out.push_str(&self.default.source);
        for (name, template) in &self.named {
            out.push('\0');
            out.push_str(name);
            out.push('\0');
            out.push_str(&template.source);
        }
        out.push('\0');
        out.push_str(&self.footer);
        out
    }
}

fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read template file");
            None
        }
    }
}

fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

//! Valid site paths and hyperlink resolution.
//!
//! The [`ValidPathSet`] is built once per build from every document and
//! asset, before any link is resolved. Resolution never fails: an internal
//! link that does not match a known path is kept and flagged inactive so the
//! author can find it, while external links pass through untouched.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use quire_source::RenderKind;
use regex::{Captures, Regex};

const EXTERNAL_PREFIXES: &[&str] = &[
    "http://",
    "https://",
    "//",
    "mailto:",
    "tel:",
    "javascript:",
    "data:",
    "#",
];

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>").unwrap());

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Set of lowercase site paths that exist in the generated site.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidPathSet {
    paths: HashSet<String>,
}

impl ValidPathSet {
    /// Build the set from document and directory paths.
    ///
    /// `articles` are extensionless document paths (`/a/b`, `/a/index`). Each
    /// registers itself and its `.html` form; an `index` document also
    /// registers its directory with and without trailing slash.
    /// `directories` are directory paths that have an index document.
    #[must_use]
    pub fn build<A, D>(articles: A, directories: D) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let mut set = Self::default();
        for article in articles {
            set.insert_article(article.as_ref());
        }
        for dir in directories {
            set.insert_directory(dir.as_ref());
        }
        set
    }

    /// Rebuild from a cached list of paths.
    #[must_use]
    pub fn from_paths(paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            paths: paths.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Register a document path.
    pub fn insert_article(&mut self, path: &str) {
        let path = path.to_lowercase();
        self.paths.insert(format!("{path}.html"));
        if let Some(dir) = path.strip_suffix("/index") {
            self.insert_directory(dir);
        }
        self.paths.insert(path);
    }

    /// Register a directory that has an index document.
    pub fn insert_directory(&mut self, dir: &str) {
        let dir = dir.trim_end_matches('/').to_lowercase();
        if dir.is_empty() {
            self.paths.insert("/".to_owned());
            self.paths.insert("/index.html".to_owned());
            return;
        }
        self.paths.insert(format!("{dir}/index.html"));
        self.paths.insert(format!("{dir}/"));
        self.paths.insert(dir);
    }

    /// Register a file path verbatim (static assets).
    pub fn insert_file(&mut self, path: &str) {
        self.paths.insert(path.to_lowercase());
    }

    /// Case-insensitive membership test.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(&path.to_lowercase())
    }

    /// Number of registered paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no paths are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// All paths, sorted (for persistence).
    #[must_use]
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.paths.iter().cloned().collect();
        paths.sort();
        paths
    }
}

/// Outcome of resolving one href.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Href to write back into the document.
    pub href: String,
    /// Whether the link points at a known path (always true for external).
    pub active: bool,
    /// Whether the link was left alone as external.
    pub external: bool,
}

impl ResolvedLink {
    fn external(href: &str) -> Self {
        Self {
            href: href.to_owned(),
            active: true,
            external: true,
        }
    }
}

/// Resolve an href found in the document served at `current` (e.g.
/// `/a/index.html`).
#[must_use]
pub fn resolve_href(href: &str, current: &str, valid: &ValidPathSet) -> ResolvedLink {
    let trimmed = href.trim();
    if trimmed.is_empty() || EXTERNAL_PREFIXES.iter().any(|p| starts_with_ci(trimmed, p)) {
        return ResolvedLink::external(href);
    }

    let split = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    let (path_part, suffix) = trimmed.split_at(split);
    if path_part.is_empty() {
        return ResolvedLink::external(href);
    }

    let absolute = if path_part.starts_with('/') {
        normalize(path_part)
    } else {
        normalize(&format!("{}/{path_part}", parent_dir(current)))
    };

    match RenderKind::from_path(Path::new(&absolute)) {
        // A recognized extension is looked up exactly as written
        kind if kind.is_document() || kind == RenderKind::Static => {
            if valid.contains(&absolute) {
                active(format!("{absolute}{suffix}"))
            } else {
                inactive(href.to_owned())
            }
        }
        _ => {
            let candidates = if absolute.ends_with('/') {
                vec![format!("{absolute}index.html")]
            } else {
                vec![format!("{absolute}.html"), format!("{absolute}/index.html")]
            };
            match candidates.into_iter().find(|c| valid.contains(c)) {
                Some(found) => active(format!("{found}{suffix}")),
                None => inactive(format!("{absolute}{suffix}")),
            }
        }
    }
}

fn active(href: String) -> ResolvedLink {
    ResolvedLink {
        href,
        active: true,
        external: false,
    }
}

fn inactive(href: String) -> ResolvedLink {
    ResolvedLink {
        href,
        active: false,
        external: false,
    }
}

fn starts_with_ci(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Directory part of a site path, without trailing slash.
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Resolve `.` and `..` segments and collapse repeated slashes.
///
/// `..` at the root is ignored. A trailing slash is preserved.
fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    let trailing = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");
    let mut out = format!("/{}", segments.join("/"));
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    out
}

/// Link counts from one [`rewrite_links`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Anchors with an href.
    pub total: usize,
    /// Internal links that did not resolve.
    pub inactive: usize,
}

/// Rewrite every anchor href in `html` for a document served at `current`.
///
/// Resolved internal links get their absolute form; unresolved ones also get
/// an `inactive` class token.
#[must_use]
pub fn rewrite_links(html: &str, current: &str, valid: &ValidPathSet) -> (String, LinkStats) {
    let mut stats = LinkStats::default();
    let rewritten = ANCHOR_RE.replace_all(html, |caps: &Captures<'_>| {
        let tag = &caps[0];
        let Some(href_caps) = HREF_RE.captures(tag) else {
            return tag.to_owned();
        };
        let Some(value) = href_caps.get(1).or_else(|| href_caps.get(2)) else {
            return tag.to_owned();
        };
        stats.total += 1;

        let resolved = resolve_href(value.as_str(), current, valid);
        if resolved.external {
            return tag.to_owned();
        }

        let mut out = String::with_capacity(tag.len() + 16);
        out.push_str(&tag[..value.start()]);
        out.push_str(&escape_attr(&resolved.href));
        out.push_str(&tag[value.end()..]);

        if resolved.active {
            out
        } else {
            stats.inactive += 1;
            add_inactive_class(&out)
        }
    });
    (rewritten.into_owned(), stats)
}

fn add_inactive_class(tag: &str) -> String {
    if let Some(caps) = CLASS_RE.captures(tag)
        && let Some(value) = caps.get(1).or_else(|| caps.get(2))
    {
        if value.as_str().split_whitespace().any(|c| c == "inactive") {
            return tag.to_owned();
        }
        let separator = if value.as_str().trim().is_empty() { "" } else { " " };
        return format!(
            "{}{}{separator}inactive{}",
            &tag[..value.start()],
            value.as_str(),
            &tag[value.end()..]
        );
    }
    let insert_at = tag.len() - 1;
    format!("{} class=\"inactive\">", tag[..insert_at].trim_end())
}

fn escape_attr(value: &str) -> String {
    value.replace('"', "&quot;")
}

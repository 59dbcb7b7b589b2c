//! File classification.
//!
//! Every file in the source tree maps to exactly one [`RenderKind`]. The set
//! is closed: extensions nobody knows how to handle become
//! [`RenderKind::Unsupported`] instead of being dropped on the floor.

use std::path::Path;

/// Name of the hidden cache directory kept inside each source root.
pub const CACHE_DIR_NAME: &str = ".quire";

/// Menu override file names, highest priority first.
pub const MENU_OVERRIDE_NAMES: &[&str] = &["_menu.md", "_menu.wiki"];

/// File names that set the icon of the folder they live in.
pub const ICON_FILE_NAMES: &[&str] = &["icon.svg", "icon.png"];

/// Directory names that never hold documentation.
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "vendor",
    "__pycache__",
];

/// Extensions copied verbatim to the output tree.
const STATIC_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "bmp", "css", "js", "mjs", "map",
    "json", "txt", "pdf", "zip", "csv", "xml", "woff", "woff2", "ttf", "otf", "eot", "mp4",
    "webm", "mp3", "wav", "html", "htm",
];

/// Extensions treated as images by the stat-keyed copy cache.
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "bmp",
];

/// How a source file is turned into output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderKind {
    /// Wiki markup (`.wiki`).
    Wiki,
    /// Markdown (`.md`, `.markdown`).
    Markdown,
    /// Component document (`.mdx`). Needs cross-file import resolution, so it
    /// is rendered on the control thread instead of a lane.
    Component,
    /// Copied verbatim.
    Static,
    /// Extension with no known handler.
    Unsupported,
}

impl RenderKind {
    /// Classify a path by its extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
            return Self::Unsupported;
        };
        match ext.as_str() {
            "wiki" => Self::Wiki,
            "md" | "markdown" => Self::Markdown,
            "mdx" => Self::Component,
            e if STATIC_EXTENSIONS.contains(&e) => Self::Static,
            _ => Self::Unsupported,
        }
    }

    /// Whether files of this kind are rendered to HTML pages.
    #[must_use]
    pub fn is_document(self) -> bool {
        matches!(self, Self::Wiki | Self::Markdown | Self::Component)
    }

    /// Whether this kind may be rendered on a parallel lane.
    #[must_use]
    pub fn lane_eligible(self) -> bool {
        matches!(self, Self::Wiki | Self::Markdown)
    }

    /// Stable lowercase name used in logs and error reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wiki => "wiki",
            Self::Markdown => "markdown",
            Self::Component => "component",
            Self::Static => "static",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for RenderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a static file is an image (eligible for the image cache).
#[must_use]
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Whether the file is a document named `index`.
#[must_use]
pub fn is_index_file(path: &Path) -> bool {
    RenderKind::from_path(path).is_document()
        && path
            .file_stem()
            .is_some_and(|s| s.eq_ignore_ascii_case("index"))
}

/// Whether the file name is one of the menu override names.
#[must_use]
pub fn is_menu_override(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| MENU_OVERRIDE_NAMES.contains(&n))
}

/// Whether the file name is one of the folder icon names.
#[must_use]
pub fn is_icon_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| ICON_FILE_NAMES.contains(&n))
}

/// Whether an entry with this name is excluded from scanning.
///
/// Hidden (`.`) and underscore-prefixed names are never content. Directory
/// names from the skip list are excluded only when `is_dir` is set.
#[must_use]
pub fn is_skipped_name(name: &str, is_dir: bool) -> bool {
    name.starts_with('.')
        || name.starts_with('_')
        || (is_dir && SKIPPED_DIRS.contains(&name.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_kind_from_path() {
        assert_eq!(RenderKind::from_path(Path::new("a.wiki")), RenderKind::Wiki);
        assert_eq!(RenderKind::from_path(Path::new("a.md")), RenderKind::Markdown);
        assert_eq!(
            RenderKind::from_path(Path::new("a.Markdown")),
            RenderKind::Markdown
        );
        assert_eq!(
            RenderKind::from_path(Path::new("a.mdx")),
            RenderKind::Component
        );
        assert_eq!(RenderKind::from_path(Path::new("a.PNG")), RenderKind::Static);
        assert_eq!(
            RenderKind::from_path(Path::new("a.exe")),
            RenderKind::Unsupported
        );
        assert_eq!(
            RenderKind::from_path(Path::new("Makefile")),
            RenderKind::Unsupported
        );
    }

    #[test]
    fn test_lane_eligibility() {
        assert!(RenderKind::Wiki.lane_eligible());
        assert!(RenderKind::Markdown.lane_eligible());
        assert!(!RenderKind::Component.lane_eligible());
        assert!(!RenderKind::Static.lane_eligible());
    }

    #[test]
    fn test_is_index_file() {
        assert!(is_index_file(Path::new("docs/a/index.md")));
        assert!(is_index_file(Path::new("INDEX.wiki")));
        assert!(!is_index_file(Path::new("index.png")));
        assert!(!is_index_file(Path::new("indexes.md")));
    }

    #[test]
    fn test_special_names() {
        assert!(is_menu_override(Path::new("/docs/_menu.md")));
        assert!(!is_menu_override(Path::new("/docs/menu.md")));
        assert!(is_icon_file(Path::new("a/icon.svg")));
        assert!(is_image(Path::new("a/photo.JPG")));
        assert!(!is_image(Path::new("a/style.css")));
    }

    #[test]
    fn test_is_skipped_name() {
        assert!(is_skipped_name(".git", true));
        assert!(is_skipped_name("_drafts", true));
        assert!(is_skipped_name("node_modules", true));
        assert!(!is_skipped_name("build", false));
        assert!(!is_skipped_name("guide", true));
    }
}

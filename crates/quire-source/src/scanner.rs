//! Source tree discovery by filesystem walking.
//!
//! The scanner is the only place that decides what counts as content. It
//! records documents and static files as [`SourceFile`]s, and remembers the
//! navigation-relevant files (index files, folder configs, menu overrides,
//! icons) per directory so later phases never touch the disk to find them.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::SourceError;
use crate::filter::SourceFilter;
use crate::kind::{RenderKind, is_icon_file, is_index_file, is_menu_override, is_skipped_name};

/// What a discovered path is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Rendered to an HTML page.
    Document,
    /// A folder in the source tree.
    Directory,
    /// Copied verbatim.
    Static,
}

/// A document or static file found by the scanner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the source root.
    pub relative: PathBuf,
    /// Document or static.
    pub kind: SourceKind,
    /// Extension-derived render kind.
    pub render_kind: RenderKind,
    /// Site path: extensionless for documents (`/a/b`), verbatim for static
    /// files (`/img/logo.png`).
    pub url_path: String,
}

impl SourceFile {
    /// Link target of the generated output (`/a/b.html` for documents).
    #[must_use]
    pub fn href(&self) -> String {
        match self.kind {
            SourceKind::Document => format!("{}.html", self.url_path),
            SourceKind::Directory | SourceKind::Static => self.url_path.clone(),
        }
    }

    /// Output path relative to the output root.
    #[must_use]
    pub fn output_relative(&self) -> PathBuf {
        match self.kind {
            SourceKind::Document => self.relative.with_extension("html"),
            SourceKind::Directory | SourceKind::Static => self.relative.clone(),
        }
    }

    /// Whether this document is an index file.
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.kind == SourceKind::Document && is_index_file(&self.relative)
    }
}

/// A directory found by the scanner, with its navigation-relevant files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceDir {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the source root (empty for the root).
    pub relative: PathBuf,
    /// Site path (`/` for the root, `/a/b` otherwise).
    pub url_path: String,
    /// Relative path of the index document, if any.
    pub index: Option<PathBuf>,
    /// Absolute path of the folder config file, if any.
    pub config: Option<PathBuf>,
    /// Absolute path of the highest-priority menu override, if any.
    pub menu_override: Option<PathBuf>,
    /// Absolute path of the folder icon, if any.
    pub icon: Option<PathBuf>,
    /// Relative paths of scanned subdirectories, sorted.
    pub subdirs: Vec<PathBuf>,
    /// Relative paths of documents directly inside, sorted (index included).
    pub documents: Vec<PathBuf>,
}

impl SourceDir {
    /// Directory name used as default label (empty for the root).
    #[must_use]
    pub fn name(&self) -> String {
        self.relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Everything discovered in one scan.
#[derive(Clone, Debug, Default)]
pub struct SourceTree {
    /// Absolute source root.
    pub root: PathBuf,
    /// Documents and static files, sorted by relative path.
    pub files: Vec<SourceFile>,
    /// Directories keyed by relative path (root is the empty path).
    pub directories: HashMap<PathBuf, SourceDir>,
    /// Absolute paths of navigation-relevant files, sorted.
    pub nav_files: Vec<PathBuf>,
    /// Absolute paths of files with no known handler.
    pub unsupported: Vec<PathBuf>,
    file_index: HashMap<PathBuf, usize>,
}

impl SourceTree {
    /// Look up a file by its path relative to the source root.
    #[must_use]
    pub fn file(&self, relative: &Path) -> Option<&SourceFile> {
        self.file_index.get(relative).map(|&i| &self.files[i])
    }

    /// Look up a directory by its path relative to the source root.
    #[must_use]
    pub fn dir(&self, relative: &Path) -> Option<&SourceDir> {
        self.directories.get(relative)
    }

    /// The root directory entry.
    #[must_use]
    pub fn root_dir(&self) -> Option<&SourceDir> {
        self.directories.get(Path::new(""))
    }

    /// All documents in relative-path order.
    pub fn documents(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.kind == SourceKind::Document)
    }

    /// All static files in relative-path order.
    pub fn static_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.kind == SourceKind::Static)
    }

    /// Directories that contain an index document, sorted by relative path.
    #[must_use]
    pub fn indexed_directories(&self) -> Vec<&SourceDir> {
        let mut dirs: Vec<_> = self
            .directories
            .values()
            .filter(|d| d.index.is_some())
            .collect();
        dirs.sort_by(|a, b| a.relative.cmp(&b.relative));
        dirs
    }

    /// Sorted relative paths of every file the build depends on.
    ///
    /// Feeds the order-independent file-list hash of the navigation cache.
    #[must_use]
    pub fn listing(&self) -> Vec<String> {
        let mut all: BTreeSet<String> = self
            .files
            .iter()
            .map(|f| slash_path(&f.relative))
            .collect();
        for nav in &self.nav_files {
            if let Ok(rel) = nav.strip_prefix(&self.root) {
                all.insert(slash_path(rel));
            }
        }
        all.into_iter().collect()
    }

    /// Relative path of a file below the root, if it is inside it.
    #[must_use]
    pub fn relative_of(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.root).ok().map(Path::to_path_buf)
    }
}

/// Walks a source root and builds a [`SourceTree`].
pub struct Scanner {
    source_dir: PathBuf,
    meta_filename: String,
    filter: SourceFilter,
    excluded: Vec<PathBuf>,
}

impl Scanner {
    /// Create a scanner for `source_dir`.
    ///
    /// `meta_filename` is the per-folder config file name (e.g. `meta.yaml`).
    #[must_use]
    pub fn new(source_dir: PathBuf, meta_filename: impl Into<String>) -> Self {
        Self {
            source_dir,
            meta_filename: meta_filename.into(),
            filter: SourceFilter::default(),
            excluded: Vec::new(),
        }
    }

    /// Restrict documents and static files with a whitelist/exclude filter.
    #[must_use]
    pub fn with_filter(mut self, filter: SourceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Never descend into `dir` (an output directory nested in the source).
    #[must_use]
    pub fn exclude_dir(mut self, dir: PathBuf) -> Self {
        self.excluded.push(dir);
        self
    }

    /// Scan the source tree.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unreadable`] if the source root itself cannot be
    /// listed. Unreadable subdirectories are logged and skipped.
    pub fn scan(&self) -> Result<SourceTree, SourceError> {
        let entries = fs::read_dir(&self.source_dir).map_err(|source| SourceError::Unreadable {
            path: self.source_dir.clone(),
            source,
        })?;

        let mut tree = SourceTree {
            root: self.source_dir.clone(),
            ..SourceTree::default()
        };
        self.scan_entries(entries, &self.source_dir, Path::new(""), &mut tree);

        tree.files.sort_by(|a, b| a.relative.cmp(&b.relative));
        tree.file_index = tree
            .files
            .iter()
            .enumerate()
            .map(|(i, f)| (f.relative.clone(), i))
            .collect();
        tree.nav_files.sort();
        tree.unsupported.sort();

        tracing::debug!(
            files = tree.files.len(),
            directories = tree.directories.len(),
            "Scanned source tree"
        );
        Ok(tree)
    }

    fn scan_entries(
        &self,
        entries: fs::ReadDir,
        dir_path: &Path,
        relative: &Path,
        tree: &mut SourceTree,
    ) {
        // Cache file type and name to avoid repeated stat calls
        let mut entries: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| {
                let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
                let name = e.file_name().to_string_lossy().into_owned();
                (e.path(), is_dir, name)
            })
            .collect();
        entries.sort_by(|a, b| a.2.cmp(&b.2));

        let mut dir = SourceDir {
            path: dir_path.to_path_buf(),
            relative: relative.to_path_buf(),
            url_path: dir_url_path(relative),
            ..SourceDir::default()
        };

        for (path, is_dir, name) in entries {
            let rel = relative.join(&name);

            if !is_dir && is_menu_override(&path) {
                // Keep the highest-priority override only
                let better = dir.menu_override.as_ref().is_none_or(|current| {
                    override_rank(&path) < override_rank(current)
                });
                if better {
                    dir.menu_override = Some(path.clone());
                }
                tree.nav_files.push(path);
                continue;
            }

            if is_skipped_name(&name, is_dir) {
                continue;
            }

            if is_dir {
                if self.excluded.contains(&path) {
                    continue;
                }
                match fs::read_dir(&path) {
                    Ok(children) => {
                        dir.subdirs.push(rel.clone());
                        self.scan_entries(children, &path, &rel, tree);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable directory");
                    }
                }
                continue;
            }

            if name == self.meta_filename {
                dir.config = Some(path.clone());
                tree.nav_files.push(path);
                continue;
            }

            let render_kind = RenderKind::from_path(&path);
            if render_kind == RenderKind::Unsupported {
                tree.unsupported.push(path);
                continue;
            }
            if !self.filter.allows(&rel) {
                tracing::debug!(path = %rel.display(), "Excluded by filter");
                continue;
            }

            let kind = if render_kind.is_document() {
                SourceKind::Document
            } else {
                SourceKind::Static
            };

            if kind == SourceKind::Document {
                if is_index_file(&rel) && dir.index.is_none() {
                    dir.index = Some(rel.clone());
                    tree.nav_files.push(path.clone());
                }
                dir.documents.push(rel.clone());
            } else if is_icon_file(&path) {
                if dir.icon.is_none() {
                    dir.icon = Some(path.clone());
                }
                tree.nav_files.push(path.clone());
            }

            tree.files.push(SourceFile {
                url_path: file_url_path(&rel, kind),
                path,
                relative: rel,
                kind,
                render_kind,
            });
        }

        tree.directories.insert(relative.to_path_buf(), dir);
    }
}

fn override_rank(path: &Path) -> usize {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    crate::kind::MENU_OVERRIDE_NAMES
        .iter()
        .position(|n| *n == name)
        .unwrap_or(usize::MAX)
}

/// Join path components with `/`.
fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn dir_url_path(relative: &Path) -> String {
    format!("/{}", slash_path(relative))
}

/// Site path of a file relative to the source root.
///
/// Examples:
/// - `guide.md` -> `/guide`
/// - `a/index.md` -> `/a/index`
/// - `img/logo.png` (static) -> `/img/logo.png`
#[must_use]
pub fn file_url_path(relative: &Path, kind: SourceKind) -> String {
    match kind {
        SourceKind::Document => format!("/{}", slash_path(&relative.with_extension(""))),
        SourceKind::Directory => dir_url_path(relative),
        SourceKind::Static => format!("/{}", slash_path(relative)),
    }
}

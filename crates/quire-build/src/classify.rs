//! Change classification for dev mode.
//!
//! A file-watch event becomes exactly one [`RebuildAction`]. Pending
//! actions are merged in [`PendingActions`] so a burst of events results in
//! the least work that still covers all of them.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use quire_config::Config;
use quire_source::{
    CACHE_DIR_NAME, ChangeEvent, ChangeKind, RenderKind, is_icon_file, is_index_file,
    is_menu_override, is_skipped_name,
};

/// What a change requires.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RebuildAction {
    /// Templates or configuration changed: rebuild every document.
    FullRebuild,
    /// Navigation changed: recompute menus and valid paths, then build.
    NavRebuild,
    /// One document's content changed.
    SingleFileRebuild(PathBuf),
    /// One static asset changed.
    StaticCopy(PathBuf),
    /// Nothing to do.
    Ignore,
}

impl RebuildAction {
    /// Ordering used when merging: a stronger action covers a weaker one.
    #[must_use]
    pub fn strength(&self) -> u8 {
        match self {
            Self::FullRebuild => 4,
            Self::NavRebuild => 3,
            Self::SingleFileRebuild(_) => 2,
            Self::StaticCopy(_) => 1,
            Self::Ignore => 0,
        }
    }
}

/// Paths the classifier needs to know about.
#[derive(Clone, Debug, Default)]
pub struct SiteLayout {
    /// Source root.
    pub source_dir: PathBuf,
    /// Meta directory (templates, footer).
    pub meta_dir: Option<PathBuf>,
    /// Output root.
    pub output_dir: PathBuf,
    /// Configuration file in use.
    pub config_file: Option<PathBuf>,
    /// Per-folder config file name.
    pub meta_filename: String,
}

impl SiteLayout {
    /// Layout of a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let build = &config.build_resolved;
        Self {
            source_dir: build.source_dir.clone(),
            meta_dir: build.meta_dir.clone(),
            output_dir: build.output_dir.clone(),
            config_file: config.config_path.clone(),
            meta_filename: config.metadata.name.clone(),
        }
    }

    fn cache_dir(&self) -> PathBuf {
        self.source_dir.join(CACHE_DIR_NAME)
    }
}

/// Decide what a single change requires.
#[must_use]
pub fn classify(event: &ChangeEvent, layout: &SiteLayout) -> RebuildAction {
    let path = event.path.as_path();

    if path.starts_with(&layout.output_dir) || path.starts_with(layout.cache_dir()) {
        return RebuildAction::Ignore;
    }
    if layout.config_file.as_deref() == Some(path) {
        return RebuildAction::FullRebuild;
    }
    if layout.meta_dir.as_ref().is_some_and(|meta| path.starts_with(meta)) {
        return RebuildAction::FullRebuild;
    }
    let Ok(relative) = path.strip_prefix(&layout.source_dir) else {
        return RebuildAction::Ignore;
    };
    let Some(name) = relative.file_name().and_then(|n| n.to_str()) else {
        return RebuildAction::Ignore;
    };

    if in_skipped_dir(relative) {
        return RebuildAction::Ignore;
    }
    if is_menu_override(path) || name == layout.meta_filename {
        return RebuildAction::NavRebuild;
    }
    if is_skipped_name(name, false) {
        return RebuildAction::Ignore;
    }

    match RenderKind::from_path(path) {
        kind if kind.is_document() => {
            if is_index_file(relative) || event.kind != ChangeKind::Modified {
                RebuildAction::NavRebuild
            } else {
                RebuildAction::SingleFileRebuild(event.path.clone())
            }
        }
        RenderKind::Static => {
            if is_icon_file(path) || event.kind == ChangeKind::Removed {
                RebuildAction::NavRebuild
            } else {
                RebuildAction::StaticCopy(event.path.clone())
            }
        }
        _ => {
            // A removed directory has no extension and no longer exists to stat
            let directory_gone = event.kind == ChangeKind::Removed && path.extension().is_none();
            if directory_gone {
                RebuildAction::NavRebuild
            } else {
                RebuildAction::Ignore
            }
        }
    }
}

fn in_skipped_dir(relative: &Path) -> bool {
    let Some(parent) = relative.parent() else {
        return false;
    };
    parent.components().any(|c| match c {
        Component::Normal(name) => is_skipped_name(&name.to_string_lossy(), true),
        _ => true,
    })
}

/// Actions waiting to run, merged so the strongest wins.
///
/// A full or navigation rebuild covers every single-file action, so those
/// are dropped once one is pending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingActions {
    full: bool,
    nav: bool,
    documents: BTreeSet<PathBuf>,
    statics: BTreeSet<PathBuf>,
}

impl PendingActions {
    /// Add one action.
    pub fn merge(&mut self, action: RebuildAction) {
        match action {
            RebuildAction::FullRebuild => self.full = true,
            RebuildAction::NavRebuild => self.nav = true,
            RebuildAction::SingleFileRebuild(path) => {
                self.documents.insert(path);
            }
            RebuildAction::StaticCopy(path) => {
                self.statics.insert(path);
            }
            RebuildAction::Ignore => {}
        }
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.full && !self.nav && self.documents.is_empty() && self.statics.is_empty()
    }

    /// Take the merged actions, leaving the queue empty.
    pub fn take(&mut self) -> Vec<RebuildAction> {
        let pending = std::mem::take(self);
        if pending.full {
            return vec![RebuildAction::FullRebuild];
        }
        if pending.nav {
            return vec![RebuildAction::NavRebuild];
        }
        pending
            .documents
            .into_iter()
            .map(RebuildAction::SingleFileRebuild)
            .chain(pending.statics.into_iter().map(RebuildAction::StaticCopy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout() -> SiteLayout {
        SiteLayout {
            source_dir: PathBuf::from("/p/docs"),
            meta_dir: Some(PathBuf::from("/p/meta")),
            output_dir: PathBuf::from("/p/site"),
            config_file: Some(PathBuf::from("/p/quire.toml")),
            meta_filename: "meta.yaml".to_owned(),
        }
    }

    fn action(path: &str, kind: ChangeKind) -> RebuildAction {
        classify(&ChangeEvent::new(path, kind), &layout())
    }

    #[test]
    fn test_meta_and_config_changes_rebuild_everything() {
        assert_eq!(action("/p/meta/template.html", ChangeKind::Modified), RebuildAction::FullRebuild);
        assert_eq!(action("/p/quire.toml", ChangeKind::Modified), RebuildAction::FullRebuild);
    }

    #[test]
    fn test_navigation_relevant_files() {
        assert_eq!(action("/p/docs/a/index.md", ChangeKind::Modified), RebuildAction::NavRebuild);
        assert_eq!(action("/p/docs/a/meta.yaml", ChangeKind::Modified), RebuildAction::NavRebuild);
        assert_eq!(action("/p/docs/a/_menu.md", ChangeKind::Created), RebuildAction::NavRebuild);
        assert_eq!(action("/p/docs/a/icon.svg", ChangeKind::Modified), RebuildAction::NavRebuild);
        assert_eq!(action("/p/docs/a/new.md", ChangeKind::Created), RebuildAction::NavRebuild);
        assert_eq!(action("/p/docs/a/old.wiki", ChangeKind::Removed), RebuildAction::NavRebuild);
        assert_eq!(action("/p/docs/a", ChangeKind::Removed), RebuildAction::NavRebuild);
    }

    #[test]
    fn test_document_and_static_changes() {
        assert_eq!(
            action("/p/docs/a/page.md", ChangeKind::Modified),
            RebuildAction::SingleFileRebuild(PathBuf::from("/p/docs/a/page.md"))
        );
        assert_eq!(
            action("/p/docs/img/logo.png", ChangeKind::Created),
            RebuildAction::StaticCopy(PathBuf::from("/p/docs/img/logo.png"))
        );
        assert_eq!(action("/p/docs/img/logo.png", ChangeKind::Removed), RebuildAction::NavRebuild);
    }

    #[test]
    fn test_ignored_paths() {
        assert_eq!(action("/p/site/index.html", ChangeKind::Modified), RebuildAction::Ignore);
        assert_eq!(action("/p/docs/.quire/nav-cache.json", ChangeKind::Modified), RebuildAction::Ignore);
        assert_eq!(action("/p/docs/.git/HEAD", ChangeKind::Modified), RebuildAction::Ignore);
        assert_eq!(action("/p/docs/node_modules/x/readme.md", ChangeKind::Modified), RebuildAction::Ignore);
        assert_eq!(action("/p/docs/_draft.md", ChangeKind::Modified), RebuildAction::Ignore);
        assert_eq!(action("/p/docs/tool.exe", ChangeKind::Created), RebuildAction::Ignore);
        assert_eq!(action("/elsewhere/a.md", ChangeKind::Modified), RebuildAction::Ignore);
    }

    #[test]
    fn test_output_inside_source_is_ignored() {
        let layout = SiteLayout {
            output_dir: PathBuf::from("/p/docs/out"),
            ..layout()
        };
        let event = ChangeEvent::new("/p/docs/out/page.md", ChangeKind::Modified);
        assert_eq!(classify(&event, &layout), RebuildAction::Ignore);
    }

    #[test]
    fn test_pending_strongest_wins() {
        let mut pending = PendingActions::default();
        pending.merge(RebuildAction::SingleFileRebuild(PathBuf::from("/p/docs/a.md")));
        pending.merge(RebuildAction::NavRebuild);
        pending.merge(RebuildAction::StaticCopy(PathBuf::from("/p/docs/x.png")));
        assert_eq!(pending.take(), vec![RebuildAction::NavRebuild]);
        assert!(pending.is_empty());

        pending.merge(RebuildAction::NavRebuild);
        pending.merge(RebuildAction::FullRebuild);
        assert_eq!(pending.take(), vec![RebuildAction::FullRebuild]);
    }

    #[test]
    fn test_pending_keeps_distinct_files_once() {
        let mut pending = PendingActions::default();
        pending.merge(RebuildAction::SingleFileRebuild(PathBuf::from("/p/docs/b.md")));
        pending.merge(RebuildAction::SingleFileRebuild(PathBuf::from("/p/docs/a.md")));
        pending.merge(RebuildAction::SingleFileRebuild(PathBuf::from("/p/docs/a.md")));
        pending.merge(RebuildAction::StaticCopy(PathBuf::from("/p/docs/x.png")));
        pending.merge(RebuildAction::Ignore);

        assert_eq!(
            pending.take(),
            vec![
                RebuildAction::SingleFileRebuild(PathBuf::from("/p/docs/a.md")),
                RebuildAction::SingleFileRebuild(PathBuf::from("/p/docs/b.md")),
                RebuildAction::StaticCopy(PathBuf::from("/p/docs/x.png")),
            ]
        );
    }

    #[test]
    fn test_strength_order() {
        assert!(RebuildAction::FullRebuild.strength() > RebuildAction::NavRebuild.strength());
        assert!(RebuildAction::NavRebuild.strength() > RebuildAction::SingleFileRebuild(PathBuf::new()).strength());
        assert!(RebuildAction::StaticCopy(PathBuf::new()).strength() > RebuildAction::Ignore.strength());
    }
}

//! Read-only view of the last completed build.
//!
//! The dispatch task is the only writer. After each completed build it
//! builds a fresh [`SiteSnapshot`] and swaps it in whole; request handlers
//! clone the `Arc` and never see a half-updated snapshot. Until the first
//! build completes there is no snapshot and handlers answer with a
//! placeholder.

use std::sync::{Arc, RwLock};

use quire_build::BuildContext;
use quire_search::{FulltextIndex, SearchHit, TitleIndex, search};
use quire_site::{MenuNode, ValidPathSet};

/// Menu, valid paths and search indexes of one build.
#[derive(Debug, Default)]
pub(crate) struct SiteSnapshot {
    pub(crate) menu: Vec<MenuNode>,
    pub(crate) valid_paths: ValidPathSet,
    titles: TitleIndex,
    fulltext: FulltextIndex,
}

impl SiteSnapshot {
    /// Copy what handlers need out of a build context.
    pub(crate) fn from_context(ctx: &BuildContext) -> Self {
        Self {
            menu: ctx.menu.clone(),
            valid_paths: ctx.valid_paths.clone(),
            titles: ctx.titles.clone(),
            fulltext: ctx.fulltext.clone(),
        }
    }

    /// Run a combined title and full-text query.
    pub(crate) fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        search(&self.titles, &self.fulltext, query, limit)
    }
}

/// Holder of the current snapshot.
#[derive(Debug, Default)]
pub(crate) struct SnapshotStore {
    current: RwLock<Option<Arc<SiteSnapshot>>>,
}

impl SnapshotStore {
    /// The current snapshot, if a build has completed.
    pub(crate) fn get(&self) -> Option<Arc<SiteSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }

    /// Replace the current snapshot.
    pub(crate) fn publish(&self, snapshot: SiteSnapshot) {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if current.is_none() {
            tracing::info!(pages = snapshot.titles.len(), "Site ready");
        }
        *current = Some(Arc::new(snapshot));
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.get().is_some()
    }
}

//! Per-run build state.
//!
//! Everything a build computes about the site lives in one [`BuildContext`]
//! owned by the orchestrator. Render lanes never see it; they only return
//! HTML. It is reset at the start of every full build and kept between runs
//! so dev-mode single-file rebuilds can reuse the menu and valid paths.

use std::collections::HashMap;
use std::path::Path;

use quire_cache::{FingerprintCache, StatCache, short_hash};
use quire_render::Templates;
use quire_search::{FulltextIndex, TitleIndex};
use quire_site::{CustomMenus, MenuNode, MenuPosition, ValidPathSet, render_menu_html};
use quire_source::SourceTree;

use crate::error::BuildError;

/// Menu HTML and position chosen for one page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageMenu<'a> {
    /// Rendered menu.
    pub html: &'a str,
    /// Where the template should place it.
    pub position: MenuPosition,
}

/// State of one build run.
#[derive(Debug, Default)]
pub struct BuildContext {
    /// Scan of the source tree.
    pub tree: SourceTree,
    /// Valid site paths, complete before any link is resolved.
    pub valid_paths: ValidPathSet,
    /// Default site menu.
    pub menu: Vec<MenuNode>,
    /// Rendered default menu.
    pub menu_html: String,
    /// Per-folder menu overrides.
    pub custom_menus: CustomMenus,
    /// Rendered override menus, keyed like `custom_menus`.
    pub custom_menu_html: HashMap<String, String>,
    /// Whether navigation came from the cache.
    pub nav_cache_hit: bool,
    /// Page templates and footer.
    pub templates: Templates,
    /// Content fingerprints.
    pub fingerprints: FingerprintCache,
    /// Static asset copies.
    pub stat_cache: StatCache,
    /// Title index for `search-index.json`.
    pub titles: TitleIndex,
    /// Inverted index for `fulltext-index.json`.
    pub fulltext: FulltextIndex,
    /// Per-file failures of this run.
    pub errors: Vec<BuildError>,
}

impl BuildContext {
    /// Drop everything computed by a previous run.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether a build has populated the context.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.menu.is_empty()
    }

    /// Render the HTML of every custom menu.
    pub fn render_custom_menus(&mut self) {
        self.custom_menu_html = self
            .custom_menus
            .iter()
            .map(|(folder, menu)| {
                (
                    folder.to_owned(),
                    render_menu_html(&menu.menu_data, menu.menu_position),
                )
            })
            .collect();
    }

    /// The menu for a document: the nearest override, else the default.
    #[must_use]
    pub fn menu_for(&self, document: &Path) -> PageMenu<'_> {
        self.custom_menus
            .nearest(document)
            .and_then(|(folder, menu)| {
                self.custom_menu_html.get(folder).map(|html| PageMenu {
                    html,
                    position: menu.menu_position,
                })
            })
            .unwrap_or(PageMenu {
                html: &self.menu_html,
                position: MenuPosition::Side,
            })
    }

    /// Hash of everything besides a document's own content that shapes its
    /// page: templates, footer, menus and the valid path set.
    #[must_use]
    pub fn environment_hash(&self) -> String {
        let mut source = self.templates.fingerprint_source();
        source.push('\0');
        source.push_str(&self.menu_html);
        let mut folders: Vec<_> = self.custom_menu_html.iter().collect();
        folders.sort();
        for (folder, html) in folders {
            source.push('\0');
            source.push_str(folder);
            source.push('\0');
            source.push_str(html);
        }
        source.push('\0');
        source.push_str(&self.valid_paths.to_sorted_vec().join("\n"));
        short_hash(source)
    }

    /// Record a per-file failure.
    pub fn record_error(&mut self, error: BuildError) {
        tracing::warn!(file = %error.file, phase = %error.phase, error = %error.message, "Build error");
        self.errors.push(error);
    }
}

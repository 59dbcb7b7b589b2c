//! Navigation cache (`nav-cache.json`).
//!
//! The snapshot is all-or-nothing: if either fingerprint differs, nothing in
//! it is reused, because link validity depends on the complete path set.

use std::time::{SystemTime, UNIX_EPOCH};

use quire_site::{CustomMenu, MenuNode};
use serde::{Deserialize, Serialize};

use crate::dir::CacheDir;

/// File name inside the cache directory.
const FILE_NAME: &str = "nav-cache.json";

/// Persisted navigation snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavCacheEntry {
    /// Hash of the scanned file listing.
    pub file_list_hash: String,
    /// Hash of the stats of navigation-relevant files.
    pub file_stats_hash: String,
    /// Default site menu.
    pub menu_data: Vec<MenuNode>,
    /// Rendered default menu.
    pub menu_html: String,
    /// Valid site paths, as `[path, path]` pairs.
    pub valid_paths: Vec<(String, String)>,
    /// Custom menus keyed by folder.
    pub custom_menus: Vec<(String, CustomMenu)>,
    /// Creation time, milliseconds since the epoch.
    pub timestamp: u64,
}

impl NavCacheEntry {
    /// Build a snapshot stamped with the current time.
    #[must_use]
    pub fn new(
        file_list_hash: String,
        file_stats_hash: String,
        menu_data: Vec<MenuNode>,
        menu_html: String,
        valid_paths: impl IntoIterator<Item = String>,
        custom_menus: Vec<(String, CustomMenu)>,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        Self {
            file_list_hash,
            file_stats_hash,
            menu_data,
            menu_html,
            valid_paths: valid_paths.into_iter().map(|p| (p.clone(), p)).collect(),
            custom_menus,
            timestamp,
        }
    }

    /// Load `nav-cache.json`, `None` when missing or corrupt.
    #[must_use]
    pub fn load(dir: &CacheDir) -> Option<Self> {
        dir.load_json(FILE_NAME)
    }

    /// Persist the snapshot.
    pub fn save(&self, dir: &CacheDir) {
        dir.save_json(FILE_NAME, self);
    }

    /// Delete the persisted snapshot.
    pub fn clear(dir: &CacheDir) {
        dir.remove(FILE_NAME);
    }

    /// Whether the snapshot can be reused for a scan with these hashes.
    ///
    /// Both hashes must match and the menu, menu HTML and valid paths must
    /// be present.
    #[must_use]
    pub fn is_valid(&self, file_list_hash: &str, file_stats_hash: &str) -> bool {
        self.file_list_hash == file_list_hash
            && self.file_stats_hash == file_stats_hash
            && !self.menu_data.is_empty()
            && !self.menu_html.is_empty()
            && !self.valid_paths.is_empty()
    }

    /// Valid paths without the pairing.
    pub fn valid_path_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.valid_paths.iter().map(|(k, _)| k.clone())
    }
}

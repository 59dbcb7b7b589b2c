//! Stat-keyed cache for static assets (`image-cache.json`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dir::CacheDir;
use crate::hash::FileStat;

/// File name inside the cache directory.
const FILE_NAME: &str = "image-cache.json";

/// One copied asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    /// Source modification time in milliseconds.
    pub mtime: u64,
    /// Source size in bytes.
    pub size: u64,
    /// Output path that was written.
    pub result: String,
}

/// Assets keyed by absolute source path.
#[derive(Clone, Debug, Default)]
pub struct StatCache {
    entries: BTreeMap<String, StatEntry>,
}

impl StatCache {
    /// Load `image-cache.json`, or start empty.
    #[must_use]
    pub fn load(dir: &CacheDir) -> Self {
        Self {
            entries: dir.load_json(FILE_NAME).unwrap_or_default(),
        }
    }

    /// Persist all entries.
    pub fn save(&self, dir: &CacheDir) {
        dir.save_json(FILE_NAME, &self.entries);
    }

    /// The recorded output if `stat` matches the stored entry.
    #[must_use]
    pub fn fresh(&self, path: &str, stat: FileStat) -> Option<&str> {
        self.entries
            .get(path)
            .filter(|e| e.mtime == stat.mtime && e.size == stat.size)
            .map(|e| e.result.as_str())
    }

    /// Record a copy.
    pub fn record(&mut self, path: &str, stat: FileStat, result: impl Into<String>) {
        self.entries.insert(
            path.to_owned(),
            StatEntry {
                mtime: stat.mtime,
                size: stat.size,
                result: result.into(),
            },
        );
    }

    /// Keep only assets for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|path, _| keep(path));
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

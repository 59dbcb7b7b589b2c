//! Content fingerprint cache (`content-hashes.json`).

use std::collections::BTreeMap;

use crate::dir::CacheDir;
use crate::hash::short_hash;

/// File name inside the cache directory.
const FILE_NAME: &str = "content-hashes.json";

/// Short content hash per document, keyed by absolute source path.
///
/// Every fingerprint is salted with a hash of the render environment
/// (templates, footer, navigation snapshot). When the environment changes,
/// every stored fingerprint stops matching and all documents regenerate.
#[derive(Clone, Debug, Default)]
pub struct FingerprintCache {
    hashes: BTreeMap<String, String>,
    salt: String,
}

impl FingerprintCache {
    /// Empty cache: every document needs regeneration.
    #[must_use]
    pub fn new(salt: impl Into<String>) -> Self {
        Self {
            hashes: BTreeMap::new(),
            salt: salt.into(),
        }
    }

    /// Load `content-hashes.json`, or start empty when it is missing or
    /// corrupt.
    #[must_use]
    pub fn load(dir: &CacheDir, salt: impl Into<String>) -> Self {
        let hashes: BTreeMap<String, String> = dir.load_json(FILE_NAME).unwrap_or_default();
        tracing::debug!(entries = hashes.len(), "Loaded content fingerprints");
        Self {
            hashes,
            salt: salt.into(),
        }
    }

    /// Persist all fingerprints.
    pub fn save(&self, dir: &CacheDir) {
        dir.save_json(FILE_NAME, &self.hashes);
    }

    /// Whether `content` differs from what was rendered last time.
    #[must_use]
    pub fn needs_regeneration(&self, path: &str, content: &str) -> bool {
        self.hashes
            .get(path)
            .is_none_or(|stored| *stored != self.fingerprint(content))
    }

    /// Record `content` as rendered.
    pub fn update(&mut self, path: &str, content: &str) {
        let hash = self.fingerprint(content);
        self.hashes.insert(path.to_owned(), hash);
    }

    /// Keep only documents for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.hashes.retain(|path, _| keep(path));
    }

    /// Number of fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Whether no fingerprints are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    fn fingerprint(&self, content: &str) -> String {
        short_hash(format!("{}\0{content}", self.salt))
    }
}

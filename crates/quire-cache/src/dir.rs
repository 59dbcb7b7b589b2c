//! The per-source-root cache directory.
//!
//! On open, [`CacheDir`] validates a `VERSION` file in its root. If the
//! version is missing or different, the whole directory is wiped and
//! recreated, so caches written by another version are never read.
//!
//! ```text
//! <source>/.quire/
//! +-- VERSION
//! +-- content-hashes.json
//! +-- nav-cache.json
//! +-- image-cache.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Version written to `VERSION`. Bump when a cache format changes.
pub const CACHE_VERSION: &str = concat!("1:", env!("CARGO_PKG_VERSION"));

/// Handle to a versioned cache directory.
#[derive(Clone, Debug)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    /// Open the cache at `root`, wiping it on version mismatch.
    ///
    /// Errors are logged and never fatal: the cache is optional.
    #[must_use]
    pub fn open(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self { root }
    }

    /// Directory root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a cache file inside the directory.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Read and deserialize a JSON cache file.
    ///
    /// Returns `None` when the file is missing or cannot be parsed.
    #[must_use]
    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.path(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cache file not loaded");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt cache file, ignoring");
                None
            }
        }
    }

    /// Serialize and write a JSON cache file.
    ///
    /// The file is written next to its destination and renamed into place so
    /// a crash never leaves a half-written cache. Failures are logged.
    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) {
        let path = self.path(name);
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to serialize cache");
                return;
            }
        };
        if let Err(e) = fs::create_dir_all(&self.root) {
            tracing::warn!(path = %self.root.display(), error = %e, "Failed to create cache directory");
            return;
        }
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, &bytes).and_then(|()| fs::rename(&tmp, &path)) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write cache");
            let _ = fs::remove_file(&tmp);
        }
    }

    /// Remove a cache file if it exists.
    pub fn remove(&self, name: &str) {
        let path = self.path(name);
        if let Err(e) = fs::remove_file(&path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove cache file");
        }
    }
}

fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!(version, "Cache version matches");
            return;
        }
        Ok(stored) => {
            tracing::info!(stored = %stored, current = version, "Cache version mismatch, wiping cache");
        }
        Err(_) => {
            tracing::info!(path = %root.display(), "No cache VERSION file found, initializing cache");
        }
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!(error = %e, "Failed to remove cache directory");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!(error = %e, "Failed to create cache directory");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!(error = %e, "Failed to write cache VERSION file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_version_file() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(".quire");

        let _dir = CacheDir::open(root.clone(), "v1");

        assert_eq!(fs::read_to_string(root.join("VERSION")).unwrap(), "v1");
    }

    #[test]
    fn test_version_mismatch_wipes_cache() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(".quire");

        let dir = CacheDir::open(root.clone(), "v1");
        dir.save_json("data.json", &vec![1, 2, 3]);
        assert!(root.join("data.json").exists());

        let dir = CacheDir::open(root.clone(), "v1");
        assert_eq!(dir.load_json::<Vec<i32>>("data.json"), Some(vec![1, 2, 3]));

        let dir = CacheDir::open(root.clone(), "v2");
        assert!(!root.join("data.json").exists());
        assert_eq!(dir.load_json::<Vec<i32>>("data.json"), None);
        assert_eq!(fs::read_to_string(root.join("VERSION")).unwrap(), "v2");
    }

    #[test]
    fn test_corrupt_json_is_miss() {
        let tmp = TempDir::new().unwrap();
        let dir = CacheDir::open(tmp.path().join("c"), "v1");
        fs::write(dir.path("bad.json"), "{not json").unwrap();

        assert_eq!(dir.load_json::<BTreeMap<String, String>>("bad.json"), None);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let dir = CacheDir::open(tmp.path().join("c"), "v1");

        dir.save_json("x.json", &"value");

        assert!(dir.path("x.json").exists());
        assert!(!dir.path("x.json.tmp").exists());
        dir.remove("x.json");
        assert!(!dir.path("x.json").exists());
        dir.remove("x.json");
    }
}

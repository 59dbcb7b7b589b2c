//! Short hashes used as cache keys and fingerprints.
//!
//! Hashes are SHA-256 truncated to 16 hex characters. They only detect
//! change; collisions are an accepted risk.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of every short hash, in hex characters.
const SHORT_HASH_LEN: usize = 16;

/// Hash arbitrary bytes to 16 hex characters.
#[must_use]
pub fn short_hash(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    let result = hasher.finalize();
    hex::encode(&result[..SHORT_HASH_LEN / 2])
}

/// Order-independent hash of a file listing.
#[must_use]
pub fn file_list_hash<S: AsRef<str>>(paths: &[S]) -> String {
    let mut sorted: Vec<&str> = paths.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    short_hash(sorted.join("\n"))
}

/// Hash of `(path, mtime, size)` for each file.
///
/// Files that cannot be stat'ed are hashed as missing, so deleting one
/// changes the hash as well.
#[must_use]
pub fn file_stats_hash(paths: &[PathBuf]) -> String {
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for path in sorted {
        hasher.update(path.to_string_lossy().as_bytes());
        match FileStat::of(path) {
            Some(stat) => hasher.update(format!(":{}:{}\n", stat.mtime, stat.size)),
            None => hasher.update(":missing\n"),
        }
    }
    let result = hasher.finalize();
    hex::encode(&result[..SHORT_HASH_LEN / 2])
}

/// Modification time (milliseconds since the epoch) and size of a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Modification time in milliseconds.
    pub mtime: u64,
    /// Size in bytes.
    pub size: u64,
}

impl FileStat {
    /// Stat a file, `None` if it does not exist or has no readable mtime.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        let modified = meta.modified().ok()?;
        let mtime = modified.duration_since(UNIX_EPOCH).ok()?.as_millis();
        Some(Self {
            mtime: u64::try_from(mtime).unwrap_or(u64::MAX),
            size: meta.len(),
        })
    }
}

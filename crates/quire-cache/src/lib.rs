//! Build caches for quire.
//!
//! Every cache lives in one hidden directory per source root (see
//! [`CacheDir`]) and is loaded once at the start of a build and saved once
//! at the end. A cache that is missing, corrupt, or written by another
//! version is a miss: the build recomputes what it needs and overwrites it.
//!
//! - [`FingerprintCache`]: short content hash per document, decides whether a
//!   document must be rendered again
//! - [`NavCacheEntry`]: the whole navigation snapshot (menu, menu HTML, valid
//!   paths, custom menus), valid only while the file list and the stats of
//!   navigation-relevant files are unchanged
//! - [`StatCache`]: `(mtime, size)` per static asset, decides whether it must
//!   be copied again
//!
//! # Example
//!
//! ```
//! use quire_cache::FingerprintCache;
//!
//! let mut cache = FingerprintCache::new("env");
//! assert!(cache.needs_regeneration("/docs/a.md", "# A"));
//! cache.update("/docs/a.md", "# A");
//! assert!(!cache.needs_regeneration("/docs/a.md", "# A"));
//! ```

mod dir;
mod fingerprint;
mod hash;
mod nav;
mod stat;

pub use dir::{CACHE_VERSION, CacheDir};
pub use fingerprint::FingerprintCache;
pub use hash::{FileStat, file_list_hash, file_stats_hash, short_hash};
pub use nav::NavCacheEntry;
pub use stat::{StatCache, StatEntry};

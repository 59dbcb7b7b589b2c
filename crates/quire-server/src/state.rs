//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::live_reload::{Dispatcher, LiveReloadManager};
use crate::snapshot::SnapshotStore;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Output root served to the browser.
    pub(crate) output_dir: PathBuf,
    /// Last completed build, once there is one.
    pub(crate) snapshot: Arc<SnapshotStore>,
    /// Regeneration queue.
    pub(crate) dispatcher: Arc<Dispatcher>,
    /// Live reload manager (if enabled).
    pub(crate) live_reload: Option<LiveReloadManager>,
    /// Whether `/api/search` answers queries.
    pub(crate) search_enabled: bool,
    /// Upper bound on search results.
    pub(crate) search_max_results: usize,
    /// Application version.
    pub(crate) version: String,
}

impl AppState {
    /// Check if live reload is enabled.
    #[must_use]
    pub(crate) fn live_reload_enabled(&self) -> bool {
        self.live_reload.is_some()
    }
}

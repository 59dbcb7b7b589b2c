//! Phase notifications.

/// Milestones of a build, reported as they happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildEvent {
    /// A build or single-file rebuild started.
    Building,
    /// Menu and valid paths are available.
    MenuReady,
    /// Search artifacts were written.
    SearchReady,
    /// Caches were saved; the run is complete.
    CacheReady,
}

impl BuildEvent {
    /// Wire name (`building`, `menu-ready`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::MenuReady => "menu-ready",
            Self::SearchReady => "search-ready",
            Self::CacheReady => "cache-ready",
        }
    }
}

/// Receives [`BuildEvent`]s from the orchestrator.
///
/// Called on the orchestrator's task; implementations must not block.
pub trait BuildObserver: Send + Sync {
    /// A milestone was reached.
    fn notify(&self, event: BuildEvent) {
        let _ = event;
    }
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl BuildObserver for NoopObserver {}

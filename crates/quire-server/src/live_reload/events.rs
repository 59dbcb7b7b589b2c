//! Typed live-reload events.
//!
//! Every message pushed to WebSocket clients is a JSON object
//! `{"type": "...", "path": "..."}`. `reload` carries the site path of the
//! page that changed (`/` when the whole site was rebuilt); the build phase
//! events carry an empty path.

use quire_build::{BuildEvent, BuildObserver};
use serde::Serialize;
use tokio::sync::broadcast;

/// Kind of live-reload event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum LiveEventType {
    Reload,
    Building,
    SearchReady,
    MenuReady,
    CacheReady,
}

impl From<BuildEvent> for LiveEventType {
    fn from(event: BuildEvent) -> Self {
        match event {
            BuildEvent::Building => Self::Building,
            BuildEvent::MenuReady => Self::MenuReady,
            BuildEvent::SearchReady => Self::SearchReady,
            BuildEvent::CacheReady => Self::CacheReady,
        }
    }
}

/// Event sent to connected WebSocket clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct LiveEvent {
    #[serde(rename = "type")]
    pub(crate) event_type: LiveEventType,
    pub(crate) path: String,
}

impl LiveEvent {
    /// A page (or the whole site, for `/`) changed.
    pub(crate) fn reload(path: impl Into<String>) -> Self {
        Self {
            event_type: LiveEventType::Reload,
            path: path.into(),
        }
    }
}

impl From<BuildEvent> for LiveEvent {
    fn from(event: BuildEvent) -> Self {
        Self {
            event_type: event.into(),
            path: String::new(),
        }
    }
}

/// Forwards build phase events to live-reload clients.
pub(crate) struct BroadcastObserver {
    sender: broadcast::Sender<LiveEvent>,
}

impl BroadcastObserver {
    pub(crate) fn new(sender: broadcast::Sender<LiveEvent>) -> Self {
        Self { sender }
    }
}

impl BuildObserver for BroadcastObserver {
    fn notify(&self, event: BuildEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event.into());
    }
}

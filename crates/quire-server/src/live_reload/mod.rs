//! Dev-mode pipeline: file watching, change dispatch and live-reload events.

mod dispatch;
mod events;
mod manager;
mod websocket;

pub(crate) use dispatch::Dispatcher;
pub(crate) use events::{BroadcastObserver, LiveEvent};
pub(crate) use manager::LiveReloadManager;
pub(crate) use websocket::ws_handler;

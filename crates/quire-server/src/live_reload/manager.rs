//! Live reload manager.
//!
//! Watches the source tree, the meta directory and the config file, and
//! feeds debounced changes through the classifier into the dispatcher.
//!
//! ```text
//! notify callback ──mpsc──► record task ──► EventDebouncer
//!                                                │ drain_ready (every 50ms)
//!                                                ▼
//!                            classify ──► Dispatcher::enqueue ──► run_pending
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use quire_build::{SiteLayout, classify};
use quire_source::{ChangeKind, EventDebouncer};
use tokio::sync::{broadcast, mpsc};

use super::dispatch::Dispatcher;
use super::events::LiveEvent;

/// Interval at which ready events are drained from the debouncer.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Manages file watching and broadcasting reload events.
pub(crate) struct LiveReloadManager {
    layout: SiteLayout,
    dispatcher: Arc<Dispatcher>,
    broadcaster: broadcast::Sender<LiveEvent>,
    watcher: Option<RecommendedWatcher>,
    debounce: Duration,
}

impl LiveReloadManager {
    pub(crate) fn new(
        layout: SiteLayout,
        dispatcher: Arc<Dispatcher>,
        broadcaster: broadcast::Sender<LiveEvent>,
        debounce: Duration,
    ) -> Self {
        Self {
            layout,
            dispatcher,
            broadcaster,
            watcher: None,
            debounce,
        }
    }

    /// Start the file watcher and the background tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be created or the source
    /// directory cannot be watched.
    pub(crate) fn start(&mut self) -> Result<(), notify::Error> {
        let (tx, mut rx) = mpsc::channel::<Event>(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                // The callback runs on the watcher thread
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => tracing::warn!(error = %e, "Watch error"),
            }
        })?;

        for (path, mode) in self.watch_roots() {
            watcher.watch(&path, mode)?;
            tracing::debug!(path = %path.display(), "Watching");
        }
        self.watcher = Some(watcher);

        let debouncer = Arc::new(EventDebouncer::new(self.debounce));
        let debouncer_for_record = Arc::clone(&debouncer);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                record_event(&event, &debouncer_for_record);
            }
        });

        let layout = self.layout.clone();
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            loop {
                interval.tick().await;

                for change in debouncer.drain_ready() {
                    let action = classify(&change, &layout);
                    tracing::debug!(
                        path = %change.path.display(),
                        kind = change.kind.as_str(),
                        ?action,
                        "Classified change"
                    );
                    dispatcher.enqueue(action);
                }
                if dispatcher.has_pending() {
                    dispatcher.run_pending().await;
                }
            }
        });

        Ok(())
    }

    /// Directories and files to watch. The meta directory is watched on its
    /// own only when it lives outside the source tree; the config file is
    /// watched through its parent directory so editors that replace the
    /// file are still seen.
    fn watch_roots(&self) -> Vec<(PathBuf, RecursiveMode)> {
        let layout = &self.layout;
        let mut roots = vec![(layout.source_dir.clone(), RecursiveMode::Recursive)];
        if let Some(meta) = &layout.meta_dir
            && meta.is_dir()
            && !meta.starts_with(&layout.source_dir)
        {
            roots.push((meta.clone(), RecursiveMode::Recursive));
        }
        if let Some(parent) = layout.config_file.as_ref().and_then(|p| p.parent())
            && parent.is_dir()
            && !roots.iter().any(|(root, _)| parent.starts_with(root))
        {
            roots.push((parent.to_path_buf(), RecursiveMode::NonRecursive));
        }
        roots
    }

    /// Get a receiver for live events.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.broadcaster.subscribe()
    }
}

/// Record a raw filesystem event into the debouncer.
fn record_event(event: &Event, debouncer: &EventDebouncer) {
    let Some(kind) = change_kind(event.kind) else {
        return;
    };
    for path in &event.paths {
        debouncer.record(path.clone(), kind);
        tracing::trace!(path = %path.display(), ?kind, "Recorded filesystem event");
    }
}

fn change_kind(kind: EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}

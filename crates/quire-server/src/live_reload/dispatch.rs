//! Serialized regeneration.
//!
//! Classified changes are merged into one [`PendingActions`] queue. A single
//! in-progress flag guarantees at most one regeneration runs at a time;
//! changes arriving meanwhile wait in the queue and are merged, so a burst
//! of saves during a build produces one follow-up run instead of cancelling
//! the running one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use quire_build::{BuildContext, BuildReport, PendingActions, RebuildAction, RunError, SiteBuilder};
use quire_source::{SourceKind, file_url_path};
use tokio::sync::broadcast;

use super::events::LiveEvent;
use crate::snapshot::{SiteSnapshot, SnapshotStore};

/// Clears the in-progress flag when dropped.
struct InProgress<'a>(&'a AtomicBool);

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the builder and runs queued regenerations one at a time.
pub(crate) struct Dispatcher {
    builder: tokio::sync::Mutex<SiteBuilder>,
    pending: Mutex<PendingActions>,
    in_progress: AtomicBool,
    snapshot: Arc<SnapshotStore>,
    broadcaster: broadcast::Sender<LiveEvent>,
    source_dir: PathBuf,
}

impl Dispatcher {
    pub(crate) fn new(
        builder: SiteBuilder,
        snapshot: Arc<SnapshotStore>,
        broadcaster: broadcast::Sender<LiveEvent>,
    ) -> Self {
        let source_dir = builder.options().source_dir.clone();
        Self {
            builder: tokio::sync::Mutex::new(builder),
            pending: Mutex::new(PendingActions::default()),
            in_progress: AtomicBool::new(false),
            snapshot,
            broadcaster,
            source_dir,
        }
    }

    /// Queue an action for the next run.
    pub(crate) fn enqueue(&self, action: RebuildAction) {
        if action == RebuildAction::Ignore {
            return;
        }
        tracing::debug!(?action, "Queued rebuild");
        self.lock_pending().merge(action);
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.lock_pending().is_empty()
    }

    /// Whether a regeneration is running.
    pub(crate) fn is_building(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Run the first build, then anything queued meanwhile.
    ///
    /// Returns `false` without doing anything if a run is already active.
    pub(crate) async fn initial_build(&self) -> bool {
        let Some(_guard) = self.try_start() else {
            return false;
        };
        let start = Instant::now();
        let mut builder = self.builder.lock().await;
        let result = builder.build().await;
        self.finish(&builder, result, "/".to_owned(), start);
        drop(builder);
        self.drain().await;
        true
    }

    /// Run every queued action.
    ///
    /// Returns `false` without doing anything if a run is already active;
    /// the active run drains the queue before it ends.
    pub(crate) async fn run_pending(&self) -> bool {
        let Some(_guard) = self.try_start() else {
            return false;
        };
        self.drain().await;
        true
    }

    fn try_start(&self) -> Option<InProgress<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InProgress(&self.in_progress))
    }

    async fn drain(&self) {
        loop {
            let actions = self.lock_pending().take();
            if actions.is_empty() {
                break;
            }
            for action in actions {
                self.apply(action).await;
            }
        }
    }

    async fn apply(&self, action: RebuildAction) {
        let start = Instant::now();
        let mut builder = self.builder.lock().await;
        let (result, path) = match action {
            RebuildAction::FullRebuild => {
                builder.request_full();
                (builder.build().await, "/".to_owned())
            }
            RebuildAction::NavRebuild => {
                builder.invalidate_navigation();
                (builder.build().await, "/".to_owned())
            }
            RebuildAction::SingleFileRebuild(path) => {
                let page = self.reload_path(builder.context(), &path, SourceKind::Document);
                (builder.rebuild_file(&path).await, page)
            }
            RebuildAction::StaticCopy(path) => {
                let page = self.reload_path(builder.context(), &path, SourceKind::Static);
                (builder.copy_static(&path).await, page)
            }
            RebuildAction::Ignore => return,
        };
        self.finish(&builder, result, path, start);
    }

    /// Publish the snapshot and tell clients what to reload.
    fn finish(&self, builder: &SiteBuilder, result: Result<BuildReport, RunError>, path: String, start: Instant) {
        match result {
            Ok(report) => {
                self.snapshot
                    .publish(SiteSnapshot::from_context(builder.context()));
                tracing::info!(
                    path = %path,
                    rendered = report.rendered,
                    copied = report.copied,
                    errors = report.errors.len(),
                    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Regenerated"
                );
                let _ = self.broadcaster.send(LiveEvent::reload(path));
            }
            Err(e) => tracing::error!(error = %e, "Regeneration failed"),
        }
    }

    /// Site path clients should reload for a changed file. Files the last
    /// build did not know trigger a full build, so the whole site reloads.
    fn reload_path(&self, ctx: &BuildContext, path: &Path, kind: SourceKind) -> String {
        let Ok(relative) = path.strip_prefix(&self.source_dir) else {
            return "/".to_owned();
        };
        if !ctx.is_ready() || ctx.tree.file(relative).is_none() {
            return "/".to_owned();
        }
        page_path(relative, kind)
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, PendingActions> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Site path of a source file. Index documents map to their folder.
fn page_path(relative: &Path, kind: SourceKind) -> String {
    let url = file_url_path(relative, kind);
    if kind != SourceKind::Document {
        return url;
    }
    match url.strip_suffix("/index") {
        Some("") => "/".to_owned(),
        Some(folder) => folder.to_owned(),
        None => url,
    }
}

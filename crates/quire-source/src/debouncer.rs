//! Event debouncing for dev mode.
//!
//! An editor saving one file often emits several events in a row. The
//! debouncer keeps one pending change per path and releases it once the
//! path has been quiet for the configured delay.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::event::{ChangeEvent, ChangeKind};

struct Pending {
    kind: ChangeKind,
    quiet_at: Instant,
}

/// Per-path debouncer shared between the watcher thread and the dev loop.
pub struct EventDebouncer {
    pending: Mutex<HashMap<PathBuf, Pending>>,
    delay: Duration,
}

impl EventDebouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            delay,
        }
    }

    /// Record a raw change. Every call restarts the quiet period of `path`.
    pub fn record(&self, path: PathBuf, kind: ChangeKind) {
        let quiet_at = Instant::now() + self.delay;
        let mut pending = self.lock();
        let merged = match pending.get(&path) {
            Some(previous) => merge(previous.kind, kind),
            None => Some(kind),
        };
        match merged {
            Some(kind) => {
                pending.insert(path, Pending { kind, quiet_at });
            }
            None => {
                pending.remove(&path);
            }
        }
    }

    /// Take every change whose quiet period has elapsed, sorted by path.
    pub fn drain_ready(&self) -> Vec<ChangeEvent> {
        let now = Instant::now();
        let mut ready: Vec<ChangeEvent> = self
            .lock()
            .extract_if(|_, p| p.quiet_at <= now)
            .map(|(path, p)| ChangeEvent::new(path, p.kind))
            .collect();
        ready.sort_by(|a, b| a.path.cmp(&b.path));
        ready
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fold a new change into the pending one. `None` means the path was
/// created and removed again, so nothing happened.
fn merge(previous: ChangeKind, next: ChangeKind) -> Option<ChangeKind> {
    use ChangeKind::{Created, Modified, Removed};

    match (previous, next) {
        (Created, Removed) => None,
        (Created, _) | (Modified, Created) => Some(Created),
        (Modified, Modified) => Some(Modified),
        // Save-via-rename shows up as remove then create
        (Removed, Created) => Some(Modified),
        (_, Removed) | (Removed, Modified) => Some(Removed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_single_event_emitted_after_deadline() {
        let debouncer = EventDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("/docs/file.md");

        debouncer.record(path.clone(), ChangeKind::Modified);
        assert!(debouncer.drain_ready().is_empty());
        assert!(debouncer.has_pending());

        thread::sleep(Duration::from_millis(20));

        let events = debouncer.drain_ready();
        assert_eq!(events, vec![ChangeEvent::new(path, ChangeKind::Modified)]);
        assert!(debouncer.drain_ready().is_empty());
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn test_burst_coalesces_to_one_event() {
        let debouncer = EventDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("/docs/file.md");

        debouncer.record(path.clone(), ChangeKind::Modified);
        debouncer.record(path.clone(), ChangeKind::Modified);
        debouncer.record(path, ChangeKind::Modified);

        thread::sleep(Duration::from_millis(20));

        assert_eq!(debouncer.drain_ready().len(), 1);
    }

    #[test]
    fn test_created_then_removed_discards_both() {
        let debouncer = EventDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("/docs/tmp.md");

        debouncer.record(path.clone(), ChangeKind::Created);
        debouncer.record(path, ChangeKind::Removed);

        thread::sleep(Duration::from_millis(20));

        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_removed_then_created_becomes_modified() {
        let debouncer = EventDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("/docs/file.md");

        debouncer.record(path.clone(), ChangeKind::Removed);
        debouncer.record(path, ChangeKind::Created);

        thread::sleep(Duration::from_millis(20));

        let events = debouncer.drain_ready();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::Modified);
    }

    #[test]
    fn test_drain_is_sorted_by_path() {
        let debouncer = EventDebouncer::new(Duration::from_millis(5));
        debouncer.record(PathBuf::from("/docs/b.md"), ChangeKind::Modified);
        debouncer.record(PathBuf::from("/docs/a.md"), ChangeKind::Created);

        thread::sleep(Duration::from_millis(15));

        let paths: Vec<_> = debouncer.drain_ready().into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("/docs/a.md"), PathBuf::from("/docs/b.md")]
        );
    }

    #[test]
    fn test_merge_all_combinations() {
        use ChangeKind::{Created, Modified, Removed};

        assert_eq!(merge(Created, Created), Some(Created));
        assert_eq!(merge(Created, Modified), Some(Created));
        assert_eq!(merge(Created, Removed), None);
        assert_eq!(merge(Modified, Created), Some(Created));
        assert_eq!(merge(Modified, Modified), Some(Modified));
        assert_eq!(merge(Modified, Removed), Some(Removed));
        assert_eq!(merge(Removed, Created), Some(Modified));
        assert_eq!(merge(Removed, Modified), Some(Removed));
        assert_eq!(merge(Removed, Removed), Some(Removed));
    }
}

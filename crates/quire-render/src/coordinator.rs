//! Parallel render lanes.
//!
//! [`RenderCoordinator`] owns a fixed rayon pool with one thread per lane.
//! Lane tasks are spawned in FIFO order, so an idle lane always picks up the
//! oldest queued task. Results come back over a channel; lanes never touch
//! shared build state.
//!
//! Kinds that are not lane-eligible are rendered on the calling thread while
//! the lanes work through the rest of the batch.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc;

use quire_source::RenderKind;

use crate::error::RenderError;
use crate::renderer::{RenderContext, Renderer};

/// One document to render.
#[derive(Clone, Debug)]
pub struct RenderTask {
    /// Caller-chosen position, echoed in the outcome.
    pub index: usize,
    /// Document body.
    pub content: String,
    /// Document kind.
    pub kind: RenderKind,
    /// Where the document lives.
    pub context: RenderContext,
}

impl RenderTask {
    /// Create a task.
    #[must_use]
    pub fn new(index: usize, content: impl Into<String>, kind: RenderKind, context: RenderContext) -> Self {
        Self {
            index,
            content: content.into(),
            kind,
            context,
        }
    }
}

/// Result of one task.
#[derive(Debug)]
pub struct RenderOutcome {
    /// Index of the task.
    pub index: usize,
    /// Rendered HTML or the failure.
    pub result: Result<String, RenderError>,
}

/// Renders batches of documents on a fixed number of lanes.
pub struct RenderCoordinator {
    pool: rayon::ThreadPool,
    renderer: Arc<dyn Renderer>,
    lanes: usize,
    batch_size: usize,
}

impl RenderCoordinator {
    /// Create a coordinator with `lanes` parallel lanes (at least one).
    ///
    /// `batch_size` bounds how many documents a caller should hand over at
    /// once; see [`batch_size`](Self::batch_size).
    pub fn new(renderer: Arc<dyn Renderer>, lanes: usize, batch_size: usize) -> Result<Self, RenderError> {
        let lanes = lanes.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(lanes)
            .thread_name(|i| format!("render-lane-{i}"))
            .build()
            .map_err(|e| RenderError::Pool(e.to_string()))?;
        tracing::debug!(lanes, batch_size, "Created render coordinator");
        Ok(Self {
            pool,
            renderer,
            lanes,
            batch_size: batch_size.max(1),
        })
    }

    /// Number of lanes.
    #[must_use]
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Documents per batch. A batch fully drains before the next starts.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The shared renderer.
    #[must_use]
    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    /// Render one batch and return one outcome per task, ordered by index.
    ///
    /// Never fails as a whole: errors and panics become failed outcomes for
    /// the task that caused them.
    pub fn render_batch(&self, tasks: Vec<RenderTask>) -> Vec<RenderOutcome> {
        let total = tasks.len();
        let (lane_tasks, inline_tasks): (Vec<_>, Vec<_>) =
            tasks.into_iter().partition(|t| t.kind.lane_eligible());
        let expected: Vec<usize> = lane_tasks.iter().map(|t| t.index).collect();

        let (tx, rx) = mpsc::channel::<RenderOutcome>();
        let renderer: &dyn Renderer = self.renderer.as_ref();
        let mut outcomes: Vec<RenderOutcome> = Vec::with_capacity(total);

        self.pool.in_place_scope_fifo(|scope| {
            for task in lane_tasks {
                let tx = tx.clone();
                scope.spawn_fifo(move |_| {
                    let _ = tx.send(run_task(renderer, &task));
                });
            }
            for task in &inline_tasks {
                outcomes.push(run_task(renderer, task));
            }
        });
        drop(tx);

        outcomes.extend(rx.iter());

        // Every lane task reports, even on panic; this only guards the channel
        if outcomes.len() < total {
            for index in expected {
                if !outcomes.iter().any(|o| o.index == index) {
                    outcomes.push(RenderOutcome {
                        index,
                        result: Err(RenderError::Lost),
                    });
                }
            }
        }

        outcomes.sort_by_key(|o| o.index);
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        tracing::debug!(tasks = total, failed, "Rendered batch");
        outcomes
    }
}

fn run_task(renderer: &dyn Renderer, task: &RenderTask) -> RenderOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| {
        renderer.render(&task.content, task.kind, &task.context)
    }))
    .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(payload.as_ref()))));
    RenderOutcome {
        index: task.index,
        result,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

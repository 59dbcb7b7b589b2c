//! Batched async file I/O.
//!
//! Operations are split into fixed-size batches. Inside a batch every
//! operation runs concurrently on a [`JoinSet`]; the next batch starts only
//! after all of them settled. This bounds open file descriptors and the
//! memory held by in-flight buffers.

use std::future::Future;
use std::io;
use std::path::PathBuf;

use tokio::task::JoinSet;

/// One file to write.
#[derive(Debug)]
pub(crate) struct WriteJob {
    pub(crate) path: PathBuf,
    pub(crate) contents: Vec<u8>,
}

/// Run `op` over `items` in batches of `batch_size`.
///
/// Results are returned in input order.
pub(crate) async fn run_batched<T, R, F, Fut>(items: Vec<T>, batch_size: usize, op: F) -> Vec<io::Result<R>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = io::Result<R>> + Send + 'static,
    R: Send + 'static,
{
    let total = items.len();
    let batch_size = batch_size.max(1);
    let mut results: Vec<Option<io::Result<R>>> = (0..total).map(|_| None).collect();
    let mut items = items.into_iter().enumerate().peekable();

    while items.peek().is_some() {
        let mut set = JoinSet::new();
        for (index, item) in items.by_ref().take(batch_size) {
            let fut = op(item);
            set.spawn(async move { (index, fut.await) });
        }
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::warn!(error = %e, "I/O task failed"),
            }
        }
    }

    results
        .into_iter()
        .map(|r| r.unwrap_or_else(|| Err(io::Error::other("I/O task did not complete"))))
        .collect()
}

/// Read files as UTF-8.
pub(crate) async fn read_files(paths: Vec<PathBuf>, batch_size: usize) -> Vec<io::Result<String>> {
    run_batched(paths, batch_size, |path| async move { tokio::fs::read_to_string(path).await }).await
}

/// Write files, creating parent directories.
pub(crate) async fn write_files(jobs: Vec<WriteJob>, batch_size: usize) -> Vec<io::Result<()>> {
    run_batched(jobs, batch_size, |job| async move {
        if let Some(parent) = job.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&job.path, &job.contents).await
    })
    .await
}

/// Copy files, creating parent directories.
pub(crate) async fn copy_files(pairs: Vec<(PathBuf, PathBuf)>, batch_size: usize) -> Vec<io::Result<u64>> {
    run_batched(pairs, batch_size, |(from, to)| async move {
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&from, &to).await
    })
    .await
}

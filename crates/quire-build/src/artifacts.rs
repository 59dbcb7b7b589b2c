//! Site-wide artifacts written to the output root.
//!
//! ```text
//! <output>/
//! +-- search-index.json          # [{title, path, url, content}]
//! +-- fulltext-index.json        # {word: [{p, s}]}
//! +-- menu-data.json             # default menu
//! +-- custom-menu-<hash>.json    # {menuData, menuPosition} per override
//! +-- build-errors.json          # only when the run had errors
//! ```

use std::collections::HashSet;
use std::path::Path;

use quire_cache::short_hash;
use quire_search::FulltextIndex;
use serde::Serialize;

use crate::context::BuildContext;
use crate::error::{BuildError, ERROR_REPORT_NAME, ErrorReport, Phase};
use crate::io::{WriteJob, write_files};

/// Title index file.
pub const SEARCH_INDEX_NAME: &str = "search-index.json";
/// Inverted index file.
pub const FULLTEXT_INDEX_NAME: &str = "fulltext-index.json";
/// Default menu file.
pub const MENU_DATA_NAME: &str = "menu-data.json";

const CUSTOM_MENU_PREFIX: &str = "custom-menu-";

/// File name of the artifact for the override of `folder` (`""` is the
/// source root).
#[must_use]
pub fn custom_menu_file_name(folder: &str) -> String {
    format!("{CUSTOM_MENU_PREFIX}{}.json", short_hash(folder))
}

/// Load the inverted index written by a previous run.
pub(crate) async fn load_fulltext(output_dir: &Path) -> Option<FulltextIndex> {
    let path = output_dir.join(FULLTEXT_INDEX_NAME);
    let bytes = tokio::fs::read(&path).await.ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(index) => Some(index),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable full-text index");
            None
        }
    }
}

/// Write `search-index.json` and `fulltext-index.json`.
pub(crate) async fn write_search(ctx: &BuildContext, output_dir: &Path, io_batch: usize) -> Vec<BuildError> {
    let mut jobs = Vec::with_capacity(2);
    let mut errors = Vec::new();
    push_json(&mut jobs, &mut errors, output_dir, SEARCH_INDEX_NAME, &ctx.titles);
    push_json(&mut jobs, &mut errors, output_dir, FULLTEXT_INDEX_NAME, &ctx.fulltext);
    errors.extend(write_jobs(jobs, io_batch).await);
    errors
}

/// Write `menu-data.json` and one file per custom menu, removing custom menu
/// files that no longer belong to an override.
pub(crate) async fn write_menus(ctx: &BuildContext, output_dir: &Path, io_batch: usize) -> Vec<BuildError> {
    let mut jobs = Vec::with_capacity(ctx.custom_menus.len() + 1);
    let mut errors = Vec::new();
    push_json(&mut jobs, &mut errors, output_dir, MENU_DATA_NAME, &ctx.menu);

    let mut current = HashSet::new();
    for (folder, menu) in ctx.custom_menus.iter() {
        let name = custom_menu_file_name(folder);
        push_json(&mut jobs, &mut errors, output_dir, &name, menu);
        current.insert(name);
    }
    errors.extend(write_jobs(jobs, io_batch).await);

    remove_stale_custom_menus(output_dir, &current).await;
    errors
}

/// Write `build-errors.json` when there are errors, remove it otherwise.
pub(crate) async fn write_error_report(output_dir: &Path, errors: &[BuildError]) {
    let path = output_dir.join(ERROR_REPORT_NAME);
    if errors.is_empty() {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed stale error report"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove error report"),
        }
        return;
    }

    let report = ErrorReport::from_errors(errors);
    let result = match serde_json::to_vec_pretty(&report) {
        Ok(bytes) => tokio::fs::write(&path, bytes).await,
        Err(e) => Err(std::io::Error::other(e)),
    };
    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "Failed to write error report");
    }
}

fn push_json<T: Serialize>(
    jobs: &mut Vec<WriteJob>,
    errors: &mut Vec<BuildError>,
    output_dir: &Path,
    name: &str,
    value: &T,
) {
    match serde_json::to_vec(value) {
        Ok(contents) => jobs.push(WriteJob {
            path: output_dir.join(name),
            contents,
        }),
        Err(e) => errors.push(BuildError::new(name, Phase::Artifact, e)),
    }
}

async fn write_jobs(jobs: Vec<WriteJob>, io_batch: usize) -> Vec<BuildError> {
    let names: Vec<String> = jobs
        .iter()
        .map(|j| {
            j.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect();
    write_files(jobs, io_batch)
        .await
        .into_iter()
        .zip(names)
        .filter_map(|(result, name)| result.err().map(|e| BuildError::new(name, Phase::Artifact, e)))
        .collect()
}

async fn remove_stale_custom_menus(output_dir: &Path, current: &HashSet<String>) {
    let Ok(mut entries) = tokio::fs::read_dir(output_dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_custom = name.starts_with(CUSTOM_MENU_PREFIX)
            && Path::new(&name).extension().is_some_and(|e| e == "json");
        if is_custom && !current.contains(&name) {
            if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                tracing::warn!(file = %name, error = %e, "Failed to remove stale custom menu");
            }
        }
    }
}

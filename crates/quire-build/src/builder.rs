//! The build orchestrator.
//!
//! [`SiteBuilder::build`] runs the phases in this order:
//!
//! 1. Reset the [`BuildContext`] and check the output root is writable
//! 2. Scan the source tree (fatal if the root cannot be read)
//! 3. Navigation: restore the cached snapshot if the file list and the
//!    stats of navigation-relevant files are unchanged, else build menus and
//!    valid paths from scratch and cache them
//! 4. Load templates and footer
//! 5. Read every document in I/O batches and consult the fingerprint cache
//! 6. Render changed documents in coordinator batches; each batch is
//!    followed by link rewriting, templating and a batched write
//! 7. Copy changed static files
//! 8. Search artifacts (incremental full-text update when possible)
//! 9. Menu artifacts
//! 10. Prune outputs of deleted sources, save caches, write the error report
//!
//! Only the control task mutates the context. Render lanes get owned copies
//! of document bodies and hand back HTML.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use quire_cache::{
    CACHE_VERSION, CacheDir, FileStat, FingerprintCache, NavCacheEntry, StatCache, file_list_hash,
    file_stats_hash,
};
use quire_render::{
    DefaultRenderer, PageContext, RenderContext, RenderCoordinator, RenderError, RenderOutcome,
    RenderTask, Renderer, Templates, parse_document,
};
use quire_search::{FulltextIndex, SearchDocument, TitleIndex};
use quire_site::{
    CustomMenus, FolderConfigs, MenuBuilder, MenuPosition, ValidPathSet, render_menu_html,
    rewrite_links,
};
use quire_source::{Scanner, SourceFilter, SourceFile, SourceKind, SourceTree};

use crate::artifacts;
use crate::context::BuildContext;
use crate::error::{BuildError, Phase, RunError};
use crate::io::{WriteJob, copy_files, read_files, write_files};
use crate::observer::{BuildEvent, BuildObserver, NoopObserver};
use crate::options::{BuildOptions, BuildReport};

/// Convert Duration to milliseconds as f64.
fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// A document that must be rendered.
struct PendingDocument {
    file: SourceFile,
    content: String,
    body: String,
    title: String,
    template: Option<String>,
}

/// A document read from disk.
struct ReadDocument {
    pending: PendingDocument,
    search: SearchDocument,
    changed: bool,
}

/// Builds a site from a source tree, incrementally.
pub struct SiteBuilder {
    options: BuildOptions,
    coordinator: Arc<RenderCoordinator>,
    observer: Arc<dyn BuildObserver>,
    context: BuildContext,
    force_clean: bool,
    nav_invalid: bool,
}

impl SiteBuilder {
    /// Create a builder using the built-in renderer.
    pub fn new(options: BuildOptions) -> Result<Self, RunError> {
        Self::with_renderer(options, Arc::new(DefaultRenderer::new()))
    }

    /// Create a builder with a custom renderer.
    pub fn with_renderer(options: BuildOptions, renderer: Arc<dyn Renderer>) -> Result<Self, RunError> {
        let coordinator = RenderCoordinator::new(renderer, options.lanes, options.render_batch_size)?;
        tracing::debug!(
            lanes = coordinator.lanes(),
            batch_size = coordinator.batch_size(),
            "Render pool ready"
        );
        Ok(Self {
            options,
            coordinator: Arc::new(coordinator),
            observer: Arc::new(NoopObserver),
            context: BuildContext::default(),
            force_clean: false,
            nav_invalid: false,
        })
    }

    /// Report phase events to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn BuildObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Build options.
    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// State left by the last run.
    #[must_use]
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Ignore the navigation cache on the next build.
    pub fn invalidate_navigation(&mut self) {
        self.nav_invalid = true;
        if let Some(dir) = self.cache_dir() {
            NavCacheEntry::clear(&dir);
        }
    }

    /// Make the next build ignore every cache.
    pub fn request_full(&mut self) {
        self.force_clean = true;
    }

    /// Build the whole site.
    pub async fn build(&mut self) -> Result<BuildReport, RunError> {
        let start = Instant::now();
        let clean = self.options.clean || std::mem::take(&mut self.force_clean);
        let nav_invalid = std::mem::take(&mut self.nav_invalid) || clean;
        let io_batch = self.options.io_batch_size;

        self.observer.notify(BuildEvent::Building);
        self.context.reset();
        ensure_writable(&self.options.output_dir).await?;

        self.context.tree = self.scan().await?;
        let cache = self.cache_dir();

        self.context.nav_cache_hit = self.load_navigation(cache.as_ref(), nav_invalid);
        self.observer.notify(BuildEvent::MenuReady);

        self.context.templates = Templates::load(
            self.options.meta_dir.as_deref(),
            self.coordinator.renderer().as_ref(),
        );

        let salt = self.context.environment_hash();
        self.context.fingerprints = match (&cache, clean) {
            (Some(dir), false) => FingerprintCache::load(dir, salt),
            _ => FingerprintCache::new(salt),
        };
        self.context.stat_cache = match (&cache, clean) {
            (Some(dir), false) => StatCache::load(dir),
            _ => StatCache::default(),
        };

        let mut report = BuildReport {
            documents: self.context.tree.documents().count(),
            nav_cache_hit: self.context.nav_cache_hit,
            ..BuildReport::default()
        };

        let documents: Vec<SourceFile> = self.context.tree.documents().cloned().collect();
        let read = self.read_documents(documents, clean).await;

        let mut pending = Vec::new();
        let mut search_docs = Vec::with_capacity(read.len());
        let mut changed_paths = HashSet::new();
        for doc in read {
            if doc.changed {
                changed_paths.insert(doc.search.path.clone());
                pending.push(doc.pending);
            } else {
                report.skipped += 1;
            }
            search_docs.push(doc.search);
        }

        report.rendered = self.render_documents(pending).await;

        let statics: Vec<SourceFile> = self.context.tree.static_files().cloned().collect();
        report.copied = self.copy_statics(statics).await;

        self.context.titles = TitleIndex::build(&search_docs);
        self.context.fulltext = self
            .update_fulltext(&search_docs, &changed_paths, clean)
            .await;
        let errors = artifacts::write_search(&self.context, &self.options.output_dir, io_batch).await;
        self.record_errors(errors);
        self.observer.notify(BuildEvent::SearchReady);

        let errors = artifacts::write_menus(&self.context, &self.options.output_dir, io_batch).await;
        self.record_errors(errors);

        report.removed = self.prune_outputs().await;

        if let Some(dir) = &cache {
            self.context.fingerprints.save(dir);
            self.context.stat_cache.save(dir);
        }
        artifacts::write_error_report(&self.options.output_dir, &self.context.errors).await;
        self.observer.notify(BuildEvent::CacheReady);

        report.errors.clone_from(&self.context.errors);
        tracing::info!(
            documents = report.documents,
            rendered = report.rendered,
            skipped = report.skipped,
            copied = report.copied,
            removed = report.removed,
            errors = report.errors.len(),
            nav_cache_hit = report.nav_cache_hit,
            elapsed_ms = elapsed_ms(start),
            "Build finished"
        );
        Ok(report)
    }

    /// Re-render one document using the menus and valid paths of the last
    /// build, then update the search artifacts.
    ///
    /// Falls back to a full build when no build has run yet or the document
    /// is not part of the last scan.
    pub async fn rebuild_file(&mut self, path: &Path) -> Result<BuildReport, RunError> {
        let Some(file) = self.known_file(path, SourceKind::Document) else {
            self.invalidate_navigation();
            return self.build().await;
        };

        let start = Instant::now();
        self.observer.notify(BuildEvent::Building);
        let relative = display_relative(&file);
        self.context.errors.retain(|e| e.file != relative);

        let mut report = BuildReport {
            documents: 1,
            nav_cache_hit: self.context.nav_cache_hit,
            ..BuildReport::default()
        };
        if !tokio::fs::try_exists(&file.path).await.unwrap_or(false) {
            self.forget_document(&file).await;
            return Ok(self.finish_partial(report).await);
        }
        let Some(doc) = self.read_documents(vec![file], false).await.pop() else {
            return Ok(self.finish_partial(report).await);
        };

        self.context.titles.upsert(&doc.search);
        if doc.changed {
            self.context.fulltext.update(std::slice::from_ref(&doc.search), &[]);
            report.rendered = self.render_documents(vec![doc.pending]).await;
        } else {
            report.skipped = 1;
        }

        let errors = artifacts::write_search(
            &self.context,
            &self.options.output_dir,
            self.options.io_batch_size,
        )
        .await;
        self.record_errors(errors);
        self.observer.notify(BuildEvent::SearchReady);

        let report = self.finish_partial(report).await;
        tracing::info!(
            path = %relative,
            rendered = report.rendered,
            elapsed_ms = elapsed_ms(start),
            "Rebuilt document"
        );
        Ok(report)
    }

    /// Drop a document that disappeared since the last scan from the search
    /// indexes and the fingerprint cache. Its page is pruned by the next
    /// full build.
    async fn forget_document(&mut self, file: &SourceFile) {
        tracing::debug!(path = %file.relative.display(), "Source disappeared");
        self.context.titles.remove(&file.url_path);
        self.context
            .fulltext
            .update(&[], std::slice::from_ref(&file.url_path));
        let key = file.path.to_string_lossy();
        self.context.fingerprints.retain(|p| p != key);

        let errors = artifacts::write_search(
            &self.context,
            &self.options.output_dir,
            self.options.io_batch_size,
        )
        .await;
        self.record_errors(errors);
        self.observer.notify(BuildEvent::SearchReady);
    }

    /// Copy one static file. Falls back to a full build for files the last
    /// scan did not see.
    pub async fn copy_static(&mut self, path: &Path) -> Result<BuildReport, RunError> {
        let Some(file) = self.known_file(path, SourceKind::Static) else {
            self.invalidate_navigation();
            return self.build().await;
        };
        let relative = display_relative(&file);
        self.context.errors.retain(|e| e.file != relative);

        let report = BuildReport {
            copied: self.copy_statics(vec![file]).await,
            nav_cache_hit: self.context.nav_cache_hit,
            ..BuildReport::default()
        };
        Ok(self.finish_partial(report).await)
    }

    fn cache_dir(&self) -> Option<CacheDir> {
        self.options
            .cache_enabled
            .then(|| CacheDir::open(self.options.cache_dir(), CACHE_VERSION))
    }

    fn known_file(&self, path: &Path, kind: SourceKind) -> Option<SourceFile> {
        if !self.context.is_ready() {
            return None;
        }
        let relative = path.strip_prefix(&self.options.source_dir).ok()?;
        self.context
            .tree
            .file(relative)
            .filter(|f| f.kind == kind)
            .cloned()
    }

    async fn scan(&self) -> Result<SourceTree, RunError> {
        let filter = match &self.options.filter_file {
            Some(path) => SourceFilter::load(path)?,
            None => SourceFilter::default(),
        };
        let scanner = Scanner::new(self.options.source_dir.clone(), self.options.meta_filename.clone())
            .with_filter(filter)
            .exclude_dir(self.options.output_dir.clone());
        let start = Instant::now();
        let tree = tokio::task::spawn_blocking(move || scanner.scan()).await??;
        tracing::debug!(
            files = tree.files.len(),
            unsupported = tree.unsupported.len(),
            elapsed_ms = elapsed_ms(start),
            "Scan complete"
        );
        for path in &tree.unsupported {
            tracing::info!(path = %path.display(), "Skipping unsupported file");
        }
        Ok(tree)
    }

    /// Restore or compute menus and valid paths. Returns whether the cache
    /// was used.
    fn load_navigation(&mut self, cache: Option<&CacheDir>, ignore_cache: bool) -> bool {
        let ctx = &mut self.context;
        let list_hash = file_list_hash(&ctx.tree.listing());
        let stats_hash = file_stats_hash(&ctx.tree.nav_files);

        let cached = cache
            .filter(|_| !ignore_cache)
            .and_then(NavCacheEntry::load)
            .filter(|entry| entry.is_valid(&list_hash, &stats_hash));

        let hit = if let Some(entry) = cached {
            ctx.valid_paths = ValidPathSet::from_paths(entry.valid_path_keys());
            ctx.menu = entry.menu_data;
            ctx.menu_html = entry.menu_html;
            ctx.custom_menus = CustomMenus::from_entries(entry.custom_menus);
            true
        } else {
            let configs = FolderConfigs::load(&ctx.tree);
            let mut valid = ValidPathSet::build(
                ctx.tree.documents().map(|f| f.url_path.as_str()),
                ctx.tree
                    .indexed_directories()
                    .into_iter()
                    .map(|d| d.url_path.as_str()),
            );
            for file in ctx.tree.static_files() {
                valid.insert_file(&file.url_path);
            }
            ctx.menu = MenuBuilder::new(&ctx.tree, &configs).build();
            ctx.menu_html = render_menu_html(&ctx.menu, MenuPosition::Side);
            ctx.custom_menus = CustomMenus::build(&ctx.tree, &configs, &valid);
            ctx.valid_paths = valid;

            if let Some(dir) = cache {
                NavCacheEntry::new(
                    list_hash,
                    stats_hash,
                    ctx.menu.clone(),
                    ctx.menu_html.clone(),
                    ctx.valid_paths.to_sorted_vec(),
                    ctx.custom_menus.to_entries(),
                )
                .save(dir);
            }
            false
        };

        ctx.render_custom_menus();
        tracing::debug!(
            cache_hit = hit,
            valid_paths = ctx.valid_paths.len(),
            custom_menus = ctx.custom_menus.len(),
            "Navigation ready"
        );
        hit
    }

    /// Read documents and decide which need rendering. Unreadable documents
    /// are recorded and left out.
    async fn read_documents(&mut self, files: Vec<SourceFile>, force: bool) -> Vec<ReadDocument> {
        let paths = files.iter().map(|f| f.path.clone()).collect();
        let contents = read_files(paths, self.options.io_batch_size).await;

        let mut documents = Vec::with_capacity(files.len());
        for (file, content) in files.into_iter().zip(contents) {
            let content = match content {
                Ok(content) => content,
                Err(e) => {
                    self.context
                        .record_error(BuildError::new(display_relative(&file), Phase::Read, e));
                    continue;
                }
            };

            let stem = file
                .relative
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let parsed = parse_document(&content, &stem);
            let key = file.path.to_string_lossy();
            let output = self.output_path(&file);
            let changed = force
                || self.context.fingerprints.needs_regeneration(&key, &content)
                || !tokio::fs::try_exists(&output).await.unwrap_or(false);

            let search = SearchDocument::new(
                file.url_path.clone(),
                file.href(),
                parsed.title.clone(),
                parsed.body,
            );
            let pending = PendingDocument {
                body: parsed.body.to_owned(),
                title: parsed.title,
                template: parsed.template,
                file,
                content,
            };
            documents.push(ReadDocument {
                pending,
                search,
                changed,
            });
        }
        documents
    }

    /// Render, template and write documents batch by batch. Returns how many
    /// were written.
    async fn render_documents(&mut self, mut pending: Vec<PendingDocument>) -> usize {
        let batch_size = self.coordinator.batch_size();
        let mut written = 0;

        while !pending.is_empty() {
            let rest = pending.split_off(batch_size.min(pending.len()));
            let mut batch = std::mem::replace(&mut pending, rest);

            let tasks: Vec<RenderTask> = batch
                .iter_mut()
                .enumerate()
                .map(|(index, doc)| {
                    RenderTask::new(
                        index,
                        std::mem::take(&mut doc.body),
                        doc.file.render_kind,
                        RenderContext::new(&self.options.source_dir, &doc.file.relative),
                    )
                })
                .collect();
            let outcomes = self.render_batch(tasks).await;

            let mut jobs = Vec::new();
            let mut targets = Vec::new();
            for outcome in outcomes {
                let Some(doc) = batch.get(outcome.index) else {
                    continue;
                };
                let page = outcome
                    .result
                    .map_err(|e| (Phase::Render, e))
                    .and_then(|html| self.compose_page(doc, &html).map_err(|e| (Phase::Template, e)));
                match page {
                    Ok(page) => {
                        jobs.push(WriteJob {
                            path: self.output_path(&doc.file),
                            contents: page.into_bytes(),
                        });
                        targets.push(outcome.index);
                    }
                    Err((phase, e)) => {
                        self.context
                            .record_error(BuildError::new(display_relative(&doc.file), phase, e));
                    }
                }
            }

            let results = write_files(jobs, self.options.io_batch_size).await;
            for (index, result) in targets.into_iter().zip(results) {
                let doc = &batch[index];
                match result {
                    Ok(()) => {
                        let key = doc.file.path.to_string_lossy();
                        self.context.fingerprints.update(&key, &doc.content);
                        written += 1;
                    }
                    Err(e) => {
                        self.context
                            .record_error(BuildError::new(display_relative(&doc.file), Phase::Write, e));
                    }
                }
            }
        }

        written
    }

    /// Run one batch on the render lanes without blocking the runtime.
    async fn render_batch(&self, tasks: Vec<RenderTask>) -> Vec<RenderOutcome> {
        let indices: Vec<usize> = tasks.iter().map(|t| t.index).collect();
        let coordinator = Arc::clone(&self.coordinator);
        match tokio::task::spawn_blocking(move || coordinator.render_batch(tasks)).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::error!(error = %e, "Render batch aborted");
                indices
                    .into_iter()
                    .map(|index| RenderOutcome {
                        index,
                        result: Err(RenderError::Lost),
                    })
                    .collect()
            }
        }
    }

    /// Rewrite links in rendered HTML and apply the page template.
    fn compose_page(&self, doc: &PendingDocument, html: &str) -> Result<String, RenderError> {
        let ctx = &self.context;
        let template = ctx.templates.resolve(doc.template.as_deref())?;

        let (content, links) = rewrite_links(html, &doc.file.href(), &ctx.valid_paths);
        if links.inactive > 0 {
            tracing::debug!(
                path = %doc.file.relative.display(),
                inactive = links.inactive,
                total = links.total,
                "Document has unresolved links"
            );
        }

        let menu = ctx.menu_for(&doc.file.relative);
        Ok(template.render(&PageContext {
            title: &doc.title,
            content: &content,
            menu: menu.html,
            footer: ctx.templates.footer(),
            path: &doc.file.url_path,
            menu_position: menu.position.as_str(),
        }))
    }

    /// Copy static files whose `(mtime, size)` changed. Returns how many
    /// were copied.
    async fn copy_statics(&mut self, files: Vec<SourceFile>) -> usize {
        let mut pairs = Vec::new();
        let mut copies = Vec::new();
        for file in files {
            let Some(stat) = FileStat::of(&file.path) else {
                self.context.record_error(BuildError::new(
                    display_relative(&file),
                    Phase::Copy,
                    "cannot stat source file",
                ));
                continue;
            };
            let key = file.path.to_string_lossy().into_owned();
            let dest = self.output_path(&file);
            let dest_str = dest.to_string_lossy().into_owned();
            let fresh = self.context.stat_cache.fresh(&key, stat) == Some(dest_str.as_str())
                && tokio::fs::try_exists(&dest).await.unwrap_or(false);
            if fresh {
                continue;
            }
            pairs.push((file.path.clone(), dest));
            copies.push((file, key, stat, dest_str));
        }

        let results = copy_files(pairs, self.options.io_batch_size).await;
        let mut copied = 0;
        for ((file, key, stat, dest), result) in copies.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    self.context.stat_cache.record(&key, stat, dest);
                    copied += 1;
                }
                Err(e) => {
                    self.context
                        .record_error(BuildError::new(display_relative(&file), Phase::Copy, e));
                }
            }
        }
        copied
    }

    /// Update the previous full-text index in place, or build it anew.
    async fn update_fulltext(
        &self,
        documents: &[SearchDocument],
        changed: &HashSet<String>,
        clean: bool,
    ) -> FulltextIndex {
        let previous = if clean {
            None
        } else {
            artifacts::load_fulltext(&self.options.output_dir).await
        };
        let Some(mut index) = previous else {
            return FulltextIndex::build(documents);
        };

        let current: HashSet<&str> = documents.iter().map(|d| d.path.as_str()).collect();
        let removed: Vec<String> = index
            .documents()
            .into_iter()
            .filter(|p| !current.contains(p))
            .map(str::to_owned)
            .collect();
        let changed_docs: Vec<SearchDocument> = documents
            .iter()
            .filter(|d| changed.contains(&d.path))
            .cloned()
            .collect();
        index.update(&changed_docs, &removed);
        index
    }

    /// Delete outputs whose source no longer exists. Returns how many files
    /// were removed.
    async fn prune_outputs(&mut self) -> usize {
        let ctx = &mut self.context;
        let documents: HashSet<String> = ctx
            .tree
            .documents()
            .map(|f| f.path.to_string_lossy().into_owned())
            .collect();
        let statics: HashSet<String> = ctx
            .tree
            .static_files()
            .map(|f| f.path.to_string_lossy().into_owned())
            .collect();

        let mut stale = Vec::new();
        ctx.fingerprints.retain(|path| {
            let keep = documents.contains(path);
            if !keep {
                stale.push((PathBuf::from(path), SourceKind::Document));
            }
            keep
        });
        ctx.stat_cache.retain(|path| {
            let keep = statics.contains(path);
            if !keep {
                stale.push((PathBuf::from(path), SourceKind::Static));
            }
            keep
        });

        let mut removed = 0;
        for (source, kind) in stale {
            let Ok(relative) = source.strip_prefix(&self.options.source_dir) else {
                continue;
            };
            let output = match kind {
                SourceKind::Document => self.options.output_dir.join(relative.with_extension("html")),
                SourceKind::Static | SourceKind::Directory => self.options.output_dir.join(relative),
            };
            match tokio::fs::remove_file(&output).await {
                Ok(()) => {
                    tracing::debug!(path = %output.display(), "Removed output of deleted source");
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %output.display(), error = %e, "Failed to remove output"),
            }
        }
        removed
    }

    /// Save caches and the error report after a dev-mode partial run.
    async fn finish_partial(&mut self, mut report: BuildReport) -> BuildReport {
        if let Some(dir) = self.cache_dir() {
            self.context.fingerprints.save(&dir);
            self.context.stat_cache.save(&dir);
        }
        artifacts::write_error_report(&self.options.output_dir, &self.context.errors).await;
        self.observer.notify(BuildEvent::CacheReady);
        report.errors.clone_from(&self.context.errors);
        report
    }

    fn record_errors(&mut self, errors: Vec<BuildError>) {
        for error in errors {
            self.context.record_error(error);
        }
    }

    fn output_path(&self, file: &SourceFile) -> PathBuf {
        self.options.output_dir.join(file.output_relative())
    }
}

/// Source path relative to the source root, with forward slashes.
fn display_relative(file: &SourceFile) -> String {
    file.relative.to_string_lossy().replace('\\', "/")
}

/// Create the output root and prove it accepts writes.
async fn ensure_writable(output_dir: &Path) -> Result<(), RunError> {
    let probe = output_dir.join(".quire-write-probe");
    let result = async {
        tokio::fs::create_dir_all(output_dir).await?;
        tokio::fs::write(&probe, b"").await?;
        tokio::fs::remove_file(&probe).await
    }
    .await;
    result.map_err(|source| RunError::OutputNotWritable {
        path: output_dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use quire_render::RenderKind;

    use crate::artifacts::{FULLTEXT_INDEX_NAME, MENU_DATA_NAME, SEARCH_INDEX_NAME, custom_menu_file_name};
    use crate::error::{ERROR_REPORT_NAME, ErrorReport};

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn read(root: &Path, rel: &str) -> String {
        std::fs::read_to_string(root.join(rel)).unwrap()
    }

    /// Every file under `dir` with its bytes.
    fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(current) = stack.pop() {
            for entry in std::fs::read_dir(current).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    files.insert(path.clone(), std::fs::read(path).unwrap());
                }
            }
        }
        files
    }

    struct Site {
        dir: tempfile::TempDir,
        source: PathBuf,
        output: PathBuf,
    }

    impl Site {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let source = dir.path().join("docs");
            let output = dir.path().join("site");
            write(&source, "index.md", "# Home\n\nSee [guide](guide) and [nothing](./missing).\n");
            write(&source, "guide.md", "---\ntitle: Guide\n---\nInstall the widget.\n");
            write(&source, "api/index.md", "# API\n\nBack to [home](../index.html).\n");
            write(&source, "api/calls.wiki", "= Calls =\n\nSee [[/guide|the guide]].\n");
            write(&source, "img/logo.png", "png-bytes");
            Self {
                dir,
                source,
                output,
            }
        }

        fn options(&self) -> BuildOptions {
            let mut options = BuildOptions::new(&self.source, &self.output);
            options.render_batch_size = 2;
            options.io_batch_size = 2;
            options
        }

        fn builder(&self) -> SiteBuilder {
            SiteBuilder::new(self.options()).unwrap()
        }
    }

    /// Panics on documents containing `BOOM`.
    struct ExplodingRenderer(DefaultRenderer);

    impl Renderer for ExplodingRenderer {
        fn render(&self, content: &str, kind: RenderKind, ctx: &RenderContext) -> Result<String, RenderError> {
            assert!(!content.contains("BOOM"), "exploded");
            self.0.render(content, kind, ctx)
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<BuildEvent>>,
    }

    impl BuildObserver for RecordingObserver {
        fn notify(&self, event: BuildEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn test_build_writes_pages_and_artifacts() {
        let site = Site::new();
        let report = site.builder().build().await.unwrap();

        assert_eq!(report.documents, 4);
        assert_eq!(report.rendered, 4);
        assert_eq!(report.copied, 1);
        assert!(report.is_success(), "{:?}", report.errors);
        assert!(!report.nav_cache_hit);

        let index = read(&site.output, "index.html");
        assert!(index.contains("<title>Home</title>"));
        assert!(index.contains(r#"href="/guide.html""#));
        assert!(index.contains(r#"href="/missing""#));
        assert!(index.contains("inactive"));
        assert!(index.contains("menu-side"));

        assert!(read(&site.output, "api/index.html").contains(r#"href="/index.html""#));
        assert!(read(&site.output, "api/calls.html").contains(r#"href="/guide.html""#));
        assert!(read(&site.output, "guide.html").contains("<title>Guide</title>"));
        assert_eq!(read(&site.output, "img/logo.png"), "png-bytes");

        for artifact in [SEARCH_INDEX_NAME, FULLTEXT_INDEX_NAME, MENU_DATA_NAME] {
            assert!(site.output.join(artifact).exists(), "{artifact} missing");
        }
        assert!(!site.output.join(ERROR_REPORT_NAME).exists());
        assert!(site.source.join(".quire/nav-cache.json").exists());
        assert!(site.source.join(".quire/content-hashes.json").exists());
    }

    #[tokio::test]
    async fn test_second_build_is_idempotent() {
        let site = Site::new();
        site.builder().build().await.unwrap();
        let first = snapshot(&site.output);

        let report = site.builder().build().await.unwrap();

        assert_eq!(report.rendered, 0);
        assert_eq!(report.skipped, 4);
        assert_eq!(report.copied, 0);
        assert!(report.nav_cache_hit);
        assert_eq!(snapshot(&site.output), first);
    }

    #[tokio::test]
    async fn test_nav_cache_tracks_navigation_files_only() {
        let site = Site::new();
        site.builder().build().await.unwrap();

        write(&site.source, "guide.md", "---\ntitle: Guide\n---\nInstall the bigger widget.\n");
        let report = site.builder().build().await.unwrap();
        assert!(report.nav_cache_hit);
        assert_eq!(report.rendered, 1);
        assert!(read(&site.output, "guide.html").contains("bigger widget"));

        write(&site.source, "api/index.md", "# API reference\n");
        let report = site.builder().build().await.unwrap();
        assert!(!report.nav_cache_hit);
    }

    fn touch(path: &Path) {
        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(3600);
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(later)
            .unwrap();
    }

    #[tokio::test]
    async fn test_mtime_of_navigation_file_invalidates_nav_cache() {
        let site = Site::new();
        site.builder().build().await.unwrap();

        touch(&site.source.join("guide.md"));
        let report = site.builder().build().await.unwrap();
        assert!(report.nav_cache_hit);
        assert_eq!(report.rendered, 0);

        touch(&site.source.join("api/index.md"));
        let report = site.builder().build().await.unwrap();
        assert!(!report.nav_cache_hit);
    }

    #[tokio::test]
    async fn test_render_failure_is_isolated() {
        let site = Site::new();
        write(&site.source, "bad.md", "# Bad\n\nBOOM\n");
        let renderer = Arc::new(ExplodingRenderer(DefaultRenderer::new()));
        let mut builder = SiteBuilder::with_renderer(site.options(), renderer).unwrap();

        let report = builder.build().await.unwrap();

        assert_eq!(report.rendered, 4);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].file, "bad.md");
        assert_eq!(report.errors[0].phase, Phase::Render);
        assert!(report.errors[0].message.contains("exploded"));
        assert!(!site.output.join("bad.html").exists());
        assert!(site.output.join("guide.html").exists());

        let written: ErrorReport = serde_json::from_str(&read(&site.output, ERROR_REPORT_NAME)).unwrap();
        assert_eq!(written.failed_files, vec!["bad.md"]);

        write(&site.source, "bad.md", "# Bad\n\nfixed\n");
        let report = builder.build().await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.rendered, 1);
        assert!(!site.output.join(ERROR_REPORT_NAME).exists());
    }

    #[tokio::test]
    async fn test_missing_template_skips_only_that_file() {
        let site = Site::new();
        write(&site.source, "wide.md", "---\ntemplate: wide\n---\n# Wide\n");

        let report = site.builder().build().await.unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].phase, Phase::Template);
        assert_eq!(report.errors[0].file, "wide.md");
        assert!(!site.output.join("wide.html").exists());
        assert_eq!(report.rendered, 4);
    }

    #[tokio::test]
    async fn test_named_template_and_template_change() {
        let site = Site::new();
        let meta = site.dir.path().join("meta");
        write(&meta, "template.html", "<main>{{content}}</main>");
        write(&meta, "templates/wide.html", "<wide>{{content}}</wide>");
        write(&site.source, "wide.md", "---\ntemplate: wide\n---\n# Wide\n");
        let mut options = site.options();
        options.meta_dir = Some(meta.clone());

        let report = SiteBuilder::new(options.clone()).unwrap().build().await.unwrap();
        assert!(report.is_success(), "{:?}", report.errors);
        assert!(read(&site.output, "wide.html").starts_with("<wide>"));
        assert!(read(&site.output, "guide.html").starts_with("<main>"));

        write(&meta, "template.html", "<article>{{content}}</article>");
        let report = SiteBuilder::new(options).unwrap().build().await.unwrap();
        assert_eq!(report.rendered, report.documents);
        assert!(read(&site.output, "guide.html").starts_with("<article>"));
    }

    #[tokio::test]
    async fn test_deleted_sources_are_pruned() {
        let site = Site::new();
        site.builder().build().await.unwrap();

        std::fs::remove_file(site.source.join("guide.md")).unwrap();
        std::fs::remove_file(site.source.join("img/logo.png")).unwrap();
        let report = site.builder().build().await.unwrap();

        assert_eq!(report.removed, 2);
        assert!(!site.output.join("guide.html").exists());
        assert!(!site.output.join("img/logo.png").exists());
        let titles = read(&site.output, SEARCH_INDEX_NAME);
        assert!(!titles.contains("/guide.html"));
        assert!(!read(&site.output, FULLTEXT_INDEX_NAME).contains("\"/guide\""));
    }

    #[tokio::test]
    async fn test_clean_build_regenerates_everything() {
        let site = Site::new();
        site.builder().build().await.unwrap();

        let report = SiteBuilder::new(site.options().with_clean(true))
            .unwrap()
            .build()
            .await
            .unwrap();

        assert_eq!(report.rendered, 4);
        assert_eq!(report.copied, 1);
        assert!(!report.nav_cache_hit);
    }

    #[tokio::test]
    async fn test_request_full_and_invalidate_navigation() {
        let site = Site::new();
        let mut builder = site.builder();
        builder.build().await.unwrap();

        builder.invalidate_navigation();
        let report = builder.build().await.unwrap();
        assert!(!report.nav_cache_hit);
        assert_eq!(report.rendered, 0);

        builder.request_full();
        let report = builder.build().await.unwrap();
        assert_eq!(report.rendered, 4);

        let report = builder.build().await.unwrap();
        assert_eq!(report.rendered, 0);
        assert!(report.nav_cache_hit);
    }

    #[tokio::test]
    async fn test_rebuild_file_updates_page_and_search() {
        let site = Site::new();
        let mut builder = site.builder();
        builder.build().await.unwrap();

        write(&site.source, "guide.md", "---\ntitle: Setup Guide\n---\nConfigure the gizmo.\n");
        let report = builder.rebuild_file(&site.source.join("guide.md")).await.unwrap();

        assert_eq!(report.rendered, 1);
        assert!(read(&site.output, "guide.html").contains("gizmo"));
        assert!(read(&site.output, SEARCH_INDEX_NAME).contains("Setup Guide"));
        assert!(read(&site.output, FULLTEXT_INDEX_NAME).contains("gizmo"));
        assert!(builder.context().titles.get("/guide").is_some());

        let report = builder.rebuild_file(&site.source.join("guide.md")).await.unwrap();
        assert_eq!(report.rendered, 0);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_rebuild_vanished_file_leaves_search() {
        let site = Site::new();
        let mut builder = site.builder();
        builder.build().await.unwrap();

        std::fs::remove_file(site.source.join("guide.md")).unwrap();
        let report = builder.rebuild_file(&site.source.join("guide.md")).await.unwrap();

        assert_eq!(report.rendered, 0);
        assert!(report.is_success());
        assert!(builder.context().titles.get("/guide").is_none());
        assert!(!builder.context().fulltext.documents().contains("/guide"));
        assert!(!read(&site.output, SEARCH_INDEX_NAME).contains("\"/guide\""));
    }

    #[tokio::test]
    async fn test_rebuild_unknown_file_runs_full_build() {
        let site = Site::new();
        let mut builder = site.builder();
        builder.build().await.unwrap();

        write(&site.source, "new.md", "# New\n");
        let report = builder.rebuild_file(&site.source.join("new.md")).await.unwrap();

        assert_eq!(report.documents, 5);
        assert!(site.output.join("new.html").exists());
        assert!(read(&site.output, "index.html").contains("/new.html"));
    }

    #[tokio::test]
    async fn test_copy_static_copies_changed_asset() {
        let site = Site::new();
        let mut builder = site.builder();
        builder.build().await.unwrap();

        write(&site.source, "img/logo.png", "new-png-bytes");
        let report = builder.copy_static(&site.source.join("img/logo.png")).await.unwrap();

        assert_eq!(report.copied, 1);
        assert_eq!(read(&site.output, "img/logo.png"), "new-png-bytes");
    }

    #[tokio::test]
    async fn test_custom_menu_applies_to_folder() {
        let site = Site::new();
        write(&site.source, "api/_menu.md", "---\nposition: top\n---\n- [Calls](calls)\n- [Gone](gone)\n");

        let report = site.builder().build().await.unwrap();
        assert!(report.is_success(), "{:?}", report.errors);

        let calls = read(&site.output, "api/calls.html");
        assert!(calls.contains("menu-top"));
        assert!(calls.contains(r#"<span class="inactive">Gone</span>"#));
        assert!(read(&site.output, "guide.html").contains("menu-side"));
        assert!(site.output.join(custom_menu_file_name("api")).exists());
    }

    #[tokio::test]
    async fn test_observer_sees_phases_in_order() {
        let site = Site::new();
        let observer = Arc::new(RecordingObserver::default());
        let mut builder = site.builder().with_observer(Arc::clone(&observer) as Arc<dyn BuildObserver>);

        builder.build().await.unwrap();

        assert_eq!(
            *observer.events.lock().unwrap(),
            vec![
                BuildEvent::Building,
                BuildEvent::MenuReady,
                BuildEvent::SearchReady,
                BuildEvent::CacheReady,
            ]
        );
    }

    #[tokio::test]
    async fn test_fatal_errors() {
        let site = Site::new();

        let mut options = site.options();
        options.source_dir = site.dir.path().join("missing");
        let err = SiteBuilder::new(options).unwrap().build().await.unwrap_err();
        assert!(matches!(err, RunError::Source(_)));

        let blocked = site.dir.path().join("blocked");
        std::fs::write(&blocked, "file, not a directory").unwrap();
        let mut options = site.options();
        options.output_dir = blocked;
        let err = SiteBuilder::new(options).unwrap().build().await.unwrap_err();
        assert!(matches!(err, RunError::OutputNotWritable { .. }));
    }

    #[tokio::test]
    async fn test_cache_disabled_regenerates_and_persists_nothing() {
        let site = Site::new();
        let mut options = site.options();
        options.cache_enabled = false;

        let mut builder = SiteBuilder::new(options).unwrap();
        builder.build().await.unwrap();
        let report = builder.build().await.unwrap();

        assert_eq!(report.rendered, 4);
        assert!(!report.nav_cache_hit);
        assert!(!site.source.join(".quire").exists());
    }
}

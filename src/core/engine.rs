//! Engine facade: initialize, search, refresh and shutdown.
//!
//! `DocSearch` ties the indexer, the storage layer and the source
//! collaborators together. All on-disk mutation happens while holding
//! both the in-process rebuild mutex and the cross-process lock
//! record; searches take neither.
//!
//! # Initialization order
//!
//! 1. Published local index whose schema marker matches
//! 2. Prebuilt index shipped in the fallback bundle
//! 3. Rebuild from the locally cached source document
//! 4. Rebuild from the fallback corpus
//!
//! A local index that fails the version check or fails to open is
//! discarded with a warning and the next option is tried.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::core::config::Config;
use crate::core::error::{DocSearchError, Result};
use crate::core::indexer::{IndexingPipeline, INDEX_SCHEMA_VERSION};
use crate::core::search::{effective_limit, validate_query, DEFAULT_RESULTS, MAX_RESULTS};
use crate::core::source::{DirFallback, EmbeddedFallback, FallbackSource, HttpFetcher, SourceFetcher};
use crate::core::storage::cache::write_atomic;
use crate::core::storage::{
    build_generation_dir, read_version, release_if_owned, write_version, CacheMetadata, DataLayout,
    Generation, IndexHolder, LockGuard, LockOptions,
};
use crate::core::types::{BuildStats, Chunk, IndexStatus, RefreshOutcome, SearchResponse};

/// Default freshness window for the cached corpus
const DEFAULT_FRESHNESS_DAYS: i64 = 7;

/// Documentation search engine over one data root
pub struct DocSearch {
    holder: IndexHolder,
    layout: DataLayout,
    fetcher: Arc<dyn SourceFetcher>,
    fallback: Arc<dyn FallbackSource>,
    pipeline: IndexingPipeline,
    lock_options: LockOptions,
    freshness: chrono::Duration,
    default_results: usize,
    max_results: usize,
    shut_down: AtomicBool,
}

impl std::fmt::Debug for DocSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocSearch")
            .field("layout", &self.layout)
            .field("fetcher", &self.fetcher.describe())
            .field("fallback", &self.fallback.describe())
            .field("holder", &self.holder)
            .finish()
    }
}

impl DocSearch {
    pub fn new(
        layout: DataLayout,
        fetcher: Arc<dyn SourceFetcher>,
        fallback: Arc<dyn FallbackSource>,
    ) -> Self {
        Self {
            holder: IndexHolder::new(),
            layout,
            fetcher,
            fallback,
            pipeline: IndexingPipeline::default(),
            lock_options: LockOptions::default(),
            freshness: chrono::Duration::days(DEFAULT_FRESHNESS_DAYS),
            default_results: DEFAULT_RESULTS,
            max_results: MAX_RESULTS,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Build an engine from configuration: HTTP fetcher for the
    /// configured URL, and either the configured fallback directory
    /// or the embedded bundle.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.source.url.clone(), config.fetch_timeout())?;
        let fallback: Arc<dyn FallbackSource> = match &config.storage.fallback_dir {
            Some(dir) => Arc::new(DirFallback::new(dir)),
            None => Arc::new(EmbeddedFallback),
        };

        Ok(Self::new(config.layout(), Arc::new(fetcher), fallback)
            .with_lock_options(config.lock_options())
            .with_freshness(config.freshness_window())
            .with_result_limits(config.search.default_results, config.search.max_results))
    }

    pub fn with_lock_options(mut self, options: LockOptions) -> Self {
        self.lock_options = options;
        self
    }

    pub fn with_freshness(mut self, window: chrono::Duration) -> Self {
        self.freshness = window;
        self
    }

    pub fn with_result_limits(mut self, default_results: usize, max_results: usize) -> Self {
        self.default_results = default_results;
        self.max_results = max_results;
        self
    }

    pub fn with_pipeline(mut self, pipeline: IndexingPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn holder(&self) -> &IndexHolder {
        &self.holder
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(DocSearchError::IndexClosed);
        }
        Ok(())
    }

    /// Open the best available index and publish it.
    ///
    /// Returns immediately when a generation is already published.
    /// Holds the lock record while touching the data root.
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_running()?;

        let _rebuild = self.holder.rebuild_lock().lock().await;
        if self.holder.is_published() {
            return Ok(());
        }

        let start = Instant::now();
        let lock = LockGuard::acquire(&self.layout.lock_file(), self.lock_options).await?;
        let result = self.open_best_available().await;
        let released = lock.release();

        result?;
        released?;

        tracing::info!(
            "Index initialized in {}ms",
            start.elapsed().as_millis()
        );
        Ok(())
    }

    async fn open_best_available(&self) -> Result<()> {
        self.layout.ensure_dirs()?;

        if let Some(generation) = self.open_local() {
            tracing::info!(
                "Opened local index ({} chunks)",
                generation.doc_count()
            );
            self.publish(generation);
            return Ok(());
        }

        if let Some(generation) = self.extract_fallback_index()? {
            tracing::info!(
                "Opened prebuilt index from {} ({} chunks)",
                self.fallback.describe(),
                generation.doc_count()
            );
            self.restore_fallback_corpus();
            self.publish(generation);
            return Ok(());
        }

        let source = self.layout.source_file();
        if source.is_file() {
            let parsed = self.pipeline.parse_file(&source)?;
            if !parsed.chunks.is_empty() {
                tracing::info!("Rebuilding index from cached source {:?}", source);
                self.rebuild_from_chunks(parsed.chunks).await?;
                return Ok(());
            }
            tracing::warn!("Cached source {:?} has no sections, ignoring it", source);
        }

        let Some(corpus) = self.fallback.read_file(&self.layout.bundle_source_path())? else {
            return Err(DocSearchError::FallbackMissing(format!(
                "{} has no {}",
                self.fallback.describe(),
                self.layout.bundle_source_path()
            )));
        };

        tracing::info!("Rebuilding index from {}", self.fallback.describe());
        let parsed = self.pipeline.parse_bytes(&corpus);
        if parsed.chunks.is_empty() {
            return Err(DocSearchError::IndexingFailed(format!(
                "{} produced no chunks",
                self.layout.bundle_source_path()
            )));
        }
        write_atomic(&source, &corpus)?;
        self.rebuild_from_chunks(parsed.chunks).await?;
        Ok(())
    }

    /// Open the published local index if its marker matches.
    ///
    /// Anything unusable is removed so the caller can rebuild.
    fn open_local(&self) -> Option<Arc<Generation>> {
        let index_dir = self.layout.index_dir();
        if !index_dir.is_dir() {
            return None;
        }

        match read_version(&self.layout.version_file()) {
            Some(INDEX_SCHEMA_VERSION) => {}
            found => {
                let err = DocSearchError::SchemaMismatch {
                    found: found.unwrap_or(0),
                    expected: INDEX_SCHEMA_VERSION,
                };
                tracing::warn!("{}, discarding local index", err);
                self.discard_local_index();
                return None;
            }
        }

        match Generation::open(&index_dir, self.holder.next_generation_id()) {
            Ok(generation) => Some(Arc::new(generation)),
            Err(e) => {
                tracing::warn!("{}, discarding local index", e);
                self.discard_local_index();
                None
            }
        }
    }

    fn discard_local_index(&self) {
        for result in [
            remove_dir_if_exists(&self.layout.index_dir()),
            remove_file_if_exists(&self.layout.version_file()),
        ] {
            if let Err(e) = result {
                tracing::warn!("Failed to discard local index: {}", e);
            }
        }
    }

    /// Copy the bundle's prebuilt index into place and open it.
    ///
    /// `None` when the bundle has no index or its marker does not
    /// match the current schema.
    fn extract_fallback_index(&self) -> Result<Option<Arc<Generation>>> {
        let prefix = self.layout.bundle_index_prefix();
        let files = self.fallback.list_files(&prefix)?;
        if files.is_empty() {
            return Ok(None);
        }

        let version = self
            .fallback
            .read_file(&self.layout.bundle_version_path())?
            .and_then(|data| String::from_utf8_lossy(&data).trim().parse::<u32>().ok());
        if version != Some(INDEX_SCHEMA_VERSION) {
            tracing::warn!(
                "Prebuilt index in {} has schema v{} (expected v{}), ignoring",
                self.fallback.describe(),
                version.unwrap_or(0),
                INDEX_SCHEMA_VERSION
            );
            return Ok(None);
        }

        let staging = self.layout.staging_dir();
        remove_dir_if_exists(&staging)?;
        for file in &files {
            let Some(relative) = file.strip_prefix(&prefix).filter(|r| !r.is_empty()) else {
                continue;
            };
            let Some(data) = self.fallback.read_file(file)? else {
                continue;
            };
            let target = staging.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, data)?;
        }

        swap_into_place(&self.layout, &staging)?;

        match Generation::open(&self.layout.index_dir(), self.holder.next_generation_id()) {
            Ok(generation) => Ok(Some(Arc::new(generation))),
            Err(e) => {
                tracing::warn!("Prebuilt index unusable ({}), discarding", e);
                self.discard_local_index();
                Ok(None)
            }
        }
    }

    /// Place the fallback corpus in `docs/` when no local copy exists
    fn restore_fallback_corpus(&self) {
        let source = self.layout.source_file();
        if source.exists() {
            return;
        }

        match self.fallback.read_file(&self.layout.bundle_source_path()) {
            Ok(Some(corpus)) => {
                if let Err(e) = write_atomic(&source, &corpus) {
                    tracing::warn!("Failed to restore fallback corpus: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read fallback corpus: {}", e),
        }
    }

    fn publish(&self, generation: Arc<Generation>) {
        if let Some(old) = self.holder.publish(generation) {
            self.holder.retire(old);
        }
    }

    /// Run a query against the current generation.
    ///
    /// Initializes the engine first when nothing is published yet.
    pub async fn search(&self, query: &str, max_results: Option<usize>) -> Result<SearchResponse> {
        let query = validate_query(query)?;
        let limit = effective_limit(max_results, self.default_results, self.max_results);
        self.ensure_running()?;

        let mut guard = self.holder.enter();
        if guard.generation().is_none() {
            drop(guard);
            self.initialize().await?;
            guard = self.holder.enter();
        }

        let Some(generation) = guard.generation() else {
            return Err(DocSearchError::IndexNotInitialized);
        };

        let start = Instant::now();
        let (results, total_hits) = generation.search(query, limit)?;
        tracing::debug!(
            "Search '{}' returned {}/{} hits in {}ms (generation {})",
            query,
            results.len(),
            total_hits,
            start.elapsed().as_millis(),
            generation.id()
        );

        Ok(SearchResponse {
            results,
            total_hits,
            query: query.to_string(),
        })
    }

    /// Fetch the source document and rebuild, unless the cached
    /// corpus is younger than the freshness window and `force` is
    /// not set.
    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome> {
        self.ensure_running()?;

        if !force {
            if let Some(outcome) = self.fresh_outcome() {
                return Ok(outcome);
            }
        }

        let _rebuild = self.holder.rebuild_lock().lock().await;

        // Another caller may have refreshed while we waited
        if !force {
            if let Some(outcome) = self.fresh_outcome() {
                return Ok(outcome);
            }
        }

        let lock = LockGuard::acquire(&self.layout.lock_file(), self.lock_options).await?;
        let result = self.refresh_locked().await;
        let released = lock.release();

        let outcome = result?;
        released?;
        Ok(outcome)
    }

    fn fresh_outcome(&self) -> Option<RefreshOutcome> {
        let meta = CacheMetadata::load(&self.layout.cache_meta())?;
        if !meta.is_fresh(self.freshness) || !self.layout.source_file().is_file() {
            return None;
        }

        let chunks_indexed = self
            .holder
            .current()
            .map(|g| g.doc_count() as usize)
            .unwrap_or(meta.chunks_indexed);

        Some(RefreshOutcome {
            updated: false,
            chunks_indexed,
            last_update: Some(meta.last_update),
            message: format!(
                "Documentation is up to date (last update {})",
                meta.last_update.to_rfc3339()
            ),
        })
    }

    async fn refresh_locked(&self) -> Result<RefreshOutcome> {
        let start = Instant::now();
        self.layout.ensure_dirs()?;

        let corpus = Arc::new(self.fetcher.fetch().await?);

        let pipeline = self.pipeline.clone();
        let bytes = Arc::clone(&corpus);
        let parsed = tokio::task::spawn_blocking(move || pipeline.parse_bytes(&bytes))
            .await
            .map_err(|e| DocSearchError::IndexingFailed(format!("Parse task failed: {e}")))?;

        // The cached corpus is only replaced by one that indexes
        if parsed.chunks.is_empty() {
            return Err(DocSearchError::IndexingFailed(
                "Source document produced no chunks".to_string(),
            ));
        }
        write_atomic(&self.layout.source_file(), &corpus)?;

        let chunks_indexed = self.rebuild_from_chunks(parsed.chunks).await?;

        let meta = CacheMetadata::new(self.fetcher.describe(), chunks_indexed, INDEX_SCHEMA_VERSION);
        meta.save(&self.layout.cache_meta())?;

        tracing::info!(
            "Refreshed documentation: {} chunks in {}ms",
            chunks_indexed,
            start.elapsed().as_millis()
        );

        Ok(RefreshOutcome {
            updated: true,
            chunks_indexed,
            last_update: Some(meta.last_update),
            message: format!("Indexed {chunks_indexed} chunks"),
        })
    }

    /// Build a new generation from `chunks`, swap it into place and
    /// publish it. The replaced generation is retired in the
    /// background.
    ///
    /// Callers hold the rebuild mutex and the lock record.
    async fn rebuild_from_chunks(&self, chunks: Vec<Chunk>) -> Result<usize> {
        let layout = self.layout.clone();
        let start = Instant::now();

        let written = tokio::task::spawn_blocking(move || install_generation(&layout, &chunks))
            .await
            .map_err(|e| DocSearchError::IndexingFailed(format!("Build task failed: {e}")))??;

        let swap_start = Instant::now();
        let generation = Arc::new(Generation::open(
            &self.layout.index_dir(),
            self.holder.next_generation_id(),
        )?);
        self.publish(generation);

        tracing::info!(
            "Published {} chunks (build {}ms, swap {}ms)",
            written,
            swap_start.duration_since(start).as_millis(),
            swap_start.elapsed().as_millis()
        );
        Ok(written)
    }

    /// Drain searches, close the current generation and release the
    /// lock record.
    ///
    /// Every step runs even if an earlier one failed; the first error
    /// is returned.
    pub async fn shutdown(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::Release);
        let _rebuild = self.holder.rebuild_lock().lock().await;

        let current = self.holder.take();
        self.holder.wait_for_drain().await;
        if let Some(generation) = current {
            generation.close();
        }

        let released = release_if_owned(&self.layout.lock_file());
        tracing::info!("Documentation search shut down");
        released
    }

    /// Snapshot of the engine and on-disk state
    pub fn status(&self) -> IndexStatus {
        let meta = CacheMetadata::load(&self.layout.cache_meta());
        IndexStatus {
            data_dir: self.layout.root().to_path_buf(),
            published: self.holder.is_published(),
            doc_count: self.holder.current().map(|g| g.doc_count()).unwrap_or(0),
            schema_version: read_version(&self.layout.version_file()),
            last_update: meta.as_ref().map(|m| m.last_update),
            stale: meta.map_or(true, |m| !m.is_fresh(self.freshness)),
            in_flight: self.holder.in_flight(),
        }
    }
}

/// Parse `source` and write a bundle at `dest`: the corpus under
/// `docs/`, the index under `search/index/` and its schema marker.
///
/// The result can be used directly as a fallback directory.
pub fn build_index_file(source: &Path, dest: &Path) -> Result<BuildStats> {
    let start = Instant::now();

    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            DocSearchError::IndexingFailed(format!("Source {source:?} is not a file"))
        })?;
    let layout = DataLayout::with_source_file(dest, file_name);
    layout.ensure_dirs()?;

    let parsed = IndexingPipeline::default().parse_file(source)?;
    if parsed.chunks.is_empty() {
        return Err(DocSearchError::IndexingFailed(format!(
            "{source:?} produced no chunks"
        )));
    }
    let chunks_indexed = install_generation(&layout, &parsed.chunks)?;

    if fs::canonicalize(source).ok() != fs::canonicalize(layout.source_file()).ok() {
        fs::copy(source, layout.source_file())?;
    }

    Ok(BuildStats {
        chunks_indexed,
        avg_tokens: parsed.avg_tokens,
        oversized: parsed.oversized,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Build `chunks` into the staging directory and swap it into place
fn install_generation(layout: &DataLayout, chunks: &[Chunk]) -> Result<usize> {
    let staging = layout.staging_dir();
    let written = build_generation_dir(&staging, chunks)?;
    swap_into_place(layout, &staging)?;
    Ok(written)
}

/// Replace `search/index` with `staging`, then stamp the schema
/// marker.
///
/// The marker is removed first, so a crash mid-swap leaves an index
/// that the next initialization discards.
fn swap_into_place(layout: &DataLayout, staging: &Path) -> Result<()> {
    let index_dir = layout.index_dir();
    remove_file_if_exists(&layout.version_file())?;
    remove_dir_if_exists(&index_dir)?;
    fs::rename(staging, &index_dir).map_err(|e| {
        DocSearchError::StorageError(format!(
            "Failed to move {staging:?} to {index_dir:?}: {e}"
        ))
    })?;
    write_version(&layout.version_file(), INDEX_SCHEMA_VERSION)
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

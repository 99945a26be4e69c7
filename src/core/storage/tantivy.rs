//! Tantivy integration for BM25 full-text search.
//!
//! This module wraps Tantivy operations for building an index
//! generation from chunks, opening a built generation and searching
//! it.

use crate::core::error::{DocSearchError, Result};
use crate::core::search::build_match_query;
use crate::core::types::{Chunk, SearchHit};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use tantivy::collector::{Count, TopDocs};
use tantivy::schema::*;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};

/// Documents per progress batch while building
pub const INSERT_BATCH_SIZE: usize = 100;

/// Writer memory budget (50MB heap)
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Create the Tantivy schema for chunk indexing
///
/// Fields:
/// - id: Chunk identifier (STRING | STORED)
/// - page, category, subcategory, breadcrumb: Titles (TEXT | STORED)
/// - content: Full-text searchable body (TEXT | STORED)
/// - url: Canonical link (STORED)
/// - keywords: Key terms, one value per keyword (TEXT | STORED)
/// - token_count: Estimated tokens (u64 | STORED)
pub fn create_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field("id", STRING | STORED);

    // Searchable text
    builder.add_text_field("page", TEXT | STORED);
    builder.add_text_field("category", TEXT | STORED);
    builder.add_text_field("subcategory", TEXT | STORED);
    builder.add_text_field("breadcrumb", TEXT | STORED);
    builder.add_text_field("content", TEXT | STORED);
    builder.add_text_field("keywords", TEXT | STORED);

    // Retrieval only
    builder.add_text_field("url", STORED);
    builder.add_u64_field("token_count", STORED);

    builder.build()
}

/// Resolved schema fields
#[derive(Debug, Clone, Copy)]
struct ChunkFields {
    id: Field,
    page: Field,
    category: Field,
    subcategory: Field,
    breadcrumb: Field,
    content: Field,
    keywords: Field,
    url: Field,
    token_count: Field,
}

impl ChunkFields {
    fn from_schema(schema: &Schema) -> Result<Self> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|e| DocSearchError::IndexCorrupted(format!("Missing {name} field: {e}")))
        };

        Ok(Self {
            id: field("id")?,
            page: field("page")?,
            category: field("category")?,
            subcategory: field("subcategory")?,
            breadcrumb: field("breadcrumb")?,
            content: field("content")?,
            keywords: field("keywords")?,
            url: field("url")?,
            token_count: field("token_count")?,
        })
    }

    /// Fields a query is matched against; content first
    fn searchable(&self) -> [Field; 6] {
        [
            self.content,
            self.page,
            self.category,
            self.subcategory,
            self.breadcrumb,
            self.keywords,
        ]
    }

    fn to_document(self, chunk: &Chunk) -> TantivyDocument {
        let mut doc = TantivyDocument::default();
        doc.add_text(self.id, &chunk.id);
        doc.add_text(self.page, &chunk.page);
        doc.add_text(self.category, &chunk.category);
        doc.add_text(self.subcategory, &chunk.subcategory);
        doc.add_text(self.breadcrumb, &chunk.breadcrumb);
        doc.add_text(self.content, &chunk.content);
        for keyword in &chunk.keywords {
            doc.add_text(self.keywords, keyword);
        }
        doc.add_text(self.url, &chunk.url);
        doc.add_u64(self.token_count, chunk.token_count as u64);
        doc
    }

    fn to_chunk(self, doc: &TantivyDocument) -> Chunk {
        let text = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        Chunk {
            id: text(self.id),
            page: text(self.page),
            category: text(self.category),
            subcategory: text(self.subcategory),
            content: text(self.content),
            url: text(self.url),
            breadcrumb: text(self.breadcrumb),
            keywords: doc
                .get_all(self.keywords)
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect(),
            token_count: doc
                .get_first(self.token_count)
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize,
        }
    }
}

/// Writes one generation into a fresh directory
pub struct IndexBuilder {
    dir: PathBuf,
    writer: IndexWriter,
    fields: ChunkFields,
    added: usize,
}

impl fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("dir", &self.dir)
            .field("added", &self.added)
            .finish()
    }
}

impl IndexBuilder {
    /// Create an empty index at `dir`, replacing any leftover
    /// directory from an interrupted build.
    pub fn create(dir: &Path) -> Result<Self> {
        if dir.exists() {
            tracing::debug!("Removing leftover staging directory {:?}", dir);
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;

        let schema = create_schema();
        let fields = ChunkFields::from_schema(&schema)?;

        let index = Index::create_in_dir(dir, schema)
            .map_err(|e| DocSearchError::IndexingFailed(format!("Failed to create index: {e}")))?;

        let writer: IndexWriter = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| DocSearchError::IndexingFailed(format!("Failed to create writer: {e}")))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            writer,
            fields,
            added: 0,
        })
    }

    /// Add chunks in batches of [`INSERT_BATCH_SIZE`]
    pub fn add_chunks(&mut self, chunks: &[Chunk]) -> Result<()> {
        for batch in chunks.chunks(INSERT_BATCH_SIZE) {
            for chunk in batch {
                self.writer
                    .add_document(self.fields.to_document(chunk))
                    .map_err(|e| {
                        DocSearchError::IndexingFailed(format!(
                            "Failed to add chunk {}: {e}",
                            chunk.id
                        ))
                    })?;
            }
            self.added += batch.len();
            tracing::debug!("Indexed {}/{} chunks", self.added, chunks.len());
        }
        Ok(())
    }

    /// Commit, wait for merges and release the writer.
    ///
    /// Returns the number of documents written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer
            .commit()
            .map_err(|e| DocSearchError::IndexingFailed(format!("Failed to commit: {e}")))?;
        self.writer
            .wait_merging_threads()
            .map_err(|e| DocSearchError::IndexingFailed(format!("Failed to close writer: {e}")))?;
        Ok(self.added)
    }
}

/// Build a complete generation at `dir`.
///
/// On any failure the partially written directory is removed.
pub fn build_generation_dir(dir: &Path, chunks: &[Chunk]) -> Result<usize> {
    let result = IndexBuilder::create(dir).and_then(|mut builder| {
        builder.add_chunks(chunks)?;
        builder.finish()
    });

    if result.is_err() && dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(dir) {
            tracing::warn!("Failed to remove aborted build {:?}: {}", dir, e);
        }
    }
    result
}

/// Lifecycle of a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GenerationState {
    /// Opened, not yet visible to searches
    Building = 0,
    /// Current target of new searches
    Published = 1,
    /// Replaced; finishing searches that started before the swap
    Draining = 2,
    /// Released; refuses searches
    Closed = 3,
}

impl GenerationState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => GenerationState::Building,
            1 => GenerationState::Published,
            2 => GenerationState::Draining,
            _ => GenerationState::Closed,
        }
    }
}

/// An opened, immutable index generation
pub struct Generation {
    id: u64,
    path: PathBuf,
    index: Index,
    reader: IndexReader,
    fields: ChunkFields,
    state: AtomicU8,
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generation")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("state", &self.state())
            .finish()
    }
}

impl Generation {
    /// Open the generation stored at `path`.
    ///
    /// Failures to open or a schema without the chunk fields are
    /// reported as [`DocSearchError::IndexCorrupted`].
    pub fn open(path: &Path, id: u64) -> Result<Self> {
        let index = Index::open_in_dir(path)
            .map_err(|e| DocSearchError::IndexCorrupted(format!("Failed to open index: {e}")))?;

        let fields = ChunkFields::from_schema(&index.schema())?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| DocSearchError::IndexCorrupted(format!("Failed to create reader: {e}")))?;

        Ok(Self {
            id,
            path: path.to_path_buf(),
            index,
            reader,
            fields,
            state: AtomicU8::new(GenerationState::Building as u8),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> GenerationState {
        GenerationState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: GenerationState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.state() == GenerationState::Closed
    }

    /// Mark the generation closed; later searches fail with
    /// [`DocSearchError::IndexClosed`].
    pub fn close(&self) {
        self.set_state(GenerationState::Closed);
        tracing::debug!("Closed index generation {}", self.id);
    }

    /// Number of chunks in this generation
    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Run a BM25 match query and return the top `limit` hits with
    /// the total number of matching chunks.
    pub fn search(&self, query: &str, limit: usize) -> Result<(Vec<SearchHit>, usize)> {
        if self.is_closed() {
            return Err(DocSearchError::IndexClosed);
        }

        let Some(query) = build_match_query(&self.index, &self.fields.searchable(), query)? else {
            return Ok((Vec::new(), 0));
        };

        let searcher = self.reader.searcher();
        let (top_docs, total) = searcher
            .search(query.as_ref(), &(TopDocs::with_limit(limit.max(1)), Count))
            .map_err(|e| DocSearchError::SearchFailed(format!("Search failed: {e}")))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address).map_err(|e| {
                DocSearchError::SearchFailed(format!("Failed to retrieve document: {e}"))
            })?;
            hits.push(SearchHit {
                chunk: self.fields.to_chunk(&doc),
                relevance_score: score,
            });
        }

        Ok((hits, total))
    }
}

//! Indexing pipeline orchestration.
//!
//! Coordinates the corpus-to-chunks workflow:
//! 1. Read the corpus (file or bytes)
//! 2. Segment into page and category sections
//! 3. Subdivide oversized sections
//! 4. Assign ids and collect statistics

use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::core::error::{DocSearchError, Result};
use crate::core::indexer::{segment, Chunker, MAX_CHUNK_TOKENS};
use crate::core::types::Chunk;

/// Chunks parsed from one corpus, with size statistics
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Enriched chunks in document order
    pub chunks: Vec<Chunk>,

    /// Sections found by the segmenter
    pub sections: usize,

    /// Mean estimated tokens per chunk
    pub avg_tokens: usize,

    /// Chunks above the maximum token budget
    pub oversized: usize,

    /// Parse duration in milliseconds
    pub duration_ms: u64,
}

/// Orchestrates the parsing pipeline
#[derive(Debug, Clone, Default)]
pub struct IndexingPipeline {
    chunker: Chunker,
}

impl IndexingPipeline {
    /// Create a pipeline with a custom chunker
    pub fn new(chunker: Chunker) -> Self {
        Self { chunker }
    }

    /// Parse a corpus into enriched chunks.
    ///
    /// Section `n` gets parent id `chunk_<n>` where `n` advances by
    /// the number of chunks each section emits, so ids are unique
    /// within one call. Sub-chunks use `chunk_<n>_sub<i>`.
    ///
    /// # Example
    ///
    /// ```
    /// use docsearch::core::indexer::IndexingPipeline;
    ///
    /// let parsed = IndexingPipeline::default().parse("# A\n\nshort\n\n## B\n\nshort2\n");
    /// assert_eq!(parsed.chunks.len(), 2);
    /// assert_eq!(parsed.chunks[0].id, "chunk_0");
    /// assert_eq!(parsed.chunks[1].breadcrumb, "A > B");
    /// ```
    pub fn parse(&self, text: &str) -> ParsedDocument {
        let start = Instant::now();

        let sections = segment(text);
        tracing::debug!("Segmented corpus into {} sections", sections.len());

        let mut chunks = Vec::new();
        let mut next_id = 0usize;

        for section in &sections {
            let pieces = self.chunker.subdivide(section, &format!("chunk_{}", next_id));
            if pieces.len() > 1 {
                tracing::debug!(
                    "Split '{}' into {} sub-chunks",
                    section.category,
                    pieces.len()
                );
            }
            next_id += pieces.len();
            chunks.extend(pieces);
        }

        let total_tokens: usize = chunks.iter().map(|c| c.token_count).sum();
        let avg_tokens = total_tokens.checked_div(chunks.len()).unwrap_or(0);
        let oversized = chunks
            .iter()
            .filter(|c| c.token_count > MAX_CHUNK_TOKENS)
            .count();

        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Parsed {} chunks from {} sections (avg {} tokens, {} oversized) in {}ms",
            chunks.len(),
            sections.len(),
            avg_tokens,
            oversized,
            duration_ms
        );

        ParsedDocument {
            chunks,
            sections: sections.len(),
            avg_tokens,
            oversized,
            duration_ms,
        }
    }

    /// Parse raw corpus bytes; invalid UTF-8 sequences are replaced.
    pub fn parse_bytes(&self, bytes: &[u8]) -> ParsedDocument {
        self.parse(&String::from_utf8_lossy(bytes))
    }

    /// Read and parse a corpus file
    pub fn parse_file(&self, path: &Path) -> Result<ParsedDocument> {
        let contents = fs::read(path).map_err(|e| {
            DocSearchError::IndexingFailed(format!("Failed to read {path:?}: {e}"))
        })?;

        Ok(self.parse_bytes(&contents))
    }
}

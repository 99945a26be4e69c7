//! Document indexing module.
//!
//! Turns one flat documentation corpus into enriched, size-bounded
//! chunks ready for the index builder:
//!
//! - **markup**: heading detection and link-syntax cleanup
//! - **segmenter**: page/category section boundaries
//! - **chunker**: token budget enforcement with overlapping splits
//! - **metadata**: breadcrumb, anchor URL, keywords, token count
//! - **pipeline**: orchestration and chunk id assignment
//!
//! # Token estimation
//!
//! Sizes are estimated in abstract tokens of [`CHARS_PER_TOKEN`]
//! characters. All measurements count **characters**, not bytes,
//! so every split falls on a valid UTF-8 boundary.

pub mod chunker;
pub mod markup;
pub mod metadata;
pub mod pipeline;
pub mod segmenter;

pub use chunker::Chunker;
pub use metadata::estimate_tokens;
pub use pipeline::{IndexingPipeline, ParsedDocument};
pub use segmenter::{segment, Section, SectionLevel};

/// Optimal chunk size (~2000 chars)
pub const TARGET_CHUNK_TOKENS: usize = 500;

/// Maximum size before a section is subdivided (~3200 chars)
pub const MAX_CHUNK_TOKENS: usize = 800;

/// Context carried from one sub-chunk into the next (~400 chars)
pub const OVERLAP_TOKENS: usize = 100;

/// Characters per estimated token
pub const CHARS_PER_TOKEN: usize = 4;

/// How far a forced split may look back for a word boundary
pub const FORCE_SPLIT_LOOKBACK_CHARS: usize = 100;

/// Keywords kept per chunk
pub const MAX_KEYWORDS: usize = 10;

/// Leading content characters scanned for keywords
pub const KEYWORD_PREVIEW_CHARS: usize = 200;

/// Increments whenever chunking semantics change.
/// v1: line-based chunking, v2: subdivision with overlap and metadata
pub const INDEX_SCHEMA_VERSION: u32 = 2;

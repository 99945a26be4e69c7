//! Core data types for the documentation search engine.
//!
//! This module defines the data structures shared by the indexer,
//! the storage layer and the engine facade: chunks, search results,
//! refresh outcomes and status reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One indexable unit of documentation text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique within one index generation
    pub id: String,

    /// Top-level section title (level-1 heading)
    pub page: String,

    /// Second-level section title (level-2 heading)
    pub category: String,

    /// Finer heading or a synthesized "(part N)" label
    pub subcategory: String,

    /// Plain text content
    pub content: String,

    /// Canonical link, with an anchor fragment below page level
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// "page > category > subcategory", redundant levels omitted
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub breadcrumb: String,

    /// Deduplicated, stop-word filtered key terms
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Estimated length in tokens (chars / 4)
    #[serde(default)]
    pub token_count: usize,
}

/// A single ranked search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched chunk
    pub chunk: Chunk,

    /// BM25 relevance score (higher = more relevant)
    pub relevance_score: f32,
}

/// Response from a search operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Ranked results, at most `max_results`
    pub results: Vec<SearchHit>,

    /// Total number of matching chunks in the generation
    pub total_hits: usize,

    /// Original query string
    pub query: String,
}

/// Outcome of a refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshOutcome {
    /// Whether a new generation was built and published
    pub updated: bool,

    /// Number of chunks in the current generation
    pub chunks_indexed: usize,

    /// Time of the last successful corpus update
    pub last_update: Option<DateTime<Utc>>,

    /// Human-readable summary
    pub message: String,
}

/// Statistics from building one generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStats {
    /// Chunks written to the index
    pub chunks_indexed: usize,

    /// Mean estimated tokens per chunk
    pub avg_tokens: usize,

    /// Chunks above the maximum token budget
    pub oversized: usize,

    /// Build duration in milliseconds
    pub duration_ms: u64,
}

/// Snapshot of the engine state for status reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Root directory for docs and index data
    pub data_dir: PathBuf,

    /// Whether a generation is currently published in this process
    pub published: bool,

    /// Documents in the published generation
    pub doc_count: u64,

    /// Schema version recorded on disk, if any
    pub schema_version: Option<u32>,

    /// Time of the last successful corpus update
    pub last_update: Option<DateTime<Utc>>,

    /// Whether the cached corpus is older than the freshness window
    pub stale: bool,

    /// Searches currently running
    pub in_flight: usize,
}

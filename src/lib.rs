//! docsearch - Documentation Indexing and Search
//!
//! Turns a large structured documentation export (an `llms-full.txt`
//! style markdown document) into a BM25 full-text index via Tantivy,
//! and keeps that index searchable while it is rebuilt in the
//! background.
//!
//! # Architecture
//!
//! The codebase is organized into two main modules:
//!
//! - **core**: Domain logic (adapter-agnostic)
//!   - config, error, types, xdg
//!   - indexer (segmentation, chunking, metadata)
//!   - storage (Tantivy generations, holder, lock, cache)
//!   - search (query validation)
//!   - engine (initialize, search, refresh, shutdown)
//!
//! - **cli**: Command-line adapter (depends on core)
//!   - search, refresh, status, build-index, show-config, completions
//!
//! # Key Features
//!
//! - Structure-aware chunking (UTF-8 safe, never panics)
//! - Lock-free reads during rebuilds (atomic generation swap)
//! - Cross-process rebuild lock with stale-owner detection
//! - Embedded fallback corpus for offline first use

// Core domain logic (adapter-agnostic)
pub mod core;

// Command-line adapter
pub mod cli;

// Re-export commonly used types for convenience
pub use core::config::Config;
pub use core::engine::{build_index_file, DocSearch};
pub use core::error::{DocSearchError, Result};
pub use core::services::Services;
pub use core::types::*;

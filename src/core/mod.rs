//! Core domain logic (adapter-agnostic)
//!
//! This module contains all indexing and search logic that is
//! independent of the command-line adapter.
//!
//! # Architecture
//!
//! - **config**: Configuration loading (TOML + environment)
//! - **error**: Error types and Result alias
//! - **types**: Domain data structures
//! - **xdg**: XDG directory handling
//! - **indexer**: Segmentation, chunking and metadata enrichment
//! - **search**: Query validation and analysis
//! - **storage**: Tantivy generations, holder, lock and cache files
//! - **source**: Source fetcher and fallback bundle
//! - **engine**: The `DocSearch` facade
//! - **services**: Unified service container

pub mod config;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod search;
pub mod services;
pub mod source;
pub mod storage;
pub mod types;
pub mod xdg;

// Re-export key types for convenience
pub use config::Config;
pub use engine::{build_index_file, DocSearch};
pub use error::{DocSearchError, Result};
pub use services::Services;

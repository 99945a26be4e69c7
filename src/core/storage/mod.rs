//! Storage layer for Tantivy-based BM25 indexing.
//!
//! This module owns everything that lives on disk or survives
//! between searches:
//!
//! # Architecture
//!
//! - **DataLayout**: Paths below the data root
//! - **IndexBuilder / Generation**: Building and opening tantivy
//!   index generations
//! - **IndexHolder**: Lock-free current-generation pointer with
//!   drain accounting
//! - **LockGuard**: Cross-process rebuild lock
//! - **CacheMetadata**: Last-update record and schema marker
//!
//! # Rebuild Flow
//!
//! ```text
//! chunks ─▶ search/index.tmp ─▶ rename ─▶ search/index ─▶ open ─▶ publish
//!                                                                  │
//!                         previous generation ◀── drain + close ◀──┘
//! ```

pub mod cache;
pub mod holder;
pub mod layout;
pub mod lock;
pub mod tantivy;

pub use cache::{read_version, write_version, CacheMetadata};
pub use holder::{IndexHolder, SearchGuard};
pub use layout::DataLayout;
pub use lock::{is_process_running, release_if_owned, LockGuard, LockOptions, LockRecord};
pub use tantivy::{
    build_generation_dir, create_schema, Generation, GenerationState, IndexBuilder,
    INSERT_BATCH_SIZE,
};

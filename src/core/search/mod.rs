//! Search module for BM25 full-text search.
//!
//! Query construction and result-count policy. Execution happens on
//! an index generation (see `storage::Generation::search`), ranking
//! is tantivy's BM25.

mod query;

pub use query::{
    analyze, build_match_query, effective_limit, validate_query, DEFAULT_RESULTS, MAX_RESULTS,
};

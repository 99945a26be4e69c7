//! On-disk layout of the data root.
//!
//! ```text
//! {data_root}/
//! ├── docs/
//! │   ├── llms-full.txt      # Cached source corpus
//! │   └── cache.meta         # CacheMetadata (JSON)
//! └── search/
//!     ├── index/             # Published generation
//!     ├── index.tmp/         # Staging directory (transient)
//!     ├── index.lock         # Lock record (owner PID)
//!     └── .index_version     # Schema version marker
//! ```

use std::path::{Path, PathBuf};

use crate::core::error::Result;

/// Default name of the cached corpus file
pub const DEFAULT_SOURCE_FILE: &str = "llms-full.txt";

const DOCS_DIR: &str = "docs";
const SEARCH_DIR: &str = "search";
const CACHE_META_FILE: &str = "cache.meta";
const INDEX_DIR: &str = "index";
const STAGING_DIR: &str = "index.tmp";
const LOCK_FILE: &str = "index.lock";
const VERSION_FILE: &str = ".index_version";

/// Paths below one data root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
    source_file: String,
}

impl DataLayout {
    /// Layout with the default corpus file name
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_source_file(root, DEFAULT_SOURCE_FILE)
    }

    /// Layout with a custom corpus file name
    pub fn with_source_file(root: impl Into<PathBuf>, source_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            source_file: source_file.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.root.join(DOCS_DIR)
    }

    pub fn search_dir(&self) -> PathBuf {
        self.root.join(SEARCH_DIR)
    }

    /// Corpus file name relative to `docs/`
    pub fn source_file_name(&self) -> &str {
        &self.source_file
    }

    /// Cached source corpus
    pub fn source_file(&self) -> PathBuf {
        self.docs_dir().join(&self.source_file)
    }

    pub fn cache_meta(&self) -> PathBuf {
        self.docs_dir().join(CACHE_META_FILE)
    }

    /// Published generation directory
    pub fn index_dir(&self) -> PathBuf {
        self.search_dir().join(INDEX_DIR)
    }

    /// Staging directory for the generation being built
    pub fn staging_dir(&self) -> PathBuf {
        self.search_dir().join(STAGING_DIR)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.search_dir().join(LOCK_FILE)
    }

    pub fn version_file(&self) -> PathBuf {
        self.search_dir().join(VERSION_FILE)
    }

    /// Paths inside a fallback bundle, which mirrors the data root
    pub fn bundle_source_path(&self) -> String {
        format!("{}/{}", DOCS_DIR, self.source_file)
    }

    pub fn bundle_index_prefix(&self) -> String {
        format!("{}/{}/", SEARCH_DIR, INDEX_DIR)
    }

    pub fn bundle_version_path(&self) -> String {
        format!("{}/{}", SEARCH_DIR, VERSION_FILE)
    }

    /// Create `docs/` and `search/`
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.docs_dir())?;
        std::fs::create_dir_all(self.search_dir())?;
        Ok(())
    }
}

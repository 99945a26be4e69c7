//! Cache metadata and schema version marker.
//!
//! Both files are small and written through a temporary sibling
//! followed by a rename, so a crash never leaves a half-written file.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::Result;

/// Record of the last successful corpus update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the published generation was built
    pub last_update: DateTime<Utc>,

    /// Where the corpus came from (URL, file path or "fallback")
    pub source: String,

    /// Chunks in the published generation
    #[serde(default)]
    pub chunks_indexed: usize,

    /// Chunking schema version of the published generation
    #[serde(default)]
    pub schema_version: u32,
}

impl CacheMetadata {
    pub fn new(source: impl Into<String>, chunks_indexed: usize, schema_version: u32) -> Self {
        Self {
            last_update: Utc::now(),
            source: source.into(),
            chunks_indexed,
            schema_version,
        }
    }

    /// Load metadata from `path`.
    ///
    /// A missing file yields `None`. An unreadable or malformed file
    /// is logged and also yields `None`, which callers treat as stale.
    pub fn load(path: &Path) -> Option<Self> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read cache metadata {:?}: {}", path, e);
                return None;
            }
        };

        match serde_json::from_str(&data) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!("Ignoring malformed cache metadata {:?}: {}", path, e);
                None
            }
        }
    }

    /// Write metadata to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }

    /// Whether the update is younger than `window` at `now`
    pub fn is_fresh_at(&self, window: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_update) < window
    }

    pub fn is_fresh(&self, window: Duration) -> bool {
        self.is_fresh_at(window, Utc::now())
    }
}

/// Read the schema version marker; `None` when missing or unparsable
pub fn read_version(path: &Path) -> Option<u32> {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Write the schema version marker
pub fn write_version(path: &Path, version: u32) -> Result<()> {
    write_atomic(path, version.to_string().as_bytes())
}

/// Write `data` through a temporary sibling and rename it over `path`
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

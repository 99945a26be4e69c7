//! Source collaborators.
//!
//! The engine reads its corpus through two narrow interfaces:
//!
//! - **SourceFetcher**: downloads the current source document
//! - **FallbackSource**: read-only bundle used when nothing local is
//!   usable, laid out like the data root (`docs/<source file>` and,
//!   optionally, a prebuilt `search/index/**` with its
//!   `search/.index_version` marker)
//!
//! Production implementations are [`HttpFetcher`], [`EmbeddedFallback`]
//! (compiled into the binary) and [`DirFallback`] (a directory on disk).

use async_trait::async_trait;
use rust_embed::RustEmbed;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use crate::core::error::{DocSearchError, Result};

/// Downloads the source document
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the complete document. Failures are not retried.
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Human-readable origin, recorded in cache metadata
    fn describe(&self) -> String;
}

/// Read-only bundle of baseline data
pub trait FallbackSource: Send + Sync {
    /// Contents of `path` (slash-separated, relative to the bundle
    /// root); `None` when the bundle has no such file
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Paths of all files below `prefix`, sorted
    fn list_files(&self, prefix: &str) -> Result<Vec<String>>;

    /// Human-readable origin, recorded in cache metadata
    fn describe(&self) -> String;
}

/// Fetches the source document over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("docsearch/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| DocSearchError::FetchFailed(format!("Failed to build client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tracing::info!("Downloading documentation from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DocSearchError::FetchFailed(format!("Request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocSearchError::FetchFailed(format!(
                "Download from {} failed with HTTP {}",
                self.url, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DocSearchError::FetchFailed(format!("Failed to read body: {e}")))?;

        tracing::info!("Downloaded {} bytes", body.len());
        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[derive(RustEmbed)]
#[folder = "assets/fallback/"]
struct FallbackAssets;

/// Baseline bundle compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedFallback;

impl FallbackSource for EmbeddedFallback {
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(FallbackAssets::get(path).map(|file| file.data.into_owned()))
    }

    fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
        let mut files: Vec<String> = FallbackAssets::iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| name.into_owned())
            .collect();
        files.sort();
        Ok(files)
    }

    fn describe(&self) -> String {
        "embedded fallback".to_string()
    }
}

/// Bundle stored in a directory
#[derive(Debug, Clone)]
pub struct DirFallback {
    root: PathBuf,
}

impl DirFallback {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(DocSearchError::FallbackMissing(format!(
                "Invalid bundle path: {path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl FallbackSource for DirFallback {
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full = self.resolve(path)?;
        match std::fs::read(&full) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| {
                DocSearchError::StorageError(format!("Failed to walk {:?}: {e}", self.root))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if name.starts_with(prefix) {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }

    fn describe(&self) -> String {
        format!("fallback directory {}", self.root.display())
    }
}

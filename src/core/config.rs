//! Configuration management for the docsearch engine.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::error::{DocSearchError, Result};
use crate::core::search::MAX_RESULTS;
use crate::core::storage::layout::DEFAULT_SOURCE_FILE;
use crate::core::storage::{DataLayout, LockOptions};
use crate::core::xdg::XdgDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub lock: LockConfig,
}

/// Source document configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// URL of the full documentation export
    #[serde(default = "default_source_url")]
    pub url: String,

    /// File name of the cached corpus below `docs/`
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Days before a cached corpus is considered stale
    #[serde(default = "default_freshness_days")]
    pub freshness_days: u64,

    /// Download timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_sec: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for docs and index data
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Bundle directory used instead of the embedded fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_dir: Option<PathBuf>,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Results returned when a query does not ask for a count
    #[serde(default = "default_results")]
    pub default_results: usize,

    /// Largest result count a query may ask for
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

/// Cross-process lock configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LockConfig {
    /// Total wait for a live holder, in milliseconds
    #[serde(default = "default_lock_timeout")]
    pub timeout_ms: u64,

    /// Pause between acquisition attempts, in milliseconds
    #[serde(default = "default_lock_retry")]
    pub retry_ms: u64,
}

// Default value functions
fn default_source_url() -> String {
    "https://www.krakend.io/llms-full.txt".to_string()
}

fn default_file_name() -> String {
    DEFAULT_SOURCE_FILE.to_string()
}

fn default_freshness_days() -> u64 {
    7
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_results() -> usize {
    10
}

fn default_max_results() -> usize {
    MAX_RESULTS
}

fn default_lock_timeout() -> u64 {
    5000
}

fn default_lock_retry() -> u64 {
    500
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            file_name: default_file_name(),
            freshness_days: default_freshness_days(),
            fetch_timeout_sec: default_fetch_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            fallback_dir: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_results: default_results(),
            max_results: default_max_results(),
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_lock_timeout(),
            retry_ms: default_lock_retry(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| DocSearchError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config with priority: env vars > TOML > defaults
    ///
    /// This method uses XDG Base Directory specification for file locations.
    pub fn load() -> Result<Self> {
        let xdg = XdgDirs::new();
        Self::load_with_xdg(&xdg)
    }

    /// Load config with explicit XDG directories
    ///
    /// Priority order:
    /// 1. DOCSEARCH_CONFIG env var (explicit file)
    /// 2. XDG config file (~/.config/docsearch/config.toml)
    /// 3. Defaults
    pub fn load_with_xdg(xdg: &XdgDirs) -> Result<Self> {
        xdg.log_paths();
        let config_file = xdg.config_file();
        let mut config = if config_file.exists() {
            Self::from_file(&config_file)?
        } else if env::var_os("DOCSEARCH_CONFIG").is_some_and(|v| !v.is_empty()) {
            return Err(DocSearchError::ConfigError(format!(
                "Config file not found: {config_file:?}"
            )));
        } else {
            Self::default()
        };

        // Use the XDG data directory unless a path was configured
        if config.storage.data_dir == default_data_dir() {
            config.storage.data_dir = xdg.data_dir.clone();
        }

        config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        // Source configuration
        if let Ok(url) = env::var("DOCSEARCH_SOURCE_URL") {
            self.source.url = url;
        }
        if let Ok(days) = env::var("DOCSEARCH_FRESHNESS_DAYS") {
            if let Ok(d) = days.parse() {
                self.source.freshness_days = d;
            }
        }

        // Storage configuration
        if let Ok(data_dir) = env::var("DOCSEARCH_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(fallback_dir) = env::var("DOCSEARCH_FALLBACK_DIR") {
            self.storage.fallback_dir = Some(PathBuf::from(fallback_dir));
        }

        // Search configuration
        if let Ok(default_results) = env::var("DOCSEARCH_DEFAULT_RESULTS") {
            if let Ok(k) = default_results.parse() {
                self.search.default_results = k;
            }
        }

        // Lock configuration
        if let Ok(timeout) = env::var("DOCSEARCH_LOCK_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.lock.timeout_ms = t;
            }
        }
        if let Ok(retry) = env::var("DOCSEARCH_LOCK_RETRY_MS") {
            if let Ok(r) = retry.parse() {
                self.lock.retry_ms = r;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(DocSearchError::ConfigError(
                "Source URL must be non-empty".to_string(),
            ));
        }

        if self.source.file_name.is_empty()
            || self.source.file_name.contains(['/', '\\'])
            || self.source.file_name == ".."
        {
            return Err(DocSearchError::ConfigError(format!(
                "Invalid source file name: {:?}",
                self.source.file_name
            )));
        }

        if self.source.fetch_timeout_sec == 0 {
            return Err(DocSearchError::ConfigError(
                "Fetch timeout must be non-zero".to_string(),
            ));
        }

        if self.search.default_results == 0 {
            return Err(DocSearchError::ConfigError(
                "Default results must be non-zero".to_string(),
            ));
        }

        if self.search.default_results > self.search.max_results {
            return Err(DocSearchError::ConfigError(
                "Default results cannot exceed max results".to_string(),
            ));
        }

        if self.lock.retry_ms == 0 {
            return Err(DocSearchError::ConfigError(
                "Lock retry interval must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Paths below the configured data root
    pub fn layout(&self) -> DataLayout {
        DataLayout::with_source_file(&self.storage.data_dir, &self.source.file_name)
    }

    pub fn lock_options(&self) -> LockOptions {
        LockOptions {
            timeout: Duration::from_millis(self.lock.timeout_ms),
            retry: Duration::from_millis(self.lock.retry_ms),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.source.fetch_timeout_sec)
    }

    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.source.freshness_days as i64)
    }

    /// Log configuration
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Source URL: {}", self.source.url);
        tracing::info!("  Source file: {}", self.source.file_name);
        tracing::info!("  Freshness: {} days", self.source.freshness_days);
        tracing::info!("  Fetch timeout: {}s", self.source.fetch_timeout_sec);
        tracing::info!("  Data dir: {:?}", self.storage.data_dir);
        match &self.storage.fallback_dir {
            Some(dir) => tracing::info!("  Fallback: {:?}", dir),
            None => tracing::info!("  Fallback: embedded"),
        }
        tracing::info!("  Default results: {}", self.search.default_results);
        tracing::info!("  Max results: {}", self.search.max_results);
        tracing::info!(
            "  Lock: {}ms timeout, {}ms retry",
            self.lock.timeout_ms,
            self.lock.retry_ms
        );
    }
}

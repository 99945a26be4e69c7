//! XDG Base Directory Support
//!
//! Resolves where docsearch reads its configuration and keeps its
//! data, following the XDG Base Directory specification on
//! Linux/Unix systems.

use std::env;
use std::path::PathBuf;

/// Application directory name below the XDG roots
const APP_DIR: &str = "docsearch";

const CONFIG_FILE: &str = "config.toml";

/// XDG directory structure for docsearch
#[derive(Debug, Clone)]
pub struct XdgDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl XdgDirs {
    /// Create new XDG directory structure with proper resolution order
    ///
    /// Priority order (highest to lowest):
    /// 1. Explicit DOCSEARCH_* env vars
    /// 2. XDG_* environment variables
    /// 3. XDG defaults (~/.config, ~/.local/share)
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
            data_dir: Self::resolve_data_dir(),
        }
    }

    fn resolve_config_dir() -> PathBuf {
        resolve_dir("DOCSEARCH_CONFIG_DIR", "XDG_CONFIG_HOME", &[".config"])
    }

    fn resolve_data_dir() -> PathBuf {
        resolve_dir("DOCSEARCH_DATA_DIR", "XDG_DATA_HOME", &[".local", "share"])
    }

    /// `DOCSEARCH_CONFIG` if set, else `config.toml` in the config dir
    pub fn config_file(&self) -> PathBuf {
        env::var_os("DOCSEARCH_CONFIG")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.config_dir.join(CONFIG_FILE))
    }

    pub fn log_paths(&self) {
        tracing::debug!(
            "Resolved directories: config {:?}, data {:?}",
            self.config_dir,
            self.data_dir
        );
    }
}

/// First of: `explicit` as given, `xdg_home/docsearch`, or
/// `~/<home_relative>/docsearch`
fn resolve_dir(explicit: &str, xdg_home: &str, home_relative: &[&str]) -> PathBuf {
    if let Some(dir) = env::var_os(explicit).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    if let Some(xdg) = env::var_os(xdg_home).filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join(APP_DIR);
    }

    let mut dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.extend(home_relative);
    dir.join(APP_DIR)
}

impl Default for XdgDirs {
    fn default() -> Self {
        Self::new()
    }
}

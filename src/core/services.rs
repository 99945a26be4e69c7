//! Unified service container for docsearch
//!
//! Provides shared access to the engine and its configuration.

use crate::core::config::Config;
use crate::core::engine::DocSearch;
use crate::core::error::Result;
use std::sync::Arc;

/// Unified services container
///
/// All adapters use this same struct for service access.
#[derive(Debug, Clone)]
pub struct Services {
    /// Search engine over the configured data root
    pub engine: Arc<DocSearch>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl Services {
    /// Create services from configuration
    pub fn new(config: Config) -> Result<Self> {
        let engine = Arc::new(DocSearch::from_config(&config)?);

        Ok(Self {
            engine,
            config: Arc::new(config),
        })
    }

    /// Shut the engine down; called once by every adapter before exit
    pub async fn shutdown(&self) -> Result<()> {
        self.engine.shutdown().await
    }
}

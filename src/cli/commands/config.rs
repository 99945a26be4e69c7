//! Config command - show current configuration

use crate::cli::output::colors;
use crate::cli::OutputFormat;
use crate::core::services::Services;
use crate::core::xdg::XdgDirs;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Also show resolved file locations
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// Configuration response
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
    #[serde(flatten)]
    pub config: crate::core::config::Config,
}

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = &services.config;

    let response = ConfigResponse {
        config_file: args
            .all
            .then(|| XdgDirs::new().config_file().display().to_string()),
        config: config.as_ref().clone(),
    };

    match format {
        OutputFormat::Human => {
            println!("{}", colors::label("Configuration:"));
            if let Some(file) = &response.config_file {
                println!("  config_file: {}", colors::file_path(file));
            }
            println!("  source:");
            println!("    url: {}", config.source.url);
            println!("    file_name: {}", config.source.file_name);
            println!("    freshness_days: {}", config.source.freshness_days);
            println!("    fetch_timeout_sec: {}", config.source.fetch_timeout_sec);
            println!("  storage:");
            println!("    data_dir: {}", config.storage.data_dir.display());
            match &config.storage.fallback_dir {
                Some(dir) => println!("    fallback_dir: {}", dir.display()),
                None => println!("    fallback_dir: {}", colors::dim("(embedded)")),
            }
            println!("  search:");
            println!("    default_results: {}", config.search.default_results);
            println!("    max_results: {}", config.search.max_results);
            println!("  lock:");
            println!("    timeout_ms: {}", config.lock.timeout_ms);
            println!("    retry_ms: {}", config.lock.retry_ms);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

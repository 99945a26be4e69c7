//! CLI adapter for docsearch
//!
//! Provides the command-line interface over the search engine.
//! Depends on `core/`; nothing in `core/` depends on it.
//!
//! # Architecture
//!
//! ```text
//!              +------------------+
//!              |     core/        |
//!              |  (domain logic)  |
//!              +--------+---------+
//!                       |
//!                       v
//!              +------------------+
//!              |      cli/        |
//!              | (clap adapter)   |
//!              +------------------+
//! ```

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

/// docsearch - Documentation search engine
///
/// Indexes a structured documentation export and searches it with
/// BM25 ranking. The index is refreshed from the configured source URL
/// and falls back to a bundled corpus when offline.
#[derive(Parser, Debug)]
#[command(name = "docsearch")]
#[command(version)]
#[command(about = "Documentation indexing and BM25 search", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Log line format (logs go to stderr; level via RUST_LOG)
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Format of log lines written to stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact text lines (default)
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the documentation index
    Search(commands::SearchArgs),

    /// Download the documentation and rebuild the index if stale
    Refresh(commands::RefreshArgs),

    /// Show index and cache status
    Status(commands::StatusArgs),

    /// Build an index bundle from a local documentation file
    ///
    /// The output directory can be used as `storage.fallback_dir`.
    #[command(name = "build-index")]
    BuildIndex(commands::BuildIndexArgs),

    /// Show current configuration
    #[command(name = "show-config")]
    ShowConfig(commands::ConfigArgs),

    /// Generate shell completion scripts
    ///
    /// Output completion script to stdout. To install:
    ///
    ///   bash:  docsearch completions bash > ~/.local/share/bash-completion/completions/docsearch
    ///   zsh:   docsearch completions zsh > ~/.zfunc/_docsearch
    ///   fish:  docsearch completions fish > ~/.config/fish/completions/docsearch.fish
    Completions(commands::CompletionsArgs),
}

/// Run the CLI with the provided arguments
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    use crate::core::config::Config;
    use crate::core::services::Services;
    use std::sync::Arc;

    // Commands that never open the engine
    let command = match cli.command {
        Commands::Completions(args) => return commands::completions::execute(args),
        Commands::BuildIndex(args) => return commands::build_index::execute(args, cli.format),
        other => other,
    };

    // Load configuration
    let config = Config::load()?;
    config.log_config();

    // Create services
    let services = Arc::new(Services::new(config)?);

    // Execute command
    let result = match command {
        Commands::Search(args) => commands::search::execute(args, &services, cli.format).await,
        Commands::Refresh(args) => commands::refresh::execute(args, &services, cli.format).await,
        Commands::Status(args) => commands::status::execute(args, &services, cli.format).await,
        Commands::ShowConfig(args) => commands::config::execute(args, &services, cli.format).await,
        Commands::Completions(_) | Commands::BuildIndex(_) => unreachable!(), // Handled above
    };

    // Shut down even if the command failed; report the command's error first
    let shutdown = services.shutdown().await;
    result?;
    shutdown?;
    Ok(())
}

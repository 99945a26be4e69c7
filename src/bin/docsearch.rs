//! docsearch CLI - Command-line interface for documentation search
//!
//! # Examples
//!
//! ```bash
//! # Search (initializes the index on first use)
//! docsearch search "rate limiting"
//!
//! # Download the latest documentation if the cache is stale
//! docsearch refresh
//!
//! # Build a fallback bundle from a local export
//! docsearch build-index llms-full.txt ./bundle
//! ```

use clap::Parser;
use docsearch::cli::output::print_error;
use docsearch::cli::{run, Cli, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "docsearch=info".into());

    // stderr only; stdout carries command output
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    if let Err(e) = run(cli).await {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

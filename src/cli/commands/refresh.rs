//! Refresh command - download the documentation and rebuild the index

use crate::cli::output::{colors, format_age_colored, print_success};
use crate::cli::OutputFormat;
use crate::core::services::Services;
use clap::Args;
use std::sync::Arc;

/// Arguments for the refresh command
#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Rebuild even if the cached documentation is still fresh
    #[arg(long, short = 'f')]
    pub force: bool,
}

/// Execute the refresh command
pub async fn execute(
    args: RefreshArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = services.engine.refresh(args.force).await?;

    match format {
        OutputFormat::Human => {
            if outcome.updated {
                print_success(&outcome.message);
            } else {
                println!("{}", outcome.message);
                println!(
                    "  Use {} to rebuild anyway",
                    colors::label("docsearch refresh --force")
                );
            }
            println!(
                "  Chunks indexed: {}",
                colors::number(&outcome.chunks_indexed.to_string())
            );
            if let Some(last_update) = &outcome.last_update {
                println!("  Last update: {}", format_age_colored(last_update));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

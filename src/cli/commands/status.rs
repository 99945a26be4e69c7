//! Status command - show index and cache state

use crate::cli::output::{colors, format_age_colored};
use crate::cli::OutputFormat;
use crate::core::indexer::INDEX_SCHEMA_VERSION;
use crate::core::services::Services;
use clap::Args;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Open the index first so the chunk count is reported
    #[arg(long)]
    pub open: bool,
}

/// Execute the status command
pub async fn execute(
    args: StatusArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.open {
        services.engine.initialize().await?;
    }

    let status = services.engine.status();

    match format {
        OutputFormat::Human => {
            println!("{}", colors::label("Documentation index"));
            println!(
                "  Data dir: {}",
                colors::file_path(&status.data_dir.display().to_string())
            );

            let schema = match status.schema_version {
                Some(v) if v == INDEX_SCHEMA_VERSION => colors::success(&format!("v{v}")),
                Some(v) => colors::warning(&format!("v{v} (expected v{INDEX_SCHEMA_VERSION})")),
                None => colors::dim("none"),
            };
            println!("  Schema: {schema}");

            if status.published {
                println!(
                    "  Chunks: {}",
                    colors::number(&status.doc_count.to_string())
                );
            } else {
                println!("  Chunks: {}", colors::dim("index not opened (use --open)"));
            }

            match &status.last_update {
                Some(last_update) => {
                    println!("  Last update: {}", format_age_colored(last_update))
                }
                None => println!("  Last update: {}", colors::dim("never")),
            }

            if status.stale {
                println!("  Cache: {}", colors::warning("stale"));
            } else {
                println!("  Cache: {}", colors::success("fresh"));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

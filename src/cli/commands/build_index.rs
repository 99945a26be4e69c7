//! Build-index command - offline indexer for fallback bundles

use crate::cli::output::{colors, format_elapsed_colored, print_success, print_warning};
use crate::cli::OutputFormat;
use crate::core::engine::build_index_file;
use crate::core::indexer::MAX_CHUNK_TOKENS;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the build-index command
#[derive(Args, Debug)]
pub struct BuildIndexArgs {
    /// Documentation file to index (e.g. llms-full.txt)
    pub docs_file: PathBuf,

    /// Output bundle directory (receives docs/ and search/)
    pub output_dir: PathBuf,
}

/// Execute the build-index command
pub fn execute(
    args: BuildIndexArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if !args.docs_file.is_file() {
        return Err(format!("Documentation file not found: {}", args.docs_file.display()).into());
    }

    let stats = build_index_file(&args.docs_file, &args.output_dir)?;

    match format {
        OutputFormat::Human => {
            print_success(&format!(
                "Indexed {} chunks into {}",
                stats.chunks_indexed,
                args.output_dir.display()
            ));
            println!(
                "  Average tokens: {}",
                colors::number(&stats.avg_tokens.to_string())
            );
            println!(
                "  Duration: {}",
                format_elapsed_colored(Duration::from_millis(stats.duration_ms))
            );
            if stats.oversized > 0 {
                print_warning(&format!(
                    "{} chunk(s) exceed {} tokens",
                    stats.oversized, MAX_CHUNK_TOKENS
                ));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

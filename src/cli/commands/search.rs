//! Search command - search the documentation index

use crate::cli::output::{colors, truncate_chars};
use crate::cli::OutputFormat;
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Lines of chunk content shown per result in human output
const PREVIEW_LINES: usize = 5;

/// Characters per preview line in human output
const PREVIEW_WIDTH: usize = 100;

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query (plain words; matched against titles, content and keywords)
    pub query: String,

    /// Maximum number of results (1-20, default 10)
    #[arg(long, short = 'k')]
    pub limit: Option<usize>,

    /// Only show titles and links (no content)
    #[arg(long)]
    pub titles_only: bool,
}

/// Search result item
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub rank: usize,
    pub id: String,
    pub breadcrumb: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    pub score: f32,
    pub token_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchResponseOutput {
    pub query: String,
    pub total_hits: usize,
    pub results: Vec<SearchResultItem>,
}

/// Execute the search command
pub async fn execute(
    args: SearchArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = services.engine.search(&args.query, args.limit).await?;

    let output = SearchResponseOutput {
        query: response.query.clone(),
        total_hits: response.total_hits,
        results: response
            .results
            .into_iter()
            .enumerate()
            .map(|(i, hit)| SearchResultItem {
                rank: i + 1,
                id: hit.chunk.id,
                breadcrumb: hit.chunk.breadcrumb,
                url: hit.chunk.url,
                score: hit.relevance_score,
                token_count: hit.chunk.token_count,
                keywords: hit.chunk.keywords,
                content: if args.titles_only {
                    None
                } else {
                    Some(hit.chunk.content)
                },
            })
            .collect(),
    };

    match format {
        OutputFormat::Human => {
            if output.results.is_empty() {
                println!("No results found for '{}'", colors::label(&output.query));
                return Ok(());
            }

            println!(
                "Found {} matching chunk(s), showing {}:\n",
                colors::number(&output.total_hits.to_string()),
                colors::number(&output.results.len().to_string())
            );

            for result in &output.results {
                println!(
                    "[{}] {} {}",
                    colors::rank(&result.rank.to_string()),
                    colors::title(&result.breadcrumb),
                    colors::dim(&format!("(score: {:.2})", result.score))
                );
                if !result.url.is_empty() {
                    println!("    {}", colors::link(&result.url));
                }
                if let Some(content) = &result.content {
                    for line in content.lines().take(PREVIEW_LINES) {
                        println!("    {}", colors::dim(&truncate_chars(line, PREVIEW_WIDTH)));
                    }
                }
                println!();
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

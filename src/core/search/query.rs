//! Match-query construction and result-limit policy.
//!
//! User queries are free text, not query syntax: the text is run
//! through the index tokenizer and every resulting term becomes an
//! optional clause on every searchable field. Operators, field
//! prefixes and unbalanced brackets therefore never cause parse
//! errors; they are simply tokenized away.

use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Term};

use crate::core::error::{DocSearchError, Result};

/// Results returned when the caller does not ask for a count
pub const DEFAULT_RESULTS: usize = 10;

/// Largest accepted result count
pub const MAX_RESULTS: usize = 20;

/// Result count for a request.
///
/// `None`, `0` and values above `max` all fall back to `default`.
///
/// ```
/// use docsearch::core::search::effective_limit;
///
/// assert_eq!(effective_limit(None, 10, 20), 10);
/// assert_eq!(effective_limit(Some(0), 10, 20), 10);
/// assert_eq!(effective_limit(Some(5), 10, 20), 5);
/// assert_eq!(effective_limit(Some(21), 10, 20), 10);
/// ```
pub fn effective_limit(requested: Option<usize>, default: usize, max: usize) -> usize {
    match requested {
        Some(k) if k > 0 && k <= max => k,
        _ => default,
    }
}

/// Reject empty or whitespace-only queries
pub fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(DocSearchError::InvalidQuery(
            "Query cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Tokenize `text` with the analyzer of `field`.
///
/// Duplicate terms are kept once, in first-seen order.
pub fn analyze(index: &Index, field: Field, text: &str) -> Result<Vec<String>> {
    let mut analyzer = index
        .tokenizer_for_field(field)
        .map_err(|e| DocSearchError::SearchFailed(format!("Missing tokenizer: {e}")))?;

    let mut terms: Vec<String> = Vec::new();
    let mut stream = analyzer.token_stream(text);
    while let Some(token) = stream.next() {
        if !terms.contains(&token.text) {
            terms.push(token.text.clone());
        }
    }
    Ok(terms)
}

/// Disjunction of every term over every field, scored by BM25.
///
/// Returns `None` when the text yields no terms.
pub fn build_match_query(
    index: &Index,
    fields: &[Field],
    text: &str,
) -> Result<Option<Box<dyn Query>>> {
    let Some(&analyzed_field) = fields.first() else {
        return Ok(None);
    };

    let terms = analyze(index, analyzed_field, text)?;
    if terms.is_empty() {
        return Ok(None);
    }

    let clauses: Vec<(Occur, Box<dyn Query>)> = fields
        .iter()
        .flat_map(|&field| {
            terms.iter().map(move |term| {
                let query: Box<dyn Query> = Box::new(TermQuery::new(
                    Term::from_field_text(field, term),
                    IndexRecordOption::WithFreqs,
                ));
                (Occur::Should, query)
            })
        })
        .collect();

    Ok(Some(Box::new(BooleanQuery::new(clauses))))
}

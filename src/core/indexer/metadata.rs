//! Chunk metadata enrichment.
//!
//! Fills in the derived fields of a chunk once its content is final:
//! breadcrumb, canonical URL, keywords and token estimate.

use super::markup::{anchor, heading_level, is_fence, strip_links};
use super::segmenter::{Section, SectionLevel};
use super::{CHARS_PER_TOKEN, KEYWORD_PREVIEW_CHARS, MAX_KEYWORDS};
use crate::core::types::Chunk;
use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "as", "by", "is",
    "it", "be", "with", "from", "that",
];

/// Estimated token count of `text` (characters / 4).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Populate breadcrumb, URL, keywords and token count of `chunk`.
///
/// `level` and `base_url` come from the section the chunk was cut
/// from. Chunks below page level link to `base_url#anchor`, where
/// the anchor is derived from the chunk's subcategory.
pub fn enrich(chunk: &mut Chunk, level: SectionLevel, base_url: Option<&str>) {
    chunk.breadcrumb = breadcrumb(&chunk.page, &chunk.category, &chunk.subcategory);
    chunk.url = build_url(base_url, level, &chunk.subcategory);
    chunk.keywords = extract_keywords(&chunk.subcategory, &chunk.content);
    chunk.token_count = estimate_tokens(&chunk.content);
}

/// Enrich a chunk cut from `section`
pub fn enrich_from_section(chunk: &mut Chunk, section: &Section) {
    enrich(chunk, section.level, section.base_url.as_deref());
}

/// "page > category > subcategory" with redundant levels omitted.
///
/// ```
/// use docsearch::core::indexer::metadata::breadcrumb;
///
/// assert_eq!(breadcrumb("A", "A", "A"), "A");
/// assert_eq!(breadcrumb("A", "B", "B"), "A > B");
/// assert_eq!(breadcrumb("A", "B", "C"), "A > B > C");
/// ```
pub fn breadcrumb(page: &str, category: &str, subcategory: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(3);
    for part in [page, category, subcategory] {
        if !part.is_empty() && parts.last() != Some(&part) {
            parts.push(part);
        }
    }
    parts.join(" > ")
}

fn build_url(base_url: Option<&str>, level: SectionLevel, subcategory: &str) -> String {
    let Some(base) = base_url.filter(|b| !b.is_empty()) else {
        return String::new();
    };

    if level == SectionLevel::Page {
        return base.to_string();
    }

    let fragment = anchor(subcategory);
    if fragment.is_empty() {
        base.to_string()
    } else {
        format!("{}#{}", base.trim_end_matches('#'), fragment)
    }
}

/// Up to ten distinct key terms from a title and the start of the
/// content.
///
/// Words are lower-cased, trimmed of punctuation, and kept only when
/// longer than two characters and not a stop word. Order follows
/// first appearance.
pub fn extract_keywords(title: &str, content: &str) -> Vec<String> {
    let preview: String = content.chars().take(KEYWORD_PREVIEW_CHARS).collect();
    let text = format!("{} {}", title, preview).to_lowercase();

    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for raw in text.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if word.chars().count() <= 2 || STOP_WORDS.contains(&word) {
            continue;
        }
        if seen.insert(word.to_string()) {
            keywords.push(word.to_string());
            if keywords.len() == MAX_KEYWORDS {
                break;
            }
        }
    }

    keywords
}

/// Text of the first level 3 to 5 heading in `content`.
///
/// Lines inside fenced code blocks are skipped.
pub fn first_subheading(content: &str) -> Option<String> {
    let mut in_fence = false;
    for line in content.lines().map(str::trim) {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence && matches!(heading_level(line), Some(3..=5)) {
            let title = strip_links(line.trim_start_matches('#').trim());
            let title = title.trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}

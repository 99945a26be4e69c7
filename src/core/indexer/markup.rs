//! Markdown heading and link helpers.
//!
//! Headings are recognised by their leading `#` run followed by
//! whitespace. Link syntax (`[text](target)`) is reduced to its
//! visible text; the target can be recovered separately so that
//! titles never carry markup while the canonical URL survives.

use once_cell::sync::Lazy;
use regex::Regex;

// Compiled once; the pattern is a literal and always valid
static LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link pattern"));

/// Replace every `[text](target)` with `text`.
///
/// ```
/// use docsearch::core::indexer::markup::strip_links;
///
/// assert_eq!(strip_links("[Gateway](https://example.com/gw)"), "Gateway");
/// assert_eq!(strip_links("plain title"), "plain title");
/// ```
pub fn strip_links(text: &str) -> String {
    LINK_PATTERN.replace_all(text, "$1").into_owned()
}

/// Target of the first markdown link in `text`, if any.
pub fn extract_link_target(text: &str) -> Option<String> {
    LINK_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|target| !target.is_empty())
}

/// Heading level of a trimmed line (`# x` is 1, `### x` is 3).
///
/// The `#` run must be followed by whitespace or end the line, so
/// `#include` or `#hashtag` stay ordinary content.
pub fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }

    match line[hashes..].chars().next() {
        None => Some(hashes),
        Some(c) if c.is_whitespace() => Some(hashes),
        Some(_) => None,
    }
}

/// Visible heading text and link target of a heading line.
///
/// Strips the `#` marker, surrounding whitespace and any link
/// syntax. The link target, when present, is returned on the side.
pub fn clean_title(line: &str) -> (String, Option<String>) {
    let raw = line.trim().trim_start_matches('#').trim();
    let url = extract_link_target(raw);
    (strip_links(raw).trim().to_string(), url)
}

/// Whether a trimmed line opens or closes a fenced code block.
pub fn is_fence(line: &str) -> bool {
    line.starts_with("```") || line.starts_with("~~~")
}

/// URL fragment for a heading.
///
/// Lower-cases the text, turns spaces into hyphens and drops every
/// character that is not an ASCII letter, digit or hyphen.
///
/// ```
/// use docsearch::core::indexer::markup::anchor;
///
/// assert_eq!(anchor("Fields of Tiered Rate Limit"), "fields-of-tiered-rate-limit");
/// assert_eq!(anchor("`timeout` (seconds)"), "timeout-seconds");
/// ```
pub fn anchor(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

//! Token-budget enforcement for sections.
//!
//! A section within [`MAX_CHUNK_TOKENS`] becomes one chunk. Larger
//! sections are split at paragraph, line, or sentence boundaries into
//! sub-chunks of roughly [`TARGET_CHUNK_TOKENS`], each carrying the
//! tail of its predecessor as context. A single unit that alone
//! exceeds the maximum is force-split by character count.
//!
//! Budgets are compared in estimated tokens (characters / 4) while
//! cuts are made in **characters**; every cut uses `char_indices()`
//! offsets and therefore lands on a UTF-8 boundary.
//!
//! # Example
//!
//! ```
//! use docsearch::core::indexer::Chunker;
//!
//! let chunker = Chunker::new(10, 2);
//! let parts = chunker.force_split("Hello üëã World üåç Rust ü¶Ä");
//!
//! for part in &parts {
//!     assert!(!part.is_empty());
//! }
//! ```

use super::metadata::{enrich_from_section, first_subheading};
use super::segmenter::Section;
use super::{
    CHARS_PER_TOKEN, FORCE_SPLIT_LOOKBACK_CHARS, MAX_CHUNK_TOKENS, OVERLAP_TOKENS,
    TARGET_CHUNK_TOKENS,
};
use crate::core::types::Chunk;

/// Separator placed between paragraphs and after an overlap prefix
const PARAGRAPH_BREAK: &str = "\n\n";

/// Section subdivider.
///
/// Holds the budgets in characters; [`Chunker::default`] uses the
/// index-wide token constants.
#[derive(Debug, Clone)]
pub struct Chunker {
    /// Preferred sub-chunk body length
    target_chars: usize,

    /// Largest body accepted without splitting
    max_chars: usize,

    /// Tail of the previous body prepended to the next sub-chunk
    overlap_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            target_chars: TARGET_CHUNK_TOKENS * CHARS_PER_TOKEN,
            max_chars: MAX_CHUNK_TOKENS * CHARS_PER_TOKEN,
            overlap_chars: OVERLAP_TOKENS * CHARS_PER_TOKEN,
        }
    }
}

/// One sub-chunk before metadata is attached
#[derive(Debug)]
struct Piece {
    /// Context copied from the previous piece
    overlap: String,
    /// Text first introduced by this piece
    body: String,
    /// Body resumes the previous piece's unit mid-text
    continues: bool,
}

impl Piece {
    fn content(&self) -> String {
        if self.overlap.is_empty() {
            self.body.clone()
        } else if self.continues {
            format!("{}{}", self.overlap, self.body)
        } else {
            format!("{}{}{}", self.overlap, PARAGRAPH_BREAK, self.body)
        }
    }
}

impl Chunker {
    /// Create a chunker for forced splits with the given sizes.
    ///
    /// `max_chars` is both the target and the maximum.
    ///
    /// # Panics
    ///
    /// Panics if `max_chars` is 0 or if `overlap_chars >= max_chars`.
    pub fn new(max_chars: usize, overlap_chars: usize) -> Self {
        assert!(max_chars > 0, "max_chars must be > 0");
        assert!(overlap_chars < max_chars, "overlap must be < max_chars");

        Self {
            target_chars: max_chars,
            max_chars,
            overlap_chars,
        }
    }

    /// Largest body accepted without splitting, in characters.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Overlap length in characters.
    pub fn overlap_chars(&self) -> usize {
        self.overlap_chars
    }

    /// Cut `section` into enriched chunks.
    ///
    /// A section within budget yields one chunk with id `id`. Larger
    /// sections yield `<id>_sub0`, `<id>_sub1`, ... in document order.
    /// Each sub-chunk is labelled with the first level 3 to 5 heading
    /// it introduces, else `"<category> (part N)"`.
    pub fn subdivide(&self, section: &Section, id: &str) -> Vec<Chunk> {
        let base = Chunk {
            id: id.to_string(),
            page: section.page.clone(),
            category: section.category.clone(),
            subcategory: section.subcategory.clone(),
            content: section.content.clone(),
            ..Default::default()
        };

        if !exceeds(char_len(&section.content), self.max_chars) {
            let mut chunk = base;
            enrich_from_section(&mut chunk, section);
            return vec![chunk];
        }

        let pieces = self.pieces(&section.content);
        if pieces.is_empty() {
            let mut chunk = base;
            enrich_from_section(&mut chunk, section);
            return vec![chunk];
        }

        pieces
            .iter()
            .enumerate()
            .map(|(i, piece)| {
                let subcategory = first_subheading(&piece.body)
                    .unwrap_or_else(|| format!("{} (part {})", section.category, i + 1));

                let mut chunk = Chunk {
                    id: format!("{}_sub{}", id, i),
                    subcategory,
                    content: piece.content(),
                    ..base.clone()
                };
                enrich_from_section(&mut chunk, section);
                chunk
            })
            .collect()
    }

    /// Group the units of `content` into pieces within budget.
    fn pieces(&self, content: &str) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut previous = String::new();
        let (units, joiner) = split_units(content);

        for unit in units {
            if exceeds(char_len(unit), self.max_chars) {
                if !current.is_empty() {
                    previous = self.flush(&mut pieces, &previous, std::mem::take(&mut current));
                }
                let mut prev_end: Option<usize> = None;
                for (begin, end) in self.force_spans(unit) {
                    let piece = match prev_end {
                        None => Piece {
                            overlap: String::new(),
                            body: unit[begin..end].to_string(),
                            continues: false,
                        },
                        Some(resume) => {
                            let resume = resume.clamp(begin, end);
                            Piece {
                                overlap: unit[begin..resume].to_string(),
                                body: unit[resume..end].to_string(),
                                continues: true,
                            }
                        }
                    };
                    previous = unit[begin..end].to_string();
                    pieces.push(piece);
                    prev_end = Some(end);
                }
                continue;
            }

            let joined_len = char_len(&current) + joiner.len() + char_len(unit);
            if !current.is_empty() && exceeds(joined_len, self.target_chars) {
                previous = self.flush(&mut pieces, &previous, std::mem::take(&mut current));
            }

            if !current.is_empty() {
                current.push_str(joiner);
            }
            current.push_str(unit);
        }

        if !current.is_empty() {
            self.flush(&mut pieces, &previous, current);
        }

        pieces
    }

    /// Emit `body` with the tail of `previous` and return the new
    /// predecessor.
    fn flush(&self, pieces: &mut Vec<Piece>, previous: &str, body: String) -> String {
        pieces.push(Piece {
            overlap: tail_chars(previous, self.overlap_chars).to_string(),
            body: body.clone(),
            continues: false,
        });
        body
    }

    /// Split `text` into pieces of at most `max_chars` characters.
    ///
    /// Each cut backs up to the nearest space or newline within the
    /// last [`FORCE_SPLIT_LOOKBACK_CHARS`] characters of the window
    /// and falls back to a hard cut when none exists. Every piece
    /// after the first starts with the final `overlap_chars`
    /// characters of its predecessor, so dropping that prefix and
    /// concatenating reproduces `text`.
    pub fn force_split(&self, text: &str) -> Vec<String> {
        self.force_spans(text)
            .into_iter()
            .map(|(begin, end)| text[begin..end].to_string())
            .collect()
    }

    /// Byte ranges of the [`Chunker::force_split`] pieces.
    ///
    /// Each range after the first starts at or before the end of its
    /// predecessor.
    fn force_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let char_indices: Vec<(usize, char)> = text.char_indices().collect();
        let total = char_indices.len();

        let mut parts = Vec::new();
        let mut start = 0;

        while start < total {
            let remaining = total - start;
            let mut size = self.max_chars.min(remaining);

            if size < remaining {
                let floor = size.saturating_sub(FORCE_SPLIT_LOOKBACK_CHARS);
                if let Some(boundary) = (floor + 1..=size)
                    .rev()
                    .find(|&i| matches!(char_indices[start + i].1, ' ' | '\n'))
                {
                    size = boundary;
                }
            }

            let byte_start = char_indices[start].0;
            let byte_end = if start + size < total {
                char_indices[start + size].0
            } else {
                text.len()
            };
            parts.push((byte_start, byte_end));

            if start + size >= total {
                break;
            }

            // Step back by the overlap, always advancing at least 1 char
            start += size.saturating_sub(self.overlap_chars).max(1);
        }

        parts
    }
}

/// Top-level split units of `content` and the separator that joins
/// them back: paragraphs, else lines, else sentences.
///
/// Units keep their indentation; only blank units are dropped.
/// Sentences keep their period and trailing space, so their joiner
/// is empty.
fn split_units(content: &str) -> (Vec<&str>, &'static str) {
    let (units, joiner): (Vec<&str>, &'static str) = if content.contains(PARAGRAPH_BREAK) {
        (content.split(PARAGRAPH_BREAK).collect(), PARAGRAPH_BREAK)
    } else if content.contains('\n') {
        (content.split('\n').collect(), "\n")
    } else {
        (content.split_inclusive(". ").collect(), "")
    };

    let units = units
        .into_iter()
        .filter(|unit| !unit.trim().is_empty())
        .collect();
    (units, joiner)
}

/// Whether `chars` characters estimate to more tokens than a budget
/// of `budget_chars` characters.
fn exceeds(chars: usize, budget_chars: usize) -> bool {
    chars / CHARS_PER_TOKEN > budget_chars / CHARS_PER_TOKEN
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Last `n` characters of `text` (all of it when shorter)
fn tail_chars(text: &str, n: usize) -> &str {
    let len = char_len(text);
    if len <= n {
        return text;
    }
    match text.char_indices().nth(len - n) {
        Some((offset, _)) => &text[offset..],
        None => text,
    }
}

//! Section segmentation.
//!
//! Splits a flat documentation corpus at its level-1 (page) and
//! level-2 (category) headings. Deeper headings stay inside the
//! section content, where the chunker later uses them to label
//! sub-chunks.
//!
//! Lines inside fenced code blocks are never treated as headings,
//! so shell comments in examples do not open new pages.

use super::markup::{clean_title, heading_level, is_fence};

/// Nesting level of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionLevel {
    /// Text directly below a level-1 heading
    Page,
    /// Text below a level-2 heading
    Category,
}

/// One heading-delimited span of the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub level: SectionLevel,

    /// Enclosing page title
    pub page: String,

    /// Section title (equals `page` at page level)
    pub category: String,

    /// Initial subcategory (equals `category`)
    pub subcategory: String,

    /// Body text; paragraphs separated by a single blank line
    pub content: String,

    /// Link target found in the enclosing page heading
    pub base_url: Option<String>,
}

impl Section {
    fn page(title: String, base_url: Option<String>) -> Self {
        Self {
            level: SectionLevel::Page,
            page: title.clone(),
            category: title.clone(),
            subcategory: title,
            content: String::new(),
            base_url,
        }
    }

    fn category(page: String, title: String, base_url: Option<String>) -> Self {
        Self {
            level: SectionLevel::Category,
            page,
            category: title.clone(),
            subcategory: title,
            content: String::new(),
            base_url,
        }
    }

    /// Whether this section sits directly below a page heading
    pub fn is_page_level(&self) -> bool {
        self.level == SectionLevel::Page
    }
}

/// Accumulates lines for the section being read
struct SectionBuilder {
    section: Section,
    pending_break: bool,
}

impl SectionBuilder {
    fn new(section: Section) -> Self {
        Self {
            section,
            pending_break: false,
        }
    }

    fn push_line(&mut self, line: &str) {
        let content = &mut self.section.content;
        if !content.is_empty() {
            content.push_str(if self.pending_break { "\n\n" } else { "\n" });
        }
        content.push_str(line);
        self.pending_break = false;
    }

    fn push_blank(&mut self) {
        if !self.section.content.is_empty() {
            self.pending_break = true;
        }
    }

    fn finish(self) -> Option<Section> {
        if self.section.content.trim().is_empty() {
            None
        } else {
            Some(self.section)
        }
    }
}

/// Split a documentation corpus into page and category sections.
///
/// - A level-1 heading opens a page; its link target becomes the
///   base URL for every section of the page.
/// - A level-2 heading opens a category below the current page. A
///   category that appears before any page uses its own title as
///   the page.
/// - Text before the first heading is discarded.
/// - Sections without content are dropped.
/// - Runs of blank lines collapse into one paragraph break.
///
/// # Example
///
/// ```
/// use docsearch::core::indexer::{segment, SectionLevel};
///
/// let sections = segment("# A\n\nshort\n\n## B\n\nshort2\n");
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[0].level, SectionLevel::Page);
/// assert_eq!(sections[1].page, "A");
/// assert_eq!(sections[1].category, "B");
/// ```
pub fn segment(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<SectionBuilder> = None;
    let mut page: Option<(String, Option<String>)> = None;
    let mut in_fence = false;

    for raw in text.lines() {
        let line = raw.trim();

        if is_fence(line) {
            in_fence = !in_fence;
            if let Some(builder) = current.as_mut() {
                builder.push_line(line);
            }
            continue;
        }

        if in_fence {
            // Keep code indentation
            if let Some(builder) = current.as_mut() {
                if line.is_empty() {
                    builder.push_blank();
                } else {
                    builder.push_line(raw.trim_end());
                }
            }
            continue;
        }

        match heading_level(line) {
            Some(1) => {
                sections.extend(current.take().and_then(SectionBuilder::finish));
                let (title, url) = clean_title(line);
                page = Some((title.clone(), url.clone()));
                current = Some(SectionBuilder::new(Section::page(title, url)));
            }
            Some(2) => {
                sections.extend(current.take().and_then(SectionBuilder::finish));
                let (title, url) = clean_title(line);
                let (page_title, base_url) = match &page {
                    Some((page_title, page_url)) => (page_title.clone(), page_url.clone()),
                    None => (title.clone(), url),
                };
                current = Some(SectionBuilder::new(Section::category(
                    page_title, title, base_url,
                )));
            }
            _ => {
                if let Some(builder) = current.as_mut() {
                    if line.is_empty() {
                        builder.push_blank();
                    } else {
                        builder.push_line(line);
                    }
                }
            }
        }
    }

    sections.extend(current.and_then(SectionBuilder::finish));
    sections
}

// Integration tests for corpus parsing and chunk subdivision

use crate::common::{long_section_doc, realistic_corpus};
use docsearch::core::indexer::{
    segment, IndexingPipeline, CHARS_PER_TOKEN, MAX_CHUNK_TOKENS, OVERLAP_TOKENS,
};
use docsearch::core::types::Chunk;
use std::collections::HashSet;

/// Last `n` characters of `text`
fn tail(text: &str, n: usize) -> String {
    let len = text.chars().count();
    text.chars().skip(len.saturating_sub(n)).collect()
}

fn chunks_of<'a>(chunks: &'a [Chunk], category: &str) -> Vec<&'a Chunk> {
    chunks.iter().filter(|c| c.category == category).collect()
}

#[test]
fn test_two_section_document() {
    let parsed = IndexingPipeline::default().parse("# A\n\nshort\n\n## B\n\nshort2\n");

    assert_eq!(parsed.chunks.len(), 2);

    let first = &parsed.chunks[0];
    assert_eq!((first.page.as_str(), first.category.as_str()), ("A", "A"));
    assert_eq!(first.content, "short");
    assert_eq!(first.id, "chunk_0");

    let second = &parsed.chunks[1];
    assert_eq!((second.page.as_str(), second.category.as_str()), ("A", "B"));
    assert_eq!(second.content, "short2");
    assert_eq!(second.breadcrumb, "A > B");
    assert_eq!(second.id, "chunk_1");

    assert!(parsed.chunks.iter().all(|c| !c.id.contains("_sub")));
}

#[test]
fn test_1350_token_section_is_split() {
    let doc = long_section_doc(1350, 600);
    let parsed = IndexingPipeline::default().parse(&doc);

    let pieces = chunks_of(&parsed.chunks, "Backends");
    assert!(pieces.len() >= 2, "expected a split, got {}", pieces.len());

    for (i, chunk) in pieces.iter().enumerate() {
        assert_eq!(chunk.id, format!("chunk_1_sub{i}"));
        assert!(chunk.token_count <= 2 * MAX_CHUNK_TOKENS);
        assert!(!chunk.breadcrumb.is_empty());
        assert!(!chunk.keywords.is_empty());
        assert_eq!(chunk.subcategory, format!("Backends (part {})", i + 1));
        assert_eq!(
            chunk.url,
            format!("https://docs.example.com/reference/#backends-part-{}", i + 1)
        );
    }
}

#[test]
fn test_sub_chunks_share_overlap() {
    let doc = long_section_doc(1350, 600);
    let parsed = IndexingPipeline::default().parse(&doc);
    let pieces = chunks_of(&parsed.chunks, "Backends");
    let overlap = OVERLAP_TOKENS * CHARS_PER_TOKEN;

    for pair in pieces.windows(2) {
        let previous_tail = tail(&pair[0].content, overlap);
        assert!(
            pair[1].content.starts_with(&format!("{previous_tail}\n\n")),
            "{} does not start with the tail of {}",
            pair[1].id,
            pair[0].id
        );
    }
}

#[test]
fn test_content_preserved_after_removing_overlap() {
    let doc = long_section_doc(2400, 700);
    let section = segment(&doc)
        .into_iter()
        .find(|s| s.category == "Backends")
        .unwrap();

    let parsed = IndexingPipeline::default().parse(&doc);
    let pieces = chunks_of(&parsed.chunks, "Backends");
    assert!(pieces.len() >= 3);

    let overlap = OVERLAP_TOKENS * CHARS_PER_TOKEN;
    let mut bodies: Vec<String> = Vec::new();
    for chunk in &pieces {
        let body = match bodies.last() {
            None => chunk.content.clone(),
            Some(previous) => {
                let prefix = format!("{}\n\n", tail(previous, overlap));
                chunk
                    .content
                    .strip_prefix(&prefix)
                    .expect("overlap prefix")
                    .to_string()
            }
        };
        bodies.push(body);
    }

    assert_eq!(bodies.join("\n\n"), section.content);
}

#[test]
fn test_indented_code_survives_subdivision() {
    let fence = "```yaml\nbackends:\n\n    - name: primary\n      timeout: 30s\n```";
    let doc = long_section_doc(1400, 700).replacen(
        "\n\nParagraph 2 ",
        &format!("\n\n{fence}\n\nParagraph 2 "),
        1,
    );
    let section = segment(&doc)
        .into_iter()
        .find(|s| s.category == "Backends")
        .unwrap();
    assert!(section.content.contains(fence));

    let parsed = IndexingPipeline::default().parse(&doc);
    let pieces = chunks_of(&parsed.chunks, "Backends");
    assert!(pieces.len() >= 2);
    assert!(pieces
        .iter()
        .any(|c| c.content.contains("    - name: primary\n      timeout: 30s")));

    let overlap = OVERLAP_TOKENS * CHARS_PER_TOKEN;
    let mut bodies: Vec<String> = vec![pieces[0].content.clone()];
    for chunk in &pieces[1..] {
        let prefix = format!("{}\n\n", tail(bodies.last().unwrap(), overlap));
        bodies.push(chunk.content.strip_prefix(&prefix).unwrap().to_string());
    }
    assert_eq!(bodies.join("\n\n"), section.content);
}

#[test]
fn test_section_at_max_tokens_is_not_split() {
    let limit = MAX_CHUNK_TOKENS * CHARS_PER_TOKEN + CHARS_PER_TOKEN - 1;
    let first = "a".repeat(1600);
    let second = "b".repeat(limit - first.len() - 2);
    let doc = format!("# Page\n\n## Limits\n\n{first}\n\n{second}\n");

    let parsed = IndexingPipeline::default().parse(&doc);
    let limits = chunks_of(&parsed.chunks, "Limits");
    assert_eq!(limits.len(), 1);
    assert_eq!(limits[0].token_count, MAX_CHUNK_TOKENS);
    assert!(!limits[0].id.contains("_sub"));

    let doc = format!("# Page\n\n## Limits\n\n{first}\n\n{second}b\n");
    let parsed = IndexingPipeline::default().parse(&doc);
    assert_eq!(chunks_of(&parsed.chunks, "Limits").len(), 2);
}

#[test]
fn test_token_budget_holds() {
    let mut doc = realistic_corpus(3);
    doc.push_str(&long_section_doc(1800, 1200));

    let parsed = IndexingPipeline::default().parse(&doc);
    assert!(!parsed.chunks.is_empty());
    assert_eq!(parsed.oversized, 0);

    for chunk in &parsed.chunks {
        assert!(
            chunk.token_count <= MAX_CHUNK_TOKENS,
            "{} has {} tokens",
            chunk.id,
            chunk.token_count
        );
        assert_eq!(chunk.token_count, chunk.content.chars().count() / CHARS_PER_TOKEN);
    }
}

#[test]
fn test_no_markup_leaks_into_titles_or_urls() {
    let doc = "\
# [Security](https://docs.example.com/security/)

Overview.

## [CORS](https://docs.example.com/security/cors/) settings

Allowed origins are listed explicitly.

### [Preflight](https://docs.example.com/preflight/) caching

Preflight responses are cached.
";
    let mut corpus = doc.to_string();
    corpus.push_str(&realistic_corpus(2));

    let parsed = IndexingPipeline::default().parse(&corpus);
    for chunk in &parsed.chunks {
        for field in [&chunk.page, &chunk.category, &chunk.subcategory, &chunk.url] {
            assert!(!field.contains("]("), "{}: {field}", chunk.id);
        }
    }

    let cors = parsed
        .chunks
        .iter()
        .find(|c| c.category == "CORS settings")
        .unwrap();
    assert_eq!(cors.url, "https://docs.example.com/security/#cors-settings");
}

#[test]
fn test_code_fence_comments_are_not_headings() {
    let parsed = IndexingPipeline::default().parse(&realistic_corpus(3));

    let pages: HashSet<&str> = parsed.chunks.iter().map(|c| c.page.as_str()).collect();
    assert_eq!(pages.len(), 3);
    assert!(parsed
        .chunks
        .iter()
        .any(|c| c.content.contains("# not a heading")));
}

#[test]
fn test_ids_unique_across_document() {
    let mut doc = realistic_corpus(4);
    doc.push_str(&long_section_doc(3000, 800));

    let parsed = IndexingPipeline::default().parse(&doc);
    let ids: HashSet<&str> = parsed.chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), parsed.chunks.len());
}

#[test]
fn test_document_without_headings_yields_nothing() {
    let parsed = IndexingPipeline::default().parse("plain text\n\nwith paragraphs\n");
    assert!(parsed.chunks.is_empty());
    assert_eq!(parsed.avg_tokens, 0);
}

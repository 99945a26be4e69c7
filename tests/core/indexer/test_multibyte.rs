// UTF-8 safety tests for parsing non-ASCII corpora
//
// All sizes are measured in characters; these corpora make byte and
// character lengths diverge so any byte-based slicing would panic.

use docsearch::core::indexer::{IndexingPipeline, CHARS_PER_TOKEN, MAX_CHUNK_TOKENS};

fn repeat_paragraphs(sentence: &str, paragraph_chars: usize, paragraphs: usize) -> String {
    let per = paragraph_chars / sentence.chars().count().max(1);
    (0..paragraphs)
        .map(|_| sentence.repeat(per.max(1)).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[test]
fn test_cyrillic_section_split() {
    let body = repeat_paragraphs("Шлюз перенаправляет запросы к серверам. ", 700, 10);
    let doc = format!("# Шлюз\n\nОбзор.\n\n## Тайм-ауты\n\n{body}\n");

    let parsed = IndexingPipeline::default().parse(&doc);
    let pieces: Vec<_> = parsed
        .chunks
        .iter()
        .filter(|c| c.category == "Тайм-ауты")
        .collect();

    assert!(pieces.len() >= 2);
    for chunk in pieces {
        assert!(chunk.token_count <= MAX_CHUNK_TOKENS);
        assert_eq!(chunk.breadcrumb.split(" > ").next(), Some("Шлюз"));
    }
}

#[test]
fn test_cjk_paragraph_without_spaces_force_split() {
    // One 5000-char paragraph with no word boundary at all
    let body = "文档索引".repeat(1250);
    let doc = format!("# 文档\n\n## 索引\n\n{body}\n");

    let parsed = IndexingPipeline::default().parse(&doc);
    assert!(parsed.chunks.len() >= 2);

    for chunk in &parsed.chunks {
        assert!(chunk.token_count <= MAX_CHUNK_TOKENS);
        assert_eq!(
            chunk.token_count,
            chunk.content.chars().count() / CHARS_PER_TOKEN
        );
    }
}

#[test]
fn test_emoji_and_mixed_scripts() {
    let body = repeat_paragraphs("Deploy 🚀 the gateway / 部署网关 / развернуть шлюз. ", 900, 6);
    let doc = format!("# Deploy 🚀\n\n## Rollout ✅\n\n{body}\n");

    let parsed = IndexingPipeline::default().parse(&doc);
    assert!(!parsed.chunks.is_empty());
    assert!(parsed.chunks.iter().all(|c| c.page == "Deploy 🚀"));

    let first = &parsed.chunks[0];
    assert!(first.subcategory.starts_with("Rollout ✅"));
    // No link in the page heading
    assert!(first.url.is_empty());
}

#[test]
fn test_invalid_utf8_bytes_are_replaced() {
    let mut bytes = b"# Page\n\n## Section\n\nvalid text ".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe]);
    bytes.extend_from_slice(b" more text\n");

    let parsed = IndexingPipeline::default().parse_bytes(&bytes);
    assert_eq!(parsed.chunks.len(), 1);
    assert!(parsed.chunks[0].content.contains('\u{FFFD}'));
}

// Integration tests for initialization and corruption recovery

use crate::common::{
    create_test_engine, write_file, StaticFetcher, TestDataRoot, REVISED_DOC, TWO_SECTION_DOC,
};
use docsearch::core::engine::build_index_file;
use docsearch::core::error::DocSearchError;
use docsearch::core::indexer::INDEX_SCHEMA_VERSION;
use docsearch::core::storage::{read_version, write_version, LockRecord};

#[tokio::test]
async fn test_first_run_indexes_fallback_corpus() {
    let root = TestDataRoot::new();
    root.write_bundle_corpus(TWO_SECTION_DOC);
    let engine = create_test_engine(&root, StaticFetcher::failing());

    let response = engine.search("backend timeout", Some(5)).await.unwrap();
    assert_eq!(response.results[0].chunk.category, "Timeouts");

    // Corpus copied into docs/, marker written, no freshness record
    assert_eq!(
        std::fs::read_to_string(root.layout.source_file()).unwrap(),
        TWO_SECTION_DOC
    );
    assert_eq!(
        read_version(&root.layout.version_file()),
        Some(INDEX_SCHEMA_VERSION)
    );
    let status = engine.status();
    assert!(status.published);
    assert!(status.stale);
    assert!(status.last_update.is_none());
    assert_eq!(
        LockRecord::read(&root.layout.lock_file()).unwrap(),
        LockRecord::Free
    );
}

#[tokio::test]
async fn test_local_source_preferred_over_fallback() {
    let root = TestDataRoot::new();
    root.write_local_corpus(REVISED_DOC);
    root.write_bundle_corpus(TWO_SECTION_DOC);
    let engine = create_test_engine(&root, StaticFetcher::failing());

    engine.initialize().await.unwrap();
    assert_eq!(engine.status().doc_count, 3);
}

#[tokio::test]
async fn test_reopens_published_index_after_restart() {
    let root = TestDataRoot::new();
    {
        let engine = create_test_engine(&root, StaticFetcher::new(REVISED_DOC));
        engine.refresh(true).await.unwrap();
        engine.shutdown().await.unwrap();
    }

    // Nothing to rebuild from: the published index must be reused
    std::fs::remove_file(root.layout.source_file()).unwrap();
    let fetcher = StaticFetcher::failing();
    let engine = create_test_engine(&root, std::sync::Arc::clone(&fetcher));

    let response = engine.search("circuit breaker", None).await.unwrap();
    assert_eq!(response.total_hits, 1);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_schema_mismatch_discards_and_rebuilds() {
    let root = TestDataRoot::new();
    {
        let engine = create_test_engine(&root, StaticFetcher::new(TWO_SECTION_DOC));
        engine.refresh(true).await.unwrap();
        engine.shutdown().await.unwrap();
    }

    // Pretend the index was written by an older chunker
    write_version(&root.layout.version_file(), INDEX_SCHEMA_VERSION - 1).unwrap();
    root.write_local_corpus(REVISED_DOC);

    let engine = create_test_engine(&root, StaticFetcher::failing());
    engine.initialize().await.unwrap();

    assert_eq!(engine.status().doc_count, 3);
    assert_eq!(
        read_version(&root.layout.version_file()),
        Some(INDEX_SCHEMA_VERSION)
    );
}

#[tokio::test]
async fn test_missing_marker_discards_index() {
    let root = TestDataRoot::new();
    {
        let engine = create_test_engine(&root, StaticFetcher::new(TWO_SECTION_DOC));
        engine.refresh(true).await.unwrap();
        engine.shutdown().await.unwrap();
    }
    std::fs::remove_file(root.layout.version_file()).unwrap();
    root.write_local_corpus(REVISED_DOC);

    let engine = create_test_engine(&root, StaticFetcher::failing());
    engine.initialize().await.unwrap();
    assert_eq!(engine.status().doc_count, 3);
}

#[tokio::test]
async fn test_corrupted_index_recovered_from_fallback() {
    let root = TestDataRoot::new();
    root.write_bundle_corpus(TWO_SECTION_DOC);

    write_file(&root.layout.index_dir().join("meta.json"), "{ truncated");
    write_version(&root.layout.version_file(), INDEX_SCHEMA_VERSION).unwrap();

    let engine = create_test_engine(&root, StaticFetcher::failing());
    engine.initialize().await.unwrap();

    assert_eq!(engine.status().doc_count, 2);
    assert!(engine.search("gateway", None).await.is_ok());
}

#[tokio::test]
async fn test_prebuilt_fallback_index_is_used() {
    let root = TestDataRoot::new();

    // Bundle index built from the revised document, bundle corpus
    // from the older one: only the index knows "circuit breaker"
    let source = root.dir.path().join("export/llms-full.txt");
    write_file(&source, REVISED_DOC);
    let stats = build_index_file(&source, &root.bundle_dir()).unwrap();
    assert_eq!(stats.chunks_indexed, 3);
    root.write_bundle_corpus(TWO_SECTION_DOC);

    let engine = create_test_engine(&root, StaticFetcher::failing());
    let response = engine.search("circuit breaker", None).await.unwrap();
    assert_eq!(response.total_hits, 1);

    // The bundle corpus is restored for later rebuilds
    assert_eq!(
        std::fs::read_to_string(root.layout.source_file()).unwrap(),
        TWO_SECTION_DOC
    );
}

#[tokio::test]
async fn test_prebuilt_index_with_old_marker_is_ignored() {
    let root = TestDataRoot::new();
    let source = root.dir.path().join("export/llms-full.txt");
    write_file(&source, REVISED_DOC);
    build_index_file(&source, &root.bundle_dir()).unwrap();
    write_file(
        &root.bundle_dir().join("search/.index_version"),
        &(INDEX_SCHEMA_VERSION - 1).to_string(),
    );
    root.write_bundle_corpus(TWO_SECTION_DOC);

    let engine = create_test_engine(&root, StaticFetcher::failing());
    engine.initialize().await.unwrap();

    // Rebuilt from the bundle corpus instead
    assert_eq!(engine.status().doc_count, 2);
}

#[tokio::test]
async fn test_no_source_anywhere_fails() {
    let root = TestDataRoot::new();
    let engine = create_test_engine(&root, StaticFetcher::failing());

    let err = engine.initialize().await.unwrap_err();
    assert!(matches!(err, DocSearchError::FallbackMissing(_)));
    assert!(!engine.status().published);
    assert_eq!(
        LockRecord::read(&root.layout.lock_file()).unwrap(),
        LockRecord::Free
    );
}

#[tokio::test]
async fn test_leftover_staging_dir_is_replaced() {
    let root = TestDataRoot::new();
    root.write_bundle_corpus(TWO_SECTION_DOC);
    write_file(&root.layout.staging_dir().join("junk"), "interrupted build");

    let engine = create_test_engine(&root, StaticFetcher::failing());
    engine.initialize().await.unwrap();

    assert!(!root.layout.staging_dir().exists());
    assert!(!root.layout.index_dir().join("junk").exists());
}

#[tokio::test]
async fn test_cached_source_without_sections_falls_back() {
    let root = TestDataRoot::new();
    root.write_local_corpus("no headings here\n");
    root.write_bundle_corpus(TWO_SECTION_DOC);

    let engine = create_test_engine(&root, StaticFetcher::failing());
    engine.initialize().await.unwrap();

    assert_eq!(engine.status().doc_count, 2);
    assert_eq!(engine.search("gateway", None).await.unwrap().total_hits, 2);
    assert_eq!(
        std::fs::read_to_string(root.layout.source_file()).unwrap(),
        TWO_SECTION_DOC
    );
}

#[tokio::test]
async fn test_fallback_corpus_without_sections_fails() {
    let root = TestDataRoot::new();
    root.write_bundle_corpus("no headings here\n");

    let engine = create_test_engine(&root, StaticFetcher::failing());
    let err = engine.initialize().await.unwrap_err();

    assert!(matches!(err, DocSearchError::IndexingFailed(_)));
    assert!(!engine.status().published);
}

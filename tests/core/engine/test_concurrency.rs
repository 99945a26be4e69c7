// Concurrency tests: searches racing rebuilds, refresh coalescing

use crate::common::{create_test_engine, StaticFetcher, TestDataRoot, REVISED_DOC, TWO_SECTION_DOC};
use docsearch::core::error::DocSearchError;
use docsearch::core::storage::LockRecord;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_searches_never_fail_during_rebuilds() {
    let root = TestDataRoot::new();
    let fetcher = StaticFetcher::new(TWO_SECTION_DOC);
    let engine = Arc::new(create_test_engine(&root, Arc::clone(&fetcher)));
    engine.refresh(true).await.unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let completed = Arc::new(AtomicUsize::new(0));

    let searchers: Vec<_> = (0..6)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let stop = Arc::clone(&stop);
            let completed = Arc::clone(&completed);
            tokio::spawn(async move {
                while !stop.load(Ordering::Acquire) {
                    let response = engine
                        .search("gateway backend", Some(3))
                        .await
                        .expect("search during rebuild");
                    assert!(!response.results.is_empty());
                    completed.fetch_add(1, Ordering::Relaxed);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for round in 0..4 {
        fetcher.set_body(if round % 2 == 0 { REVISED_DOC } else { TWO_SECTION_DOC });
        engine.refresh(true).await.unwrap();
    }

    stop.store(true, Ordering::Release);
    for searcher in searchers {
        searcher.await.unwrap();
    }

    assert!(completed.load(Ordering::Relaxed) > 0);
    assert_eq!(fetcher.calls(), 5);
    assert_eq!(engine.status().doc_count, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refreshes_fetch_once() {
    let root = TestDataRoot::new();
    let fetcher = StaticFetcher::slow(TWO_SECTION_DOC, Duration::from_millis(150));
    let engine = Arc::new(create_test_engine(&root, Arc::clone(&fetcher)));

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.refresh(false).await })
        })
        .collect();

    let mut updated = 0;
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.chunks_indexed, 2);
        if outcome.updated {
            updated += 1;
        }
    }

    // Waiters find the cache fresh once the first refresh finishes
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(updated, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_searches_initialize_once() {
    let root = TestDataRoot::new();
    root.write_bundle_corpus(TWO_SECTION_DOC);
    let fetcher = StaticFetcher::failing();
    let engine = Arc::new(create_test_engine(&root, Arc::clone(&fetcher)));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.search("backend timeout", None).await })
        })
        .collect();

    for task in tasks {
        let response = task.await.unwrap().unwrap();
        assert_eq!(response.results[0].chunk.category, "Timeouts");
    }

    assert_eq!(engine.holder().current().unwrap().id(), 1);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_shutdown_closes_engine() {
    let root = TestDataRoot::new();
    let engine = create_test_engine(&root, StaticFetcher::new(TWO_SECTION_DOC));
    engine.refresh(true).await.unwrap();
    let generation = engine.holder().current().unwrap();

    // A record left behind by this process is cleaned up
    std::fs::write(root.layout.lock_file(), std::process::id().to_string()).unwrap();

    engine.shutdown().await.unwrap();

    assert!(generation.is_closed());
    assert!(!engine.status().published);
    assert_eq!(
        LockRecord::read(&root.layout.lock_file()).unwrap(),
        LockRecord::Free
    );
    assert!(matches!(
        engine.search("gateway", None).await,
        Err(DocSearchError::IndexClosed)
    ));
    assert!(matches!(
        engine.refresh(true).await,
        Err(DocSearchError::IndexClosed)
    ));
}

#[tokio::test]
async fn test_shutdown_keeps_foreign_lock_record() {
    let root = TestDataRoot::new();
    let engine = create_test_engine(&root, StaticFetcher::new(TWO_SECTION_DOC));
    engine.refresh(true).await.unwrap();

    std::fs::write(root.layout.lock_file(), "1").unwrap();
    engine.shutdown().await.unwrap();

    assert_eq!(
        LockRecord::read(&root.layout.lock_file()).unwrap(),
        LockRecord::Held(1)
    );
}

// Stress tests for generation swaps under concurrent readers

use docsearch::core::storage::{build_generation_dir, Generation, GenerationState, IndexHolder};
use docsearch::core::types::Chunk;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const GENERATIONS: usize = 6;
const READERS: usize = 8;

fn generation_chunks(generation: usize) -> Vec<Chunk> {
    (0..20)
        .map(|i| Chunk {
            id: format!("chunk_{i}"),
            page: "Gateway".to_string(),
            category: format!("Category {i}"),
            subcategory: format!("Category {i}"),
            content: format!("generation{generation} backend timeout retries entry {i}"),
            breadcrumb: format!("Gateway > Category {i}"),
            keywords: vec!["backend".to_string(), "timeout".to_string()],
            token_count: 12,
            ..Default::default()
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_survive_concurrent_swaps() {
    let temp = TempDir::new().unwrap();
    let holder = Arc::new(IndexHolder::new());

    // Build every generation up front; the swapper only opens them
    let dirs: Vec<_> = (0..GENERATIONS)
        .map(|g| {
            let dir = temp.path().join(format!("gen{g}"));
            build_generation_dir(&dir, &generation_chunks(g)).unwrap();
            dir
        })
        .collect();

    let first = Arc::new(Generation::open(&dirs[0], holder.next_generation_id()).unwrap());
    holder.publish(first);

    let stop = Arc::new(AtomicBool::new(false));
    let searches = Arc::new(AtomicUsize::new(0));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let holder = Arc::clone(&holder);
            let stop = Arc::clone(&stop);
            let searches = Arc::clone(&searches);
            tokio::spawn(async move {
                while !stop.load(Ordering::Acquire) {
                    {
                        let guard = holder.enter();
                        let generation = guard.generation().expect("published");
                        let (hits, total) = generation
                            .search("backend timeout", 5)
                            .expect("search against captured generation");
                        assert_eq!(total, 20);
                        assert_eq!(hits.len(), 5);
                        searches.fetch_add(1, Ordering::Relaxed);
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    let mut retired = Vec::new();
    let mut replaced = Vec::new();
    for dir in &dirs[1..] {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let next = Arc::new(Generation::open(dir, holder.next_generation_id()).unwrap());
        if let Some(old) = holder.publish(next) {
            replaced.push(Arc::clone(&old));
            retired.push(holder.retire(old));
        }
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    stop.store(true, Ordering::Release);
    for reader in readers {
        reader.await.unwrap();
    }
    for task in retired {
        task.await.unwrap();
    }

    assert!(searches.load(Ordering::Relaxed) > 0);
    assert_eq!(holder.in_flight(), 0);
    assert_eq!(replaced.len(), GENERATIONS - 1);
    assert!(replaced
        .iter()
        .all(|g| g.state() == GenerationState::Closed));
    assert_eq!(
        holder.current().unwrap().state(),
        GenerationState::Published
    );
}

#[tokio::test]
async fn test_captured_generation_outlives_swap() {
    let temp = TempDir::new().unwrap();
    let holder = IndexHolder::new();

    let old_dir = temp.path().join("old");
    let new_dir = temp.path().join("new");
    build_generation_dir(&old_dir, &generation_chunks(0)).unwrap();
    build_generation_dir(&new_dir, &generation_chunks(1)).unwrap();

    holder.publish(Arc::new(
        Generation::open(&old_dir, holder.next_generation_id()).unwrap(),
    ));
    let guard = holder.enter();

    let old = holder
        .publish(Arc::new(
            Generation::open(&new_dir, holder.next_generation_id()).unwrap(),
        ))
        .unwrap();
    let retire = holder.retire(old);

    // A search started after the publish sees the new generation
    let fresh = holder.enter();
    let (hits, _) = fresh
        .generation()
        .unwrap()
        .search("generation1", 1)
        .unwrap();
    assert_eq!(hits.len(), 1);
    drop(fresh);

    // The captured one still answers from the old content
    let (hits, _) = guard
        .generation()
        .unwrap()
        .search("generation0", 1)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(!retire.is_finished());

    drop(guard);
    tokio::time::timeout(Duration::from_secs(2), retire)
        .await
        .unwrap()
        .unwrap();
}

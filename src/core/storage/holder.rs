//! Atomically swappable holder of the current index generation.
//!
//! Readers never take a lock: a search registers on the in-flight
//! counter, then loads the current generation pointer. Writers swap
//! the pointer and hand the previous generation to a background task
//! that waits for the counter to reach zero before closing it.
//!
//! Registering before loading means every search that could have
//! observed the old generation is counted by the time the swap
//! returns, so the drain never closes a generation under a reader.

use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use super::tantivy::{Generation, GenerationState};

/// Counter of running searches with a zero notification
#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    drained: Notify,
}

impl InFlight {
    fn enter(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn exit(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    async fn wait_for_zero(&self) {
        loop {
            // Created before the check so a concurrent exit cannot be missed
            let notified = self.drained.notified();
            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Registration of one running search.
///
/// Holds the generation observed at entry; dropping the guard marks
/// the search complete.
#[derive(Debug)]
pub struct SearchGuard {
    in_flight: Arc<InFlight>,
    generation: Option<Arc<Generation>>,
}

impl SearchGuard {
    /// Generation current at entry, if one was published
    pub fn generation(&self) -> Option<&Arc<Generation>> {
        self.generation.as_ref()
    }
}

impl Drop for SearchGuard {
    fn drop(&mut self) {
        self.in_flight.exit();
    }
}

/// Current-generation pointer, drain accounting and rebuild mutex
#[derive(Debug, Default)]
pub struct IndexHolder {
    current: ArcSwapOption<Generation>,
    in_flight: Arc<InFlight>,
    next_id: AtomicU64,
    rebuild: Mutex<()>,
}

impl IndexHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for the next generation opened by this holder
    pub fn next_generation_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Register a search, then load the current generation
    pub fn enter(&self) -> SearchGuard {
        self.in_flight.enter();
        SearchGuard {
            in_flight: Arc::clone(&self.in_flight),
            generation: self.current.load_full(),
        }
    }

    /// Current generation without registering a search
    pub fn current(&self) -> Option<Arc<Generation>> {
        self.current.load_full()
    }

    pub fn is_published(&self) -> bool {
        self.current.load().is_some()
    }

    /// Searches currently registered
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    /// Make `generation` current and return the one it replaced.
    ///
    /// The replaced generation is marked draining; pass it to
    /// [`IndexHolder::retire`].
    pub fn publish(&self, generation: Arc<Generation>) -> Option<Arc<Generation>> {
        generation.set_state(GenerationState::Published);
        let id = generation.id();
        let previous = self.current.swap(Some(generation));

        if let Some(old) = &previous {
            old.set_state(GenerationState::Draining);
            tracing::debug!("Published generation {} (replacing {})", id, old.id());
        } else {
            tracing::debug!("Published generation {}", id);
        }
        previous
    }

    /// Clear the pointer and return the generation it held
    pub fn take(&self) -> Option<Arc<Generation>> {
        let previous = self.current.swap(None);
        if let Some(old) = &previous {
            old.set_state(GenerationState::Draining);
        }
        previous
    }

    /// Wait until no search is registered
    pub async fn wait_for_drain(&self) {
        self.in_flight.wait_for_zero().await;
    }

    /// Close `old` in the background once every registered search
    /// has finished.
    pub fn retire(&self, old: Arc<Generation>) -> JoinHandle<()> {
        let in_flight = Arc::clone(&self.in_flight);
        tokio::spawn(async move {
            let start = Instant::now();
            in_flight.wait_for_zero().await;
            old.close();
            tracing::info!(
                "Retired index generation {} after {}ms drain",
                old.id(),
                start.elapsed().as_millis()
            );
        })
    }

    /// Serializes rebuilds within this process
    pub fn rebuild_lock(&self) -> &Mutex<()> {
        &self.rebuild
    }
}

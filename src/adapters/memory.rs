//! In-memory adapter for the `SnapshotStore` port.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::ports::snapshot_store::{SnapshotStore, StoreFuture};

/// Snapshot store that keeps everything in process memory.
///
/// The cached copy and the "remote" copy are tracked separately so that
/// hydration can be exercised without any I/O. Every successful persist
/// updates both.
pub struct MemoryStore<T> {
    state: Mutex<MemoryState<T>>,
}

struct MemoryState<T> {
    cache: Option<T>,
    remote: Option<T>,
    persist_count: usize,
    failing: bool,
}

impl<T: Clone> MemoryStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { state: Mutex::new(MemoryState { cache: None, remote: None, persist_count: 0, failing: false }) }
    }

    /// Seeds the copy returned by `cached`.
    #[must_use]
    pub fn with_cache(self, value: T) -> Self {
        self.state().cache = Some(value);
        self
    }

    /// Seeds the copy returned by `hydrate`.
    #[must_use]
    pub fn with_remote(self, value: T) -> Self {
        self.state().remote = Some(value);
        self
    }

    /// Makes every subsequent persist fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    /// The most recently persisted value.
    #[must_use]
    pub fn persisted(&self) -> Option<T> {
        self.state().remote.clone()
    }

    /// Number of successful persists so far.
    #[must_use]
    pub fn persist_count(&self) -> usize {
        self.state().persist_count
    }

    fn state(&self) -> MutexGuard<'_, MemoryState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> SnapshotStore<T> for MemoryStore<T> {
    fn cached(&self) -> Option<T> {
        self.state().cache.clone()
    }

    fn hydrate(&self) -> StoreFuture<'_, Option<T>> {
        let remote = self.state().remote.clone();
        Box::pin(std::future::ready(Ok(remote)))
    }

    fn persist(&self, value: &T) -> StoreFuture<'_, ()> {
        let mut state = self.state();
        let result = if state.failing {
            Err(StoreError::Status { status: 503, body: "memory store set to fail".into() })
        } else {
            state.cache = Some(value.clone());
            state.remote = Some(value.clone());
            state.persist_count += 1;
            Ok(())
        };
        Box::pin(std::future::ready(result))
    }
}

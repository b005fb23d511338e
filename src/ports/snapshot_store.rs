//! Snapshot store port for loading and saving persisted documents.

use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;

/// Boxed future type alias used by [`SnapshotStore`] to keep the trait dyn-compatible.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Loads and saves one persisted document of type `T`.
///
/// The filesystem snapshot and the recycle-bin side-table each get their own
/// store. Abstracting the backend lets the engine run against a local JSON
/// file, the game's REST API, or memory in tests.
pub trait SnapshotStore<T>: Send + Sync {
    /// Returns the last known copy without any network access.
    fn cached(&self) -> Option<T>;

    /// Fetches the authoritative copy, or `None` if the store holds nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or returns garbage.
    fn hydrate(&self) -> StoreFuture<'_, Option<T>>;

    /// Saves `value` as the new authoritative copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected or the backend is unreachable.
    fn persist(&self, value: &T) -> StoreFuture<'_, ()>;
}

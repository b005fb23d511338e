//! Stateful filesystem handle shared by the terminal, file manager and
//! recycle bin.

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::node::{FileNode, Node};
use super::snapshot::Snapshot;
use crate::error::{FsError, StoreError};
use crate::ports::SnapshotStore;
use crate::scheduler::Debouncer;

/// Default quiet period before a burst of edits is persisted.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// What a successful hydration does when local edits already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HydrationPolicy {
    /// The fetched snapshot always wins.
    #[default]
    Replace,
    /// The fetched snapshot is dropped if anything was edited locally.
    KeepLocalEdits,
}

impl FromStr for HydrationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "keep-local" => Ok(Self::KeepLocalEdits),
            other => Err(format!("unknown hydration policy {other:?} (expected replace or keep-local)")),
        }
    }
}

/// Construction options for [`FileSystemEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Debounce window for persisting edits.
    pub debounce: Duration,
    /// Conflict rule for late hydration.
    pub hydration: HydrationPolicy,
    /// Home directory name used when bootstrapping a fresh tree.
    pub user: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { debounce: DEFAULT_DEBOUNCE, hydration: HydrationPolicy::default(), user: "guest".into() }
    }
}

/// Cheaply clonable handle to one in-memory filesystem.
///
/// Every mutation runs to completion under a short lock and then schedules
/// a debounced persist of the whole snapshot. Persist failures are logged
/// and otherwise ignored; the in-memory snapshot stays authoritative for
/// the session.
#[derive(Clone)]
pub struct FileSystemEngine {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<EngineState>,
    store: Arc<dyn SnapshotStore<Snapshot>>,
    persist: Debouncer,
    persist_lock: tokio::sync::Mutex<()>,
    hydration: HydrationPolicy,
}

struct EngineState {
    snapshot: Snapshot,
    revision: u64,
    dirty: bool,
}

impl FileSystemEngine {
    /// Builds the engine from the store's cached snapshot, or from the
    /// bootstrap tree if there is no usable cache.
    pub fn new(store: Arc<dyn SnapshotStore<Snapshot>>, options: &EngineOptions) -> Self {
        let snapshot = match store.cached() {
            Some(cached) if cached.is_hydratable() => {
                debug!(nodes = cached.len(), "starting from cached snapshot");
                cached
            }
            Some(_) => {
                warn!("cached snapshot has no root directory; starting from the bootstrap tree");
                Snapshot::bootstrap(&options.user)
            }
            None => {
                debug!(user = %options.user, "no cached snapshot; starting from the bootstrap tree");
                Snapshot::bootstrap(&options.user)
            }
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(EngineState { snapshot, revision: 0, dirty: false }),
                store,
                persist: Debouncer::new(options.debounce),
                persist_lock: tokio::sync::Mutex::new(()),
                hydration: options.hydration,
            }),
        }
    }

    /// Children of a directory in listing order.
    ///
    /// Missing paths and files list as empty.
    #[must_use]
    pub fn list(&self, path: &str) -> Vec<Node> {
        self.inner.state().snapshot.list(path).into_iter().cloned().collect()
    }

    /// The file at `path`, or `None` for directories and missing paths.
    #[must_use]
    pub fn read(&self, path: &str) -> Option<FileNode> {
        self.inner.state().snapshot.read(path).cloned()
    }

    /// Any node at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Node> {
        self.inner.state().snapshot.get(path).cloned()
    }

    /// Returns `true` if a node exists at `path`.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.inner.state().snapshot.exists(path)
    }

    /// Replaces a file's content.
    ///
    /// # Errors
    ///
    /// [`FsError::NotAFile`] if `path` is missing or a directory.
    pub fn write(&self, path: &str, content: &str) -> Result<(), FsError> {
        self.mutate(|s| s.write(path, content), |_| true)
    }

    /// Creates a directory; a no-op if `path` already exists.
    ///
    /// # Errors
    ///
    /// [`FsError::ParentNotDirectory`] or [`FsError::NestingLimitExceeded`].
    pub fn mkdir(&self, path: &str) -> Result<bool, FsError> {
        self.mutate(|s| s.mkdir(path), |created| *created)
    }

    /// Creates an empty file; a no-op if `path` already exists.
    ///
    /// # Errors
    ///
    /// [`FsError::ParentNotDirectory`].
    pub fn touch(&self, path: &str) -> Result<bool, FsError> {
        self.mutate(|s| s.touch(path), |created| *created)
    }

    /// Removes a node and everything beneath it; a no-op if missing.
    ///
    /// # Errors
    ///
    /// [`FsError::RootImmutable`] for `/`.
    pub fn remove(&self, path: &str) -> Result<bool, FsError> {
        self.mutate(|s| s.remove(path), |removed| *removed)
    }

    /// Moves or renames a node and its whole subtree.
    ///
    /// # Errors
    ///
    /// See [`Snapshot::move_node`].
    pub fn move_node(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.mutate(|s| s.move_node(from, to), |_| true)
    }

    /// Creates every missing ancestor directory of `path`.
    ///
    /// # Errors
    ///
    /// See [`Snapshot::ensure_path`].
    pub fn ensure_path(&self, path: &str) -> Result<Vec<String>, FsError> {
        self.mutate(|s| s.ensure_path(path), |created| !created.is_empty())
    }

    /// Counts files named `*<ext>`, optionally only within `base`.
    #[must_use]
    pub fn count_files_by_ext(&self, ext: &str, base: Option<&str>) -> usize {
        self.inner.state().snapshot.count_files_by_ext(ext, base)
    }

    /// Renders the directory at `path` as a tree.
    #[must_use]
    pub fn tree(&self, path: &str) -> Option<String> {
        self.inner.state().snapshot.tree(path)
    }

    /// A copy of the whole snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.state().snapshot.clone()
    }

    /// Number of mutations applied since construction.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.state().revision
    }

    /// Returns `true` while a debounced persist is waiting or running.
    #[must_use]
    pub fn has_pending_persist(&self) -> bool {
        self.inner.persist.is_pending()
    }

    /// Fetches the authoritative snapshot and, if it has a root, swaps it in.
    ///
    /// Returns `true` when the live snapshot was replaced. Store failures
    /// are logged and leave the current state untouched.
    pub async fn hydrate(&self) -> bool {
        let fetched = match self.inner.store.hydrate().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("store has no snapshot to hydrate from");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "snapshot hydration failed; continuing with local state");
                return false;
            }
        };
        self.apply_hydration(fetched)
    }

    /// Runs [`FileSystemEngine::hydrate`] in the background.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use = "the handle reports whether the snapshot was replaced"]
    pub fn spawn_hydration(&self) -> JoinHandle<bool> {
        let engine = self.clone();
        tokio::spawn(async move { engine.hydrate().await })
    }

    /// Cancels any pending debounce and persists right away.
    ///
    /// A debounced persist already in flight finishes first, so the store
    /// ends up with the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns the store error, unlike the debounced path.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.inner.persist.cancel();
        self.inner.save().await
    }

    fn apply_hydration(&self, fetched: Snapshot) -> bool {
        if !fetched.is_hydratable() {
            warn!("hydrated snapshot has no root directory; ignoring it");
            return false;
        }
        let mut state = self.inner.state();
        if state.dirty {
            if self.inner.hydration == HydrationPolicy::KeepLocalEdits {
                info!(revision = state.revision, "keeping local edits over hydrated snapshot");
                return false;
            }
            warn!(revision = state.revision, "hydrated snapshot replaces local edits");
        }
        info!(nodes = fetched.len(), "hydrated snapshot");
        state.snapshot = fetched;
        state.dirty = false;
        true
    }

    fn mutate<R>(
        &self,
        op: impl FnOnce(&mut Snapshot) -> Result<R, FsError>,
        changed: impl FnOnce(&R) -> bool,
    ) -> Result<R, FsError> {
        let result = {
            let mut state = self.inner.state();
            let result = op(&mut state.snapshot)?;
            if !changed(&result) {
                return Ok(result);
            }
            state.revision += 1;
            state.dirty = true;
            result
        };
        self.schedule_persist();
        Ok(result)
    }

    fn schedule_persist(&self) {
        let inner = Arc::clone(&self.inner);
        self.inner.persist.schedule(async move { inner.persist_now().await });
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn persist_now(&self) {
        match self.save().await {
            Ok(()) => debug!("persisted snapshot"),
            Err(e) => warn!(error = %e, "snapshot persist failed; next edit will retry"),
        }
    }

    // The snapshot is cloned under the lock so saves land in order.
    async fn save(&self) -> Result<(), StoreError> {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.state().snapshot.clone();
        self.store.persist(&snapshot).await
    }
}

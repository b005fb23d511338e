//! Recycle bin: soft delete, restore and purge on top of the engine.
//!
//! Deleting moves a node into `/.recycle` under a unique name and records
//! where it came from in a side-table. The side-table is persisted through
//! its own [`SnapshotStore`], independently of the filesystem snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{FsError, RecycleError, StoreError};
use crate::ports::{Clock, IdGenerator, SnapshotStore};
use crate::scheduler::Debouncer;
use crate::vfs::path::{self, ROOT};
use crate::vfs::FileSystemEngine;

/// Reserved directory holding recycled nodes.
pub const RECYCLE_DIR: &str = "/.recycle";

/// One soft-deleted node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecycleEntry {
    /// Where the node currently lives, inside [`RECYCLE_DIR`].
    pub recycle_path: String,
    /// Where the node was deleted from.
    pub original_path: String,
    /// Name the node had before deletion.
    pub name: String,
    /// When it was deleted.
    pub deleted_at: DateTime<Utc>,
}

/// Collaborators for a [`RecycleBin`].
pub struct RecycleDeps {
    /// Persists the side-table.
    pub store: Arc<dyn SnapshotStore<Vec<RecycleEntry>>>,
    /// Stamps deletions.
    pub clock: Box<dyn Clock>,
    /// Names recycled nodes.
    pub ids: Box<dyn IdGenerator>,
    /// Debounce window for side-table persists.
    pub debounce: Duration,
}

/// Clonable handle to the recycle bin of one filesystem.
#[derive(Clone)]
pub struct RecycleBin {
    inner: Arc<BinInner>,
}

struct BinInner {
    fs: FileSystemEngine,
    entries: Mutex<Vec<RecycleEntry>>,
    store: Arc<dyn SnapshotStore<Vec<RecycleEntry>>>,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    persist: Debouncer,
    persist_lock: tokio::sync::Mutex<()>,
    revision: AtomicU64,
}

impl RecycleBin {
    /// Opens the bin, seeding the side-table from the store's cache.
    pub fn new(fs: FileSystemEngine, deps: RecycleDeps) -> Self {
        let entries = deps.store.cached().unwrap_or_default();
        debug!(entries = entries.len(), "opened recycle bin");
        Self {
            inner: Arc::new(BinInner {
                fs,
                entries: Mutex::new(entries),
                store: deps.store,
                clock: deps.clock,
                ids: deps.ids,
                persist: Debouncer::new(deps.debounce),
                persist_lock: tokio::sync::Mutex::new(()),
                revision: AtomicU64::new(0),
            }),
        }
    }

    /// Current side-table, oldest deletion first.
    #[must_use]
    pub fn entries(&self) -> Vec<RecycleEntry> {
        self.inner.entries().clone()
    }

    /// Moves `path` into the bin.
    ///
    /// # Errors
    ///
    /// [`RecycleError::Protected`] for the root and anything already in the
    /// bin; [`RecycleError::Fs`] if the path does not exist.
    pub fn delete(&self, path: &str) -> Result<RecycleEntry, RecycleError> {
        let original_path = path::normalize(path);
        if original_path == ROOT || path::is_within(&original_path, RECYCLE_DIR) {
            return Err(RecycleError::Protected { path: original_path });
        }
        let fs = &self.inner.fs;
        if !fs.exists(&original_path) {
            return Err(FsError::SourceNotFound { path: original_path }.into());
        }
        fs.mkdir(RECYCLE_DIR)?;

        let name = path::name_of(&original_path).to_string();
        let recycle_path = path::join(RECYCLE_DIR, &format!("{}-{name}", self.inner.ids.generate_id()));
        fs.move_node(&original_path, &recycle_path)?;

        let entry = RecycleEntry { recycle_path, original_path, name, deleted_at: self.inner.clock.now() };
        self.inner.entries().push(entry.clone());
        self.changed();
        Ok(entry)
    }

    /// Moves a recycled node back to where it came from.
    ///
    /// Missing ancestors of the original location are recreated. When
    /// something already occupies it, the restore is refused unless
    /// `overwrite` is set, in which case the occupant is removed first.
    ///
    /// # Errors
    ///
    /// [`RecycleError::UnknownEntry`], [`RecycleError::MissingNode`],
    /// [`RecycleError::Protected`], [`RecycleError::RestoreConflict`] or
    /// [`RecycleError::Fs`]. Nothing is changed on error.
    pub fn restore(&self, recycle_path: &str, overwrite: bool) -> Result<RecycleEntry, RecycleError> {
        let entry = self.find(recycle_path)?;
        let fs = &self.inner.fs;
        if !fs.exists(&entry.recycle_path) {
            return Err(RecycleError::MissingNode { recycle_path: entry.recycle_path });
        }
        if entry.original_path == ROOT || path::is_within(&entry.original_path, RECYCLE_DIR) {
            return Err(RecycleError::Protected { path: entry.original_path });
        }
        if fs.exists(&entry.original_path) && !overwrite {
            return Err(RecycleError::RestoreConflict { original_path: entry.original_path });
        }
        fs.ensure_path(&entry.original_path)?;
        fs.remove(&entry.original_path)?;
        fs.move_node(&entry.recycle_path, &entry.original_path)?;

        self.forget(&entry.recycle_path);
        Ok(entry)
    }

    /// Deletes a recycled node for good.
    ///
    /// # Errors
    ///
    /// [`RecycleError::UnknownEntry`] or [`RecycleError::Fs`].
    pub fn purge(&self, recycle_path: &str) -> Result<RecycleEntry, RecycleError> {
        let entry = self.find(recycle_path)?;
        self.inner.fs.remove(&entry.recycle_path)?;
        self.forget(&entry.recycle_path);
        Ok(entry)
    }

    /// Purges every entry. Returns how many were purged.
    ///
    /// # Errors
    ///
    /// Stops at the first failing purge.
    pub fn empty(&self) -> Result<usize, RecycleError> {
        let entries = self.entries();
        for entry in &entries {
            self.purge(&entry.recycle_path)?;
        }
        Ok(entries.len())
    }

    /// Replaces the side-table with the store's authoritative copy.
    ///
    /// Returns the number of entries afterwards.
    ///
    /// # Errors
    ///
    /// Returns the store error; the current side-table is kept.
    pub async fn refresh(&self) -> Result<usize, StoreError> {
        let Some(entries) = self.inner.store.hydrate().await? else {
            return Ok(self.inner.entries().len());
        };
        let count = entries.len();
        *self.inner.entries() = entries;
        Ok(count)
    }

    /// Refreshes the side-table every `interval` until the handle is aborted.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn_polling(&self, interval: Duration) -> JoinHandle<()> {
        let bin = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = bin.refresh().await {
                    warn!(error = %e, "recycle bin refresh failed");
                }
            }
        })
    }

    /// Cancels any pending debounce and persists the side-table now.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.inner.persist.cancel();
        self.inner.persist_now().await
    }

    /// Number of local changes to the side-table since the bin was opened.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::SeqCst)
    }

    fn find(&self, recycle_path: &str) -> Result<RecycleEntry, RecycleError> {
        let recycle_path = path::normalize(recycle_path);
        self.inner
            .entries()
            .iter()
            .find(|e| e.recycle_path == recycle_path)
            .cloned()
            .ok_or(RecycleError::UnknownEntry { recycle_path })
    }

    fn forget(&self, recycle_path: &str) {
        self.inner.entries().retain(|e| e.recycle_path != recycle_path);
        self.changed();
    }

    fn changed(&self) {
        self.inner.revision.fetch_add(1, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        self.inner.persist.schedule(async move {
            if let Err(e) = inner.persist_now().await {
                warn!(error = %e, "recycle bin persist failed; next change will retry");
            }
        });
    }
}

impl BinInner {
    fn entries(&self) -> MutexGuard<'_, Vec<RecycleEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Entries are read under the lock so saves land in order.
    async fn persist_now(&self) -> Result<(), StoreError> {
        let _guard = self.persist_lock.lock().await;
        let entries = self.entries().clone();
        self.store.persist(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FixedClock, MemoryStore, SequentialIds};
    use crate::ports::SnapshotStore;
    use crate::vfs::{EngineOptions, Snapshot};
    use chrono::TimeZone;

    struct Fixture {
        fs: FileSystemEngine,
        bin: RecycleBin,
        side_table: Arc<MemoryStore<Vec<RecycleEntry>>>,
    }

    fn fixture() -> Fixture {
        let fs_store: Arc<dyn SnapshotStore<Snapshot>> = Arc::new(MemoryStore::new());
        let fs = FileSystemEngine::new(fs_store, &EngineOptions::default());
        fs.mkdir("/home/guest/docs").unwrap();
        fs.touch("/home/guest/docs/plan.txt").unwrap();
        fs.write("/home/guest/docs/plan.txt", "take over the mainframe").unwrap();

        let side_table = Arc::new(MemoryStore::new());
        let bin = RecycleBin::new(
            fs.clone(),
            RecycleDeps {
                store: Arc::clone(&side_table) as Arc<dyn SnapshotStore<Vec<RecycleEntry>>>,
                clock: Box::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())),
                ids: Box::new(SequentialIds::new("r")),
                debounce: Duration::from_millis(100),
            },
        );
        Fixture { fs, bin, side_table }
    }

    #[test]
    fn delete_moves_into_recycle_dir() {
        let Fixture { fs, bin, .. } = fixture();

        let entry = bin.delete("/home/guest/docs/plan.txt").unwrap();

        assert_eq!(entry.recycle_path, "/.recycle/r-0-plan.txt");
        assert_eq!(entry.original_path, "/home/guest/docs/plan.txt");
        assert_eq!(entry.name, "plan.txt");
        assert!(!fs.exists("/home/guest/docs/plan.txt"));
        assert_eq!(fs.read("/.recycle/r-0-plan.txt").unwrap().content, "take over the mainframe");
        assert_eq!(bin.entries(), vec![entry]);
    }

    #[test]
    fn delete_refuses_protected_paths() {
        let Fixture { bin, .. } = fixture();
        bin.delete("/home/guest/docs/plan.txt").unwrap();

        assert!(matches!(bin.delete("/"), Err(RecycleError::Protected { .. })));
        assert!(matches!(bin.delete("/.recycle"), Err(RecycleError::Protected { .. })));
        assert!(matches!(bin.delete("/.recycle/r-0-plan.txt"), Err(RecycleError::Protected { .. })));
        assert!(matches!(bin.delete("/ghost"), Err(RecycleError::Fs(FsError::SourceNotFound { .. }))));
    }

    #[test]
    fn restore_recreates_missing_ancestors() {
        let Fixture { fs, bin, .. } = fixture();
        let entry = bin.delete("/home/guest/docs/plan.txt").unwrap();
        fs.remove("/home/guest/docs").unwrap();

        bin.restore(&entry.recycle_path, false).unwrap();

        assert_eq!(fs.read("/home/guest/docs/plan.txt").unwrap().content, "take over the mainframe");
        assert!(!fs.exists(&entry.recycle_path));
        assert!(bin.entries().is_empty());
        fs.snapshot().check_invariants().unwrap();
    }

    #[test]
    fn restore_conflict_requires_overwrite() {
        let Fixture { fs, bin, .. } = fixture();
        let entry = bin.delete("/home/guest/docs/plan.txt").unwrap();
        fs.touch("/home/guest/docs/plan.txt").unwrap();
        fs.write("/home/guest/docs/plan.txt", "decoy").unwrap();

        assert_eq!(
            bin.restore(&entry.recycle_path, false),
            Err(RecycleError::RestoreConflict { original_path: "/home/guest/docs/plan.txt".into() })
        );
        assert_eq!(bin.entries().len(), 1);

        bin.restore(&entry.recycle_path, true).unwrap();
        assert_eq!(fs.read("/home/guest/docs/plan.txt").unwrap().content, "take over the mainframe");
    }

    #[test]
    fn restore_of_vanished_node_leaves_occupant_alone() {
        let Fixture { fs, bin, .. } = fixture();
        fs.touch("/tmp/a.txt").unwrap();
        let entry = bin.delete("/tmp/a.txt").unwrap();
        fs.remove(&entry.recycle_path).unwrap();
        fs.touch("/tmp/a.txt").unwrap();
        fs.write("/tmp/a.txt", "precious").unwrap();
        let before = fs.snapshot();

        assert_eq!(
            bin.restore(&entry.recycle_path, true),
            Err(RecycleError::MissingNode { recycle_path: entry.recycle_path.clone() })
        );
        assert_eq!(fs.snapshot(), before);
        assert_eq!(bin.entries().len(), 1);
    }

    #[test]
    fn failed_restore_creates_no_ancestors() {
        let Fixture { fs, bin, .. } = fixture();
        let entry = bin.delete("/home/guest/docs").unwrap();
        fs.remove(&entry.recycle_path).unwrap();
        fs.remove("/home/guest").unwrap();

        assert!(matches!(bin.restore(&entry.recycle_path, false), Err(RecycleError::MissingNode { .. })));
        assert!(!fs.exists("/home/guest"));
    }

    #[test]
    fn purge_drops_entry_whose_node_is_gone() {
        let Fixture { fs, bin, .. } = fixture();
        let entry = bin.delete("/home/guest/docs/plan.txt").unwrap();
        fs.remove(&entry.recycle_path).unwrap();
        let revision = bin.revision();

        bin.purge(&entry.recycle_path).unwrap();

        assert!(bin.entries().is_empty());
        assert!(bin.revision() > revision);
    }

    #[tokio::test]
    async fn restore_refuses_entries_pointing_into_the_bin() {
        let Fixture { fs, bin, side_table } = fixture();
        let entry = bin.delete("/home/guest/docs/plan.txt").unwrap();
        let forged = RecycleEntry { original_path: RECYCLE_DIR.into(), ..entry.clone() };
        side_table.persist(&vec![forged]).await.unwrap();
        bin.refresh().await.unwrap();

        assert!(matches!(bin.restore(&entry.recycle_path, true), Err(RecycleError::Protected { .. })));
        assert!(fs.exists(&entry.recycle_path));
    }

    #[tokio::test]
    async fn refresh_is_not_a_local_change() {
        let Fixture { bin, side_table, .. } = fixture();
        side_table.persist(&Vec::new()).await.unwrap();
        bin.refresh().await.unwrap();
        assert_eq!(bin.revision(), 0);
    }

    #[test]
    fn restore_whole_directory() {
        let Fixture { fs, bin, .. } = fixture();
        let entry = bin.delete("/home/guest/docs").unwrap();
        assert!(fs.exists("/.recycle/r-0-docs/plan.txt"));

        bin.restore(&entry.recycle_path, false).unwrap();
        assert_eq!(fs.get("/home/guest/docs/plan.txt").unwrap().parent(), Some("/home/guest/docs"));
    }

    #[test]
    fn purge_and_empty() {
        let Fixture { fs, bin, .. } = fixture();
        fs.touch("/tmp/a").unwrap();
        fs.touch("/tmp/b").unwrap();
        let a = bin.delete("/tmp/a").unwrap();
        bin.delete("/tmp/b").unwrap();
        bin.delete("/home/guest/docs").unwrap();

        bin.purge(&a.recycle_path).unwrap();
        assert!(!fs.exists(&a.recycle_path));
        assert!(matches!(bin.purge(&a.recycle_path), Err(RecycleError::UnknownEntry { .. })));

        assert_eq!(bin.empty().unwrap(), 2);
        assert!(bin.entries().is_empty());
        assert!(fs.list(RECYCLE_DIR).is_empty());
    }

    #[tokio::test]
    async fn side_table_round_trips_through_store() {
        let Fixture { bin, side_table, .. } = fixture();
        let entry = bin.delete("/home/guest/docs/plan.txt").unwrap();
        bin.flush().await.unwrap();

        let saved = side_table.persisted().unwrap();
        assert_eq!(saved, vec![entry]);
        let json = serde_json::to_value(&saved).unwrap();
        assert_eq!(json[0]["recyclePath"], "/.recycle/r-0-plan.txt");
        assert_eq!(json[0]["deletedAt"], "2024-05-01T12:00:00Z");
    }

    #[tokio::test]
    async fn refresh_adopts_remote_side_table() {
        let Fixture { bin, side_table, .. } = fixture();
        let remote = vec![RecycleEntry {
            recycle_path: "/.recycle/x-old.txt".into(),
            original_path: "/tmp/old.txt".into(),
            name: "old.txt".into(),
            deleted_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }];
        side_table.persist(&remote).await.unwrap();

        assert_eq!(bin.refresh().await.unwrap(), 1);
        assert_eq!(bin.entries(), remote);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_picks_up_remote_changes() {
        let Fixture { bin, side_table, .. } = fixture();
        let poller = bin.spawn_polling(Duration::from_secs(5));

        bin.delete("/home/guest/docs/plan.txt").unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(side_table.persisted().unwrap().len(), 1);

        // Another session empties the bin.
        side_table.persist(&Vec::new()).await.unwrap();
        assert_eq!(bin.entries().len(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(bin.entries().is_empty());
        poller.abort();
    }
}

//! Service context wiring the engine and recycle bin to concrete stores.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapters::{HttpStore, JsonFileStore, LiveClock, LiveIdGenerator, MemoryStore};
use crate::config::{Config, RECYCLE_ENDPOINT, SNAPSHOT_ENDPOINT};
use crate::ports::SnapshotStore;
use crate::recycle::{RecycleBin, RecycleDeps, RecycleEntry};
use crate::vfs::{FileSystemEngine, Snapshot};

/// Bundles the filesystem engine and the recycle bin that shares it.
///
/// Constructors pick the store adapters (remote API, local files, memory).
/// Both handles are cheap to clone and can be passed to any consumer.
pub struct ServiceContext {
    /// The virtual filesystem.
    pub fs: FileSystemEngine,
    /// Recycle bin over `fs`.
    pub bin: RecycleBin,
}

impl ServiceContext {
    /// Creates a context backed by the configured remote API, or by local
    /// JSON files when no remote is set.
    ///
    /// With a remote, the local files act as the offline cache.
    #[must_use]
    pub fn live(config: &Config) -> Self {
        let fs_cache = JsonFileStore::new(config.snapshot_file());
        let bin_cache = JsonFileStore::new(config.recycle_file());

        let remote = config.remote_endpoint(SNAPSHOT_ENDPOINT).zip(config.remote_endpoint(RECYCLE_ENDPOINT));
        let fs_store: Arc<dyn SnapshotStore<Snapshot>>;
        let bin_store: Arc<dyn SnapshotStore<Vec<RecycleEntry>>>;
        if let Some((fs_url, bin_url)) = remote {
            debug!(url = %fs_url, "using remote snapshot store");
            fs_store = Arc::new(HttpStore::new(fs_url, config.token.clone()).with_cache(fs_cache));
            bin_store = Arc::new(HttpStore::new(bin_url, config.token.clone()).with_cache(bin_cache));
        } else {
            debug!(dir = %config.data_dir.display(), "using local snapshot files");
            fs_store = Arc::new(fs_cache);
            bin_store = Arc::new(bin_cache);
        }
        Self::with_stores(config, fs_store, bin_store)
    }

    /// Creates a context that never touches disk or network.
    #[must_use]
    pub fn ephemeral(config: &Config) -> Self {
        Self::with_stores(config, Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Creates a context over explicit stores.
    #[must_use]
    pub fn with_stores(
        config: &Config,
        fs_store: Arc<dyn SnapshotStore<Snapshot>>,
        bin_store: Arc<dyn SnapshotStore<Vec<RecycleEntry>>>,
    ) -> Self {
        let fs = FileSystemEngine::new(fs_store, &config.engine_options());
        let bin = RecycleBin::new(
            fs.clone(),
            RecycleDeps {
                store: bin_store,
                clock: Box::new(LiveClock),
                ids: Box::new(LiveIdGenerator),
                debounce: config.debounce,
            },
        );
        Self { fs, bin }
    }

    /// Pulls the authoritative snapshot and side-table.
    ///
    /// Failures are logged; the context keeps working from its cache.
    pub async fn hydrate(&self) {
        self.fs.hydrate().await;
        if let Err(e) = self.bin.refresh().await {
            warn!(error = %e, "recycle bin refresh failed; using cached entries");
        }
    }

    /// Persists, right away, whichever of the snapshot and the side-table
    /// the session changed.
    ///
    /// # Errors
    ///
    /// Returns an error string if either store rejects the write.
    pub async fn flush(&self) -> Result<(), String> {
        if self.fs.revision() > 0 {
            self.fs.flush().await.map_err(|e| format!("Failed to save filesystem snapshot: {e}"))?;
        }
        if self.bin.revision() > 0 {
            self.bin.flush().await.map_err(|e| format!("Failed to save recycle bin: {e}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn live_context_round_trips_through_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config { data_dir: dir.path().to_path_buf(), ..Config::default() };

        let ctx = ServiceContext::live(&config);
        ctx.hydrate().await;
        ctx.fs.touch("/tmp/saved.txt").unwrap();
        ctx.bin.delete("/tmp/saved.txt").unwrap();
        ctx.flush().await.unwrap();

        let reopened = ServiceContext::live(&config);
        let entries = reopened.bin.entries();
        assert_eq!(entries.len(), 1);
        assert!(reopened.fs.exists(&entries[0].recycle_path));
    }

    #[tokio::test]
    async fn read_only_session_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config { data_dir: dir.path().to_path_buf(), ..Config::default() };

        let ctx = ServiceContext::live(&config);
        ctx.hydrate().await;
        let _ = ctx.fs.list("/");
        ctx.flush().await.unwrap();

        assert!(!config.snapshot_file().exists());
    }

    #[tokio::test]
    async fn purging_a_dangling_entry_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config { data_dir: dir.path().to_path_buf(), ..Config::default() };
        let dangling = vec![RecycleEntry {
            recycle_path: "/.recycle/gone-notes.txt".into(),
            original_path: "/tmp/notes.txt".into(),
            name: "notes.txt".into(),
            deleted_at: chrono::Utc::now(),
        }];
        JsonFileStore::new(config.recycle_file()).write(&dangling).await.unwrap();

        let ctx = ServiceContext::live(&config);
        ctx.hydrate().await;
        ctx.bin.purge("/.recycle/gone-notes.txt").unwrap();
        assert_eq!(ctx.fs.revision(), 0);
        ctx.flush().await.unwrap();

        let reopened = ServiceContext::live(&config);
        assert!(reopened.bin.entries().is_empty());
        assert!(!config.snapshot_file().exists());
    }

    #[tokio::test]
    async fn restore_after_hydration_dropped_the_node_keeps_occupant() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config { data_dir: dir.path().to_path_buf(), ..Config::default() };

        let ctx = ServiceContext::live(&config);
        ctx.fs.touch("/tmp/a.txt").unwrap();
        let entry = ctx.bin.delete("/tmp/a.txt").unwrap();
        ctx.flush().await.unwrap();

        // Another session saved a tree without the recycled node.
        let mut remote = Snapshot::bootstrap("guest");
        remote.touch("/tmp/a.txt").unwrap();
        remote.write("/tmp/a.txt", "precious").unwrap();
        JsonFileStore::new(config.snapshot_file()).write(&remote).await.unwrap();

        let ctx = ServiceContext::live(&config);
        ctx.hydrate().await;
        assert_eq!(ctx.bin.entries().len(), 1);

        assert!(ctx.bin.restore(&entry.recycle_path, true).is_err());
        assert_eq!(ctx.fs.read("/tmp/a.txt").unwrap().content, "precious");
    }

    #[tokio::test]
    async fn ephemeral_context_starts_fresh() {
        let config = Config { user: "trinity".into(), ..Config::default() };
        let ctx = ServiceContext::ephemeral(&config);
        assert!(ctx.fs.exists("/home/trinity"));
        assert!(ctx.bin.entries().is_empty());
    }
}

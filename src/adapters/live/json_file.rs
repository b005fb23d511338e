//! Live snapshot store backed by a JSON file on disk.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::ports::snapshot_store::{SnapshotStore, StoreFuture};

/// Stores one document as pretty-printed JSON at a fixed path.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _document: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    /// Creates a store for the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), _document: PhantomData }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Serialize> JsonFileStore<T> {
    /// Serializes `value` and writes it atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or any file operation fails.
    pub async fn write(&self, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;
        write_atomically(&self.path, json).await
    }
}

impl<T: DeserializeOwned> JsonFileStore<T> {
    /// Reads the file synchronously. Missing or unreadable files yield `None`.
    pub fn read_sync(&self) -> Option<T> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached document");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read cached document");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt cached document");
                None
            }
        }
    }
}

pub(crate) async fn write_atomically(path: &Path, contents: String) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

impl<T> SnapshotStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn cached(&self) -> Option<T> {
        self.read_sync()
    }

    fn hydrate(&self) -> StoreFuture<'_, Option<T>> {
        Box::pin(async move {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn persist(&self, value: &T) -> StoreFuture<'_, ()> {
        let encoded = serde_json::to_string_pretty(value);
        Box::pin(async move { write_atomically(&self.path, encoded?).await })
    }
}

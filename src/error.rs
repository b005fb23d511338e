//! Error kinds surfaced by the engine, the stores and the recycle bin.

use thiserror::Error;

/// Structural failures returned synchronously by filesystem operations.
///
/// A failed operation never leaves a partial edit behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    /// The parent of a path to create is missing or is a file.
    #[error("parent of {path} is not a directory")]
    ParentNotDirectory {
        /// Path that was to be created.
        path: String,
    },
    /// The target of a write is missing or is a directory.
    #[error("{path} is not a file")]
    NotAFile {
        /// Path that was written.
        path: String,
    },
    /// Directory creation would go deeper than `/home/<user>/<item>`.
    #[error("{path} exceeds the nesting limit of {limit} segments under /home")]
    NestingLimitExceeded {
        /// Path that was to be created.
        path: String,
        /// Maximum allowed segment count.
        limit: usize,
    },
    /// The source of a move does not exist.
    #[error("no such file or directory: {path}")]
    SourceNotFound {
        /// Source path.
        path: String,
    },
    /// The destination of a move is already taken.
    #[error("{path} already exists")]
    DestinationExists {
        /// Destination path.
        path: String,
    },
    /// The destination's parent is missing or is a file.
    #[error("destination parent of {path} is not a directory")]
    DestinationParentNotDirectory {
        /// Destination path.
        path: String,
    },
    /// A directory cannot be moved beneath itself.
    #[error("cannot move {from} into its own subtree at {to}")]
    DestinationInsideSource {
        /// Source path.
        from: String,
        /// Destination path.
        to: String,
    },
    /// The root directory cannot be removed or moved.
    #[error("the root directory cannot be removed or moved")]
    RootImmutable,
}

/// Failures talking to a snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Local file I/O failed.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The stored document could not be encoded or decoded.
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The HTTP request failed before a response was read.
    #[error("request to snapshot service failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The snapshot service answered with a non-success status.
    #[error("snapshot service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
}

/// Failures of recycle-bin operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecycleError {
    /// The underlying filesystem operation failed.
    #[error(transparent)]
    Fs(#[from] FsError),
    /// The path is the root, the recycle directory, or already recycled.
    #[error("{path} cannot be moved to the recycle bin")]
    Protected {
        /// Offending path.
        path: String,
    },
    /// No side-table entry matches the recycle path.
    #[error("no recycle entry for {recycle_path}")]
    UnknownEntry {
        /// Requested recycle path.
        recycle_path: String,
    },
    /// The entry is listed but its node is no longer in the recycle directory.
    #[error("{recycle_path} is no longer in the recycle bin; purge the entry instead")]
    MissingNode {
        /// Recycle path recorded in the entry.
        recycle_path: String,
    },
    /// Restoring would overwrite an existing node.
    #[error("{original_path} already exists; restore with overwrite to replace it")]
    RestoreConflict {
        /// Path the entry would be restored to.
        original_path: String,
    },
}

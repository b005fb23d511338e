//! In-memory virtual filesystem: paths, nodes, the snapshot tree and the
//! engine that persists it.

pub mod engine;
pub mod node;
pub mod path;
pub mod snapshot;

pub use engine::{EngineOptions, FileSystemEngine, HydrationPolicy, DEFAULT_DEBOUNCE};
pub use node::{DirectoryNode, FileNode, Node};
pub use snapshot::{InvariantViolation, Snapshot, HOME, MAX_HOME_DEPTH};

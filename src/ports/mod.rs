//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the filesystem core and an
//! external system (time, unique IDs, persisted snapshots).
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod id_gen;
pub mod snapshot_store;

pub use clock::Clock;
pub use id_gen::IdGenerator;
pub use snapshot_store::{SnapshotStore, StoreFuture};

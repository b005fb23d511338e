//! Port implementations.
//!
//! - `live`: real clock, UUIDs, JSON files and the REST API.
//! - `memory`: in-process snapshot store.
//! - `fixed`: deterministic clock and IDs.

pub mod fixed;
pub mod live;
pub mod memory;

pub use fixed::{FixedClock, SequentialIds};
pub use live::clock::LiveClock;
pub use live::http::HttpStore;
pub use live::id_gen::LiveIdGenerator;
pub use live::json_file::JsonFileStore;
pub use memory::MemoryStore;

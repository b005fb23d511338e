//! Live adapter for the `IdGenerator` port.

use uuid::Uuid;

use crate::ports::IdGenerator;

/// Produces short random identifiers for recycle-bin names.
///
/// The first group of a v4 UUID (8 hex characters) is plenty for a bin
/// holding a handful of entries and keeps recycle paths readable in the
/// terminal.
#[derive(Debug, Default)]
pub struct LiveIdGenerator;

impl IdGenerator for LiveIdGenerator {
    fn generate_id(&self) -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        id
    }
}

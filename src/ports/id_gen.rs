//! ID generator port for producing unique identifiers.

/// Generates unique identifiers.
///
/// Used to give every recycled node a collision-free name inside the
/// recycle directory.
pub trait IdGenerator: Send + Sync {
    /// Generates a new unique identifier string.
    fn generate_id(&self) -> String;
}

//! Entity trait: records that keep their identity while their fields change.

/// A record addressed by a stable identifier rather than by its position.
///
/// Stock items implement this so that edits and removals target the same row
/// even after other rows were inserted or deleted.
pub trait Entity {
    /// Strongly-typed identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the identifier.
    fn id(&self) -> Self::Id;
}

// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Replicated data types for the shared room state.

pub mod lww_map;
pub mod op;
pub mod primitives;

pub use lww_map::LwwMap;
pub use lww_map::LwwRegister;

/// A CRDT is a data type with a merge operator that is commutative,
/// associative, and idempotent.
pub trait Crdt {
    /// Merge another instance into this one.
    fn merge(&mut self, other: &Self);
}

// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Shared primitives for the replicated stores.
//!
//! ## Clocks
//! - `LamportClock`: simple monotonic counter
//! - `Stamp`: Lamport time plus replica, totally ordered

pub mod clock;

pub use clock::LamportClock;
pub use clock::Stamp;

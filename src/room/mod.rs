// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! A collaborative room: the replicated stores, per-user presence, local
//! history, and the session that ties them together.

pub mod history;
pub mod hub;
pub mod presence;
pub mod session;
pub mod storage;

pub use hub::Hub;
pub use presence::BrushData;
pub use presence::Cursor;
pub use presence::Presence;
pub use session::Session;
pub use storage::Change;
pub use storage::Storage;

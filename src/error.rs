// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Errors surfaced by the canvas model and the room replica.
//!
//! Most "not ready" conditions (no canvas yet, no selected layer) are
//! silent no-ops and never show up here.

/// Errors returned by fallible operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A pixel key was not three `_`-separated non-negative integers.
    MalformedKey(String),
    /// A color string was neither a hex color nor the transparent sentinel.
    InvalidColor(String),
    /// Canvas dimensions outside the configured bounds.
    InvalidCanvasSize { width: u32, height: u32 },
    /// A batch or presence update whose signature does not match its author.
    BadSignature,
    /// A batch addressed to a different room.
    WrongRoom,
    /// A snapshot or config document failed to (de)serialize.
    Snapshot(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return match self {
            Error::MalformedKey(key) => write!(f, "malformed pixel key {:?}", key),
            Error::InvalidColor(color) => write!(f, "invalid color {:?}", color),
            Error::InvalidCanvasSize { width, height } => {
                write!(f, "invalid canvas size {}x{}", width, height)
            }
            Error::BadSignature => write!(f, "signature does not match author"),
            Error::WrongRoom => write!(f, "batch belongs to another room"),
            Error::Snapshot(message) => write!(f, "snapshot error: {}", message),
        };
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        return Error::Snapshot(error.to_string());
    }
}

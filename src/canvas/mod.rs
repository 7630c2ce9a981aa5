// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! The pixel-art model: addressing, colors, layers, and the pure
//! algorithms that read and produce pixel writes.
//!
//! Nothing in here knows about replication. Every function takes
//! snapshots and returns values.

pub mod color;
pub mod compositor;
pub mod layer;
pub mod pixel_key;
pub mod recent;
pub mod tool;
pub mod transform;

pub use color::PixelColor;
pub use compositor::FormattedLayer;
pub use compositor::Grid;
pub use compositor::format_layers;
pub use layer::BlendMode;
pub use layer::Layer;
pub use layer::LayerId;
pub use pixel_key::PixelKey;
pub use tool::Tool;
pub use transform::Direction;

/// The name and size a canvas was created with.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanvasInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

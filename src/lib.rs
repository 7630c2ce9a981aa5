// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Pixelroom - the shared state model of a collaborative pixel-art editor.
//!
//! Pixels live in a flat replicated map from `"{layer}_{row}_{col}"` to a
//! color, layers in a second map from id to metadata. Tools turn pointer
//! gestures into atomic batches of key writes; every replica rebuilds its
//! renderable grids from the flat maps after each change.
//!
//! # Quick Start
//!
//! ```
//! use pixelroom::canvas::PixelColor;
//! use pixelroom::config::Config;
//! use pixelroom::room::Hub;
//!
//! let mut hub = Hub::new("gallery", Config::default());
//! let ada = hub.join("ada");
//! let bob = hub.join("bob");
//!
//! let red: PixelColor = "#ff0000".parse().unwrap();
//! let session = hub.get_mut(&ada).unwrap();
//! session.create_canvas("sketch", 8, 8).unwrap();
//! session.apply_pixel_edit(2, 3, red);
//! hub.flush();
//!
//! let layers = hub.get(&bob).unwrap().layers();
//! assert_eq!(layers[0].grid.get(2, 3), Some(&red));
//! ```

pub mod canvas;
pub mod config;
pub mod crdt;
pub mod error;
pub mod key;
pub mod logging;
pub mod room;

pub use error::Error;

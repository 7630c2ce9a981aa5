// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Room configuration.
//!
//! Every field has a default, so a config document only needs to name
//! what it overrides:
//!
//! ```
//! use pixelroom::config::Config;
//!
//! let config = Config::from_json(r#"{ "max_pixels": 100 }"#).unwrap();
//! assert_eq!(config.max_pixels, 100);
//! assert_eq!(config.recent_colors, 16);
//! ```

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;

/// Environment variable overriding `max_pixels`.
pub const ENV_MAX_PIXELS: &str = "PIXELROOM_MAX_PIXELS";

/// Limits and capacities for one room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Soft ceiling on `layers * rows * cols`, checked before adding a layer.
    pub max_pixels: usize,
    /// Capacity of the recent-colors list.
    pub recent_colors: usize,
    /// Smallest accepted canvas width or height.
    pub min_canvas_size: u32,
    /// Largest accepted canvas width or height.
    pub max_canvas_size: u32,
    /// Most undo steps kept per replica.
    pub undo_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        return Config {
            max_pixels: 2600,
            recent_colors: 16,
            min_canvas_size: 2,
            max_canvas_size: 48,
            undo_limit: 100,
        };
    }
}

impl Config {
    /// Parse a JSON config document, filling missing fields with defaults.
    pub fn from_json(source: &str) -> Result<Config, Error> {
        let config: Config = serde_json::from_str(source)?;
        return Ok(config);
    }

    /// Defaults, with `max_pixels` taken from the environment when set.
    pub fn from_env() -> Config {
        let mut config = Config::default();
        if let Ok(raw) = std::env::var(ENV_MAX_PIXELS) {
            match raw.trim().parse::<usize>() {
                Ok(value) => config.max_pixels = value,
                Err(_) => log::warn!("ignoring {}={:?}: not a number", ENV_MAX_PIXELS, raw),
            }
        }
        return config;
    }

    /// True when `width` and `height` are both within the canvas bounds.
    pub fn canvas_size_ok(&self, width: u32, height: u32) -> bool {
        let range = self.min_canvas_size..=self.max_canvas_size;
        return range.contains(&width) && range.contains(&height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.max_pixels, 2600);
        assert_eq!(config.recent_colors, 16);
        assert_eq!(config.undo_limit, 100);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "max_canvas_size": 32 }"#).unwrap();
        assert_eq!(config.max_canvas_size, 32);
        assert_eq!(config.min_canvas_size, 2);
        assert_eq!(config.max_pixels, 2600);
    }

    #[test]
    fn bad_json_is_snapshot_error() {
        let result = Config::from_json("{ max_pixels: }");
        assert!(matches!(result, Err(Error::Snapshot(_))));
    }

    #[test]
    fn canvas_size_bounds() {
        let config = Config::default();
        assert!(config.canvas_size_ok(2, 48));
        assert!(!config.canvas_size_ok(1, 10));
        assert!(!config.canvas_size_ok(10, 49));
    }
}

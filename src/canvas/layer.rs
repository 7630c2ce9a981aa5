// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Layer metadata.
//!
//! A layer's pixels live in the pixel store; the layer store only holds
//! what the compositor needs to stack them. The rendered grid is never
//! stored here, see `compositor::FormattedLayer`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Layer identifier. The first layer of a canvas is 0.
pub type LayerId = u32;

/// How a layer is composited onto the layers below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// Every mode, in menu order.
    pub fn all() -> &'static [BlendMode] {
        return &[
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::Darken,
            BlendMode::Lighten,
            BlendMode::ColorDodge,
            BlendMode::ColorBurn,
            BlendMode::HardLight,
            BlendMode::SoftLight,
            BlendMode::Difference,
            BlendMode::Exclusion,
            BlendMode::Hue,
            BlendMode::Saturation,
            BlendMode::Color,
            BlendMode::Luminosity,
        ];
    }

    /// The compositing-mode name, as stored.
    pub fn name(&self) -> &'static str {
        return match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color-dodge",
            BlendMode::ColorBurn => "color-burn",
            BlendMode::HardLight => "hard-light",
            BlendMode::SoftLight => "soft-light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Hue => "hue",
            BlendMode::Saturation => "saturation",
            BlendMode::Color => "color",
            BlendMode::Luminosity => "luminosity",
        };
    }

    /// Look a mode up by its stored name.
    pub fn from_name(name: &str) -> Option<BlendMode> {
        return BlendMode::all().iter().copied().find(|mode| mode.name() == name);
    }
}

/// Stored metadata for one layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    /// In `[0, 1]`.
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub hidden: bool,
}

impl Layer {
    /// A fresh, fully opaque, visible layer.
    pub fn new(id: LayerId) -> Layer {
        return Layer {
            id,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            hidden: false,
        };
    }

    /// Copy with a new opacity, clamped to `[0, 1]`.
    pub fn with_opacity(self, opacity: f32) -> Layer {
        let opacity = if opacity.is_nan() { self.opacity } else { opacity.clamp(0.0, 1.0) };
        return Layer { opacity, ..self };
    }
}

/// The id a new layer gets: one past the highest existing id, or 0.
pub fn next_layer_id(layers: &BTreeMap<LayerId, Layer>) -> LayerId {
    return match layers.keys().next_back() {
        Some(max) => max + 1,
        None => 0,
    };
}

/// True if a canvas with `layer_count` layers of `rows * cols` pixels is
/// over the soft pixel ceiling.
pub fn exceeds_pixel_limit(layer_count: usize, rows: usize, cols: usize, max_pixels: usize) -> bool {
    return layer_count.saturating_mul(rows.saturating_mul(cols)) > max_pixels;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_blend_modes_round_trip_names() {
        assert_eq!(BlendMode::all().len(), 16);
        for mode in BlendMode::all() {
            assert_eq!(BlendMode::from_name(mode.name()), Some(*mode));
        }
        assert_eq!(BlendMode::from_name("plus"), None);
    }

    #[test]
    fn blend_mode_serde_matches_name() {
        let json = serde_json::to_string(&BlendMode::ColorDodge).unwrap();
        assert_eq!(json, "\"color-dodge\"");
    }

    #[test]
    fn next_id_skips_gaps() {
        let mut layers = BTreeMap::new();
        assert_eq!(next_layer_id(&layers), 0);
        layers.insert(0, Layer::new(0));
        layers.insert(2, Layer::new(2));
        assert_eq!(next_layer_id(&layers), 3);
    }

    #[test]
    fn pixel_limit() {
        assert!(!exceeds_pixel_limit(1, 10, 10, 100));
        assert!(exceeds_pixel_limit(2, 10, 10, 100));
        assert!(!exceeds_pixel_limit(0, 48, 48, 0));
    }

    #[test]
    fn opacity_is_clamped() {
        let layer = Layer::new(0);
        assert_eq!(layer.with_opacity(1.5).opacity, 1.0);
        assert_eq!(layer.with_opacity(-0.5).opacity, 0.0);
        assert_eq!(layer.with_opacity(f32::NAN).opacity, 1.0);
    }

    #[test]
    fn layer_json_uses_camel_case() {
        let json = serde_json::to_string(&Layer::new(4)).unwrap();
        assert!(json.contains("\"blendMode\":\"normal\""));
        assert!(json.contains("\"hidden\":false"));
    }
}

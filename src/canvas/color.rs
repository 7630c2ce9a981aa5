// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Pixel colors.
//!
//! A stored pixel is one of three things: the transparent sentinel, a
//! `#rrggbb` color, or a `#rrggbbaa` color. Equality is exact: `#ff0000`
//! and `#ff0000ff` look the same on screen but are different values, and
//! the fill tool treats them as different regions. Parsing accepts either
//! case; the canonical string form is lowercase.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;

/// String form of the transparent sentinel.
pub const TRANSPARENT: &str = "transparent";

/// The color of one pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PixelColor {
    /// No color. Also what a missing key means.
    #[default]
    Transparent,
    /// `#rrggbb`
    Rgb([u8; 3]),
    /// `#rrggbbaa`
    Rgba([u8; 4]),
}

/// An opaque color split into channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PixelColor {
    /// True for the transparent sentinel.
    pub fn is_transparent(&self) -> bool {
        return matches!(self, PixelColor::Transparent);
    }

    /// The color channels, if this is not the sentinel.
    pub fn rgb(&self) -> Option<Rgb> {
        return match self {
            PixelColor::Transparent => None,
            PixelColor::Rgb([r, g, b]) => Some(Rgb { r: *r, g: *g, b: *b }),
            PixelColor::Rgba([r, g, b, _]) => Some(Rgb { r: *r, g: *g, b: *b }),
        };
    }

    /// The color with `opacity` (clamped to `[0, 1]`) folded into an alpha
    /// channel. Full opacity keeps the bare `#rrggbb` form.
    pub fn with_opacity(rgb: Rgb, opacity: f32) -> PixelColor {
        let opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        if opacity >= 1.0 {
            return PixelColor::Rgb([rgb.r, rgb.g, rgb.b]);
        }
        let alpha = (opacity * 255.0).round() as u8;
        return PixelColor::Rgba([rgb.r, rgb.g, rgb.b, alpha]);
    }
}

/// Resolve a stored value: a missing value is the sentinel.
pub fn resolve_pixel(stored: Option<&PixelColor>) -> PixelColor {
    return stored.copied().unwrap_or_default();
}

impl From<Rgb> for PixelColor {
    fn from(rgb: Rgb) -> PixelColor {
        return PixelColor::Rgb([rgb.r, rgb.g, rgb.b]);
    }
}

fn parse_channels<const N: usize>(digits: &str) -> Option<[u8; N]> {
    let mut out = [0u8; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let pair = digits.get(i * 2..i * 2 + 2)?;
        *slot = u8::from_str_radix(pair, 16).ok()?;
    }
    return Some(out);
}

impl FromStr for PixelColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<PixelColor, Error> {
        let invalid = || Error::InvalidColor(s.to_string());
        if s.eq_ignore_ascii_case(TRANSPARENT) {
            return Ok(PixelColor::Transparent);
        }
        let digits = s.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        return match digits.len() {
            6 => parse_channels::<3>(digits).map(PixelColor::Rgb).ok_or_else(invalid),
            8 => parse_channels::<4>(digits).map(PixelColor::Rgba).ok_or_else(invalid),
            _ => Err(invalid()),
        };
    }
}

impl fmt::Display for PixelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            PixelColor::Transparent => f.write_str(TRANSPARENT),
            PixelColor::Rgb([r, g, b]) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
            PixelColor::Rgba([r, g, b, a]) => write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a),
        };
    }
}

impl TryFrom<String> for PixelColor {
    type Error = Error;

    fn try_from(s: String) -> Result<PixelColor, Error> {
        return s.parse();
    }
}

impl From<PixelColor> for String {
    fn from(color: PixelColor) -> String {
        return color.to_string();
    }
}

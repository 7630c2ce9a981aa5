// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Pixel addressing.
//!
//! The pixel store is a flat map, so every pixel needs a string key. A key
//! is `"{layer}_{row}_{col}"`. All three parts are unsigned integers,
//! which can never contain the separator, so no escaping is needed and
//! `decode(encode(p)) == p` always holds.

use std::fmt;
use std::str::FromStr;

use crate::canvas::layer::LayerId;
use crate::error::Error;

/// Separator between the three key parts.
pub const SEPARATOR: char = '_';

/// The coordinate of one pixel: which layer, which row, which column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelKey {
    pub layer: LayerId,
    pub row: u32,
    pub col: u32,
}

impl PixelKey {
    pub fn new(layer: LayerId, row: u32, col: u32) -> PixelKey {
        return PixelKey { layer, row, col };
    }
}

/// Encode a coordinate into its flat key.
pub fn encode(layer: LayerId, row: u32, col: u32) -> String {
    return format!("{}{SEPARATOR}{}{SEPARATOR}{}", layer, row, col);
}

/// Decode a flat key back into a coordinate.
pub fn decode(key: &str) -> Result<PixelKey, Error> {
    let malformed = || Error::MalformedKey(key.to_string());
    let mut parts = key.split(SEPARATOR);

    let mut next = || -> Result<u32, Error> {
        let part = parts.next().ok_or_else(malformed)?;
        // u32::from_str accepts a leading '+', which encode never produces.
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        return part.parse::<u32>().map_err(|_| malformed());
    };

    let layer = next()?;
    let row = next()?;
    let col = next()?;
    if parts.next().is_some() {
        return Err(malformed());
    }
    return Ok(PixelKey { layer, row, col });
}

impl fmt::Display for PixelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&encode(self.layer, self.row, self.col));
    }
}

impl FromStr for PixelKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<PixelKey, Error> {
        return decode(s);
    }
}

impl From<PixelKey> for String {
    fn from(key: PixelKey) -> String {
        return key.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_joins_with_underscore() {
        assert_eq!(encode(0, 1, 2), "0_1_2");
        assert_eq!(encode(12, 0, 47), "12_0_47");
    }

    #[test]
    fn decode_parses_positionally() {
        assert_eq!(decode("3_4_5").unwrap(), PixelKey::new(3, 4, 5));
    }

    #[test]
    fn decode_rejects_malformed() {
        for bad in ["", "1_2", "1_2_3_4", "a_1_2", "1__2", "-1_0_0", "+1_0_0", "1_2_ 3"] {
            assert_eq!(decode(bad), Err(Error::MalformedKey(bad.to_string())), "{:?}", bad);
        }
    }

    #[test]
    fn display_matches_encode() {
        let key = PixelKey::new(2, 9, 1);
        assert_eq!(key.to_string(), encode(2, 9, 1));
        assert_eq!("2_9_1".parse::<PixelKey>().unwrap(), key);
    }
}

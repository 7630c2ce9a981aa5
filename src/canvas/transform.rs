// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Shifting a whole layer by one cell.
//!
//! The layer's bounds are inferred from its stored pixels (`max_row`,
//! `max_col`), not from the canvas size. Pixels shifted past an edge are
//! dropped, and the row or column left behind on the opposite edge is
//! filled with transparent pixels. The move is lossy: up followed by down
//! does not restore a row that fell off the top.
//!
//! `move_pixels` returns the complete new pixel set of the layer, not a
//! diff. Keys the old layer had but the new set lacks come from
//! `vacated_keys` and must be deleted in the same batch.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde::Serialize;

use crate::canvas::color::PixelColor;
use crate::canvas::layer::LayerId;
use crate::canvas::pixel_key;
use crate::canvas::pixel_key::PixelKey;
use crate::canvas::tool::PixelWrite;

/// Which way to shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

/// Decode the pixels that belong to `layer`, in key order.
fn layer_pixels(layer: LayerId, pixels: &BTreeMap<String, PixelColor>) -> Vec<(PixelKey, PixelColor)> {
    return pixels
        .iter()
        .filter_map(|(key, color)| pixel_key::decode(key).ok().map(|k| (k, *color)))
        .filter(|(key, _)| key.layer == layer)
        .collect();
}

/// The full replacement pixel set for `layer` after a one-cell shift.
pub fn move_pixels(
    direction: Direction,
    layer: LayerId,
    pixels: &BTreeMap<String, PixelColor>,
) -> Vec<PixelWrite> {
    let current = layer_pixels(layer, pixels);
    if current.is_empty() {
        return Vec::new();
    }
    let max_row = current.iter().map(|(k, _)| k.row).max().unwrap_or(0);
    let max_col = current.iter().map(|(k, _)| k.col).max().unwrap_or(0);

    let shift = |key: &PixelKey| -> Option<(u32, u32)> {
        let (row, col) = (key.row, key.col);
        return match direction {
            Direction::Up => row.checked_sub(1).map(|r| (r, col)),
            Direction::Down => Some((row + 1, col)).filter(|(r, _)| *r <= max_row),
            Direction::Left => col.checked_sub(1).map(|c| (row, c)),
            Direction::Right => Some((row, col + 1)).filter(|(_, c)| *c <= max_col),
        };
    };

    let mut out: Vec<PixelWrite> = current
        .iter()
        .filter_map(|(key, color)| {
            shift(key).map(|(row, col)| PixelWrite {
                key: PixelKey::new(layer, row, col),
                color: *color,
            })
        })
        .collect();

    let empty = |row: u32, col: u32| PixelWrite {
        key: PixelKey::new(layer, row, col),
        color: PixelColor::Transparent,
    };
    match direction {
        Direction::Up => out.extend((0..=max_col).map(|col| empty(max_row, col))),
        Direction::Down => out.extend((0..=max_col).map(|col| empty(0, col))),
        // One cell per row: the vacated column is max_row + 1 cells tall.
        Direction::Left => out.extend((0..=max_row).map(|row| empty(row, max_col))),
        Direction::Right => out.extend((0..=max_row).map(|row| empty(row, 0))),
    }

    return out;
}

/// Keys of `layer` present in `pixels` that `replacement` does not write.
pub fn vacated_keys(
    layer: LayerId,
    pixels: &BTreeMap<String, PixelColor>,
    replacement: &[PixelWrite],
) -> Vec<PixelKey> {
    let kept: FxHashSet<PixelKey> = replacement.iter().map(|w| w.key).collect();
    return layer_pixels(layer, pixels)
        .into_iter()
        .map(|(key, _)| key)
        .filter(|key| !kept.contains(key))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: PixelColor = PixelColor::Rgb([1, 0, 0]);
    const B: PixelColor = PixelColor::Rgb([2, 0, 0]);
    const C: PixelColor = PixelColor::Rgb([3, 0, 0]);
    const D: PixelColor = PixelColor::Rgb([4, 0, 0]);
    const T: PixelColor = PixelColor::Transparent;

    // A B
    // C D
    fn two_by_two(layer: LayerId) -> BTreeMap<String, PixelColor> {
        let mut pixels = BTreeMap::new();
        pixels.insert(pixel_key::encode(layer, 0, 0), A);
        pixels.insert(pixel_key::encode(layer, 0, 1), B);
        pixels.insert(pixel_key::encode(layer, 1, 0), C);
        pixels.insert(pixel_key::encode(layer, 1, 1), D);
        return pixels;
    }

    fn as_map(writes: &[PixelWrite]) -> BTreeMap<(u32, u32), PixelColor> {
        return writes.iter().map(|w| ((w.key.row, w.key.col), w.color)).collect();
    }

    #[test]
    fn move_up_drops_top_row_and_clears_bottom() {
        let writes = move_pixels(Direction::Up, 0, &two_by_two(0));
        let grid = as_map(&writes);
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[&(0, 0)], C);
        assert_eq!(grid[&(0, 1)], D);
        assert_eq!(grid[&(1, 0)], T);
        assert_eq!(grid[&(1, 1)], T);
    }

    #[test]
    fn move_down_clears_top() {
        let grid = as_map(&move_pixels(Direction::Down, 0, &two_by_two(0)));
        assert_eq!(grid[&(0, 0)], T);
        assert_eq!(grid[&(0, 1)], T);
        assert_eq!(grid[&(1, 0)], A);
        assert_eq!(grid[&(1, 1)], B);
    }

    #[test]
    fn move_left_and_right() {
        let left = as_map(&move_pixels(Direction::Left, 0, &two_by_two(0)));
        assert_eq!(left[&(0, 0)], B);
        assert_eq!(left[&(1, 0)], D);
        assert_eq!(left[&(0, 1)], T);
        assert_eq!(left[&(1, 1)], T);

        let right = as_map(&move_pixels(Direction::Right, 0, &two_by_two(0)));
        assert_eq!(right[&(0, 1)], A);
        assert_eq!(right[&(1, 1)], C);
        assert_eq!(right[&(0, 0)], T);
        assert_eq!(right[&(1, 0)], T);
    }

    #[test]
    fn horizontal_edge_fill_covers_every_row() {
        // 3 rows, 2 cols
        let mut pixels = BTreeMap::new();
        for row in 0..3 {
            for col in 0..2 {
                pixels.insert(pixel_key::encode(0, row, col), A);
            }
        }
        let grid = as_map(&move_pixels(Direction::Right, 0, &pixels));
        assert_eq!(grid.len(), 6);
        for row in 0..3 {
            assert_eq!(grid[&(row, 0)], T);
            assert_eq!(grid[&(row, 1)], A);
        }
    }

    #[test]
    fn up_then_down_is_lossy() {
        let once = move_pixels(Direction::Up, 0, &two_by_two(0));
        let store: BTreeMap<String, PixelColor> =
            once.iter().map(|w| (w.key.to_string(), w.color)).collect();
        let grid = as_map(&move_pixels(Direction::Down, 0, &store));
        assert_eq!(grid[&(0, 0)], T);
        assert_eq!(grid[&(1, 0)], C);
    }

    #[test]
    fn other_layers_are_ignored() {
        let mut pixels = two_by_two(0);
        pixels.extend(two_by_two(1));
        let writes = move_pixels(Direction::Up, 1, &pixels);
        assert!(writes.iter().all(|w| w.key.layer == 1));
        assert_eq!(writes.len(), 4);
    }

    #[test]
    fn empty_layer_moves_to_nothing() {
        assert!(move_pixels(Direction::Left, 3, &two_by_two(0)).is_empty());
    }

    #[test]
    fn vacated_keys_lists_unreferenced() {
        // A sparse layer: only (0, 0) and (2, 2) exist.
        let mut pixels = BTreeMap::new();
        pixels.insert(pixel_key::encode(0, 0, 0), A);
        pixels.insert(pixel_key::encode(0, 2, 2), B);
        let writes = move_pixels(Direction::Up, 0, &pixels);
        let vacated = vacated_keys(0, &pixels, &writes);
        assert_eq!(vacated, vec![PixelKey::new(0, 0, 0)]);
    }
}

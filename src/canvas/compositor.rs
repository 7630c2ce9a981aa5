// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Rebuilding renderable layers from the flat stores.
//!
//! `format_layers` is recomputed from scratch on every change. Grids are
//! at most a few thousand cells, so a full pass is cheaper to reason
//! about than incremental patching and it can never drift out of sync
//! with the store.
//!
//! The function is pure: same snapshots in, structurally equal layers
//! out. Keys that do not decode, and pixels whose layer no longer exists
//! (say, a layer deleted in the same batch), are skipped.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::canvas::color::PixelColor;
use crate::canvas::color::resolve_pixel;
use crate::canvas::layer::Layer;
use crate::canvas::layer::LayerId;
use crate::canvas::pixel_key;

/// A row-major grid of pixel colors. Cells nobody wrote are `None`.
///
/// Rows may be ragged: a row is only as long as its last written column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<Option<PixelColor>>>,
}

impl Grid {
    /// An empty grid.
    pub fn new() -> Grid {
        return Grid { rows: Vec::new() };
    }

    /// A `rows x cols` grid with every cell set to `color`.
    pub fn filled(rows: u32, cols: u32, color: PixelColor) -> Grid {
        let row = vec![Some(color); cols as usize];
        return Grid { rows: vec![row; rows as usize] };
    }

    /// The color at a cell. Outside the grid, or unset, is `None`.
    #[inline]
    pub fn get(&self, row: u32, col: u32) -> Option<&PixelColor> {
        return self.rows
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .and_then(|cell| cell.as_ref());
    }

    /// Set a cell, growing the grid as needed.
    pub fn set(&mut self, row: u32, col: u32, color: PixelColor) {
        let (row, col) = (row as usize, col as usize);
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, None);
        }
        cells[col] = Some(color);
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        return self.rows.len();
    }

    /// Length of the longest row.
    pub fn col_count(&self) -> usize {
        return self.rows.iter().map(|r| r.len()).max().unwrap_or(0);
    }

    /// True when no row exists.
    pub fn is_empty(&self) -> bool {
        return self.rows.is_empty();
    }

    /// The raw rows.
    pub fn rows(&self) -> &[Vec<Option<PixelColor>>] {
        return &self.rows;
    }
}

/// A layer together with its freshly derived grid.
#[derive(Clone, Debug, PartialEq)]
pub struct FormattedLayer {
    pub layer: Layer,
    pub grid: Grid,
}

/// Derive one grid per layer, in layer id order.
///
/// An empty pixel store or an empty layer store yields no layers.
pub fn format_layers(
    pixels: &BTreeMap<String, PixelColor>,
    layers: &BTreeMap<LayerId, Layer>,
) -> Vec<FormattedLayer> {
    if pixels.is_empty() || layers.is_empty() {
        return Vec::new();
    }

    let mut by_layer: FxHashMap<LayerId, Grid> = FxHashMap::default();
    let mut skipped = 0usize;
    for (key, value) in pixels {
        let coord = match pixel_key::decode(key) {
            Ok(coord) => coord,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        by_layer
            .entry(coord.layer)
            .or_default()
            .set(coord.row, coord.col, resolve_pixel(Some(value)));
    }
    if skipped > 0 {
        log::debug!("format_layers: skipped {} undecodable keys", skipped);
    }

    return layers
        .values()
        .map(|layer| FormattedLayer {
            layer: *layer,
            grid: by_layer.remove(&layer.id).unwrap_or_default(),
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(s: &str) -> PixelColor {
        return s.parse().unwrap();
    }

    fn store(entries: &[(&str, &str)]) -> BTreeMap<String, PixelColor> {
        return entries.iter().map(|(k, v)| (k.to_string(), color(v))).collect();
    }

    fn one_layer() -> BTreeMap<LayerId, Layer> {
        let mut layers = BTreeMap::new();
        layers.insert(0, Layer::new(0));
        return layers;
    }

    #[test]
    fn places_pixels_by_row_and_col() {
        let pixels = store(&[("0_0_0", "#ff0000"), ("0_0_1", "#00ff00")]);
        let formatted = format_layers(&pixels, &one_layer());

        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0].grid.get(0, 0), Some(&color("#ff0000")));
        assert_eq!(formatted[0].grid.get(0, 1), Some(&color("#00ff00")));
        assert_eq!(formatted[0].layer, Layer::new(0));
    }

    #[test]
    fn recomputing_is_structurally_equal() {
        let pixels = store(&[("0_0_0", "#ff0000"), ("0_1_1", "transparent")]);
        let layers = one_layer();
        assert_eq!(format_layers(&pixels, &layers), format_layers(&pixels, &layers));
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        let pixels = store(&[("0_0_0", "#ff0000")]);
        assert!(format_layers(&pixels, &BTreeMap::new()).is_empty());
        assert!(format_layers(&BTreeMap::new(), &one_layer()).is_empty());
    }

    #[test]
    fn orphaned_and_malformed_pixels_are_dropped() {
        let pixels = store(&[("0_0_0", "#ff0000"), ("7_0_0", "#00ff00"), ("junk", "#0000ff")]);
        let formatted = format_layers(&pixels, &one_layer());
        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0].grid.row_count(), 1);
        assert_eq!(formatted[0].grid.col_count(), 1);
    }

    #[test]
    fn layers_follow_id_order_and_keep_metadata() {
        let pixels = store(&[("0_0_0", "#ff0000"), ("3_0_0", "#00ff00")]);
        let mut layers = BTreeMap::new();
        layers.insert(3, Layer { hidden: true, ..Layer::new(3) });
        layers.insert(0, Layer::new(0));

        let formatted = format_layers(&pixels, &layers);
        let ids: Vec<LayerId> = formatted.iter().map(|f| f.layer.id).collect();
        assert_eq!(ids, vec![0, 3]);
        assert!(formatted[1].layer.hidden);
        assert_eq!(formatted[1].grid.get(0, 0), Some(&color("#00ff00")));
    }

    #[test]
    fn unvisited_cells_stay_unset() {
        let pixels = store(&[("0_1_2", "#ff0000")]);
        let formatted = format_layers(&pixels, &one_layer());
        let grid = &formatted[0].grid;
        assert_eq!(grid.get(0, 0), None);
        assert_eq!(grid.get(1, 1), None);
        assert_eq!(grid.get(1, 2), Some(&color("#ff0000")));
        assert_eq!(grid.get(9, 9), None);
    }

    #[test]
    fn layer_without_pixels_gets_empty_grid() {
        let pixels = store(&[("0_0_0", "#ff0000")]);
        let mut layers = one_layer();
        layers.insert(1, Layer::new(1));
        let formatted = format_layers(&pixels, &layers);
        assert_eq!(formatted.len(), 2);
        assert!(formatted[1].grid.is_empty());
    }
}

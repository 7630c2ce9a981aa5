// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Turning one pointer edit into pixel writes.
//!
//! The tool engine never touches the store. It looks at the selected
//! layer's current grid and returns the writes a gesture implies; the
//! caller applies them as one batch.
//!
//! # Flood fill
//!
//! Fill expands from the target cell to every 4-connected neighbor
//! (up, down, left, right) whose color is exactly the target's color. The
//! walk uses an explicit stack and a visited set keyed by `(row, col)`, so
//! a large uniform region cannot blow the call stack and no cell is
//! written twice. Cells outside the grid, or never written, do not match
//! anything.

use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde::Serialize;
use smallvec::SmallVec;
use smallvec::smallvec;

use crate::canvas::color::PixelColor;
use crate::canvas::compositor::Grid;
use crate::canvas::layer::LayerId;
use crate::canvas::pixel_key::PixelKey;

/// The active drawing tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Fill,
}

impl Tool {
    /// True for tools whose color ends up in the recent-colors list.
    pub fn applies_color(&self) -> bool {
        return matches!(self, Tool::Brush | Tool::Fill);
    }
}

/// One pixel write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelWrite {
    pub key: PixelKey,
    pub color: PixelColor,
}

/// The writes for one gesture. Brush and eraser produce exactly one.
pub type WriteSet = SmallVec<[PixelWrite; 1]>;

/// Compute the writes for an edit at `(row, col)` on `layer`.
pub fn apply_pixel_edit(
    tool: Tool,
    layer: LayerId,
    grid: &Grid,
    row: u32,
    col: u32,
    color: PixelColor,
) -> WriteSet {
    return match tool {
        Tool::Brush => smallvec![PixelWrite { key: PixelKey::new(layer, row, col), color }],
        Tool::Eraser => smallvec![PixelWrite {
            key: PixelKey::new(layer, row, col),
            color: PixelColor::Transparent,
        }],
        Tool::Fill => flood_fill(grid, row, col)
            .into_iter()
            .map(|(r, c)| PixelWrite { key: PixelKey::new(layer, r, c), color })
            .collect(),
    };
}

/// Every cell of the region containing `(row, col)`, origin first.
///
/// The origin is always included, even when it lies outside the grid.
pub fn flood_fill(grid: &Grid, row: u32, col: u32) -> Vec<(u32, u32)> {
    let target = grid.get(row, col).copied();
    let mut region = vec![(row, col)];
    let Some(target) = target else {
        return region;
    };

    let mut visited: FxHashSet<(u32, u32)> = FxHashSet::default();
    visited.insert((row, col));
    let mut stack = vec![(row, col)];

    while let Some((r, c)) = stack.pop() {
        let neighbors = [
            r.checked_sub(1).map(|up| (up, c)),
            r.checked_add(1).map(|down| (down, c)),
            c.checked_sub(1).map(|left| (r, left)),
            c.checked_add(1).map(|right| (r, right)),
        ];
        for (nr, nc) in neighbors.into_iter().flatten() {
            if visited.contains(&(nr, nc)) {
                continue;
            }
            if grid.get(nr, nc) != Some(&target) {
                continue;
            }
            visited.insert((nr, nc));
            region.push((nr, nc));
            stack.push((nr, nc));
        }
    }

    return region;
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: PixelColor = PixelColor::Rgb([255, 255, 255]);
    const BLACK: PixelColor = PixelColor::Rgb([0, 0, 0]);
    const RED: PixelColor = PixelColor::Rgb([255, 0, 0]);

    #[test]
    fn brush_writes_one_cell() {
        let grid = Grid::filled(3, 3, WHITE);
        let writes = apply_pixel_edit(Tool::Brush, 2, &grid, 1, 2, RED);
        assert_eq!(writes.as_slice(), &[PixelWrite { key: PixelKey::new(2, 1, 2), color: RED }]);
    }

    #[test]
    fn eraser_ignores_brush_color() {
        let grid = Grid::filled(3, 3, WHITE);
        let writes = apply_pixel_edit(Tool::Eraser, 0, &grid, 0, 0, RED);
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].color, PixelColor::Transparent);
    }

    #[test]
    fn fill_uniform_grid_touches_every_cell_once() {
        let grid = Grid::filled(3, 3, WHITE);
        for row in 0..3 {
            for col in 0..3 {
                let writes = apply_pixel_edit(Tool::Fill, 0, &grid, row, col, BLACK);
                assert_eq!(writes.len(), 9);
                let unique: FxHashSet<PixelKey> = writes.iter().map(|w| w.key).collect();
                assert_eq!(unique.len(), 9);
                assert!(writes.iter().all(|w| w.color == BLACK));
            }
        }
    }

    #[test]
    fn fill_skips_differently_colored_cell() {
        let mut grid = Grid::filled(3, 3, WHITE);
        grid.set(1, 1, RED);
        let writes = apply_pixel_edit(Tool::Fill, 0, &grid, 0, 0, BLACK);
        assert_eq!(writes.len(), 8);
        assert!(writes.iter().all(|w| w.key != PixelKey::new(0, 1, 1)));
    }

    #[test]
    fn fill_does_not_cross_diagonals() {
        // W R
        // R W
        let mut grid = Grid::filled(2, 2, WHITE);
        grid.set(0, 1, RED);
        grid.set(1, 0, RED);
        assert_eq!(flood_fill(&grid, 0, 0), vec![(0, 0)]);
    }

    #[test]
    fn fill_outside_grid_writes_origin_only() {
        let grid = Grid::filled(2, 2, WHITE);
        assert_eq!(flood_fill(&grid, 5, 5), vec![(5, 5)]);
        assert_eq!(flood_fill(&Grid::new(), 0, 0), vec![(0, 0)]);
    }

    #[test]
    fn fill_origin_first() {
        let grid = Grid::filled(2, 3, WHITE);
        let region = flood_fill(&grid, 1, 2);
        assert_eq!(region[0], (1, 2));
        assert_eq!(region.len(), 6);
    }

    #[test]
    fn fill_handles_ragged_rows() {
        let mut grid = Grid::new();
        grid.set(0, 0, WHITE);
        grid.set(0, 1, WHITE);
        grid.set(1, 0, WHITE);
        // (1, 1) was never written and must not match.
        let region = flood_fill(&grid, 1, 0);
        assert_eq!(region.len(), 3);
        assert!(!region.contains(&(1, 1)));
    }

    #[test]
    fn fill_large_region_is_iterative() {
        let grid = Grid::filled(300, 300, WHITE);
        assert_eq!(flood_fill(&grid, 150, 150).len(), 90_000);
    }

    #[test]
    fn applies_color() {
        assert!(Tool::Brush.applies_color());
        assert!(Tool::Fill.applies_color());
        assert!(!Tool::Eraser.applies_color());
    }
}

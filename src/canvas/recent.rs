// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Recently applied colors, for the color picker.

use std::collections::VecDeque;

use crate::canvas::color::PixelColor;

/// A bounded, insertion-ordered set of colors. When full, the oldest
/// color is evicted to make room. Re-adding a present color does nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecentColors {
    colors: VecDeque<PixelColor>,
    capacity: usize,
}

impl RecentColors {
    pub fn new(capacity: usize) -> RecentColors {
        return RecentColors {
            colors: VecDeque::with_capacity(capacity),
            capacity,
        };
    }

    /// Record a color. Returns true if it was not already present.
    pub fn push(&mut self, color: PixelColor) -> bool {
        if self.capacity == 0 || self.colors.contains(&color) {
            return false;
        }
        if self.colors.len() == self.capacity {
            self.colors.pop_front();
        }
        self.colors.push_back(color);
        return true;
    }

    /// Colors from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &PixelColor> {
        return self.colors.iter();
    }

    pub fn len(&self) -> usize {
        return self.colors.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.colors.is_empty();
    }

    pub fn capacity(&self) -> usize {
        return self.capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(level: u8) -> PixelColor {
        return PixelColor::Rgb([level, level, level]);
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut recent = RecentColors::new(4);
        assert!(recent.push(gray(1)));
        assert!(!recent.push(gray(1)));
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn oldest_is_evicted() {
        let mut recent = RecentColors::new(3);
        for level in 0..5 {
            recent.push(gray(level));
        }
        let colors: Vec<PixelColor> = recent.iter().copied().collect();
        assert_eq!(colors, vec![gray(2), gray(3), gray(4)]);
    }

    #[test]
    fn zero_capacity_holds_nothing() {
        let mut recent = RecentColors::new(0);
        assert!(!recent.push(gray(1)));
        assert!(recent.is_empty());
    }
}

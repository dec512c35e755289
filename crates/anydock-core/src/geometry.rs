#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A rectangle for dock bounds, divider placement, and drop hit testing.
///
/// Uses cell coordinates (0-indexed, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a cell is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Check if a signed pointer position falls inside the rectangle.
    #[inline]
    pub fn contains_pointer(&self, pointer: PointerPosition) -> bool {
        let (Ok(x), Ok(y)) = (u16::try_from(pointer.x), u16::try_from(pointer.y)) else {
            return false;
        };
        self.contains(x, y)
    }

    /// Split along the x axis: `first_width` cells, then `gap` cells, then the rest.
    ///
    /// Returns `(first, gap, second)`. Sizes saturate at the rectangle width.
    pub fn split_columns(&self, first_width: u16, gap: u16) -> (Rect, Rect, Rect) {
        let first_width = first_width.min(self.width);
        let gap = gap.min(self.width - first_width);
        let second_width = self.width - first_width - gap;
        let first = Rect::new(self.x, self.y, first_width, self.height);
        let gap_rect = Rect::new(first.right(), self.y, gap, self.height);
        let second = Rect::new(gap_rect.right(), self.y, second_width, self.height);
        (first, gap_rect, second)
    }

    /// Split along the y axis: `first_height` rows, then `gap` rows, then the rest.
    pub fn split_rows(&self, first_height: u16, gap: u16) -> (Rect, Rect, Rect) {
        let first_height = first_height.min(self.height);
        let gap = gap.min(self.height - first_height);
        let second_height = self.height - first_height - gap;
        let first = Rect::new(self.x, self.y, self.width, first_height);
        let gap_rect = Rect::new(self.x, first.bottom(), self.width, gap);
        let second = Rect::new(self.x, gap_rect.bottom(), self.width, second_height);
        (first, gap_rect, second)
    }
}

/// Pointer location reported by the host toolkit.
///
/// Signed so that positions slightly outside a window (during a drag) are
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(2, 3, 4, 5);
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 7));
        assert!(!r.contains(6, 3));
        assert!(!r.contains(2, 8));
    }

    #[test]
    fn contains_pointer_rejects_negative() {
        let r = Rect::from_size(10, 10);
        assert!(!r.contains_pointer(PointerPosition::new(-1, 4)));
        assert!(r.contains_pointer(PointerPosition::new(0, 0)));
        assert!(!r.contains_pointer(PointerPosition::new(10, 0)));
    }

    #[test]
    fn split_columns_reserves_gap() {
        let r = Rect::new(1, 1, 21, 4);
        let (a, gap, b) = r.split_columns(10, 1);
        assert_eq!(a, Rect::new(1, 1, 10, 4));
        assert_eq!(gap, Rect::new(11, 1, 1, 4));
        assert_eq!(b, Rect::new(12, 1, 10, 4));
    }

    #[test]
    fn split_rows_saturates() {
        let r = Rect::from_size(5, 3);
        let (a, gap, b) = r.split_rows(7, 2);
        assert_eq!(a.height, 3);
        assert_eq!(gap.height, 0);
        assert_eq!(b.height, 0);
    }

    proptest! {
        #[test]
        fn split_columns_conserves_width(w in 0u16..500, first in 0u16..600, gap in 0u16..4) {
            let r = Rect::from_size(w, 3);
            let (a, g, b) = r.split_columns(first, gap);
            prop_assert_eq!(a.width + g.width + b.width, w);
            prop_assert_eq!(b.right(), r.right());
        }
    }
}

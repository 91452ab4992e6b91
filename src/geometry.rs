//! Axis-aligned rectangles and overlap heuristics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance, in pixels, applied to every edge by [`Rect::completely_obscures`]
pub const OBSCURE_MARGIN: i32 = 2;

/// Bounding rectangle in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a rectangle from its origin and size
    pub fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Width times height; zero for empty or inverted rectangles
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        i64::from(self.width()) * i64::from(self.height())
    }

    /// A rectangle with no positive extent in either direction
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// All four coordinates are zero
    pub fn is_all_zeros(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }

    /// Check if `other` lies entirely within this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    /// Check if the two rectangles share a region of positive area
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Edge-wise comparison with a tolerance
    pub fn approx_eq(&self, other: &Rect, margin: i32) -> bool {
        let margin = margin.unsigned_abs();
        self.left.abs_diff(other.left) <= margin
            && self.top.abs_diff(other.top) <= margin
            && self.right.abs_diff(other.right) <= margin
            && self.bottom.abs_diff(other.bottom) <= margin
    }

    /// Check if this rectangle hides `other` entirely.
    ///
    /// Both rectangles must be non-empty. `self` has to enclose `other` on all four
    /// edges, give or take [`OBSCURE_MARGIN`], without being the same rectangle
    /// within that tolerance: an element that exactly fills its container does not
    /// obscure it.
    pub fn completely_obscures(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        let encloses = self.left <= other.left.saturating_add(OBSCURE_MARGIN)
            && self.top <= other.top.saturating_add(OBSCURE_MARGIN)
            && self.right >= other.right.saturating_sub(OBSCURE_MARGIN)
            && self.bottom >= other.bottom.saturating_sub(OBSCURE_MARGIN);

        encloses && !self.approx_eq(other, OBSCURE_MARGIN)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[l={},t={},r={},b={}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

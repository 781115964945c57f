#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All positioning math runs in `f64` logical pixels. Rectangles are
//! axis-aligned and always expressed in a single stated coordinate space
//! (viewport, document, or offset-parent relative); the caller keeps track of
//! which one.

use serde::{Deserialize, Serialize};

/// A point in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Coordinate along the given axis.
    #[inline]
    pub const fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Mutable coordinate along the given axis.
    #[inline]
    pub const fn axis_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }
}

/// Width and height of an element's box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    /// Create new dimensions, clamping negatives to zero.
    #[inline]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Length along the given axis (x maps to width).
    #[inline]
    pub const fn length(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }
}

/// Effective CSS scale factors of an element (`1.0` is identity).
///
/// Corrects for `transform: scale(...)` and browser sub-pixel rounding: the
/// visual rectangle of a scaled element differs from its layout box by these
/// factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    /// The identity scale.
    pub const IDENTITY: Self = Self { x: 1.0, y: 1.0 };

    /// Create a new scale pair.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An axis-aligned rectangle in logical pixels.
///
/// Invariant: `width >= 0` and `height >= 0` (constructors clamp).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle, clamping negative dimensions to zero.
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub fn from_dimensions(dimensions: Dimensions) -> Self {
        Self::new(0.0, 0.0, dimensions.width, dimensions.height)
    }

    /// Left edge (alias for x).
    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Top-left corner.
    #[inline]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Width and height.
    #[inline]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Start coordinate along the given axis (x or y).
    #[inline]
    pub const fn axis_start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Length along the given axis (x maps to width).
    #[inline]
    pub const fn length(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    /// Whether the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether a point lies inside the rectangle.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Intersection with another rectangle, empty when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Whether two rectangles overlap with positive area.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Translate by the given deltas.
    #[inline]
    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Per-side padding in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    /// Equal padding on all sides.
    pub const fn all(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Padding on the left and right only.
    pub const fn horizontal(value: f64) -> Self {
        Self {
            top: 0.0,
            right: value,
            bottom: 0.0,
            left: value,
        }
    }

    /// Padding on the top and bottom only.
    pub const fn vertical(value: f64) -> Self {
        Self {
            top: value,
            right: 0.0,
            bottom: value,
            left: 0.0,
        }
    }

    /// Specific per-side values.
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

impl From<f64> for Sides {
    fn from(value: f64) -> Self {
        Self::all(value)
    }
}

/// A layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// The other axis.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, Point, Rect, Sides};

    #[test]
    fn rect_clamps_negative_dimensions() {
        let rect = Rect::new(5.0, 5.0, -3.0, -1.0);
        assert_eq!(rect.width, 0.0);
        assert_eq!(rect.height, 0.0);
        assert!(rect.is_empty());
    }

    #[test]
    fn rect_edges() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.left(), 10.0);
        assert_eq!(rect.top(), 20.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.center(), Point::new(25.0, 40.0));
    }

    #[test]
    fn rect_intersection_overlaps() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(2.0, 2.0, 4.0, 4.0);
        assert_eq!(a.intersection(&b), Rect::new(2.0, 2.0, 2.0, 2.0));
        assert!(a.intersects(&b));
    }

    #[test]
    fn rect_intersection_disjoint_is_empty() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(3.0, 3.0, 2.0, 2.0);
        assert!(a.intersection(&b).is_empty());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn rect_union_contains_both() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(5.0, 5.0, 2.0, 2.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 7.0, 7.0));
    }

    #[test]
    fn axis_accessors() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(rect.axis_start(Axis::X), 1.0);
        assert_eq!(rect.axis_start(Axis::Y), 2.0);
        assert_eq!(rect.length(Axis::X), 3.0);
        assert_eq!(rect.length(Axis::Y), 4.0);
        assert_eq!(Axis::X.opposite(), Axis::Y);
    }

    #[test]
    fn point_axis_mut() {
        let mut point = Point::new(1.0, 2.0);
        *point.axis_mut(Axis::Y) += 3.0;
        assert_eq!(point, Point::new(1.0, 5.0));
    }

    #[test]
    fn sides_constructors() {
        assert_eq!(Sides::all(2.0), Sides::from(2.0));
        assert_eq!(Sides::horizontal(1.0).top, 0.0);
        assert_eq!(Sides::horizontal(1.0).left, 1.0);
        assert_eq!(Sides::vertical(1.0).right, 0.0);
        assert_eq!(Sides::vertical(1.0).bottom, 1.0);
    }
}

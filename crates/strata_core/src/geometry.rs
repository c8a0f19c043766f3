//! Geometry primitives
//!
//! Points, sizes, rectangles, bounding boxes and 2D affine transforms used by
//! every stage of the pipeline.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

// ─────────────────────────────────────────────────────────────────────────────
// Core Geometry Types
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// True when `other` lies strictly closer than `tolerance`
    pub fn approx_eq(&self, other: Point, tolerance: f32) -> bool {
        self.distance_squared(other) < tolerance * tolerance
    }

    /// Linear interpolation towards `other`
    pub fn lerp(&self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn midpoint(&self, other: Point) -> Point {
        self.lerp(other, 0.5)
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Add<Vec2> for Point {
    type Output = Point;

    fn add(self, rhs: Vec2) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub<Vec2> for Point {
    type Output = Point;

    fn sub(self, rhs: Vec2) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Sub for Point {
    type Output = Vec2;

    fn sub(self, rhs: Point) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    /// Normalizes in place, returning the original length.
    ///
    /// Vectors shorter than 1e-6 are left untouched.
    pub fn normalize_mut(&mut self) -> f32 {
        let d = self.length();
        if d > 1e-6 {
            let id = 1.0 / d;
            self.x *= id;
            self.y *= id;
        }
        d
    }

    pub fn dot(&self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross product)
    pub fn cross(&self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Left-hand normal `(y, -x)`
    pub fn perp(&self) -> Vec2 {
        Vec2::new(self.y, -self.x)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Convert to a Rect at the origin (0, 0)
    pub const fn to_rect(self) -> Rect {
        Rect {
            origin: Point::ZERO,
            size: self,
        }
    }
}

/// 2D rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }

    pub fn top(&self) -> f32 {
        self.origin.y
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Create a rect from two corner points
    pub fn from_points(p1: Point, p2: Point) -> Self {
        let min_x = p1.x.min(p2.x);
        let min_y = p1.y.min(p2.y);
        let max_x = p1.x.max(p2.x);
        let max_y = p1.y.max(p2.y);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Get the union of two rects (smallest rect containing both)
    pub fn union(&self, other: &Rect) -> Self {
        Rect::from_points(
            Point::new(self.left().min(other.left()), self.top().min(other.top())),
            Point::new(
                self.right().max(other.right()),
                self.bottom().max(other.bottom()),
            ),
        )
    }

    /// Expand rect to include a point
    pub fn expand_to_include(&self, point: Point) -> Self {
        Rect::from_points(
            Point::new(self.left().min(point.x), self.top().min(point.y)),
            Point::new(self.right().max(point.x), self.bottom().max(point.y)),
        )
    }

    /// Check if this rect intersects with another
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Get the intersection of two rects (if they overlap)
    pub fn intersection(&self, other: &Rect) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }

        let x = self.left().max(other.left());
        let y = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right - x, bottom - y))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bounding Box
// ─────────────────────────────────────────────────────────────────────────────

/// Axis-aligned min/max accumulator
///
/// Starts empty (`min > max`) and grows with [`BoundingBox::include`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    pub const fn empty() -> Self {
        Self {
            min: Point::new(f32::INFINITY, f32::INFINITY),
            max: Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            min: rect.origin,
            max: Point::new(rect.right(), rect.bottom()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn include(&mut self, point: Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn union(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }
        self.include(other.min);
        self.include(other.max);
    }

    pub fn contains(&self, point: Point) -> bool {
        self.min.x <= point.x
            && self.max.x >= point.x
            && self.min.y <= point.y
            && self.max.y >= point.y
    }

    pub fn width(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.max.x - self.min.x
        }
    }

    pub fn height(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.max.y - self.min.y
        }
    }

    /// Convert to a rect; an empty box becomes [`Rect::ZERO`]
    pub fn to_rect(&self) -> Rect {
        if self.is_empty() {
            Rect::ZERO
        } else {
            Rect::from_points(self.min, self.max)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orientation
// ─────────────────────────────────────────────────────────────────────────────

/// Winding override for a subpath
///
/// When set, tessellation reverses the flattened points of a subpath whose
/// signed area disagrees with the requested orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winding {
    CounterClockwise,
    Clockwise,
}

/// Sweep direction for arcs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Clockwise,
    CounterClockwise,
}

// ─────────────────────────────────────────────────────────────────────────────
// Affine Transform
// ─────────────────────────────────────────────────────────────────────────────

/// 2D affine transformation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine2D {
    /// Matrix elements [a, b, c, d, tx, ty]
    /// | a  c  tx |
    /// | b  d  ty |
    /// | 0  0   1 |
    pub elements: [f32; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            elements: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            elements: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    pub fn rotation(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            elements: [c, s, -s, c, 0.0, 0.0],
        }
    }

    /// Skew by the given angles (radians) along x and y
    pub fn skew(angle_x: f32, angle_y: f32) -> Self {
        Self {
            elements: [1.0, angle_y.tan(), angle_x.tan(), 1.0, 0.0, 0.0],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.elements == Self::IDENTITY.elements
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point::new(
            a * point.x + c * point.y + tx,
            b * point.x + d * point.y + ty,
        )
    }

    /// Transform a direction, ignoring translation
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        let [a, b, c, d, _, _] = self.elements;
        Vec2::new(a * v.x + c * v.y, b * v.x + d * v.y)
    }

    /// Concatenate this transform with another (self * other)
    /// The resulting transform first applies `other`, then `self`.
    pub fn then(&self, other: &Affine2D) -> Affine2D {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;

        Affine2D {
            elements: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * tx2 + c1 * ty2 + tx1,
                b1 * tx2 + d1 * ty2 + ty1,
            ],
        }
    }

    /// Translation applied before this transform
    pub fn pre_translate(&self, x: f32, y: f32) -> Affine2D {
        self.then(&Affine2D::translation(x, y))
    }

    /// Rotation (radians) applied before this transform
    pub fn pre_rotate(&self, angle: f32) -> Affine2D {
        self.then(&Affine2D::rotation(angle))
    }

    /// Scale applied before this transform
    pub fn pre_scale(&self, sx: f32, sy: f32) -> Affine2D {
        self.then(&Affine2D::scale(sx, sy))
    }

    pub fn determinant(&self) -> f32 {
        let [a, b, c, d, _, _] = self.elements;
        a * d - b * c
    }

    /// Inverse transform, or `None` when the matrix is singular
    pub fn inverse(&self) -> Option<Affine2D> {
        let [a, b, c, d, tx, ty] = self.elements;
        let det = a as f64 * d as f64 - b as f64 * c as f64;
        if det.abs() < 1e-6 {
            return None;
        }
        let inv = 1.0 / det;
        let (a, b, c, d, tx, ty) = (
            a as f64, b as f64, c as f64, d as f64, tx as f64, ty as f64,
        );
        Some(Affine2D {
            elements: [
                (d * inv) as f32,
                (-b * inv) as f32,
                (-c * inv) as f32,
                (a * inv) as f32,
                ((c * ty - d * tx) * inv) as f32,
                ((b * tx - a * ty) * inv) as f32,
            ],
        })
    }

    /// Mean of the x and y scale factors, used to scale stroke widths
    pub fn average_scale(&self) -> f32 {
        let [a, b, c, d, _, _] = self.elements;
        let sx = (a * a + c * c).sqrt();
        let sy = (b * b + d * d).sqrt();
        (sx + sy) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_rect_union_and_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);

        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 15.0, 15.0));
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersection(&Rect::new(20.0, 20.0, 1.0, 1.0)), None);
    }

    #[test]
    fn test_bounding_box_accumulates() {
        let mut bbox = BoundingBox::empty();
        assert!(bbox.is_empty());
        assert_eq!(bbox.to_rect(), Rect::ZERO);

        bbox.include(Point::new(3.0, -1.0));
        bbox.include(Point::new(-2.0, 4.0));
        assert!(!bbox.is_empty());
        assert_eq!(bbox.min, Point::new(-2.0, -1.0));
        assert_eq!(bbox.max, Point::new(3.0, 4.0));
        assert_eq!(bbox.to_rect(), Rect::new(-2.0, -1.0, 5.0, 5.0));
    }

    #[test]
    fn test_affine_inverse_round_trip() {
        let m = Affine2D::translation(10.0, -4.0)
            .then(&Affine2D::rotation(0.7))
            .then(&Affine2D::scale(2.0, 3.0));
        let inv = m.inverse().expect("invertible");
        let p = Point::new(1.5, -2.25);
        let back = inv.transform_point(m.transform_point(p));

        assert!((back.x - p.x).abs() < 1e-4);
        assert!((back.y - p.y).abs() < 1e-4);
        assert!(Affine2D::scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_affine_then_order() {
        // Scale first, then translate
        let m = Affine2D::translation(5.0, 0.0).then(&Affine2D::scale(2.0, 2.0));
        assert_eq!(m.transform_point(Point::new(1.0, 1.0)), Point::new(7.0, 2.0));
    }

    #[test]
    fn test_average_scale() {
        assert!((Affine2D::scale(2.0, 4.0).average_scale() - 3.0).abs() < EPSILON);
        assert!((Affine2D::rotation(1.1).average_scale() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_normalize_mut_reports_length() {
        let mut v = Vec2::new(3.0, 4.0);
        let len = v.normalize_mut();
        assert!((len - 5.0).abs() < EPSILON);
        assert!((v.length() - 1.0).abs() < EPSILON);

        let mut tiny = Vec2::new(1e-8, 0.0);
        tiny.normalize_mut();
        assert_eq!(tiny, Vec2::new(1e-8, 0.0));
    }
}

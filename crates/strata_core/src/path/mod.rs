//! Vector paths
//!
//! A [`Path`] is an ordered, append-only list of [`PathCommand`]s. Every
//! higher-level construct (quadratic curves, arcs, rounded rectangles,
//! ellipses) is lowered to `MoveTo`/`LineTo`/`CubicTo`/`Close` at the time it
//! is appended, so the tessellator only ever sees those four commands plus
//! per-subpath winding overrides.

mod arc;
mod measure;
mod reverse;
mod svg;

use crate::geometry::{Affine2D, BoundingBox, Point, Rect, Winding};
use serde::{Deserialize, Serialize};

pub use arc::ArcKind;

/// Points closer than this are treated as coincident
pub const DISTANCE_TOLERANCE: f32 = 0.1;

/// Control-point distance for approximating a quarter circle with a cubic
pub(crate) const KAPPA90: f32 = 0.552_284_75;

// ─────────────────────────────────────────────────────────────────────────────
// Path Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Path command for building vector paths
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCommand {
    /// Start a new subpath
    MoveTo(Point),
    /// Straight segment to a point
    LineTo(Point),
    /// Cubic Bézier curve
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    /// Close the current subpath
    Close,
    /// Override the orientation of the current subpath
    Winding(Winding),
}

impl PathCommand {
    /// End point of a drawing command
    pub fn end_point(&self) -> Option<Point> {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
            PathCommand::CubicTo { end, .. } => Some(*end),
            PathCommand::Close | PathCommand::Winding(_) => None,
        }
    }

    /// Command with every point mapped through `xform`
    pub fn transformed(&self, xform: &Affine2D) -> PathCommand {
        match *self {
            PathCommand::MoveTo(p) => PathCommand::MoveTo(xform.transform_point(p)),
            PathCommand::LineTo(p) => PathCommand::LineTo(xform.transform_point(p)),
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => PathCommand::CubicTo {
                control1: xform.transform_point(control1),
                control2: xform.transform_point(control2),
                end: xform.transform_point(end),
            },
            other => other,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path
// ─────────────────────────────────────────────────────────────────────────────

/// Pen state carried between builder calls
#[derive(Clone, Copy, Debug, Default)]
struct Cursor {
    /// Current point
    last: Point,
    /// Start of the current subpath
    start: Point,
    /// Last control point, reflected by the smooth curve commands
    knot: Point,
}

/// A vector path
#[derive(Clone, Debug, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
    cursor: Cursor,
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.commands == other.commands
    }
}

impl Path {
    /// Create a new empty path
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a path from a vector of commands
    pub fn from_commands(commands: Vec<PathCommand>) -> Self {
        let mut path = Self::new();
        for command in commands {
            path.push(command);
        }
        path
    }

    /// Parse SVG path data (the `d` attribute)
    pub fn from_svg(data: &str) -> crate::Result<Self> {
        svg::parse(data)
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Current pen position
    pub fn current_point(&self) -> Point {
        self.cursor.last
    }

    /// Borrowed read-only view
    pub fn view(&self) -> PathView<'_> {
        PathView { path: self }
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = Cursor::default();
    }

    /// Append a raw command, keeping the pen state in sync
    pub fn push(&mut self, command: PathCommand) -> &mut Self {
        match command {
            PathCommand::MoveTo(p) => {
                self.cursor = Cursor {
                    last: p,
                    start: p,
                    knot: p,
                };
            }
            PathCommand::LineTo(p) => {
                self.cursor.last = p;
                self.cursor.knot = p;
            }
            PathCommand::CubicTo { control2, end, .. } => {
                self.cursor.last = end;
                self.cursor.knot = control2;
            }
            PathCommand::Close => {
                self.cursor.last = self.cursor.start;
                self.cursor.knot = self.cursor.start;
            }
            PathCommand::Winding(_) => {}
        }
        self.commands.push(command);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lines and curves
    // ─────────────────────────────────────────────────────────────────────────

    /// Move to a point, starting a new subpath
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.push(PathCommand::MoveTo(Point::new(x, y)))
    }

    pub fn move_to_rel(&mut self, dx: f32, dy: f32) -> &mut Self {
        let p = self.cursor.last;
        self.move_to(p.x + dx, p.y + dy)
    }

    /// Line to a point
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.push(PathCommand::LineTo(Point::new(x, y)))
    }

    pub fn line_to_rel(&mut self, dx: f32, dy: f32) -> &mut Self {
        let p = self.cursor.last;
        self.line_to(p.x + dx, p.y + dy)
    }

    pub fn horizontal_line_to(&mut self, x: f32) -> &mut Self {
        let y = self.cursor.last.y;
        self.line_to(x, y)
    }

    pub fn horizontal_line_to_rel(&mut self, dx: f32) -> &mut Self {
        let p = self.cursor.last;
        self.line_to(p.x + dx, p.y)
    }

    pub fn vertical_line_to(&mut self, y: f32) -> &mut Self {
        let x = self.cursor.last.x;
        self.line_to(x, y)
    }

    pub fn vertical_line_to_rel(&mut self, dy: f32) -> &mut Self {
        let p = self.cursor.last;
        self.line_to(p.x, p.y + dy)
    }

    /// Cubic Bézier curve
    pub fn cubic_to(&mut self, cx1: f32, cy1: f32, cx2: f32, cy2: f32, x: f32, y: f32) -> &mut Self {
        self.push(PathCommand::CubicTo {
            control1: Point::new(cx1, cy1),
            control2: Point::new(cx2, cy2),
            end: Point::new(x, y),
        })
    }

    pub fn cubic_to_rel(
        &mut self,
        cx1: f32,
        cy1: f32,
        cx2: f32,
        cy2: f32,
        x: f32,
        y: f32,
    ) -> &mut Self {
        let p = self.cursor.last;
        self.cubic_to(p.x + cx1, p.y + cy1, p.x + cx2, p.y + cy2, p.x + x, p.y + y)
    }

    /// Cubic whose first control point mirrors the previous curve's last one
    pub fn smooth_cubic_to(&mut self, cx2: f32, cy2: f32, x: f32, y: f32) -> &mut Self {
        let c1 = self.reflected_knot();
        self.cubic_to(c1.x, c1.y, cx2, cy2, x, y)
    }

    pub fn smooth_cubic_to_rel(&mut self, cx2: f32, cy2: f32, x: f32, y: f32) -> &mut Self {
        let p = self.cursor.last;
        let c1 = self.reflected_knot();
        self.cubic_to(c1.x, c1.y, p.x + cx2, p.y + cy2, p.x + x, p.y + y)
    }

    /// Quadratic Bézier curve, stored as the equivalent cubic
    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        let from = self.cursor.last;
        let c = Point::new(cx, cy);
        let to = Point::new(x, y);
        let c1 = from.lerp(c, 2.0 / 3.0);
        let c2 = to.lerp(c, 2.0 / 3.0);
        self.commands.push(PathCommand::CubicTo {
            control1: c1,
            control2: c2,
            end: to,
        });
        self.cursor.last = to;
        // Smooth quads reflect the quadratic control point, not the cubic one
        self.cursor.knot = c;
        self
    }

    pub fn quad_to_rel(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        let p = self.cursor.last;
        self.quad_to(p.x + cx, p.y + cy, p.x + x, p.y + y)
    }

    pub fn smooth_quad_to(&mut self, x: f32, y: f32) -> &mut Self {
        let c = self.reflected_knot();
        self.quad_to(c.x, c.y, x, y)
    }

    pub fn smooth_quad_to_rel(&mut self, x: f32, y: f32) -> &mut Self {
        let p = self.cursor.last;
        let c = self.reflected_knot();
        self.quad_to(c.x, c.y, p.x + x, p.y + y)
    }

    fn reflected_knot(&self) -> Point {
        let Cursor { last, knot, .. } = self.cursor;
        Point::new(last.x * 2.0 - knot.x, last.y * 2.0 - knot.y)
    }

    /// Close the current subpath
    pub fn close(&mut self) -> &mut Self {
        self.push(PathCommand::Close)
    }

    /// Override the orientation of the current subpath
    pub fn winding(&mut self, winding: Winding) -> &mut Self {
        self.push(PathCommand::Winding(winding))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shapes
    // ─────────────────────────────────────────────────────────────────────────

    /// Closed rectangle, wound top-left → bottom-left → bottom-right → top-right
    pub fn rect(&mut self, rect: Rect) -> &mut Self {
        let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
        self.move_to(l, t)
            .line_to(l, b)
            .line_to(r, b)
            .line_to(r, t)
            .close()
    }

    /// Rectangle with elliptical corners
    ///
    /// Radii are clamped to half the rectangle's extent; radii under 0.1 fall
    /// back to a plain rectangle.
    pub fn rounded_rect(&mut self, rect: Rect, rx: f32, ry: f32) -> &mut Self {
        if rx < 0.1 && ry < 0.1 {
            return self.rect(rect);
        }

        let (x, y, w, h) = (rect.x(), rect.y(), rect.width(), rect.height());
        let rx = rx.min(w.abs() * 0.5) * w.signum();
        let ry = ry.min(h.abs() * 0.5) * h.signum();
        let k = 1.0 - KAPPA90;

        self.move_to(x, y + ry)
            .line_to(x, y + h - ry)
            .cubic_to(x, y + h - ry * k, x + rx * k, y + h, x + rx, y + h)
            .line_to(x + w - rx, y + h)
            .cubic_to(x + w - rx * k, y + h, x + w, y + h - ry * k, x + w, y + h - ry)
            .line_to(x + w, y + ry)
            .cubic_to(x + w, y + ry * k, x + w - rx * k, y, x + w - rx, y)
            .line_to(x + rx, y)
            .cubic_to(x + rx * k, y, x, y + ry * k, x, y + ry)
            .close()
    }

    /// Closed ellipse made of four cubic quadrants
    pub fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) -> &mut Self {
        let kx = rx * KAPPA90;
        let ky = ry * KAPPA90;
        self.move_to(cx - rx, cy)
            .cubic_to(cx - rx, cy + ky, cx - kx, cy + ry, cx, cy + ry)
            .cubic_to(cx + kx, cy + ry, cx + rx, cy + ky, cx + rx, cy)
            .cubic_to(cx + rx, cy - ky, cx + kx, cy - ry, cx, cy - ry)
            .cubic_to(cx - kx, cy - ry, cx - rx, cy - ky, cx - rx, cy)
            .close()
    }

    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32) -> &mut Self {
        self.ellipse(cx, cy, radius, radius)
    }

    /// Single open segment
    pub fn line(&mut self, from: Point, to: Point) -> &mut Self {
        self.move_to(from.x, from.y).line_to(to.x, to.y)
    }

    /// Independent segments from consecutive point pairs; a trailing odd point is ignored
    pub fn lines(&mut self, points: &[Point]) -> &mut Self {
        for pair in points.chunks_exact(2) {
            self.line(pair[0], pair[1]);
        }
        self
    }

    /// Open polyline; fewer than two points appends nothing
    pub fn polyline(&mut self, points: &[Point]) -> &mut Self {
        if points.len() < 2 {
            return self;
        }
        self.move_to(points[0].x, points[0].y);
        for p in &points[1..] {
            self.line_to(p.x, p.y);
        }
        self
    }

    /// Closed polygon; fewer than two points appends nothing
    pub fn polygon(&mut self, points: &[Point]) -> &mut Self {
        if points.len() < 2 {
            return self;
        }
        self.polyline(points).close()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Whole-path operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the contents with a copy of `other`
    pub fn set(&mut self, other: &Path) -> &mut Self {
        self.commands.clear();
        self.commands.extend_from_slice(&other.commands);
        self.cursor = other.cursor;
        self
    }

    /// Append every command of `other`
    pub fn append(&mut self, other: &Path) -> &mut Self {
        for command in &other.commands {
            self.push(*command);
        }
        self
    }

    /// Append every command of `other`, mapped through `xform`
    pub fn append_transformed(&mut self, other: &Path, xform: &Affine2D) -> &mut Self {
        for command in &other.commands {
            self.push(command.transformed(xform));
        }
        self
    }

    /// Map every point through `xform` in place
    pub fn transform(&mut self, xform: &Affine2D) -> &mut Self {
        if xform.is_identity() {
            return self;
        }
        for command in &mut self.commands {
            *command = command.transformed(xform);
        }
        self.cursor = Cursor {
            last: xform.transform_point(self.cursor.last),
            start: xform.transform_point(self.cursor.start),
            knot: xform.transform_point(self.cursor.knot),
        };
        self
    }

    /// Transformed copy
    pub fn transformed(&self, xform: &Affine2D) -> Path {
        let mut path = self.clone();
        path.transform(xform);
        path
    }

    /// Exact bounding box of the geometry, including curve extrema
    pub fn bounds(&self) -> BoundingBox {
        measure::bounds(&self.commands, false)
    }

    /// Bounding box of all end and control points
    pub fn control_bounds(&self) -> BoundingBox {
        measure::bounds(&self.commands, true)
    }

    /// Signed area; positive for clockwise subpaths in a y-down space
    pub fn area(&self) -> f32 {
        measure::area(&self.commands)
    }

    /// Reverse the direction of every subpath
    pub fn reverse(&mut self) -> &mut Self {
        let reversed = reverse::reversed(&self.commands);
        self.clear();
        for command in reversed {
            self.push(command);
        }
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Read-only view
// ─────────────────────────────────────────────────────────────────────────────

/// Non-mutating view over a [`Path`]
#[derive(Clone, Copy, Debug)]
pub struct PathView<'a> {
    path: &'a Path,
}

impl<'a> PathView<'a> {
    pub fn commands(&self) -> &'a [PathCommand] {
        &self.path.commands
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.path.bounds()
    }

    pub fn control_bounds(&self) -> BoundingBox {
        self.path.control_bounds()
    }

    pub fn area(&self) -> f32 {
        self.path.area()
    }

    /// Owned copy that can be modified
    pub fn to_path(&self) -> Path {
        self.path.clone()
    }
}

impl<'a> From<&'a Path> for PathView<'a> {
    fn from(path: &'a Path) -> Self {
        path.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_commands() {
        let mut path = Path::new();
        path.rect(Rect::new(1.0, 2.0, 3.0, 4.0));

        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(Point::new(1.0, 2.0)),
                PathCommand::LineTo(Point::new(1.0, 6.0)),
                PathCommand::LineTo(Point::new(4.0, 6.0)),
                PathCommand::LineTo(Point::new(4.0, 2.0)),
                PathCommand::Close,
            ]
        );
        assert_eq!(path.current_point(), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_relative_commands_track_pen() {
        let mut path = Path::new();
        path.move_to(10.0, 10.0)
            .line_to_rel(5.0, 0.0)
            .vertical_line_to_rel(5.0)
            .horizontal_line_to(0.0);

        assert_eq!(path.current_point(), Point::new(0.0, 15.0));
        assert_eq!(path.commands()[1], PathCommand::LineTo(Point::new(15.0, 10.0)));
        assert_eq!(path.commands()[2], PathCommand::LineTo(Point::new(15.0, 15.0)));
    }

    #[test]
    fn test_quad_lowered_to_cubic() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).quad_to(3.0, 3.0, 6.0, 0.0);

        match path.commands()[1] {
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => {
                assert_eq!(control1, Point::new(2.0, 2.0));
                assert_eq!(control2, Point::new(4.0, 2.0));
                assert_eq!(end, Point::new(6.0, 0.0));
            }
            other => panic!("expected cubic, got {:?}", other),
        }
    }

    #[test]
    fn test_smooth_cubic_reflects_knot() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0)
            .cubic_to(0.0, 1.0, 1.0, 2.0, 2.0, 2.0)
            .smooth_cubic_to(4.0, 0.0, 4.0, 2.0);

        match path.commands()[2] {
            PathCommand::CubicTo { control1, .. } => {
                assert_eq!(control1, Point::new(3.0, 2.0));
            }
            other => panic!("expected cubic, got {:?}", other),
        }
    }

    #[test]
    fn test_smooth_quad_reflects_quad_control() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0)
            .quad_to(1.0, 1.0, 2.0, 0.0)
            .smooth_quad_to(4.0, 0.0);

        // Reflected control is (3, -1); first cubic control is 2/3 of the way there
        match path.commands()[2] {
            PathCommand::CubicTo { control1, .. } => {
                assert!((control1.x - (2.0 + 2.0 / 3.0)).abs() < 1e-5);
                assert!((control1.y - (-2.0 / 3.0)).abs() < 1e-5);
            }
            other => panic!("expected cubic, got {:?}", other),
        }
    }

    #[test]
    fn test_rounded_rect_falls_back_to_rect() {
        let mut rounded = Path::new();
        rounded.rounded_rect(Rect::new(0.0, 0.0, 10.0, 10.0), 0.05, 0.0);
        let mut plain = Path::new();
        plain.rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(rounded, plain);
    }

    #[test]
    fn test_rounded_rect_clamps_radii() {
        let mut path = Path::new();
        path.rounded_rect(Rect::new(0.0, 0.0, 10.0, 4.0), 8.0, 8.0);
        assert_eq!(path.commands()[0], PathCommand::MoveTo(Point::new(0.0, 2.0)));
        let bounds = path.bounds();
        assert!((bounds.max.x - 10.0).abs() < 1e-4);
        assert!((bounds.max.y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_polygon_requires_two_points() {
        let mut path = Path::new();
        path.polygon(&[Point::new(1.0, 1.0)]);
        assert!(path.is_empty());

        path.polygon(&[Point::ZERO, Point::new(1.0, 0.0), Point::new(0.0, 1.0)]);
        assert_eq!(path.len(), 4);
        assert_eq!(path.commands()[3], PathCommand::Close);
    }

    #[test]
    fn test_lines_are_independent_segments() {
        let mut path = Path::new();
        path.lines(&[
            Point::ZERO,
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(9.0, 9.0),
        ]);
        let moves = path
            .commands()
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_append_transformed() {
        let mut square = Path::new();
        square.rect(Rect::new(0.0, 0.0, 1.0, 1.0));

        let mut path = Path::new();
        path.append_transformed(&square, &Affine2D::translation(5.0, 5.0));
        let bounds = path.bounds();
        assert_eq!(bounds.min, Point::new(5.0, 5.0));
        assert_eq!(bounds.max, Point::new(6.0, 6.0));
    }

    #[test]
    fn test_view_is_read_only_copy() {
        let mut path = Path::new();
        path.circle(0.0, 0.0, 2.0);
        let view = path.view();
        assert_eq!(view.commands().len(), path.len());
        assert_eq!(view.bounds(), path.bounds());

        let mut owned = view.to_path();
        owned.clear();
        assert!(!path.is_empty());
    }
}

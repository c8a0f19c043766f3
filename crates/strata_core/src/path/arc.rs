//! Circular and elliptical arcs, lowered to cubic Béziers

use std::f32::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use super::{Path, DISTANCE_TOLERANCE};
use crate::geometry::{Affine2D, Direction, Point, Vec2};

/// How an arc shape is closed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcKind {
    /// Just the curve
    #[default]
    Open,
    /// Curve closed by a straight line between its end points
    Chord,
    /// Curve closed through the center
    Pie,
}

/// Sweep from `a0` to `a1` in `direction`, limited to one full turn
fn sweep_angle(a0: f32, a1: f32, direction: Direction) -> f32 {
    let mut da = a1 - a0;
    match direction {
        Direction::Clockwise => {
            if da.abs() >= TAU {
                da = TAU;
            } else {
                while da < 0.0 {
                    da += TAU;
                }
            }
        }
        Direction::CounterClockwise => {
            if da.abs() >= TAU {
                da = -TAU;
            } else {
                while da > 0.0 {
                    da -= TAU;
                }
            }
        }
    }
    da
}

/// Squared distance from `p` to the segment `a`–`b`
fn segment_distance_squared(p: Point, a: Point, b: Point) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let d = ab.length_squared();
    let mut t = ab.dot(ap);
    if d > 0.0 {
        t /= d;
    }
    let t = t.clamp(0.0, 1.0);
    a.lerp(b, t).distance_squared(p)
}

impl Path {
    /// Elliptical arc around `center` from angle `a0` to `a1` (radians)
    ///
    /// Starts with a `LineTo` when the path already has commands, otherwise
    /// with a `MoveTo`.
    pub fn arc(&mut self, center: Point, radii: Vec2, a0: f32, a1: f32, direction: Direction) -> &mut Self {
        let connect = !self.is_empty();
        self.append_arc(center, radii, (a0, a1), direction, connect)
    }

    fn append_arc(
        &mut self,
        center: Point,
        radii: Vec2,
        (a0, a1): (f32, f32),
        direction: Direction,
        connect: bool,
    ) -> &mut Self {
        let da = sweep_angle(a0, a1, direction);

        if da.is_nan() || da.abs() <= f32::EPSILON {
            let (dy, dx) = a0.sin_cos();
            let p = Point::new(center.x + dx * radii.x, center.y + dy * radii.y);
            tracing::trace!(a0, a1, "empty arc sweep, only the start point is added");
            if connect {
                self.line_to(p.x, p.y);
            } else {
                self.move_to(p.x, p.y);
            }
            return self;
        }

        // At most 90° per cubic
        let ndivs = ((da.abs() / FRAC_PI_2 + 0.5) as i32).clamp(1, 5);
        let hda = da / ndivs as f32 / 2.0;
        let mut kappa = (4.0 / 3.0 * (1.0 - hda.cos()) / hda.sin()).abs();
        if direction == Direction::CounterClockwise {
            kappa = -kappa;
        }

        let mut prev = Point::ZERO;
        let mut prev_tan = Vec2::ZERO;
        for i in 0..=ndivs {
            let a = a0 + da * (i as f32 / ndivs as f32);
            let (dy, dx) = a.sin_cos();
            let p = Point::new(center.x + dx * radii.x, center.y + dy * radii.y);
            let tan = Vec2::new(-dy * radii.x * kappa, dx * radii.y * kappa);

            if i == 0 {
                if connect {
                    self.line_to(p.x, p.y);
                } else {
                    self.move_to(p.x, p.y);
                }
            } else {
                let c1 = prev + prev_tan;
                let c2 = p - tan;
                self.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y);
            }

            prev = p;
            prev_tan = tan;
        }

        self
    }

    /// [`Path::arc`] with the center relative to the current point
    pub fn arc_rel(&mut self, center: Vec2, radii: Vec2, a0: f32, a1: f32, direction: Direction) -> &mut Self {
        let c = self.current_point() + center;
        self.arc(c, radii, a0, a1, direction)
    }

    /// Arc appended as a standalone shape
    pub fn arc_shape(
        &mut self,
        center: Point,
        radii: Vec2,
        a0: f32,
        a1: f32,
        direction: Direction,
        kind: ArcKind,
    ) -> &mut Self {
        match kind {
            ArcKind::Open => self.append_arc(center, radii, (a0, a1), direction, false),
            ArcKind::Chord => self
                .append_arc(center, radii, (a0, a1), direction, false)
                .close(),
            ArcKind::Pie => {
                self.move_to(center.x, center.y);
                self.append_arc(center, radii, (a0, a1), direction, true)
                    .line_to(center.x, center.y)
                    .close()
            }
        }
    }

    /// SVG elliptical arc (`A` command) from the current point to `end`
    pub fn svg_arc_to(
        &mut self,
        radii: Vec2,
        x_rotation_degrees: f32,
        large_arc: bool,
        sweep: bool,
        end: Point,
    ) -> &mut Self {
        let start = self.current_point();
        if start == end {
            return self;
        }

        if radii.x == 0.0 || radii.y == 0.0 {
            tracing::trace!(?radii, "zero-radius arc degenerates to a line");
            return self.line_to(end.x, end.y);
        }

        let mut rx = radii.x.abs();
        let mut ry = radii.y.abs();

        let angle = (x_rotation_degrees % 360.0).to_radians();
        let (sin_a, cos_a) = angle.sin_cos();

        // Start point in the ellipse's frame, relative to the chord midpoint
        let dx2 = (start.x - end.x) / 2.0;
        let dy2 = (start.y - end.y) / 2.0;
        let x1 = cos_a * dx2 + sin_a * dy2;
        let y1 = -sin_a * dx2 + cos_a * dy2;

        let mut rx_sq = rx * rx;
        let mut ry_sq = ry * ry;
        let x1_sq = x1 * x1;
        let y1_sq = y1 * y1;

        // Radii too small to span the chord are scaled up
        let radii_check = x1_sq / rx_sq + y1_sq / ry_sq;
        if radii_check > 1.0 {
            let s = radii_check.sqrt();
            rx *= s;
            ry *= s;
            rx_sq = rx * rx;
            ry_sq = ry * ry;
        }

        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        let sq = ((rx_sq * ry_sq - rx_sq * y1_sq - ry_sq * x1_sq) / (rx_sq * y1_sq + ry_sq * x1_sq))
            .max(0.0);
        let coef = sign * sq.sqrt();
        let cx1 = coef * (rx * y1 / ry);
        let cy1 = coef * -(ry * x1 / rx);

        let sx2 = (start.x + end.x) / 2.0;
        let sy2 = (start.y + end.y) / 2.0;
        let cx = sx2 + (cos_a * cx1 - sin_a * cy1);
        let cy = sy2 + (sin_a * cx1 + cos_a * cy1);

        let ux = (x1 - cx1) / rx;
        let uy = (y1 - cy1) / ry;
        let vx = (-x1 - cx1) / rx;
        let vy = (-y1 - cy1) / ry;

        let n = (ux * ux + uy * uy).sqrt();
        let sign = if uy < 0.0 { -1.0 } else { 1.0 };
        let mut angle_start = (sign * (ux / n).clamp(-1.0, 1.0).acos()).to_degrees();

        let n = ((ux * ux + uy * uy) * (vx * vx + vy * vy)).sqrt();
        let p = ux * vx + uy * vy;
        let sign = if ux * vy - uy * vx < 0.0 { -1.0 } else { 1.0 };
        let mut angle_extent = (sign * (p / n).clamp(-1.0, 1.0).acos()).to_degrees();
        if !sweep && angle_extent > 0.0 {
            angle_extent -= 360.0;
        } else if sweep && angle_extent < 0.0 {
            angle_extent += 360.0;
        }
        angle_extent %= 360.0;
        angle_start %= 360.0;

        let xform = Affine2D::translation(cx, cy)
            .pre_rotate(x_rotation_degrees.to_radians())
            .pre_scale(rx, ry);

        let segments = ((angle_extent.abs() / 90.0).ceil() as i32).max(1);
        let start_rad = angle_start.to_radians();
        let increment = angle_extent.to_radians() / segments as f32;
        let control = 4.0 / 3.0 * (increment / 2.0).sin() / (1.0 + (increment / 2.0).cos());

        for i in 0..segments {
            let a = start_rad + i as f32 * increment;
            let (dy, dx) = a.sin_cos();
            let c1 = xform.transform_point(Point::new(dx - control * dy, dy + control * dx));

            let a = a + increment;
            let (dy, dx) = a.sin_cos();
            let c2 = xform.transform_point(Point::new(dx + control * dy, dy - control * dx));

            // The final end point is pinned to avoid accumulated drift
            let to = if i < segments - 1 {
                xform.transform_point(Point::new(dx, dy))
            } else {
                end
            };
            self.cubic_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y);
        }

        self
    }

    /// [`Path::svg_arc_to`] with `end` relative to the current point
    pub fn svg_arc_to_rel(
        &mut self,
        radii: Vec2,
        x_rotation_degrees: f32,
        large_arc: bool,
        sweep: bool,
        end: Vec2,
    ) -> &mut Self {
        let to = self.current_point() + end;
        self.svg_arc_to(radii, x_rotation_degrees, large_arc, sweep, to)
    }

    /// Circular fillet of `radius` tangent to current→`p1` and `p1`→`p2`
    pub fn arc_to(&mut self, p1: Point, p2: Point, radius: f32) -> &mut Self {
        let p0 = self.current_point();

        let degenerate = radius < DISTANCE_TOLERANCE
            || p0.approx_eq(p1, DISTANCE_TOLERANCE)
            || p1.approx_eq(p2, DISTANCE_TOLERANCE)
            || segment_distance_squared(p1, p0, p2) < DISTANCE_TOLERANCE * DISTANCE_TOLERANCE;
        if degenerate {
            tracing::trace!(?p0, ?p1, ?p2, radius, "fillet degenerates to a line");
            return self.line_to(p1.x, p1.y);
        }

        let d0 = (p0 - p1).normalize();
        let d1 = (p2 - p1).normalize();
        let a = d0.dot(d1).clamp(-1.0, 1.0).acos();
        let d = radius / (a / 2.0).tan();

        if d > 10_000.0 {
            return self.line_to(p1.x, p1.y);
        }

        if d1.cross(d0) > 0.0 {
            let c = Point::new(p1.x + d0.x * d + d0.y * radius, p1.y + d0.y * d - d0.x * radius);
            let a0 = d0.x.atan2(-d0.y);
            let a1 = (-d1.x).atan2(d1.y);
            self.arc(c, Vec2::new(radius, radius), a0, a1, Direction::Clockwise)
        } else {
            let c = Point::new(p1.x + d0.x * d - d0.y * radius, p1.y + d0.y * d + d0.x * radius);
            let a0 = (-d0.x).atan2(d0.y);
            let a1 = d1.x.atan2(-d1.y);
            self.arc(c, Vec2::new(radius, radius), a0, a1, Direction::CounterClockwise)
        }
    }

    /// [`Path::arc_to`] with both points relative to the current point
    pub fn arc_to_rel(&mut self, p1: Vec2, p2: Vec2, radius: f32) -> &mut Self {
        let p = self.current_point();
        self.arc_to(p + p1, p + p2, radius)
    }
}

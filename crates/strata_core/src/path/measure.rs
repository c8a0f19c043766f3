//! Bounds and area queries

use smallvec::SmallVec;

use super::PathCommand;
use crate::geometry::{BoundingBox, Point};

/// Subdivision depth cap for area flattening
const AREA_MAX_DEPTH: u32 = 8;
/// Flatness tolerance for area flattening, independent of device scale
const AREA_TOLERANCE: f32 = 0.25;

/// Walk the commands and accumulate either the tight bounds or the control
/// point bounds
pub(super) fn bounds(commands: &[PathCommand], control_points: bool) -> BoundingBox {
    let mut out = BoundingBox::empty();
    let mut last = Point::ZERO;
    let mut start = Point::ZERO;
    let mut last_used = false;

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                last = p;
                start = p;
                last_used = false;
            }
            PathCommand::LineTo(p) => {
                if !last_used {
                    out.include(last);
                }
                out.include(p);
                last = p;
                last_used = true;
            }
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => {
                if !last_used {
                    out.include(last);
                }
                if control_points {
                    out.include(control1);
                    out.include(control2);
                } else {
                    for t in cubic_extrema(last, control1, control2, end) {
                        out.include(cubic_point(last, control1, control2, end, t));
                    }
                }
                out.include(end);
                last = end;
                last_used = true;
            }
            PathCommand::Close => {
                last = start;
            }
            PathCommand::Winding(_) => {}
        }
    }

    out
}

/// Parameters in (0, 1) where either coordinate of the cubic has a
/// vanishing derivative
fn cubic_extrema(p0: Point, p1: Point, p2: Point, p3: Point) -> SmallVec<[f32; 4]> {
    let mut roots = SmallVec::new();
    axis_extrema(p0.x, p1.x, p2.x, p3.x, &mut roots);
    axis_extrema(p0.y, p1.y, p2.y, p3.y, &mut roots);
    roots
}

fn axis_extrema(s: f32, c1: f32, c2: f32, e: f32, roots: &mut SmallVec<[f32; 4]>) {
    let a = -3.0 * s + 9.0 * c1 - 9.0 * c2 + 3.0 * e;
    let b = 6.0 * s - 12.0 * c1 + 6.0 * c2;
    let c = 3.0 * c1 - 3.0 * s;

    let mut push = |t: f32| {
        if t > 0.0 && t < 1.0 {
            roots.push(t);
        }
    };

    if a.abs() < 1e-12 {
        if b.abs() >= 1e-12 {
            push(-c / b);
        }
        return;
    }

    let disc = b * b - 4.0 * c * a;
    if disc < 0.0 {
        return;
    }
    let sq = disc.sqrt();
    push((-b + sq) / (2.0 * a));
    push((-b - sq) / (2.0 * a));
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let it = 1.0 - t;
    let w0 = it * it * it;
    let w1 = 3.0 * it * it * t;
    let w2 = 3.0 * it * t * t;
    let w3 = t * t * t;
    Point::new(
        w0 * p0.x + w1 * p1.x + w2 * p2.x + w3 * p3.x,
        w0 * p0.y + w1 * p1.y + w2 * p2.y + w3 * p3.y,
    )
}

/// Signed area of all subpaths, each implicitly closed
pub(super) fn area(commands: &[PathCommand]) -> f32 {
    let mut total = 0.0;
    let mut ring: Vec<Point> = Vec::new();
    let mut last = Point::ZERO;

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                total += shoelace(&ring);
                ring.clear();
                ring.push(p);
                last = p;
            }
            PathCommand::LineTo(p) => {
                if ring.is_empty() {
                    ring.push(last);
                }
                ring.push(p);
                last = p;
            }
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => {
                if ring.is_empty() {
                    ring.push(last);
                }
                flatten_cubic(last, control1, control2, end, 0, &mut ring);
                last = end;
            }
            PathCommand::Close | PathCommand::Winding(_) => {}
        }
    }

    total + shoelace(&ring)
}

fn flatten_cubic(p1: Point, p2: Point, p3: Point, p4: Point, level: u32, out: &mut Vec<Point>) {
    if level > AREA_MAX_DEPTH {
        return;
    }

    let d = p4 - p1;
    let d2 = ((p2.x - p4.x) * d.y - (p2.y - p4.y) * d.x).abs();
    let d3 = ((p3.x - p4.x) * d.y - (p3.y - p4.y) * d.x).abs();
    if level == AREA_MAX_DEPTH || (d2 + d3) * (d2 + d3) < AREA_TOLERANCE * d.length_squared() {
        out.push(p4);
        return;
    }

    let p12 = p1.midpoint(p2);
    let p23 = p2.midpoint(p3);
    let p34 = p3.midpoint(p4);
    let p123 = p12.midpoint(p23);
    let p234 = p23.midpoint(p34);
    let p1234 = p123.midpoint(p234);

    flatten_cubic(p1, p12, p123, p1234, level + 1, out);
    flatten_cubic(p1234, p234, p34, p4, level + 1, out);
}

fn shoelace(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let sum: f32 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    sum * 0.5
}

#[cfg(test)]
mod tests {
    use super::AREA_TOLERANCE;
    use crate::geometry::{Point, Rect};
    use crate::path::Path;

    #[test]
    fn test_bounds_include_curve_extrema() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).cubic_to(0.0, 10.0, 10.0, 10.0, 10.0, 0.0);

        let bounds = path.bounds();
        // Peak of the curve is at t = 0.5, y = 7.5
        assert!((bounds.max.y - 7.5).abs() < 1e-4);
        assert_eq!(bounds.min, Point::new(0.0, 0.0));

        let control = path.control_bounds();
        assert_eq!(control.max, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_bounds_ignore_lone_move_to() {
        let mut path = Path::new();
        path.move_to(-50.0, -50.0).move_to(1.0, 1.0).line_to(2.0, 3.0);

        let bounds = path.bounds();
        assert_eq!(bounds.min, Point::new(1.0, 1.0));
        assert_eq!(bounds.max, Point::new(2.0, 3.0));
        assert!(Path::new().bounds().is_empty());
    }

    #[test]
    fn test_rect_area_is_signed() {
        let mut path = Path::new();
        path.rect(Rect::new(0.0, 0.0, 4.0, 3.0));
        assert!((path.area() + 12.0).abs() < 1e-4);

        path.reverse();
        assert!((path.area() - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_area_sums_subpaths() {
        let mut path = Path::new();
        path.rect(Rect::new(0.0, 0.0, 2.0, 2.0))
            .rect(Rect::new(10.0, 10.0, 1.0, 1.0));
        assert!((path.area() + 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_circle_area() {
        // Chords of an accepted segment stay within 4/9 of the combined
        // control distance, which the tolerance caps at its square root
        let max_deviation = 4.0 / 9.0 * AREA_TOLERANCE.sqrt();

        for radius in [10.0_f32, 100.0] {
            let mut path = Path::new();
            path.circle(0.0, 0.0, radius);
            let expected = std::f32::consts::PI * radius * radius;
            let perimeter = std::f32::consts::TAU * radius;
            let area = path.area().abs();

            // Inscribed chords only lose area; the cubic circle bulges slightly
            assert!(area <= expected * 1.001);
            assert!(expected - area <= perimeter * max_deviation);
        }

        // The tolerance is absolute, so large circles are relatively exact
        let mut path = Path::new();
        path.circle(0.0, 0.0, 100.0);
        let expected = std::f32::consts::PI * 10_000.0;
        assert!((path.area().abs() - expected).abs() / expected < 0.01);
    }
}

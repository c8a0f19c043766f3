//! Bevel and round joins shared by the fill fringe and stroke strips

use std::f32::consts::{PI, TAU};

use strata_core::Point;

use crate::contour::{ContourPoint, PointFlags};
use crate::mesh::Vertex;

/// Which flags select a bevel and an inner bevel for a triangulator
#[derive(Clone, Copy, Debug)]
pub(crate) struct JoinFlags {
    pub bevel: PointFlags,
    pub inner_bevel: PointFlags,
}

impl JoinFlags {
    pub const FILL: JoinFlags = JoinFlags {
        bevel: PointFlags::FILL_BEVEL,
        inner_bevel: PointFlags::FILL_INNER_BEVEL,
    };

    pub const STROKE: JoinFlags = JoinFlags {
        bevel: PointFlags::BEVEL,
        inner_bevel: PointFlags::INNER_BEVEL,
    };
}

/// Strip edges on the side of a join.
///
/// An inner bevel offsets along each segment's own normal so short segments
/// do not overlap; otherwise both edges meet at the miter point.
fn choose_bevel(inner: bool, p0: &ContourPoint, p1: &ContourPoint, w: f32) -> (Point, Point) {
    if inner {
        (p1.pos + p0.dir.perp() * w, p1.pos + p1.dir.perp() * w)
    } else {
        let p = p1.pos + p1.dm * w;
        (p, p)
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn bevel_join(
    dst: &mut Vec<Vertex>,
    p0: &ContourPoint,
    p1: &ContourPoint,
    lw: f32,
    rw: f32,
    lu: f32,
    ru: f32,
    flags: JoinFlags,
) {
    let dl0 = p0.dir.perp();
    let dl1 = p1.dir.perp();
    let inner = p1.flags.intersects(flags.inner_bevel);
    let bevel = p1.flags.intersects(flags.bevel);

    if p1.is_left() {
        let (l0, l1) = choose_bevel(inner, p0, p1, lw);
        let r0 = p1.pos - dl0 * rw;
        let r1 = p1.pos - dl1 * rw;

        dst.push(Vertex::at(l0, lu, 1.0));
        dst.push(Vertex::at(r0, ru, 1.0));

        if bevel {
            dst.push(Vertex::at(l0, lu, 1.0));
            dst.push(Vertex::at(r0, ru, 1.0));

            dst.push(Vertex::at(l1, lu, 1.0));
            dst.push(Vertex::at(r1, ru, 1.0));
        } else {
            let rx0 = p1.pos - p1.dm * rw;

            dst.push(Vertex::at(p1.pos, 0.5, 1.0));
            dst.push(Vertex::at(r0, ru, 1.0));

            dst.push(Vertex::at(rx0, ru, 1.0));
            dst.push(Vertex::at(rx0, ru, 1.0));

            dst.push(Vertex::at(p1.pos, 0.5, 1.0));
            dst.push(Vertex::at(r1, ru, 1.0));
        }

        dst.push(Vertex::at(l1, lu, 1.0));
        dst.push(Vertex::at(r1, ru, 1.0));
    } else {
        let (r0, r1) = choose_bevel(inner, p0, p1, -rw);
        let l0 = p1.pos + dl0 * lw;
        let l1 = p1.pos + dl1 * lw;

        dst.push(Vertex::at(l0, lu, 1.0));
        dst.push(Vertex::at(r0, ru, 1.0));

        if bevel {
            dst.push(Vertex::at(l0, lu, 1.0));
            dst.push(Vertex::at(r0, ru, 1.0));

            dst.push(Vertex::at(l1, lu, 1.0));
            dst.push(Vertex::at(r1, ru, 1.0));
        } else {
            let lx0 = p1.pos + p1.dm * lw;

            dst.push(Vertex::at(l0, lu, 1.0));
            dst.push(Vertex::at(p1.pos, 0.5, 1.0));

            dst.push(Vertex::at(lx0, lu, 1.0));
            dst.push(Vertex::at(lx0, lu, 1.0));

            dst.push(Vertex::at(l1, lu, 1.0));
            dst.push(Vertex::at(p1.pos, 0.5, 1.0));
        }

        dst.push(Vertex::at(l1, lu, 1.0));
        dst.push(Vertex::at(r1, ru, 1.0));
    }
}

/// Number of fan points for a join turning by `sweep` radians
fn fan_points(sweep: f32, ncap: usize) -> usize {
    let n = (sweep / PI * ncap as f32).ceil() as usize;
    n.clamp(2, ncap.max(2))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn round_join(
    dst: &mut Vec<Vertex>,
    p0: &ContourPoint,
    p1: &ContourPoint,
    lw: f32,
    rw: f32,
    lu: f32,
    ru: f32,
    ncap: usize,
    flags: JoinFlags,
) {
    let dl0 = p0.dir.perp();
    let dl1 = p1.dir.perp();
    let inner = p1.flags.intersects(flags.inner_bevel);

    if p1.is_left() {
        let (l0, l1) = choose_bevel(inner, p0, p1, lw);
        let a0 = (-dl0.y).atan2(-dl0.x);
        let mut a1 = (-dl1.y).atan2(-dl1.x);
        if a1 > a0 {
            a1 -= TAU;
        }

        dst.push(Vertex::at(l0, lu, 1.0));
        dst.push(Vertex::at(p1.pos - dl0 * rw, ru, 1.0));

        let n = fan_points(a0 - a1, ncap);
        for i in 0..n {
            let t = i as f32 / (n - 1) as f32;
            let a = a0 + t * (a1 - a0);
            let rim = Point::new(p1.pos.x + a.cos() * rw, p1.pos.y + a.sin() * rw);

            dst.push(Vertex::at(p1.pos, 0.5, 1.0));
            dst.push(Vertex::at(rim, ru, 1.0));
        }

        dst.push(Vertex::at(l1, lu, 1.0));
        dst.push(Vertex::at(p1.pos - dl1 * rw, ru, 1.0));
    } else {
        let (r0, r1) = choose_bevel(inner, p0, p1, -rw);
        let a0 = dl0.y.atan2(dl0.x);
        let mut a1 = dl1.y.atan2(dl1.x);
        if a1 < a0 {
            a1 += TAU;
        }

        dst.push(Vertex::at(p1.pos + dl0 * rw, lu, 1.0));
        dst.push(Vertex::at(r0, ru, 1.0));

        let n = fan_points(a1 - a0, ncap);
        for i in 0..n {
            let t = i as f32 / (n - 1) as f32;
            let a = a0 + t * (a1 - a0);
            let rim = Point::new(p1.pos.x + a.cos() * lw, p1.pos.y + a.sin() * lw);

            dst.push(Vertex::at(rim, lu, 1.0));
            dst.push(Vertex::at(p1.pos, 0.5, 1.0));
        }

        dst.push(Vertex::at(p1.pos + dl1 * rw, lu, 1.0));
        dst.push(Vertex::at(r1, ru, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Vec2;

    fn corner(pos: Point, dir: Vec2, flags: PointFlags, dm: Vec2) -> ContourPoint {
        ContourPoint {
            pos,
            dir,
            length: 10.0,
            dm,
            flags,
        }
    }

    /// Heading right, then turning down at (10, 0)
    fn right_turn() -> (ContourPoint, ContourPoint) {
        let p0 = corner(Point::ZERO, Vec2::new(1.0, 0.0), PointFlags::CORNER, Vec2::ZERO);
        let p1 = corner(
            Point::new(10.0, 0.0),
            Vec2::new(0.0, 1.0),
            PointFlags::CORNER | PointFlags::BEVEL,
            Vec2::new(1.0, -1.0),
        );
        (p0, p1)
    }

    #[test]
    fn test_round_join_fan_spans_join_angle() {
        let (p0, p1) = right_turn();
        let w = 2.0;
        let mut dst = Vec::new();
        round_join(&mut dst, &p0, &p1, w, w, 0.0, 1.0, 8, JoinFlags::STROKE);

        let angles: Vec<f32> = dst
            .iter()
            .filter(|v| v.u == 0.0)
            .map(|v| (v.y - p1.pos.y).atan2(v.x - p1.pos.x))
            .collect();
        let first = angles[0];
        let last = angles[angles.len() - 1];

        assert!((first + PI / 2.0).abs() < 1e-5);
        assert!(last.abs() < 1e-5);
        // The fan is monotonic and covers exactly the quarter turn
        assert!(angles.windows(2).all(|w| w[1] >= w[0] - 1e-5));
        assert!(((last - first) - PI / 2.0).abs() < 1e-5);

        // Every rim vertex lies on the join circle
        for v in dst.iter().filter(|v| v.u == 0.0) {
            assert!((v.position().distance(p1.pos) - w).abs() < 1e-4);
        }
    }

    #[test]
    fn test_round_join_point_count() {
        let (p0, p1) = right_turn();
        let mut dst = Vec::new();
        round_join(&mut dst, &p0, &p1, 1.0, 1.0, 0.0, 1.0, 8, JoinFlags::STROKE);
        // 2 + 2 * ceil(0.5 * 8) + 2
        assert_eq!(dst.len(), 12);
    }

    #[test]
    fn test_bevel_join_outer_edge() {
        let (p0, p1) = right_turn();
        let mut dst = Vec::new();
        bevel_join(&mut dst, &p0, &p1, 1.0, 1.0, 0.0, 1.0, JoinFlags::STROKE);

        assert_eq!(dst.len(), 8);
        // Outer edge follows each segment's normal
        assert_eq!(dst[0].position(), Point::new(10.0, -1.0));
        assert_eq!(dst[6].position(), Point::new(11.0, 0.0));
        // Inner edge meets at the miter point
        assert_eq!(dst[1].position(), Point::new(9.0, 1.0));
        assert!(dst.iter().all(|v| v.v == 1.0));
    }

    #[test]
    fn test_miter_fallback_without_bevel_flag() {
        let (p0, mut p1) = right_turn();
        p1.flags = PointFlags::CORNER | PointFlags::FILL_INNER_BEVEL;
        let mut dst = Vec::new();
        bevel_join(&mut dst, &p0, &p1, 1.0, 1.0, 0.0, 1.0, JoinFlags::FILL);
        assert_eq!(dst.len(), 10);
        assert!(dst.iter().any(|v| v.u == 0.5 && v.position() == p1.pos));
    }
}

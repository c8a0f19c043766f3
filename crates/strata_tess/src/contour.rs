//! Contour construction
//!
//! Flattens path commands into polylines ("contours") and annotates every
//! point with the data the triangulators need: direction and length of the
//! outgoing segment, the miter extrusion vector and join flags.

use bitflags::bitflags;
use strata_core::{Affine2D, BoundingBox, LineJoin, Path, PathCommand, Point, Vec2, Winding};

use crate::config::TessellationContext;

/// Maximum De Casteljau subdivision depth
const MAX_BEZIER_DEPTH: u32 = 10;

/// Upper bound on the miter extrusion scale
const MAX_EXTRUSION_SCALE: f32 = 600.0;

bitflags! {
    /// Per-point tessellation flags
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PointFlags: u8 {
        /// End point of a path segment (not a curve subdivision)
        const CORNER = 1 << 0;
        /// The path turns left at this point
        const LEFT = 1 << 1;
        /// The stroke needs a bevel or round join here
        const BEVEL = 1 << 2;
        /// Adjacent segments are too short for a stroke miter
        const INNER_BEVEL = 1 << 3;
        /// The fill fringe needs a bevel here
        const FILL_BEVEL = 1 << 4;
        /// Adjacent segments are too short for a fill fringe miter
        const FILL_INNER_BEVEL = 1 << 5;
    }
}

/// A flattened point with its join annotations
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContourPoint {
    pub pos: Point,
    /// Unit direction towards the next point
    pub dir: Vec2,
    /// Distance to the next point
    pub length: f32,
    /// Miter extrusion vector
    pub dm: Vec2,
    pub flags: PointFlags,
}

impl ContourPoint {
    pub fn new(pos: Point, flags: PointFlags) -> Self {
        Self {
            pos,
            flags,
            ..Default::default()
        }
    }

    pub fn is_left(&self) -> bool {
        self.flags.contains(PointFlags::LEFT)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Contour
// ─────────────────────────────────────────────────────────────────────────────

/// One flattened subpath
#[derive(Clone, Debug, Default)]
pub struct Contour {
    points: Vec<ContourPoint>,
    closed: bool,
    convex: bool,
    winding: Option<Winding>,
    bounds: BoundingBox,
}

impl Contour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contour from raw positions, every point flagged as a corner
    pub fn from_points(points: &[Point], closed: bool, ctx: &TessellationContext) -> Self {
        Self::from_flagged_points(
            points.iter().map(|p| (*p, PointFlags::CORNER)),
            closed,
            ctx,
        )
    }

    /// Refined contour from positions with their initial flags
    pub(crate) fn from_flagged_points<I>(points: I, closed: bool, ctx: &TessellationContext) -> Self
    where
        I: IntoIterator<Item = (Point, PointFlags)>,
    {
        let mut contour = Self {
            closed,
            winding: ctx.winding,
            ..Default::default()
        };
        for (p, flags) in points {
            contour.add_point(p, flags, ctx.distance_tolerance);
        }
        contour.refine(ctx);
        contour
    }

    pub fn points(&self) -> &[ContourPoint] {
        &self.points
    }

    /// Point at `index`; panics when out of range
    pub fn point(&self, index: usize) -> &ContourPoint {
        &self.points[index]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_convex(&self) -> bool {
        self.convex
    }

    pub fn winding(&self) -> Option<Winding> {
        self.winding
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Signed shoelace area; negative for counter-clockwise contours in a
    /// y-down space
    pub fn area(&self) -> f32 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let sum: f32 = (0..n)
            .map(|i| {
                let a = self.points[i].pos;
                let b = self.points[(i + 1) % n].pos;
                a.x * b.y - b.x * a.y
            })
            .sum();
        sum * 0.5
    }

    pub(crate) fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    pub(crate) fn set_winding(&mut self, winding: Option<Winding>) {
        self.winding = winding;
    }

    fn last_position(&self) -> Option<Point> {
        self.points.last().map(|p| p.pos)
    }

    /// Append a point, merging it into the previous one when closer than
    /// `tolerance`
    pub(crate) fn add_point(&mut self, pos: Point, flags: PointFlags, tolerance: f32) {
        if let Some(last) = self.points.last_mut() {
            if last.pos.approx_eq(pos, tolerance) {
                last.flags |= flags;
                return;
            }
        }
        self.points.push(ContourPoint::new(pos, flags));
    }

    /// Run once after the last point was added
    pub(crate) fn refine(&mut self, ctx: &TessellationContext) {
        if self.points.is_empty() {
            return;
        }
        self.enforce_winding();
        self.try_close(ctx.distance_tolerance);
        self.compute_point_properties(ctx);
    }

    fn enforce_winding(&mut self) {
        if self.points.len() <= 2 {
            return;
        }
        let area = self.area();
        let reverse = match self.winding {
            Some(Winding::CounterClockwise) => area > 0.0,
            Some(Winding::Clockwise) => area < 0.0,
            None => false,
        };
        if reverse {
            self.points.reverse();
        }
    }

    /// Drop a trailing point that repeats the first one and mark closed
    fn try_close(&mut self, tolerance: f32) {
        if self.points.len() < 2 {
            return;
        }
        let first = self.points[0].pos;
        let last = self.points[self.points.len() - 1].pos;
        if last.approx_eq(first, tolerance) {
            self.points.pop();
            self.closed = true;
        }
    }

    fn compute_point_properties(&mut self, ctx: &TessellationContext) {
        let n = self.points.len();
        let inv_fill_width = inverse_width(ctx.fill_width());
        let inv_stroke_width = inverse_width(ctx.stroke_half_width());

        self.bounds = BoundingBox::empty();
        for i in 0..n {
            let next = self.points[(i + 1) % n].pos;
            let p = &mut self.points[i];
            let mut dir = next - p.pos;
            p.length = dir.normalize_mut();
            p.dir = dir;
            self.bounds.include(p.pos);
        }

        let mut left_turns = 0;
        let mut right_turns = 0;
        for i in 0..n {
            let prev = self.points[(i + n - 1) % n];
            let cur = &mut self.points[i];

            // Average of the left normals, scaled so that it reaches the
            // miter corner of a unit-width offset
            let mut dm = (prev.dir.perp() + cur.dir.perp()) * 0.5;
            let dmr2 = dm.length_squared();
            if dmr2 > 1e-6 {
                dm = dm * (1.0 / dmr2).min(MAX_EXTRUSION_SCALE);
            }
            cur.dm = dm;

            let min_length = prev.length.min(cur.length);
            let limit = (min_length * inv_stroke_width).max(1.01);
            if dmr2 * limit * limit < 1.0 {
                cur.flags |= PointFlags::INNER_BEVEL;
            }
            let limit = (min_length * inv_fill_width).max(1.01);
            if dmr2 * limit * limit < 1.0 {
                cur.flags |= PointFlags::FILL_INNER_BEVEL;
            }

            if cur.flags.contains(PointFlags::CORNER) {
                if matches!(ctx.line_join, LineJoin::Bevel | LineJoin::Round) {
                    cur.flags |= PointFlags::BEVEL | PointFlags::FILL_BEVEL;
                } else if dmr2 * ctx.miter_limit * ctx.miter_limit < 1.0 {
                    cur.flags |= PointFlags::BEVEL;
                } else if dmr2 * ctx.fill_miter_limit * ctx.fill_miter_limit < 1.0 {
                    cur.flags |= PointFlags::FILL_BEVEL;
                }
            }

            let cross = cur.dir.x * prev.dir.y - prev.dir.x * cur.dir.y;
            if cross > 0.0 {
                cur.flags |= PointFlags::LEFT;
                left_turns += 1;
            } else if cross < 0.0 {
                right_turns += 1;
            }
        }

        self.convex = left_turns == n || right_turns == n;
    }
}

fn inverse_width(width: f32) -> f32 {
    if width > 0.0 {
        1.0 / width
    } else {
        0.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Mesh
// ─────────────────────────────────────────────────────────────────────────────

/// A path flattened into refined contours
#[derive(Clone, Debug, Default)]
pub struct PathMesh {
    contours: Vec<Contour>,
    bounds: BoundingBox,
}

/// Incremental contour builder state
struct Builder<'a> {
    ctx: &'a TessellationContext,
    contours: Vec<Contour>,
    bounds: BoundingBox,
    current: Contour,
    started: bool,
}

impl<'a> Builder<'a> {
    fn new(ctx: &'a TessellationContext) -> Self {
        Self {
            ctx,
            contours: Vec::new(),
            bounds: BoundingBox::empty(),
            current: Self::fresh_contour(ctx),
            started: false,
        }
    }

    fn fresh_contour(ctx: &TessellationContext) -> Contour {
        let mut contour = Contour::new();
        contour.set_winding(ctx.winding);
        contour
    }

    fn finish_contour(&mut self) {
        let mut contour = std::mem::replace(&mut self.current, Self::fresh_contour(self.ctx));
        if contour.len() < 2 {
            if !contour.is_empty() {
                tracing::trace!("dropping single-point contour");
            }
            return;
        }
        contour.refine(self.ctx);
        self.bounds.union(&contour.bounds());
        self.contours.push(contour);
    }

    fn add_point(&mut self, p: Point, flags: PointFlags) {
        self.current
            .add_point(p, flags, self.ctx.distance_tolerance);
    }

    /// Segments before any move start from the origin
    fn ensure_started(&mut self) {
        if !self.started {
            self.add_point(Point::ZERO, PointFlags::CORNER);
            self.started = true;
        }
    }

    fn command(&mut self, command: PathCommand) {
        match command {
            PathCommand::MoveTo(p) => {
                if self.started {
                    self.finish_contour();
                } else {
                    self.started = true;
                }
                self.add_point(p, PointFlags::CORNER);
            }
            PathCommand::LineTo(p) => {
                self.ensure_started();
                self.add_point(p, PointFlags::CORNER);
            }
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => {
                self.ensure_started();
                let from = self.current.last_position().unwrap_or(Point::ZERO);
                self.flatten_cubic(from, control1, control2, end, 0, PointFlags::CORNER);
            }
            PathCommand::Close => self.current.set_closed(true),
            PathCommand::Winding(w) => self.current.set_winding(Some(w)),
        }
    }

    fn flatten_cubic(
        &mut self,
        p1: Point,
        p2: Point,
        p3: Point,
        p4: Point,
        level: u32,
        flags: PointFlags,
    ) {
        if level > MAX_BEZIER_DEPTH {
            return;
        }

        let d = p4 - p1;
        let d2 = ((p2.x - p4.x) * d.y - (p2.y - p4.y) * d.x).abs();
        let d3 = ((p3.x - p4.x) * d.y - (p3.y - p4.y) * d.x).abs();
        if level == MAX_BEZIER_DEPTH
            || (d2 + d3) * (d2 + d3) < self.ctx.tessellation_tolerance * d.length_squared()
        {
            self.add_point(p4, flags);
            return;
        }

        let p12 = p1.midpoint(p2);
        let p23 = p2.midpoint(p3);
        let p34 = p3.midpoint(p4);
        let p123 = p12.midpoint(p23);
        let p234 = p23.midpoint(p34);
        let p1234 = p123.midpoint(p234);

        self.flatten_cubic(p1, p12, p123, p1234, level + 1, PointFlags::empty());
        self.flatten_cubic(p1234, p234, p34, p4, level + 1, flags);
    }

    fn finish(mut self) -> PathMesh {
        self.finish_contour();
        PathMesh {
            contours: self.contours,
            bounds: self.bounds,
        }
    }
}

impl PathMesh {
    /// Flatten commands that are already in device space
    pub fn from_commands<I>(commands: I, ctx: &TessellationContext) -> Self
    where
        I: IntoIterator<Item = PathCommand>,
    {
        let mut builder = Builder::new(ctx);
        for command in commands {
            builder.command(command);
        }
        let mesh = builder.finish();
        tracing::trace!(
            contours = mesh.contours.len(),
            points = mesh.point_count(),
            "path flattened"
        );
        mesh
    }

    /// Flatten `path` after mapping it through `xform`
    pub fn from_path(path: &Path, xform: &Affine2D, ctx: &TessellationContext) -> Self {
        Self::from_commands(
            path.commands().iter().map(|c| c.transformed(xform)),
            ctx,
        )
    }

    /// Mesh made of already-built contours
    pub fn from_contours(contours: Vec<Contour>) -> Self {
        let mut bounds = BoundingBox::empty();
        for c in &contours {
            bounds.union(&c.bounds());
        }
        Self { contours, bounds }
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// A single convex contour can be filled without stenciling
    pub fn is_convex(&self) -> bool {
        self.contours.len() == 1 && self.contours[0].is_convex()
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(Contour::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TessellationConfig;
    use strata_core::{Rect, Stroke};

    fn ctx() -> TessellationContext {
        TessellationContext::new(&TessellationConfig::default())
    }

    #[test]
    fn test_rect_contour() {
        let mut path = Path::new();
        path.rect(Rect::new(0.0, 0.0, 10.0, 5.0));
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx());

        assert_eq!(mesh.contours().len(), 1);
        let contour = &mesh.contours()[0];
        assert_eq!(contour.len(), 4);
        assert!(contour.is_closed());
        assert!(contour.is_convex());
        assert!(mesh.is_convex());
        assert_eq!(mesh.bounds().max, Point::new(10.0, 5.0));

        // Down, right, up, left
        assert_eq!(contour.point(0).dir, Vec2::new(0.0, 1.0));
        assert_eq!(contour.point(0).length, 5.0);
        assert!(contour.points().iter().all(|p| p.is_left()));
        // Right-angle miter vector reaches the corner of a unit offset
        let dm = contour.point(1).dm;
        assert!((dm.x - 1.0).abs() < 1e-5 && (dm.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_convex_area_matches_shoelace() {
        let mut path = Path::new();
        path.circle(50.0, 50.0, 20.0);
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx());
        let contour = &mesh.contours()[0];
        assert!(contour.is_convex());

        let pts = contour.points();
        let n = pts.len();
        let mut twice_area = 0.0;
        for i in 0..n {
            let a = pts[i].pos;
            let b = pts[(i + 1) % n].pos;
            twice_area += a.x * b.y - b.x * a.y;
        }
        assert!((contour.area() - twice_area * 0.5).abs() < 1e-2);
        let expected = std::f32::consts::PI * 400.0;
        assert!((contour.area().abs() - expected).abs() / expected < 0.03);
    }

    #[test]
    fn test_clockwise_contour_is_convex() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .line_to(10.0, 10.0)
            .line_to(0.0, 10.0)
            .close();
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx());
        let contour = &mesh.contours()[0];
        assert!(contour.is_convex());
        assert!(contour.points().iter().all(|p| !p.is_left()));
    }

    #[test]
    fn test_concave_contour() {
        let mut path = Path::new();
        path.polygon(&[
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(5.0, 5.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ]);
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx());
        assert!(!mesh.is_convex());
    }

    #[test]
    fn test_collinear_cubic_flattens_to_collinear_points() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0)
            .cubic_to(10.0, 10.0, 20.0, 20.0, 30.0, 30.0);
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx());
        for p in mesh.contours()[0].points() {
            assert!((p.pos.x - p.pos.y).abs() < 1e-4);
        }
    }

    #[test]
    fn test_curve_points_are_not_corners() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0)
            .cubic_to(0.0, 50.0, 50.0, 50.0, 50.0, 0.0);
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx());
        let points = mesh.contours()[0].points();
        assert!(points.len() > 4);
        assert!(points[0].flags.contains(PointFlags::CORNER));
        assert!(points[points.len() - 1].flags.contains(PointFlags::CORNER));
        assert!(points[1..points.len() - 1]
            .iter()
            .all(|p| !p.flags.contains(PointFlags::CORNER)));
    }

    #[test]
    fn test_close_points_merge() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0)
            .line_to(0.05, 0.0)
            .line_to(10.0, 0.0);
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx());
        assert_eq!(mesh.contours()[0].len(), 2);
    }

    #[test]
    fn test_implicit_start_and_trailing_point() {
        let mut path = Path::new();
        path.line_to(10.0, 0.0).line_to(10.0, 10.0).line_to(0.0, 0.0);
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx());
        let contour = &mesh.contours()[0];
        assert_eq!(contour.point(0).pos, Point::ZERO);
        // Last point repeats the first: dropped, contour closed
        assert_eq!(contour.len(), 3);
        assert!(contour.is_closed());
    }

    #[test]
    fn test_winding_override_reverses() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .line_to(10.0, 10.0)
            .winding(Winding::CounterClockwise)
            .close();
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx());
        assert!(mesh.contours()[0].area() < 0.0);

        let ctx = ctx().with_winding(Some(Winding::Clockwise));
        let mut path = Path::new();
        path.rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx);
        assert!(mesh.contours()[0].area() > 0.0);
    }

    #[test]
    fn test_bevel_join_flags() {
        let ctx = ctx().with_stroke(&Stroke::new(2.0).with_join(LineJoin::Bevel));
        let mut path = Path::new();
        path.polyline(&[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]);
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx);
        let corner = mesh.contours()[0].point(1);
        assert!(corner.flags.contains(PointFlags::BEVEL | PointFlags::FILL_BEVEL));

        // A right angle needs a miter limit of at least sqrt(2)
        let ctx = TessellationContext::default().with_stroke(&Stroke::new(2.0).with_miter_limit(1.2));
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx);
        assert!(mesh.contours()[0].point(1).flags.contains(PointFlags::BEVEL));
    }

    #[test]
    fn test_transform_applied() {
        let mut path = Path::new();
        path.rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let mesh = PathMesh::from_path(&path, &Affine2D::scale(10.0, 10.0), &ctx());
        assert_eq!(mesh.bounds().max, Point::new(10.0, 10.0));
    }

    #[test]
    #[should_panic]
    fn test_point_out_of_range_panics() {
        let contour = Contour::new();
        let _ = contour.point(3);
    }
}

//! Stroke triangulation
//!
//! Every contour becomes one triangle strip running along its outline, with
//! joins at flagged corners and caps at the ends of open contours.

use std::f32::consts::PI;

use strata_core::{LineCap, LineJoin, Point, Vec2};

use crate::config::TessellationContext;
use crate::contour::{Contour, ContourPoint, PathMesh, PointFlags};
use crate::dash::Dasher;
use crate::join::{bevel_join, round_join, JoinFlags};
use crate::mesh::{Mesh, Vertex};

/// Triangulated stroke of a whole path
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeGeometry {
    /// One strip-only mesh per contour with at least two points
    pub meshes: Vec<Mesh>,
    /// Half-width handed to the shader, never below one fringe
    pub half_width: f32,
    /// Coverage factor for strokes thinner than a fringe
    pub alpha_scale: f32,
}

impl StrokeGeometry {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }
}

/// Shader half-width and alpha factor for the context's stroke.
///
/// Hairlines are widened to one fringe and faded by their coverage squared.
pub fn stroke_coverage(ctx: &TessellationContext) -> (f32, f32) {
    let w = ctx.stroke_half_width();
    let fringe = ctx.fringe_width;
    if w < fringe {
        let alpha = (w / fringe).clamp(0.0, 1.0);
        (fringe, alpha * alpha)
    } else {
        (w, 1.0)
    }
}

/// Fragments per semicircle for round caps and joins; 0 when neither is
/// round
pub fn cap_fragments(ctx: &TessellationContext, w: f32) -> usize {
    if ctx.line_cap != LineCap::Round && ctx.line_join != LineJoin::Round {
        return 0;
    }
    let da = (w / (w + ctx.tessellation_tolerance)).acos() * 2.0;
    ((PI / da).ceil() as usize).max(2)
}

impl PathMesh {
    /// Triangulate every contour as a solid stroke
    pub fn stroke(&self, ctx: &TessellationContext) -> StrokeGeometry {
        self.stroke_contours(self.contours(), ctx)
    }

    /// Split every contour into dashes, then stroke the dashes
    pub fn stroke_dashed(&self, ctx: &TessellationContext, dasher: &Dasher) -> StrokeGeometry {
        let dashes: Vec<Contour> = self
            .contours()
            .iter()
            .flat_map(|c| dasher.dash_contour(c, ctx))
            .collect();
        tracing::trace!(
            contours = self.contours().len(),
            dashes = dashes.len(),
            "stroke dashed"
        );
        self.stroke_contours(&dashes, ctx)
    }

    fn stroke_contours(&self, contours: &[Contour], ctx: &TessellationContext) -> StrokeGeometry {
        let w = ctx.stroke_half_width();
        let ncap = cap_fragments(ctx, w);
        let meshes: Vec<Mesh> = contours
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| stroke_contour_with(c, ctx, w, ncap))
            .collect();
        let (half_width, alpha_scale) = stroke_coverage(ctx);

        tracing::trace!(meshes = meshes.len(), half_width, ncap, "stroke triangulated");

        StrokeGeometry {
            meshes,
            half_width,
            alpha_scale,
        }
    }
}

/// Strip of one contour with the context's stroke style
pub fn stroke_contour(contour: &Contour, ctx: &TessellationContext) -> Mesh {
    let w = ctx.stroke_half_width();
    stroke_contour_with(contour, ctx, w, cap_fragments(ctx, w))
}

fn stroke_contour_with(contour: &Contour, ctx: &TessellationContext, w: f32, ncap: usize) -> Mesh {
    let points = contour.points();
    let n = points.len();
    let mut strip = Vec::new();
    if n < 2 {
        return Mesh::new();
    }

    let aa = ctx.fill_width();
    let (mut p0, mut p1, start, end) = if contour.is_closed() {
        (&points[n - 1], &points[0], 0, n)
    } else {
        let (p0, p1) = (&points[0], &points[1]);
        add_start_cap(&mut strip, ctx.line_cap, p0.pos, direction(p0.pos, p1.pos), w, ncap, aa);
        (p0, p1, 1, n - 1)
    };

    for j in start..end {
        add_stroke_vertices(&mut strip, ctx.line_join, p0, p1, w, ncap);
        p0 = p1;
        p1 = if j + 1 < n { &points[j + 1] } else { &points[0] };
    }

    if contour.is_closed() {
        let first = strip[0].position();
        let second = strip[1].position();
        strip.push(Vertex::at(first, 0.0, 1.0));
        strip.push(Vertex::at(second, 1.0, 1.0));
    } else {
        add_end_cap(&mut strip, ctx.line_cap, p1.pos, direction(p0.pos, p1.pos), w, ncap, aa);
    }

    Mesh {
        fan: Vec::new(),
        strip,
    }
}

fn direction(from: Point, to: Point) -> Vec2 {
    (to - from).normalize()
}

fn add_stroke_vertices(
    strip: &mut Vec<Vertex>,
    join: LineJoin,
    p0: &ContourPoint,
    p1: &ContourPoint,
    w: f32,
    ncap: usize,
) {
    if p1
        .flags
        .intersects(PointFlags::BEVEL | PointFlags::INNER_BEVEL)
    {
        if join == LineJoin::Round {
            round_join(strip, p0, p1, w, w, 0.0, 1.0, ncap, JoinFlags::STROKE);
        } else {
            bevel_join(strip, p0, p1, w, w, 0.0, 1.0, JoinFlags::STROKE);
        }
    } else {
        strip.push(Vertex::at(p1.pos + p1.dm * w, 0.0, 1.0));
        strip.push(Vertex::at(p1.pos - p1.dm * w, 1.0, 1.0));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Caps
// ─────────────────────────────────────────────────────────────────────────────

fn add_start_cap(
    strip: &mut Vec<Vertex>,
    cap: LineCap,
    p: Point,
    dir: Vec2,
    w: f32,
    ncap: usize,
    aa: f32,
) {
    match cap {
        LineCap::Butt => butt_cap_start(strip, p, dir, w, -aa * 0.5, aa),
        LineCap::Square => butt_cap_start(strip, p, dir, w, w - aa, aa),
        LineCap::Round => round_cap_start(strip, p, dir, w, ncap),
    }
}

fn add_end_cap(
    strip: &mut Vec<Vertex>,
    cap: LineCap,
    p: Point,
    dir: Vec2,
    w: f32,
    ncap: usize,
    aa: f32,
) {
    match cap {
        LineCap::Butt => butt_cap_end(strip, p, dir, w, -aa * 0.5, aa),
        LineCap::Square => butt_cap_end(strip, p, dir, w, w - aa, aa),
        LineCap::Round => round_cap_end(strip, p, dir, w, ncap),
    }
}

/// `d` pushes the cap edge out along the direction, `aa` adds a fringe
/// beyond it
fn butt_cap_start(strip: &mut Vec<Vertex>, p: Point, dir: Vec2, w: f32, d: f32, aa: f32) {
    let (dx, dy) = (dir.x, dir.y);
    let px = p.x - dx * d;
    let py = p.y - dy * d;

    strip.push(Vertex::new(px + dy * w - dx * aa, py - dx * w - dy * aa, 0.0, 0.0));
    strip.push(Vertex::new(px - dy * w - dx * aa, py + dx * w - dy * aa, 1.0, 0.0));
    strip.push(Vertex::new(px + dy * w, py - dx * w, 0.0, 1.0));
    strip.push(Vertex::new(px - dy * w, py + dx * w, 1.0, 1.0));
}

fn butt_cap_end(strip: &mut Vec<Vertex>, p: Point, dir: Vec2, w: f32, d: f32, aa: f32) {
    let (dx, dy) = (dir.x, dir.y);
    let px = p.x + dx * d;
    let py = p.y + dy * d;

    strip.push(Vertex::new(px + dy * w, py - dx * w, 0.0, 1.0));
    strip.push(Vertex::new(px - dy * w, py + dx * w, 1.0, 1.0));
    strip.push(Vertex::new(px + dy * w + dx * aa, py - dx * w + dy * aa, 0.0, 0.0));
    strip.push(Vertex::new(px - dy * w + dx * aa, py + dx * w + dy * aa, 1.0, 0.0));
}

fn round_cap_start(strip: &mut Vec<Vertex>, p: Point, dir: Vec2, w: f32, ncap: usize) {
    let (dx, dy) = (dir.x, dir.y);
    let steps = ncap.max(2);

    for i in 0..steps {
        let a = i as f32 / (steps - 1) as f32 * PI;
        let (ax, ay) = (a.cos() * w, a.sin() * w);
        strip.push(Vertex::new(p.x - dy * ax - dx * ay, p.y + dx * ax - dy * ay, 0.0, 1.0));
        strip.push(Vertex::at(p, 0.5, 1.0));
    }

    strip.push(Vertex::new(p.x + dy * w, p.y - dx * w, 0.0, 1.0));
    strip.push(Vertex::new(p.x - dy * w, p.y + dx * w, 1.0, 1.0));
}

fn round_cap_end(strip: &mut Vec<Vertex>, p: Point, dir: Vec2, w: f32, ncap: usize) {
    let (dx, dy) = (dir.x, dir.y);
    let steps = ncap.max(2);

    strip.push(Vertex::new(p.x + dy * w, p.y - dx * w, 0.0, 1.0));
    strip.push(Vertex::new(p.x - dy * w, p.y + dx * w, 1.0, 1.0));

    for i in 0..steps {
        let a = i as f32 / (steps - 1) as f32 * PI;
        let (ax, ay) = (a.cos() * w, a.sin() * w);
        strip.push(Vertex::at(p, 0.5, 1.0));
        strip.push(Vertex::new(p.x - dy * ax + dx * ay, p.y + dx * ax + dy * ay, 0.0, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TessellationConfig;
    use strata_core::{Affine2D, Path, Stroke};

    fn ctx_with(stroke: &Stroke, config: &TessellationConfig) -> TessellationContext {
        TessellationContext::new(config).with_stroke(stroke)
    }

    fn line() -> Path {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(10.0, 0.0);
        path
    }

    #[test]
    fn test_butt_line_strip() {
        let config = TessellationConfig::default().with_antialias(false);
        let ctx = ctx_with(&Stroke::new(2.0), &config);
        let mesh = PathMesh::from_path(&line(), &Affine2D::IDENTITY, &ctx);
        let stroke = mesh.stroke(&ctx);

        assert_eq!(stroke.meshes.len(), 1);
        let strip = &stroke.meshes[0].strip;
        assert!(stroke.meshes[0].fan.is_empty());
        // Start cap and end cap, no interior points
        assert_eq!(strip.len(), 8);
        assert_eq!(strip[2].position(), Point::new(0.0, -1.0));
        assert_eq!(strip[3].position(), Point::new(0.0, 1.0));
        assert_eq!(strip[4].position(), Point::new(10.0, -1.0));
        assert_eq!(strip[5].position(), Point::new(10.0, 1.0));
    }

    #[test]
    fn test_square_cap_extends_past_end() {
        let config = TessellationConfig::default().with_antialias(false);
        let ctx = ctx_with(&Stroke::new(2.0).with_cap(LineCap::Square), &config);
        let mesh = PathMesh::from_path(&line(), &Affine2D::IDENTITY, &ctx);
        let strip = &mesh.stroke(&ctx).meshes[0].strip;
        let bounds = stroke_bounds(strip);
        assert!((bounds.0 + 1.0).abs() < 1e-5);
        assert!((bounds.1 - 11.0).abs() < 1e-5);
    }

    fn stroke_bounds(strip: &[Vertex]) -> (f32, f32) {
        strip.iter().fold((f32::MAX, f32::MIN), |(lo, hi), v| {
            (lo.min(v.x), hi.max(v.x))
        })
    }

    #[test]
    fn test_round_cap_is_semicircle() {
        let config = TessellationConfig::default().with_antialias(false);
        let ctx = ctx_with(&Stroke::new(4.0).with_cap(LineCap::Round), &config);
        let ncap = cap_fragments(&ctx, ctx.stroke_half_width());
        assert!(ncap >= 2);

        let mesh = PathMesh::from_path(&line(), &Affine2D::IDENTITY, &ctx);
        let strip = &mesh.stroke(&ctx).meshes[0].strip;
        assert_eq!(strip.len(), 2 * (2 * ncap + 2));
        // Caps bulge past the end points by at most the half-width
        let (lo, hi) = stroke_bounds(strip);
        assert!(lo < -1.0 && lo >= -2.0 - 1e-4);
        assert!(hi > 11.0 && hi <= 12.0 + 1e-4);
        for v in strip.iter().take(2 * ncap).filter(|v| v.u == 0.0) {
            assert!((v.position().distance(Point::ZERO) - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_no_cap_fragments_without_round_style() {
        let ctx = ctx_with(&Stroke::new(4.0), &TessellationConfig::default());
        assert_eq!(cap_fragments(&ctx, 2.0), 0);
        let ctx = ctx_with(
            &Stroke::new(4.0).with_join(LineJoin::Round),
            &TessellationConfig::default(),
        );
        assert!(cap_fragments(&ctx, 2.0) >= 2);
    }

    /// Radial error of the four-cubic circle approximation
    const CUBIC_CIRCLE_ERROR: f32 = 2.8e-4;

    /// Unit circle stroke with its widest extrusion, `max |dm| * w`
    fn unit_circle_stroke(ctx: &TessellationContext) -> (Mesh, f32) {
        let mut path = Path::new();
        path.circle(0.0, 0.0, 1.0);
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, ctx);
        assert_eq!(mesh.contours().len(), 1);
        let max_dm = mesh.contours()[0]
            .points()
            .iter()
            .map(|p| p.dm.length())
            .fold(0.0, f32::max);
        let mut stroke = mesh.stroke(ctx);
        assert_eq!(stroke.meshes.len(), 1);
        (stroke.meshes.remove(0), max_dm * ctx.stroke_half_width())
    }

    #[test]
    fn test_unit_circle_thin_stroke_stays_on_circle() {
        // Without antialiasing the strip is extruded by the half-width alone.
        // A fine tolerance keeps the flattened turns, and so the miters, small.
        let config = TessellationConfig::default()
            .with_antialias(false)
            .with_device_pixel_ratio(100.0)
            .with_distance_tolerance(0.01);
        let ctx = ctx_with(&Stroke::new(0.1), &config);
        assert!(!ctx.antialias);
        assert_eq!(ctx.stroke_half_width(), 0.05);

        let (mesh, extrusion) = unit_circle_stroke(&ctx);
        assert!(mesh.fan.is_empty());
        assert!(mesh.strip.len() > 16);
        // A miter is w / cos(turn / 2), a hair longer than w
        assert!(extrusion >= 0.05 && extrusion < 0.0505);

        for v in &mesh.strip {
            let r = v.position().distance(Point::ZERO);
            assert!(
                (r - 1.0).abs() <= extrusion + CUBIC_CIRCLE_ERROR,
                "radius {}",
                r
            );
        }
    }

    #[test]
    fn test_unit_circle_stroke_default_config() {
        // Antialiasing extrudes each side by another half fringe
        let config = TessellationConfig::default();
        let ctx = ctx_with(&Stroke::new(0.1), &config);
        assert!(ctx.antialias);
        let w = ctx.stroke_half_width();
        assert!((w - (0.05 + ctx.fringe_width * 0.5)).abs() < 1e-6);

        let (mesh, extrusion) = unit_circle_stroke(&ctx);
        assert!(extrusion >= w);
        for v in &mesh.strip {
            let r = v.position().distance(Point::ZERO);
            assert!(
                (r - 1.0).abs() <= extrusion + CUBIC_CIRCLE_ERROR,
                "radius {}",
                r
            );
        }

        // The fringe carries the outer edge well past the thin band
        let outer = mesh
            .strip
            .iter()
            .map(|v| v.position().distance(Point::ZERO))
            .fold(0.0, f32::max);
        assert!(outer > 1.05 + ctx.fringe_width * 0.25);
    }

    #[test]
    fn test_closed_strip_repeats_start() {
        let config = TessellationConfig::default();
        let ctx = ctx_with(&Stroke::new(2.0), &config);
        let mut path = Path::new();
        path.rect(strata_core::Rect::new(0.0, 0.0, 10.0, 10.0));
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx);
        let strip = &mesh.stroke(&ctx).meshes[0].strip;
        assert_eq!(strip.len(), 10);
        assert_eq!(strip[8].position(), strip[0].position());
        assert_eq!(strip[9].position(), strip[1].position());
    }

    #[test]
    fn test_hairline_coverage() {
        let config = TessellationConfig::default().with_antialias(false);
        let ctx = ctx_with(&Stroke::new(1.0), &config);
        let (w, alpha) = stroke_coverage(&ctx);
        assert_eq!(w, 1.0);
        assert!((alpha - 0.25).abs() < 1e-6);

        let ctx = ctx_with(&Stroke::new(4.0), &config);
        assert_eq!(stroke_coverage(&ctx), (2.0, 1.0));
    }
}

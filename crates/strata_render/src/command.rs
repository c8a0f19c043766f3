//! Draw commands
//!
//! The render graph hands these to the backend in submission order. Every
//! command is self-contained: geometry in device space, the uniforms the
//! shader needs, a blend mode and the clip operations in effect when it was
//! recorded.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_core::{Affine2D, BlendMode, BoundingBox, Paint, Rect, Size};
use strata_tess::{FillGeometry, Mesh, StrokeGeometry, Vertex};

use crate::backend::TargetId;

/// Coverage threshold of the stencil pass for overlapping strokes
pub const STROKE_STENCIL_THRESHOLD: f32 = 1.0 - 0.5 / 255.0;

// ─────────────────────────────────────────────────────────────────────────────
// Scissor
// ─────────────────────────────────────────────────────────────────────────────

/// Transformed scissor rectangle
///
/// Stored as a transform to the rectangle's center plus half extents. A
/// negative extent disables scissoring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scissor {
    pub transform: Affine2D,
    pub extent: Size,
}

impl Default for Scissor {
    fn default() -> Self {
        Self {
            transform: Affine2D::IDENTITY,
            extent: Size::new(-1.0, -1.0),
        }
    }
}

impl Scissor {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_enabled(&self) -> bool {
        self.extent.width > -0.5
    }

    /// Scissor to `rect` in the user space of `xform`
    pub fn set(&mut self, rect: Rect, xform: &Affine2D) {
        let w = rect.width().max(0.0);
        let h = rect.height().max(0.0);
        self.transform = xform.pre_translate(rect.x() + w * 0.5, rect.y() + h * 0.5);
        self.extent = Size::new(w * 0.5, h * 0.5);
    }

    /// Intersect with `rect` in the user space of `xform`.
    ///
    /// The current scissor is mapped into that space and approximated by its
    /// axis-aligned bounds there, so rotated scissors only shrink.
    pub fn intersect(&mut self, rect: Rect, xform: &Affine2D) {
        if !self.is_enabled() {
            self.set(rect, xform);
            return;
        }

        let inverse = xform.inverse().unwrap_or_else(|| {
            tracing::trace!("singular transform while intersecting scissor");
            Affine2D::IDENTITY
        });
        let [a, b, c, d, tx, ty] = inverse.then(&self.transform).elements;
        let ex = self.extent.width;
        let ey = self.extent.height;
        let tex = ex * a.abs() + ey * c.abs();
        let tey = ex * b.abs() + ey * d.abs();

        let previous = Rect::new(tx - tex, ty - tey, tex * 2.0, tey * 2.0);
        self.set(intersect_rects(&previous, &rect), xform);
    }
}

/// Overlap of two rects, collapsing to zero size when they are disjoint
fn intersect_rects(a: &Rect, b: &Rect) -> Rect {
    let minx = a.left().max(b.left());
    let miny = a.top().max(b.top());
    let maxx = a.right().min(b.right());
    let maxy = a.bottom().min(b.bottom());
    Rect::new(minx, miny, (maxx - minx).max(0.0), (maxy - miny).max(0.0))
}

// ─────────────────────────────────────────────────────────────────────────────
// Uniforms
// ─────────────────────────────────────────────────────────────────────────────

/// Where a command takes its color from
#[derive(Clone, Debug, PartialEq)]
pub enum PaintSource {
    Paint(Paint),
    /// Contents of an offscreen layer target
    Target(TargetId),
}

impl Default for PaintSource {
    fn default() -> Self {
        PaintSource::Paint(Paint::default())
    }
}

impl From<Paint> for PaintSource {
    fn from(paint: Paint) -> Self {
        PaintSource::Paint(paint)
    }
}

/// Per-command shader parameters
#[derive(Clone, Debug, PartialEq)]
pub struct Uniforms {
    /// User-to-device transform in effect when the command was recorded
    pub transform: Affine2D,
    pub paint: PaintSource,
    pub alpha: f32,
    pub scissor: Scissor,
    pub stroke_width: f32,
    pub fringe: f32,
    /// Fragments with coverage below this are discarded; negative disables
    pub stroke_threshold: f32,
}

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            transform: Affine2D::IDENTITY,
            paint: PaintSource::default(),
            alpha: 1.0,
            scissor: Scissor::default(),
            stroke_width: 1.0,
            fringe: 1.0,
            stroke_threshold: -1.0,
        }
    }
}

impl Uniforms {
    /// Fill parameters: the fringe doubles as stroke width
    pub fn fill(
        transform: Affine2D,
        paint: impl Into<PaintSource>,
        alpha: f32,
        scissor: Scissor,
        fringe: f32,
    ) -> Self {
        Self {
            transform,
            paint: paint.into(),
            alpha,
            scissor,
            stroke_width: fringe,
            fringe,
            stroke_threshold: -1.0,
        }
    }

    pub fn stroke(
        transform: Affine2D,
        paint: impl Into<PaintSource>,
        alpha: f32,
        scissor: Scissor,
        half_width: f32,
        fringe: f32,
    ) -> Self {
        Self {
            transform,
            paint: paint.into(),
            alpha,
            scissor,
            stroke_width: half_width,
            fringe,
            stroke_threshold: -1.0,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.stroke_threshold = threshold;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clipping
// ─────────────────────────────────────────────────────────────────────────────

/// How a clip path combines with the clips before it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipOperation {
    #[default]
    Union,
    Intersect,
    Replace,
}

/// A clip path, triangulated like a fill
#[derive(Clone, Debug, PartialEq)]
pub struct ClipOp {
    pub op: ClipOperation,
    pub fill: FillCommand,
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Fan and fringe meshes of a fill plus its cover quad
#[derive(Clone, Debug, PartialEq)]
pub struct FillCommand {
    pub meshes: Vec<Mesh>,
    pub bounds: BoundingBox,
    pub quad: [Vertex; 6],
    pub uniforms: Uniforms,
    pub blend_mode: BlendMode,
    pub clip_ops: Vec<Arc<ClipOp>>,
}

impl FillCommand {
    pub fn new(geometry: FillGeometry, uniforms: Uniforms, blend_mode: BlendMode) -> Self {
        Self {
            meshes: geometry.meshes,
            bounds: geometry.bounds,
            quad: geometry.quad,
            uniforms,
            blend_mode,
            clip_ops: Vec::new(),
        }
    }

    pub fn with_clip_ops(mut self, clip_ops: Vec<Arc<ClipOp>>) -> Self {
        self.clip_ops = clip_ops;
        self
    }

    fn mesh_vertices(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }
}

/// Strip meshes of a stroke
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeCommand {
    pub meshes: Vec<Mesh>,
    pub uniforms: Uniforms,
    /// Uniforms of the stencil pass that keeps overlapping strips from
    /// blending twice, when stencil strokes are enabled
    pub stencil_uniforms: Option<Uniforms>,
    pub blend_mode: BlendMode,
    pub clip_ops: Vec<Arc<ClipOp>>,
}

impl StrokeCommand {
    pub fn new(geometry: StrokeGeometry, uniforms: Uniforms, blend_mode: BlendMode) -> Self {
        Self {
            meshes: geometry.meshes,
            uniforms,
            stencil_uniforms: None,
            blend_mode,
            clip_ops: Vec::new(),
        }
    }

    /// Add a stencil pass sharing the main uniforms
    pub fn with_stencil(mut self) -> Self {
        self.stencil_uniforms = Some(
            self.uniforms
                .clone()
                .with_threshold(STROKE_STENCIL_THRESHOLD),
        );
        self
    }

    pub fn with_clip_ops(mut self, clip_ops: Vec<Arc<ClipOp>>) -> Self {
        self.clip_ops = clip_ops;
        self
    }
}

/// Raw triangle list, three vertices per triangle
#[derive(Clone, Debug, PartialEq)]
pub struct TrianglesCommand {
    pub vertices: Vec<Vertex>,
    pub uniforms: Uniforms,
    pub blend_mode: BlendMode,
    pub clip_ops: Vec<Arc<ClipOp>>,
}

/// A unit of work for the backend
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Convex fill drawn directly, no stencil needed
    ConvexFill(FillCommand),
    /// Stencil the fans, then cover the bounds quad
    Fill(FillCommand),
    Stroke(StrokeCommand),
    Triangles(TrianglesCommand),
}

impl DrawCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DrawCommand::ConvexFill(_) => "convex_fill",
            DrawCommand::Fill(_) => "fill",
            DrawCommand::Stroke(_) => "stroke",
            DrawCommand::Triangles(_) => "triangles",
        }
    }

    /// Vertices the backend will upload for this command
    pub fn vertex_count(&self) -> usize {
        match self {
            DrawCommand::ConvexFill(fill) => fill.mesh_vertices(),
            DrawCommand::Fill(fill) => fill.mesh_vertices() + fill.quad.len(),
            DrawCommand::Stroke(stroke) => stroke.meshes.iter().map(Mesh::vertex_count).sum(),
            DrawCommand::Triangles(triangles) => triangles.vertices.len(),
        }
    }

    pub fn clip_ops(&self) -> &[Arc<ClipOp>] {
        match self {
            DrawCommand::ConvexFill(fill) | DrawCommand::Fill(fill) => &fill.clip_ops,
            DrawCommand::Stroke(stroke) => &stroke.clip_ops,
            DrawCommand::Triangles(triangles) => &triangles.clip_ops,
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        match self {
            DrawCommand::ConvexFill(fill) | DrawCommand::Fill(fill) => fill.blend_mode,
            DrawCommand::Stroke(stroke) => stroke.blend_mode,
            DrawCommand::Triangles(triangles) => triangles.blend_mode,
        }
    }

    pub fn uniforms(&self) -> &Uniforms {
        match self {
            DrawCommand::ConvexFill(fill) | DrawCommand::Fill(fill) => &fill.uniforms,
            DrawCommand::Stroke(stroke) => &stroke.uniforms,
            DrawCommand::Triangles(triangles) => &triangles.uniforms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{Color, Point};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_scissor_disabled_by_default() {
        let mut scissor = Scissor::default();
        assert!(!scissor.is_enabled());
        scissor.set(Rect::new(0.0, 0.0, 10.0, 10.0), &Affine2D::IDENTITY);
        assert!(scissor.is_enabled());
        scissor.reset();
        assert!(!scissor.is_enabled());
    }

    #[test]
    fn test_scissor_set_centers_rect() {
        let mut scissor = Scissor::default();
        scissor.set(
            Rect::new(10.0, 20.0, 40.0, 60.0),
            &Affine2D::translation(5.0, 0.0),
        );
        let center = scissor.transform.transform_point(Point::ZERO);
        assert!(approx(center.x, 35.0) && approx(center.y, 50.0));
        assert_eq!(scissor.extent, Size::new(20.0, 30.0));
    }

    #[test]
    fn test_scissor_intersection() {
        let mut scissor = Scissor::default();
        scissor.set(Rect::new(0.0, 0.0, 100.0, 100.0), &Affine2D::IDENTITY);
        scissor.intersect(Rect::new(50.0, 50.0, 100.0, 100.0), &Affine2D::IDENTITY);

        let [_, _, _, _, tx, ty] = scissor.transform.elements;
        assert!(approx(tx, 75.0) && approx(ty, 75.0));
        assert_eq!(scissor.extent, Size::new(25.0, 25.0));
    }

    #[test]
    fn test_scissor_intersection_in_translated_space() {
        let mut scissor = Scissor::default();
        scissor.set(Rect::new(0.0, 0.0, 100.0, 100.0), &Affine2D::IDENTITY);

        // The first scissor is (-10, 0, 100, 100) in the translated space
        let xform = Affine2D::translation(10.0, 0.0);
        scissor.intersect(Rect::new(0.0, 0.0, 100.0, 100.0), &xform);

        let [_, _, _, _, tx, ty] = scissor.transform.elements;
        assert!(approx(tx, 55.0) && approx(ty, 50.0));
        assert!(approx(scissor.extent.width, 45.0));
        assert!(approx(scissor.extent.height, 50.0));
    }

    #[test]
    fn test_scissor_disjoint_collapses() {
        let mut scissor = Scissor::default();
        scissor.intersect(Rect::new(0.0, 0.0, 10.0, 10.0), &Affine2D::IDENTITY);
        scissor.intersect(Rect::new(20.0, 20.0, 10.0, 10.0), &Affine2D::IDENTITY);
        assert!(scissor.is_enabled());
        assert_eq!(scissor.extent, Size::ZERO);
    }

    #[test]
    fn test_fill_uniforms() {
        let uniforms = Uniforms::fill(
            Affine2D::IDENTITY,
            Paint::Solid(Color::RED),
            0.5,
            Scissor::default(),
            0.5,
        );
        assert_eq!(uniforms.stroke_width, 0.5);
        assert_eq!(uniforms.fringe, 0.5);
        assert_eq!(uniforms.stroke_threshold, -1.0);
    }

    #[test]
    fn test_stroke_stencil_uniforms() {
        let geometry = StrokeGeometry {
            meshes: vec![Mesh::new()],
            half_width: 2.0,
            alpha_scale: 1.0,
        };
        let uniforms = Uniforms::stroke(
            Affine2D::IDENTITY,
            Paint::default(),
            1.0,
            Scissor::default(),
            2.0,
            1.0,
        );
        let command = StrokeCommand::new(geometry, uniforms, BlendMode::SrcOver).with_stencil();
        let stencil = command.stencil_uniforms.as_ref().unwrap();
        assert_eq!(stencil.stroke_threshold, STROKE_STENCIL_THRESHOLD);
        assert_eq!(command.uniforms.stroke_threshold, -1.0);

        let command = DrawCommand::Stroke(command);
        assert_eq!(command.name(), "stroke");
        assert_eq!(command.vertex_count(), 0);
    }

    #[test]
    fn test_fill_vertex_count_includes_quad() {
        let mut mesh = Mesh::new();
        mesh.fan.extend([Vertex::new(0.0, 0.0, 0.5, 1.0); 3]);
        let geometry = FillGeometry {
            meshes: vec![mesh],
            bounds: BoundingBox::empty(),
            quad: [Vertex::default(); 6],
            convex: false,
        };
        let fill = FillCommand::new(geometry, Uniforms::default(), BlendMode::Multiply);

        assert_eq!(DrawCommand::ConvexFill(fill.clone()).vertex_count(), 3);
        let stencil = DrawCommand::Fill(fill);
        assert_eq!(stencil.vertex_count(), 9);
        assert_eq!(stencil.blend_mode(), BlendMode::Multiply);
        assert!(stencil.clip_ops().is_empty());
    }
}

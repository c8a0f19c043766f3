//! Canvas
//!
//! The frame API. Draw calls between [`Canvas::begin_frame`] and
//! [`Canvas::end_frame`] are tessellated immediately against the current
//! [`CanvasState`] and recorded into the render graph; `end_frame` submits
//! the graph to a backend.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_core::{Affine2D, BlendMode, BoundingBox, Paint, Path, Point, Rect, Size, Stroke, Winding};
use strata_tess::{
    tessellate_fill, FillGeometry, PathMesh, StrokeGeometry, TessellationContext, Vertex,
};

use crate::backend::{Backend, TargetSize};
use crate::command::{
    ClipOp, ClipOperation, DrawCommand, FillCommand, Scissor, StrokeCommand, TrianglesCommand,
    Uniforms,
};
use crate::config::{CanvasConfig, ComplexFill};
use crate::effect::LayerEffect;
use crate::error::{BackendError, RenderError, Result};
use crate::graph::RenderGraph;
use crate::pool::{TargetPool, TargetPoolStats};
use crate::shape::{stroke_mesh, FillKey, Shape, StrokeKey};

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

/// Which passes [`Canvas::draw_path`] performs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawingStyle {
    #[default]
    Fill,
    Stroke,
    FillAndStroke,
}

impl DrawingStyle {
    pub fn fills(&self) -> bool {
        matches!(self, DrawingStyle::Fill | DrawingStyle::FillAndStroke)
    }

    pub fn strokes(&self) -> bool {
        matches!(self, DrawingStyle::Stroke | DrawingStyle::FillAndStroke)
    }
}

/// Everything a draw call reads besides its path
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasState {
    /// User-to-canvas transform
    pub transform: Affine2D,
    pub fill_paint: Paint,
    pub stroke_paint: Paint,
    pub stroke: Stroke,
    pub global_alpha: f32,
    pub blend_mode: BlendMode,
    pub drawing_style: DrawingStyle,
    /// Forced contour orientation, `None` keeps each contour as drawn
    pub winding: Option<Winding>,
    pub scissor: Scissor,
    pub clip_ops: Vec<Arc<ClipOp>>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: Affine2D::IDENTITY,
            fill_paint: Paint::default(),
            stroke_paint: Paint::default(),
            stroke: Stroke::default(),
            global_alpha: 1.0,
            blend_mode: BlendMode::SrcOver,
            drawing_style: DrawingStyle::Fill,
            winding: None,
            scissor: Scissor::default(),
            clip_ops: Vec::new(),
        }
    }
}

/// Summary of one finished frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub fills: usize,
    pub strokes: usize,
    pub clips: usize,
    pub layers: usize,
    /// Commands submitted, layer quads included
    pub commands: usize,
    pub vertices: usize,
    pub pool: TargetPoolStats,
}

#[derive(Clone, Copy, Debug, Default)]
struct FrameCounters {
    fills: usize,
    strokes: usize,
    clips: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Canvas
// ─────────────────────────────────────────────────────────────────────────────

/// Retained drawing surface with an explicit state stack
pub struct Canvas {
    width: f32,
    height: f32,
    config: CanvasConfig,
    state: CanvasState,
    saved: Vec<CanvasState>,
    /// Saved-state depth at each open layer's `push_layer`
    layer_saves: Vec<usize>,
    graph: RenderGraph,
    pool: TargetPool,
    in_frame: bool,
    frame: u64,
    counters: FrameCounters,
}

impl Canvas {
    pub fn new(width: f32, height: f32, config: CanvasConfig) -> Self {
        let graph = RenderGraph::new(Self::target_size(width, height, &config))
            .with_viewport(Size::new(width, height))
            .with_max_depth(config.max_layer_depth);
        Self {
            width,
            height,
            config,
            state: CanvasState::default(),
            saved: Vec::new(),
            layer_saves: Vec::new(),
            graph,
            pool: TargetPool::new(),
            in_frame: false,
            frame: 0,
            counters: FrameCounters::default(),
        }
    }

    fn target_size(width: f32, height: f32, config: &CanvasConfig) -> TargetSize {
        TargetSize::from_canvas(width, height, config.tessellation.device_pixel_ratio)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Index of the next frame to be finished
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    /// Change the canvas size; layer targets of the old size stay pooled
    /// until [`Canvas::trim_targets`]
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.graph.resize(
            Self::target_size(width, height, &self.config),
            Size::new(width, height),
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Frames
    // ─────────────────────────────────────────────────────────────────────────

    pub fn begin_frame(&mut self) -> Result<()> {
        if self.in_frame {
            return Err(RenderError::FrameAlreadyStarted);
        }
        self.in_frame = true;
        self.graph.clear();
        self.reset_states();
        self.counters = FrameCounters::default();
        tracing::trace!(frame = self.frame, "frame started");
        Ok(())
    }

    /// Submit the recorded frame to `backend`
    pub fn end_frame(&mut self, backend: &mut dyn Backend) -> Result<FrameStats> {
        if !self.in_frame {
            return Err(RenderError::FrameNotStarted);
        }
        self.in_frame = false;

        let rendered = self.graph.render(backend, &mut self.pool);
        self.graph.clear();
        self.reset_states();
        let graph = rendered?;

        let stats = FrameStats {
            frame: self.frame,
            fills: self.counters.fills,
            strokes: self.counters.strokes,
            clips: self.counters.clips,
            layers: graph.layers,
            commands: graph.commands,
            vertices: graph.vertices,
            pool: self.pool.stats(),
        };
        self.frame += 1;

        tracing::debug!(
            frame = stats.frame,
            commands = stats.commands,
            layers = stats.layers,
            vertices = stats.vertices,
            pool_hits = stats.pool.hits,
            pool_misses = stats.pool.misses,
            "frame finished"
        );
        Ok(stats)
    }

    /// Destroy pooled layer targets not used by the last frame
    pub fn trim_targets(&mut self, backend: &mut dyn Backend) -> std::result::Result<usize, BackendError> {
        self.pool.trim(backend)
    }

    /// Destroy every layer target the canvas owns
    pub fn release_targets(&mut self, backend: &mut dyn Backend) -> std::result::Result<(), BackendError> {
        self.pool.clear(backend)
    }

    pub fn pool_stats(&self) -> TargetPoolStats {
        self.pool.stats()
    }

    fn ensure_frame(&self) -> Result<()> {
        if self.in_frame {
            Ok(())
        } else {
            Err(RenderError::FrameNotStarted)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State stack
    // ─────────────────────────────────────────────────────────────────────────

    /// Push a copy of the current state
    pub fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    /// Pop the last saved state.
    ///
    /// Returns `false` when nothing was saved since the innermost open layer.
    pub fn restore(&mut self) -> bool {
        let floor = self.layer_saves.last().map_or(0, |depth| depth + 1);
        if self.saved.len() <= floor {
            return false;
        }
        match self.saved.pop() {
            Some(state) => {
                self.state = state;
                true
            }
            None => false,
        }
    }

    /// Reset the current state to defaults, keeping saved states
    pub fn reset(&mut self) {
        self.state = CanvasState::default();
    }

    /// Number of saved states
    pub fn save_count(&self) -> usize {
        self.saved.len()
    }

    fn reset_states(&mut self) {
        self.saved.clear();
        self.layer_saves.clear();
        self.state = CanvasState::default();
    }

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CanvasState {
        &mut self.state
    }

    pub fn set_fill_paint(&mut self, paint: impl Into<Paint>) {
        self.state.fill_paint = paint.into();
    }

    pub fn set_stroke_paint(&mut self, paint: impl Into<Paint>) {
        self.state.stroke_paint = paint.into();
    }

    pub fn set_stroke(&mut self, stroke: Stroke) {
        self.state.stroke = stroke;
    }

    pub fn set_global_alpha(&mut self, alpha: f32) {
        self.state.global_alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend_mode = mode;
    }

    pub fn set_drawing_style(&mut self, style: DrawingStyle) {
        self.state.drawing_style = style;
    }

    pub fn set_winding(&mut self, winding: Option<Winding>) {
        self.state.winding = winding;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transform
    // ─────────────────────────────────────────────────────────────────────────

    pub fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.pre_translate(x, y);
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform.pre_scale(sx, sy);
    }

    /// Rotate by `angle` radians
    pub fn rotate(&mut self, angle: f32) {
        self.state.transform = self.state.transform.pre_rotate(angle);
    }

    pub fn skew(&mut self, angle_x: f32, angle_y: f32) {
        self.state.transform = self.state.transform.then(&Affine2D::skew(angle_x, angle_y));
    }

    /// Apply `xform` before the current transform
    pub fn transform(&mut self, xform: &Affine2D) {
        self.state.transform = self.state.transform.then(xform);
    }

    pub fn set_transform(&mut self, xform: Affine2D) {
        self.state.transform = xform;
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = Affine2D::IDENTITY;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drawing
    // ─────────────────────────────────────────────────────────────────────────

    fn fill_context(&self) -> TessellationContext {
        TessellationContext::new(&self.config.tessellation)
            .with_average_scale(self.state.transform.average_scale())
            .with_winding(self.state.winding)
    }

    fn stroke_context(&self) -> TessellationContext {
        self.fill_context().with_stroke(&self.state.stroke)
    }

    fn fill_key(&self) -> FillKey {
        FillKey {
            device_pixel_ratio: self.config.tessellation.device_pixel_ratio,
            antialias: self.config.tessellation.antialias,
            transform: self.state.transform,
            winding: self.state.winding,
        }
    }

    /// Fill and/or stroke `path` according to the drawing style
    pub fn draw_path(&mut self, path: &Path) -> Result<()> {
        self.ensure_frame()?;
        let style = self.state.drawing_style;
        if style.fills() {
            self.fill_path(path)?;
        }
        if style.strokes() {
            self.stroke_path(path)?;
        }
        Ok(())
    }

    pub fn fill_path(&mut self, path: &Path) -> Result<()> {
        self.ensure_frame()?;
        let ctx = self.fill_context();
        let geometry = PathMesh::from_path(path, &self.state.transform, &ctx).fill(&ctx);
        self.push_fill(path, geometry, &ctx);
        Ok(())
    }

    pub fn stroke_path(&mut self, path: &Path) -> Result<()> {
        self.ensure_frame()?;
        let ctx = self.stroke_context();
        let mesh = PathMesh::from_path(path, &self.state.transform, &ctx);
        let geometry = stroke_mesh(
            &mesh,
            &self.state.stroke,
            self.state.transform.average_scale(),
            &ctx,
        );
        self.push_stroke(geometry, &ctx);
        Ok(())
    }

    pub fn fill_rect(&mut self, rect: Rect) -> Result<()> {
        let mut path = Path::new();
        path.rect(rect);
        self.fill_path(&path)
    }

    /// Cover the whole canvas with `paint`, ignoring transform, clips and
    /// scissor
    pub fn fill_background(&mut self, paint: impl Into<Paint>) -> Result<()> {
        self.ensure_frame()?;
        self.save();
        self.state = CanvasState {
            fill_paint: paint.into(),
            ..CanvasState::default()
        };
        let result = self.fill_rect(Rect::new(0.0, 0.0, self.width, self.height));
        self.restore();
        result
    }

    /// Draw a raw triangle list with the fill paint.
    ///
    /// Positions are in user space; a trailing incomplete triangle is
    /// dropped.
    pub fn draw_triangles(&mut self, vertices: &[Vertex]) -> Result<()> {
        self.ensure_frame()?;
        let complete = vertices.len() - vertices.len() % 3;
        if complete < vertices.len() {
            tracing::trace!(dropped = vertices.len() - complete, "incomplete triangle dropped");
        }
        if complete == 0 {
            return Ok(());
        }

        let xform = self.state.transform;
        let vertices = vertices[..complete]
            .iter()
            .map(|v| Vertex::at(xform.transform_point(v.position()), v.u, v.v))
            .collect();
        let command = DrawCommand::Triangles(TrianglesCommand {
            vertices,
            uniforms: self.fill_uniforms(self.config.tessellation.fringe_width()),
            blend_mode: self.state.blend_mode,
            clip_ops: self.state.clip_ops.clone(),
        });
        self.graph.add_command(command);
        self.counters.fills += 1;
        Ok(())
    }

    /// Fill and/or stroke a cached shape according to the drawing style
    pub fn draw_shape(&mut self, shape: &mut Shape) -> Result<()> {
        self.ensure_frame()?;
        let style = self.state.drawing_style;
        if style.fills() {
            self.fill_shape(shape)?;
        }
        if style.strokes() {
            self.stroke_shape(shape)?;
        }
        Ok(())
    }

    pub fn fill_shape(&mut self, shape: &mut Shape) -> Result<()> {
        self.ensure_frame()?;
        let ctx = self.fill_context();
        let geometry = shape.fill_geometry(self.fill_key(), &ctx).clone();
        self.push_fill(shape.path(), geometry, &ctx);
        Ok(())
    }

    pub fn stroke_shape(&mut self, shape: &mut Shape) -> Result<()> {
        self.ensure_frame()?;
        let ctx = self.stroke_context();
        let key = StrokeKey {
            fill: self.fill_key(),
            stroke: self.state.stroke.clone(),
        };
        let geometry = shape.stroke_geometry(key, &ctx).clone();
        self.push_stroke(geometry, &ctx);
        Ok(())
    }

    fn fill_uniforms(&self, fringe: f32) -> Uniforms {
        Uniforms::fill(
            self.state.transform,
            self.state.fill_paint.transformed(&self.state.transform),
            self.state.global_alpha,
            self.state.scissor,
            fringe,
        )
    }

    fn push_fill(&mut self, path: &Path, geometry: FillGeometry, ctx: &TessellationContext) {
        if geometry.meshes.is_empty() {
            tracing::trace!("empty fill skipped");
            return;
        }
        let command = self.fill_command(path, geometry, ctx);
        self.graph.add_command(command);
        self.counters.fills += 1;
    }

    fn fill_command(&self, path: &Path, geometry: FillGeometry, ctx: &TessellationContext) -> DrawCommand {
        let uniforms = self.fill_uniforms(ctx.fringe_width);
        let blend_mode = self.state.blend_mode;
        let clip_ops = self.state.clip_ops.clone();

        if geometry.convex {
            return DrawCommand::ConvexFill(
                FillCommand::new(geometry, uniforms, blend_mode).with_clip_ops(clip_ops),
            );
        }
        match self.config.complex_fill {
            ComplexFill::Stencil => DrawCommand::Fill(
                FillCommand::new(geometry, uniforms, blend_mode).with_clip_ops(clip_ops),
            ),
            ComplexFill::CpuTriangulate => {
                let fill = tessellate_fill(
                    path,
                    &self.state.transform,
                    self.config.fill_rule,
                    ctx.tessellation_tolerance,
                );
                DrawCommand::Triangles(TrianglesCommand {
                    vertices: fill.to_triangles(),
                    uniforms,
                    blend_mode,
                    clip_ops,
                })
            }
        }
    }

    fn push_stroke(&mut self, geometry: StrokeGeometry, ctx: &TessellationContext) {
        if geometry.meshes.is_empty() {
            tracing::trace!("empty stroke skipped");
            return;
        }
        let uniforms = Uniforms::stroke(
            self.state.transform,
            self.state.stroke_paint.transformed(&self.state.transform),
            self.state.global_alpha * geometry.alpha_scale,
            self.state.scissor,
            geometry.half_width,
            ctx.fringe_width,
        );
        let mut command = StrokeCommand::new(geometry, uniforms, self.state.blend_mode)
            .with_clip_ops(self.state.clip_ops.clone());
        if self.config.stencil_strokes {
            command = command.with_stencil();
        }
        self.graph.add_command(DrawCommand::Stroke(command));
        self.counters.strokes += 1;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Clipping
    // ─────────────────────────────────────────────────────────────────────────

    /// Combine `path` with the current clip
    pub fn clip(&mut self, path: &Path, op: ClipOperation) -> Result<()> {
        self.ensure_frame()?;
        let ctx = self.fill_context();
        let geometry = PathMesh::from_path(path, &self.state.transform, &ctx).fill(&ctx);
        let uniforms = Uniforms::fill(
            self.state.transform,
            Paint::default(),
            1.0,
            self.state.scissor,
            ctx.fringe_width,
        );
        let fill = FillCommand::new(geometry, uniforms, BlendMode::SrcOver);

        // Earlier clips cannot affect a replaced clip
        if op == ClipOperation::Replace {
            self.state.clip_ops.clear();
        }
        self.state.clip_ops.push(Arc::new(ClipOp { op, fill }));
        self.counters.clips += 1;
        Ok(())
    }

    pub fn clip_rect(&mut self, rect: Rect, op: ClipOperation) -> Result<()> {
        let mut path = Path::new();
        path.rect(rect);
        self.clip(&path, op)
    }

    pub fn clear_clip(&mut self) {
        self.state.clip_ops.clear();
    }

    pub fn set_scissor(&mut self, rect: Rect) {
        let xform = self.state.transform;
        self.state.scissor.set(rect, &xform);
    }

    pub fn intersect_scissor(&mut self, rect: Rect) {
        let xform = self.state.transform;
        self.state.scissor.intersect(rect, &xform);
    }

    pub fn reset_scissor(&mut self) {
        self.state.scissor.reset();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Layers
    // ─────────────────────────────────────────────────────────────────────────

    /// Start drawing into an offscreen layer covering `bounds` (user space).
    ///
    /// Saves the state; [`Canvas::pop_layer`] restores it.
    pub fn push_layer(&mut self, bounds: Rect, effect: Option<LayerEffect>) -> Result<()> {
        self.ensure_frame()?;
        let xform = self.state.transform;
        let mut device = BoundingBox::empty();
        for corner in [
            Point::new(bounds.left(), bounds.top()),
            Point::new(bounds.right(), bounds.top()),
            Point::new(bounds.right(), bounds.bottom()),
            Point::new(bounds.left(), bounds.bottom()),
        ] {
            device.include(xform.transform_point(corner));
        }
        self.graph.push_layer(device.to_rect(), effect)?;
        self.layer_saves.push(self.saved.len());
        self.save();
        Ok(())
    }

    /// Close the innermost layer and restore the state saved by its
    /// [`Canvas::push_layer`], dropping saves left open inside it
    pub fn pop_layer(&mut self) -> Result<()> {
        self.ensure_frame()?;
        self.graph.pop_layer()?;
        if let Some(depth) = self.layer_saves.pop() {
            self.saved.truncate(depth + 1);
            if let Some(state) = self.saved.pop() {
                self.state = state;
            }
        }
        Ok(())
    }

    /// Number of open layers
    pub fn layer_depth(&self) -> usize {
        self.graph.depth()
    }
}

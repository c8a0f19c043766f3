//! Strata Render
//!
//! Records draw calls into backend-agnostic commands and composites them
//! through nested offscreen layers:
//!
//! - **Canvas**: the frame API with an explicit state stack, clipping,
//!   scissoring and layers
//! - **Commands**: convex fills, stencil fills, strokes and raw triangles,
//!   each carrying its uniforms and clip operations
//! - **Render graph**: batches and layers submitted depth-first
//! - **Target pool**: offscreen targets recycled across layers and frames
//! - **Backend**: the trait a GPU renderer implements, plus a recording
//!   backend for tests and tooling
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Color, Rect};
//! use strata_render::{Canvas, CanvasConfig, RecordingBackend};
//!
//! let mut canvas = Canvas::new(320.0, 240.0, CanvasConfig::standard());
//! let mut backend = RecordingBackend::new();
//!
//! canvas.begin_frame().unwrap();
//! canvas.set_fill_paint(Color::BLUE);
//! canvas.fill_rect(Rect::new(10.0, 10.0, 100.0, 50.0)).unwrap();
//! let stats = canvas.end_frame(&mut backend).unwrap();
//!
//! assert_eq!(stats.commands, 1);
//! ```

pub mod backend;
pub mod canvas;
pub mod command;
pub mod config;
pub mod effect;
pub mod error;
pub mod graph;
pub mod pool;
pub mod shape;

pub use backend::{Backend, BackendEvent, RecordingBackend, TargetFormat, TargetId, TargetSize};
pub use canvas::{Canvas, CanvasState, DrawingStyle, FrameStats};
pub use command::{
    ClipOp, ClipOperation, DrawCommand, FillCommand, PaintSource, Scissor, StrokeCommand,
    TrianglesCommand, Uniforms, STROKE_STENCIL_THRESHOLD,
};
pub use config::{CanvasConfig, ComplexFill};
pub use effect::LayerEffect;
pub use error::{BackendError, RenderError, Result};
pub use graph::{GraphStats, LayerNode, Node, NodeId, RenderGraph};
pub use pool::{TargetPool, TargetPoolStats};
pub use shape::{Shape, ShapeCacheStats};

//! Render graph
//!
//! Recorded commands are grouped into a tree: batches of draw commands and
//! layers that render into offscreen targets. Rendering walks the tree
//! depth-first so every layer is finished before the quad sampling it is
//! drawn into its parent.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use strata_core::{BlendMode, Rect, Size};
use strata_tess::Vertex;

use crate::backend::{Backend, TargetFormat, TargetId, TargetSize};
use crate::command::{DrawCommand, PaintSource, TrianglesCommand, Uniforms};
use crate::effect::LayerEffect;
use crate::error::{RenderError, Result};
use crate::pool::TargetPool;

new_key_type! {
    /// Identifier of a node in the render graph
    pub struct NodeId;
}

/// Offscreen layer and the nodes drawn into it
#[derive(Clone, Debug, Default)]
pub struct LayerNode {
    /// Region of the parent covered by this layer, in canvas space
    pub bounds: Rect,
    pub effect: Option<LayerEffect>,
    pub children: Vec<NodeId>,
    /// Target assigned while rendering
    pub target: Option<TargetId>,
}

#[derive(Clone, Debug)]
pub enum Node {
    Batch(Vec<DrawCommand>),
    Layer(LayerNode),
}

/// Totals of one [`RenderGraph::render`] pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Offscreen layers rendered, the root not included
    pub layers: usize,
    /// Commands submitted, layer quads included
    pub commands: usize,
    pub vertices: usize,
}

/// Tree of batches and layers for one frame
#[derive(Debug)]
pub struct RenderGraph {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    /// Open layers, the root at the bottom
    stack: Vec<NodeId>,
    open_batch: Option<NodeId>,
    size: TargetSize,
    /// Canvas extent that a layer target covers, used for texture coordinates
    viewport: Size,
    format: TargetFormat,
    max_depth: usize,
}

impl RenderGraph {
    pub fn new(size: TargetSize) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::Layer(LayerNode::default()));
        Self {
            nodes,
            root,
            stack: vec![root],
            open_batch: None,
            size,
            viewport: Size::new(size.width as f32, size.height as f32),
            format: TargetFormat::Rgba8,
            max_depth: usize::MAX,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Canvas extent mapped onto each layer target
    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_format(mut self, format: TargetFormat) -> Self {
        self.format = format;
        self
    }

    pub fn size(&self) -> TargetSize {
        self.size
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Change the size of layer targets; takes effect on the next render
    pub fn resize(&mut self, size: TargetSize, viewport: Size) {
        self.size = size;
        self.viewport = viewport;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Number of open layers above the root
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn layer_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n, Node::Layer(_)))
            .count()
            - 1
    }

    pub fn command_count(&self) -> usize {
        self.nodes
            .values()
            .map(|n| match n {
                Node::Batch(commands) => commands.len(),
                Node::Layer(_) => 0,
            })
            .sum()
    }

    fn top(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.root)
    }

    fn attach(&mut self, node: Node) -> NodeId {
        let parent = self.top();
        let id = self.nodes.insert(node);
        if let Some(Node::Layer(layer)) = self.nodes.get_mut(parent) {
            layer.children.push(id);
        }
        id
    }

    /// Open a layer; following commands are drawn into it
    pub fn push_layer(&mut self, bounds: Rect, effect: Option<LayerEffect>) -> Result<NodeId> {
        if self.depth() >= self.max_depth {
            return Err(RenderError::LayerDepthExceeded {
                max: self.max_depth,
            });
        }
        let id = self.attach(Node::Layer(LayerNode {
            bounds,
            effect,
            ..Default::default()
        }));
        self.stack.push(id);
        self.open_batch = None;
        Ok(id)
    }

    /// Close the innermost layer
    pub fn pop_layer(&mut self) -> Result<NodeId> {
        if self.stack.len() <= 1 {
            return Err(RenderError::LayerStackUnderflow);
        }
        self.open_batch = None;
        self.stack.pop().ok_or(RenderError::LayerStackUnderflow)
    }

    /// Append to the open batch, starting one if a layer boundary closed it
    pub fn add_command(&mut self, command: DrawCommand) {
        if let Some(Node::Batch(commands)) = self.open_batch.and_then(|id| self.nodes.get_mut(id)) {
            commands.push(command);
            return;
        }
        let id = self.attach(Node::Batch(vec![command]));
        self.open_batch = Some(id);
    }

    /// Drop every node and reopen an empty root
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert(Node::Layer(LayerNode::default()));
        self.stack.clear();
        self.stack.push(self.root);
        self.open_batch = None;
    }

    /// Submit the whole tree to `backend`.
    ///
    /// Batches are drained in the process; call [`RenderGraph::clear`]
    /// before recording the next frame.
    pub fn render(&mut self, backend: &mut dyn Backend, pool: &mut TargetPool) -> Result<GraphStats> {
        if self.depth() > 0 {
            tracing::debug!(open = self.depth(), "rendering with unclosed layers");
        }
        let mut stats = GraphStats::default();
        if let Err(err) = self.render_layer(self.root, true, backend, pool, &mut stats) {
            let released = self.release_targets(pool);
            tracing::debug!(released, "render failed, layer targets returned to the pool");
            return Err(err);
        }
        tracing::debug!(
            layers = stats.layers,
            commands = stats.commands,
            vertices = stats.vertices,
            "render graph submitted"
        );
        Ok(stats)
    }

    /// Hand every target assigned to a layer back to `pool`
    fn release_targets(&mut self, pool: &mut TargetPool) -> usize {
        let mut released = 0;
        for node in self.nodes.values_mut() {
            if let Node::Layer(layer) = node {
                if let Some(target) = layer.target.take() {
                    pool.release(target);
                    released += 1;
                }
            }
        }
        released
    }

    fn render_layer(
        &mut self,
        id: NodeId,
        is_root: bool,
        backend: &mut dyn Backend,
        pool: &mut TargetPool,
        stats: &mut GraphStats,
    ) -> Result<()> {
        let children = match self.nodes.get(id) {
            Some(Node::Layer(layer)) => layer.children.clone(),
            _ => return Ok(()),
        };

        for &child in &children {
            if matches!(self.nodes.get(child), Some(Node::Layer(_))) {
                self.render_layer(child, false, backend, pool, stats)?;
            }
        }

        let target = if is_root {
            None
        } else {
            Some(pool.acquire(backend, self.size, self.format)?)
        };
        let effect = match self.nodes.get_mut(id) {
            Some(Node::Layer(layer)) => {
                layer.target = target;
                layer.effect.clone()
            }
            _ => None,
        };

        backend.begin_target(target)?;

        let mut commands = Vec::new();
        let mut child_targets: SmallVec<[TargetId; 4]> = SmallVec::new();
        for &child in &children {
            match self.nodes.get_mut(child) {
                Some(Node::Batch(batch)) => commands.append(batch),
                Some(Node::Layer(layer)) => {
                    if let Some(child_target) = layer.target {
                        commands.push(layer_quad(&layer.bounds, child_target, self.viewport));
                        child_targets.push(child_target);
                    }
                }
                None => {}
            }
        }

        stats.commands += commands.len();
        stats.vertices += commands.iter().map(DrawCommand::vertex_count).sum::<usize>();
        if !is_root {
            stats.layers += 1;
        }
        tracing::trace!(?target, commands = commands.len(), "layer submitted");

        backend.submit(&commands)?;
        backend.end_target(target, effect.as_ref())?;

        for child_target in child_targets {
            pool.release(child_target);
        }
        Ok(())
    }
}

/// Textured quad compositing a layer target over `bounds`
fn layer_quad(bounds: &Rect, target: TargetId, viewport: Size) -> DrawCommand {
    let w = viewport.width.max(1.0);
    let h = viewport.height.max(1.0);
    let vertex = |x: f32, y: f32| Vertex::new(x, y, x / w, (h - y) / h);

    let (l, t, r, b) = (bounds.left(), bounds.top(), bounds.right(), bounds.bottom());
    DrawCommand::Triangles(TrianglesCommand {
        vertices: vec![
            vertex(l, t),
            vertex(l, b),
            vertex(r, t),
            vertex(r, t),
            vertex(l, b),
            vertex(r, b),
        ],
        uniforms: Uniforms {
            paint: PaintSource::Target(target),
            ..Default::default()
        },
        blend_mode: BlendMode::SrcOver,
        clip_ops: Vec::new(),
    })
}

//! Fill triangulation
//!
//! Each contour becomes a triangle fan covering its interior and, when
//! antialiased, a strip straddling its outline. The fan is inset by half a
//! fringe so the strip ramps coverage from 1 inside to 0 outside.
//!
//! Convex paths can be drawn directly. Anything else needs a stencil pass
//! over every fan followed by the bounds quad, or a CPU triangulation (see
//! [`crate::polygon`]).

use strata_core::BoundingBox;

use crate::config::TessellationContext;
use crate::contour::{Contour, PathMesh, PointFlags};
use crate::join::{bevel_join, JoinFlags};
use crate::mesh::{bounds_quad, Mesh, Vertex};

/// Triangulated fill of a whole path
#[derive(Clone, Debug, PartialEq)]
pub struct FillGeometry {
    /// One mesh per contour with at least three points
    pub meshes: Vec<Mesh>,
    pub bounds: BoundingBox,
    /// Cover quad for stencil fills
    pub quad: [Vertex; 6],
    pub convex: bool,
}

impl FillGeometry {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum::<usize>() + self.quad.len()
    }
}

impl PathMesh {
    /// Triangulate every contour for filling
    pub fn fill(&self, ctx: &TessellationContext) -> FillGeometry {
        let convex = self.is_convex();
        let meshes: Vec<Mesh> = self
            .contours()
            .iter()
            .filter(|c| c.len() >= 3)
            .map(|c| fill_contour(c, ctx, convex))
            .collect();

        tracing::trace!(
            meshes = meshes.len(),
            convex,
            "fill triangulated"
        );

        FillGeometry {
            meshes,
            bounds: self.bounds(),
            quad: bounds_quad(&self.bounds()),
            convex,
        }
    }
}

/// Fan and fringe strip of one contour
///
/// `convex` moves the inner edge of the fringe onto the fan border, since no
/// stencil pass will cover the gap.
pub fn fill_contour(contour: &Contour, ctx: &TessellationContext, convex: bool) -> Mesh {
    let points = contour.points();
    let n = points.len();
    let mut mesh = Mesh::new();
    if n < 3 {
        return mesh;
    }

    let aa = ctx.fill_width();
    if aa <= 0.0 {
        mesh.fan
            .extend(points.iter().map(|p| Vertex::at(p.pos, 0.5, 1.0)));
        return mesh;
    }

    let woff = 0.5 * aa;

    mesh.fan.reserve(n);
    for i in 0..n {
        let p0 = &points[(i + n - 1) % n];
        let p1 = &points[i];
        if p1.flags.contains(PointFlags::FILL_BEVEL) {
            if p1.is_left() {
                mesh.fan.push(Vertex::at(p1.pos + p1.dm * woff, 0.5, 1.0));
            } else {
                mesh.fan
                    .push(Vertex::at(p1.pos + p0.dir.perp() * woff, 0.5, 1.0));
                mesh.fan
                    .push(Vertex::at(p1.pos + p1.dir.perp() * woff, 0.5, 1.0));
            }
        } else {
            mesh.fan.push(Vertex::at(p1.pos + p1.dm * woff, 0.5, 1.0));
        }
    }

    let (lw, lu) = if convex { (woff, 0.5) } else { (aa + woff, 0.0) };
    let rw = aa - woff;
    let ru = 1.0;

    mesh.strip.reserve(n * 2 + 2);
    for i in 0..n {
        let p0 = &points[(i + n - 1) % n];
        let p1 = &points[i];
        if p1
            .flags
            .intersects(PointFlags::FILL_BEVEL | PointFlags::FILL_INNER_BEVEL)
        {
            bevel_join(&mut mesh.strip, p0, p1, lw, rw, lu, ru, JoinFlags::FILL);
        } else {
            mesh.strip.push(Vertex::at(p1.pos + p1.dm * lw, lu, 1.0));
            mesh.strip.push(Vertex::at(p1.pos - p1.dm * rw, ru, 1.0));
        }
    }

    let first = mesh.strip[0].position();
    let second = mesh.strip[1].position();
    mesh.strip.push(Vertex::at(first, lu, 1.0));
    mesh.strip.push(Vertex::at(second, ru, 1.0));

    mesh
}

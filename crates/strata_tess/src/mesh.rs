//! Triangulated geometry

use strata_core::{BoundingBox, Point};

/// A vertex for path rendering
///
/// `u` runs across a stroke (0 on the left edge, 1 on the right, 0.5 on the
/// center line) and `v` is 0 on the outer edge of a cap fringe and 1
/// elsewhere. Backends derive antialiasing coverage from both.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

impl Vertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self { x, y, u, v }
    }

    pub fn at(p: Point, u: f32, v: f32) -> Self {
        Self::new(p.x, p.y, u, v)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Geometry of one contour: a triangle fan for the interior and a triangle
/// strip for the stroke or antialiasing fringe
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub fan: Vec<Vertex>,
    pub strip: Vec<Vertex>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fan.is_empty() && self.strip.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.fan.len() + self.strip.len()
    }

    pub fn clear(&mut self) {
        self.fan.clear();
        self.strip.clear();
    }

    /// Bounds of every vertex position
    pub fn bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for v in self.fan.iter().chain(&self.strip) {
            bounds.include(v.position());
        }
        bounds
    }

    /// Raw bytes of the fan, ready for upload
    pub fn fan_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.fan)
    }

    /// Raw bytes of the strip, ready for upload
    pub fn strip_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.strip)
    }
}

/// Two triangles covering `bounds`, used for the cover pass of stencil fills
pub fn bounds_quad(bounds: &BoundingBox) -> [Vertex; 6] {
    let (l, t, r, b) = (bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y);
    [
        Vertex::new(l, b, 0.5, 1.0),
        Vertex::new(r, b, 0.5, 1.0),
        Vertex::new(r, t, 0.5, 1.0),
        Vertex::new(l, b, 0.5, 1.0),
        Vertex::new(r, t, 0.5, 1.0),
        Vertex::new(l, t, 0.5, 1.0),
    ]
}

/// Expand a triangle fan into a flat triangle list
pub fn fan_to_triangles(fan: &[Vertex]) -> Vec<Vertex> {
    if fan.len() < 3 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity((fan.len() - 2) * 3);
    for i in 1..fan.len() - 1 {
        out.extend_from_slice(&[fan[0], fan[i], fan[i + 1]]);
    }
    out
}

/// Expand a triangle strip into a flat triangle list
pub fn strip_to_triangles(strip: &[Vertex]) -> Vec<Vertex> {
    if strip.len() < 3 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity((strip.len() - 2) * 3);
    for i in 0..strip.len() - 2 {
        // Keep a consistent orientation for odd triangles
        if i % 2 == 0 {
            out.extend_from_slice(&[strip[i], strip[i + 1], strip[i + 2]]);
        } else {
            out.extend_from_slice(&[strip[i + 1], strip[i], strip[i + 2]]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 16);
        let mesh = Mesh {
            fan: vec![Vertex::new(1.0, 2.0, 0.5, 1.0)],
            strip: Vec::new(),
        };
        assert_eq!(mesh.fan_bytes().len(), 16);
    }

    #[test]
    fn test_bounds_quad_covers_bounds() {
        let mut bounds = BoundingBox::empty();
        bounds.include(Point::new(1.0, 2.0));
        bounds.include(Point::new(5.0, 7.0));

        let quad = bounds_quad(&bounds);
        let mut covered = BoundingBox::empty();
        for v in &quad {
            covered.include(v.position());
            assert_eq!((v.u, v.v), (0.5, 1.0));
        }
        assert_eq!(covered, bounds);
    }

    #[test]
    fn test_fan_and_strip_expansion() {
        let verts: Vec<Vertex> = (0..5)
            .map(|i| Vertex::new(i as f32, 0.0, 0.0, 1.0))
            .collect();
        assert_eq!(fan_to_triangles(&verts).len(), 9);
        assert_eq!(strip_to_triangles(&verts).len(), 9);
        assert!(fan_to_triangles(&verts[..2]).is_empty());
    }
}

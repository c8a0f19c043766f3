//! Cached shapes
//!
//! A [`Shape`] keeps the tessellated fill and stroke of a path between
//! frames. Geometry is rebuilt only when an input that shapes it changes;
//! paint, alpha, scissor and clips are taken from the canvas on every draw.

use strata_core::{Affine2D, Path, Stroke, Winding};
use strata_tess::{Dasher, FillGeometry, PathMesh, StrokeGeometry, TessellationContext};

/// Inputs a cached fill depends on
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FillKey {
    pub device_pixel_ratio: f32,
    pub antialias: bool,
    pub transform: Affine2D,
    pub winding: Option<Winding>,
}

/// Inputs a cached stroke depends on
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StrokeKey {
    pub fill: FillKey,
    pub stroke: Stroke,
}

#[derive(Clone, Debug)]
struct Cached<K, G> {
    key: K,
    geometry: G,
}

/// Cache hit and miss counts of one shape
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShapeCacheStats {
    pub hits: u32,
    pub misses: u32,
}

/// A path with cached fill and stroke geometry
#[derive(Clone, Debug, Default)]
pub struct Shape {
    path: Path,
    fill: Option<Cached<FillKey, FillGeometry>>,
    stroke: Option<Cached<StrokeKey, StrokeGeometry>>,
    stats: ShapeCacheStats,
}

impl Shape {
    pub fn new(path: Path) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: Path) {
        self.path = path;
        self.invalidate();
    }

    /// Edit the path in place; drops all cached geometry
    pub fn path_mut(&mut self) -> &mut Path {
        self.invalidate();
        &mut self.path
    }

    pub fn invalidate(&mut self) {
        self.fill = None;
        self.stroke = None;
    }

    pub fn is_fill_cached(&self) -> bool {
        self.fill.is_some()
    }

    pub fn is_stroke_cached(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn cache_stats(&self) -> ShapeCacheStats {
        self.stats
    }

    pub(crate) fn fill_geometry(&mut self, key: FillKey, ctx: &TessellationContext) -> &FillGeometry {
        if self.fill.as_ref().is_some_and(|c| c.key == key) {
            self.stats.hits += 1;
        } else {
            self.fill = None;
        }

        let path = &self.path;
        let stats = &mut self.stats;
        let cached = self.fill.get_or_insert_with(|| {
            stats.misses += 1;
            let mesh = PathMesh::from_path(path, &key.transform, ctx);
            Cached {
                geometry: mesh.fill(ctx),
                key,
            }
        });
        &cached.geometry
    }

    pub(crate) fn stroke_geometry(
        &mut self,
        key: StrokeKey,
        ctx: &TessellationContext,
    ) -> &StrokeGeometry {
        if self.stroke.as_ref().is_some_and(|c| c.key == key) {
            self.stats.hits += 1;
        } else {
            self.stroke = None;
        }

        let path = &self.path;
        let stats = &mut self.stats;
        let cached = self.stroke.get_or_insert_with(|| {
            stats.misses += 1;
            let mesh = PathMesh::from_path(path, &key.fill.transform, ctx);
            Cached {
                geometry: stroke_mesh(&mesh, &key.stroke, key.fill.transform.average_scale(), ctx),
                key,
            }
        });
        &cached.geometry
    }
}

/// Stroke `mesh`, dashing it when `stroke` has a usable pattern.
///
/// Dash lengths are in user space and scaled into device space with the
/// transform's average scale.
pub(crate) fn stroke_mesh(
    mesh: &PathMesh,
    stroke: &Stroke,
    scale: f32,
    ctx: &TessellationContext,
) -> StrokeGeometry {
    if stroke.is_dashed() {
        let pattern: Vec<f32> = stroke.dash.iter().map(|d| d * scale).collect();
        if let Some(dasher) = Dasher::new(&pattern, stroke.dash_offset * scale) {
            return mesh.stroke_dashed(ctx, &dasher);
        }
        tracing::trace!(pattern = ?stroke.dash, "unusable dash pattern, stroking solid");
    }
    mesh.stroke(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Rect;
    use strata_tess::TessellationConfig;

    fn shape() -> Shape {
        let mut path = Path::new();
        path.rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        Shape::new(path)
    }

    fn fill_key(transform: Affine2D) -> FillKey {
        FillKey {
            device_pixel_ratio: 1.0,
            antialias: true,
            transform,
            winding: None,
        }
    }

    fn ctx() -> TessellationContext {
        TessellationContext::new(&TessellationConfig::default())
    }

    #[test]
    fn test_fill_cached_until_transform_changes() {
        let mut shape = shape();
        shape.fill_geometry(fill_key(Affine2D::IDENTITY), &ctx());
        shape.fill_geometry(fill_key(Affine2D::IDENTITY), &ctx());
        assert_eq!(shape.cache_stats(), ShapeCacheStats { hits: 1, misses: 1 });

        let moved = shape
            .fill_geometry(fill_key(Affine2D::translation(5.0, 0.0)), &ctx())
            .bounds;
        assert_eq!(shape.cache_stats().misses, 2);
        assert!((moved.min.x - 5.0).abs() < 1.0);
    }

    #[test]
    fn test_stroke_invalidated_by_style() {
        let mut shape = shape();
        let key = |width: f32| StrokeKey {
            fill: fill_key(Affine2D::IDENTITY),
            stroke: Stroke::new(width),
        };

        shape.stroke_geometry(key(2.0), &ctx());
        shape.stroke_geometry(key(2.0), &ctx());
        shape.stroke_geometry(key(4.0), &ctx());
        assert_eq!(shape.cache_stats(), ShapeCacheStats { hits: 1, misses: 2 });
        assert!(shape.is_stroke_cached());
        assert!(!shape.is_fill_cached());
    }

    #[test]
    fn test_path_edits_invalidate() {
        let mut shape = shape();
        shape.fill_geometry(fill_key(Affine2D::IDENTITY), &ctx());
        assert!(shape.is_fill_cached());

        shape.path_mut().circle(50.0, 50.0, 5.0);
        assert!(!shape.is_fill_cached());
        let geometry = shape.fill_geometry(fill_key(Affine2D::IDENTITY), &ctx());
        assert_eq!(geometry.meshes.len(), 2);
    }

    #[test]
    fn test_dash_scaled_with_transform() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(10.0, 0.0);
        let stroke = Stroke::new(1.0).with_dash(vec![1.0, 1.0], 0.0);
        let ctx = ctx().with_stroke(&stroke);

        // Ten user units become twenty device units: still five dashes
        let scale = Affine2D::scale(2.0, 2.0);
        let mesh = PathMesh::from_path(&path, &scale, &ctx);
        let geometry = stroke_mesh(&mesh, &stroke, scale.average_scale(), &ctx);
        assert_eq!(geometry.meshes.len(), 5);
    }

    #[test]
    fn test_invalid_dash_strokes_solid() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(10.0, 0.0);
        let stroke = Stroke::new(1.0).with_dash(vec![2.0, -1.0], 0.0);
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx());
        let geometry = stroke_mesh(&mesh, &stroke, 1.0, &ctx());
        assert_eq!(geometry.meshes.len(), 1);
    }
}

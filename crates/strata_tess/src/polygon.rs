//! CPU triangulation of complex fills
//!
//! Backends without a stencil buffer can resolve self-intersecting or
//! multi-contour fills into plain triangles with lyon's fill tessellator.

use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers,
};
use lyon::math::point;
use lyon::path::PathEvent;
use serde::{Deserialize, Serialize};
use strata_core::{Affine2D, Path, PathCommand, Point};

use crate::mesh::Vertex;

/// Rule deciding which regions of a self-overlapping path are inside
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl From<FillRule> for lyon::lyon_tessellation::FillRule {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::NonZero => lyon::lyon_tessellation::FillRule::NonZero,
            FillRule::EvenOdd => lyon::lyon_tessellation::FillRule::EvenOdd,
        }
    }
}

/// Indexed triangle list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TessellatedFill {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl TessellatedFill {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat triangle list, three vertices per triangle
    pub fn to_triangles(&self) -> Vec<Vertex> {
        self.indices
            .iter()
            .filter_map(|&i| self.vertices.get(i as usize).copied())
            .collect()
    }
}

/// Convert path commands to lyon path events
fn path_events(path: &Path, xform: &Affine2D) -> Vec<PathEvent> {
    let mut events = Vec::new();
    let mut first: Option<Point> = None;
    let mut current = Point::ZERO;

    let begin = |events: &mut Vec<PathEvent>, first: &mut Option<Point>, at: Point| {
        if first.is_none() {
            events.push(PathEvent::Begin {
                at: point(at.x, at.y),
            });
            *first = Some(at);
        }
    };

    for cmd in path.commands() {
        match cmd.transformed(xform) {
            PathCommand::MoveTo(p) => {
                if let Some(start) = first.take() {
                    events.push(PathEvent::End {
                        last: point(current.x, current.y),
                        first: point(start.x, start.y),
                        close: false,
                    });
                }
                begin(&mut events, &mut first, p);
                current = p;
            }
            PathCommand::LineTo(p) => {
                begin(&mut events, &mut first, current);
                events.push(PathEvent::Line {
                    from: point(current.x, current.y),
                    to: point(p.x, p.y),
                });
                current = p;
            }
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => {
                begin(&mut events, &mut first, current);
                events.push(PathEvent::Cubic {
                    from: point(current.x, current.y),
                    ctrl1: point(control1.x, control1.y),
                    ctrl2: point(control2.x, control2.y),
                    to: point(end.x, end.y),
                });
                current = end;
            }
            PathCommand::Close => {
                if let Some(start) = first.take() {
                    events.push(PathEvent::End {
                        last: point(current.x, current.y),
                        first: point(start.x, start.y),
                        close: true,
                    });
                    current = start;
                }
            }
            // Orientation does not matter to the sweep-line tessellator
            PathCommand::Winding(_) => {}
        }
    }

    if let Some(start) = first {
        events.push(PathEvent::End {
            last: point(current.x, current.y),
            first: point(start.x, start.y),
            close: false,
        });
    }

    events
}

/// Tessellate `path`, mapped through `xform`, into interior triangles.
///
/// Failures are logged and yield an empty result.
pub fn tessellate_fill(
    path: &Path,
    xform: &Affine2D,
    rule: FillRule,
    tolerance: f32,
) -> TessellatedFill {
    let events = path_events(path, xform);
    if events.is_empty() {
        return TessellatedFill::default();
    }

    let mut geometry: VertexBuffers<Vertex, u32> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();
    let options = FillOptions::default()
        .with_tolerance(tolerance.max(1e-3))
        .with_fill_rule(rule.into());

    let result = tessellator.tessellate(
        events.iter().cloned(),
        &options,
        &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
            let p = vertex.position();
            Vertex::new(p.x, p.y, 0.5, 1.0)
        }),
    );

    if let Err(err) = result {
        tracing::warn!("Path fill tessellation failed: {:?}", err);
        return TessellatedFill::default();
    }

    tracing::trace!(
        vertices = geometry.vertices.len(),
        triangles = geometry.indices.len() / 3,
        ?rule,
        "fill tessellated on the CPU"
    );

    TessellatedFill {
        vertices: geometry.vertices,
        indices: geometry.indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Rect;

    fn triangle_area(t: &[Vertex]) -> f32 {
        ((t[1].x - t[0].x) * (t[2].y - t[0].y) - (t[2].x - t[0].x) * (t[1].y - t[0].y)).abs() * 0.5
    }

    fn covered_area(fill: &TessellatedFill) -> f32 {
        fill.to_triangles().chunks(3).map(triangle_area).sum()
    }

    #[test]
    fn test_tessellate_rect() {
        let mut path = Path::new();
        path.rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        let fill = tessellate_fill(&path, &Affine2D::IDENTITY, FillRule::NonZero, 0.1);

        assert_eq!(fill.triangle_count(), 2);
        assert!((covered_area(&fill) - 5000.0).abs() < 1e-2);
        assert!(fill.vertices.iter().all(|v| v.u == 0.5 && v.v == 1.0));
    }

    #[test]
    fn test_fill_rule_on_nested_squares() {
        // Both squares wound the same way
        let mut path = Path::new();
        path.rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        path.rect(Rect::new(2.0, 2.0, 6.0, 6.0));

        let non_zero = tessellate_fill(&path, &Affine2D::IDENTITY, FillRule::NonZero, 0.1);
        let even_odd = tessellate_fill(&path, &Affine2D::IDENTITY, FillRule::EvenOdd, 0.1);
        assert!((covered_area(&non_zero) - 100.0).abs() < 1e-2);
        assert!((covered_area(&even_odd) - 64.0).abs() < 1e-2);
    }

    #[test]
    fn test_transform_applied() {
        let mut path = Path::new();
        path.rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let fill = tessellate_fill(&path, &Affine2D::scale(3.0, 2.0), FillRule::NonZero, 0.1);
        assert!((covered_area(&fill) - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_path() {
        let fill = tessellate_fill(&Path::new(), &Affine2D::IDENTITY, FillRule::EvenOdd, 0.1);
        assert!(fill.is_empty());
        assert!(fill.to_triangles().is_empty());
    }

    #[test]
    fn test_fill_rule_serde_names() {
        assert_eq!(
            serde_json::to_string(&FillRule::EvenOdd).unwrap(),
            "\"even_odd\""
        );
    }
}

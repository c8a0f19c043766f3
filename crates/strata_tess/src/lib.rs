//! Strata Tessellation
//!
//! Turns [`strata_core::Path`]s into antialiased triangle geometry:
//!
//! - **Contours**: paths are flattened into polylines whose points carry
//!   directions, miter vectors and join flags
//! - **Fill**: a triangle fan per contour plus an antialiasing fringe strip
//! - **Stroke**: one triangle strip per contour with joins and caps
//! - **Dash**: visible runs of a dash pattern, stroked like open contours
//! - **Polygon**: CPU triangulation of complex fills through lyon
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Affine2D, Path, Rect, Stroke};
//! use strata_tess::{PathMesh, TessellationConfig, TessellationContext};
//!
//! let mut path = Path::new();
//! path.rect(Rect::new(0.0, 0.0, 100.0, 50.0));
//!
//! let ctx = TessellationContext::new(&TessellationConfig::default())
//!     .with_stroke(&Stroke::new(2.0));
//! let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx);
//!
//! let fill = mesh.fill(&ctx);
//! assert!(fill.convex);
//!
//! let stroke = mesh.stroke(&ctx);
//! assert_eq!(stroke.meshes.len(), 1);
//! ```

pub mod config;
pub mod contour;
pub mod dash;
pub mod fill;
mod join;
pub mod mesh;
pub mod polygon;
pub mod stroke;

pub use config::{ConfigError, TessellationConfig, TessellationContext};
pub use contour::{Contour, ContourPoint, PathMesh, PointFlags};
pub use dash::Dasher;
pub use fill::{fill_contour, FillGeometry};
pub use mesh::{bounds_quad, fan_to_triangles, strip_to_triangles, Mesh, Vertex};
pub use polygon::{tessellate_fill, FillRule, TessellatedFill};
pub use stroke::{cap_fragments, stroke_contour, stroke_coverage, StrokeGeometry};

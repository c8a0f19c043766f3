//! Strata Core
//!
//! Foundational types for the Strata vector drawing engine:
//!
//! - **Geometry**: points, rectangles, bounding boxes and 2D affine transforms
//! - **Paint**: colors, gradients, image paints and blend modes
//! - **Stroke**: line caps, joins, miter limits and dash patterns
//! - **Path**: an append-only command list with arcs, shapes, bounds, area,
//!   reversal and SVG path-data parsing
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Path, Point};
//!
//! let mut path = Path::new();
//! path.move_to(0.0, 0.0)
//!     .line_to(10.0, 0.0)
//!     .line_to(10.0, 10.0)
//!     .close();
//!
//! let bounds = path.bounds();
//! assert_eq!(bounds.max, Point::new(10.0, 10.0));
//! ```

pub mod error;
pub mod geometry;
pub mod paint;
pub mod path;
pub mod stroke;

pub use error::{Error, Result};
pub use geometry::{Affine2D, BoundingBox, Direction, Point, Rect, Size, Vec2, Winding};
pub use paint::{BlendMode, Color, Gradient, GradientSpread, GradientStop, ImageId, Paint};
pub use path::{ArcKind, Path, PathCommand, PathView};
pub use stroke::{LineCap, LineJoin, Stroke};

//! Paint model
//!
//! What a fill or stroke is painted with. Solid colors, gradients and image
//! patterns are described here; resolving them into shader parameters is the
//! backend's job.

use crate::geometry::{Affine2D, Point, Rect, Size};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Color
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color (linear space)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from `0xRRGGBB`
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    /// Build from 8-bit channels
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Color channels multiplied by alpha
    pub fn premultiplied(&self) -> [f32; 4] {
        [self.r * self.a, self.g * self.a, self.b * self.a, self.a]
    }

    /// Linear interpolation between two colors
    pub fn lerp(a: &Color, b: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gradients
// ─────────────────────────────────────────────────────────────────────────────

/// Gradient stop
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient (0.0 to 1.0)
    pub offset: f32,
    /// Color at this stop
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self {
            offset: offset.clamp(0.0, 1.0),
            color,
        }
    }
}

/// Gradient spread method for areas outside the gradient
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientSpread {
    /// Pad with the end colors
    #[default]
    Pad,
    /// Reflect the gradient
    Reflect,
    /// Repeat the gradient
    Repeat,
}

/// Gradient geometry and color ramp
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gradient {
    /// Linear gradient between two points
    Linear {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
        spread: GradientSpread,
    },
    /// Radial gradient, optionally focused away from its center
    Radial {
        center: Point,
        focal: Option<Point>,
        radius: f32,
        stops: Vec<GradientStop>,
        spread: GradientSpread,
    },
    /// Rounded box gradient with a feathered edge
    Box {
        rect: Rect,
        radius: f32,
        feather: f32,
        stops: Vec<GradientStop>,
        spread: GradientSpread,
    },
    /// Conic/angular gradient around a center point
    Conic {
        center: Point,
        start_angle: f32,
        stops: Vec<GradientStop>,
    },
}

impl Gradient {
    /// Two-color linear gradient
    pub fn linear(start: Point, end: Point, from: Color, to: Color) -> Self {
        Gradient::Linear {
            start,
            end,
            stops: vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
            spread: GradientSpread::Pad,
        }
    }

    /// Two-color radial gradient
    pub fn radial(center: Point, radius: f32, from: Color, to: Color) -> Self {
        Gradient::Radial {
            center,
            focal: None,
            radius,
            stops: vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
            spread: GradientSpread::Pad,
        }
    }

    /// Two-color box gradient
    pub fn boxed(rect: Rect, radius: f32, feather: f32, from: Color, to: Color) -> Self {
        Gradient::Box {
            rect,
            radius,
            feather,
            stops: vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
            spread: GradientSpread::Pad,
        }
    }

    /// Two-color conic gradient
    pub fn conic(center: Point, from: Color, to: Color) -> Self {
        Gradient::Conic {
            center,
            start_angle: 0.0,
            stops: vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
        }
    }

    pub fn stops(&self) -> &[GradientStop] {
        match self {
            Gradient::Linear { stops, .. }
            | Gradient::Radial { stops, .. }
            | Gradient::Box { stops, .. }
            | Gradient::Conic { stops, .. } => stops,
        }
    }

    pub fn spread(&self) -> GradientSpread {
        match self {
            Gradient::Linear { spread, .. }
            | Gradient::Radial { spread, .. }
            | Gradient::Box { spread, .. } => *spread,
            Gradient::Conic { .. } => GradientSpread::Repeat,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Paint
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to an image owned by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub u64);

/// Source of color for a fill or stroke
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Paint {
    Solid(Color),
    Gradient {
        gradient: Gradient,
        /// Maps gradient space to user space
        transform: Affine2D,
    },
    Image {
        image: ImageId,
        /// Maps the image rectangle to user space
        transform: Affine2D,
        extent: Size,
        alpha: f32,
    },
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Solid(Color::BLACK)
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Solid(color)
    }
}

impl From<Gradient> for Paint {
    fn from(gradient: Gradient) -> Self {
        Paint::Gradient {
            gradient,
            transform: Affine2D::IDENTITY,
        }
    }
}

impl Paint {
    /// Image pattern covering `rect`, rotated by `angle` radians around its origin
    pub fn image(image: ImageId, rect: Rect, angle: f32, alpha: f32) -> Self {
        let transform =
            Affine2D::translation(rect.x(), rect.y()).then(&Affine2D::rotation(angle));
        Paint::Image {
            image,
            transform,
            extent: rect.size,
            alpha,
        }
    }

    /// Solid color of this paint, if any
    pub fn solid_color(&self) -> Option<Color> {
        match self {
            Paint::Solid(color) => Some(*color),
            _ => None,
        }
    }

    /// Paint with its transform premultiplied by `xform`
    pub fn transformed(&self, xform: &Affine2D) -> Paint {
        match self {
            Paint::Solid(color) => Paint::Solid(*color),
            Paint::Gradient {
                gradient,
                transform,
            } => Paint::Gradient {
                gradient: gradient.clone(),
                transform: xform.then(transform),
            },
            Paint::Image {
                image,
                transform,
                extent,
                alpha,
            } => Paint::Image {
                image: *image,
                transform: xform.then(transform),
                extent: *extent,
                alpha: *alpha,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Blending
// ─────────────────────────────────────────────────────────────────────────────

/// Blend mode used when compositing a draw command
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    SrcOver,
    Src,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcAtop,
    DstAtop,
    Xor,
    Add,
    Multiply,
    Screen,
}

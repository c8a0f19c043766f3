//! Post-processing effects applied when a layer's target is finished.
//!
//! The render graph only carries these to [`Backend::end_target`]; how an
//! effect is realized is up to the backend.
//!
//! [`Backend::end_target`]: crate::backend::Backend::end_target

use serde::{Deserialize, Serialize};
use strata_core::Color;

/// Effect applied to a layer before it is composited into its parent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerEffect {
    /// Gaussian blur
    Blur {
        /// Blur radius in device pixels
        radius: f32,
    },
    /// Shadow rendered behind the layer content
    DropShadow {
        offset_x: f32,
        offset_y: f32,
        blur: f32,
        color: Color,
    },
    /// Uniform opacity
    Opacity { alpha: f32 },
    /// 4x5 row-major color matrix, last column is the offset
    ColorMatrix { matrix: [f32; 20] },
}

impl LayerEffect {
    pub fn blur(radius: f32) -> Self {
        Self::Blur { radius }
    }

    pub fn drop_shadow(offset_x: f32, offset_y: f32, blur: f32, color: Color) -> Self {
        Self::DropShadow {
            offset_x,
            offset_y,
            blur,
            color,
        }
    }

    pub fn opacity(alpha: f32) -> Self {
        Self::Opacity {
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Color matrix that converts to luminance
    pub fn grayscale() -> Self {
        let (r, g, b) = (0.2126, 0.7152, 0.0722);
        Self::ColorMatrix {
            #[rustfmt::skip]
            matrix: [
                r, g, b, 0.0, 0.0,
                r, g, b, 0.0, 0.0,
                r, g, b, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0, 0.0,
            ],
        }
    }

    /// How far the effect can paint outside the layer content, in pixels
    pub fn outset(&self) -> f32 {
        match self {
            LayerEffect::Blur { radius } => radius.max(0.0) * 3.0,
            LayerEffect::DropShadow {
                offset_x,
                offset_y,
                blur,
                ..
            } => offset_x.abs().max(offset_y.abs()) + blur.max(0.0) * 3.0,
            LayerEffect::Opacity { .. } | LayerEffect::ColorMatrix { .. } => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outset() {
        assert_eq!(LayerEffect::blur(2.0).outset(), 6.0);
        assert_eq!(
            LayerEffect::drop_shadow(-4.0, 1.0, 1.0, Color::BLACK).outset(),
            7.0
        );
        assert_eq!(LayerEffect::opacity(0.5).outset(), 0.0);
    }

    #[test]
    fn test_opacity_clamped() {
        assert_eq!(LayerEffect::opacity(3.0), LayerEffect::Opacity { alpha: 1.0 });
    }

    #[test]
    fn test_grayscale_keeps_alpha() {
        let LayerEffect::ColorMatrix { matrix } = LayerEffect::grayscale() else {
            panic!("expected a color matrix");
        };
        assert_eq!(matrix[18], 1.0);
        let row_sum: f32 = matrix[0..3].iter().sum();
        assert!((row_sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&LayerEffect::blur(1.5)).unwrap();
        assert_eq!(json, r#"{"kind":"blur","radius":1.5}"#);
        let back: LayerEffect = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LayerEffect::blur(1.5));
    }
}

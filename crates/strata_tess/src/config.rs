//! Tessellation configuration and per-call context

use serde::{Deserialize, Serialize};
use strata_core::{LineCap, LineJoin, Stroke, Winding};
use thiserror::Error;

/// Errors from loading a tessellation configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Tolerances and antialiasing settings shared by every tessellation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationConfig {
    /// Device pixels per user-space unit
    pub device_pixel_ratio: f32,
    /// Whether fills and strokes get an antialiasing fringe
    pub antialias: bool,
    /// Points closer than this are merged
    pub distance_tolerance: f32,
    /// Curve flatness tolerance; derived from the pixel ratio when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tessellation_tolerance: Option<f32>,
    /// Miter limit used for fill fringes
    pub fill_miter_limit: f32,
    /// Stroke widths (in device space) are clamped to this value
    pub max_stroke_width: f32,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            antialias: true,
            distance_tolerance: 0.1,
            tessellation_tolerance: None,
            fill_miter_limit: 2.4,
            max_stroke_width: 200.0,
        }
    }
}

impl TessellationConfig {
    /// Set the device pixel ratio
    pub fn with_device_pixel_ratio(mut self, ratio: f32) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// Enable or disable antialiasing fringes
    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    /// Override the derived curve flatness tolerance
    pub fn with_tessellation_tolerance(mut self, tolerance: f32) -> Self {
        self.tessellation_tolerance = Some(tolerance);
        self
    }

    pub fn with_distance_tolerance(mut self, tolerance: f32) -> Self {
        self.distance_tolerance = tolerance;
        self
    }

    /// Effective flatness tolerance
    pub fn effective_tessellation_tolerance(&self) -> f32 {
        self.tessellation_tolerance
            .unwrap_or(0.25 / self.device_pixel_ratio)
    }

    /// Width of the antialiasing fringe (one device pixel)
    pub fn fringe_width(&self) -> f32 {
        1.0 / self.device_pixel_ratio
    }

    /// Check the values that would otherwise divide by zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_pixel_ratio.is_nan() || self.device_pixel_ratio <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "device_pixel_ratio must be positive, got {}",
                self.device_pixel_ratio
            )));
        }
        if self.distance_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "distance_tolerance must not be negative, got {}",
                self.distance_tolerance
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable inputs of one contour build and triangulation.
///
/// Resolved from a [`TessellationConfig`] plus the stroke style and transform
/// scale in effect for the draw call.
#[derive(Clone, Debug, PartialEq)]
pub struct TessellationContext {
    pub device_pixel_ratio: f32,
    pub tessellation_tolerance: f32,
    pub distance_tolerance: f32,
    pub fringe_width: f32,
    pub antialias: bool,
    pub fill_miter_limit: f32,
    pub max_stroke_width: f32,
    /// Stroke width in user space
    pub stroke_width: f32,
    /// Average scale of the user-to-device transform
    pub average_scale: f32,
    pub line_join: LineJoin,
    pub line_cap: LineCap,
    pub miter_limit: f32,
    /// Winding applied to contours without an explicit override
    pub winding: Option<Winding>,
}

impl Default for TessellationContext {
    fn default() -> Self {
        Self::new(&TessellationConfig::default())
    }
}

impl TessellationContext {
    pub fn new(config: &TessellationConfig) -> Self {
        let stroke = Stroke::default();
        Self {
            device_pixel_ratio: config.device_pixel_ratio,
            tessellation_tolerance: config.effective_tessellation_tolerance(),
            distance_tolerance: config.distance_tolerance,
            fringe_width: config.fringe_width(),
            antialias: config.antialias,
            fill_miter_limit: config.fill_miter_limit,
            max_stroke_width: config.max_stroke_width,
            stroke_width: stroke.width,
            average_scale: 1.0,
            line_join: stroke.join,
            line_cap: stroke.cap,
            miter_limit: stroke.miter_limit,
            winding: None,
        }
    }

    /// Take width, joins, caps and miter limit from `stroke`
    pub fn with_stroke(mut self, stroke: &Stroke) -> Self {
        self.stroke_width = stroke.width;
        self.line_join = stroke.join;
        self.line_cap = stroke.cap;
        self.miter_limit = stroke.miter_limit;
        self
    }

    pub fn with_average_scale(mut self, scale: f32) -> Self {
        self.average_scale = scale;
        self
    }

    pub fn with_winding(mut self, winding: Option<Winding>) -> Self {
        self.winding = winding;
        self
    }

    /// Half-width of the fill fringe
    pub fn fill_width(&self) -> f32 {
        if self.antialias {
            self.fringe_width
        } else {
            0.0
        }
    }

    /// Stroke half-width in device space, including half a fringe when
    /// antialiased
    pub fn stroke_half_width(&self) -> f32 {
        let w = (self.stroke_width * self.average_scale).clamp(0.0, self.max_stroke_width) * 0.5;
        if self.antialias {
            w + self.fringe_width * 0.5
        } else {
            w
        }
    }
}

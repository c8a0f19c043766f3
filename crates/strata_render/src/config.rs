//! Canvas configuration presets

use serde::{Deserialize, Serialize};
use strata_tess::{FillRule, TessellationConfig};

use crate::error::{RenderError, Result};

/// How fills that are not convex reach the backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexFill {
    /// Stencil the fans, then cover the bounds
    #[default]
    Stencil,
    /// Triangulate on the CPU into plain triangles
    CpuTriangulate,
}

/// Configuration for a [`Canvas`](crate::canvas::Canvas)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Draw strokes with a stencil pass so overlaps blend once
    pub stencil_strokes: bool,
    /// Strategy for fills that are not convex
    pub complex_fill: ComplexFill,
    /// Fill rule for CPU-triangulated fills
    pub fill_rule: FillRule,
    /// Deepest allowed layer nesting
    pub max_layer_depth: usize,
    /// Tolerances, pixel ratio and antialiasing
    pub tessellation: TessellationConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl CanvasConfig {
    /// Standard configuration for general use
    pub fn standard() -> Self {
        Self {
            tessellation: TessellationConfig::default(),
            stencil_strokes: true,
            complex_fill: ComplexFill::Stencil,
            fill_rule: FillRule::NonZero,
            max_layer_depth: 16,
        }
    }

    /// Retina-class displays at twice the pixel density
    pub fn hidpi() -> Self {
        Self {
            tessellation: TessellationConfig::default().with_device_pixel_ratio(2.0),
            ..Self::standard()
        }
    }

    /// No antialiasing fringes and no stencil strokes
    pub fn aliased() -> Self {
        Self {
            tessellation: TessellationConfig::default().with_antialias(false),
            stencil_strokes: false,
            ..Self::standard()
        }
    }

    /// Testing configuration: every fill resolved on the CPU, shallow layers
    pub fn testing() -> Self {
        Self {
            tessellation: TessellationConfig::default(),
            stencil_strokes: false,
            complex_fill: ComplexFill::CpuTriangulate,
            fill_rule: FillRule::NonZero,
            max_layer_depth: 4,
        }
    }

    pub fn with_tessellation(mut self, tessellation: TessellationConfig) -> Self {
        self.tessellation = tessellation;
        self
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f32) -> Self {
        self.tessellation = self.tessellation.with_device_pixel_ratio(ratio);
        self
    }

    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.tessellation = self.tessellation.with_antialias(antialias);
        self
    }

    pub fn with_stencil_strokes(mut self, enabled: bool) -> Self {
        self.stencil_strokes = enabled;
        self
    }

    pub fn with_complex_fill(mut self, strategy: ComplexFill) -> Self {
        self.complex_fill = strategy;
        self
    }

    pub fn with_fill_rule(mut self, rule: FillRule) -> Self {
        self.fill_rule = rule;
        self
    }

    pub fn with_max_layer_depth(mut self, depth: usize) -> Self {
        self.max_layer_depth = depth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.tessellation.validate()?;
        Ok(())
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| RenderError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| RenderError::Config(e.to_string()))
    }
}

//! Scene files
//!
//! A scene is a TOML list of canvas operations replayed in order:
//!
//! ```toml
//! width = 320
//! height = 240
//!
//! [[items]]
//! kind = "background"
//! color = "#ffffff"
//!
//! [[items]]
//! kind = "path"
//! data = "M10 10 L100 10 L100 100 Z"
//! fill = "#ff0000"
//! stroke = "#000000"
//! stroke_style = { width = 2.0, join = "round" }
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path as FsPath;

use strata_core::{Color, Path, Rect, Stroke};
use strata_render::{Canvas, CanvasConfig, ClipOperation, DrawingStyle, LayerEffect};

/// A canvas size plus the operations drawn on it
#[derive(Debug, Deserialize, Serialize)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    /// Canvas settings; the standard preset when absent
    #[serde(default)]
    pub canvas: Option<CanvasConfig>,
    #[serde(default)]
    pub items: Vec<SceneItem>,
}

/// One canvas operation
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneItem {
    Background {
        color: String,
    },
    Path {
        /// SVG path data
        data: String,
        #[serde(default)]
        fill: Option<String>,
        #[serde(default)]
        stroke: Option<String>,
        #[serde(default)]
        stroke_style: Option<Stroke>,
    },
    Rect {
        rect: [f32; 4],
        color: String,
    },
    Save,
    Restore,
    Translate {
        x: f32,
        y: f32,
    },
    Scale {
        x: f32,
        y: f32,
    },
    Rotate {
        degrees: f32,
    },
    Alpha {
        alpha: f32,
    },
    Clip {
        rect: [f32; 4],
        #[serde(default)]
        op: ClipOperation,
    },
    Scissor {
        rect: [f32; 4],
    },
    PushLayer {
        bounds: [f32; 4],
        #[serde(default)]
        effect: Option<LayerEffect>,
    },
    PopLayer,
}

impl Scene {
    pub fn load(path: &FsPath) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let scene: Scene = toml::from_str(source)?;
        if !(scene.width > 0.0 && scene.height > 0.0) {
            bail!("scene size must be positive, got {}x{}", scene.width, scene.height);
        }
        Ok(scene)
    }

    pub fn canvas_config(&self) -> CanvasConfig {
        self.canvas.clone().unwrap_or_default()
    }

    /// Record every item into `canvas`, which must be inside a frame
    pub fn replay(&self, canvas: &mut Canvas) -> Result<()> {
        for (index, item) in self.items.iter().enumerate() {
            replay_item(canvas, item).with_context(|| format!("scene item {}", index))?;
        }
        Ok(())
    }
}

fn rect(r: &[f32; 4]) -> Rect {
    Rect::new(r[0], r[1], r[2], r[3])
}

fn replay_item(canvas: &mut Canvas, item: &SceneItem) -> Result<()> {
    match item {
        SceneItem::Background { color } => canvas.fill_background(parse_color(color)?)?,
        SceneItem::Path {
            data,
            fill,
            stroke,
            stroke_style,
        } => {
            let path = Path::from_svg(data)?;
            canvas.save();
            if let Some(fill) = fill {
                canvas.set_fill_paint(parse_color(fill)?);
            }
            if let Some(stroke) = stroke {
                canvas.set_stroke_paint(parse_color(stroke)?);
            }
            if let Some(style) = stroke_style {
                canvas.set_stroke(style.clone());
            }
            let style = match (fill.is_some(), stroke.is_some()) {
                (_, false) => DrawingStyle::Fill,
                (false, true) => DrawingStyle::Stroke,
                (true, true) => DrawingStyle::FillAndStroke,
            };
            canvas.set_drawing_style(style);
            let drawn = canvas.draw_path(&path);
            canvas.restore();
            drawn?;
        }
        SceneItem::Rect { rect: r, color } => {
            canvas.save();
            canvas.set_fill_paint(parse_color(color)?);
            let drawn = canvas.fill_rect(rect(r));
            canvas.restore();
            drawn?;
        }
        SceneItem::Save => canvas.save(),
        SceneItem::Restore => {
            if !canvas.restore() {
                tracing::warn!("restore without a matching save");
            }
        }
        SceneItem::Translate { x, y } => canvas.translate(*x, *y),
        SceneItem::Scale { x, y } => canvas.scale(*x, *y),
        SceneItem::Rotate { degrees } => canvas.rotate(degrees.to_radians()),
        SceneItem::Alpha { alpha } => canvas.set_global_alpha(*alpha),
        SceneItem::Clip { rect: r, op } => canvas.clip_rect(rect(r), *op)?,
        SceneItem::Scissor { rect: r } => canvas.intersect_scissor(rect(r)),
        SceneItem::PushLayer { bounds, effect } => canvas.push_layer(rect(bounds), effect.clone())?,
        SceneItem::PopLayer => canvas.pop_layer()?,
    }
    Ok(())
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
pub fn parse_color(text: &str) -> Result<Color> {
    let hex = text.trim().trim_start_matches('#');
    let digits = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 | 8 => hex.to_string(),
        _ => bail!("invalid color '{}'", text),
    };
    let value = u32::from_str_radix(&digits, 16).with_context(|| format!("invalid color '{}'", text))?;
    let color = if digits.len() == 8 {
        Color::from_rgba8(
            (value >> 24) as u8,
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        )
    } else {
        Color::from_hex(value)
    };
    Ok(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_render::RecordingBackend;

    const SCENE: &str = r##"
width = 200
height = 100

[canvas]
stencil_strokes = false

[[items]]
kind = "background"
color = "#fff"

[[items]]
kind = "translate"
x = 10.0
y = 10.0

[[items]]
kind = "push_layer"
bounds = [0.0, 0.0, 50.0, 50.0]
effect = { kind = "blur", radius = 2.0 }

[[items]]
kind = "path"
data = "M0 0 L40 0 L40 40 Z"
fill = "#ff0000"
stroke = "#000000"
stroke_style = { width = 2.0, join = "round" }

[[items]]
kind = "pop_layer"

[[items]]
kind = "clip"
rect = [0.0, 0.0, 20.0, 20.0]
op = "intersect"

[[items]]
kind = "rect"
rect = [0.0, 0.0, 100.0, 100.0]
color = "#00ff0080"
"##;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000").unwrap(), Color::RED);
        assert_eq!(parse_color("fff").unwrap(), Color::WHITE);
        let c = parse_color("#0000ff80").unwrap();
        assert_eq!(c.b, 1.0);
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#zzzzzz").is_err());
    }

    #[test]
    fn test_replay_scene() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        assert_eq!(scene.items.len(), 7);
        let config = scene.canvas_config();
        assert!(!config.stencil_strokes);

        let mut canvas = Canvas::new(scene.width, scene.height, config);
        let mut backend = RecordingBackend::new();
        canvas.begin_frame().unwrap();
        scene.replay(&mut canvas).unwrap();
        let stats = canvas.end_frame(&mut backend).unwrap();

        assert_eq!(stats.layers, 1);
        assert_eq!((stats.fills, stats.strokes, stats.clips), (3, 1, 1));
        // background, layer quad, clipped rect at the root; fill and stroke in the layer
        assert_eq!(stats.commands, 5);
    }

    #[test]
    fn test_unbalanced_layers_fail() {
        let scene = Scene::from_toml_str(
            "width = 10\nheight = 10\n[[items]]\nkind = \"pop_layer\"\n",
        )
        .unwrap();
        let mut canvas = Canvas::new(10.0, 10.0, scene.canvas_config());
        canvas.begin_frame().unwrap();
        let err = scene.replay(&mut canvas).unwrap_err();
        assert!(format!("{:#}", err).contains("scene item 0"));
    }

    #[test]
    fn test_invalid_scenes() {
        assert!(Scene::from_toml_str("width = 0\nheight = 10\n").is_err());
        assert!(Scene::from_toml_str("width = 10\nheight = 10\n[[items]]\nkind = \"spin\"\n").is_err());
    }
}

//! Strata CLI
//!
//! Tessellate SVG path data and replay scenes through the recording backend.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use strata_core::{Affine2D, LineCap, LineJoin, Path, Stroke};
use strata_render::{BackendEvent, Canvas, CanvasConfig, FrameStats, RecordingBackend};
use strata_tess::{Dasher, PathMesh, TessellationConfig, TessellationContext};

mod scene;

use scene::Scene;

#[derive(Parser)]
#[command(name = "strata")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Strata vector drawing engine CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tessellate SVG path data and report the resulting geometry
    Tessellate {
        /// SVG path data, e.g. "M0 0 L10 0 L10 10 Z"
        data: String,

        /// Stroke width; no stroke is tessellated when absent
        #[arg(short = 'w', long)]
        stroke_width: Option<f32>,

        #[arg(long, value_enum, default_value = "miter")]
        join: JoinArg,

        #[arg(long, value_enum, default_value = "butt")]
        cap: CapArg,

        /// Comma-separated dash pattern
        #[arg(long, value_delimiter = ',')]
        dash: Vec<f32>,

        /// Device pixel ratio
        #[arg(long, default_value = "1.0")]
        dpr: f32,

        /// Disable antialiasing fringes
        #[arg(long)]
        no_aa: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replay a TOML scene through the recording backend
    Render {
        /// Scene file
        scene: PathBuf,

        /// Canvas configuration file, overriding the scene's
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to replay
        #[arg(short, long, default_value = "1")]
        frames: u32,

        /// List every backend event
        #[arg(long)]
        events: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print a canvas configuration preset as TOML
    Config {
        #[arg(value_enum, default_value = "standard")]
        preset: Preset,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum JoinArg {
    Miter,
    Round,
    Bevel,
}

impl From<JoinArg> for LineJoin {
    fn from(arg: JoinArg) -> Self {
        match arg {
            JoinArg::Miter => LineJoin::Miter,
            JoinArg::Round => LineJoin::Round,
            JoinArg::Bevel => LineJoin::Bevel,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CapArg {
    Butt,
    Round,
    Square,
}

impl From<CapArg> for LineCap {
    fn from(arg: CapArg) -> Self {
        match arg {
            CapArg::Butt => LineCap::Butt,
            CapArg::Round => LineCap::Round,
            CapArg::Square => LineCap::Square,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Standard,
    Hidpi,
    Aliased,
    Testing,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Tessellate {
            data,
            stroke_width,
            join,
            cap,
            dash,
            dpr,
            no_aa,
            json,
        } => {
            let stroke = stroke_width.map(|width| {
                Stroke::new(width)
                    .with_join(join.into())
                    .with_cap(cap.into())
                    .with_dash(dash, 0.0)
            });
            let config = TessellationConfig::default()
                .with_device_pixel_ratio(dpr)
                .with_antialias(!no_aa);
            cmd_tessellate(&data, stroke.as_ref(), &config, json)
        }

        Commands::Render {
            scene,
            config,
            frames,
            events,
            json,
        } => cmd_render(&scene, config.as_deref(), frames, events, json),

        Commands::Config { preset } => cmd_config(preset),
    }
}

fn cmd_tessellate(
    data: &str,
    stroke: Option<&Stroke>,
    config: &TessellationConfig,
    json: bool,
) -> Result<()> {
    config.validate()?;
    let path = Path::from_svg(data)?;
    let ctx = TessellationContext::new(config);

    let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx);
    let fill = mesh.fill(&ctx);
    let bounds = mesh.bounds();

    let stroke_geometry = stroke.map(|stroke| {
        let ctx = ctx.clone().with_stroke(stroke);
        let mesh = PathMesh::from_path(&path, &Affine2D::IDENTITY, &ctx);
        match Dasher::new(&stroke.dash, stroke.dash_offset) {
            Some(dasher) if stroke.is_dashed() => mesh.stroke_dashed(&ctx, &dasher),
            _ => mesh.stroke(&ctx),
        }
    });

    if json {
        let report = serde_json::json!({
            "commands": path.len(),
            "contours": mesh.contours().len(),
            "points": mesh.point_count(),
            "convex": mesh.is_convex(),
            "area": path.area(),
            "bounds": if bounds.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::json!([bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y])
            },
            "fill": {
                "meshes": fill.meshes.len(),
                "vertices": fill.vertex_count(),
            },
            "stroke": stroke_geometry.as_ref().map(|s| serde_json::json!({
                "meshes": s.meshes.len(),
                "vertices": s.vertex_count(),
                "half_width": s.half_width,
                "alpha_scale": s.alpha_scale,
            })),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Path");
    println!("  commands:  {}", path.len());
    println!("  contours:  {}", mesh.contours().len());
    println!("  points:    {}", mesh.point_count());
    println!("  convex:    {}", mesh.is_convex());
    println!("  area:      {:.3}", path.area());
    if !bounds.is_empty() {
        println!(
            "  bounds:    ({:.2}, {:.2}) - ({:.2}, {:.2})",
            bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y
        );
    }
    println!("Fill");
    println!("  meshes:    {}", fill.meshes.len());
    println!("  vertices:  {}", fill.vertex_count());
    if let Some(stroke) = &stroke_geometry {
        println!("Stroke");
        println!("  meshes:    {}", stroke.meshes.len());
        println!("  vertices:  {}", stroke.vertex_count());
        println!("  half width {:.3}, alpha {:.3}", stroke.half_width, stroke.alpha_scale);
    }
    Ok(())
}

fn cmd_render(
    scene_path: &std::path::Path,
    config_path: Option<&std::path::Path>,
    frames: u32,
    list_events: bool,
    json: bool,
) -> Result<()> {
    if frames == 0 {
        bail!("at least one frame is required");
    }
    let scene = Scene::load(scene_path)?;
    let config = match config_path {
        Some(path) => {
            let source = std::fs::read_to_string(path)?;
            CanvasConfig::from_toml_str(&source)?
        }
        None => scene.canvas_config(),
    };
    info!(
        "Rendering {} ({}x{}, {} items)",
        scene_path.display(),
        scene.width,
        scene.height,
        scene.items.len()
    );

    let mut canvas = Canvas::new(scene.width, scene.height, config);
    let mut backend = RecordingBackend::new();
    let mut stats = Vec::with_capacity(frames as usize);
    for _ in 0..frames {
        canvas.begin_frame()?;
        if let Err(err) = scene.replay(&mut canvas) {
            // Close the frame so the canvas stays usable, then report
            canvas.end_frame(&mut backend)?;
            return Err(err);
        }
        stats.push(canvas.end_frame(&mut backend)?);
    }
    canvas.release_targets(&mut backend)?;

    if json {
        let frames: Vec<_> = stats.iter().map(frame_json).collect();
        let report = serde_json::json!({
            "frames": frames,
            "targets_created": backend.created_count(),
            "events": backend.events().len(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for frame in &stats {
        print_frame(frame);
    }
    println!("Backend");
    println!("  events:          {}", backend.events().len());
    println!("  targets created: {}", backend.created_count());
    if list_events {
        for event in backend.events() {
            println!("  {}", describe_event(event));
        }
    }
    Ok(())
}

fn frame_json(stats: &FrameStats) -> serde_json::Value {
    serde_json::json!({
        "frame": stats.frame,
        "fills": stats.fills,
        "strokes": stats.strokes,
        "clips": stats.clips,
        "layers": stats.layers,
        "commands": stats.commands,
        "vertices": stats.vertices,
        "pool": {
            "hits": stats.pool.hits,
            "misses": stats.pool.misses,
            "hit_rate": stats.pool.hit_rate(),
        },
    })
}

fn print_frame(stats: &FrameStats) {
    println!("Frame {}", stats.frame);
    println!(
        "  draws:     {} fills, {} strokes, {} clips",
        stats.fills, stats.strokes, stats.clips
    );
    println!("  layers:    {}", stats.layers);
    println!("  commands:  {}", stats.commands);
    println!("  vertices:  {}", stats.vertices);
    println!(
        "  pool:      {} hits, {} misses ({:.0}%)",
        stats.pool.hits,
        stats.pool.misses,
        stats.pool.hit_rate() * 100.0
    );
}

fn describe_event(event: &BackendEvent) -> String {
    match event {
        BackendEvent::CreateTarget { id, size, format } => {
            format!("create  #{} {}x{} {:?}", id.0, size.width, size.height, format)
        }
        BackendEvent::BeginTarget(Some(id)) => format!("begin   #{}", id.0),
        BackendEvent::BeginTarget(None) => "begin   root".to_string(),
        BackendEvent::Submit(commands) => {
            let names: Vec<&str> = commands.iter().map(|c| c.name()).collect();
            format!("submit  [{}]", names.join(", "))
        }
        BackendEvent::EndTarget { target, effect } => {
            let target = target.map_or("root".to_string(), |id| format!("#{}", id.0));
            match effect {
                Some(effect) => format!("end     {} with {:?}", target, effect),
                None => format!("end     {}", target),
            }
        }
        BackendEvent::DestroyTarget(id) => format!("destroy #{}", id.0),
    }
}

fn cmd_config(preset: Preset) -> Result<()> {
    let config = match preset {
        Preset::Standard => CanvasConfig::standard(),
        Preset::Hidpi => CanvasConfig::hidpi(),
        Preset::Aliased => CanvasConfig::aliased(),
        Preset::Testing => CanvasConfig::testing(),
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}

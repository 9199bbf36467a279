use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::{IVec3, UVec2, Vec3};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use voxelspace_kernel::{Scene, VoxelField, VoxelGrid, VoxelSource};
use voxelspace_render::{
    CpuRenderer, FlyCamera, Ray, RenderView, Renderer, Settings, TraceOutcome, cast_ray,
    shade_outcome,
};

#[derive(Parser)]
#[command(name = "voxelspace-cli", about = "CLI tool for voxelspace operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Built-in scene used when no model file is given
    #[arg(long, global = true, value_enum, default_value = "terrain")]
    scene: SceneArg,

    /// Raw voxel model: N^3 bytes, one material id per cell
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Settings file (.yaml, .yml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SceneArg {
    Empty,
    Sphere,
    Terrain,
}

impl From<SceneArg> for Scene {
    fn from(arg: SceneArg) -> Self {
        match arg {
            SceneArg::Empty => Scene::Empty,
            SceneArg::Sphere => Scene::Sphere,
            SceneArg::Terrain => Scene::Terrain,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and the active settings
    Info,
    /// Render one frame on the CPU and write it as PNG
    #[command(allow_negative_numbers = true)]
    Render {
        #[arg(long, default_value = "640", value_parser = clap::value_parser!(u32).range(1..))]
        width: u32,
        #[arg(long, default_value = "360", value_parser = clap::value_parser!(u32).range(1..))]
        height: u32,
        /// Output image path
        #[arg(short, long, default_value = "frame.png")]
        out: PathBuf,
        /// Camera position; defaults to the viewer's start position
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        pos: Option<Vec<f32>>,
        /// Camera pitch in radians
        #[arg(long, default_value = "0")]
        pitch: f32,
        /// Camera yaw in radians
        #[arg(long, default_value = "0")]
        yaw: f32,
    },
    /// Cast a single ray and report what it hits
    #[command(allow_negative_numbers = true)]
    Probe {
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], required = true)]
        pos: Vec<f32>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], required = true)]
        dir: Vec<f32>,
    },
    /// Print the material id at a cell
    #[command(allow_negative_numbers = true)]
    Sample { x: i32, y: i32, z: i32 },
}

fn vec3(values: &[f32]) -> Result<Vec3> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => anyhow::bail!("expected three components, got {}", values.len()),
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings {}", path.display())),
        None => Ok(Settings::default()),
    }
}

fn load_field(cli: &Cli, settings: &Settings) -> Result<VoxelField> {
    let grid = match &cli.model {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading model {}", path.display()))?;
            VoxelGrid::from_raw(bytes).with_context(|| format!("loading model {}", path.display()))?
        }
        None => Scene::from(cli.scene).build(settings.grid_size)?,
    };
    let field = VoxelField::new(grid, settings.field);
    settings.warn_if_trace_short(field.grid().size());
    Ok(field)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let settings = load_settings(cli.config.as_deref())?;

    match &cli.command {
        Commands::Info => {
            println!("voxelspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", voxelspace_common::crate_info());
            println!("noise: {}", voxelspace_noise::crate_info());
            println!("kernel: {}", voxelspace_kernel::crate_info());
            println!("input: {}", voxelspace_input::crate_info());
            println!("render: {}", voxelspace_render::crate_info());
            println!("render-wgpu: {}", voxelspace_render_wgpu::crate_info());
            println!();
            print!("{}", settings.to_yaml_string()?);
        }
        Commands::Render {
            width,
            height,
            out,
            pos,
            pitch,
            yaw,
        } => {
            let field = load_field(&cli, &settings)?;
            let position = match pos {
                Some(values) => vec3(values)?,
                None => FlyCamera::default().position,
            };
            let camera = FlyCamera::new(position, *pitch, *yaw);
            let mut view = RenderView::new(camera, UVec2::new(*width, *height));
            view.focal_length = settings.camera.focal_length;

            let start = Instant::now();
            let frame = CpuRenderer::new(settings.trace, settings.shading).render(&field, &view);
            let elapsed = start.elapsed();

            let image = image::RgbaImage::from_raw(frame.width(), frame.height(), frame.to_rgba8())
                .context("frame buffer does not match its dimensions")?;
            image.save(out).with_context(|| format!("writing {}", out.display()))?;
            tracing::info!(?elapsed, "rendered {}x{} to {}", width, height, out.display());
            println!("wrote {} ({width}x{height}) in {elapsed:?}", out.display());
        }
        Commands::Probe { pos, dir } => {
            let field = load_field(&cli, &settings)?;
            let ray = Ray::new(vec3(pos)?, vec3(dir)?);
            let outcome = cast_ray(&field, &ray, settings.trace.max_steps);
            match &outcome {
                TraceOutcome::Hit(hit) => {
                    let color = shade_outcome(&field, &outcome, &settings.shading);
                    let (cell, normal, point) = (hit.cell, hit.normal, hit.point);
                    println!("hit material={} steps={}", hit.material.0, hit.steps);
                    println!("  cell=({}, {}, {})", cell.x, cell.y, cell.z);
                    println!("  normal=({}, {}, {})", normal.x, normal.y, normal.z);
                    println!("  point=({:.3}, {:.3}, {:.3})", point.x, point.y, point.z);
                    println!("  color=({:.3}, {:.3}, {:.3})", color.x, color.y, color.z);
                }
                TraceOutcome::Miss { steps } => println!("miss after {steps} cells"),
            }
        }
        Commands::Sample { x, y, z } => {
            let field = load_field(&cli, &settings)?;
            let cell = IVec3::new(*x, *y, *z);
            let tier = if field.grid().contains(cell) { "stored" } else { "generated" };
            println!("({x}, {y}, {z}) material={} [{tier}]", field.sample(cell).0);
        }
    }

    Ok(())
}

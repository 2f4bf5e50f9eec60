//! Headless driver: load a JSON scene, accumulate passes, write an image.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use lume_core::SceneDescription;
use lume_tracer::{PathTracer, Renderer, Scene};

#[derive(Parser)]
#[command(name = "lume", version, about = "Progressive path tracer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a scene to an image file
    Render(RenderArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Scene description (JSON)
    scene: PathBuf,

    /// Output image; the format follows the extension
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Number of progressive passes
    #[arg(short, long, default_value_t = 64)]
    passes: u32,

    /// Viewport width
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Viewport height
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Worker threads (0 = all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Override the scene's bounce budget
    #[arg(long)]
    max_bounces: Option<u32>,

    /// Override the scene's random seed
    #[arg(long)]
    seed: Option<u64>,
}

fn render(args: RenderArgs) -> Result<()> {
    if args.width == 0 || args.height == 0 {
        bail!("image size must be non-zero, got {}x{}", args.width, args.height);
    }

    let mut desc = SceneDescription::load(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene.display()))?;
    if let Some(threads) = args.threads {
        desc.settings.threads = threads;
    }
    if let Some(max_bounces) = args.max_bounces {
        desc.settings.max_bounces = max_bounces;
    }
    if let Some(seed) = args.seed {
        desc.settings.seed = seed;
    }
    desc.camera.set_aspect(args.width as f32 / args.height as f32);

    let scene = Scene::from_description(&desc)
        .with_context(|| format!("building scene {}", args.scene.display()))?;
    let tracer = PathTracer::new(&scene);
    let mut renderer = Renderer::new(args.width, args.height, desc.settings.clone());
    let view = desc.camera.view_matrix();
    let proj = desc.camera.projection_matrix();

    let progress = ProgressBar::new(args.passes as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} passes ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let start = Instant::now();
    for _ in 0..args.passes {
        if !renderer.trace_paths(&tracer, view, proj) {
            log::info!("Sample cap reached after {} passes", renderer.number_of_samples());
            break;
        }
        progress.inc(1);
    }
    progress.finish_and_clear();
    log::info!(
        "Traced {} passes in {:.2?}",
        renderer.number_of_samples(),
        start.elapsed()
    );

    let image = renderer.image();
    let buffer = image::RgbaImage::from_raw(image.width, image.height, image.to_rgba8())
        .context("render buffer does not match its dimensions")?;
    buffer
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    log::info!(
        "Wrote {} ({}x{})",
        args.output.display(),
        image.width,
        image.height
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render(args) => render(args),
    }
}

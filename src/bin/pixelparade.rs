use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use pixelparade::{
    AnimParams, AnimationState, BannerController, DrawSurface, FrameTransform, RasterImage,
    SequentialIndexSource, SpriteFetcher, SpriteMetrics, decode_image, dominant_colors,
};

#[derive(Parser, Debug)]
#[command(name = "pixelparade", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a single animation frame of a sprite as a PNG.
    Frame(FrameArgs),
    /// Drive the full banner cycle with a synthetic clock, writing PNGs.
    Cycle(CycleArgs),
    /// Print the dominant colors of an image.
    Colors(ColorsArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input sprite image (pixel art, nominally 28x28).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index within the sway cycle.
    #[arg(long, default_value_t = 0)]
    frame: u32,

    /// Banner width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Banner height in pixels.
    #[arg(long, default_value_t = 168)]
    height: u32,

    /// Horizontal sprite offset.
    #[arg(long, default_value_t = 0.0)]
    x: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// JSON file overriding animation parameters.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CycleArgs {
    /// Local sprite images, served to the loader round-robin.
    #[arg(long = "sprite", required = true)]
    sprites: Vec<PathBuf>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Write a PNG every Nth tick.
    #[arg(long, default_value_t = 10)]
    every: u64,

    /// Milliseconds per tick of the synthetic clock.
    #[arg(long, default_value_t = 16.0)]
    tick_ms: f64,

    /// Banner width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Banner height in pixels.
    #[arg(long, default_value_t = 168)]
    height: u32,

    /// Output directory for numbered PNGs.
    #[arg(long)]
    out_dir: PathBuf,

    /// JSON file overriding animation parameters.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ColorsArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Number of buckets to report.
    #[arg(long, default_value_t = 5)]
    k: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Cycle(args) => cmd_cycle(args),
        Command::Colors(args) => cmd_colors(args),
    }
}

fn read_params(path: Option<&Path>) -> anyhow::Result<AnimParams> {
    let Some(path) = path else {
        return Ok(AnimParams::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;
    Ok(AnimParams::from_json_str(&text)?)
}

fn read_sprite(path: &Path) -> anyhow::Result<RasterImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read sprite '{}'", path.display()))?;
    Ok(decode_image(&bytes)?)
}

fn write_png(surface: &DrawSurface, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &surface.to_straight_rgba8(),
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let params = read_params(args.config.as_deref())?;
    let sprite_img = read_sprite(&args.in_path)?;

    let metrics =
        SpriteMetrics::from_container(args.height, params.base_size, params.head_split_row)?;
    let sprite = pixelparade::slice(&sprite_img, metrics)?;

    let mut visible = DrawSurface::new(args.width, args.height)?;
    let mut scratch = DrawSurface::new(metrics.target_size, metrics.target_size)?;
    let transform = FrameTransform {
        x_offset: args.x,
        ..FrameTransform::default()
    };
    pixelparade::draw_frame(
        &mut visible,
        &mut scratch,
        &sprite,
        args.frame,
        metrics,
        &transform,
        &params,
        true,
    )?;

    write_png(&visible, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

/// Serves local sprite files round-robin, standing in for the remote store.
struct FileFetcher {
    paths: Vec<PathBuf>,
}

impl SpriteFetcher for FileFetcher {
    fn fetch(&self, index: u32) -> pixelparade::ParadeResult<RasterImage> {
        let path = &self.paths[index as usize % self.paths.len()];
        let bytes = std::fs::read(path).map_err(|e| {
            pixelparade::ParadeError::load(format!("read '{}': {e}", path.display()))
        })?;
        decode_image(&bytes)
    }
}

fn cmd_cycle(args: CycleArgs) -> anyhow::Result<()> {
    let params = read_params(args.config.as_deref())?;
    let fetcher = std::sync::Arc::new(FileFetcher {
        paths: args.sprites.clone(),
    });
    let indices = Box::new(SequentialIndexSource::new(0, args.sprites.len() as u32));

    let mut controller =
        BannerController::new(params, fetcher, indices, args.width, args.height)?;

    // Loads are real background work even under a synthetic clock; hold the
    // clock at zero until the first sprite lands.
    let started = Instant::now();
    while controller.state() == AnimationState::Loading {
        anyhow::ensure!(
            started.elapsed() < Duration::from_secs(30),
            "no sprite became ready within 30s"
        );
        controller.tick(0.0)?;
        std::thread::sleep(Duration::from_millis(2));
    }

    let every = args.every.max(1);
    let mut written = 0u64;
    for i in 0..args.ticks {
        controller.tick(i as f64 * args.tick_ms)?;
        if i % every == 0 {
            let path = args.out_dir.join(format!("tick_{i:05}.png"));
            write_png(controller.surface(), &path)?;
            written += 1;
        }
    }
    controller.shutdown();

    eprintln!(
        "wrote {written} frames to {} ({} ticks, state {:?})",
        args.out_dir.display(),
        args.ticks,
        controller.state()
    );
    Ok(())
}

fn cmd_colors(args: ColorsArgs) -> anyhow::Result<()> {
    let img = read_sprite(&args.in_path)?;
    let buckets = dominant_colors(&img, args.k);
    if buckets.is_empty() {
        println!("no opaque pixels");
        return Ok(());
    }
    for (i, b) in buckets.iter().enumerate() {
        println!(
            "{:>2}. rgb({:>3},{:>3},{:>3})  {:>8} px  {:6.2}%",
            i + 1,
            b.r,
            b.g,
            b.b,
            b.count,
            b.percentage
        );
    }
    Ok(())
}

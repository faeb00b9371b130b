use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use showcase_assets::{TextureLoader, TextureRequest};
use showcase_common::{SurfaceTarget, Transform};
use showcase_geometry::RoundedPanel;
use showcase_render::{ManualScheduler, RenderLoop, ShowcaseConfig, TextRenderer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "showcase-cli", about = "CLI tool for the hero scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file; landing page defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the effective configuration as JSON
    Config,
    /// Sample the slide carousel
    Carousel {
        /// Sample a single instant
        #[arg(long)]
        at_ms: Option<f64>,
        /// End of the sampled range when no instant is given
        #[arg(long, default_value = "8000")]
        until_ms: f64,
        /// Spacing between samples
        #[arg(long, default_value = "500")]
        step_ms: f64,
    },
    /// Show the layout preset chosen for a viewport width
    Layout {
        /// Viewport width in logical pixels
        #[arg(short, long)]
        width: u32,
    },
    /// Build a rounded panel and print its mesh statistics
    Panel {
        #[arg(long, default_value = "3.2")]
        width: f32,
        #[arg(long, default_value = "6.5")]
        height: f32,
        #[arg(long, default_value = "0.45")]
        radius: f32,
        #[arg(long, default_value = "0.3")]
        depth: f32,
        #[arg(long, default_value = "0.05")]
        bevel: f32,
    },
    /// Run the render loop headless and print the frames
    Frames {
        /// Number of frames to draw
        #[arg(short = 'n', long, default_value = "3")]
        count: u32,
        /// Simulated time between frames
        #[arg(long, default_value = "1000")]
        step_ms: f64,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// How long to wait for slide textures before the first frame
        #[arg(long, default_value = "5000")]
        texture_timeout_ms: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = ShowcaseConfig::load_or_default(cli.config.as_deref())?;
    if cli.config.is_none() {
        tracing::debug!("no config file given, using landing page defaults");
    }

    match cli.command {
        Commands::Info => {
            println!("showcase-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", showcase_common::crate_info());
            println!("geometry: {}", showcase_geometry::crate_info());
            println!("motion: {}", showcase_motion::crate_info());
            println!("scene: {}", showcase_scene::crate_info());
            println!("assets: {}", showcase_assets::crate_info());
            println!("render: {}", showcase_render::crate_info());
        }
        Commands::Config => {
            println!("{}", config.to_json()?);
        }
        Commands::Carousel {
            at_ms,
            until_ms,
            step_ms,
        } => {
            let carousel = config.carousel()?;
            println!(
                "Carousel: {} slides, cycle={}ms, fade={}ms",
                carousel.slides().len(),
                carousel.cycle_ms(),
                carousel.fade_ms()
            );
            let times: Vec<f64> = match at_ms {
                Some(t) => vec![t],
                None => {
                    anyhow::ensure!(step_ms > 0.0, "--step-ms must be positive");
                    let steps = (until_ms / step_ms).floor().max(0.0) as u64;
                    (0..=steps).map(|i| i as f64 * step_ms).collect()
                }
            };
            for t in times {
                let state = carousel.sample(t);
                let opacities: Vec<String> = carousel
                    .opacities(&state)
                    .iter()
                    .map(|o| format!("{o:.2}"))
                    .collect();
                println!(
                    "t={t:>8.1} current={} next={} fade={:.3} [{}]",
                    state.current_index,
                    state.next_index,
                    state.fade_progress,
                    opacities.join(" ")
                );
            }
        }
        Commands::Layout { width } => {
            let mut layout = config.layout();
            let mut transform = Transform::default();
            let preset = layout.apply(width, &mut transform);
            let name = layout.active().map_or("?", |b| b.name.as_str());
            println!(
                "width={width}px layout={name} translation=({:.2}, {:.2}, {:.2}) rotation_y={:.3} scale={:.2}",
                preset.translation.x,
                preset.translation.y,
                preset.translation.z,
                preset.rotation_y,
                preset.scale
            );
        }
        Commands::Panel {
            width,
            height,
            radius,
            depth,
            bevel,
        } => {
            let panel = RoundedPanel::new(width, height, radius, depth, bevel);
            let mesh = panel.build()?;
            println!(
                "Panel {width}x{height} r={radius} depth={depth} bevel={bevel}: {} vertices, {} triangles",
                mesh.vertices.len(),
                mesh.triangle_count()
            );
            if let Some(bounds) = mesh.bounding_box() {
                let size = bounds.size();
                println!("Bounds: {:.3} x {:.3} x {:.3}", size.x, size.y, size.z);
            }
        }
        Commands::Frames {
            count,
            step_ms,
            width,
            height,
            texture_timeout_ms,
        } => {
            let surface = SurfaceTarget::new(width, height);
            let scene = config.assembler().build(Some(surface))?;
            let mut render_loop =
                RenderLoop::new(scene, TextRenderer::new(), ManualScheduler::new(), width)
                    .with_carousel(config.carousel()?)?
                    .with_layout(config.layout());

            let mut loader = TextureLoader::spawn(
                config.resolver(),
                TextureRequest::for_slides(config.slides.sources()),
            )?;
            for event in loader.wait_all(Duration::from_millis(texture_timeout_ms)) {
                render_loop.on_texture_event(event);
            }
            let ready = render_loop
                .scene()
                .slide_readiness()
                .iter()
                .filter(|r| **r)
                .count();
            println!("Slides ready: {ready}/{}", render_loop.scene().slide_count());
            tracing::info!(
                asset_root = %config.asset_root.display(),
                pending = loader.outstanding(),
                "slide textures settled"
            );

            render_loop.start()?;
            for i in 0..count {
                if render_loop.scheduler_mut().fire().is_none() {
                    break;
                }
                if let Some(frame) = render_loop.on_frame(f64::from(i) * step_ms)? {
                    print!("{frame}");
                }
            }
            render_loop.dispose();
            tracing::info!(frames = render_loop.frames_drawn(), "headless run finished");
            println!(
                "Frames drawn: {}, renderer released: {}",
                render_loop.frames_drawn(),
                render_loop.renderer().is_released()
            );
        }
    }

    Ok(())
}

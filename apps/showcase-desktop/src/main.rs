use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use showcase_assets::{TextureLoader, TextureRequest};
use showcase_common::SurfaceTarget;
use showcase_motion::ResizeCoalescer;
use showcase_render::{FrameScheduler, FrameToken, RenderLoop, ShowcaseConfig};
use showcase_render_wgpu::WgpuRenderer;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "showcase-desktop", about = "Hero scene in a desktop window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file; landing page defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Frame requests become window redraws; the token of the newest request
/// is the only one a redraw can honour.
struct WindowScheduler {
    window: Arc<Window>,
    next: u64,
    pending: Option<FrameToken>,
}

impl WindowScheduler {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next: 0,
            pending: None,
        }
    }
}

impl FrameScheduler for WindowScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        let token = FrameToken(self.next);
        self.pending = Some(token);
        self.window.request_redraw();
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
    }
}

type HeroLoop = RenderLoop<WgpuRenderer, WindowScheduler>;

struct ShowcaseApp {
    config: ShowcaseConfig,
    started: Instant,
    window: Option<Arc<Window>>,
    render_loop: Option<HeroLoop>,
    loader: Option<TextureLoader>,
    resizes: ResizeCoalescer<PhysicalSize<u32>>,
    failure: Option<anyhow::Error>,
}

impl ShowcaseApp {
    fn new(config: ShowcaseConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
            window: None,
            render_loop: None,
            loader: None,
            resizes: ResizeCoalescer::new(),
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Showcase")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no GPU adapter can present to this window"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("showcase_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no texture formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?format,
            "GPU initialized"
        );

        let scene = self
            .config
            .assembler()
            .build(Some(SurfaceTarget::new(size.width, size.height)))
            .context("assemble scene")?;
        let renderer = WgpuRenderer::new(surface, device, queue, surface_config);
        let mut render_loop = RenderLoop::new(
            scene,
            renderer,
            WindowScheduler::new(window.clone()),
            logical_width(&window, size),
        )
        .with_carousel(self.config.carousel()?)?
        .with_layout(self.config.layout());

        let loader = TextureLoader::spawn(
            self.config.resolver(),
            TextureRequest::for_slides(self.config.slides.sources()),
        )?;
        render_loop.start()?;

        self.started = Instant::now();
        self.window = Some(window);
        self.render_loop = Some(render_loop);
        self.loader = Some(loader);
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(window), Some(render_loop)) = (&self.window, &mut self.render_loop) else {
            return Ok(());
        };
        if let Some(size) = self.resizes.take() {
            render_loop.on_resize(
                SurfaceTarget::new(size.width, size.height),
                logical_width(window, size),
            );
        }
        if let Some(loader) = &mut self.loader {
            for event in loader.poll() {
                render_loop.on_texture_event(event);
            }
            if loader.is_done() {
                tracing::debug!("all slide textures settled");
                self.loader = None;
            }
        }
        let now_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        render_loop.on_frame(now_ms)?;
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(render_loop) = &mut self.render_loop {
            render_loop.dispose();
        }
        self.loader = None;
        event_loop.exit();
    }
}

/// Viewport width in CSS-style logical pixels, which is what breakpoints
/// are expressed in.
fn logical_width(window: &Window, size: PhysicalSize<u32>) -> u32 {
    size.to_logical::<f64>(window.scale_factor()).width.round() as u32
}

impl ApplicationHandler for ShowcaseApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                self.resizes.push(size);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    tracing::error!(error = %e, "frame failed");
                    self.failure = Some(e);
                    self.shutdown(event_loop);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(render_loop) = &mut self.render_loop {
            render_loop.dispose();
        }
        tracing::info!(dropped_resizes = self.resizes.dropped(), "showcase-desktop exiting");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("showcase-desktop starting");
    let config = ShowcaseConfig::load_or_default(cli.config.as_deref())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ShowcaseApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

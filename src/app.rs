use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::context::GraphicsContext;
use crate::scene::HairScene;
use crate::simulation::SimulationConfig;
use crate::ui::action_for_key;

const DEFAULT_SETTINGS_PATH: &str = "hair_settings.ron";

/// Log and terminate. Load-time and GPU failures have no recovery path.
fn fatal(what: &str, err: impl std::fmt::Display) -> ! {
    log::error!("{}: {}", what, err);
    std::process::exit(1);
}

pub struct App {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    ctx: GraphicsContext,
    config: wgpu::SurfaceConfiguration,
    scene: HairScene,
    last_render_time: Instant,
    frame_count: u32,
    fps_timer: Instant,
}

impl App {
    pub fn new(
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
        ctx: GraphicsContext,
        config: wgpu::SurfaceConfiguration,
        scene: HairScene,
    ) -> Self {
        Self {
            window,
            surface,
            ctx,
            config,
            scene,
            last_render_time: Instant::now(),
            frame_count: 0,
            fps_timer: Instant::now(),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Returns `false` when the window should close.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                return false;
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::MouseInput { button, state, .. } => {
                self.scene.camera.handle_mouse_button(*button, *state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.scene.camera.handle_mouse_move(*position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scene.camera.handle_scroll(*delta);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return true;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return true;
                };
                if code == KeyCode::Escape {
                    return false;
                }
                if let Some(action) = action_for_key(code) {
                    if let Err(e) = self.scene.handle_action(&self.ctx, action) {
                        fatal("Scene update failed", e);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.render(),
            _ => {}
        }
        true
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.ctx.device, &self.config);
        self.scene.resize(&self.ctx, width, height);
    }

    fn render(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_render_time).as_secs_f32();
        self.last_render_time = now;

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.ctx.device, &self.config);
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface acquire timed out, skipping frame");
                return;
            }
            Err(e) => fatal("Surface acquisition failed", e),
        };

        if let Err(e) = self.scene.render_frame(&self.ctx, frame, dt) {
            fatal("Frame failed", e);
        }

        self.frame_count += 1;
        if self.fps_timer.elapsed().as_secs_f32() >= 1.0 {
            log::info!(
                "FPS: {} ({}, {})",
                self.frame_count,
                self.scene.method(),
                if self.scene.orchestrator().is_paused() { "paused" } else { "running" }
            );
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

struct AppState {
    settings_path: PathBuf,
    app: Option<App>,
}

impl AppState {
    fn create_app(&self, event_loop: &ActiveEventLoop) -> App {
        let settings = SimulationConfig::load_or_default(&self.settings_path)
            .unwrap_or_else(|e| fatal("Failed to load hair settings", e));

        let window_attributes = Window::default_attributes()
            .with_title("Hair Simulation")
            .with_inner_size(winit::dpi::PhysicalSize::new(1280, 720));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .unwrap_or_else(|e| fatal("Failed to create window", e)),
        );

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .unwrap_or_else(|e| fatal("Failed to create surface", e));

        let (adapter, device, queue) =
            pollster::block_on(GraphicsContext::request_device(&instance, Some(&surface)))
                .unwrap_or_else(|e| fatal("Failed to open GPU device", e));

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            fatal("Surface is not supported by the adapter", "no formats");
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(first_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let ctx = GraphicsContext::new(device, queue, surface_format);
        surface.configure(&ctx.device, &config);

        let scene = HairScene::new(&ctx, &settings, config.width, config.height)
            .unwrap_or_else(|e| fatal("Failed to build scene", e));

        App::new(window, surface, ctx, config, scene)
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_some() {
            return;
        }
        self.app = Some(self.create_app(event_loop));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(app) = &mut self.app else { return };

        if window_id != app.window().id() {
            return;
        }

        if !app.handle_event(&event) {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(app) = &self.app {
            app.request_redraw();
        }
    }
}

/// Run the demo. The first command-line argument overrides the settings path.
pub fn run() {
    env_logger::init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));

    let event_loop = EventLoop::new().unwrap_or_else(|e| fatal("Failed to create event loop", e));
    let mut state = AppState {
        settings_path,
        app: None,
    };

    if let Err(e) = event_loop.run_app(&mut state) {
        fatal("Event loop terminated", e);
    }
}

use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use lavaworld_input::{PointerButton, PointerInput};
use lavaworld_kernel::{
    Camera, ClockTick, DrawTarget, FrameOrchestrator, LavaScene, OutputSurface, SceneConfig,
    ViewportReconciler,
};
use lavaworld_render_wgpu::{OrbitControls, WgpuRenderer};
use lavaworld_tools::FrameTimer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const INITIAL_SIZE: (u32, u32) = (1280, 720);
const PIXELS_PER_LINE: f64 = 40.0;

#[derive(Parser)]
#[command(name = "lavaworld-desktop", about = "Lava world desktop viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config (YAML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Creature model (.glb/.gltf), overriding the config
    #[arg(long)]
    creature: Option<PathBuf>,

    /// Run without the creature
    #[arg(long, conflicts_with = "creature")]
    no_creature: bool,

    /// Rain RNG seed, overriding the config
    #[arg(long)]
    seed: Option<u64>,
}

/// Values shown in the stats overlay that the scene does not carry.
struct Overlay {
    visible: bool,
    fps: f64,
    frame_ms: f64,
    failed_draws: u64,
}

struct AppState {
    frames: FrameOrchestrator,
    camera: Camera,
    controls: OrbitControls,
    pointer: PointerInput,
    viewport: ViewportReconciler,
    timer: FrameTimer,
    overlay: Overlay,
}

impl AppState {
    fn new(scene: LavaScene) -> Self {
        let (width, height) = INITIAL_SIZE;
        let viewport = ViewportReconciler::new(width, height, 1.0);
        let camera = Camera::from_config(&scene.config().camera, viewport.state().aspect);
        Self {
            controls: OrbitControls::new(&camera),
            frames: FrameOrchestrator::with_wall_clock(scene),
            camera,
            pointer: PointerInput::new(),
            viewport,
            timer: FrameTimer::new(120),
            overlay: Overlay {
                visible: true,
                fps: 0.0,
                frame_ms: 0.0,
                failed_draws: 0,
            },
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::F1 => self.overlay.visible = !self.overlay.visible,
            KeyCode::KeyR => {
                let action = self.pointer.key('r');
                self.controls.apply(&mut self.camera, action);
            }
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }
}

fn draw_overlay(ctx: &EguiContext, overlay: &Overlay, scene: &LavaScene, tick: &ClockTick) {
    if !overlay.visible {
        return;
    }
    egui::Window::new("Lava World")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("FPS: {:.0} ({:.2} ms)", overlay.fps, overlay.frame_ms));
            ui.label(format!("Elapsed: {:.2} s", tick.elapsed));
            ui.label(format!("Rain particles: {}", scene.rain().len()));
            ui.label(format!("Creature: {}", scene.creature().status()));
            ui.label(format!("Seed: {}", scene.seed()));
            if overlay.failed_draws > 0 {
                ui.label(format!("Failed draws: {}", overlay.failed_draws));
            }
            ui.separator();
            ui.small("F1: Toggle | LMB: Orbit | RMB/Shift: Pan | Wheel: Zoom | R: Reset");
        });
}

/// Window, device and everything bound to the surface.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, scene: &LavaScene) -> Result<Self> {
        let (width, height) = INITIAL_SIZE;
        let attrs = Window::default_attributes()
            .with_title("Lava World")
            .with_inner_size(PhysicalSize::new(width, height));
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
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lavaworld_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height, scene);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            format = ?surface_format,
            "GPU initialized"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    /// Run the egui frame and paint it on top of `view`.
    fn paint_egui(
        &mut self,
        ctx: &EguiContext,
        view: &wgpu::TextureView,
        run_ui: impl FnMut(&EguiContext),
    ) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = ctx.run(raw_input, run_ui);
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

impl OutputSurface for Gpu {
    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.renderer.resize(&self.device, width, height);
    }
}

/// The frame's composite draw: scene, then overlay, then present.
struct FrameTarget<'a> {
    gpu: &'a mut Gpu,
    egui_ctx: &'a EguiContext,
    overlay: &'a Overlay,
}

impl DrawTarget for FrameTarget<'_> {
    type Error = wgpu::SurfaceError;

    fn draw(
        &mut self,
        scene: &LavaScene,
        camera: &Camera,
        tick: &ClockTick,
    ) -> Result<(), wgpu::SurfaceError> {
        let gpu = &mut *self.gpu;
        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                if matches!(e, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                    gpu.surface.configure(&gpu.device, &gpu.config);
                }
                return Err(e);
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer
            .render(&gpu.device, &gpu.queue, &view, scene, camera);
        let overlay = self.overlay;
        gpu.paint_egui(self.egui_ctx, &view, |ctx| {
            draw_overlay(ctx, overlay, scene, tick);
        });

        output.present();
        Ok(())
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(scene: LavaScene) -> Self {
        Self {
            state: AppState::new(scene),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match Gpu::new(event_loop, &self.egui_ctx, self.state.frames.scene()) {
            Ok(gpu) => {
                let size = gpu.window.inner_size();
                self.state.viewport =
                    ViewportReconciler::new(size.width, size.height, gpu.window.scale_factor());
                self.state
                    .camera
                    .set_aspect(self.state.viewport.state().aspect);
                gpu.window.request_redraw();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("GPU initialization failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if gpu.egui_winit.on_window_event(&gpu.window, &event).consumed {
            return;
        }

        let state = &mut self.state;
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if state.viewport.on_resize(
                    new_size.width,
                    new_size.height,
                    &mut state.camera,
                    &mut *gpu,
                ) {
                    gpu.window.request_redraw();
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.viewport.on_scale_factor(scale_factor);
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                state.pointer.set_shift(modifiers.state().shift_key());
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                state.handle_key(event_loop, key);
            }
            WindowEvent::MouseInput {
                button,
                state: btn_state,
                ..
            } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => return,
                };
                state
                    .pointer
                    .button(button, btn_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let action = state
                    .pointer
                    .moved(Vec2::new(position.x as f32, position.y as f32));
                state.controls.apply(&mut state.camera, action);
            }
            WindowEvent::CursorLeft { .. } => {
                state.pointer.left();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_LINE) as f32,
                };
                let action = state.pointer.wheel(lines);
                state.controls.apply(&mut state.camera, action);
            }
            WindowEvent::RedrawRequested => {
                let window = gpu.window.clone();
                let scheduler = move || window.request_redraw();
                let mut target = FrameTarget {
                    gpu,
                    egui_ctx: &self.egui_ctx,
                    overlay: &state.overlay,
                };
                let report = state
                    .frames
                    .run_frame(&state.camera, &mut target, &scheduler);

                state.timer.record_secs(report.tick.delta);
                state.overlay.fps = state.timer.fps();
                state.overlay.frame_ms = state.timer.average().as_secs_f64() * 1000.0;
                state.overlay.failed_draws = state.frames.failed_draws();
            }
            _ => {}
        }
    }
}

fn load_config(cli: &Cli) -> Result<SceneConfig> {
    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    if let Some(path) = &cli.creature {
        config.creature.path = Some(path.clone());
    }
    if cli.no_creature {
        config.creature.path = None;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("lavaworld-desktop starting");

    let mut scene = LavaScene::new(load_config(&cli)?);
    scene.start_creature_load();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = GpuApp::new(scene);
    event_loop.run_app(&mut app)?;

    tracing::info!(frames = app.state.frames.frames(), "lavaworld-desktop exiting");
    Ok(())
}

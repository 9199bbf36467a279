use anyhow::{Context, Result};
use clap::Parser;
use glam::UVec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};
use voxelspace_input::{Action, InputSampler};
use voxelspace_kernel::{Scene, VoxelGrid};
use voxelspace_render::{FlyCamera, FrameDriver, FrameTimer, Settings};
use voxelspace_render_wgpu::WgpuRenderer;

/// Frames per frame-time log line.
const TIMER_WINDOW: usize = 120;
/// Longest frame step applied to the camera, so a stall does not teleport it.
const MAX_FRAME_DT: f32 = 0.1;

#[derive(Parser)]
#[command(name = "voxelspace-desktop", about = "Real-time voxel ray caster")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Built-in scene used when no model file is given
    #[arg(long, value_enum, default_value = "terrain")]
    scene: SceneArg,

    /// Raw voxel model: N^3 bytes, one material id per cell
    #[arg(long)]
    model: Option<PathBuf>,

    /// Settings file (.yaml, .yml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "1280")]
    width: u32,

    #[arg(long, default_value = "720")]
    height: u32,
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

/// Camera action bound to a physical key.
fn action_for(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::KeyW => Some(Action::MoveForward),
        KeyCode::KeyS => Some(Action::MoveBackward),
        KeyCode::KeyA => Some(Action::StrafeLeft),
        KeyCode::KeyD => Some(Action::StrafeRight),
        KeyCode::KeyQ => Some(Action::Ascend),
        KeyCode::KeyE => Some(Action::Descend),
        KeyCode::KeyF => Some(Action::Slow),
        _ => None,
    }
}

fn load_grid(cli: &Cli, settings: &Settings) -> Result<VoxelGrid> {
    match &cli.model {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading model {}", path.display()))?;
            VoxelGrid::from_raw(bytes).with_context(|| format!("loading model {}", path.display()))
        }
        None => Ok(Scene::from(cli.scene).build(settings.grid_size)?),
    }
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
}

impl Gpu {
    fn new(window: Arc<Window>, grid: &VoxelGrid, settings: &Settings) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone()).context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("voxelspace_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        // The kernel writes display-ready values; an sRGB surface would encode them twice.
        let surface_format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = caps
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

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            grid,
            settings,
        )?;

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            format = ?surface_format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer.resize(&self.device, self.config.width, self.config.height);
    }

    fn viewport(&self) -> UVec2 {
        UVec2::new(self.config.width, self.config.height)
    }
}

struct App {
    initial_size: PhysicalSize<u32>,
    settings: Settings,
    grid: VoxelGrid,
    sampler: InputSampler,
    driver: FrameDriver,
    timer: FrameTimer,
    pointer_locked: bool,
    last_frame: Instant,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
}

impl App {
    fn new(grid: VoxelGrid, settings: Settings, initial_size: PhysicalSize<u32>) -> Self {
        Self {
            initial_size,
            driver: FrameDriver::new(FlyCamera::default(), settings.camera),
            settings,
            grid,
            sampler: InputSampler::new(),
            timer: FrameTimer::new(TIMER_WINDOW),
            pointer_locked: false,
            last_frame: Instant::now(),
            window: None,
            gpu: None,
        }
    }

    fn set_pointer_lock(&mut self, locked: bool) {
        let Some(window) = &self.window else {
            return;
        };
        if locked {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                tracing::warn!("pointer lock unavailable: {e}");
                return;
            }
        } else if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            tracing::warn!("failed to release pointer: {e}");
        }
        window.set_cursor_visible(!locked);
        self.pointer_locked = locked;
        tracing::debug!(locked, "pointer lock changed");
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if key == KeyCode::Escape && pressed {
            self.set_pointer_lock(false);
            return;
        }
        if let Some(action) = action_for(key) {
            if pressed {
                self.sampler.press(action);
            } else {
                self.sampler.release(action);
            }
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let frame_time = now - self.last_frame;
        self.last_frame = now;

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let dt = frame_time.as_secs_f32().min(MAX_FRAME_DT);
        let input = self.sampler.snapshot();
        let state = self.driver.advance(&input, dt, gpu.viewport());
        let view = state.view(gpu.viewport(), self.settings.camera.focal_length);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let target = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        gpu.renderer.render(&gpu.device, &gpu.queue, &target, &view);
        output.present();

        self.record_frame_time(frame_time);
    }

    fn record_frame_time(&mut self, frame_time: Duration) {
        self.timer.record(frame_time);
        if self.timer.window_complete() {
            let position = self.driver.camera().position;
            tracing::info!(
                avg_ms = self.timer.average().as_secs_f64() * 1000.0,
                min_ms = self.timer.min().as_secs_f64() * 1000.0,
                max_ms = self.timer.max().as_secs_f64() * 1000.0,
                x = position.x,
                y = position.y,
                z = position.z,
                "frame times"
            );
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Voxelspace")
            .with_inner_size(self.initial_size);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match Gpu::new(window.clone(), &self.grid, &self.settings) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("GPU initialization failed: {e:#}");
                event_loop.exit();
                return;
            }
        }
        self.window = Some(window);
        self.last_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
            }
            WindowEvent::Focused(false) => {
                self.sampler.release_all();
                self.set_pointer_lock(false);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.handle_key(key, state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                if !self.pointer_locked {
                    self.set_pointer_lock(true);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.pointer_locked {
                self.sampler.add_mouse_motion(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("voxelspace-desktop starting");

    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings {}", path.display()))?,
        None => Settings::default(),
    };
    let grid = load_grid(&cli, &settings)?;
    settings.warn_if_trace_short(grid.size());
    tracing::info!(size = grid.size(), solid = grid.solid_count(), "voxel grid ready");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(grid, settings, PhysicalSize::new(cli.width.max(1), cli.height.max(1)));
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_map_to_actions() {
        assert_eq!(action_for(KeyCode::KeyW), Some(Action::MoveForward));
        assert_eq!(action_for(KeyCode::KeyS), Some(Action::MoveBackward));
        assert_eq!(action_for(KeyCode::KeyQ), Some(Action::Ascend));
        assert_eq!(action_for(KeyCode::KeyE), Some(Action::Descend));
        assert_eq!(action_for(KeyCode::KeyF), Some(Action::Slow));
        assert_eq!(action_for(KeyCode::Escape), None);
    }

    #[test]
    fn every_action_has_a_key() {
        let keys = [
            KeyCode::KeyW,
            KeyCode::KeyS,
            KeyCode::KeyA,
            KeyCode::KeyD,
            KeyCode::KeyE,
            KeyCode::KeyQ,
            KeyCode::KeyF,
        ];
        let bound: Vec<Action> = keys.into_iter().filter_map(action_for).collect();
        for action in Action::ALL {
            assert!(bound.contains(&action), "{action:?} unbound");
        }
    }
}

//! Windowed application: winit event handling and the per-frame loop

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use swarm_core::gizmo::bounds_wireframe;
use swarm_core::glam::Vec3;
use swarm_core::time::FrameClock;
use swarm_core::{FlockPipeline, FrameInput, ObstacleSource};
use swarm_metrics::{FrameTimer, PipelineStats};
use swarm_render::draw::RenderFrame;
use swarm_render::wgpu::SurfaceError;
use swarm_render::window::{aspect_ratio, window_attributes, WindowConfig};
use swarm_render::{FlyMesh, FlyRenderer, GpuContext, GpuFlockBackend};
use swarm_services::{DragState, OrbitCamera, Settings};
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const REPORT_INTERVAL: Duration = Duration::from_secs(2);
/// Distance from the emitter at which `O` places new obstacles.
const OBSTACLE_RING_RADIUS: f32 = 8.0;

struct Gpu {
    context: GpuContext,
    renderer: FlyRenderer,
    pipeline: FlockPipeline<GpuFlockBackend>,
}

pub struct SwarmApp {
    settings: Settings,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    camera: OrbitCamera,
    drag: DragState,
    clock: FrameClock,
    timer: FrameTimer,
    stats: PipelineStats,
    last_report: Instant,
    failure: Option<anyhow::Error>,
}

impl SwarmApp {
    pub fn new(settings: Settings) -> Self {
        let camera = OrbitCamera::looking_at(settings.scene.emitter_origin);
        let stats = PipelineStats::new(settings.swarm.population, 120);
        Self {
            settings,
            window: None,
            gpu: None,
            camera,
            drag: DragState::default(),
            clock: FrameClock::new(),
            timer: FrameTimer::new(120),
            stats,
            last_report: Instant::now(),
            failure: None,
        }
    }

    /// Surface any error that stopped the event loop.
    pub fn finish(mut self) -> Result<()> {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.pipeline.shutdown();
        }
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn init_gpu(&self, window: Arc<Window>) -> Result<Gpu> {
        let size = window.inner_size();
        let instance = GpuContext::create_instance();
        let surface = instance.create_surface(window).context("creating surface")?;
        let context = GpuContext::for_surface(instance, &surface)?;

        let population = self.settings.swarm.population;
        let backend = GpuFlockBackend::new(&context, population)?;
        let mesh = FlyMesh::dart();
        let renderer = FlyRenderer::new(&context, surface, size.width, size.height, &backend, &mesh)?;
        let pipeline = FlockPipeline::new(
            backend,
            self.settings.swarm.clone(),
            Some(mesh.descriptor()),
            self.settings.scene.emitter_origin,
        )?;

        Ok(Gpu {
            context,
            renderer,
            pipeline,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        self.timer.begin();
        let delta_time = self.clock.tick();

        let (width, height) = gpu.renderer.size();
        let minimized = self
            .window
            .as_ref()
            .map(|w| {
                let size = w.inner_size();
                size.width == 0 || size.height == 0
            })
            .unwrap_or(true);
        // A minimised window has no usable camera.
        let view_proj = (!minimized).then(|| self.camera.view_proj(aspect_ratio(width, height)));

        let scene = &self.settings.scene;
        let outcome = match gpu.pipeline.run_frame(&FrameInput {
            delta_time,
            view_proj,
            obstacles: &scene.obstacles,
            target: scene.target,
            emitter_origin: scene.emitter_origin,
        }) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.fail(event_loop, err.into());
                return;
            }
        };
        self.stats.record(&outcome);

        if let Some(view_proj) = view_proj {
            let frame = RenderFrame {
                view_proj,
                draw: outcome.draw,
                bounds: scene
                    .show_bounds
                    .then(|| bounds_wireframe(scene.emitter_origin, gpu.pipeline.config().bounds_size)),
            };
            match gpu.renderer.render(&gpu.context, gpu.pipeline.backend(), &frame) {
                Ok(()) => {}
                Err(err @ (SurfaceError::Lost | SurfaceError::Outdated)) => {
                    warn!(%err, "reconfiguring surface");
                    gpu.renderer.reconfigure(&gpu.context.device);
                }
                Err(SurfaceError::OutOfMemory) => {
                    self.fail(event_loop, anyhow::anyhow!("surface out of memory"));
                    return;
                }
                Err(err) => warn!(%err, "frame dropped"),
            }
        }
        self.timer.end();

        if self.last_report.elapsed() >= REPORT_INTERVAL {
            self.last_report = Instant::now();
            let (fastest_ms, slowest_ms) = self.timer.frame_time_range_ms();
            info!(
                fps = format_args!("{:.1}", self.timer.fps()),
                frame_ms = format_args!("{:.2}", self.timer.frame_time_ms()),
                fastest_ms = format_args!("{fastest_ms:.2}"),
                slowest_ms = format_args!("{slowest_ms:.2}"),
                summary = %self.stats.summary(),
                "swarm"
            );
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        let origin = self.settings.scene.emitter_origin;
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyB => {
                let scene = &mut self.settings.scene;
                scene.show_bounds = !scene.show_bounds;
            }
            KeyCode::KeyO => {
                let obstacles = &mut self.settings.scene.obstacles;
                let position = ring_position(obstacles.len(), origin);
                obstacles.push(ObstacleSource::uniform(position, 3.0));
                info!(count = obstacles.len(), "obstacle added");
            }
            KeyCode::KeyP => {
                let obstacles = &mut self.settings.scene.obstacles;
                if obstacles.pop().is_some() {
                    info!(count = obstacles.len(), "obstacle removed");
                }
            }
            KeyCode::KeyC => {
                if let Some(gpu) = self.gpu.as_mut() {
                    let enabled = !gpu.pipeline.culling_enabled();
                    gpu.pipeline.set_culling_enabled(enabled);
                }
            }
            KeyCode::KeyR => {
                if let Some(gpu) = self.gpu.as_mut() {
                    if let Err(err) = gpu.pipeline.reinitialize(origin) {
                        self.fail(event_loop, err.into());
                        return;
                    }
                    self.clock.reset();
                    info!("population re-scattered");
                }
            }
            _ => {}
        }
    }
}

/// Spread successive obstacles around the emitter on a golden-angle ring.
fn ring_position(index: usize, origin: Vec3) -> Vec3 {
    let angle = index as f32 * 2.399_963;
    origin + Vec3::new(angle.cos(), 0.0, angle.sin()) * OBSTACLE_RING_RADIUS
}

impl ApplicationHandler for SwarmApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let config = WindowConfig {
            title: self.settings.window.title.clone(),
            width: self.settings.window.width,
            height: self.settings.window.height,
        };
        let window = match event_loop.create_window(window_attributes(&config)) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.fail(event_loop, anyhow::Error::new(err).context("creating window"));
                return;
            }
        };

        match self.init_gpu(Arc::clone(&window)) {
            Ok(gpu) => {
                self.stats = PipelineStats::new(gpu.pipeline.population(), 120);
                self.gpu = Some(gpu);
                self.window = Some(window);
            }
            Err(err) => self.fail(event_loop, err),
        }
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
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.renderer.resize(&gpu.context.device, size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.handle_key(event_loop, code);
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => match state {
                ElementState::Pressed => self.drag.press(),
                ElementState::Released => self.drag.release(),
            },
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((dx, dy)) = self.drag.moved_to(position.x, position.y) {
                    self.camera.orbit(dx, dy);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                self.camera.zoom(steps);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

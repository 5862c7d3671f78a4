//! Lifecycle manager and per-frame coordinator
//!
//! [`FlockPipeline`] owns a [`FlockBackend`] and drives it through one
//! simulate, cull and draw-args sequence per frame.

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::backend::FlockBackend;
use crate::config::FlockConfig;
use crate::draw::{build_arguments, DrawSource, DrawSubmission, MeshDescriptor};
use crate::error::SwarmError;
use crate::instance::InstanceStore;
use crate::obstacle::{ObstacleSource, ObstacleTracker};
use crate::params::{CullParams, SimParams, StepInputs};

/// Host inputs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub delta_time: f32,
    /// Camera view-projection. `None` means no camera this frame.
    pub view_proj: Option<Mat4>,
    pub obstacles: &'a [ObstacleSource],
    /// Seek target. Falls back to `emitter_origin`.
    pub target: Option<Vec3>,
    /// Emitter position; also the centre of the bounds box.
    pub emitter_origin: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    /// The draw to issue, or `None` when the frame was skipped.
    pub draw: Option<DrawSubmission>,
    /// Visible set count, when the visibility stage ran.
    pub visible_count: Option<u32>,
    pub obstacles_rebuilt: bool,
    pub frame_index: u64,
}

pub struct FlockPipeline<B: FlockBackend> {
    backend: B,
    config: FlockConfig,
    mesh: Option<MeshDescriptor>,
    tracker: ObstacleTracker,
    obstacle_count: u32,
    rng: StdRng,
    frame_index: u64,
    camera_missing: bool,
}

impl<B: FlockBackend> FlockPipeline<B> {
    /// Validate `config`, scatter the population around `emitter_origin`
    /// and upload it to `backend`.
    pub fn new(
        mut backend: B,
        config: FlockConfig,
        mesh: Option<MeshDescriptor>,
        emitter_origin: Vec3,
    ) -> Result<Self, SwarmError> {
        config.validate()?;
        if backend.population() != config.population {
            return Err(SwarmError::PopulationMismatch {
                expected: backend.population(),
                actual: config.population,
            });
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let store = InstanceStore::initialize(config.population, emitter_origin, config.fly_scale, &mut rng)?;
        backend.upload_instances(&store)?;

        if mesh.is_none() {
            warn!("no mesh descriptor, draws will be empty");
        }
        info!(
            backend = backend.name(),
            population = config.population,
            culling = config.culling.enabled,
            "flock pipeline initialized"
        );

        Ok(Self {
            backend,
            config,
            mesh,
            tracker: ObstacleTracker::new(),
            obstacle_count: 0,
            rng,
            frame_index: 0,
            camera_missing: false,
        })
    }

    /// Ensure obstacles, simulate, then cull (or not) and write the draw
    /// arguments.
    ///
    /// With culling on and no camera the frame still simulates but returns
    /// no draw.
    pub fn run_frame(&mut self, input: &FrameInput<'_>) -> Result<FrameOutcome, SwarmError> {
        if self.backend.is_released() {
            return Err(SwarmError::Released);
        }

        let obstacles_rebuilt = self.ensure_obstacles(input.obstacles)?;
        let population = self.backend.population();
        let frame_index = self.frame_index;
        self.frame_index += 1;

        let params = SimParams::new(
            &self.config,
            population,
            StepInputs {
                delta_time: sanitize_delta(input.delta_time),
                target: input.target.unwrap_or(input.emitter_origin),
                bounds_center: input.emitter_origin,
                obstacle_count: self.obstacle_count,
                frame_index: frame_index as u32,
            },
        );
        self.backend.simulate(&params)?;

        let (instance_count, source, visible_count) = if self.config.culling.enabled {
            let Some(view_proj) = input.view_proj else {
                self.note_missing_camera(frame_index);
                return Ok(FrameOutcome {
                    draw: None,
                    visible_count: None,
                    obstacles_rebuilt,
                    frame_index,
                });
            };
            let cull = CullParams::new(view_proj, population, self.config.culling.frustum_margin);
            let count = self.backend.cull(&cull)?;
            (count, DrawSource::Visible, Some(count))
        } else {
            (population, DrawSource::Instances, None)
        };
        self.camera_missing = false;

        let args = build_arguments(self.mesh.as_ref(), instance_count);
        self.backend.write_draw_args(&args)?;
        debug!(frame = frame_index, instances = instance_count, ?source, "frame ready");

        Ok(FrameOutcome {
            draw: Some(DrawSubmission { args, source }),
            visible_count,
            obstacles_rebuilt,
            frame_index,
        })
    }

    fn ensure_obstacles(&mut self, sources: &[ObstacleSource]) -> Result<bool, SwarmError> {
        let Some(store) = self.tracker.ensure_current(sources) else {
            return Ok(false);
        };
        if let Err(err) = self.backend.upload_obstacles(&store) {
            self.tracker.invalidate();
            return Err(err);
        }
        self.obstacle_count = store.active_count();
        Ok(true)
    }

    fn note_missing_camera(&mut self, frame_index: u64) {
        if self.camera_missing {
            debug!(frame = frame_index, "no camera, draw skipped");
        } else {
            warn!(frame = frame_index, "culling enabled but no camera, skipping draws until one appears");
            self.camera_missing = true;
        }
    }

    /// Re-scatter the whole population around `emitter_origin`.
    pub fn reinitialize(&mut self, emitter_origin: Vec3) -> Result<(), SwarmError> {
        let store = InstanceStore::initialize(
            self.backend.population(),
            emitter_origin,
            self.config.fly_scale,
            &mut self.rng,
        )?;
        self.backend.upload_instances(&store)
    }

    pub fn set_culling_enabled(&mut self, enabled: bool) {
        if self.config.culling.enabled != enabled {
            info!(enabled, "culling toggled");
        }
        self.config.culling.enabled = enabled;
    }

    pub fn culling_enabled(&self) -> bool {
        self.config.culling.enabled
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// Tunables are re-read every frame. `population` is fixed at
    /// construction and edits to it are ignored.
    pub fn config_mut(&mut self) -> &mut FlockConfig {
        &mut self.config
    }

    pub fn mesh(&self) -> Option<&MeshDescriptor> {
        self.mesh.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn population(&self) -> u32 {
        self.backend.population()
    }

    /// Frames run so far, skipped frames included.
    pub fn frame_count(&self) -> u64 {
        self.frame_index
    }

    pub fn obstacle_rebuilds(&self) -> u64 {
        self.tracker.rebuild_count()
    }

    /// Release every backend resource. Later calls are no-ops.
    pub fn shutdown(&mut self) {
        if !self.backend.is_released() {
            info!(frames = self.frame_index, "flock pipeline shutting down");
        }
        self.backend.release();
    }
}

impl<B: FlockBackend> Drop for FlockPipeline<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sanitize_delta(delta_time: f32) -> f32 {
    if delta_time.is_finite() {
        delta_time.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuBackend;

    fn config(population: u32) -> FlockConfig {
        FlockConfig {
            population,
            seed: Some(11),
            ..FlockConfig::default()
        }
    }

    fn input(view_proj: Option<Mat4>) -> FrameInput<'static> {
        FrameInput {
            delta_time: 0.016,
            view_proj,
            obstacles: &[],
            target: None,
            emitter_origin: Vec3::ZERO,
        }
    }

    #[test]
    fn population_must_match_backend() {
        let backend = CpuBackend::new(10).unwrap();
        let result = FlockPipeline::new(backend, config(20), None, Vec3::ZERO);
        assert!(matches!(result, Err(SwarmError::PopulationMismatch { .. })));
    }

    #[test]
    fn invalid_config_is_rejected_before_upload() {
        let backend = CpuBackend::new(10).unwrap();
        let mut bad = config(10);
        bad.perception_radius = -1.0;
        let result = FlockPipeline::new(backend, bad, None, Vec3::ZERO);
        assert!(matches!(result, Err(SwarmError::InvalidConfig(_))));
    }

    #[test]
    fn first_frame_builds_the_sentinel_store() {
        let backend = CpuBackend::new(4).unwrap();
        let mut pipeline = FlockPipeline::new(backend, config(4), None, Vec3::ZERO).unwrap();
        pipeline.set_culling_enabled(false);
        let outcome = pipeline.run_frame(&input(None)).unwrap();
        assert!(outcome.obstacles_rebuilt);
        assert_eq!(pipeline.backend().obstacles().len(), 1);
        assert!(!pipeline.run_frame(&input(None)).unwrap().obstacles_rebuilt);
    }

    #[test]
    fn missing_mesh_writes_zero_index_args() {
        let backend = CpuBackend::new(4).unwrap();
        let mut pipeline = FlockPipeline::new(backend, config(4), None, Vec3::ZERO).unwrap();
        pipeline.set_culling_enabled(false);
        let draw = pipeline.run_frame(&input(None)).unwrap().draw.unwrap();
        assert_eq!(draw.args.index_count, 0);
        assert_eq!(draw.args.instance_count, 4);
        assert_eq!(pipeline.backend().draw_args(), Some(draw.args));
    }

    #[test]
    fn frame_counter_includes_skipped_frames() {
        let backend = CpuBackend::new(4).unwrap();
        let mut pipeline = FlockPipeline::new(backend, config(4), None, Vec3::ZERO).unwrap();
        assert!(pipeline.run_frame(&input(None)).unwrap().draw.is_none());
        assert!(pipeline.run_frame(&input(None)).unwrap().draw.is_none());
        assert_eq!(pipeline.frame_count(), 2);
    }

    #[test]
    fn shutdown_twice_is_harmless() {
        let backend = CpuBackend::new(4).unwrap();
        let mut pipeline = FlockPipeline::new(backend, config(4), None, Vec3::ZERO).unwrap();
        pipeline.shutdown();
        pipeline.shutdown();
        assert!(pipeline.backend().is_released());
        assert!(matches!(pipeline.run_frame(&input(None)), Err(SwarmError::Released)));
    }

    #[test]
    fn non_finite_delta_is_treated_as_zero() {
        assert_eq!(sanitize_delta(f32::NAN), 0.0);
        assert_eq!(sanitize_delta(-1.0), 0.0);
        assert_eq!(sanitize_delta(0.5), 0.5);
    }
}

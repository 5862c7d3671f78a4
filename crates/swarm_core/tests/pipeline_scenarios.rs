//! End-to-end frames through `FlockPipeline<CpuBackend>`.

use swarm_core::flocking::neighbor_forces;
use swarm_core::glam::{Mat4, Vec3};
use swarm_core::{
    CpuBackend, DrawIndexedIndirectArgs, DrawSource, FlockBackend, FlockConfig, FlockPipeline,
    FlyInstance, FrameInput, InstanceStore, MeshDescriptor, ObstacleSource,
};

const DT: f32 = 0.016;

fn pipeline(config: FlockConfig) -> FlockPipeline<CpuBackend> {
    let backend = CpuBackend::new(config.population).unwrap();
    FlockPipeline::new(backend, config, Some(MeshDescriptor::new(36)), Vec3::ZERO).unwrap()
}

fn seeded(population: u32) -> FlockConfig {
    FlockConfig {
        population,
        seed: Some(2024),
        ..FlockConfig::default()
    }
}

fn quiet(population: u32) -> FlockConfig {
    FlockConfig {
        separation_weight: 0.0,
        alignment_weight: 0.0,
        cohesion_weight: 0.0,
        target_weight: 0.0,
        bounds_weight: 0.0,
        noise_strength: 0.0,
        obstacle_avoidance_weight: 0.0,
        ..seeded(population)
    }
}

fn frame<'a>(view_proj: Option<Mat4>, obstacles: &'a [ObstacleSource]) -> FrameInput<'a> {
    FrameInput {
        delta_time: DT,
        view_proj,
        obstacles,
        target: None,
        emitter_origin: Vec3::ZERO,
    }
}

fn wide_camera() -> Mat4 {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 60.0), Vec3::ZERO, Vec3::Y);
    let proj = Mat4::perspective_rh(1.2, 16.0 / 9.0, 0.1, 500.0);
    proj * view
}

fn assert_close(a: Vec3, b: Vec3) {
    assert!((a - b).length() < 1e-4, "{a} != {b}");
}

#[test]
fn lone_fly_feels_no_neighbor_forces() {
    let mut pipeline = pipeline(seeded(1));
    pipeline.set_culling_enabled(false);
    for _ in 0..5 {
        pipeline.run_frame(&frame(None, &[])).unwrap();
        let forces = neighbor_forces(0, pipeline.backend().instances(), 1000.0);
        assert_eq!(forces.neighbors, 0);
        assert_eq!(forces.separation + forces.alignment + forces.cohesion, Vec3::ZERO);
    }
}

#[test]
fn unchanged_obstacle_count_does_not_rebuild() {
    let mut pipeline = pipeline(seeded(16));
    let sources = [ObstacleSource::uniform(Vec3::new(3.0, 0.0, 0.0), 2.0)];

    assert!(pipeline.run_frame(&frame(Some(wide_camera()), &sources)).unwrap().obstacles_rebuilt);
    for _ in 0..3 {
        let outcome = pipeline.run_frame(&frame(Some(wide_camera()), &sources)).unwrap();
        assert!(!outcome.obstacles_rebuilt);
    }
    assert_eq!(pipeline.obstacle_rebuilds(), 1);
}

#[test]
fn moving_an_obstacle_without_changing_the_count_keeps_the_old_store() {
    let mut pipeline = pipeline(seeded(8));
    pipeline.set_culling_enabled(false);
    pipeline
        .run_frame(&frame(None, &[ObstacleSource::uniform(Vec3::ZERO, 2.0)]))
        .unwrap();
    pipeline
        .run_frame(&frame(None, &[ObstacleSource::uniform(Vec3::new(9.0, 9.0, 9.0), 4.0)]))
        .unwrap();

    let stored = pipeline.backend().obstacles();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].position(), Vec3::ZERO);
    assert_eq!(stored[0].radius, 1.0);
}

#[test]
fn obstacle_set_transitions_rebuild_each_time() {
    let mut pipeline = pipeline(seeded(8));
    pipeline.set_culling_enabled(false);
    let two = [
        ObstacleSource::uniform(Vec3::X, 1.0),
        ObstacleSource::uniform(Vec3::NEG_X, 3.0),
    ];

    pipeline.run_frame(&frame(None, &[])).unwrap();
    assert_eq!(pipeline.backend().obstacles()[0].radius, 0.0);

    assert!(pipeline.run_frame(&frame(None, &two)).unwrap().obstacles_rebuilt);
    assert_eq!(pipeline.backend().obstacles().len(), 2);
    assert_eq!(pipeline.backend().obstacles()[1].radius, 1.5);

    assert!(pipeline.run_frame(&frame(None, &[])).unwrap().obstacles_rebuilt);
    let stored = pipeline.backend().obstacles();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].radius, 0.0);
    assert_eq!(pipeline.obstacle_rebuilds(), 3);
}

#[test]
fn culling_disabled_draws_the_whole_population() {
    let mut pipeline = pipeline(seeded(300));
    pipeline.set_culling_enabled(false);
    let outcome = pipeline.run_frame(&frame(None, &[])).unwrap();

    let draw = outcome.draw.unwrap();
    assert_eq!(draw.source, DrawSource::Instances);
    assert_eq!(draw.args, DrawIndexedIndirectArgs::new(36, 0, 0, 300));
    assert_eq!(outcome.visible_count, None);
}

#[test]
fn frustum_around_everything_sees_every_fly() {
    let mut pipeline = pipeline(seeded(300));
    let outcome = pipeline.run_frame(&frame(Some(wide_camera()), &[])).unwrap();

    let draw = outcome.draw.unwrap();
    assert_eq!(outcome.visible_count, Some(300));
    assert_eq!(draw.source, DrawSource::Visible);
    assert_eq!(draw.args.instance_count, 300);
    assert_eq!(pipeline.backend().visible().len(), 300);
}

#[test]
fn camera_facing_away_sees_nothing() {
    let mut pipeline = pipeline(seeded(100));
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 60.0), Vec3::new(0.0, 0.0, 120.0), Vec3::Y);
    let proj = Mat4::perspective_rh(1.2, 1.0, 0.1, 500.0);
    let outcome = pipeline.run_frame(&frame(Some(proj * view), &[])).unwrap();
    assert_eq!(outcome.visible_count, Some(0));
    assert_eq!(outcome.draw.unwrap().args.instance_count, 0);
}

#[test]
fn zero_forces_integrate_position_by_velocity() {
    let mut pipeline = pipeline(quiet(100));
    pipeline.set_culling_enabled(false);
    let before = pipeline.backend().instances().to_vec();

    pipeline.run_frame(&frame(None, &[])).unwrap();

    for (old, new) in before.iter().zip(pipeline.backend().instances()) {
        assert_close(new.velocity(), old.velocity());
        assert_close(new.position(), old.position() + old.velocity() * DT);
        assert_eq!(new.state, 0);
    }
}

#[test]
fn default_forces_integrate_position_by_new_velocity() {
    let mut pipeline = pipeline(seeded(100));
    pipeline.set_culling_enabled(false);
    let before = pipeline.backend().instances().to_vec();

    pipeline.run_frame(&frame(None, &[])).unwrap();

    for (old, new) in before.iter().zip(pipeline.backend().instances()) {
        assert_close(new.position(), old.position() + new.velocity() * DT);
        assert!(new.velocity().length() <= pipeline.config().max_speed + 1e-4);
    }
}

#[test]
fn fly_touching_an_obstacle_is_pushed_outward() {
    let config = FlockConfig {
        obstacle_avoidance_weight: 3.0,
        obstacle_avoidance_radius: 1.5,
        ..quiet(1)
    };
    let mut pipeline = pipeline(config);
    pipeline.set_culling_enabled(false);
    let start = Vec3::new(0.0, 1.0, 0.0);
    let store = InstanceStore::from_records(vec![FlyInstance::new(start, Vec3::ZERO, 0.1)]).unwrap();
    pipeline.backend_mut().upload_instances(&store).unwrap();

    // Radius is half the horizontal scale: 1.0.
    let obstacle = [ObstacleSource::uniform(Vec3::ZERO, 2.0)];
    pipeline.run_frame(&frame(None, &obstacle)).unwrap();

    let fly = pipeline.backend().instances()[0];
    assert!(fly.velocity().y > 0.0);
    assert!(fly.velocity().x.abs() < 1e-6 && fly.velocity().z.abs() < 1e-6);
    assert!(fly.position().y > start.y);
}

#[test]
fn missing_camera_skips_the_draw_but_still_simulates() {
    let mut pipeline = pipeline(seeded(50));
    let before = pipeline.backend().instances().to_vec();

    let outcome = pipeline.run_frame(&frame(None, &[])).unwrap();

    assert!(outcome.draw.is_none());
    assert_eq!(outcome.visible_count, None);
    assert_eq!(pipeline.backend().draw_args(), Some(DrawIndexedIndirectArgs::default()));
    assert_ne!(before, pipeline.backend().instances());

    let outcome = pipeline.run_frame(&frame(Some(wide_camera()), &[])).unwrap();
    assert!(outcome.draw.is_some());
}

#[test]
fn same_seed_gives_same_swarm() {
    let a = pipeline(seeded(64));
    let b = pipeline(seeded(64));
    assert_eq!(a.backend().instances(), b.backend().instances());
}

#[test]
fn reinitialize_scatters_around_the_new_origin() {
    let mut pipeline = pipeline(seeded(64));
    let origin = Vec3::new(100.0, 0.0, 0.0);
    pipeline.reinitialize(origin).unwrap();
    for fly in pipeline.backend().instances() {
        assert!(fly.position().distance(origin) <= 5.0 + 1e-3);
    }
}

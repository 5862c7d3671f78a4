//! Windowless run on the CPU backend

use anyhow::Result;
use swarm_core::{CpuBackend, FlockPipeline, FrameInput};
use swarm_metrics::{FrameTimer, PipelineStats};
use swarm_services::{OrbitCamera, Settings};
use tracing::info;

const STEP: f32 = 1.0 / 60.0;

pub fn run(settings: &Settings, frames: u32) -> Result<()> {
    let scene = &settings.scene;
    let backend = CpuBackend::new(settings.swarm.population)?;
    let mut pipeline = FlockPipeline::new(backend, settings.swarm.clone(), None, scene.emitter_origin)?;

    let camera = OrbitCamera::looking_at(scene.emitter_origin);
    let view_proj = camera.view_proj(16.0 / 9.0);
    let mut timer = FrameTimer::new(120);
    let mut stats = PipelineStats::new(pipeline.population(), 120);

    for _ in 0..frames {
        timer.begin();
        let outcome = pipeline.run_frame(&FrameInput {
            delta_time: STEP,
            view_proj: Some(view_proj),
            obstacles: &scene.obstacles,
            target: scene.target,
            emitter_origin: scene.emitter_origin,
        })?;
        stats.record(&outcome);
        timer.end();
    }

    info!(
        frames,
        frame_ms = timer.frame_time_ms(),
        summary = %stats.summary(),
        "headless run finished"
    );
    pipeline.shutdown();
    Ok(())
}

//! CPU reference backend
//!
//! Runs both stages on the rayon pool, one work item per dispatch group.
//! Used headless by the test suite and as the fallback when no GPU adapter
//! is available.

use bytemuck::Zeroable;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::backend::FlockBackend;
use crate::dispatch::{dispatched_lanes, is_valid_lane, workgroup_count, WORKGROUP_SIZE};
use crate::draw::DrawIndexedIndirectArgs;
use crate::error::SwarmError;
use crate::flocking::simulate_lane;
use crate::instance::{FlyInstance, InstanceStore};
use crate::obstacle::{Obstacle, ObstacleStore};
use crate::params::{CullParams, SimParams};

struct Buffers {
    instances: Vec<FlyInstance>,
    obstacles: Vec<Obstacle>,
    visible: Vec<FlyInstance>,
    visible_count: u32,
    draw_args: DrawIndexedIndirectArgs,
}

pub struct CpuBackend {
    population: u32,
    buffers: Option<Buffers>,
}

impl CpuBackend {
    /// Allocate zeroed stores for `population` flies and a sentinel obstacle.
    pub fn new(population: u32) -> Result<Self, SwarmError> {
        if population == 0 {
            return Err(SwarmError::EmptyPopulation);
        }
        let instances = zeroed_records(population, "instance store")?;
        let visible = zeroed_records(population, "visible set")?;

        info!(population, "cpu backend ready");
        Ok(Self {
            population,
            buffers: Some(Buffers {
                instances,
                obstacles: vec![Obstacle::SENTINEL],
                visible,
                visible_count: 0,
                draw_args: DrawIndexedIndirectArgs::default(),
            }),
        })
    }

    fn buffers_mut(&mut self) -> Result<&mut Buffers, SwarmError> {
        self.buffers.as_mut().ok_or(SwarmError::Released)
    }

    /// Current instance store. Empty once released.
    pub fn instances(&self) -> &[FlyInstance] {
        self.buffers
            .as_ref()
            .map(|b| b.instances.as_slice())
            .unwrap_or_default()
    }

    /// Survivors of the last visibility pass, in no particular order.
    pub fn visible(&self) -> &[FlyInstance] {
        self.buffers
            .as_ref()
            .map(|b| &b.visible[..b.visible_count as usize])
            .unwrap_or_default()
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.buffers
            .as_ref()
            .map(|b| b.obstacles.as_slice())
            .unwrap_or_default()
    }

    pub fn draw_args(&self) -> Option<DrawIndexedIndirectArgs> {
        self.buffers.as_ref().map(|b| b.draw_args)
    }
}

fn zeroed_records(population: u32, label: &'static str) -> Result<Vec<FlyInstance>, SwarmError> {
    let mut records = Vec::new();
    records
        .try_reserve_exact(population as usize)
        .map_err(|_| SwarmError::Allocation {
            label,
            bytes: u64::from(population) * std::mem::size_of::<FlyInstance>() as u64,
        })?;
    records.resize(population as usize, FlyInstance::zeroed());
    Ok(records)
}

impl FlockBackend for CpuBackend {
    fn population(&self) -> u32 {
        self.population
    }

    fn upload_instances(&mut self, store: &InstanceStore) -> Result<(), SwarmError> {
        let expected = self.population;
        let buffers = self.buffers_mut()?;
        if store.population() != expected {
            return Err(SwarmError::PopulationMismatch {
                expected,
                actual: store.population(),
            });
        }
        buffers.instances.copy_from_slice(store.records());
        Ok(())
    }

    fn upload_obstacles(&mut self, store: &ObstacleStore) -> Result<(), SwarmError> {
        let buffers = self.buffers_mut()?;
        buffers.obstacles.clear();
        buffers.obstacles.extend_from_slice(store.records());
        Ok(())
    }

    fn simulate(&mut self, params: &SimParams) -> Result<(), SwarmError> {
        let buffers = self.buffers_mut()?;
        let snapshot = buffers.instances.clone();
        let obstacles = &buffers.obstacles;

        buffers
            .instances
            .par_chunks_mut(WORKGROUP_SIZE as usize)
            .enumerate()
            .for_each(|(group, chunk)| {
                let base = group * WORKGROUP_SIZE as usize;
                for (offset, fly) in chunk.iter_mut().enumerate() {
                    *fly = simulate_lane(base + offset, &snapshot, obstacles, params);
                }
            });

        debug!(
            groups = workgroup_count(params.boid_count),
            frame = params.frame_index,
            "simulate"
        );
        Ok(())
    }

    fn cull(&mut self, params: &CullParams) -> Result<u32, SwarmError> {
        let buffers = self.buffers_mut()?;
        buffers.visible_count = 0;

        let frustum = params.frustum();
        let population = params.boid_count.min(buffers.instances.len() as u32);
        let instances = &buffers.instances;
        let survivors: Vec<FlyInstance> = (0..dispatched_lanes(population))
            .into_par_iter()
            .filter(|&lane| is_valid_lane(lane, population))
            .map(|lane| instances[lane as usize])
            .filter(|fly| frustum.contains_point(fly.position(), params.frustum_margin))
            .collect();

        let count = survivors.len();
        buffers.visible[..count].copy_from_slice(&survivors);
        buffers.visible_count = count as u32;
        Ok(buffers.visible_count)
    }

    fn write_draw_args(&mut self, args: &DrawIndexedIndirectArgs) -> Result<(), SwarmError> {
        self.buffers_mut()?.draw_args = *args;
        Ok(())
    }

    fn release(&mut self) {
        if self.buffers.take().is_some() {
            info!(population = self.population, "cpu backend released");
        }
    }

    fn is_released(&self) -> bool {
        self.buffers.is_none()
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}

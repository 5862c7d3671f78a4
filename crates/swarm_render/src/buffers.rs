//! GPU buffer allocation
//!
//! Every buffer is size-checked against the device limits before creation
//! and created inside an out-of-memory error scope, so allocation failure
//! surfaces as a [`SwarmError`] instead of a device loss later on.

use std::mem::size_of;

use swarm_core::{DrawIndexedIndirectArgs, FlyInstance, Obstacle, SwarmError};
use swarm_core::{CullParams, SimParams};
use tracing::{debug, info};

/// Reject `size` if it is over what the device can bind.
pub fn check_size(
    label: &'static str,
    size: u64,
    usage: wgpu::BufferUsages,
    limits: &wgpu::Limits,
) -> Result<(), SwarmError> {
    let mut limit = limits.max_buffer_size;
    if usage.contains(wgpu::BufferUsages::STORAGE) {
        limit = limit.min(u64::from(limits.max_storage_buffer_binding_size));
    }
    if usage.contains(wgpu::BufferUsages::UNIFORM) {
        limit = limit.min(u64::from(limits.max_uniform_buffer_binding_size));
    }
    if size > limit {
        return Err(SwarmError::BufferTooLarge {
            label,
            bytes: size,
            limit,
        });
    }
    Ok(())
}

pub fn create_buffer(
    device: &wgpu::Device,
    label: &'static str,
    size: u64,
    usage: wgpu::BufferUsages,
) -> Result<wgpu::Buffer, SwarmError> {
    check_size(label, size, usage, &device.limits())?;

    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        debug!(label, %err, "buffer allocation failed");
        return Err(SwarmError::Allocation { label, bytes: size });
    }
    Ok(buffer)
}

/// Capacity the obstacle buffer grows to for `count` records.
pub fn obstacle_capacity_for(count: u32) -> u32 {
    count.max(1).next_power_of_two()
}

/// Every buffer one swarm needs.
pub struct FlockBuffers {
    pub instances: wgpu::Buffer,
    pub visible: wgpu::Buffer,
    pub visible_count: wgpu::Buffer,
    pub count_readback: wgpu::Buffer,
    pub obstacles: wgpu::Buffer,
    pub obstacle_capacity: u32,
    pub draw_args: wgpu::Buffer,
    pub sim_params: wgpu::Buffer,
    pub cull_params: wgpu::Buffer,
}

impl FlockBuffers {
    pub fn allocate(device: &wgpu::Device, population: u32) -> Result<Self, SwarmError> {
        if population == 0 {
            return Err(SwarmError::EmptyPopulation);
        }
        let store_bytes = u64::from(population) * size_of::<FlyInstance>() as u64;
        let storage = wgpu::BufferUsages::STORAGE;
        let copy_dst = wgpu::BufferUsages::COPY_DST;

        let instances = create_buffer(device, "Instance Store", store_bytes, storage | copy_dst)?;
        let visible = create_buffer(device, "Visible Set", store_bytes, storage)?;
        let visible_count = create_buffer(
            device,
            "Visible Count",
            size_of::<u32>() as u64,
            storage | copy_dst | wgpu::BufferUsages::COPY_SRC,
        )?;
        let count_readback = create_buffer(
            device,
            "Visible Count Readback",
            size_of::<u32>() as u64,
            wgpu::BufferUsages::MAP_READ | copy_dst,
        )?;
        let obstacle_capacity = obstacle_capacity_for(1);
        let obstacles = create_obstacle_buffer(device, obstacle_capacity)?;
        let draw_args = create_buffer(
            device,
            "Draw Arguments",
            size_of::<DrawIndexedIndirectArgs>() as u64,
            wgpu::BufferUsages::INDIRECT | copy_dst,
        )?;
        let uniform = wgpu::BufferUsages::UNIFORM | copy_dst;
        let sim_params = create_buffer(device, "Sim Params", size_of::<SimParams>() as u64, uniform)?;
        let cull_params = create_buffer(device, "Cull Params", size_of::<CullParams>() as u64, uniform)?;

        info!(population, store_bytes, "flock buffers allocated");
        Ok(Self {
            instances,
            visible,
            visible_count,
            count_readback,
            obstacles,
            obstacle_capacity,
            draw_args,
            sim_params,
            cull_params,
        })
    }

    /// Grow the obstacle buffer to hold `count` records. Returns true when
    /// the buffer was replaced and bind groups referencing it are stale.
    pub fn reserve_obstacles(&mut self, device: &wgpu::Device, count: u32) -> Result<bool, SwarmError> {
        if count <= self.obstacle_capacity {
            return Ok(false);
        }
        let capacity = obstacle_capacity_for(count);
        let replacement = create_obstacle_buffer(device, capacity)?;
        self.obstacles.destroy();
        self.obstacles = replacement;
        self.obstacle_capacity = capacity;
        info!(capacity, "obstacle buffer grown");
        Ok(true)
    }

    pub fn destroy(self) {
        for buffer in [
            self.instances,
            self.visible,
            self.visible_count,
            self.count_readback,
            self.obstacles,
            self.draw_args,
            self.sim_params,
            self.cull_params,
        ] {
            buffer.destroy();
        }
    }
}

fn create_obstacle_buffer(device: &wgpu::Device, capacity: u32) -> Result<wgpu::Buffer, SwarmError> {
    create_buffer(
        device,
        "Obstacle Store",
        u64::from(capacity) * size_of::<Obstacle>() as u64,
        wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_storage_is_rejected() {
        let limits = wgpu::Limits::downlevel_defaults();
        let too_big = u64::from(limits.max_storage_buffer_binding_size) + 4;
        let err = check_size("Instance Store", too_big, wgpu::BufferUsages::STORAGE, &limits);
        assert!(matches!(err, Err(SwarmError::BufferTooLarge { label: "Instance Store", .. })));
    }

    #[test]
    fn small_buffers_pass() {
        let limits = wgpu::Limits::default();
        assert!(check_size("Draw Arguments", 20, wgpu::BufferUsages::INDIRECT, &limits).is_ok());
    }

    #[test]
    fn obstacle_capacity_grows_in_powers_of_two() {
        assert_eq!(obstacle_capacity_for(0), 1);
        assert_eq!(obstacle_capacity_for(1), 1);
        assert_eq!(obstacle_capacity_for(3), 4);
        assert_eq!(obstacle_capacity_for(9), 16);
    }
}

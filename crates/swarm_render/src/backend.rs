//! wgpu implementation of [`FlockBackend`]

use std::sync::mpsc;
use std::sync::Arc;

use swarm_core::dispatch::workgroup_count;
use swarm_core::{
    CullParams, DrawIndexedIndirectArgs, FlockBackend, InstanceStore, ObstacleStore, SimParams,
    SwarmError,
};
use tracing::{debug, info};

use crate::buffers::FlockBuffers;
use crate::context::GpuContext;
use crate::kernels::FlockKernels;

struct Resources {
    buffers: FlockBuffers,
    simulate_group: wgpu::BindGroup,
    cull_group: wgpu::BindGroup,
}

pub struct GpuFlockBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    kernels: FlockKernels,
    population: u32,
    resources: Option<Resources>,
}

impl GpuFlockBackend {
    /// Allocate every buffer for `population` flies. Instances start zeroed
    /// until the first `upload_instances`.
    pub fn new(context: &GpuContext, population: u32) -> Result<Self, SwarmError> {
        let device = Arc::clone(&context.device);
        let queue = Arc::clone(&context.queue);

        let groups = workgroup_count(population);
        let max_groups = device.limits().max_compute_workgroups_per_dimension;
        if groups > max_groups {
            return Err(SwarmError::DeviceUnavailable(format!(
                "population {population} needs {groups} workgroups, device allows {max_groups}"
            )));
        }

        let kernels = FlockKernels::new(&device);
        let buffers = FlockBuffers::allocate(&device, population)?;
        let simulate_group = kernels.simulate_bind_group(&device, &buffers);
        let cull_group = kernels.cull_bind_group(&device, &buffers);

        info!(population, groups, "gpu flock backend ready");
        Ok(Self {
            device,
            queue,
            kernels,
            population,
            resources: Some(Resources {
                buffers,
                simulate_group,
                cull_group,
            }),
        })
    }

    fn resources(&self) -> Result<&Resources, SwarmError> {
        self.resources.as_ref().ok_or(SwarmError::Released)
    }

    /// Full instance store, for drawing with culling off.
    pub fn instance_buffer(&self) -> Option<&wgpu::Buffer> {
        self.resources.as_ref().map(|r| &r.buffers.instances)
    }

    /// Compacted visible set, for drawing with culling on.
    pub fn visible_buffer(&self) -> Option<&wgpu::Buffer> {
        self.resources.as_ref().map(|r| &r.buffers.visible)
    }

    /// Indirect argument block read by `draw_indexed_indirect`.
    pub fn draw_args_buffer(&self) -> Option<&wgpu::Buffer> {
        self.resources.as_ref().map(|r| &r.buffers.draw_args)
    }

    fn read_visible_count(&self, readback: &wgpu::Buffer) -> Result<u32, SwarmError> {
        let slice = readback.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        receiver
            .recv()
            .map_err(|err| SwarmError::Readback(err.to_string()))?
            .map_err(|err| SwarmError::Readback(err.to_string()))?;

        let count = {
            let view = slice.get_mapped_range();
            let words: &[u32] = bytemuck::cast_slice(&view);
            words[0]
        };
        readback.unmap();
        Ok(count)
    }
}

impl FlockBackend for GpuFlockBackend {
    fn population(&self) -> u32 {
        self.population
    }

    fn upload_instances(&mut self, store: &InstanceStore) -> Result<(), SwarmError> {
        let resources = self.resources()?;
        if store.population() != self.population {
            return Err(SwarmError::PopulationMismatch {
                expected: self.population,
                actual: store.population(),
            });
        }
        self.queue
            .write_buffer(&resources.buffers.instances, 0, store.as_bytes());
        Ok(())
    }

    fn upload_obstacles(&mut self, store: &ObstacleStore) -> Result<(), SwarmError> {
        let resources = self.resources.as_mut().ok_or(SwarmError::Released)?;
        let count = store.records().len() as u32;
        if resources.buffers.reserve_obstacles(&self.device, count)? {
            resources.simulate_group = self.kernels.simulate_bind_group(&self.device, &resources.buffers);
        }
        self.queue
            .write_buffer(&resources.buffers.obstacles, 0, store.as_bytes());
        debug!(records = count, "obstacle store uploaded");
        Ok(())
    }

    fn simulate(&mut self, params: &SimParams) -> Result<(), SwarmError> {
        let resources = self.resources()?;
        self.queue
            .write_buffer(&resources.buffers.sim_params, 0, bytemuck::bytes_of(params));

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Simulate Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Simulate Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.kernels.simulate);
            pass.set_bind_group(0, &resources.simulate_group, &[]);
            pass.dispatch_workgroups(workgroup_count(self.population), 1, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn cull(&mut self, params: &CullParams) -> Result<u32, SwarmError> {
        let resources = self.resources()?;
        let buffers = &resources.buffers;
        self.queue
            .write_buffer(&buffers.cull_params, 0, bytemuck::bytes_of(params));

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Cull Encoder"),
        });
        encoder.clear_buffer(&buffers.visible_count, 0, None);
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Cull Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.kernels.cull);
            pass.set_bind_group(0, &resources.cull_group, &[]);
            pass.dispatch_workgroups(workgroup_count(self.population), 1, 1);
        }
        encoder.copy_buffer_to_buffer(
            &buffers.visible_count,
            0,
            &buffers.count_readback,
            0,
            std::mem::size_of::<u32>() as u64,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let count = self.read_visible_count(&buffers.count_readback)?;
        Ok(count.min(self.population))
    }

    fn write_draw_args(&mut self, args: &DrawIndexedIndirectArgs) -> Result<(), SwarmError> {
        let resources = self.resources()?;
        self.queue
            .write_buffer(&resources.buffers.draw_args, 0, args.as_bytes());
        Ok(())
    }

    fn release(&mut self) {
        if let Some(resources) = self.resources.take() {
            resources.buffers.destroy();
            info!(population = self.population, "gpu flock backend released");
        }
    }

    fn is_released(&self) -> bool {
        self.resources.is_none()
    }

    fn name(&self) -> &'static str {
        "wgpu"
    }
}

impl Drop for GpuFlockBackend {
    fn drop(&mut self) {
        self.release();
    }
}

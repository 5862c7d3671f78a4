//! Adapter and device acquisition

use std::sync::Arc;

use swarm_core::SwarmError;
use tracing::info;

use crate::{BackendType, DeviceCapabilities};

/// Shared handles to one wgpu device.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    capabilities: DeviceCapabilities,
}

impl GpuContext {
    pub fn create_instance() -> wgpu::Instance {
        wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    }

    /// Device with no surface, for compute only.
    pub fn headless() -> Result<Self, SwarmError> {
        pollster::block_on(Self::request(Self::create_instance(), None))
    }

    /// Device able to present to `surface`. `surface` must come from `instance`.
    pub fn for_surface(instance: wgpu::Instance, surface: &wgpu::Surface<'_>) -> Result<Self, SwarmError> {
        pollster::block_on(Self::request(instance, Some(surface)))
    }

    async fn request(
        instance: wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self, SwarmError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| SwarmError::DeviceUnavailable("no compatible adapter".into()))?;

        require_downlevel(
            adapter.get_downlevel_capabilities().flags,
            &adapter.get_info().name,
        )?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Swarm Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|err| SwarmError::DeviceUnavailable(err.to_string()))?;

        let capabilities = probe_capabilities(&adapter, &device);
        info!(
            adapter = %capabilities.adapter_name,
            backend = ?capabilities.backend,
            max_storage_binding = capabilities.max_storage_binding_size,
            "gpu device ready"
        );

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            capabilities,
        })
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }
}

/// Downlevel features the flock needs: the compute kernels, indirect draws
/// and instance records read from storage in the vertex stage.
const REQUIRED_DOWNLEVEL: [(wgpu::DownlevelFlags, &str); 3] = [
    (wgpu::DownlevelFlags::COMPUTE_SHADERS, "compute shaders"),
    (wgpu::DownlevelFlags::INDIRECT_EXECUTION, "indirect execution"),
    (wgpu::DownlevelFlags::VERTEX_STORAGE, "vertex-stage storage buffers"),
];

/// Reject adapters missing any of [`REQUIRED_DOWNLEVEL`].
pub fn require_downlevel(
    flags: wgpu::DownlevelFlags,
    adapter_name: &str,
) -> Result<(), SwarmError> {
    let missing: Vec<&str> = REQUIRED_DOWNLEVEL
        .iter()
        .filter(|(flag, _)| !flags.contains(*flag))
        .map(|&(_, name)| name)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(SwarmError::DeviceUnavailable(format!(
        "adapter '{adapter_name}' lacks {}",
        missing.join(", ")
    )))
}

/// Probe what the device actually granted.
pub fn probe_capabilities(adapter: &wgpu::Adapter, device: &wgpu::Device) -> DeviceCapabilities {
    let info = adapter.get_info();
    let limits = device.limits();
    let downlevel = adapter.get_downlevel_capabilities();
    DeviceCapabilities {
        backend: BackendType::from(info.backend),
        adapter_name: info.name,
        max_buffer_size: limits.max_buffer_size,
        max_storage_binding_size: u64::from(limits.max_storage_buffer_binding_size),
        max_compute_workgroups_per_dimension: limits.max_compute_workgroups_per_dimension,
        supports_compute: downlevel.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS),
        supports_indirect_execution: downlevel
            .flags
            .contains(wgpu::DownlevelFlags::INDIRECT_EXECUTION),
    }
}

//! Swarm Render
//!
//! wgpu side of the fly swarm: device setup, GPU buffers, the two compute
//! kernels and the indirect instanced draw.

pub mod backend;
pub mod buffers;
pub mod context;
pub mod draw;
pub mod error;
pub mod kernels;
pub mod mesh;
pub mod window;

pub use wgpu;
pub use winit;

pub use backend::GpuFlockBackend;
pub use context::GpuContext;
pub use draw::FlyRenderer;
pub use error::RenderError;
pub use mesh::FlyMesh;

/// WGSL sources, embedded at build time.
pub mod shaders {
    pub const SIMULATE: &str = include_str!("../shaders/flock_simulate.wgsl");
    pub const CULL: &str = include_str!("../shaders/flock_cull.wgsl");
    pub const DRAW: &str = include_str!("../shaders/fly_draw.wgsl");
}

/// Rendering backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Metal (macOS, iOS)
    Metal,
    /// DirectX 12 (Windows)
    DirectX12,
    /// Vulkan (cross-platform)
    Vulkan,
    /// OpenGL (cross-platform, fallback)
    OpenGL,
    /// WebGPU (web)
    BrowserWebGpu,
    /// No real backend
    Empty,
}

impl From<wgpu::Backend> for BackendType {
    fn from(backend: wgpu::Backend) -> Self {
        match backend {
            wgpu::Backend::Metal => Self::Metal,
            wgpu::Backend::Dx12 => Self::DirectX12,
            wgpu::Backend::Vulkan => Self::Vulkan,
            wgpu::Backend::Gl => Self::OpenGL,
            wgpu::Backend::BrowserWebGpu => Self::BrowserWebGpu,
            wgpu::Backend::Empty => Self::Empty,
        }
    }
}

/// Capability probe result
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    pub backend: BackendType,
    pub adapter_name: String,
    pub max_buffer_size: u64,
    pub max_storage_binding_size: u64,
    pub max_compute_workgroups_per_dimension: u32,
    pub supports_compute: bool,
    pub supports_indirect_execution: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wgpu_backends_map_across() {
        assert_eq!(BackendType::from(wgpu::Backend::Vulkan), BackendType::Vulkan);
        assert_eq!(BackendType::from(wgpu::Backend::Gl), BackendType::OpenGL);
    }

    #[test]
    fn shaders_are_embedded() {
        assert!(shaders::SIMULATE.contains("fn simulate"));
        assert!(shaders::CULL.contains("fn cull"));
        assert!(shaders::DRAW.contains("fn vs_main"));
    }
}

use thiserror::Error;

/// Failures while setting up presentation. Per-frame surface errors are
/// returned as [`wgpu::SurfaceError`] instead.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface is not supported by adapter '{0}'")]
    SurfaceUnsupported(String),

    #[error("backend buffers were released before the renderer was built")]
    BackendReleased,
}

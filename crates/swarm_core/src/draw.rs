//! Indirect draw arguments
//!
//! [`DrawIndexedIndirectArgs`] is the 5-word block `draw_indexed_indirect`
//! consumes. Only `instance_count` changes from frame to frame.

use bytemuck::{Pod, Zeroable};

/// Mesh geometry supplied once by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshDescriptor {
    pub index_count: u32,
    pub index_start: u32,
    pub base_vertex: i32,
}

impl MeshDescriptor {
    pub fn new(index_count: u32) -> Self {
        Self {
            index_count,
            index_start: 0,
            base_vertex: 0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

const _: () = assert!(std::mem::size_of::<DrawIndexedIndirectArgs>() == 20);

impl DrawIndexedIndirectArgs {
    /// `first_instance` is always 0.
    pub fn new(index_count: u32, index_start: u32, base_vertex: i32, instance_count: u32) -> Self {
        Self {
            index_count,
            instance_count,
            first_index: index_start,
            base_vertex,
            first_instance: 0,
        }
    }

    /// Draws nothing when either count is zero.
    pub fn is_empty(&self) -> bool {
        self.index_count == 0 || self.instance_count == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Arguments for `instance_count` copies of `mesh`. No mesh means a
/// zero-index draw.
pub fn build_arguments(mesh: Option<&MeshDescriptor>, instance_count: u32) -> DrawIndexedIndirectArgs {
    match mesh {
        Some(mesh) => DrawIndexedIndirectArgs::new(
            mesh.index_count,
            mesh.index_start,
            mesh.base_vertex,
            instance_count,
        ),
        None => DrawIndexedIndirectArgs::new(0, 0, 0, instance_count),
    }
}

/// Which buffer the draw reads instance data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawSource {
    /// The full instance store (culling off).
    Instances,
    /// The compacted visible set (culling on).
    Visible,
}

/// One frame's draw: the argument block and the buffer it indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawSubmission {
    pub args: DrawIndexedIndirectArgs,
    pub source: DrawSource,
}

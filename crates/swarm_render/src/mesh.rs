//! Fly geometry

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use swarm_core::MeshDescriptor;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
}

/// Indexed triangle list. The mesh faces +Z, which the fly transform
/// turns toward the velocity.
#[derive(Debug, Clone)]
pub struct FlyMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl FlyMesh {
    /// Flat-shaded dart: a nose, a tail and two wing tips, slightly raised.
    pub fn dart() -> Self {
        let nose = Vec3::new(0.0, 0.0, 1.0);
        let tail = Vec3::new(0.0, 0.0, -0.6);
        let left = Vec3::new(-0.7, 0.0, -0.2);
        let right = Vec3::new(0.7, 0.0, -0.2);
        let top = Vec3::new(0.0, 0.25, -0.1);
        let bottom = Vec3::new(0.0, -0.15, -0.1);

        let faces = [
            [nose, left, top],
            [nose, top, right],
            [tail, top, left],
            [tail, right, top],
            [nose, bottom, left],
            [nose, right, bottom],
            [tail, left, bottom],
            [tail, bottom, right],
        ];

        let mut vertices = Vec::with_capacity(faces.len() * 3);
        for [a, b, c] in faces {
            let normal = (b - a).cross(c - a).normalize_or_zero().to_array();
            for p in [a, b, c] {
                vertices.push(MeshVertex {
                    position: p.to_array(),
                    normal,
                });
            }
        }
        let indices = (0..vertices.len() as u16).collect();
        Self { vertices, indices }
    }

    pub fn descriptor(&self) -> MeshDescriptor {
        MeshDescriptor::new(self.indices.len() as u32)
    }
}

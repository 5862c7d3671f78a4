//! Indirect instanced draw of the swarm plus the bounds overlay

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use swarm_core::{DrawSource, DrawSubmission};
use tracing::info;
use wgpu::util::DeviceExt;

use crate::backend::GpuFlockBackend;
use crate::context::GpuContext;
use crate::error::RenderError;
use crate::kernels::storage_entry;
use crate::mesh::{FlyMesh, MeshVertex};
use crate::shaders;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const BOUNDS_VERTICES: u32 = 24;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

impl CameraUniform {
    fn new(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_dir: Vec3::new(-0.4, -1.0, -0.3).normalize().extend(0.0).to_array(),
        }
    }
}

/// What to put on screen this frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame {
    pub view_proj: Mat4,
    /// `None` when the pipeline skipped the draw.
    pub draw: Option<DrawSubmission>,
    /// Line list from `swarm_core::gizmo::bounds_wireframe`.
    pub bounds: Option<[Vec3; 24]>,
}

pub struct FlyRenderer {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    fly_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_group: wgpu::BindGroup,
    instances_group: wgpu::BindGroup,
    visible_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    bounds_buffer: wgpu::Buffer,
}

impl FlyRenderer {
    pub fn new(
        context: &GpuContext,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        backend: &GpuFlockBackend,
        mesh: &FlyMesh,
    ) -> Result<Self, RenderError> {
        let device = &context.device;
        let caps = surface.get_capabilities(&context.adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RenderError::SurfaceUnsupported(context.capabilities().adapter_name.clone()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(device, &config);
        let depth_view = create_depth_view(device, config.width, config.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fly Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::DRAW.into()),
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let source_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Fly Source Layout"),
            entries: &[storage_entry(0, wgpu::ShaderStages::VERTEX, true)],
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::new(Mat4::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let instances = backend.instance_buffer().ok_or(RenderError::BackendReleased)?;
        let visible = backend.visible_buffer().ok_or(RenderError::BackendReleased)?;
        let source_group = |label: &str, buffer: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &source_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        };
        let instances_group = source_group("Instance Source", instances);
        let visible_group = source_group("Visible Source", visible);

        let fly_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Fly Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &source_layout],
            push_constant_ranges: &[],
        });
        let fly_pipeline = create_pipeline(
            device,
            "Fly Pipeline",
            &fly_layout,
            &shader,
            ("vs_main", "fs_main"),
            &[MeshVertex::LAYOUT],
            wgpu::PrimitiveTopology::TriangleList,
            format,
        );

        let line_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bounds Pipeline Layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });
        let line_vertex = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        };
        let line_pipeline = create_pipeline(
            device,
            "Bounds Pipeline",
            &line_layout,
            &shader,
            ("vs_lines", "fs_lines"),
            &[line_vertex],
            wgpu::PrimitiveTopology::LineList,
            format,
        );

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fly Vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fly Indices"),
            contents: bytemuck::cast_slice(&padded_indices(&mesh.indices)),
            usage: wgpu::BufferUsages::INDEX,
        });
        let bounds_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bounds Lines"),
            size: u64::from(BOUNDS_VERTICES) * std::mem::size_of::<[f32; 3]>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        info!(?format, width = config.width, height = config.height, "fly renderer ready");
        Ok(Self {
            surface,
            config,
            depth_view,
            fly_pipeline,
            line_pipeline,
            camera_buffer,
            camera_group,
            instances_group,
            visible_group,
            vertex_buffer,
            index_buffer,
            bounds_buffer,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(device, &self.config);
        self.depth_view = create_depth_view(device, width, height);
    }

    /// Reconfigure after `Lost`/`Outdated`.
    pub fn reconfigure(&mut self, device: &wgpu::Device) {
        self.surface.configure(device, &self.config);
    }

    pub fn render(
        &mut self,
        context: &GpuContext,
        backend: &GpuFlockBackend,
        frame: &RenderFrame,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        context
            .queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&CameraUniform::new(frame.view_proj)));
        if let Some(lines) = &frame.bounds {
            let points: Vec<[f32; 3]> = lines.iter().map(|p| p.to_array()).collect();
            context
                .queue
                .write_buffer(&self.bounds_buffer, 0, bytemuck::cast_slice(&points));
        }

        let mut encoder = context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Fly Render Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Fly Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.55,
                            g: 0.62,
                            b: 0.7,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let (Some(draw), Some(args)) = (frame.draw, backend.draw_args_buffer()) {
                let source = match draw.source {
                    DrawSource::Instances => &self.instances_group,
                    DrawSource::Visible => &self.visible_group,
                };
                pass.set_pipeline(&self.fly_pipeline);
                pass.set_bind_group(0, &self.camera_group, &[]);
                pass.set_bind_group(1, source, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed_indirect(args, 0);
            }

            if frame.bounds.is_some() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_bind_group(0, &self.camera_group, &[]);
                pass.set_vertex_buffer(0, self.bounds_buffer.slice(..));
                pass.draw(0..BOUNDS_VERTICES, 0..1);
            }
        }

        context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// `write_buffer` and buffer init need 4-byte multiples.
fn padded_indices(indices: &[u16]) -> Vec<u16> {
    let mut padded = indices.to_vec();
    if padded.len() % 2 == 1 {
        padded.push(0);
    }
    padded
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[allow(clippy::too_many_arguments)]
fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    (vs, fs): (&str, &str),
    buffers: &[wgpu::VertexBufferLayout<'_>],
    topology: wgpu::PrimitiveTopology,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vs),
            buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_uniform_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
    }

    #[test]
    fn odd_index_counts_are_padded() {
        assert_eq!(padded_indices(&[0, 1, 2]).len(), 4);
        assert_eq!(padded_indices(&[0, 1, 2, 3]).len(), 4);
    }
}

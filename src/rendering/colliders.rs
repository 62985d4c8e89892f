//! Collider ellipsoids drawn as instanced unit spheres. The collider storage
//! buffer doubles as the instance buffer past its 16-byte header.

use wgpu::util::DeviceExt;

use crate::assets::{procedural, MeshVertex};
use crate::context::{GpuError, GraphicsContext};
use crate::simulation::{ColliderPool, GlobalUniforms, GpuCollider, COLLIDER_HEADER_SIZE};

use super::{alpha_blend, depth_state};

const SPHERE_STACKS: u32 = 16;
const SPHERE_SLICES: u32 = 24;

pub struct ColliderRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl ColliderRenderer {
    pub fn new(ctx: &GraphicsContext, globals: &GlobalUniforms) -> Result<Self, GpuError> {
        ctx.checked("collider renderer", |ctx| {
            let device = &ctx.device;
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Colliders Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/colliders.wgsl").into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Colliders Pipeline Layout"),
                bind_group_layouts: &[globals.layout()],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Colliders Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[MeshVertex::desc(), GpuCollider::instance_desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(depth_state(ctx.depth_format, false)),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            let sphere = procedural::uv_sphere(SPHERE_STACKS, SPHERE_SLICES);
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Collider Sphere Vertices"),
                contents: bytemuck::cast_slice(&sphere.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Collider Sphere Indices"),
                contents: bytemuck::cast_slice(&sphere.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            Self {
                pipeline,
                vertex_buffer,
                index_buffer,
                index_count: sphere.indices.len() as u32,
            }
        })
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, globals: &wgpu::BindGroup, pool: &ColliderPool) {
        let Some(buffer) = pool.buffer() else {
            return;
        };
        if pool.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, globals, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, buffer.slice(COLLIDER_HEADER_SIZE..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..pool.len() as u32);
    }
}

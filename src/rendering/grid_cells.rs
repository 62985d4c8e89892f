//! Grid cells as instanced translucent cubes, read from the grid's storage
//! buffer.

use wgpu::util::DeviceExt;

use crate::assets::{procedural, MeshVertex};
use crate::context::{GpuError, GraphicsContext};
use crate::simulation::{GlobalUniforms, GridCell, GridStruct};

use super::{alpha_blend, depth_state};

pub struct GridCellRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GridCellRenderer {
    pub fn new(ctx: &GraphicsContext, globals: &GlobalUniforms) -> Result<Self, GpuError> {
        ctx.checked("grid cell renderer", |ctx| {
            let device = &ctx.device;
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Grid Cells Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/grid_cells.wgsl").into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Grid Cells Pipeline Layout"),
                bind_group_layouts: &[globals.layout()],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Grid Cells Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[MeshVertex::position_only_desc(), GridCell::instance_desc()],
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
                // Translucent: test against opaque geometry but do not occlude.
                depth_stencil: Some(depth_state(ctx.depth_format, false)),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            let cube = procedural::unit_cube();
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grid Cube Vertices"),
                contents: bytemuck::cast_slice(&cube.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grid Cube Indices"),
                contents: bytemuck::cast_slice(&cube.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            Self {
                pipeline,
                vertex_buffer,
                index_buffer,
                index_count: cube.indices.len() as u32,
            }
        })
    }

    /// Draw every cell of `grid`. Does nothing before the grid is uploaded.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, globals: &wgpu::BindGroup, grid: &GridStruct) {
        let Some(cells) = grid.buffer() else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, globals, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, cells.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..grid.cell_count() as u32);
    }
}

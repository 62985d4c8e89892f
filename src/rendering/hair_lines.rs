//! Hair drawn as line strips.
//!
//! The simulated position and velocity buffers are bound directly as vertex
//! buffers, so the draw reads whatever the compute step last wrote. A
//! static index buffer walks each strand and separates strands with the
//! primitive restart index.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::context::{GpuError, GraphicsContext};
use crate::hair::{Hair, StrandLayout};
use crate::simulation::GlobalUniforms;

use super::{depth_state, uniform_layout_entry};

/// Restart index for `Uint32` strip topologies.
pub const PRIMITIVE_RESTART: u32 = u32::MAX;

const PARTICLE_STRIDE: wgpu::BufferAddress = std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct HairDrawUniform {
    strand_length: u32,
    debug_view: u32,
    _pad: [u32; 2],
}

/// Indices for every strand in order, each followed by a restart.
pub fn strand_line_indices(layout: &StrandLayout) -> Vec<u32> {
    let per_strand = layout.strand_length as usize + 1;
    let mut indices = Vec::with_capacity(layout.num_strands as usize * per_strand);
    for strand in 0..layout.num_strands {
        let base = strand * layout.strand_length;
        indices.extend(base..base + layout.strand_length);
        indices.push(PRIMITIVE_RESTART);
    }
    indices
}

pub struct HairLineRenderer {
    pipeline: wgpu::RenderPipeline,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    layout: StrandLayout,
    debug_view: bool,
}

impl HairLineRenderer {
    pub fn new(ctx: &GraphicsContext, globals: &GlobalUniforms, layout: StrandLayout) -> Result<Self, GpuError> {
        ctx.checked("hair line renderer", |ctx| {
            let device = &ctx.device;
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Hair Lines Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/hair_lines.wgsl").into()),
            });

            let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Hair Draw Layout"),
                entries: &[uniform_layout_entry(0, wgpu::ShaderStages::VERTEX)],
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Hair Lines Pipeline Layout"),
                bind_group_layouts: &[globals.layout(), &draw_layout],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Hair Lines Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: PARTICLE_STRIDE,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![0 => Float32x4],
                        },
                        wgpu::VertexBufferLayout {
                            array_stride: PARTICLE_STRIDE,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![1 => Float32x4],
                        },
                    ],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::LineStrip,
                    strip_index_format: Some(wgpu::IndexFormat::Uint32),
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(depth_state(ctx.depth_format, true)),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            let indices = strand_line_indices(&layout);
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Hair Line Indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            let uniform = HairDrawUniform {
                strand_length: layout.strand_length,
                debug_view: 0,
                _pad: [0; 2],
            };
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Hair Draw Uniform"),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Hair Draw"),
                layout: &draw_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

            Self {
                pipeline,
                index_buffer,
                index_count: indices.len() as u32,
                uniform_buffer,
                bind_group,
                layout,
                debug_view: false,
            }
        })
    }

    /// Switch between root-to-tip shading and the speed heat map.
    pub fn set_debug_view(&mut self, queue: &wgpu::Queue, enabled: bool) {
        if enabled == self.debug_view {
            return;
        }
        self.debug_view = enabled;
        let uniform = HairDrawUniform {
            strand_length: self.layout.strand_length,
            debug_view: enabled as u32,
            _pad: [0; 2],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, globals: &wgpu::BindGroup, hair: &Hair) {
        let buffers = hair.buffers();
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, globals, &[]);
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, buffers.position.slice(..));
        pass.set_vertex_buffer(1, buffers.velocity.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strands_are_separated_by_restart() {
        let indices = strand_line_indices(&StrandLayout::new(2, 3, 1.0));
        assert_eq!(indices, vec![0, 1, 2, PRIMITIVE_RESTART, 3, 4, 5, PRIMITIVE_RESTART]);
    }

    #[test]
    fn test_index_count_for_demo_hair() {
        let layout = StrandLayout::new(5120, 20, 2.0);
        let indices = strand_line_indices(&layout);
        assert_eq!(indices.len(), 5120 * 21);
        assert_eq!(indices.iter().filter(|&&i| i == PRIMITIVE_RESTART).count(), 5120);
        assert_eq!(indices[indices.len() - 2], 5120 * 20 - 1);
    }
}

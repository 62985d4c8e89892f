//! Compute pipelines for the strand method.
//!
//! Both kernels share one pipeline layout of six bind groups, bound in this
//! fixed order for every pass.
//!
//! ### Group 0: Globals
//! | Binding | Type | Buffer |
//! |---------|------|--------|
//! | 0 | Uniform | camera |
//! | 1 | Uniform | time |
//!
//! ### Group 1: Method
//! | Binding | Type | Buffer |
//! |---------|------|--------|
//! | 0 | Uniform | hair model matrix |
//!
//! ### Group 2: Hair storage
//! | Binding | Type | Buffer |
//! |---------|------|--------|
//! | 0 | Storage (read) | rest positions |
//! | 1 | Storage (read_write) | positions |
//! | 2 | Storage (read_write) | previous positions |
//! | 3 | Storage (read_write) | velocities |
//!
//! ### Group 3: Grid
//! | Binding | Type | Buffer |
//! |---------|------|--------|
//! | 0 | Storage (read_write) | cells |
//!
//! ### Group 4: Hair params
//! | Binding | Type | Buffer |
//! |---------|------|--------|
//! | 0 | Uniform | [`HairParamsUniform`](crate::hair::HairParamsUniform) |
//!
//! ### Group 5: Colliders
//! | Binding | Type | Buffer |
//! |---------|------|--------|
//! | 0 | Storage (read) | collider header and records |

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::context::{GpuError, GraphicsContext};
use crate::hair::HairBuffers;

use super::globals::GlobalUniforms;

const INTEGRATE_SHADER: &str = include_str!("../../shaders/integrate.wgsl");
const CONSTRAIN_SHADER: &str = include_str!("../../shaders/constrain.wgsl");

/// Method-local uniform (group 1).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MethodUniform {
    pub model: [[f32; 4]; 4],
}

impl MethodUniform {
    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
        }
    }
}

/// Bind group layouts for groups 1 to 5. Group 0 belongs to [`GlobalUniforms`].
pub struct StrandLayouts {
    pub method: wgpu::BindGroupLayout,
    pub hair_storage: wgpu::BindGroupLayout,
    pub grid: wgpu::BindGroupLayout,
    pub hair_params: wgpu::BindGroupLayout,
    pub colliders: wgpu::BindGroupLayout,
}

/// One bind group per slot, in binding order after the globals.
pub struct StrandBindGroups {
    pub method: wgpu::BindGroup,
    pub hair_storage: wgpu::BindGroup,
    pub grid: wgpu::BindGroup,
    pub hair_params: wgpu::BindGroup,
    pub colliders: wgpu::BindGroup,
}

impl StrandBindGroups {
    /// Bind all six groups on `pass`.
    pub fn bind(&self, pass: &mut wgpu::ComputePass<'_>, globals: &wgpu::BindGroup) {
        pass.set_bind_group(0, globals, &[]);
        pass.set_bind_group(1, &self.method, &[]);
        pass.set_bind_group(2, &self.hair_storage, &[]);
        pass.set_bind_group(3, &self.grid, &[]);
        pass.set_bind_group(4, &self.hair_params, &[]);
        pass.set_bind_group(5, &self.colliders, &[]);
    }
}

pub struct HairComputePipelines {
    pub integrate: wgpu::ComputePipeline,
    pub constrain: wgpu::ComputePipeline,
    pub layouts: StrandLayouts,
}

impl HairComputePipelines {
    pub fn new(ctx: &GraphicsContext, globals: &GlobalUniforms) -> Result<Self, GpuError> {
        ctx.checked("strand pipeline creation", |ctx| {
            let device = &ctx.device;
            let layouts = StrandLayouts {
                method: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Strand Method Layout"),
                    entries: &[uniform_entry(0)],
                }),
                hair_storage: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Hair Storage Layout"),
                    entries: &[
                        storage_entry(0, true),
                        storage_entry(1, false),
                        storage_entry(2, false),
                        storage_entry(3, false),
                    ],
                }),
                grid: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Grid Storage Layout"),
                    entries: &[storage_entry(0, false)],
                }),
                hair_params: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Hair Params Layout"),
                    entries: &[uniform_entry(0)],
                }),
                colliders: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Collider Storage Layout"),
                    entries: &[storage_entry(0, true)],
                }),
            };

            let bind_group_layouts = [
                globals.layout(),
                &layouts.method,
                &layouts.hair_storage,
                &layouts.grid,
                &layouts.hair_params,
                &layouts.colliders,
            ];

            let integrate =
                Self::create_compute_pipeline(device, INTEGRATE_SHADER, "main", &bind_group_layouts, "Hair Integrate");
            let constrain =
                Self::create_compute_pipeline(device, CONSTRAIN_SHADER, "main", &bind_group_layouts, "Hair Constrain");

            Self {
                integrate,
                constrain,
                layouts,
            }
        })
    }

    fn create_compute_pipeline(
        device: &wgpu::Device,
        shader_source: &str,
        entry_point: &str,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        label: &str,
    ) -> wgpu::ComputePipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Shader", label)),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", label)),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(&format!("{} Pipeline", label)),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some(entry_point),
            compilation_options: Default::default(),
            cache: None,
        })
    }

    /// Build the bind groups for one hair, grid and collider pool.
    pub fn create_bind_groups(
        &self,
        device: &wgpu::Device,
        method_uniform: &wgpu::Buffer,
        hair: &HairBuffers,
        grid_cells: &wgpu::Buffer,
        colliders: &wgpu::Buffer,
    ) -> StrandBindGroups {
        let single = |label: &str, layout: &wgpu::BindGroupLayout, buffer: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        };

        let hair_storage = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Hair Storage"),
            layout: &self.layouts.hair_storage,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: hair.rest.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: hair.position.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: hair.previous.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: hair.velocity.as_entire_binding(),
                },
            ],
        });

        StrandBindGroups {
            method: single("Strand Method", &self.layouts.method, method_uniform),
            hair_storage,
            grid: single("Grid Storage", &self.layouts.grid, grid_cells),
            hair_params: single("Hair Params", &self.layouts.hair_params, &hair.params),
            colliders: single("Collider Storage", &self.layouts.colliders, colliders),
        }
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_uniform_is_one_matrix() {
        assert_eq!(std::mem::size_of::<MethodUniform>(), 64);
        let uniform = MethodUniform::new(Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_kernels_share_workgroup_size() {
        let size = format!("@workgroup_size({})", super::super::dispatch::STRAND_WORKGROUP_SIZE);
        assert!(INTEGRATE_SHADER.contains(&size));
        assert!(CONSTRAIN_SHADER.contains(&size));
    }
}

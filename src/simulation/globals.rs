//! Global uniform set (group 0), shared by compute and render pipelines.
//!
//! | Binding | Type | Buffer |
//! |---------|------|--------|
//! | 0 | Uniform | [`CameraUniform`] |
//! | 1 | Uniform | [`TimeUniform`] |
//!
//! Both are written once per frame before any submission that reads them.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::context::GraphicsContext;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
}

impl CameraUniform {
    pub fn new(view: Mat4, projection: Mat4, camera_position: Vec3) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TimeUniform {
    pub delta_time: f32,
    pub total_time: f32,
    pub _pad: [f32; 2],
}

/// Accumulates simulated time.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameClock {
    total_time: f32,
}

impl FrameClock {
    /// Advance by `delta_time` and return the uniform for this frame.
    pub fn tick(&mut self, delta_time: f32) -> TimeUniform {
        let delta_time = if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 };
        self.total_time += delta_time;
        TimeUniform {
            delta_time,
            total_time: self.total_time,
            _pad: [0.0; 2],
        }
    }

    pub fn total_time(&self) -> f32 {
        self.total_time
    }
}

pub struct GlobalUniforms {
    camera_buffer: wgpu::Buffer,
    time_buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    clock: FrameClock,
}

impl GlobalUniforms {
    pub fn new(ctx: &GraphicsContext) -> Self {
        let device = &ctx.device;
        let visibility = wgpu::ShaderStages::COMPUTE | wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Global Uniforms Layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let time_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Time Uniform"),
            size: std::mem::size_of::<TimeUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Uniforms"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: time_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            camera_buffer,
            time_buffer,
            layout,
            bind_group,
            clock: FrameClock::default(),
        }
    }

    pub fn write_camera(&self, queue: &wgpu::Queue, camera: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
    }

    /// Advance the clock and upload this frame's time.
    pub fn write_time(&mut self, queue: &wgpu::Queue, delta_time: f32) -> TimeUniform {
        let time = self.clock.tick(delta_time);
        queue.write_buffer(&self.time_buffer, 0, bytemuck::bytes_of(&time));
        time
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn total_time(&self) -> f32 {
        self.clock.total_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 144);
        assert_eq!(std::mem::size_of::<TimeUniform>(), 16);
    }

    #[test]
    fn test_clock_accumulates_and_ignores_bad_deltas() {
        let mut clock = FrameClock::default();
        clock.tick(0.5);
        let t = clock.tick(0.25);
        assert_eq!(t.delta_time, 0.25);
        assert_eq!(t.total_time, 0.75);

        let t = clock.tick(f32::NAN);
        assert_eq!(t.delta_time, 0.0);
        let t = clock.tick(-1.0);
        assert_eq!(t.total_time, 0.75);
    }
}

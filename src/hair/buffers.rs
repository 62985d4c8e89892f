//! GPU side of the strand buffer store.
//!
//! ## Buffers
//! | Buffer | Usage | Contents |
//! |--------|-------|----------|
//! | rest | STORAGE, COPY_SRC, COPY_DST | rest positions, `w` = inverse mass |
//! | position | STORAGE, VERTEX, COPY_SRC, COPY_DST | current positions, drawn as hair lines |
//! | previous | STORAGE, COPY_SRC, COPY_DST | positions from the last step |
//! | velocity | STORAGE, VERTEX, COPY_SRC, COPY_DST | per-particle velocity |
//! | params | UNIFORM, COPY_DST | [`HairParamsUniform`] |
//!
//! Uploads go through a staging buffer and block until the copy lands. They
//! only happen at load time and on user-triggered reset or restyle.

use wgpu::util::DeviceExt;

use crate::context::{GpuError, GraphicsContext};

use super::params::{HairParameters, HairParamsUniform};
use super::strand::{StrandArrays, StrandLayout};

const PARTICLE_STRIDE: wgpu::BufferAddress = std::mem::size_of::<glam::Vec4>() as wgpu::BufferAddress;

pub struct HairBuffers {
    pub rest: wgpu::Buffer,
    pub position: wgpu::Buffer,
    pub previous: wgpu::Buffer,
    pub velocity: wgpu::Buffer,
    pub params: wgpu::Buffer,
    layout: StrandLayout,
}

impl HairBuffers {
    /// Allocate all buffers and upload `arrays` as the starting state.
    pub fn construct(
        ctx: &GraphicsContext,
        arrays: &StrandArrays,
        parameters: &HairParameters,
    ) -> Result<Self, GpuError> {
        let layout = *arrays.layout();
        let size = layout.particle_count() as wgpu::BufferAddress * PARTICLE_STRIDE;

        let buffers = ctx.checked("hair buffer allocation", |ctx| {
            let storage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST;
            let create = |label: &str, usage: wgpu::BufferUsages| {
                ctx.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size,
                    usage,
                    mapped_at_creation: false,
                })
            };

            let params = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Hair Params"),
                contents: bytemuck::bytes_of(&HairParamsUniform::new(parameters, &layout)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

            Self {
                rest: create("Hair Rest Positions", storage),
                position: create("Hair Positions", storage | wgpu::BufferUsages::VERTEX),
                previous: create("Hair Previous Positions", storage),
                velocity: create("Hair Velocities", storage | wgpu::BufferUsages::VERTEX),
                params,
                layout,
            }
        })?;

        buffers.upload(ctx, arrays)?;
        log::info!(
            "Hair buffers ready: {} strands x {} particles ({} KiB per array)",
            layout.num_strands,
            layout.strand_length,
            size / 1024
        );
        Ok(buffers)
    }

    pub fn layout(&self) -> &StrandLayout {
        &self.layout
    }

    /// Size in bytes of one particle array.
    pub fn array_size(&self) -> wgpu::BufferAddress {
        self.layout.particle_count() as wgpu::BufferAddress * PARTICLE_STRIDE
    }

    /// Replace all four arrays with `arrays` via staging copies.
    ///
    /// Used for the initial upload and when strand geometry is regenerated.
    pub fn upload(&self, ctx: &GraphicsContext, arrays: &StrandArrays) -> Result<(), GpuError> {
        debug_assert_eq!(arrays.layout(), &self.layout);

        ctx.checked("hair upload", |ctx| {
            let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Hair Upload Encoder"),
            });

            // Staging buffers must outlive the submission.
            let staged: Vec<(wgpu::Buffer, &wgpu::Buffer)> = [
                (arrays.rest(), &self.rest),
                (arrays.current(), &self.position),
                (arrays.previous(), &self.previous),
                (arrays.velocity(), &self.velocity),
            ]
            .into_iter()
            .map(|(data, dst)| {
                let staging = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Hair Staging"),
                    contents: bytemuck::cast_slice(data),
                    usage: wgpu::BufferUsages::COPY_SRC,
                });
                (staging, dst)
            })
            .collect();

            for (staging, dst) in &staged {
                encoder.copy_buffer_to_buffer(staging, 0, dst, 0, self.array_size());
            }
            ctx.submit_and_wait(encoder);
        })
    }

    /// Copy rest positions into the current and previous arrays and zero the
    /// velocities, discarding simulated state.
    ///
    /// The copy happens on the GPU from the rest buffer, so the result is
    /// bit-identical to the rest state.
    pub fn reset(&self, ctx: &GraphicsContext) -> Result<(), GpuError> {
        ctx.checked("hair reset", |ctx| {
            let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Hair Reset Encoder"),
            });
            let size = self.array_size();
            encoder.copy_buffer_to_buffer(&self.rest, 0, &self.position, 0, size);
            encoder.copy_buffer_to_buffer(&self.rest, 0, &self.previous, 0, size);
            encoder.clear_buffer(&self.velocity, 0, None);
            ctx.submit_and_wait(encoder);
        })
    }

    /// Write new simulation parameters. Visible to the next dispatch.
    pub fn update_parameters(&self, queue: &wgpu::Queue, parameters: &HairParameters) {
        let uniform = HairParamsUniform::new(parameters, &self.layout);
        queue.write_buffer(&self.params, 0, bytemuck::bytes_of(&uniform));
    }
}

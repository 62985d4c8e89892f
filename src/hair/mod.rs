//! Hair: strands of point masses grown from a source surface.
//!
//! CPU-side generation ([`strand`], [`sampling`]) is pure and deterministic.
//! [`Hair`] pairs the generated rest state with its GPU buffers
//! ([`buffers::HairBuffers`]) and the parameters the compute kernels read.

pub mod buffers;
pub mod params;
pub mod sampling;
pub mod strand;

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::assets::MeshData;
use crate::context::{GpuError, GraphicsContext};

pub use buffers::HairBuffers;
pub use params::{HairParameter, HairParameters, HairParamsUniform};
pub use sampling::{sample_surface, seeded_rng, SurfaceSample, DEFAULT_SAMPLING_SEED};
pub use strand::{HairStyle, Particle, StrandArrays, StrandLayout};

#[derive(Debug, Error)]
pub enum HairError {
    #[error("source surface has no triangles")]
    EmptySurface,

    #[error("hair needs at least one strand")]
    NoStrands,

    #[error("strands need at least 2 particles, got {0}")]
    StrandTooShort(u32),

    #[error("hair length must be positive, got {0}")]
    InvalidLength(f32),

    #[error("expected {expected} strand roots, got {found}")]
    RootCountMismatch { expected: u32, found: usize },

    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Sample roots on `surface` and build the rest state for every strand.
pub fn generate_rest_state(
    surface: &MeshData,
    layout: StrandLayout,
    style: HairStyle,
    seed: u64,
) -> Result<(Vec<SurfaceSample>, StrandArrays), HairError> {
    layout.validate()?;
    let roots = sample_surface(surface, layout.num_strands as usize, &mut seeded_rng(seed))?;
    let arrays = StrandArrays::generate(&roots, layout, style)?;
    Ok((roots, arrays))
}

/// One hair instance: rest state, GPU arrays and simulation parameters.
pub struct Hair {
    pub name: String,
    pub model_matrix: Mat4,
    style: HairStyle,
    parameters: HairParameters,
    roots: Vec<SurfaceSample>,
    arrays: StrandArrays,
    buffers: HairBuffers,
}

impl Hair {
    /// Grow `layout.num_strands` strands on `surface` and upload them.
    ///
    /// Fails if the surface has no triangles or the layout is empty.
    pub fn construct(
        ctx: &GraphicsContext,
        name: impl Into<String>,
        surface: &MeshData,
        layout: StrandLayout,
        style: HairStyle,
        parameters: HairParameters,
        seed: u64,
    ) -> Result<Self, HairError> {
        let name = name.into();
        let parameters = parameters.clamped();
        let (roots, arrays) = generate_rest_state(surface, layout, style, seed)?;
        let buffers = HairBuffers::construct(ctx, &arrays, &parameters)?;

        log::info!(
            "Hair '{}' grown: {} strands, {} particles each, segment {:.4}",
            name,
            layout.num_strands,
            layout.strand_length,
            layout.segment_length()
        );

        Ok(Self {
            name,
            model_matrix: Mat4::IDENTITY,
            style,
            parameters,
            roots,
            arrays,
            buffers,
        })
    }

    /// Discard simulated state and return to rest.
    pub fn reset(&mut self, ctx: &GraphicsContext) -> Result<(), HairError> {
        self.buffers.reset(ctx)?;
        self.arrays.reset();
        log::info!("Hair '{}' reset to rest state", self.name);
        Ok(())
    }

    /// Regenerate the strands from the same roots in a new style and reset.
    pub fn set_style(&mut self, ctx: &GraphicsContext, style: HairStyle) -> Result<(), HairError> {
        let arrays = StrandArrays::generate(&self.roots, *self.arrays.layout(), style)?;
        self.buffers.upload(ctx, &arrays)?;
        self.arrays = arrays;
        self.style = style;
        log::info!("Hair '{}' restyled: {}", self.name, style);
        Ok(())
    }

    /// Store and upload new simulation parameters, clamped to range.
    pub fn update_parameters(&mut self, queue: &wgpu::Queue, parameters: HairParameters) {
        self.parameters = parameters.clamped();
        self.buffers.update_parameters(queue, &self.parameters);
    }

    pub fn parameters(&self) -> &HairParameters {
        &self.parameters
    }

    pub fn style(&self) -> HairStyle {
        self.style
    }

    pub fn layout(&self) -> &StrandLayout {
        self.arrays.layout()
    }

    pub fn num_strands(&self) -> u32 {
        self.layout().num_strands
    }

    pub fn strand_length(&self) -> u32 {
        self.layout().strand_length
    }

    /// Rest state as last uploaded.
    pub fn rest_state(&self) -> &StrandArrays {
        &self.arrays
    }

    pub fn buffers(&self) -> &HairBuffers {
        &self.buffers
    }

    /// Centre of the root positions, used to aim the camera.
    pub fn root_centroid(&self) -> Vec3 {
        let (sum, count) = self
            .arrays
            .root_positions()
            .fold((Vec3::ZERO, 0u32), |(sum, n), p| (sum + p, n + 1));
        if count == 0 {
            Vec3::ZERO
        } else {
            sum / count as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::procedural;

    #[test]
    fn test_generate_rest_state_rejects_empty_surface() {
        let layout = StrandLayout::new(16, 8, 1.0);
        let err = generate_rest_state(&MeshData::default(), layout, HairStyle::Straight, 8).unwrap_err();
        assert!(matches!(err, HairError::EmptySurface));
    }

    #[test]
    fn test_roots_are_sampled_points() {
        let surface = procedural::uv_sphere(6, 12);
        let layout = StrandLayout::new(64, 10, 2.0);
        let (roots, arrays) = generate_rest_state(&surface, layout, HairStyle::Straight, 8).unwrap();
        for (root, rest) in roots.iter().zip(arrays.root_positions()) {
            assert_eq!(root.position, rest, "root must sit exactly on the sampled point");
        }
    }

    #[test]
    fn test_generation_is_reproducible() {
        let surface = procedural::scalp(Mat4::IDENTITY);
        let layout = StrandLayout::new(128, 20, 2.0);
        let (_, a) = generate_rest_state(&surface, layout, HairStyle::Curly, DEFAULT_SAMPLING_SEED).unwrap();
        let (_, b) = generate_rest_state(&surface, layout, HairStyle::Curly, DEFAULT_SAMPLING_SEED).unwrap();
        assert_eq!(a, b);
    }
}

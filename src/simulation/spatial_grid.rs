//! Uniform spatial grid over a bounding volume.
//!
//! Cells are laid out z-major (x fastest). A seeded fifth of the cells is
//! flagged active (`position.w == 1.0`) at construction for the debug view.
//! The buffer is bound read-write to the hair kernels as auxiliary state but
//! the shipped kernels do not write it.

use bytemuck::{Pod, Zeroable};
use glam::{IVec3, UVec3, Vec3};
use rand::seq::index;
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::context::{GpuError, GraphicsContext};
use crate::hair::seeded_rng;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid resolution must be non-zero on every axis, got {0}")]
    EmptyResolution(UVec3),

    #[error("grid dimensions must be positive, got {0}")]
    InvalidDimensions(Vec3),

    #[error("grid resolution {0} has too many cells")]
    TooManyCells(UVec3),
}

/// One cell, 32 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GridCell {
    /// Min corner in world space; `w` is 1.0 for active cells.
    pub position: [f32; 4],
    /// Cell extent; `w` unused.
    pub scale: [f32; 4],
}

impl GridCell {
    const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![3 => Float32x4, 4 => Float32x4];

    pub fn is_active(&self) -> bool {
        self.position[3] == 1.0
    }

    /// Per-instance layout for drawing cells as cubes.
    pub fn instance_desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GridCell>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::INSTANCE_ATTRIBUTES,
        }
    }
}

pub struct GridStruct {
    pub name: String,
    /// Centre of the covered volume.
    pub position: Vec3,
    /// Size of the covered volume.
    pub dimensions: Vec3,
    pub resolution: UVec3,
    cells: Vec<GridCell>,
    buffer: Option<wgpu::Buffer>,
}

impl GridStruct {
    pub fn new(
        name: impl Into<String>,
        position: Vec3,
        dimensions: Vec3,
        resolution: UVec3,
        seed: u64,
    ) -> Result<Self, GridError> {
        if resolution.min_element() == 0 {
            return Err(GridError::EmptyResolution(resolution));
        }
        if !(dimensions.min_element() > 0.0 && dimensions.is_finite()) {
            return Err(GridError::InvalidDimensions(dimensions));
        }

        let step = Vec3::ONE / resolution.as_vec3();
        let extent = step * dimensions;
        let total = resolution
            .x
            .checked_mul(resolution.y)
            .and_then(|xy| xy.checked_mul(resolution.z))
            .ok_or(GridError::TooManyCells(resolution))? as usize;

        let mut cells = Vec::with_capacity(total);
        for z in 0..resolution.z {
            for y in 0..resolution.y {
                for x in 0..resolution.x {
                    let corner = (Vec3::splat(-0.5) + UVec3::new(x, y, z).as_vec3() * step) * dimensions + position;
                    cells.push(GridCell {
                        position: corner.extend(0.0).to_array(),
                        scale: extent.extend(1.0).to_array(),
                    });
                }
            }
        }

        // Distinct picks, so exactly total/5 cells end up active.
        let active = total / 5;
        let mut rng = seeded_rng(seed);
        for i in index::sample(&mut rng, total, active).into_iter() {
            cells[i].position[3] = 1.0;
        }

        Ok(Self {
            name: name.into(),
            position,
            dimensions,
            resolution,
            cells,
            buffer: None,
        })
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Flat index of the cell at grid coordinate `(x, y, z)`.
    pub fn cell_index(&self, coord: UVec3) -> usize {
        ((coord.z * self.resolution.y + coord.y) * self.resolution.x + coord.x) as usize
    }

    /// Grid coordinate containing `point`, or `None` outside the volume.
    pub fn world_to_grid(&self, point: Vec3) -> Option<UVec3> {
        let normalized = (point - self.position) / self.dimensions + Vec3::splat(0.5);
        let coord = (normalized * self.resolution.as_vec3()).floor().as_ivec3();
        let inside = coord.cmpge(IVec3::ZERO).all() && coord.cmplt(self.resolution.as_ivec3()).all();
        inside.then(|| coord.as_uvec3())
    }

    pub fn active_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_active())
            .map(|(i, _)| i)
            .collect()
    }

    /// Create the storage buffer (also bound as an instance buffer for drawing).
    pub fn upload(&mut self, ctx: &GraphicsContext) -> Result<(), GpuError> {
        let buffer = ctx.checked("grid upload", |ctx| {
            ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grid Cells"),
                contents: bytemuck::cast_slice(&self.cells),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX,
            })
        })?;
        self.buffer = Some(buffer);
        log::info!(
            "Grid '{}' uploaded: {}x{}x{} cells, {} active",
            self.name,
            self.resolution.x,
            self.resolution.y,
            self.resolution.z,
            self.active_indices().len()
        );
        Ok(())
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hair::DEFAULT_SAMPLING_SEED;

    fn small_grid(seed: u64) -> GridStruct {
        GridStruct::new("test", Vec3::ZERO, Vec3::splat(2.0), UVec3::splat(2), seed).unwrap()
    }

    #[test]
    fn test_cell_size() {
        assert_eq!(std::mem::size_of::<GridCell>(), 32);
    }

    #[test]
    fn test_two_cubed_grid_flags_exactly_one_cell() {
        let grid = small_grid(DEFAULT_SAMPLING_SEED);
        assert_eq!(grid.cell_count(), 8);
        assert_eq!(grid.active_indices().len(), 1);
    }

    #[test]
    fn test_flagged_cell_is_reproducible() {
        let a = small_grid(DEFAULT_SAMPLING_SEED).active_indices();
        let b = small_grid(DEFAULT_SAMPLING_SEED).active_indices();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cell_layout_is_z_major() {
        let grid = GridStruct::new("layout", Vec3::new(0.0, 2.0, 0.0), Vec3::splat(8.0), UVec3::new(4, 3, 2), 8).unwrap();
        let step = 8.0 / 4.0;
        let c = grid.cells()[grid.cell_index(UVec3::new(1, 0, 0))];
        assert_eq!(&c.position[..3], &[-4.0 + step, -2.0, -4.0]);
        let last = grid.cells()[grid.cell_count() - 1];
        assert_eq!(grid.cell_index(UVec3::new(3, 2, 1)), grid.cell_count() - 1);
        assert_eq!(last.position[2], -4.0 + 4.0);
        assert_eq!(c.scale[0], 2.0);
        assert!((c.scale[1] - 8.0 / 3.0).abs() < 1e-6);
        assert_eq!(c.scale[2], 4.0);
    }

    #[test]
    fn test_demo_grid_active_fraction() {
        let grid = GridStruct::new("demo", Vec3::new(0.0, 2.0, 0.0), Vec3::splat(8.0), UVec3::splat(50), 8).unwrap();
        assert_eq!(grid.active_indices().len(), 125_000 / 5);
    }

    #[test]
    fn test_world_to_grid_round_trips_cell_corners() {
        let grid = GridStruct::new("lookup", Vec3::ZERO, Vec3::splat(4.0), UVec3::splat(4), 8).unwrap();
        let coord = UVec3::new(2, 1, 3);
        let cell = grid.cells()[grid.cell_index(coord)];
        let centre = Vec3::new(cell.position[0], cell.position[1], cell.position[2]) + Vec3::splat(0.5);
        assert_eq!(grid.world_to_grid(centre), Some(coord));
        assert_eq!(grid.world_to_grid(Vec3::splat(10.0)), None);
    }

    #[test]
    fn test_rejects_zero_resolution() {
        let err = GridStruct::new("bad", Vec3::ZERO, Vec3::ONE, UVec3::new(2, 0, 2), 8);
        assert!(matches!(err, Err(GridError::EmptyResolution(_))));
    }

    #[test]
    fn test_rejects_overflowing_resolution() {
        let err = GridStruct::new("huge", Vec3::ZERO, Vec3::ONE, UVec3::new(65_536, 65_536, 2), 8);
        assert!(matches!(err, Err(GridError::TooManyCells(_))));
    }
}

//! Surface sampling for hair roots.
//!
//! Triangles are picked uniformly, not by area, so small triangles get as
//! many roots as large ones. The generator is passed in explicitly; the same
//! seed always yields the same roots.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::assets::MeshData;

use super::HairError;

/// Seed used for every deterministic sampling pass in the demo.
pub const DEFAULT_SAMPLING_SEED: u64 = 8;

/// A growth point on the source surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Fresh generator for a sampling pass.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Draw `count` barycentric samples from `surface`.
///
/// The normal is the first corner's vertex normal, falling back to the face
/// normal when that is zero.
pub fn sample_surface<R: Rng + ?Sized>(
    surface: &MeshData,
    count: usize,
    rng: &mut R,
) -> Result<Vec<SurfaceSample>, HairError> {
    let triangles = surface.triangle_count();
    if triangles == 0 {
        return Err(HairError::EmptySurface);
    }

    let mut samples = Vec::with_capacity(count);
    for _ in 0..count {
        let triangle = rng.gen_range(0..triangles);
        let mut u: f32 = rng.gen();
        let mut v: f32 = rng.gen();
        // Fold the square onto the triangle.
        if u + v >= 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }

        let [a, b, c] = surface.triangle(triangle);
        let (pa, pb, pc) = (a.position(), b.position(), c.position());
        let position = pa * u + pb * v + pc * (1.0 - u - v);

        let mut normal = a.normal().normalize_or_zero();
        if normal == Vec3::ZERO {
            normal = (pb - pa).cross(pc - pa).normalize_or_zero();
        }

        samples.push(SurfaceSample { position, normal });
    }
    Ok(samples)
}

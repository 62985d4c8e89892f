//! Strand geometry and the CPU mirror of the four particle arrays.

use std::fmt;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::sampling::SurfaceSample;
use super::HairError;

/// Bias added to the surface normal before normalizing, so strands grow up
/// and back instead of straight out of the scalp.
pub const GROWTH_BIAS: Vec3 = Vec3::new(0.05, 5.0, -2.0);

/// Radius of the helix used for curly strands.
pub const CURL_RADIUS: f32 = 0.04;

/// Helix advance per particle, in radians.
pub const CURL_STEP: f32 = 1.2;

/// GPU `w` value marking a pinned particle (inverse mass 0).
pub const PINNED_W: f32 = 0.0;

/// GPU `w` value marking a free particle (inverse mass 1).
pub const FREE_W: f32 = 1.0;

/// Shape shared by every strand of one hair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrandLayout {
    pub num_strands: u32,
    /// Particles per strand.
    pub strand_length: u32,
    /// Total length of one strand.
    pub hair_length: f32,
}

impl StrandLayout {
    pub fn new(num_strands: u32, strand_length: u32, hair_length: f32) -> Self {
        Self {
            num_strands,
            strand_length,
            hair_length,
        }
    }

    pub fn segment_length(&self) -> f32 {
        self.hair_length / self.strand_length as f32
    }

    pub fn particle_count(&self) -> usize {
        self.num_strands as usize * self.strand_length as usize
    }

    /// Flat array index of particle `index` on strand `strand`.
    pub fn particle_index(&self, strand: u32, index: u32) -> usize {
        strand as usize * self.strand_length as usize + index as usize
    }

    pub fn validate(&self) -> Result<(), HairError> {
        if self.num_strands == 0 {
            return Err(HairError::NoStrands);
        }
        if self.strand_length < 2 {
            return Err(HairError::StrandTooShort(self.strand_length));
        }
        if !(self.hair_length.is_finite() && self.hair_length > 0.0) {
            return Err(HairError::InvalidLength(self.hair_length));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HairStyle {
    #[default]
    Straight,
    Curly,
}

impl HairStyle {
    pub fn display_name(&self) -> &'static str {
        match self {
            HairStyle::Straight => "Straight hair",
            HairStyle::Curly => "Curly hair",
        }
    }

    pub fn toggled(&self) -> HairStyle {
        match self {
            HairStyle::Straight => HairStyle::Curly,
            HairStyle::Curly => HairStyle::Straight,
        }
    }
}

impl fmt::Display for HairStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One mass point, as seen from the CPU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub previous_position: Vec3,
    pub velocity: Vec3,
    pub pinned: bool,
}

impl Particle {
    pub fn at_rest(position: Vec3, pinned: bool) -> Self {
        Self {
            position,
            previous_position: position,
            velocity: Vec3::ZERO,
            pinned,
        }
    }
}

/// Fixed growth direction for a root with the given surface normal.
pub fn growth_direction(normal: Vec3) -> Vec3 {
    let direction = (normal + GROWTH_BIAS).normalize_or_zero();
    if direction == Vec3::ZERO {
        Vec3::Y
    } else {
        direction
    }
}

/// Rest positions of one strand, root first.
///
/// Straight strands step `segment_length` along the growth direction from the
/// previous particle. Curly strands wind a helix around that centre line
/// with zero offset at the root.
pub fn strand_rest_positions(root: &SurfaceSample, layout: &StrandLayout, style: HairStyle) -> Vec<Vec3> {
    let direction = growth_direction(root.normal);
    let step = direction * layout.segment_length();
    let (t1, t2) = direction.any_orthonormal_pair();

    let mut positions = Vec::with_capacity(layout.strand_length as usize);
    let mut centre = root.position;
    positions.push(centre);

    for j in 1..layout.strand_length {
        centre += step;
        let position = match style {
            HairStyle::Straight => centre,
            HairStyle::Curly => {
                let angle = j as f32 * CURL_STEP;
                let offset = (t1 * angle.cos() + t2 * angle.sin() - t1) * CURL_RADIUS;
                centre + offset
            }
        };
        positions.push(position);
    }
    positions
}

/// CPU copy of the rest, current, previous and velocity arrays.
///
/// Elements are `vec4`; `w` of the position arrays is [`PINNED_W`] for roots
/// and [`FREE_W`] for every other particle.
#[derive(Debug, Clone, PartialEq)]
pub struct StrandArrays {
    layout: StrandLayout,
    rest: Vec<Vec4>,
    current: Vec<Vec4>,
    previous: Vec<Vec4>,
    velocity: Vec<Vec4>,
}

impl StrandArrays {
    /// Build all strands from their roots, already in rest state.
    pub fn generate(roots: &[SurfaceSample], layout: StrandLayout, style: HairStyle) -> Result<Self, HairError> {
        layout.validate()?;
        if roots.len() != layout.num_strands as usize {
            return Err(HairError::RootCountMismatch {
                expected: layout.num_strands,
                found: roots.len(),
            });
        }

        let mut rest = Vec::with_capacity(layout.particle_count());
        for root in roots {
            for (i, p) in strand_rest_positions(root, &layout, style).into_iter().enumerate() {
                let w = if i == 0 { PINNED_W } else { FREE_W };
                rest.push(p.extend(w));
            }
        }

        let mut arrays = Self {
            layout,
            current: Vec::new(),
            previous: Vec::new(),
            velocity: Vec::new(),
            rest,
        };
        arrays.reset();
        Ok(arrays)
    }

    /// Copy rest into current and previous, zero the velocities.
    pub fn reset(&mut self) {
        self.current.clone_from(&self.rest);
        self.previous.clone_from(&self.rest);
        self.velocity.clear();
        self.velocity.resize(self.rest.len(), Vec4::ZERO);
    }

    pub fn layout(&self) -> &StrandLayout {
        &self.layout
    }

    pub fn rest(&self) -> &[Vec4] {
        &self.rest
    }

    pub fn current(&self) -> &[Vec4] {
        &self.current
    }

    pub fn previous(&self) -> &[Vec4] {
        &self.previous
    }

    pub fn velocity(&self) -> &[Vec4] {
        &self.velocity
    }

    pub fn particle(&self, strand: u32, index: u32) -> Particle {
        let i = self.layout.particle_index(strand, index);
        Particle {
            position: self.current[i].truncate(),
            previous_position: self.previous[i].truncate(),
            velocity: self.velocity[i].truncate(),
            pinned: self.current[i].w == PINNED_W,
        }
    }

    pub fn root_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.rest
            .chunks_exact(self.layout.strand_length as usize)
            .map(|strand| strand[0].truncate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(position: Vec3, normal: Vec3) -> SurfaceSample {
        SurfaceSample { position, normal }
    }

    #[test]
    fn test_segment_length_is_exact() {
        let layout = StrandLayout::new(5120, 20, 2.0);
        assert_eq!(layout.segment_length(), 2.0 / 20.0);
        assert_eq!(layout.particle_count(), 5120 * 20);
    }

    #[test]
    fn test_layout_validation() {
        assert!(matches!(StrandLayout::new(0, 20, 2.0).validate(), Err(HairError::NoStrands)));
        assert!(matches!(
            StrandLayout::new(10, 1, 2.0).validate(),
            Err(HairError::StrandTooShort(1))
        ));
        assert!(matches!(
            StrandLayout::new(10, 20, 0.0).validate(),
            Err(HairError::InvalidLength(_))
        ));
    }

    #[test]
    fn test_only_roots_are_pinned() {
        let layout = StrandLayout::new(2, 4, 1.0);
        let roots = [sample(Vec3::ZERO, Vec3::Y), sample(Vec3::X, Vec3::Z)];
        let arrays = StrandArrays::generate(&roots, layout, HairStyle::Straight).unwrap();
        for strand in 0..2 {
            assert!(arrays.particle(strand, 0).pinned);
            for i in 1..4 {
                assert!(!arrays.particle(strand, i).pinned);
            }
        }
    }

    #[test]
    fn test_generated_state_is_at_rest() {
        let layout = StrandLayout::new(3, 5, 1.5);
        let roots = [
            sample(Vec3::ZERO, Vec3::Y),
            sample(Vec3::ONE, Vec3::X),
            sample(Vec3::NEG_ONE, Vec3::NEG_Z),
        ];
        let arrays = StrandArrays::generate(&roots, layout, HairStyle::Curly).unwrap();
        for s in 0..3 {
            for i in 0..5 {
                let p = arrays.particle(s, i);
                assert_eq!(p, Particle::at_rest(p.position, i == 0));
            }
        }
    }

    #[test]
    fn test_reset_restores_rest_state_and_is_idempotent() {
        let layout = StrandLayout::new(2, 3, 1.0);
        let roots = [sample(Vec3::ZERO, Vec3::Y), sample(Vec3::X, Vec3::Y)];
        let mut arrays = StrandArrays::generate(&roots, layout, HairStyle::Straight).unwrap();

        arrays.current[4] = Vec4::new(9.0, 9.0, 9.0, FREE_W);
        arrays.previous[2] = Vec4::splat(3.0);
        arrays.velocity[1] = Vec4::new(1.0, 2.0, 3.0, 0.0);

        arrays.reset();
        let once = arrays.clone();
        assert_eq!(arrays.current(), arrays.rest());
        assert_eq!(arrays.previous(), arrays.rest());
        assert!(arrays.velocity().iter().all(|v| *v == Vec4::ZERO));

        arrays.reset();
        assert_eq!(arrays, once);
    }

    #[test]
    fn test_root_count_must_match_layout() {
        let layout = StrandLayout::new(3, 4, 1.0);
        let err = StrandArrays::generate(&[sample(Vec3::ZERO, Vec3::Y)], layout, HairStyle::Straight).unwrap_err();
        assert!(matches!(err, HairError::RootCountMismatch { expected: 3, found: 1 }));
    }

    #[test]
    fn test_degenerate_normal_still_grows() {
        let dir = growth_direction(-GROWTH_BIAS);
        assert_eq!(dir, Vec3::Y);
    }

    #[test]
    fn test_curly_strand_keeps_root_and_winds() {
        let layout = StrandLayout::new(1, 12, 2.0);
        let root = sample(Vec3::new(0.3, 2.0, 0.1), Vec3::Y);
        let straight = strand_rest_positions(&root, &layout, HairStyle::Straight);
        let curly = strand_rest_positions(&root, &layout, HairStyle::Curly);
        assert_eq!(curly[0], root.position);
        let max_offset = straight
            .iter()
            .zip(&curly)
            .map(|(s, c)| s.distance(*c))
            .fold(0.0f32, f32::max);
        assert!(max_offset > CURL_RADIUS, "curls should leave the centre line");
        assert!(max_offset <= 2.0 * CURL_RADIUS + 1e-5);
    }

    proptest! {
        #[test]
        fn prop_straight_strand_spacing(
            nx in -1.0f32..1.0,
            ny in -1.0f32..1.0,
            nz in -1.0f32..1.0,
            px in -3.0f32..3.0,
            py in -3.0f32..3.0,
            pz in -3.0f32..3.0,
            strand_length in 2u32..40,
            hair_length in 0.1f32..5.0,
        ) {
            let layout = StrandLayout::new(1, strand_length, hair_length);
            let root = sample(Vec3::new(px, py, pz), Vec3::new(nx, ny, nz));
            let positions = strand_rest_positions(&root, &layout, HairStyle::Straight);
            let step = growth_direction(root.normal) * layout.segment_length();

            prop_assert_eq!(positions.len(), strand_length as usize);
            prop_assert_eq!(positions[0], root.position);
            for i in 0..positions.len() - 1 {
                prop_assert_eq!(positions[i + 1], positions[i] + step);
            }
        }
    }
}

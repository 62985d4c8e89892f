use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use super::strand::StrandLayout;

/// Per-hair simulation parameters, edited at runtime through the debug controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HairParameters {
    /// Fraction of velocity removed per step, in [0, 1].
    pub damping: f32,

    /// Tangential velocity removed on collider contact, in [0, 1].
    pub friction: f32,

    /// Pull toward the rest shape relative to the parent particle, in [0, 1].
    pub stiffness: f32,

    /// Multiplier on 9.81 m/s² along +Y; negative pulls down. In [-10, 10].
    pub gravity_factor: f32,

    /// Scale on frame delta time for one step, in [0.001, 1].
    pub substep_factor: f32,

    /// Wind strength along +X, in [0, 10].
    pub wind_speed: f32,

    /// Extra collision margin keeping strands off the head, in [0, 1].
    pub volume_preserve: f32,
}

impl Default for HairParameters {
    fn default() -> Self {
        Self {
            damping: 0.01,
            friction: 0.0,
            stiffness: 0.01,
            gravity_factor: -1.0,
            substep_factor: 1.0,
            wind_speed: 0.0,
            volume_preserve: 0.0,
        }
    }
}

/// Names one field of [`HairParameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HairParameter {
    Damping,
    Friction,
    Stiffness,
    GravityFactor,
    SubstepFactor,
    WindSpeed,
    VolumePreserve,
}

impl HairParameter {
    pub fn all() -> &'static [HairParameter] {
        &[
            HairParameter::Damping,
            HairParameter::Friction,
            HairParameter::Stiffness,
            HairParameter::GravityFactor,
            HairParameter::SubstepFactor,
            HairParameter::WindSpeed,
            HairParameter::VolumePreserve,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            HairParameter::Damping => "Damping",
            HairParameter::Friction => "Friction",
            HairParameter::Stiffness => "Stiffness",
            HairParameter::GravityFactor => "Gravity factor",
            HairParameter::SubstepFactor => "Substep",
            HairParameter::WindSpeed => "Wind speed",
            HairParameter::VolumePreserve => "Volume preserve",
        }
    }

    /// Inclusive valid range.
    pub fn range(&self) -> (f32, f32) {
        match self {
            HairParameter::GravityFactor => (-10.0, 10.0),
            HairParameter::SubstepFactor => (0.001, 1.0),
            HairParameter::WindSpeed => (0.0, 10.0),
            _ => (0.0, 1.0),
        }
    }

    /// Increment used by the up/down keys.
    pub fn step(&self) -> f32 {
        match self {
            HairParameter::GravityFactor | HairParameter::WindSpeed => 0.5,
            HairParameter::SubstepFactor => 0.05,
            _ => 0.01,
        }
    }

    /// The parameter after this one, wrapping around.
    pub fn next(&self) -> HairParameter {
        let all = Self::all();
        let index = all.iter().position(|p| p == self).unwrap_or(0);
        all[(index + 1) % all.len()]
    }
}

impl fmt::Display for HairParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl HairParameters {
    pub fn get(&self, parameter: HairParameter) -> f32 {
        match parameter {
            HairParameter::Damping => self.damping,
            HairParameter::Friction => self.friction,
            HairParameter::Stiffness => self.stiffness,
            HairParameter::GravityFactor => self.gravity_factor,
            HairParameter::SubstepFactor => self.substep_factor,
            HairParameter::WindSpeed => self.wind_speed,
            HairParameter::VolumePreserve => self.volume_preserve,
        }
    }

    /// Set one parameter, clamped to its range. NaN leaves the value unchanged.
    pub fn set(&mut self, parameter: HairParameter, value: f32) {
        if value.is_nan() {
            return;
        }
        let (lo, hi) = parameter.range();
        let value = value.clamp(lo, hi);
        match parameter {
            HairParameter::Damping => self.damping = value,
            HairParameter::Friction => self.friction = value,
            HairParameter::Stiffness => self.stiffness = value,
            HairParameter::GravityFactor => self.gravity_factor = value,
            HairParameter::SubstepFactor => self.substep_factor = value,
            HairParameter::WindSpeed => self.wind_speed = value,
            HairParameter::VolumePreserve => self.volume_preserve = value,
        }
    }

    /// Move one parameter by `steps` increments, clamped.
    pub fn nudge(&mut self, parameter: HairParameter, steps: f32) {
        self.set(parameter, self.get(parameter) + parameter.step() * steps);
    }

    /// Copy with every field clamped into its documented range.
    pub fn clamped(self) -> Self {
        let mut out = Self::default();
        for &parameter in HairParameter::all() {
            let value = self.get(parameter);
            // NaN keeps the default.
            out.set(parameter, value);
        }
        out
    }
}

/// GPU layout of the per-hair uniform (group 4), 48 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct HairParamsUniform {
    pub damping: f32,
    pub friction: f32,
    pub stiffness: f32,
    pub gravity_factor: f32,
    pub substep_factor: f32,
    pub wind_speed: f32,
    pub volume_preserve: f32,
    pub _pad0: f32,
    pub num_strands: u32,
    pub strand_length: u32,
    pub _pad1: [u32; 2],
}

impl HairParamsUniform {
    pub fn new(parameters: &HairParameters, layout: &StrandLayout) -> Self {
        let p = parameters.clamped();
        Self {
            damping: p.damping,
            friction: p.friction,
            stiffness: p.stiffness,
            gravity_factor: p.gravity_factor,
            substep_factor: p.substep_factor,
            wind_speed: p.wind_speed,
            volume_preserve: p.volume_preserve,
            _pad0: 0.0,
            num_strands: layout.num_strands,
            strand_length: layout.strand_length,
            _pad1: [0; 2],
        }
    }
}

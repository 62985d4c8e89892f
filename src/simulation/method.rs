//! Simulation method interface.
//!
//! A method records the compute work for one step into a caller-owned
//! encoder. It never submits; the frame orchestrator decides when and with
//! which synchronization the recorded work reaches the queue.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::{GpuError, GraphicsContext};
use crate::scene::registry::{MissingEntity, SceneRegistry};

use super::globals::GlobalUniforms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MethodKind {
    #[default]
    Strand,
    Hybrid,
}

impl MethodKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            MethodKind::Strand => "Strand Method",
            MethodKind::Hybrid => "Hybrid Method",
        }
    }

    /// Next method in the cycle order.
    pub fn next(self) -> Self {
        match self {
            MethodKind::Strand => MethodKind::Hybrid,
            MethodKind::Hybrid => MethodKind::Strand,
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Why a step recorded no work. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingEntity(MissingEntity),
    /// Frame delta was zero or negative, so there is nothing to integrate.
    NoTimeStep,
    Unimplemented,
}

/// Result of recording one simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulateOutcome {
    Recorded { workgroups: u32, passes: u32 },
    Skipped(SkipReason),
}

impl SimulateOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, SimulateOutcome::Recorded { .. })
    }
}

/// Debug toggles routed to the active method this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodUiInput {
    pub toggle_debug_view: bool,
}

pub trait SimulationMethod {
    fn kind(&self) -> MethodKind;

    /// Allocate pipelines and uniform buffers. Fails if any allocation does.
    fn prepare(&mut self, ctx: &GraphicsContext, globals: &GlobalUniforms) -> Result<(), GpuError>;

    fn is_prepared(&self) -> bool;

    /// Record one step against the current scene into `encoder`.
    ///
    /// A scene without the hair, grid and collider pool the method needs is
    /// a silent skip, reported as [`SimulateOutcome::Skipped`].
    fn simulate(
        &mut self,
        ctx: &GraphicsContext,
        encoder: &mut wgpu::CommandEncoder,
        scene: &SceneRegistry,
        globals: &GlobalUniforms,
        delta_time: f32,
    ) -> Result<SimulateOutcome, GpuError>;

    /// Apply this frame's debug toggles. Returns whether anything that
    /// affects the simulation changed.
    fn on_ui_update(&mut self, input: &MethodUiInput) -> bool;

    /// Whether the method's debug visualization is on.
    fn debug_view(&self) -> bool {
        false
    }
}

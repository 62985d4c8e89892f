//! Hybrid method. Selectable so the method switch can be exercised, but it
//! records no work and leaves the hair at whatever state it was in.

use crate::context::{GpuError, GraphicsContext};
use crate::scene::registry::SceneRegistry;

use super::globals::GlobalUniforms;
use super::method::{MethodKind, MethodUiInput, SimulateOutcome, SimulationMethod, SkipReason};

#[derive(Debug, Default)]
pub struct HybridMethod {
    prepared: bool,
}

impl HybridMethod {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SimulationMethod for HybridMethod {
    fn kind(&self) -> MethodKind {
        MethodKind::Hybrid
    }

    fn prepare(&mut self, _ctx: &GraphicsContext, _globals: &GlobalUniforms) -> Result<(), GpuError> {
        self.prepared = true;
        log::info!("Hybrid method selected; it does not simulate yet");
        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.prepared
    }

    fn simulate(
        &mut self,
        _ctx: &GraphicsContext,
        _encoder: &mut wgpu::CommandEncoder,
        _scene: &SceneRegistry,
        _globals: &GlobalUniforms,
        _delta_time: f32,
    ) -> Result<SimulateOutcome, GpuError> {
        Ok(SimulateOutcome::Skipped(SkipReason::Unimplemented))
    }

    fn on_ui_update(&mut self, _input: &MethodUiInput) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hybrid_ignores_toggles() {
        let mut method = HybridMethod::new();
        assert_eq!(method.kind(), MethodKind::Hybrid);
        assert!(!method.on_ui_update(&MethodUiInput { toggle_debug_view: true }));
        assert!(!method.debug_view());
    }
}

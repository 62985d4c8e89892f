//! Method manager for switching between simulation methods.
//!
//! Methods are created and prepared the first time they become active and
//! kept afterwards, so switching back does not rebuild pipelines.

use crate::context::{GpuError, GraphicsContext};

use super::globals::GlobalUniforms;
use super::hybrid_method::HybridMethod;
use super::method::{MethodKind, MethodUiInput, SimulationMethod};
use super::strand_method::StrandMethod;

pub struct MethodManager {
    current: MethodKind,
    constraint_pass: bool,
    strand: Option<StrandMethod>,
    hybrid: Option<HybridMethod>,
}

impl MethodManager {
    pub fn new(initial: MethodKind, constraint_pass: bool) -> Self {
        Self {
            current: initial,
            constraint_pass,
            strand: None,
            hybrid: None,
        }
    }

    pub fn current(&self) -> MethodKind {
        self.current
    }

    /// Make `kind` active from the next step on.
    pub fn switch(&mut self, kind: MethodKind) {
        if kind == self.current {
            return;
        }
        log::info!("Switching from {} to {}", self.current, kind);
        self.current = kind;
    }

    pub fn cycle(&mut self) -> MethodKind {
        self.switch(self.current.next());
        self.current
    }

    /// Active method, created and prepared on first use.
    pub fn active_mut(
        &mut self,
        ctx: &GraphicsContext,
        globals: &GlobalUniforms,
    ) -> Result<&mut dyn SimulationMethod, GpuError> {
        let method: &mut dyn SimulationMethod = match self.current {
            MethodKind::Strand => {
                let constraint_pass = self.constraint_pass;
                self.strand.get_or_insert_with(|| StrandMethod::new(constraint_pass))
            }
            MethodKind::Hybrid => self.hybrid.get_or_insert_with(HybridMethod::new),
        };
        if !method.is_prepared() {
            method.prepare(ctx, globals)?;
        }
        Ok(method)
    }

    /// Active method if it has been created.
    pub fn active(&self) -> Option<&dyn SimulationMethod> {
        match self.current {
            MethodKind::Strand => self.strand.as_ref().map(|m| m as &dyn SimulationMethod),
            MethodKind::Hybrid => self.hybrid.as_ref().map(|m| m as &dyn SimulationMethod),
        }
    }

    /// Route debug toggles to the active method.
    pub fn on_ui_update(&mut self, input: &MethodUiInput) -> bool {
        match self.current {
            MethodKind::Strand => self.strand.as_mut().is_some_and(|m| m.on_ui_update(input)),
            MethodKind::Hybrid => self.hybrid.as_mut().is_some_and(|m| m.on_ui_update(input)),
        }
    }

    pub fn debug_view(&self) -> bool {
        self.active().is_some_and(|m| m.debug_view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_is_lazy() {
        let mut manager = MethodManager::new(MethodKind::Strand, true);
        assert!(manager.active().is_none());
        assert_eq!(manager.cycle(), MethodKind::Hybrid);
        assert_eq!(manager.cycle(), MethodKind::Strand);
        assert!(!manager.debug_view());
    }

    #[test]
    fn test_toggles_before_creation_are_ignored() {
        let mut manager = MethodManager::new(MethodKind::Strand, true);
        assert!(!manager.on_ui_update(&MethodUiInput { toggle_debug_view: true }));
    }
}

//! Keyboard bindings for the debug toggles and hair parameters.

use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

use crate::hair::{HairParameter, HairParameters};

/// Visibility and pause switches. Loaded from the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugToggles {
    pub paused: bool,
    pub draw_head: bool,
    pub draw_hair: bool,
    pub draw_grid: bool,
    pub draw_colliders: bool,
}

impl Default for DebugToggles {
    fn default() -> Self {
        Self {
            paused: false,
            draw_head: true,
            draw_hair: true,
            draw_grid: false,
            draw_colliders: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    TogglePause,
    Reset,
    ToggleHead,
    ToggleHair,
    ToggleGrid,
    ToggleColliders,
    ToggleStyle,
    CycleMethod,
    ToggleDebugView,
    NextParameter,
    Increase,
    Decrease,
}

pub fn action_for_key(key: KeyCode) -> Option<ControlAction> {
    let action = match key {
        KeyCode::Space => ControlAction::TogglePause,
        KeyCode::KeyR => ControlAction::Reset,
        KeyCode::KeyH => ControlAction::ToggleHead,
        KeyCode::KeyJ => ControlAction::ToggleHair,
        KeyCode::KeyG => ControlAction::ToggleGrid,
        KeyCode::KeyK => ControlAction::ToggleColliders,
        KeyCode::KeyC => ControlAction::ToggleStyle,
        KeyCode::KeyM => ControlAction::CycleMethod,
        KeyCode::KeyV => ControlAction::ToggleDebugView,
        KeyCode::Tab => ControlAction::NextParameter,
        KeyCode::ArrowUp => ControlAction::Increase,
        KeyCode::ArrowDown => ControlAction::Decrease,
        _ => return None,
    };
    Some(action)
}

/// What the scene has to do after [`DebugControls::apply`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlResponse {
    /// Only local state changed.
    None,
    PauseChanged(bool),
    ParametersChanged(HairParameters),
    Reset,
    ToggleStyle,
    CycleMethod,
    ToggleDebugView,
}

#[derive(Debug, Clone)]
pub struct DebugControls {
    pub toggles: DebugToggles,
    selected: HairParameter,
    parameters: HairParameters,
}

impl DebugControls {
    pub fn new(toggles: DebugToggles, parameters: HairParameters) -> Self {
        Self {
            toggles,
            selected: HairParameter::Damping,
            parameters: parameters.clamped(),
        }
    }

    pub fn selected(&self) -> HairParameter {
        self.selected
    }

    pub fn parameters(&self) -> &HairParameters {
        &self.parameters
    }

    pub fn apply(&mut self, action: ControlAction) -> ControlResponse {
        let toggles = &mut self.toggles;
        match action {
            ControlAction::TogglePause => {
                toggles.paused = !toggles.paused;
                return ControlResponse::PauseChanged(toggles.paused);
            }
            ControlAction::ToggleHead => toggles.draw_head = !toggles.draw_head,
            ControlAction::ToggleHair => toggles.draw_hair = !toggles.draw_hair,
            ControlAction::ToggleGrid => toggles.draw_grid = !toggles.draw_grid,
            ControlAction::ToggleColliders => toggles.draw_colliders = !toggles.draw_colliders,
            ControlAction::Reset => return ControlResponse::Reset,
            ControlAction::ToggleStyle => return ControlResponse::ToggleStyle,
            ControlAction::CycleMethod => return ControlResponse::CycleMethod,
            ControlAction::ToggleDebugView => return ControlResponse::ToggleDebugView,
            ControlAction::NextParameter => {
                self.selected = self.selected.next();
                log::info!(
                    "Selected {} = {:.3}",
                    self.selected,
                    self.parameters.get(self.selected)
                );
            }
            ControlAction::Increase | ControlAction::Decrease => {
                let steps = if action == ControlAction::Increase { 1.0 } else { -1.0 };
                let before = self.parameters.get(self.selected);
                self.parameters.nudge(self.selected, steps);
                let after = self.parameters.get(self.selected);
                if after == before {
                    return ControlResponse::None;
                }
                log::info!("{} = {:.3}", self.selected, after);
                return ControlResponse::ParametersChanged(self.parameters);
            }
        }
        ControlResponse::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> DebugControls {
        DebugControls::new(DebugToggles::default(), HairParameters::default())
    }

    #[test]
    fn test_every_documented_key_is_bound() {
        let keys = [
            KeyCode::Space,
            KeyCode::KeyR,
            KeyCode::KeyH,
            KeyCode::KeyJ,
            KeyCode::KeyG,
            KeyCode::KeyK,
            KeyCode::KeyC,
            KeyCode::KeyM,
            KeyCode::KeyV,
            KeyCode::Tab,
            KeyCode::ArrowUp,
            KeyCode::ArrowDown,
        ];
        for key in keys {
            assert!(action_for_key(key).is_some(), "{key:?} unbound");
        }
        assert_eq!(action_for_key(KeyCode::KeyZ), None);
    }

    #[test]
    fn test_pause_toggle_reports_new_state() {
        let mut controls = controls();
        assert_eq!(controls.apply(ControlAction::TogglePause), ControlResponse::PauseChanged(true));
        assert!(controls.toggles.paused);
        assert_eq!(controls.apply(ControlAction::TogglePause), ControlResponse::PauseChanged(false));
    }

    #[test]
    fn test_visibility_toggles_are_local() {
        let mut controls = controls();
        assert_eq!(controls.apply(ControlAction::ToggleGrid), ControlResponse::None);
        assert!(controls.toggles.draw_grid);
        assert_eq!(controls.apply(ControlAction::ToggleHead), ControlResponse::None);
        assert!(!controls.toggles.draw_head);
    }

    #[test]
    fn test_increase_pushes_clamped_parameters() {
        let mut controls = controls();
        let before = controls.parameters().damping;
        match controls.apply(ControlAction::Increase) {
            ControlResponse::ParametersChanged(params) => {
                assert!(params.damping > before);
                assert!(params.damping <= 1.0);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_saturated_parameter_reports_no_change() {
        let mut parameters = HairParameters::default();
        parameters.set(HairParameter::Damping, 1.0);
        let mut controls = DebugControls::new(DebugToggles::default(), parameters);
        assert_eq!(controls.apply(ControlAction::Increase), ControlResponse::None);
        assert_eq!(controls.parameters().damping, 1.0);
    }

    #[test]
    fn test_tab_cycles_through_all_parameters() {
        let mut controls = controls();
        for _ in 0..HairParameter::all().len() {
            controls.apply(ControlAction::NextParameter);
        }
        assert_eq!(controls.selected(), HairParameter::Damping);
    }
}

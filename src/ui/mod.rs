//! User input: the orbit camera and the keyboard debug controls.

pub mod camera;
pub mod controls;

pub use camera::{OrbitCamera, HEAD_CENTRE};
pub use controls::{action_for_key, ControlAction, ControlResponse, DebugControls, DebugToggles};

//! Orbit camera around the head.
//!
//! Mouse input is accumulated between frames and applied in [`OrbitCamera::update`],
//! so event handling never touches the matrices directly.

use glam::{Mat4, Vec2, Vec3};
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

use crate::simulation::CameraUniform;

/// Point the camera orbits by default: the centre of the demo head.
pub const HEAD_CENTRE: Vec3 = Vec3::new(0.0, 2.2, 0.0);

const PITCH_LIMIT: f32 = 1.5;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 40.0;

pub struct OrbitCamera {
    pub centre: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    target_distance: f32,

    pub fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,

    pub mouse_sensitivity: f32,
    pub zoom_speed: f32,
    /// Fraction of the remaining zoom covered per second.
    pub zoom_smoothing: f32,

    is_dragging: bool,
    last_mouse_pos: Option<PhysicalPosition<f64>>,
    accumulated_mouse_delta: Vec2,
    accumulated_scroll: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(HEAD_CENTRE, 8.0)
    }
}

impl OrbitCamera {
    pub fn new(centre: Vec3, distance: f32) -> Self {
        let distance = distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
        Self {
            centre,
            yaw: 0.0,
            pitch: 0.15,
            distance,
            target_distance: distance,
            fov_y: 45f32.to_radians(),
            z_near: 0.05,
            z_far: 200.0,
            mouse_sensitivity: 0.005,
            zoom_speed: 0.5,
            zoom_smoothing: 12.0,
            is_dragging: false,
            last_mouse_pos: None,
            accumulated_mouse_delta: Vec2::ZERO,
            accumulated_scroll: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let offset = Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw);
        self.centre + offset * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.centre, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh(self.fov_y, aspect, self.z_near, self.z_far)
    }

    pub fn uniform(&self, aspect: f32) -> CameraUniform {
        CameraUniform::new(self.view_matrix(), self.projection(aspect), self.position())
    }

    pub fn target_distance(&self) -> f32 {
        self.target_distance
    }

    /// Left or middle button drags orbit.
    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if matches!(button, MouseButton::Left | MouseButton::Middle) {
            self.is_dragging = state == ElementState::Pressed;
            if !self.is_dragging {
                self.last_mouse_pos = None;
            }
        }
    }

    pub fn handle_mouse_move(&mut self, position: PhysicalPosition<f64>) {
        if !self.is_dragging {
            return;
        }
        if let Some(last) = self.last_mouse_pos {
            self.accumulated_mouse_delta += Vec2::new((position.x - last.x) as f32, (position.y - last.y) as f32);
        }
        self.last_mouse_pos = Some(position);
    }

    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        self.accumulated_scroll += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => (pos.y / 100.0) as f32,
        };
    }

    /// Apply input gathered since the last frame.
    pub fn update(&mut self, dt: f32) {
        if self.accumulated_mouse_delta != Vec2::ZERO {
            let delta = self.accumulated_mouse_delta * self.mouse_sensitivity;
            self.yaw = (self.yaw - delta.x).rem_euclid(std::f32::consts::TAU);
            self.pitch = (self.pitch + delta.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
            self.accumulated_mouse_delta = Vec2::ZERO;
        }

        if self.accumulated_scroll != 0.0 {
            // Multiplicative so zoom feels the same near and far.
            let factor = (1.0 - self.zoom_speed * 0.2).powf(self.accumulated_scroll);
            self.target_distance = (self.target_distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
            self.accumulated_scroll = 0.0;
        }

        let blend = if dt.is_finite() && dt > 0.0 {
            (self.zoom_smoothing * dt).min(1.0)
        } else {
            0.0
        };
        self.distance += (self.target_distance - self.distance) * blend;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(camera: &mut OrbitCamera, from: (f64, f64), to: (f64, f64)) {
        camera.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        camera.handle_mouse_move(PhysicalPosition::new(from.0, from.1));
        camera.handle_mouse_move(PhysicalPosition::new(to.0, to.1));
        camera.handle_mouse_button(MouseButton::Left, ElementState::Released);
    }

    #[test]
    fn test_default_orbits_head_centre() {
        let camera = OrbitCamera::default();
        assert_eq!(camera.centre, HEAD_CENTRE);
        let distance = camera.position().distance(HEAD_CENTRE);
        assert!((distance - camera.distance).abs() < 1e-4);
    }

    #[test]
    fn test_view_looks_at_centre() {
        let camera = OrbitCamera::default();
        let centre_in_view = camera.view_matrix().transform_point3(camera.centre);
        assert!(centre_in_view.x.abs() < 1e-4);
        assert!(centre_in_view.y.abs() < 1e-4);
        assert!(centre_in_view.z < 0.0);
    }

    #[test]
    fn test_drag_changes_yaw_only_while_pressed() {
        let mut camera = OrbitCamera::default();
        camera.handle_mouse_move(PhysicalPosition::new(0.0, 0.0));
        camera.handle_mouse_move(PhysicalPosition::new(100.0, 0.0));
        camera.update(0.016);
        assert_eq!(camera.yaw, 0.0);

        drag(&mut camera, (0.0, 0.0), (100.0, 0.0));
        camera.update(0.016);
        assert!(camera.yaw != 0.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = OrbitCamera::default();
        drag(&mut camera, (0.0, 0.0), (0.0, 100_000.0));
        camera.update(0.016);
        assert_eq!(camera.pitch, PITCH_LIMIT);
    }

    #[test]
    fn test_scroll_zooms_in_and_stays_in_range() {
        let mut camera = OrbitCamera::default();
        let start = camera.target_distance();
        camera.handle_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        camera.update(0.016);
        assert!(camera.target_distance() < start);
        assert!(camera.distance < start);

        camera.handle_scroll(MouseScrollDelta::LineDelta(0.0, 1000.0));
        camera.update(1.0);
        assert_eq!(camera.target_distance(), MIN_DISTANCE);
        assert_eq!(camera.distance, MIN_DISTANCE);
    }

    #[test]
    fn test_projection_tolerates_zero_aspect() {
        let camera = OrbitCamera::default();
        let projection = camera.projection(0.0);
        assert!(projection.to_cols_array().iter().all(|v| v.is_finite()));
    }
}

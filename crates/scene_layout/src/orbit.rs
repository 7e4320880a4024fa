//! Orbit camera controller: damped drag, wheel dolly, idle auto-rotation.

use glam::{Mat4, Vec3};
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::layout::smooth_factor;

pub const MIN_DISTANCE: f32 = 0.05;
pub const MAX_DISTANCE: f32 = 5.0e7;
const PITCH_LIMIT: f32 = 89.0 * (TAU / 360.0);

pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Fraction of a queued drag applied per 60 Hz frame.
    pub damping: f32,
    pub auto_rotate: bool,
    /// Revolutions per 30 seconds; sign picks the direction.
    pub auto_rotate_speed: f32,
    /// Auto-rotation pauses while the user is dragging.
    pub dragging: bool,
    pending_yaw: f32,
    pending_pitch: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        // Eye starts at (0, 0, 5) looking at the origin.
        Self {
            target: Vec3::ZERO,
            yaw: FRAC_PI_2,
            pitch: 0.0,
            distance: 5.0,
            fovy: 60f32.to_radians(),
            znear: 0.1,
            zfar: 1.0e8,
            damping: 0.05,
            auto_rotate: true,
            auto_rotate_speed: -2.0,
            dragging: false,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
        }
    }
}

impl OrbitCamera {
    /// Queue a drag rotation. A drag across the full viewport height is one
    /// full turn; damping spreads it over the following frames.
    pub fn rotate(&mut self, dx_px: f32, dy_px: f32, viewport_h: f32) {
        let h = viewport_h.max(1.0);
        self.pending_yaw += TAU * dx_px / h;
        self.pending_pitch += TAU * dy_px / h;
    }

    /// Wheel dolly; positive steps move the eye closer.
    pub fn dolly(&mut self, steps: f32) {
        self.distance = (self.distance * 0.95f32.powf(steps)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Advance damping and idle auto-rotation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let k = smooth_factor(self.damping, dt);
        self.yaw += self.pending_yaw * k;
        self.pitch += self.pending_pitch * k;
        self.pending_yaw *= 1.0 - k;
        self.pending_pitch *= 1.0 - k;
        if self.auto_rotate && !self.dragging {
            self.yaw += self.auto_rotate_speed * TAU / 60.0 * dt;
        }
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + self.distance * Vec3::new(cp * cy, sp, cp * sy)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fovy, aspect, self.znear, self.zfar);
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_positive_z() {
        let cam = OrbitCamera::default();
        let eye = cam.eye();
        assert!(eye.x.abs() < 1e-5);
        assert!((eye.z - 5.0).abs() < 1e-5);
    }

    #[test]
    fn dolly_clamps_to_range() {
        let mut cam = OrbitCamera::default();
        cam.dolly(-1.0e4);
        assert_eq!(cam.distance, MAX_DISTANCE);
        cam.dolly(1.0e6);
        assert_eq!(cam.distance, MIN_DISTANCE);
    }

    #[test]
    fn damped_drag_converges_to_full_turn() {
        let mut cam = OrbitCamera::default();
        cam.auto_rotate = false;
        let start = cam.yaw;
        cam.rotate(600.0, 0.0, 600.0);
        for _ in 0..600 {
            cam.update(1.0 / 60.0);
        }
        assert!((cam.yaw - start - TAU).abs() < 1e-3);
    }

    #[test]
    fn pitch_stays_clamped() {
        let mut cam = OrbitCamera::default();
        cam.auto_rotate = false;
        cam.rotate(0.0, 10_000.0, 100.0);
        for _ in 0..600 {
            cam.update(1.0 / 60.0);
        }
        assert!(cam.pitch <= PITCH_LIMIT + 1e-6);
    }

    #[test]
    fn auto_rotate_completes_revolution_in_thirty_seconds() {
        let mut cam = OrbitCamera::default();
        cam.auto_rotate_speed = -2.0;
        let start = cam.yaw;
        for _ in 0..(30 * 60) {
            cam.update(1.0 / 60.0);
        }
        assert!((cam.yaw - start + TAU).abs() < 1e-2);
    }

    #[test]
    fn dragging_pauses_auto_rotation() {
        let mut cam = OrbitCamera::default();
        cam.dragging = true;
        let start = cam.yaw;
        cam.update(1.0);
        assert_eq!(cam.yaw, start);
    }
}

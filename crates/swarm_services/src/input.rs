//! Camera input
//!
//! Orbit camera driven by raw pointer deltas, so the windowing layer only
//! forwards numbers.

use glam::{Mat4, Vec3};

const MIN_DISTANCE: f32 = 2.0;
const MAX_DISTANCE: f32 = 400.0;
const PITCH_LIMIT: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub focus: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Radians per pixel of drag.
    pub sensitivity: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.3,
            distance: 45.0,
            fov_y: 60f32.to_radians(),
            near: 0.1,
            far: 500.0,
            sensitivity: 0.005,
        }
    }
}

impl OrbitCamera {
    pub fn looking_at(focus: Vec3) -> Self {
        Self {
            focus,
            ..Self::default()
        }
    }

    /// Rotate by a pointer drag of `(dx, dy)` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Positive `steps` moves closer.
    pub fn zoom(&mut self, steps: f32) {
        self.distance = (self.distance * 0.9f32.powf(steps)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.focus + Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.focus, Vec3::Y)
    }

    /// Right-handed, `[0, 1]` depth (wgpu clip space).
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far) * self.view()
    }
}

/// Tracks a held mouse button and turns cursor positions into deltas.
#[derive(Debug, Default, Clone, Copy)]
pub struct DragState {
    held: bool,
    last: Option<(f64, f64)>,
}

impl DragState {
    pub fn press(&mut self) {
        self.held = true;
    }

    pub fn release(&mut self) {
        self.held = false;
        self.last = None;
    }

    /// Delta since the previous cursor position while held.
    pub fn moved_to(&mut self, x: f64, y: f64) -> Option<(f32, f32)> {
        let previous = self.last.replace((x, y));
        if !self.held {
            return None;
        }
        previous.map(|(px, py)| ((x - px) as f32, (y - py) as f32))
    }
}

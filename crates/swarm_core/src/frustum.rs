//! View frustum planes
//!
//! Planes are extracted from a combined view-projection matrix
//! (Gribb & Hartmann). Each plane is `xyz` = inward normal, `w` = distance,
//! normalised so `dot(n, p) + w` is a signed world-space distance.

use glam::{Mat4, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    pub fn from_view_proj(view_proj: Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);

        // Near uses the [-1, 1] depth form. For [0, 1] depth that plane sits
        // just behind the true near plane, so it never rejects a visible point.
        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2].map(normalize_plane);
        Self { planes }
    }

    pub fn from_planes(planes: [Vec4; 6]) -> Self {
        Self { planes }
    }

    /// Left, right, bottom, top, near, far.
    pub fn planes(&self) -> [Vec4; 6] {
        self.planes
    }

    /// Signed distance from `point` to plane `index`. Positive is inside.
    pub fn signed_distance(&self, index: usize, point: Vec3) -> f32 {
        let plane = self.planes[index];
        plane.truncate().dot(point) + plane.w
    }

    /// Point test with every plane pushed outward by `margin`.
    pub fn contains_point(&self, point: Vec3, margin: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(point) + plane.w >= -margin)
    }
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    let len = plane.truncate().length();
    if len > 0.0 {
        plane / len
    } else {
        plane
    }
}

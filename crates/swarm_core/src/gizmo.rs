//! Bounds wireframe for the debug overlay

use glam::Vec3;

/// Corner index pairs for the 12 box edges.
#[rustfmt::skip]
const EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 3), (3, 2), (2, 0),
    (4, 5), (5, 7), (7, 6), (6, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

/// Line-list vertices for a box of full edge lengths `size` centered on
/// `center`. The overlay passes the configured `bounds_size` straight in.
pub fn bounds_wireframe(center: Vec3, size: Vec3) -> [Vec3; 24] {
    let half_extents = size * 0.5;
    let corner = |i: usize| {
        let sign = Vec3::new(
            if i & 1 == 0 { -1.0 } else { 1.0 },
            if i & 2 == 0 { -1.0 } else { 1.0 },
            if i & 4 == 0 { -1.0 } else { 1.0 },
        );
        center + sign * half_extents
    };

    let mut lines = [Vec3::ZERO; 24];
    for (edge, &(a, b)) in EDGES.iter().enumerate() {
        lines[edge * 2] = corner(a);
        lines[edge * 2 + 1] = corner(b);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_edge_is_axis_aligned_with_full_length() {
        let size = Vec3::new(2.0, 4.0, 6.0);
        let lines = bounds_wireframe(Vec3::new(5.0, 0.0, 0.0), size);
        for pair in lines.chunks(2) {
            let d = (pair[1] - pair[0]).abs();
            let axes = [d.x, d.y, d.z].iter().filter(|&&c| c > 0.0).count();
            assert_eq!(axes, 1);
            assert!([2.0, 4.0, 6.0].contains(&d.max_element()));
        }
    }

    #[test]
    fn configured_size_is_the_full_box() {
        let center = Vec3::new(0.0, 4.0, 0.0);
        let lines = bounds_wireframe(center, Vec3::splat(20.0));
        let min = lines.iter().fold(Vec3::splat(f32::MAX), |m, v| m.min(*v));
        let max = lines.iter().fold(Vec3::splat(f32::MIN), |m, v| m.max(*v));
        assert_eq!(min, Vec3::new(-10.0, -6.0, -10.0));
        assert_eq!(max, Vec3::new(10.0, 14.0, 10.0));
        assert_eq!(max - min, Vec3::splat(20.0));
    }
}

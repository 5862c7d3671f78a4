//! Math utilities shared by the host and the CPU reference kernels
//!
//! Re-exports glam. The hash noise and look basis here are mirrored in
//! `flock_simulate.wgsl`; keep the two in step.

pub use glam::*;

use rand::Rng;

/// Lengths at or below this are treated as zero when normalising.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Uniform random point inside a sphere of `radius` around the origin.
pub fn random_in_sphere<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if candidate.length_squared() <= 1.0 {
            return candidate * radius;
        }
    }
}

/// Direction of `v`, or zero when `v` is (nearly) zero length.
#[inline]
pub fn direction_or_zero(v: Vec3) -> Vec3 {
    let len = v.length();
    if len > NORMALIZE_EPSILON {
        v / len
    } else {
        Vec3::ZERO
    }
}

/// Orthonormal basis whose +Z axis faces `forward` (Y up).
///
/// Zero `forward` yields the identity basis.
pub fn look_basis(forward: Vec3) -> Mat3 {
    let len = forward.length();
    if len <= NORMALIZE_EPSILON {
        return Mat3::IDENTITY;
    }
    let f = forward / len;
    let up = if f.y.abs() > 0.999 { Vec3::X } else { Vec3::Y };
    let right = up.cross(f).normalize();
    let true_up = f.cross(right);
    Mat3::from_cols(right, true_up, f)
}

/// Model matrix for a fly: translate to `position`, face `velocity`, uniform `scale`.
pub fn fly_transform(position: Vec3, velocity: Vec3, scale: f32) -> Mat4 {
    let basis = look_basis(velocity);
    Mat4::from_cols(
        (basis.x_axis * scale).extend(0.0),
        (basis.y_axis * scale).extend(0.0),
        (basis.z_axis * scale).extend(0.0),
        position.extend(1.0),
    )
}

/// PCG hash (Jarzynski & Olano).
#[inline]
pub fn pcg_hash(input: u32) -> u32 {
    let state = input.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

#[inline]
fn signed_unit(h: u32) -> f32 {
    h as f32 / 4_294_967_295.0 * 2.0 - 1.0
}

/// Per-lane noise in [-1, 1]^3, stable for a given lane and frame.
pub fn lane_noise(lane: u32, frame: u32) -> Vec3 {
    let seed = pcg_hash(lane ^ pcg_hash(frame));
    let x = pcg_hash(seed);
    let y = pcg_hash(x);
    let z = pcg_hash(y);
    Vec3::new(signed_unit(x), signed_unit(y), signed_unit(z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_points_stay_inside_radius() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(random_in_sphere(&mut rng, 5.0).length() <= 5.0 + 1e-4);
        }
    }

    #[test]
    fn look_basis_faces_forward() {
        let basis = look_basis(Vec3::new(3.0, 0.0, 4.0));
        assert!((basis.z_axis - Vec3::new(0.6, 0.0, 0.8)).length() < 1e-5);
        assert!(basis.x_axis.dot(basis.z_axis).abs() < 1e-5);
        assert!((basis.determinant() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn zero_velocity_gives_identity_orientation() {
        assert_eq!(look_basis(Vec3::ZERO), Mat3::IDENTITY);
        let m = fly_transform(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, 0.1);
        assert_eq!(m.w_axis, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert!((m.x_axis.x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn vertical_velocity_still_builds_a_basis() {
        let basis = look_basis(Vec3::Y);
        assert!(basis.is_finite());
        assert!((basis.z_axis - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn lane_noise_is_bounded_and_deterministic() {
        for lane in 0..256 {
            let n = lane_noise(lane, 3);
            assert!(n.abs().max_element() <= 1.0);
            assert_eq!(n, lane_noise(lane, 3));
        }
        assert_ne!(lane_noise(0, 1), lane_noise(0, 2));
    }
}

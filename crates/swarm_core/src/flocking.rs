//! Per-lane steering rules
//!
//! CPU reference for `flock_simulate.wgsl`. Each function here has a WGSL
//! twin with the same name and the same arithmetic.

use glam::Vec3;

use crate::instance::FlyInstance;
use crate::math::{direction_or_zero, lane_noise, NORMALIZE_EPSILON};
use crate::obstacle::Obstacle;
use crate::params::SimParams;

/// Lower bound on the avoidance reach so the falloff never divides by zero.
pub const MIN_AVOIDANCE_REACH: f32 = 1e-4;

/// Separation, alignment and cohesion accumulated over one lane's neighbours.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeighborForces {
    pub separation: Vec3,
    pub alignment: Vec3,
    pub cohesion: Vec3,
    pub neighbors: u32,
}

/// Brute-force scan of the whole population for neighbours of `lane`.
///
/// A neighbour is any other fly with `0 < distance < perception_radius`.
/// Coincident flies are skipped.
pub fn neighbor_forces(lane: usize, flies: &[FlyInstance], perception_radius: f32) -> NeighborForces {
    let own = &flies[lane];
    let position = own.position();
    let velocity = own.velocity();
    let radius_sq = perception_radius * perception_radius;

    let mut separation = Vec3::ZERO;
    let mut heading_sum = Vec3::ZERO;
    let mut center_sum = Vec3::ZERO;
    let mut neighbors = 0u32;

    for (j, other) in flies.iter().enumerate() {
        if j == lane {
            continue;
        }
        let offset = position - other.position();
        let dist_sq = offset.length_squared();
        if dist_sq <= 0.0 || dist_sq >= radius_sq {
            continue;
        }
        separation += offset / dist_sq;
        heading_sum += other.velocity();
        center_sum += other.position();
        neighbors += 1;
    }

    if neighbors == 0 {
        return NeighborForces::default();
    }

    let inv = 1.0 / neighbors as f32;
    NeighborForces {
        separation,
        alignment: heading_sum * inv - velocity,
        cohesion: center_sum * inv - position,
        neighbors,
    }
}

/// Unit vector toward `target`, zero when already there.
#[inline]
pub fn seek_force(position: Vec3, target: Vec3) -> Vec3 {
    direction_or_zero(target - position)
}

/// Inward push proportional to how far each axis is outside the box.
/// Zero anywhere inside. `half_extents` are measured from `center`.
pub fn bounds_force(position: Vec3, center: Vec3, half_extents: Vec3) -> Vec3 {
    let offset = position - center;
    let excess = (offset.abs() - half_extents).max(Vec3::ZERO);
    -offset.signum() * excess
}

/// Push away from every obstacle whose surface is closer than `avoid_radius`.
///
/// Strength falls off linearly from 1 at the surface to 0 at `avoid_radius`
/// beyond it, and stays at least 1 inside the obstacle.
pub fn obstacle_force(position: Vec3, obstacles: &[Obstacle], avoid_radius: f32) -> Vec3 {
    let reach = avoid_radius.max(MIN_AVOIDANCE_REACH);
    let mut force = Vec3::ZERO;
    for obstacle in obstacles {
        if obstacle.radius <= 0.0 {
            continue;
        }
        let away = position - obstacle.position();
        let dist = away.length();
        if dist <= NORMALIZE_EPSILON {
            continue;
        }
        let surface = dist - obstacle.radius;
        if surface < reach {
            force += (away / dist) * (1.0 - surface / reach);
        }
    }
    force
}

/// One simulation step for `lane`, reading neighbours from `flies`.
///
/// Forces are steering accelerations: the weighted sum is integrated over
/// `delta_time`, speed is clamped to `max_speed`, then position integrates
/// the new velocity.
pub fn simulate_lane(
    lane: usize,
    flies: &[FlyInstance],
    obstacles: &[Obstacle],
    params: &SimParams,
) -> FlyInstance {
    let own = flies[lane];
    let position = own.position();
    let mut velocity = own.velocity();

    let neighbors = neighbor_forces(lane, flies, params.perception_radius);
    let active = (params.obstacle_count as usize).min(obstacles.len());

    let steer = neighbors.separation * params.separation_weight
        + neighbors.alignment * params.alignment_weight
        + neighbors.cohesion * params.cohesion_weight
        + seek_force(position, params.target_position()) * params.target_weight
        + bounds_force(position, params.bounds_center(), params.bounds_size()) * params.bounds_weight
        + obstacle_force(position, &obstacles[..active], params.obstacle_avoidance_radius)
            * params.obstacle_avoidance_weight
        + lane_noise(lane as u32, params.frame_index) * params.noise_strength;

    velocity += steer * params.delta_time;
    let speed = velocity.length();
    if speed > params.max_speed {
        velocity *= params.max_speed / speed;
    }
    let position = position + velocity * params.delta_time;

    let mut updated = own;
    updated.set_motion(position, velocity, params.fly_scale);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlockConfig;
    use crate::params::StepInputs;

    fn fly(x: f32, y: f32, z: f32) -> FlyInstance {
        FlyInstance::new(Vec3::new(x, y, z), Vec3::X, 0.1)
    }

    #[test]
    fn single_fly_has_no_neighbor_forces() {
        let flies = [fly(0.0, 0.0, 0.0)];
        assert_eq!(neighbor_forces(0, &flies, 10.0), NeighborForces::default());
    }

    #[test]
    fn neighbors_outside_radius_are_ignored() {
        let flies = [fly(0.0, 0.0, 0.0), fly(5.0, 0.0, 0.0)];
        assert_eq!(neighbor_forces(0, &flies, 2.0).neighbors, 0);
    }

    #[test]
    fn separation_points_away_and_cohesion_toward() {
        let flies = [fly(0.0, 0.0, 0.0), fly(1.0, 0.0, 0.0)];
        let forces = neighbor_forces(0, &flies, 2.0);
        assert_eq!(forces.neighbors, 1);
        assert!(forces.separation.x < 0.0);
        assert!(forces.cohesion.x > 0.0);
        // Same heading: nothing to align.
        assert_eq!(forces.alignment, Vec3::ZERO);
    }

    #[test]
    fn coincident_flies_are_skipped() {
        let flies = [fly(1.0, 1.0, 1.0), fly(1.0, 1.0, 1.0)];
        assert_eq!(neighbor_forces(0, &flies, 2.0).neighbors, 0);
    }

    #[test]
    fn bounds_force_is_zero_inside_and_inward_outside() {
        let half = Vec3::splat(10.0);
        assert_eq!(bounds_force(Vec3::new(9.0, -9.0, 0.0), Vec3::ZERO, half), Vec3::ZERO);
        let push = bounds_force(Vec3::new(12.0, -13.0, 0.0), Vec3::ZERO, half);
        assert_eq!(push, Vec3::new(-2.0, 3.0, 0.0));
    }

    #[test]
    fn sentinel_obstacle_exerts_nothing() {
        let force = obstacle_force(Vec3::new(0.1, 0.0, 0.0), &[Obstacle::SENTINEL], 1.5);
        assert_eq!(force, Vec3::ZERO);
    }

    #[test]
    fn obstacle_push_is_outward_and_fades_with_distance() {
        let obstacles = [Obstacle::new(Vec3::ZERO, 1.0)];
        let near = obstacle_force(Vec3::new(1.2, 0.0, 0.0), &obstacles, 1.5);
        let far = obstacle_force(Vec3::new(2.2, 0.0, 0.0), &obstacles, 1.5);
        let beyond = obstacle_force(Vec3::new(3.0, 0.0, 0.0), &obstacles, 1.5);
        assert!(near.x > far.x && far.x > 0.0);
        assert_eq!(beyond, Vec3::ZERO);
    }

    #[test]
    fn seek_is_unit_length_or_zero() {
        assert!((seek_force(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0)).length() - 1.0).abs() < 1e-6);
        assert_eq!(seek_force(Vec3::ONE, Vec3::ONE), Vec3::ZERO);
    }

    #[test]
    fn speed_is_clamped() {
        let config = FlockConfig {
            target_weight: 1000.0,
            noise_strength: 0.0,
            ..FlockConfig::default()
        };
        let params = SimParams::new(
            &config,
            1,
            StepInputs {
                delta_time: 0.1,
                target: Vec3::new(100.0, 0.0, 0.0),
                bounds_center: Vec3::ZERO,
                obstacle_count: 0,
                frame_index: 0,
            },
        );
        let flies = [fly(0.0, 0.0, 0.0)];
        let next = simulate_lane(0, &flies, &[Obstacle::SENTINEL], &params);
        assert!((next.velocity().length() - config.max_speed).abs() < 1e-4);
    }
}

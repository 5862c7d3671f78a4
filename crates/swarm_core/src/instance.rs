//! Instance store
//!
//! One [`FlyInstance`] per boid. The record layout is the GPU wire format
//! shared by both compute kernels and the draw shader.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use rand::Rng;
use tracing::info;

use crate::error::SwarmError;
use crate::math::{fly_transform, random_in_sphere};

/// Radius of the initial scatter around the emitter.
pub const SPAWN_RADIUS: f32 = 5.0;

/// Radius of the sphere initial velocities are drawn from.
pub const SPAWN_SPEED: f32 = 2.0;

/// Per-fly record, laid out to WGSL storage rules (vec3 aligned to 16).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FlyInstance {
    pub position: [f32; 3],
    _pad0: f32,
    pub velocity: [f32; 3],
    _pad1: f32,
    /// Column-major model matrix.
    pub transform: [[f32; 4]; 4],
    /// Reserved. Written as 0 and carried untouched.
    pub state: i32,
    _pad2: [i32; 3],
}

const _: () = assert!(std::mem::size_of::<FlyInstance>() == 112);
const _: () = assert!(std::mem::offset_of!(FlyInstance, position) == 0);
const _: () = assert!(std::mem::offset_of!(FlyInstance, velocity) == 16);
const _: () = assert!(std::mem::offset_of!(FlyInstance, transform) == 32);
const _: () = assert!(std::mem::offset_of!(FlyInstance, state) == 96);

impl FlyInstance {
    pub fn new(position: Vec3, velocity: Vec3, scale: f32) -> Self {
        Self {
            position: position.to_array(),
            _pad0: 0.0,
            velocity: velocity.to_array(),
            _pad1: 0.0,
            transform: fly_transform(position, velocity, scale).to_cols_array_2d(),
            state: 0,
            _pad2: [0; 3],
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        Vec3::from_array(self.velocity)
    }

    pub fn transform(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transform)
    }

    /// Replace position and velocity and rebuild the transform. `state` is kept.
    pub fn set_motion(&mut self, position: Vec3, velocity: Vec3, scale: f32) {
        self.position = position.to_array();
        self.velocity = velocity.to_array();
        self.transform = fly_transform(position, velocity, scale).to_cols_array_2d();
    }
}

/// Host copy of the canonical simulation state, uploaded once at startup.
///
/// The population is fixed once built; changing it means building a new
/// store and a new backend.
#[derive(Debug, Clone)]
pub struct InstanceStore {
    records: Vec<FlyInstance>,
}

impl InstanceStore {
    /// Scatter `population` flies inside a sphere of [`SPAWN_RADIUS`] around
    /// `origin`, each with a random velocity inside a sphere of [`SPAWN_SPEED`].
    pub fn initialize<R: Rng + ?Sized>(
        population: u32,
        origin: Vec3,
        scale: f32,
        rng: &mut R,
    ) -> Result<Self, SwarmError> {
        if population == 0 {
            return Err(SwarmError::EmptyPopulation);
        }

        let mut records = Vec::new();
        records
            .try_reserve_exact(population as usize)
            .map_err(|_| SwarmError::Allocation {
                label: "instance store",
                bytes: u64::from(population) * std::mem::size_of::<FlyInstance>() as u64,
            })?;

        for _ in 0..population {
            let position = origin + random_in_sphere(rng, SPAWN_RADIUS);
            let velocity = random_in_sphere(rng, SPAWN_SPEED);
            records.push(FlyInstance::new(position, velocity, scale));
        }

        info!(population, ?origin, "initialized instance store");
        Ok(Self { records })
    }

    /// Wrap pre-built records (tests, replays).
    pub fn from_records(records: Vec<FlyInstance>) -> Result<Self, SwarmError> {
        if records.is_empty() {
            return Err(SwarmError::EmptyPopulation);
        }
        Ok(Self { records })
    }

    pub fn population(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn records(&self) -> &[FlyInstance] {
        &self.records
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.records)
    }

    pub fn byte_size(&self) -> u64 {
        std::mem::size_of_val(self.records.as_slice()) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn initialize_produces_exact_population_within_radii() {
        let mut rng = StdRng::seed_from_u64(42);
        let origin = Vec3::new(10.0, -3.0, 2.0);
        for population in [1, 2, 63, 64, 65, 500] {
            let store = InstanceStore::initialize(population, origin, 0.1, &mut rng).unwrap();
            assert_eq!(store.population(), population);
            for fly in store.records() {
                assert!(fly.position().distance(origin) <= SPAWN_RADIUS + 1e-4);
                assert!(fly.velocity().length() <= SPAWN_SPEED + 1e-4);
                assert_eq!(fly.state, 0);
            }
        }
    }

    #[test]
    fn empty_population_is_a_construction_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = InstanceStore::initialize(0, Vec3::ZERO, 0.1, &mut rng);
        assert!(matches!(result, Err(SwarmError::EmptyPopulation)));
    }

    #[test]
    fn transform_translation_matches_position() {
        let fly = FlyInstance::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, 2.0), 0.1);
        let m = fly.transform();
        assert_eq!(m.w_axis.truncate(), fly.position());
        assert!((m.z_axis.truncate() - Vec3::new(0.0, 0.0, 0.1)).length() < 1e-6);
    }

    #[test]
    fn byte_view_is_tightly_packed() {
        let mut rng = StdRng::seed_from_u64(3);
        let store = InstanceStore::initialize(10, Vec3::ZERO, 0.1, &mut rng).unwrap();
        assert_eq!(store.as_bytes().len(), 10 * 112);
        assert_eq!(store.byte_size(), 1120);
    }
}

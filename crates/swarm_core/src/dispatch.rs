//! Fixed-size dispatch groups
//!
//! Both compute stages run 64 lanes per group. The last group may hold
//! lanes past the population; those lanes must do nothing.

/// Lanes per dispatch group. Matches `@workgroup_size` in the WGSL kernels.
pub const WORKGROUP_SIZE: u32 = 64;

/// Number of groups needed to cover `population` lanes.
#[inline]
pub const fn workgroup_count(population: u32) -> u32 {
    population.div_ceil(WORKGROUP_SIZE)
}

/// True when `lane` maps to a real instance.
#[inline]
pub const fn is_valid_lane(lane: u32, population: u32) -> bool {
    lane < population
}

/// Lanes dispatched for `population`, tail padding included.
#[inline]
pub const fn dispatched_lanes(population: u32) -> u32 {
    workgroup_count(population) * WORKGROUP_SIZE
}

//! The seam between the lifecycle manager and whatever runs the kernels

use crate::draw::DrawIndexedIndirectArgs;
use crate::error::SwarmError;
use crate::instance::InstanceStore;
use crate::obstacle::ObstacleStore;
use crate::params::{CullParams, SimParams};

/// Owner of the instance store, obstacle store, visible set and argument
/// block for one swarm.
///
/// Calls within a frame arrive in a fixed order: `upload_obstacles` (only
/// when the obstacle set changed), `simulate`, then `cull` and
/// `write_draw_args`. Implementations must finish the simulate writes
/// before `cull` reads the instances.
pub trait FlockBackend {
    /// Fixed number of instances this backend was built for.
    fn population(&self) -> u32;

    /// Replace the whole instance store. `store` must hold exactly
    /// [`population`](Self::population) records.
    fn upload_instances(&mut self, store: &InstanceStore) -> Result<(), SwarmError>;

    /// Replace the whole obstacle store.
    fn upload_obstacles(&mut self, store: &ObstacleStore) -> Result<(), SwarmError>;

    /// Run the simulation stage over every instance, in place.
    fn simulate(&mut self, params: &SimParams) -> Result<(), SwarmError>;

    /// Reset the visible set, run the visibility stage and return the
    /// number of survivors. Blocks until the count is on the host.
    fn cull(&mut self, params: &CullParams) -> Result<u32, SwarmError>;

    fn write_draw_args(&mut self, args: &DrawIndexedIndirectArgs) -> Result<(), SwarmError>;

    /// Free every resource. Safe to call repeatedly; every other method
    /// returns [`SwarmError::Released`] afterwards.
    fn release(&mut self);

    fn is_released(&self) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

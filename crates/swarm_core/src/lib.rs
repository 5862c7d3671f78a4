//! Swarm Core
//!
//! Host-side half of the GPU fly swarm:
//! - Instance and obstacle stores (the GPU wire records and how they are built)
//! - CPU reference kernels for the simulate and cull stages
//! - Indirect draw argument assembly
//! - The per-frame lifecycle manager that drives a [`FlockBackend`]

pub mod backend;
pub mod config;
pub mod cpu;
pub mod dispatch;
pub mod draw;
pub mod error;
pub mod flocking;
pub mod frustum;
pub mod gizmo;
pub mod instance;
pub mod math;
pub mod obstacle;
pub mod params;
pub mod pipeline;
pub mod time;

pub use glam;

pub use backend::FlockBackend;
pub use config::{CullingConfig, FlockConfig};
pub use cpu::CpuBackend;
pub use draw::{DrawIndexedIndirectArgs, DrawSource, DrawSubmission, MeshDescriptor};
pub use error::{ConfigError, SwarmError};
pub use instance::{FlyInstance, InstanceStore};
pub use obstacle::{Obstacle, ObstacleSource, ObstacleStore, ObstacleTracker};
pub use params::{CullParams, SimParams};
pub use pipeline::{FlockPipeline, FrameInput, FrameOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use thiserror::Error;

/// Rejected tunables. Raised before any GPU resource is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population must be at least 1")]
    EmptyPopulation,

    #[error("'{field}' must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    #[error("'{field}' must be non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("'{field}' must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}

/// Errors surfaced by the swarm pipeline and its backends.
///
/// Only construction-time failures (allocation, device, config) and
/// readback failures are errors. Per-frame conditions such as a missing
/// camera are handled inside the frame and never reach this type.
#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("population must contain at least one fly")]
    EmptyPopulation,

    #[error("population mismatch: store holds {expected} flies, got {actual}")]
    PopulationMismatch { expected: u32, actual: u32 },

    #[error("failed to allocate {bytes} bytes for '{label}'")]
    Allocation { label: &'static str, bytes: u64 },

    #[error("'{label}' needs {bytes} bytes but the device limit is {limit}")]
    BufferTooLarge {
        label: &'static str,
        bytes: u64,
        limit: u64,
    },

    #[error("no usable GPU device: {0}")]
    DeviceUnavailable(String),

    #[error("visible count readback failed: {0}")]
    Readback(String),

    #[error("backend resources were already released")]
    Released,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

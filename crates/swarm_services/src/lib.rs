//! Swarm Services Layer
//!
//! Host-side services around the pipeline: the settings file and camera input.

pub mod input;
pub mod settings;

pub use input::{DragState, OrbitCamera};
pub use settings::{SceneSettings, Settings, SettingsError, WindowSettings};

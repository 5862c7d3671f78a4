//! Flock tunables
//!
//! Every value here is an input re-read each frame, never persisted GPU
//! state. Defaults match the shipped fly swarm.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Frustum culling switch and margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    pub enabled: bool,
    /// World-space distance every frustum plane is pushed outward by.
    pub frustum_margin: f32,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frustum_margin: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    /// Number of flies. Fixed for the lifetime of a store.
    pub population: u32,

    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub perception_radius: f32,

    pub target_weight: f32,
    /// Half-extents of the containment box around the emitter.
    pub bounds_size: Vec3,
    pub bounds_weight: f32,
    pub noise_strength: f32,

    pub obstacle_avoidance_weight: f32,
    /// Reach measured from an obstacle's surface.
    pub obstacle_avoidance_radius: f32,

    pub max_speed: f32,
    /// Uniform scale baked into every fly's transform.
    pub fly_scale: f32,

    pub culling: CullingConfig,

    /// Seed for the initial scatter. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            population: 1000,
            separation_weight: 1.0,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            perception_radius: 2.0,
            target_weight: 1.0,
            bounds_size: Vec3::splat(20.0),
            bounds_weight: 2.0,
            noise_strength: 0.5,
            obstacle_avoidance_weight: 3.0,
            obstacle_avoidance_radius: 1.5,
            max_speed: 6.0,
            fly_scale: 0.1,
            culling: CullingConfig::default(),
            seed: None,
        }
    }
}

impl FlockConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population == 0 {
            return Err(ConfigError::EmptyPopulation);
        }

        for (field, value) in [
            ("separation_weight", self.separation_weight),
            ("alignment_weight", self.alignment_weight),
            ("cohesion_weight", self.cohesion_weight),
            ("target_weight", self.target_weight),
            ("bounds_weight", self.bounds_weight),
            ("obstacle_avoidance_weight", self.obstacle_avoidance_weight),
        ] {
            finite(field, value)?;
        }

        for (field, value) in [
            ("perception_radius", self.perception_radius),
            ("noise_strength", self.noise_strength),
            ("obstacle_avoidance_radius", self.obstacle_avoidance_radius),
            ("bounds_size.x", self.bounds_size.x),
            ("bounds_size.y", self.bounds_size.y),
            ("bounds_size.z", self.bounds_size.z),
            ("culling.frustum_margin", self.culling.frustum_margin),
        ] {
            non_negative(field, value)?;
        }

        for (field, value) in [("max_speed", self.max_speed), ("fly_scale", self.fly_scale)] {
            non_negative(field, value)?;
            if value == 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(FlockConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_population_is_rejected() {
        let config = FlockConfig {
            population: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyPopulation));
    }

    #[test]
    fn negative_radius_is_rejected() {
        let config = FlockConfig {
            perception_radius: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative { field: "perception_radius", .. })
        ));
    }

    #[test]
    fn nan_weight_is_rejected() {
        let config = FlockConfig {
            cohesion_weight: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { field: "cohesion_weight", .. })
        ));
    }

    #[test]
    fn zero_speed_is_rejected() {
        let config = FlockConfig {
            max_speed: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NotPositive { .. })));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: FlockConfig =
            serde_json::from_str(r#"{ "population": 64, "culling": { "enabled": false } }"#)
                .expect("parse");
        assert_eq!(config.population, 64);
        assert!(!config.culling.enabled);
        assert_eq!(config.perception_radius, 2.0);
        assert_eq!(config.bounds_size, Vec3::splat(20.0));
    }
}

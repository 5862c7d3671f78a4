//! Uniform blocks for the two compute stages
//!
//! Field order and padding follow WGSL uniform layout; the shader structs in
//! `swarm_render/shaders` declare the same fields in the same order.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::config::FlockConfig;
use crate::frustum::Frustum;

/// Per-frame inputs to the simulate stage that do not come from config.
#[derive(Debug, Clone, Copy)]
pub struct StepInputs {
    pub delta_time: f32,
    pub target: Vec3,
    pub bounds_center: Vec3,
    pub obstacle_count: u32,
    pub frame_index: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SimParams {
    pub target_position: [f32; 3],
    pub delta_time: f32,
    pub bounds_center: [f32; 3],
    pub boid_count: u32,
    pub bounds_size: [f32; 3],
    pub perception_radius: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub target_weight: f32,
    pub bounds_weight: f32,
    pub noise_strength: f32,
    pub obstacle_count: u32,
    pub obstacle_avoidance_weight: f32,
    pub obstacle_avoidance_radius: f32,
    pub max_speed: f32,
    pub fly_scale: f32,
    pub frame_index: u32,
}

const _: () = assert!(std::mem::size_of::<SimParams>() == 96);
const _: () = assert!(std::mem::offset_of!(SimParams, bounds_center) == 16);
const _: () = assert!(std::mem::offset_of!(SimParams, bounds_size) == 32);
const _: () = assert!(std::mem::offset_of!(SimParams, separation_weight) == 48);
const _: () = assert!(std::mem::offset_of!(SimParams, frame_index) == 92);

impl SimParams {
    pub fn new(config: &FlockConfig, population: u32, step: StepInputs) -> Self {
        Self {
            target_position: step.target.to_array(),
            delta_time: step.delta_time,
            bounds_center: step.bounds_center.to_array(),
            boid_count: population,
            bounds_size: config.bounds_size.to_array(),
            perception_radius: config.perception_radius,
            separation_weight: config.separation_weight,
            alignment_weight: config.alignment_weight,
            cohesion_weight: config.cohesion_weight,
            target_weight: config.target_weight,
            bounds_weight: config.bounds_weight,
            noise_strength: config.noise_strength,
            obstacle_count: step.obstacle_count,
            obstacle_avoidance_weight: config.obstacle_avoidance_weight,
            obstacle_avoidance_radius: config.obstacle_avoidance_radius,
            max_speed: config.max_speed,
            fly_scale: config.fly_scale,
            frame_index: step.frame_index,
        }
    }

    pub fn target_position(&self) -> Vec3 {
        Vec3::from_array(self.target_position)
    }

    pub fn bounds_center(&self) -> Vec3 {
        Vec3::from_array(self.bounds_center)
    }

    pub fn bounds_size(&self) -> Vec3 {
        Vec3::from_array(self.bounds_size)
    }
}

/// Visibility stage uniforms: the six normalised frustum planes
/// (`xyz` normal pointing inward, `w` distance) plus the margin.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CullParams {
    pub planes: [[f32; 4]; 6],
    pub boid_count: u32,
    pub frustum_margin: f32,
    _pad: [u32; 2],
}

const _: () = assert!(std::mem::size_of::<CullParams>() == 112);
const _: () = assert!(std::mem::offset_of!(CullParams, boid_count) == 96);

impl CullParams {
    pub fn new(view_proj: Mat4, population: u32, frustum_margin: f32) -> Self {
        let frustum = Frustum::from_view_proj(view_proj);
        Self {
            planes: frustum.planes().map(|p| p.to_array()),
            boid_count: population,
            frustum_margin,
            _pad: [0; 2],
        }
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_planes(self.planes.map(glam::Vec4::from_array))
    }
}

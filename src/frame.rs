//! Per-frame transform state

use crate::config::RendererConfig;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::f32::consts::TAU;

/// Transform uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TransformUniform {
    /// projection × view × model
    pub mvp: Mat4,
    /// Model transform, used to bring normals into world space
    pub world: Mat4,
}

impl TransformUniform {
    pub const SIZE: u64 = std::mem::size_of::<TransformUniform>() as u64;
}

/// Rotation state plus the matrices fixed at setup.
#[derive(Debug, Clone)]
pub struct FrameState {
    angle: f32,
    rotation_step: f32,
    ticks: u64,
    view: Mat4,
    projection: Mat4,
    model_base: Mat4,
}

impl FrameState {
    pub fn new(config: &RendererConfig) -> Self {
        let view = Mat4::look_at_rh(config.eye, config.target, config.up);
        let projection = Mat4::perspective_rh(config.fov_y, config.aspect, config.near, config.far);
        let model_base = Mat4::from_translation(config.model_translation)
            * Mat4::from_scale(Vec3::splat(config.model_scale));

        Self {
            angle: 0.0,
            rotation_step: config.rotation_step,
            ticks: 0,
            view,
            projection,
            model_base,
        }
    }

    /// Advance the rotation by one step, kept in `[0, 2π)`
    pub fn advance(&mut self) {
        self.angle = (self.angle + self.rotation_step).rem_euclid(TAU);
        self.ticks += 1;
    }

    /// Current rotation about +Y in radians
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Number of times [`advance`](Self::advance) ran
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn model_base(&self) -> Mat4 {
        self.model_base
    }

    /// Model base followed by the current rotation
    pub fn model(&self) -> Mat4 {
        self.model_base * Mat4::from_rotation_y(self.angle)
    }

    /// Freshly computed uniform for the current angle
    pub fn uniform(&self) -> TransformUniform {
        let world = self.model();
        TransformUniform {
            mvp: self.projection * self.view * world,
            world,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size() {
        assert_eq!(TransformUniform::SIZE, 128);
    }

    #[test]
    fn test_initial_uniform_uses_base_transform() {
        let config = RendererConfig::default();
        let state = FrameState::new(&config);
        assert_eq!(state.angle(), 0.0);

        let expected_base = Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0)) * Mat4::from_scale(Vec3::splat(80.0));
        assert!(state.model_base().abs_diff_eq(expected_base, 1e-6));

        // Scale is applied before the translation
        let origin = state.model().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-6));
        let unit = state.model().transform_point3(Vec3::X);
        assert!(unit.abs_diff_eq(Vec3::new(80.0, 0.0, 1.0), 1e-4));
    }

    #[test]
    fn test_advance_accumulates_rotation() {
        let config = RendererConfig::default().with_rotation_step(0.25);
        let mut state = FrameState::new(&config);
        for _ in 0..10 {
            state.advance();
        }
        assert_eq!(state.ticks(), 10);
        assert!((state.angle() - 2.5).abs() < 1e-5);

        let expected = state.projection()
            * state.view()
            * state.model_base()
            * Mat4::from_rotation_y(2.5);
        assert!(state.uniform().mvp.abs_diff_eq(expected, 1e-3));
    }

    #[test]
    fn test_angle_wraps() {
        let config = RendererConfig::default().with_rotation_step(std::f32::consts::PI);
        let mut state = FrameState::new(&config);
        state.advance();
        state.advance();
        state.advance();
        assert!((state.angle() - std::f32::consts::PI).abs() < 1e-5);
    }
}

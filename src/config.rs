//! Renderer configuration

use crate::assembly::StreamLayout;
use crate::backend::CullMode;
use crate::pipeline::ShadingVariant;
use glam::Vec3;

/// Configuration for setting up a [`MeshRenderer`](crate::MeshRenderer)
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Which attribute streams the shader consumes
    pub variant: ShadingVariant,
    /// Clear and test against a Depth32Float attachment
    pub depth_test: bool,
    /// One packed vertex buffer or one buffer per attribute kind
    pub stream_layout: StreamLayout,
    /// Clear color of the frame target
    pub clear_color: [f32; 4],
    /// Rotation about +Y added every tick, in radians
    pub rotation_step: f32,
    /// Model base translation, applied before `model_scale`
    pub model_translation: Vec3,
    /// Uniform scale applied to the translated model
    pub model_scale: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Color of the texture bound for primitives without a base color image
    pub fallback_color: [u8; 4],
    pub cull_mode: CullMode,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            variant: ShadingVariant::Lit,
            depth_test: true,
            stream_layout: StreamLayout::Packed,
            clear_color: [1.0, 0.5, 0.5, 1.0],
            rotation_step: std::f32::consts::PI / 180.0,
            model_translation: Vec3::new(0.0, 0.0, 1.0),
            model_scale: 80.0,
            eye: Vec3::new(0.0, 0.0, -15.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 4.0 / 3.0,
            near: 0.1,
            far: 1000.0,
            fallback_color: [255, 255, 255, 255],
            cull_mode: CullMode::Back,
        }
    }
}

impl RendererConfig {
    pub fn with_variant(mut self, variant: ShadingVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_depth_test(mut self, depth_test: bool) -> Self {
        self.depth_test = depth_test;
        self
    }

    pub fn with_stream_layout(mut self, stream_layout: StreamLayout) -> Self {
        self.stream_layout = stream_layout;
        self
    }

    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn with_rotation_step(mut self, rotation_step: f32) -> Self {
        self.rotation_step = rotation_step;
        self
    }

    pub fn with_model_base(mut self, translation: Vec3, scale: f32) -> Self {
        self.model_translation = translation;
        self.model_scale = scale;
        self
    }

    pub fn with_camera(mut self, eye: Vec3, target: Vec3, up: Vec3) -> Self {
        self.eye = eye;
        self.target = target;
        self.up = up;
        self
    }

    pub fn with_projection(mut self, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        self.fov_y = fov_y;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self
    }

    pub fn with_fallback_color(mut self, color: [u8; 4]) -> Self {
        self.fallback_color = color;
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RendererConfig::default();
        assert_eq!(config.variant, ShadingVariant::Lit);
        assert_eq!(config.stream_layout, StreamLayout::Packed);
        assert!(config.depth_test);
        assert_eq!(config.clear_color, [1.0, 0.5, 0.5, 1.0]);
        assert_eq!(config.model_scale, 80.0);
    }

    #[test]
    fn test_builders() {
        let config = RendererConfig::default()
            .with_variant(ShadingVariant::Flat)
            .with_depth_test(false)
            .with_stream_layout(StreamLayout::Separate)
            .with_rotation_step(0.5);
        assert_eq!(config.variant, ShadingVariant::Flat);
        assert!(!config.depth_test);
        assert_eq!(config.stream_layout, StreamLayout::Separate);
        assert_eq!(config.rotation_step, 0.5);
    }
}

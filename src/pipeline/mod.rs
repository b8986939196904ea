//! Mesh render pipeline
//!
//! One parameterized pipeline covers every shading variant. The variant picks
//! the shader and which attribute streams are bound to which vertex slots;
//! the consolidated buffers and the bind group layout are the same for all.

pub mod shaders;

use crate::assembly::{SAMPLER_BINDING, TEXTURE_BINDING, UNIFORM_BINDING};
use crate::asset::AttributeKind;
use crate::backend::*;

/// Shading variant selected at setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingVariant {
    /// Positions only, solid color
    Flat,
    /// Positions and UVs, base color texture
    Textured,
    /// Positions, normals and UVs, base color texture with directional lighting
    #[default]
    Lit,
}

impl ShadingVariant {
    pub const ALL: [ShadingVariant; 3] = [
        ShadingVariant::Flat,
        ShadingVariant::Textured,
        ShadingVariant::Lit,
    ];

    /// Attribute streams consumed by the shader; stream `i` is bound to
    /// vertex slot `i` and shader location `i`.
    pub fn streams(&self) -> &'static [AttributeKind] {
        match self {
            ShadingVariant::Flat => &[AttributeKind::Position],
            ShadingVariant::Textured => &[AttributeKind::Position, AttributeKind::TexCoord],
            ShadingVariant::Lit => &[
                AttributeKind::Position,
                AttributeKind::Normal,
                AttributeKind::TexCoord,
            ],
        }
    }

    pub fn shader_source(&self) -> &'static str {
        match self {
            ShadingVariant::Flat => shaders::FLAT_SHADER,
            ShadingVariant::Textured => shaders::TEXTURED_SHADER,
            ShadingVariant::Lit => shaders::LIT_SHADER,
        }
    }

    /// One non-interleaved layout per stream
    pub fn vertex_layouts(&self) -> Vec<VertexBufferLayout> {
        self.streams()
            .iter()
            .enumerate()
            .map(|(location, kind)| {
                let format = match kind {
                    AttributeKind::TexCoord => VertexFormat::Float32x2,
                    _ => VertexFormat::Float32x3,
                };
                VertexBufferLayout::single(location as u32, format)
            })
            .collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShadingVariant::Flat => "flat",
            ShadingVariant::Textured => "textured",
            ShadingVariant::Lit => "lit",
        }
    }
}

impl std::str::FromStr for ShadingVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(ShadingVariant::Flat),
            "textured" => Ok(ShadingVariant::Textured),
            "lit" => Ok(ShadingVariant::Lit),
            other => Err(format!("unknown shading variant '{}'", other)),
        }
    }
}

/// Depth attachment format used when depth testing is on
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Layout of the per-primitive bind group: transform uniform, sampler and
/// base color texture
pub fn bind_group_layout_entries() -> [BindGroupLayoutEntry; 3] {
    [
        BindGroupLayoutEntry {
            binding: UNIFORM_BINDING,
            visibility: ShaderStageFlags::VERTEX_FRAGMENT,
            ty: BindingType::UniformBuffer,
        },
        BindGroupLayoutEntry {
            binding: SAMPLER_BINDING,
            visibility: ShaderStageFlags::FRAGMENT,
            ty: BindingType::Sampler { filtering: true },
        },
        BindGroupLayoutEntry {
            binding: TEXTURE_BINDING,
            visibility: ShaderStageFlags::FRAGMENT,
            ty: BindingType::Texture { filterable: true },
        },
    ]
}

/// Pipeline state fixed at setup
#[derive(Debug, Clone, Copy)]
pub struct MeshPipelineConfig {
    pub variant: ShadingVariant,
    pub color_format: TextureFormat,
    pub depth_test: bool,
    pub cull_mode: CullMode,
}

impl MeshPipelineConfig {
    pub fn descriptor(&self, layout: BindGroupLayoutHandle) -> RenderPipelineDescriptor {
        RenderPipelineDescriptor {
            label: Some(format!("Mesh Pipeline ({})", self.variant.name())),
            shader: self.variant.shader_source().to_string(),
            vertex_layouts: self.variant.vertex_layouts(),
            bind_group_layouts: vec![layout],
            primitive_topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            cull_mode: self.cull_mode,
            depth_stencil: self.depth_test.then_some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
            }),
            color_format: self.color_format,
        }
    }
}

/// Create the bind group layout and the pipeline for `config`
pub fn create_mesh_pipeline<B: GraphicsBackend>(
    backend: &mut B,
    config: &MeshPipelineConfig,
) -> BackendResult<(BindGroupLayoutHandle, RenderPipelineHandle)> {
    let layout = backend.create_bind_group_layout(&bind_group_layout_entries())?;
    let pipeline = backend.create_render_pipeline(&config.descriptor(layout))?;
    log::debug!(
        "Created {} mesh pipeline (depth test: {}, cull: {:?})",
        config.variant.name(),
        config.depth_test,
        config.cull_mode
    );
    Ok((layout, pipeline))
}

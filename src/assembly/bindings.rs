use crate::asset::Asset;
use crate::backend::*;
use crate::error::SetupError;
use crate::resources::{GpuTexture, TextureData};
use std::collections::HashMap;
use std::sync::Arc;

/// Binding slots shared by every mesh bind group
pub const UNIFORM_BINDING: u32 = 0;
pub const SAMPLER_BINDING: u32 = 1;
pub const TEXTURE_BINDING: u32 = 2;

/// Sampler, textures and one bind group per primitive.
#[derive(Debug, Clone)]
pub struct BindingSets {
    pub sampler: SamplerHandle,
    /// Texture bound for primitives without a base color image
    pub fallback: GpuTexture,
    /// Uploaded base color images, one per distinct image
    pub textures: Vec<GpuTexture>,
    /// Bind group of each primitive, in primitive order
    pub bind_groups: Vec<BindGroupHandle>,
    /// Primitives that fell back to the neutral texture
    pub fallback_count: usize,
}

impl BindingSets {
    pub fn destroy<B: GraphicsBackend>(&self, backend: &mut B) {
        backend.destroy_texture(self.fallback.handle);
        for texture in &self.textures {
            backend.destroy_texture(texture.handle);
        }
    }
}

/// Upload textures and create one bind group per primitive, each combining
/// the shared transform uniform, the shared sampler and the primitive's
/// base color view (or the fallback view).
///
/// Primitives sharing an image share its upload but still get their own
/// bind group. Textures uploaded before a failure are destroyed.
pub fn build_bindings<B: GraphicsBackend>(
    backend: &mut B,
    asset: &Asset,
    layout: BindGroupLayoutHandle,
    uniform_buffer: BufferHandle,
    fallback_color: [u8; 4],
) -> Result<BindingSets, SetupError> {
    let sampler = backend.create_sampler(&SamplerDescriptor::repeat_linear("Mesh Sampler"))?;
    let fallback = GpuTexture::create(backend, &TextureData::solid_color(fallback_color, "fallback"))?;

    let mut sets = BindingSets {
        sampler,
        fallback,
        textures: Vec::new(),
        bind_groups: Vec::with_capacity(asset.primitive_count()),
        fallback_count: 0,
    };
    if let Err(e) = bind_primitives(backend, asset, layout, uniform_buffer, &mut sets) {
        sets.destroy(backend);
        return Err(e);
    }
    Ok(sets)
}

fn bind_primitives<B: GraphicsBackend>(
    backend: &mut B,
    asset: &Asset,
    layout: BindGroupLayoutHandle,
    uniform_buffer: BufferHandle,
    sets: &mut BindingSets,
) -> Result<(), SetupError> {
    let mut uploaded: HashMap<*const TextureData, usize> = HashMap::new();

    for (index, primitive) in asset.primitives().enumerate() {
        let view = match primitive.base_color_texture() {
            Some(image) => {
                let key = Arc::as_ptr(image);
                let slot = match uploaded.get(&key) {
                    Some(slot) => *slot,
                    None => {
                        log::debug!(
                            "Uploading base color '{}' ({}x{})",
                            image.name,
                            image.width,
                            image.height
                        );
                        sets.textures.push(GpuTexture::create(backend, image)?);
                        uploaded.insert(key, sets.textures.len() - 1);
                        sets.textures.len() - 1
                    }
                };
                sets.textures[slot].view
            }
            None => {
                log::debug!("Primitive {} has no base color texture, using fallback", index);
                sets.fallback_count += 1;
                sets.fallback.view
            }
        };

        let bind_group = backend.create_bind_group(
            layout,
            &[
                (
                    UNIFORM_BINDING,
                    BindGroupEntry::Buffer {
                        buffer: uniform_buffer,
                        offset: 0,
                        size: None,
                    },
                ),
                (SAMPLER_BINDING, BindGroupEntry::Sampler(sets.sampler)),
                (TEXTURE_BINDING, BindGroupEntry::Texture(view)),
            ],
        )?;
        sets.bind_groups.push(bind_group);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{shapes, Accessor, Material, Primitive};
    use crate::backend::recording::RecordingBackend;
    use crate::pipeline;

    fn setup(backend: &mut RecordingBackend) -> (BindGroupLayoutHandle, BufferHandle) {
        let layout = backend
            .create_bind_group_layout(&pipeline::bind_group_layout_entries())
            .unwrap();
        let uniform = backend
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 128,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            })
            .unwrap();
        (layout, uniform)
    }

    fn bound_view(backend: &RecordingBackend, bind_group: BindGroupHandle) -> TextureViewHandle {
        let recorded = backend.bind_group(bind_group).unwrap();
        match recorded.entries.iter().find(|(binding, _)| *binding == TEXTURE_BINDING) {
            Some((_, BindGroupEntry::Texture(view))) => *view,
            other => panic!("unexpected texture entry {:?}", other),
        }
    }

    #[test]
    fn test_one_bind_group_per_primitive() {
        let mut backend = RecordingBackend::new(4, 4);
        let (layout, uniform) = setup(&mut backend);
        let asset = shapes::quad_and_triangle();

        let sets = build_bindings(&mut backend, &asset, layout, uniform, [255; 4]).unwrap();
        assert_eq!(sets.bind_groups.len(), 2);
        assert_eq!(sets.textures.len(), 1);
        assert_eq!(sets.fallback_count, 1);

        assert_eq!(bound_view(&backend, sets.bind_groups[0]), sets.textures[0].view);
        assert_eq!(bound_view(&backend, sets.bind_groups[1]), sets.fallback.view);

        let recorded = backend.bind_group(sets.bind_groups[1]).unwrap();
        assert_eq!(recorded.layout, layout);
        assert_eq!(
            recorded.entries[0],
            (
                UNIFORM_BINDING,
                BindGroupEntry::Buffer {
                    buffer: uniform,
                    offset: 0,
                    size: None
                }
            )
        );
    }

    #[test]
    fn test_shared_image_uploaded_once() {
        let mut backend = RecordingBackend::new(4, 4);
        let (layout, uniform) = setup(&mut backend);

        let image = Arc::new(TextureData::checkerboard(8, [0, 0, 0, 255], [255; 4]));
        let material = Arc::new(Material::textured("shared", image));
        let primitive = || {
            Primitive::new(
                Accessor::from_vec3(&[[0.0; 3]; 3]),
                Accessor::from_u16(&[0, 1, 2]),
            )
            .with_material(material.clone())
        };
        let asset = Asset::single_mesh("shared", vec![primitive(), primitive(), primitive()]);

        let sets = build_bindings(&mut backend, &asset, layout, uniform, [255; 4]).unwrap();
        assert_eq!(sets.textures.len(), 1);
        assert_eq!(sets.bind_groups.len(), 3);
        assert_ne!(sets.bind_groups[0], sets.bind_groups[1]);
        for bind_group in &sets.bind_groups {
            assert_eq!(bound_view(&backend, *bind_group), sets.textures[0].view);
        }
        // fallback + shared image
        assert_eq!(backend.texture_count(), 2);
    }

    #[test]
    fn test_fallback_color() {
        let mut backend = RecordingBackend::new(4, 4);
        let (layout, uniform) = setup(&mut backend);
        let sets = build_bindings(&mut backend, &Asset::default(), layout, uniform, [10, 20, 30, 40]).unwrap();

        assert!(sets.bind_groups.is_empty());
        let texture = backend.texture(sets.fallback.handle).unwrap();
        assert_eq!(texture.data, vec![10, 20, 30, 40]);
    }
}

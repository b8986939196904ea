//! glTF 2.0 (.gltf / .glb) adapter
//!
//! Produces an [`Asset`] from a glTF document. Tightly packed `f32` position,
//! normal and UV accessors and `u16` index accessors are referenced straight
//! from the document's buffers; anything strided, sparse or of another
//! component type is repacked. Only `TEXCOORD_0` is exposed.
//!
//! Images held in buffer views, or stored as files next to a `.gltf`, are
//! decoded to RGBA8. Data-URI images are rejected.

use super::{Accessor, Asset, ByteView, Material, Mesh, Node, Primitive};
use crate::resources::TextureData;
use gltf_dep::accessor::{DataType, Dimensions};
use gltf_dep::Semantic;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during glTF loading.
#[derive(Error, Debug)]
pub enum GltfLoadError {
    #[error("glTF import error: {0}")]
    Import(#[from] gltf_dep::Error),
    #[error("mesh {mesh} primitive {primitive} has no POSITION attribute")]
    MissingPositions { mesh: usize, primitive: usize },
    #[error("mesh {mesh} primitive {primitive} has no indices")]
    MissingIndices { mesh: usize, primitive: usize },
    #[error("mesh {mesh} primitive {primitive}: index {value} does not fit in 16 bits")]
    IndexTooLarge {
        mesh: usize,
        primitive: usize,
        value: u32,
    },
    #[error("image {image}: buffer view lies outside its buffer")]
    ImageViewOutOfBounds { image: usize },
    #[error("image {image}: cannot resolve URI '{uri}'")]
    UnsupportedImageUri { image: usize, uri: String },
    #[error("image {image}: {reason}")]
    ImageDecode { image: usize, reason: String },
}

/// Load a glTF file. External buffers and images are resolved relative to
/// the file's directory.
pub fn load_gltf<P: AsRef<Path>>(path: P) -> Result<Asset, GltfLoadError> {
    let path = path.as_ref();
    let gltf_dep::Gltf { document, blob } = gltf_dep::Gltf::open(path)?;
    let base = path.parent();
    let buffers = gltf_dep::import_buffers(&document, base, blob)?;
    log::debug!("Imported glTF '{}'", path.display());
    build_asset(&document, buffers, base)
}

/// Load a self-contained glTF document (typically a .glb) from memory.
pub fn load_gltf_slice(bytes: &[u8]) -> Result<Asset, GltfLoadError> {
    let gltf_dep::Gltf { document, blob } = gltf_dep::Gltf::from_slice(bytes)?;
    let buffers = gltf_dep::import_buffers(&document, None, blob)?;
    build_asset(&document, buffers, None)
}

fn build_asset(
    document: &gltf_dep::Document,
    buffers: Vec<gltf_dep::buffer::Data>,
    base: Option<&Path>,
) -> Result<Asset, GltfLoadError> {
    let buffers: Vec<Arc<[u8]>> = buffers.into_iter().map(|data| Arc::from(data.0)).collect();

    let textures = document
        .images()
        .map(|image| load_image(&image, &buffers, base).map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;

    // Primitives referencing the same material share one Arc, and with it
    // one texture upload
    let materials: Vec<Arc<Material>> = document
        .materials()
        .map(|material| {
            let base_color_texture = material
                .pbr_metallic_roughness()
                .base_color_texture()
                .and_then(|info| textures.get(info.texture().source().index()).cloned());
            Arc::new(Material {
                name: material.name().map(str::to_string),
                base_color_texture,
            })
        })
        .collect();

    let mut nodes = Vec::new();
    for node in document.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };

        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            primitives.push(convert_primitive(&mesh, &primitive, &buffers, &materials)?);
        }

        let name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", node.index()));
        log::debug!(
            "Loaded node '{}' (mesh {}) with {} primitives",
            name,
            mesh.index(),
            primitives.len()
        );
        if node.transform().matrix() != IDENTITY {
            log::debug!("Node '{}' transform is ignored", name);
        }

        nodes.push(Node {
            name,
            mesh: Mesh {
                name: mesh.name().map(str::to_string),
                primitives,
            },
        });
    }

    Ok(Asset::new(nodes))
}

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

fn convert_primitive(
    mesh: &gltf_dep::Mesh,
    primitive: &gltf_dep::Primitive,
    buffers: &[Arc<[u8]>],
    materials: &[Arc<Material>],
) -> Result<Primitive, GltfLoadError> {
    let mesh_index = mesh.index();
    let primitive_index = primitive.index();
    if primitive.mode() != gltf_dep::mesh::Mode::Triangles {
        log::warn!(
            "Mesh {} primitive {} uses {:?}, drawing it as a triangle list",
            mesh_index,
            primitive_index,
            primitive.mode()
        );
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data[..]));

    let positions = match primitive.get(&Semantic::Positions) {
        Some(accessor) => match borrow_accessor(&accessor, DataType::F32, Dimensions::Vec3, buffers) {
            Some(borrowed) => borrowed,
            None => {
                let values: Vec<[f32; 3]> = reader
                    .read_positions()
                    .map(|iter| iter.collect())
                    .unwrap_or_default();
                Accessor::from_vec3(&values)
            }
        },
        None => {
            return Err(GltfLoadError::MissingPositions {
                mesh: mesh_index,
                primitive: primitive_index,
            })
        }
    };

    let normals = primitive.get(&Semantic::Normals).map(|accessor| {
        borrow_accessor(&accessor, DataType::F32, Dimensions::Vec3, buffers).unwrap_or_else(|| {
            let values: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();
            Accessor::from_vec3(&values)
        })
    });

    let texcoords: Vec<Accessor> = primitive
        .get(&Semantic::TexCoords(0))
        .map(|accessor| {
            borrow_accessor(&accessor, DataType::F32, Dimensions::Vec2, buffers).unwrap_or_else(|| {
                let values: Vec<[f32; 2]> = reader
                    .read_tex_coords(0)
                    .map(|tc| tc.into_f32().collect())
                    .unwrap_or_default();
                Accessor::from_vec2(&values)
            })
        })
        .into_iter()
        .collect();

    let indices = match primitive.indices() {
        Some(accessor) => match borrow_accessor(&accessor, DataType::U16, Dimensions::Scalar, buffers) {
            Some(borrowed) => borrowed,
            None => {
                let wide: Vec<u32> = reader
                    .read_indices()
                    .map(|idx| idx.into_u32().collect())
                    .unwrap_or_default();
                let mut narrow = Vec::with_capacity(wide.len());
                for value in wide {
                    let index = u16::try_from(value).map_err(|_| GltfLoadError::IndexTooLarge {
                        mesh: mesh_index,
                        primitive: primitive_index,
                        value,
                    })?;
                    narrow.push(index);
                }
                Accessor::from_u16(&narrow)
            }
        },
        None => {
            return Err(GltfLoadError::MissingIndices {
                mesh: mesh_index,
                primitive: primitive_index,
            })
        }
    };

    let material = primitive
        .material()
        .index()
        .and_then(|index| materials.get(index).cloned());

    Ok(Primitive {
        positions,
        normals,
        texcoords,
        indices,
        material,
    })
}

/// Reference an accessor's bytes in place when they are already laid out as
/// tightly packed elements of the wanted type.
fn borrow_accessor(
    accessor: &gltf_dep::Accessor,
    data_type: DataType,
    dimensions: Dimensions,
    buffers: &[Arc<[u8]>],
) -> Option<Accessor> {
    if accessor.data_type() != data_type
        || accessor.dimensions() != dimensions
        || accessor.normalized()
        || accessor.sparse().is_some()
    {
        return None;
    }

    let view = accessor.view()?;
    let element_size = accessor.size();
    if view.stride().is_some_and(|stride| stride != element_size) {
        return None;
    }

    let buffer = buffers.get(view.buffer().index())?;
    let length = accessor.count() * element_size;
    let offset = view.offset() + accessor.offset();
    if offset + length > view.offset() + view.length() {
        return None;
    }

    Some(Accessor::new(
        accessor.count(),
        ByteView::new(buffer.clone(), offset, length),
    ))
}

/// Decode an image embedded in a buffer view or stored next to the document.
fn load_image(
    image: &gltf_dep::Image,
    buffers: &[Arc<[u8]>],
    base: Option<&Path>,
) -> Result<TextureData, GltfLoadError> {
    use gltf_dep::image::Source;

    let index = image.index();
    let name = image
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("image{}", index));

    let decoded = match image.source() {
        Source::View { view, .. } => {
            let bytes = buffers
                .get(view.buffer().index())
                .and_then(|buffer| buffer.get(view.offset()..view.offset() + view.length()))
                .ok_or(GltfLoadError::ImageViewOutOfBounds { image: index })?;
            TextureData::from_bytes(bytes, &name)
        }
        Source::Uri { uri, .. } => match base {
            Some(base) if !uri.starts_with("data:") => TextureData::from_file(base.join(uri)),
            _ => {
                return Err(GltfLoadError::UnsupportedImageUri {
                    image: index,
                    uri: uri.chars().take(64).collect(),
                })
            }
        },
    };

    let texture = decoded.map_err(|e| GltfLoadError::ImageDecode {
        image: index,
        reason: e.to_string(),
    })?;
    log::debug!("Decoded glTF image {} ({}x{})", index, texture.width, texture.height);
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Positions, normals and indices of one triangle, padded to 80 bytes.
    fn triangle_bin() -> Vec<u8> {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals: [[f32; 3]; 3] = [[0.0, 0.0, 1.0]; 3];
        let indices: [u16; 3] = [0, 1, 2];

        let mut bin = Vec::new();
        bin.extend_from_slice(bytemuck::cast_slice(&positions));
        bin.extend_from_slice(bytemuck::cast_slice(&normals));
        bin.extend_from_slice(bytemuck::cast_slice(&indices));
        pad(&mut bin, 0);
        bin
    }

    fn pad(bytes: &mut Vec<u8>, fill: u8) {
        while bytes.len() % 4 != 0 {
            bytes.push(fill);
        }
    }

    fn png(width: u32, height: u32, rgb: &[u8]) -> Vec<u8> {
        let image = image::RgbImage::from_raw(width, height, rgb.to_vec()).unwrap();
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    /// Triangle document. `buffer` is the JSON of the single buffer,
    /// `image` the JSON of an optional base color image.
    fn triangle_json(buffer: &str, extra_views: &str, image: Option<&str>) -> String {
        let (material, textures) = match image {
            Some(image) => (
                r#","material":0"#.to_string(),
                format!(
                    r#","materials":[{{"pbrMetallicRoughness":{{"baseColorTexture":{{"index":0}}}}}}],"textures":[{{"source":0}}],"images":[{image}]"#
                ),
            ),
            None => (String::new(), String::new()),
        };
        format!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],
"nodes":[{{"name":"tri","mesh":0}}],
"meshes":[{{"primitives":[{{"attributes":{{"POSITION":0,"NORMAL":1}},"indices":2{material}}}]}}],
"buffers":[{buffer}],
"bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":36}},{{"buffer":0,"byteOffset":36,"byteLength":36}},{{"buffer":0,"byteOffset":72,"byteLength":6}}{extra_views}],
"accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[1,1,0]}},{{"bufferView":1,"componentType":5126,"count":3,"type":"VEC3"}},{{"bufferView":2,"componentType":5123,"count":3,"type":"SCALAR"}}]{textures}}}"#
        )
    }

    fn glb(json: String, bin: &[u8]) -> Vec<u8> {
        let mut json = json.into_bytes();
        pad(&mut json, b' ');

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(bin);
        glb
    }

    /// Triangle .glb whose base color image bytes live in a fourth buffer view.
    fn textured_glb(image_bytes: &[u8]) -> Vec<u8> {
        let mut bin = triangle_bin();
        let image_offset = bin.len();
        bin.extend_from_slice(image_bytes);
        pad(&mut bin, 0);

        let json = triangle_json(
            &format!(r#"{{"byteLength":{}}}"#, bin.len()),
            &format!(
                r#",{{"buffer":0,"byteOffset":{},"byteLength":{}}}"#,
                image_offset,
                image_bytes.len()
            ),
            Some(r#"{"bufferView":3,"mimeType":"image/png"}"#),
        );
        glb(json, &bin)
    }

    #[test]
    fn test_load_triangle_glb() {
        let bin = triangle_bin();
        let json = triangle_json(&format!(r#"{{"byteLength":{}}}"#, bin.len()), "", None);
        let asset = load_gltf_slice(&glb(json, &bin)).unwrap();
        assert_eq!(asset.nodes.len(), 1);
        assert_eq!(asset.nodes[0].name, "tri");

        let primitive = asset.primitives().next().unwrap();
        assert_eq!(primitive.vertex_count(), 3);
        assert_eq!(primitive.index_count(), 3);
        assert!(primitive.texcoords.is_empty());
        assert!(primitive.material.is_none());

        // Tightly packed accessors point into the shared binary chunk
        assert_eq!(primitive.positions.view.offset(), 0);
        assert_eq!(primitive.normals.as_ref().unwrap().view.offset(), 36);
        assert_eq!(primitive.indices.view.offset(), 72);
        assert_eq!(primitive.indices.bytes().unwrap(), &[0, 0, 1, 0, 2, 0]);
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(
            load_gltf_slice(b"not a gltf file"),
            Err(GltfLoadError::Import(_))
        ));
    }

    #[test]
    fn test_embedded_image_decoded_to_rgba() {
        let asset = load_gltf_slice(&textured_glb(&png(2, 1, &[10, 20, 30, 40, 50, 60]))).unwrap();

        let texture = asset.primitives().next().unwrap().base_color_texture().unwrap();
        assert_eq!((texture.width, texture.height), (2, 1));
        assert_eq!(texture.data, vec![10, 20, 30, 255, 40, 50, 60, 255]);
        assert_eq!(texture.name, "image0");
    }

    #[test]
    fn test_undecodable_embedded_image() {
        let result = load_gltf_slice(&textured_glb(&[0xde, 0xad, 0xbe, 0xef]));
        assert!(matches!(result, Err(GltfLoadError::ImageDecode { image: 0, .. })));
    }

    #[test]
    fn test_external_files_resolved_beside_document() {
        let dir = std::env::temp_dir().join(format!("mesh-multidraw-gltf-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let bin = triangle_bin();
        std::fs::write(dir.join("tri.bin"), &bin).unwrap();
        std::fs::write(dir.join("checker.png"), png(1, 2, &[1, 2, 3, 4, 5, 6])).unwrap();
        let json = triangle_json(
            &format!(r#"{{"uri":"tri.bin","byteLength":{}}}"#, bin.len()),
            "",
            Some(r#"{"uri":"checker.png"}"#),
        );
        std::fs::write(dir.join("scene.gltf"), json).unwrap();

        let asset = load_gltf(dir.join("scene.gltf")).unwrap();
        let texture = asset.primitives().next().unwrap().base_color_texture().unwrap();
        assert_eq!(texture.name, "checker.png");
        assert_eq!(texture.data, vec![1, 2, 3, 255, 4, 5, 6, 255]);

        // The same document read from memory has no directory to resolve against
        let bytes = std::fs::read(dir.join("scene.gltf")).unwrap();
        assert!(load_gltf_slice(&bytes).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

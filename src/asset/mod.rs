//! Mesh asset data model
//!
//! An [`Asset`] is what a container parser hands to the renderer: nodes with
//! one mesh each, meshes made of primitives, and primitives whose attributes
//! are accessors into shared byte stores. Assets are read-only here; assembly
//! only copies out of them.

#[cfg(feature = "gltf")]
pub mod gltf;
pub mod shapes;

use crate::resources::TextureData;
use std::fmt;
use std::sync::Arc;

/// Kind of vertex or index attribute, with its fixed element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Position,
    Normal,
    TexCoord,
    Index,
}

impl AttributeKind {
    /// Bytes per element: 3×f32 for positions and normals, 2×f32 for
    /// texture coordinates, u16 for indices.
    pub const fn element_size(&self) -> u64 {
        match self {
            AttributeKind::Position => 12,
            AttributeKind::Normal => 12,
            AttributeKind::TexCoord => 8,
            AttributeKind::Index => 2,
        }
    }

    /// The three vertex attribute kinds in buffer order
    pub const VERTEX: [AttributeKind; 3] = [
        AttributeKind::Position,
        AttributeKind::Normal,
        AttributeKind::TexCoord,
    ];
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::Position => "position",
            AttributeKind::Normal => "normal",
            AttributeKind::TexCoord => "texcoord",
            AttributeKind::Index => "index",
        };
        f.write_str(name)
    }
}

/// A window (`offset`, `length`) into a shared byte store.
#[derive(Clone)]
pub struct ByteView {
    buffer: Arc<[u8]>,
    offset: usize,
    length: usize,
}

impl ByteView {
    pub fn new(buffer: Arc<[u8]>, offset: usize, length: usize) -> Self {
        Self {
            buffer,
            offset,
            length,
        }
    }

    /// View covering all of `bytes`
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let length = bytes.len();
        Self::new(bytes.into(), 0, length)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Size of the backing store
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// The viewed bytes, or `None` when the window reaches past the store.
    pub fn bytes(&self) -> Option<&[u8]> {
        let end = self.offset.checked_add(self.length)?;
        self.buffer.get(self.offset..end)
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("buffer_len", &self.buffer.len())
            .finish()
    }
}

/// Element count plus the bytes holding the elements.
#[derive(Debug, Clone)]
pub struct Accessor {
    pub count: usize,
    pub view: ByteView,
}

impl Accessor {
    pub fn new(count: usize, view: ByteView) -> Self {
        Self { count, view }
    }

    /// Accessor over freshly packed `[f32; 3]` elements
    pub fn from_vec3(values: &[[f32; 3]]) -> Self {
        Self::new(
            values.len(),
            ByteView::from_vec(bytemuck::cast_slice(values).to_vec()),
        )
    }

    /// Accessor over freshly packed `[f32; 2]` elements
    pub fn from_vec2(values: &[[f32; 2]]) -> Self {
        Self::new(
            values.len(),
            ByteView::from_vec(bytemuck::cast_slice(values).to_vec()),
        )
    }

    /// Accessor over freshly packed 16-bit indices
    pub fn from_u16(values: &[u16]) -> Self {
        Self::new(
            values.len(),
            ByteView::from_vec(bytemuck::cast_slice(values).to_vec()),
        )
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.view.bytes()
    }
}

/// Surface description of a primitive.
#[derive(Debug, Clone, Default)]
pub struct Material {
    pub name: Option<String>,
    /// Decoded base color image, ready for upload
    pub base_color_texture: Option<Arc<TextureData>>,
}

impl Material {
    pub fn textured(name: &str, texture: Arc<TextureData>) -> Self {
        Self {
            name: Some(name.to_string()),
            base_color_texture: Some(texture),
        }
    }
}

/// One indexed triangle list with its attributes.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub positions: Accessor,
    pub normals: Option<Accessor>,
    /// Texture coordinate sets; every set is copied into the UV stream
    pub texcoords: Vec<Accessor>,
    pub indices: Accessor,
    pub material: Option<Arc<Material>>,
}

impl Primitive {
    pub fn new(positions: Accessor, indices: Accessor) -> Self {
        Self {
            positions,
            normals: None,
            texcoords: Vec::new(),
            indices,
            material: None,
        }
    }

    pub fn with_normals(mut self, normals: Accessor) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_texcoords(mut self, texcoords: Accessor) -> Self {
        self.texcoords.push(texcoords);
        self
    }

    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.count
    }

    pub fn index_count(&self) -> usize {
        self.indices.count
    }

    /// Base color image of the material, if any
    pub fn base_color_texture(&self) -> Option<&Arc<TextureData>> {
        self.material
            .as_ref()
            .and_then(|m| m.base_color_texture.as_ref())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

/// A named node carrying one mesh. Node transforms are not applied.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub mesh: Mesh,
}

/// Ordered list of mesh nodes.
#[derive(Debug, Clone, Default)]
pub struct Asset {
    pub nodes: Vec<Node>,
}

impl Asset {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Asset with a single node holding `primitives`
    pub fn single_mesh(name: &str, primitives: Vec<Primitive>) -> Self {
        Self::new(vec![Node {
            name: name.to_string(),
            mesh: Mesh {
                name: Some(name.to_string()),
                primitives,
            },
        }])
    }

    /// All primitives, nodes outer and primitives inner. Every assembly
    /// stage walks the asset in this order.
    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> + '_ {
        self.nodes.iter().flat_map(|node| node.mesh.primitives.iter())
    }

    pub fn primitive_count(&self) -> usize {
        self.nodes.iter().map(|n| n.mesh.primitives.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_view_bounds() {
        let store: Arc<[u8]> = vec![1u8, 2, 3, 4, 5, 6].into();
        let inside = ByteView::new(store.clone(), 2, 3);
        assert_eq!(inside.bytes(), Some(&[3u8, 4, 5][..]));

        let outside = ByteView::new(store.clone(), 4, 3);
        assert_eq!(outside.bytes(), None);

        let overflowing = ByteView::new(store, usize::MAX, 2);
        assert_eq!(overflowing.bytes(), None);
    }

    #[test]
    fn test_accessor_packing() {
        let positions = Accessor::from_vec3(&[[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        assert_eq!(positions.count, 2);
        assert_eq!(positions.view.len(), 24);

        let indices = Accessor::from_u16(&[0, 1, 2]);
        assert_eq!(indices.view.len(), 6);
        assert_eq!(indices.bytes().unwrap(), &[0, 0, 1, 0, 2, 0]);
    }

    #[test]
    fn test_primitive_order_is_node_then_primitive() {
        let prim = |n: usize| {
            let positions: Vec<[f32; 3]> = vec![[0.0; 3]; n];
            Primitive::new(Accessor::from_vec3(&positions), Accessor::from_u16(&[0]))
        };
        let asset = Asset::new(vec![
            Node {
                name: "a".into(),
                mesh: Mesh {
                    name: None,
                    primitives: vec![prim(1), prim(2)],
                },
            },
            Node {
                name: "b".into(),
                mesh: Mesh {
                    name: None,
                    primitives: vec![prim(3)],
                },
            },
        ]);

        let counts: Vec<usize> = asset.primitives().map(|p| p.vertex_count()).collect();
        assert_eq!(counts, vec![1, 2, 3]);
        assert_eq!(asset.primitive_count(), 3);
    }

    #[test]
    fn test_attribute_kind_sizes() {
        assert_eq!(AttributeKind::Position.element_size(), 12);
        assert_eq!(AttributeKind::Normal.element_size(), 12);
        assert_eq!(AttributeKind::TexCoord.element_size(), 8);
        assert_eq!(AttributeKind::Index.element_size(), 2);
    }
}

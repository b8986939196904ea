//! Built-in assets that don't need a container file

use super::{Accessor, Asset, Material, Node, Mesh, Primitive};
use crate::resources::TextureData;
use glam::{Vec2, Vec3};
use std::sync::Arc;

fn checker_material() -> Arc<Material> {
    let texture = TextureData::checkerboard(64, [240, 240, 240, 255], [40, 90, 200, 255]);
    Arc::new(Material::textured("checker", Arc::new(texture)))
}

fn vec3s(values: &[Vec3]) -> Accessor {
    let packed: Vec<[f32; 3]> = values.iter().map(|v| v.to_array()).collect();
    Accessor::from_vec3(&packed)
}

fn vec2s(values: &[Vec2]) -> Accessor {
    let packed: Vec<[f32; 2]> = values.iter().map(|v| v.to_array()).collect();
    Accessor::from_vec2(&packed)
}

/// Single triangle with positions only
pub fn triangle() -> Asset {
    let positions = [
        Vec3::new(0.0, 0.5, 0.0),
        Vec3::new(-0.5, -0.5, 0.0),
        Vec3::new(0.5, -0.5, 0.0),
    ];
    Asset::single_mesh(
        "triangle",
        vec![Primitive::new(vec3s(&positions), Accessor::from_u16(&[0, 1, 2]))],
    )
}

/// Unit cube with one primitive per face. Faces alternate between a shared
/// checkerboard material and no material.
pub fn cube() -> Asset {
    // (normal, four corners counter-clockwise seen from outside)
    let faces = [
        (Vec3::Z, [
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(-0.5, 0.5, 0.5),
        ]),
        (-Vec3::Z, [
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(-0.5, 0.5, -0.5),
            Vec3::new(0.5, 0.5, -0.5),
        ]),
        (Vec3::X, [
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(0.5, 0.5, -0.5),
            Vec3::new(0.5, 0.5, 0.5),
        ]),
        (-Vec3::X, [
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(-0.5, 0.5, 0.5),
            Vec3::new(-0.5, 0.5, -0.5),
        ]),
        (Vec3::Y, [
            Vec3::new(-0.5, 0.5, 0.5),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(0.5, 0.5, -0.5),
            Vec3::new(-0.5, 0.5, -0.5),
        ]),
        (-Vec3::Y, [
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(-0.5, -0.5, 0.5),
        ]),
    ];
    let uvs = [
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 0.0),
    ];

    let material = checker_material();
    let primitives = faces
        .iter()
        .enumerate()
        .map(|(face, (normal, corners))| {
            let primitive = Primitive::new(vec3s(corners), Accessor::from_u16(&[0, 1, 2, 0, 2, 3]))
                .with_normals(vec3s(&[*normal; 4]))
                .with_texcoords(vec2s(&uvs));
            if face % 2 == 0 {
                primitive.with_material(material.clone())
            } else {
                primitive
            }
        })
        .collect();

    Asset::single_mesh("cube", primitives)
}

/// A textured quad (4 vertices, 6 indices) followed by an untextured
/// triangle (3 vertices, 3 indices)
pub fn quad_and_triangle() -> Asset {
    let quad = Primitive::new(
        vec3s(&[
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ]),
        Accessor::from_u16(&[0, 1, 2, 1, 3, 2]),
    )
    .with_normals(vec3s(&[Vec3::Z; 4]))
    .with_texcoords(vec2s(&[
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
    ]))
    .with_material(checker_material());

    let triangle = Primitive::new(
        vec3s(&[
            Vec3::new(0.0, 2.0, 0.5),
            Vec3::new(-0.5, 1.0, 0.5),
            Vec3::new(0.5, 1.0, 0.5),
        ]),
        Accessor::from_u16(&[0, 1, 2]),
    )
    .with_normals(vec3s(&[Vec3::Z; 3]))
    .with_texcoords(vec2s(&[
        Vec2::new(0.5, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
    ]));

    Asset::new(vec![
        Node {
            name: "quad".into(),
            mesh: Mesh {
                name: Some("quad".into()),
                primitives: vec![quad],
            },
        },
        Node {
            name: "triangle".into(),
            mesh: Mesh {
                name: Some("triangle".into()),
                primitives: vec![triangle],
            },
        },
    ])
}

/// Two primitives without texture coordinates (3 and 4 vertices) followed
/// by a triangle that has them
pub fn uv_gap() -> Asset {
    let bare = |count: usize| {
        let positions: Vec<Vec3> = (0..count).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let indices: Vec<u16> = (0..count as u16).collect();
        Primitive::new(vec3s(&positions), Accessor::from_u16(&indices))
            .with_normals(vec3s(&vec![Vec3::Y; count]))
    };

    let textured = bare(3).with_texcoords(vec2s(&[
        Vec2::new(0.25, 0.5),
        Vec2::new(0.75, 0.5),
        Vec2::new(0.5, 1.0),
    ]));

    Asset::single_mesh("uv-gap", vec![bare(3), bare(4), textured])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_faces() {
        let asset = cube();
        assert_eq!(asset.primitive_count(), 6);
        for primitive in asset.primitives() {
            assert_eq!(primitive.vertex_count(), 4);
            assert_eq!(primitive.index_count(), 6);
        }
        let textured = asset
            .primitives()
            .filter(|p| p.base_color_texture().is_some())
            .count();
        assert_eq!(textured, 3);
    }

    #[test]
    fn test_uv_gap_layout() {
        let asset = uv_gap();
        let missing: Vec<bool> = asset.primitives().map(|p| p.texcoords.is_empty()).collect();
        assert_eq!(missing, vec![true, true, false]);
    }
}

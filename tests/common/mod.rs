//! Common utilities for mesh renderer integration tests.
//!
//! Everything here runs against the recording backend, so tests can inspect
//! buffer contents and the commands of every submitted frame.

#![allow(dead_code)]

use std::ops::Range;

use mesh_multidraw::asset::{Accessor, Asset, AttributeKind, Primitive};
use mesh_multidraw::backend::recording::{Command, RecordingBackend};
use mesh_multidraw::backend::BindGroupHandle;
use mesh_multidraw::{MeshRenderer, RendererConfig};

pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 240;

/// Set up a renderer for `asset` on a fresh recording backend.
pub fn setup(asset: &Asset, config: RendererConfig) -> (RecordingBackend, MeshRenderer) {
    let mut backend = RecordingBackend::new(WIDTH, HEIGHT);
    let renderer = MeshRenderer::setup(&mut backend, asset, config).expect("setup failed");
    (backend, renderer)
}

/// Current bytes of the region holding `kind`.
pub fn region_bytes(backend: &RecordingBackend, renderer: &MeshRenderer, kind: AttributeKind) -> Vec<u8> {
    let region = renderer.buffers().region(kind);
    let data = backend.buffer_data(region.buffer).expect("region buffer missing");
    data[region.offset as usize..region.end() as usize].to_vec()
}

/// What each primitive should have put into the `kind` region: its
/// accessor bytes, or zeros for a missing optional attribute.
pub fn expected_region(asset: &Asset, kind: AttributeKind) -> Vec<u8> {
    let mut bytes = Vec::new();
    for primitive in asset.primitives() {
        match kind {
            AttributeKind::Position => bytes.extend_from_slice(primitive.positions.bytes().unwrap()),
            AttributeKind::Normal => match &primitive.normals {
                Some(normals) => bytes.extend_from_slice(normals.bytes().unwrap()),
                None => bytes.resize(bytes.len() + primitive.vertex_count() * 12, 0),
            },
            AttributeKind::TexCoord => {
                if primitive.texcoords.is_empty() {
                    bytes.resize(bytes.len() + primitive.vertex_count() * 8, 0);
                }
                for uvs in &primitive.texcoords {
                    bytes.extend_from_slice(uvs.bytes().unwrap());
                }
            }
            AttributeKind::Index => unreachable!("index region is remapped, not copied"),
        }
    }
    bytes
}

pub fn read_u16s(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

pub fn read_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Draw calls of a frame, each paired with the bind group set before it.
pub fn draw_calls(commands: &[Command]) -> Vec<(Range<u32>, BindGroupHandle)> {
    let mut bound = None;
    let mut draws = Vec::new();
    for command in commands {
        match command {
            Command::SetBindGroup { index: 0, bind_group } => bound = Some(*bind_group),
            Command::DrawIndexed {
                indices,
                base_vertex,
                instances,
            } => {
                assert_eq!(*base_vertex, 0, "base vertex must stay at its default");
                assert_eq!(*instances, 0..1, "draws are single-instance");
                draws.push((indices.clone(), bound.expect("draw without bind group")));
            }
            _ => {}
        }
    }
    draws
}

/// Positions-only primitive with `vertex_count` vertices drawing its first
/// triangle.
pub fn bare_primitive(vertex_count: usize) -> Primitive {
    let positions: Vec<[f32; 3]> = (0..vertex_count)
        .map(|i| [i as f32, (i % 7) as f32, 0.0])
        .collect();
    Primitive::new(Accessor::from_vec3(&positions), Accessor::from_u16(&[0, 1, 2]))
}

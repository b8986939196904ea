use super::{accessor_bytes, Region};
use crate::asset::{Asset, AttributeKind};
use crate::backend::GraphicsBackend;
use crate::error::AssemblyError;

/// Number of vertices 16-bit indices can address
pub const MAX_VERTICES: u64 = u16::MAX as u64 + 1;

/// Slice of the global index buffer owned by one primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub count: u32,
    pub start: u32,
}

/// Global index list and the per-primitive partition of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemappedIndices {
    pub indices: Vec<u16>,
    pub ranges: Vec<IndexRange>,
    /// Vertex base after the last primitive
    pub vertex_count: u64,
}

impl RemappedIndices {
    /// Little-endian index bytes padded with zeros to `allocation` bytes
    fn padded_bytes(&self, allocation: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(allocation);
        for index in &self.indices {
            bytes.extend_from_slice(&index.to_le_bytes());
        }
        bytes.resize(allocation.max(bytes.len()), 0);
        bytes
    }
}

/// Rewrite every primitive's local indices into the global vertex space.
///
/// Each primitive's indices are offset by the vertex count of all earlier
/// primitives. Capacity and index range are checked for a primitive before
/// any of its indices are produced.
pub fn remap_indices(asset: &Asset) -> Result<RemappedIndices, AssemblyError> {
    let mut remapped = RemappedIndices::default();
    let mut vertex_base: u64 = 0;

    for (primitive_index, primitive) in asset.primitives().enumerate() {
        let vertex_count = primitive.vertex_count();
        let required = vertex_base + vertex_count as u64;
        if required > MAX_VERTICES {
            return Err(AssemblyError::VertexCapacityExceeded {
                primitive: primitive_index,
                required,
            });
        }

        let bytes = accessor_bytes(primitive_index, AttributeKind::Index, &primitive.indices)?;
        let start = remapped.indices.len() as u32;

        for chunk in bytes.chunks_exact(2) {
            let local = u16::from_le_bytes([chunk[0], chunk[1]]);
            if local as usize >= vertex_count {
                return Err(AssemblyError::IndexOutOfRange {
                    primitive: primitive_index,
                    index: local,
                    vertex_count,
                });
            }
            // required <= MAX_VERTICES keeps the sum within u16
            remapped.indices.push((local as u64 + vertex_base) as u16);
        }

        let range = IndexRange {
            count: primitive.index_count() as u32,
            start,
        };
        log::trace!(
            "Primitive {}: indices {}..{} based at vertex {}",
            primitive_index,
            range.start,
            range.start + range.count,
            vertex_base
        );
        remapped.ranges.push(range);

        vertex_base = required;
    }

    remapped.vertex_count = vertex_base;
    Ok(remapped)
}

/// Write the global index list into the index region in one queue write.
pub fn upload_indices<B: GraphicsBackend>(
    backend: &mut B,
    region: &Region,
    remapped: &RemappedIndices,
) -> Result<(), AssemblyError> {
    let written = remapped.indices.len() as u64 * AttributeKind::Index.element_size();
    if written > region.size {
        return Err(AssemblyError::RegionOverfilled {
            kind: AttributeKind::Index,
            written,
            expected: region.size,
        });
    }
    if written < region.size {
        return Err(AssemblyError::RegionUnderfilled {
            kind: AttributeKind::Index,
            written,
            expected: region.size,
        });
    }

    if written > 0 {
        let allocation = ((region.size + 3) & !3) as usize;
        backend.write_buffer(region.buffer, region.offset, &remapped.padded_bytes(allocation));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{shapes, Accessor, Primitive};

    fn primitive(vertex_count: usize, indices: &[u16]) -> Primitive {
        let positions: Vec<[f32; 3]> = vec![[0.0; 3]; vertex_count];
        Primitive::new(Accessor::from_vec3(&positions), Accessor::from_u16(indices))
    }

    #[test]
    fn test_two_primitive_remap() {
        let remapped = remap_indices(&shapes::quad_and_triangle()).unwrap();
        assert_eq!(remapped.indices, vec![0, 1, 2, 1, 3, 2, 4, 5, 6]);
        assert_eq!(
            remapped.ranges,
            vec![IndexRange { count: 6, start: 0 }, IndexRange { count: 3, start: 6 }]
        );
        assert_eq!(remapped.vertex_count, 7);
    }

    #[test]
    fn test_out_of_range_local_index() {
        let asset = Asset::single_mesh("bad", vec![primitive(3, &[0, 1, 3])]);
        assert_eq!(
            remap_indices(&asset).unwrap_err(),
            AssemblyError::IndexOutOfRange {
                primitive: 0,
                index: 3,
                vertex_count: 3,
            }
        );
    }

    #[test]
    fn test_capacity_exactly_full() {
        let asset = Asset::single_mesh(
            "full",
            vec![primitive(65533, &[0, 1, 2]), primitive(3, &[0, 1, 2])],
        );
        let remapped = remap_indices(&asset).unwrap();
        assert_eq!(&remapped.indices[3..], &[65533, 65534, 65535]);
        assert_eq!(remapped.vertex_count, MAX_VERTICES);
    }

    #[test]
    fn test_capacity_exceeded() {
        let asset = Asset::single_mesh(
            "over",
            vec![primitive(65534, &[0, 1, 2]), primitive(3, &[0, 1, 2])],
        );
        assert_eq!(
            remap_indices(&asset).unwrap_err(),
            AssemblyError::VertexCapacityExceeded {
                primitive: 1,
                required: 65537,
            }
        );
    }

    #[test]
    fn test_padding() {
        let remapped = RemappedIndices {
            indices: vec![1, 2, 3],
            ranges: vec![],
            vertex_count: 4,
        };
        assert_eq!(remapped.padded_bytes(8), vec![1, 0, 2, 0, 3, 0, 0, 0]);
    }

    #[test]
    fn test_upload_size_mismatch_direction() {
        use crate::backend::recording::RecordingBackend;
        use crate::backend::types::{BufferDescriptor, BufferUsage};

        let mut backend = RecordingBackend::new(4, 4);
        let buffer = backend
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 16,
                usage: BufferUsage::INDEX | BufferUsage::COPY_DST,
            })
            .unwrap();
        let remapped = remap_indices(&shapes::quad_and_triangle()).unwrap();

        let small = Region { buffer, offset: 0, size: 12 };
        assert_eq!(
            upload_indices(&mut backend, &small, &remapped).unwrap_err(),
            AssemblyError::RegionOverfilled {
                kind: AttributeKind::Index,
                written: 18,
                expected: 12,
            }
        );

        let single = RemappedIndices {
            indices: vec![0],
            ranges: vec![IndexRange { count: 1, start: 0 }],
            vertex_count: 1,
        };
        let large = Region { buffer, offset: 0, size: 16 };
        assert_eq!(
            upload_indices(&mut backend, &large, &single).unwrap_err(),
            AssemblyError::RegionUnderfilled {
                kind: AttributeKind::Index,
                written: 2,
                expected: 16,
            }
        );

        // Nothing reached the buffer
        assert!(backend.buffer_data(buffer).unwrap().iter().all(|b| *b == 0));
    }
}

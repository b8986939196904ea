use super::{accessor_bytes, ConsolidatedBuffers, Region};
use crate::asset::{Accessor, Asset, AttributeKind};
use crate::backend::GraphicsBackend;
use crate::error::AssemblyError;

/// What [`populate`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateReport {
    /// Final cursor of the position, normal and UV regions
    pub cursors: [u64; 3],
    /// Primitives whose normal range was skipped
    pub missing_normals: usize,
    /// Primitives whose UV range was skipped
    pub missing_uvs: usize,
}

/// Running write position inside one attribute region.
struct RegionCursor<'a> {
    kind: AttributeKind,
    region: &'a Region,
    cursor: u64,
}

impl<'a> RegionCursor<'a> {
    fn new(kind: AttributeKind, region: &'a Region) -> Self {
        Self {
            kind,
            region,
            cursor: 0,
        }
    }

    fn reserve(&self, primitive: usize, length: u64) -> Result<(), AssemblyError> {
        if self.cursor + length > self.region.size {
            return Err(AssemblyError::RegionOverrun {
                primitive,
                kind: self.kind,
                cursor: self.cursor,
                length,
                capacity: self.region.size,
            });
        }
        Ok(())
    }

    fn copy<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        primitive: usize,
        accessor: &Accessor,
    ) -> Result<(), AssemblyError> {
        let bytes = accessor_bytes(primitive, self.kind, accessor)?;
        let length = bytes.len() as u64;
        self.reserve(primitive, length)?;

        if length > 0 {
            backend.write_buffer(self.region.buffer, self.region.offset + self.cursor, bytes);
        }
        self.cursor += length;
        Ok(())
    }

    /// Copy a per-vertex attribute that must match the position count
    fn copy_per_vertex<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        primitive: usize,
        accessor: &Accessor,
        vertex_count: usize,
    ) -> Result<(), AssemblyError> {
        if accessor.count != vertex_count {
            return Err(AssemblyError::AttributeCountMismatch {
                primitive,
                kind: self.kind,
                expected: vertex_count,
                actual: accessor.count,
            });
        }
        self.copy(backend, primitive, accessor)
    }

    /// Advance over `vertex_count` elements, leaving the zeroed bytes in place
    fn skip(&mut self, primitive: usize, vertex_count: usize) -> Result<(), AssemblyError> {
        let length = vertex_count as u64 * self.kind.element_size();
        self.reserve(primitive, length)?;
        self.cursor += length;
        Ok(())
    }

    fn finish(&self) -> Result<u64, AssemblyError> {
        if self.cursor != self.region.size {
            return Err(AssemblyError::RegionUnderfilled {
                kind: self.kind,
                written: self.cursor,
                expected: self.region.size,
            });
        }
        Ok(self.cursor)
    }
}

/// Copy every primitive's position, normal and UV bytes into the vertex
/// regions.
///
/// A primitive without normals or UVs still advances that cursor by its
/// vertex count, so all three streams stay aligned on the same vertex
/// ordinal. Each cursor must end exactly at its region size.
pub fn populate<B: GraphicsBackend>(
    backend: &mut B,
    asset: &Asset,
    buffers: &ConsolidatedBuffers,
) -> Result<PopulateReport, AssemblyError> {
    let mut positions = RegionCursor::new(AttributeKind::Position, &buffers.position);
    let mut normals = RegionCursor::new(AttributeKind::Normal, &buffers.normal);
    let mut uvs = RegionCursor::new(AttributeKind::TexCoord, &buffers.uv);
    let mut report = PopulateReport::default();

    for (index, primitive) in asset.primitives().enumerate() {
        let vertex_count = primitive.vertex_count();
        log::trace!(
            "Populating primitive {} ({} vertices) at position offset {}",
            index,
            vertex_count,
            positions.cursor
        );

        positions.copy(backend, index, &primitive.positions)?;

        match &primitive.normals {
            Some(accessor) => normals.copy_per_vertex(backend, index, accessor, vertex_count)?,
            None => {
                log::warn!("Primitive {} has no normals, leaving them zeroed", index);
                normals.skip(index, vertex_count)?;
                report.missing_normals += 1;
            }
        }

        if primitive.texcoords.is_empty() {
            log::warn!("Primitive {} has no texture coordinates, leaving them zeroed", index);
            uvs.skip(index, vertex_count)?;
            report.missing_uvs += 1;
        } else {
            for accessor in &primitive.texcoords {
                uvs.copy_per_vertex(backend, index, accessor, vertex_count)?;
            }
        }
    }

    report.cursors = [positions.finish()?, normals.finish()?, uvs.finish()?];
    Ok(report)
}

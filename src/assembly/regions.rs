use super::AttributeTotals;
use crate::asset::AttributeKind;
use crate::backend::*;
use crate::error::SetupError;

/// How vertex attribute regions are placed in device buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamLayout {
    /// One vertex buffer holding the position, normal and UV regions back to back
    #[default]
    Packed,
    /// One vertex buffer per attribute kind
    Separate,
}

/// Byte range of one attribute kind inside a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub buffer: BufferHandle,
    pub offset: u64,
    pub size: u64,
}

impl Region {
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Device buffers holding the consolidated attribute and index streams.
#[derive(Debug, Clone)]
pub struct ConsolidatedBuffers {
    pub layout: StreamLayout,
    pub totals: AttributeTotals,
    pub position: Region,
    pub normal: Region,
    pub uv: Region,
    pub index: Region,
}

impl ConsolidatedBuffers {
    pub fn region(&self, kind: AttributeKind) -> &Region {
        match kind {
            AttributeKind::Position => &self.position,
            AttributeKind::Normal => &self.normal,
            AttributeKind::TexCoord => &self.uv,
            AttributeKind::Index => &self.index,
        }
    }

    /// End of the position, normal and UV regions within their buffers
    pub fn boundaries(&self) -> [u64; 3] {
        [self.position.end(), self.normal.end(), self.uv.end()]
    }

    /// Distinct device buffers, vertex buffers first
    pub fn buffers(&self) -> Vec<BufferHandle> {
        let mut buffers = Vec::with_capacity(4);
        for region in [&self.position, &self.normal, &self.uv, &self.index] {
            if !buffers.contains(&region.buffer) {
                buffers.push(region.buffer);
            }
        }
        buffers
    }

    pub fn destroy<B: GraphicsBackend>(&self, backend: &mut B) {
        for buffer in self.buffers() {
            backend.destroy_buffer(buffer);
        }
    }
}

/// Index buffer allocation: queue writes need a 4-byte multiple
fn index_allocation_size(size: u64) -> u64 {
    (size + 3) & !3
}

fn create_vertex_buffer<B: GraphicsBackend>(
    backend: &mut B,
    label: &str,
    size: u64,
) -> BackendResult<BufferHandle> {
    backend.create_buffer(&BufferDescriptor {
        label: Some(label.to_string()),
        size,
        usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
    })
}

/// Allocate zero-initialized regions sized exactly for `totals`.
pub fn allocate_regions<B: GraphicsBackend>(
    backend: &mut B,
    totals: &AttributeTotals,
    layout: StreamLayout,
) -> Result<ConsolidatedBuffers, SetupError> {
    let position_size = totals.region_size(AttributeKind::Position);
    let normal_size = totals.region_size(AttributeKind::Normal);
    let uv_size = totals.region_size(AttributeKind::TexCoord);
    let index_size = totals.region_size(AttributeKind::Index);

    let (position, normal, uv) = match layout {
        StreamLayout::Packed => {
            let buffer = create_vertex_buffer(
                backend,
                "Mesh Vertex Buffer",
                position_size + normal_size + uv_size,
            )?;
            let position = Region {
                buffer,
                offset: 0,
                size: position_size,
            };
            let normal = Region {
                buffer,
                offset: position.end(),
                size: normal_size,
            };
            let uv = Region {
                buffer,
                offset: normal.end(),
                size: uv_size,
            };
            (position, normal, uv)
        }
        StreamLayout::Separate => {
            let mut created = Vec::with_capacity(3);
            for (label, size) in [
                ("Mesh Position Buffer", position_size),
                ("Mesh Normal Buffer", normal_size),
                ("Mesh UV Buffer", uv_size),
            ] {
                match create_vertex_buffer(backend, label, size) {
                    Ok(buffer) => created.push(Region {
                        buffer,
                        offset: 0,
                        size,
                    }),
                    Err(e) => {
                        for region in &created {
                            backend.destroy_buffer(region.buffer);
                        }
                        return Err(e.into());
                    }
                }
            }
            (created[0], created[1], created[2])
        }
    };

    let index_buffer = backend.create_buffer(&BufferDescriptor {
        label: Some("Mesh Index Buffer".into()),
        size: index_allocation_size(index_size),
        usage: BufferUsage::INDEX | BufferUsage::COPY_DST,
    });
    let index = match index_buffer {
        Ok(buffer) => Region {
            buffer,
            offset: 0,
            size: index_size,
        },
        Err(e) => {
            backend.destroy_buffer(position.buffer);
            if layout == StreamLayout::Separate {
                backend.destroy_buffer(normal.buffer);
                backend.destroy_buffer(uv.buffer);
            }
            return Err(e.into());
        }
    };

    log::debug!(
        "Allocated {:?} mesh regions: position {} B, normal {} B, uv {} B, index {} B",
        layout,
        position_size,
        normal_size,
        uv_size,
        index_size
    );

    Ok(ConsolidatedBuffers {
        layout,
        totals: *totals,
        position,
        normal,
        uv,
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::RecordingBackend;
    use rstest::rstest;

    fn totals() -> AttributeTotals {
        AttributeTotals {
            primitives: 2,
            vertices: 7,
            indices: 9,
        }
    }

    #[test]
    fn test_packed_boundaries() {
        let mut backend = RecordingBackend::new(4, 4);
        let buffers = allocate_regions(&mut backend, &totals(), StreamLayout::Packed).unwrap();

        assert_eq!(buffers.boundaries(), [84, 168, 224]);
        assert_eq!(buffers.position.buffer, buffers.uv.buffer);
        assert_eq!(backend.buffer_data(buffers.position.buffer).unwrap().len(), 224);
        assert_eq!(buffers.buffers().len(), 2);
    }

    #[test]
    fn test_separate_buffers() {
        let mut backend = RecordingBackend::new(4, 4);
        let buffers = allocate_regions(&mut backend, &totals(), StreamLayout::Separate).unwrap();

        assert_eq!(buffers.boundaries(), [84, 84, 56]);
        assert_eq!(buffers.buffers().len(), 4);
        assert_eq!(backend.buffer_data(buffers.normal.buffer).unwrap().len(), 84);
        assert!(backend
            .buffer(buffers.uv.buffer)
            .unwrap()
            .usage
            .contains(BufferUsage::VERTEX | BufferUsage::COPY_DST));
    }

    #[test]
    fn test_index_allocation_padding() {
        let mut backend = RecordingBackend::new(4, 4);
        let buffers = allocate_regions(&mut backend, &totals(), StreamLayout::Packed).unwrap();

        assert_eq!(buffers.index.size, 18);
        assert_eq!(backend.buffer_data(buffers.index.buffer).unwrap().len(), 20);
        assert!(backend
            .buffer(buffers.index.buffer)
            .unwrap()
            .usage
            .contains(BufferUsage::INDEX));
    }

    #[test]
    fn test_allocation_failure_is_setup_error() {
        let mut backend = RecordingBackend::new(4, 4).with_memory_budget(100);
        let err = allocate_regions(&mut backend, &totals(), StreamLayout::Packed).unwrap_err();
        assert!(matches!(err, SetupError::Backend(BackendError::OutOfMemory)));
    }

    #[rstest]
    #[case::vertex_buffer(StreamLayout::Separate, 200)]
    #[case::index_buffer(StreamLayout::Separate, 230)]
    #[case::packed_index_buffer(StreamLayout::Packed, 230)]
    fn test_failed_allocation_releases_buffers(#[case] layout: StreamLayout, #[case] budget: u64) {
        let mut backend = RecordingBackend::new(4, 4).with_memory_budget(budget);
        let err = allocate_regions(&mut backend, &totals(), layout).unwrap_err();
        assert!(matches!(err, SetupError::Backend(BackendError::OutOfMemory)));
        assert_eq!(backend.buffer_count(), 0);

        // Nothing stays reserved, so the full 244 bytes fit afterwards
        let mut backend = backend.with_memory_budget(244);
        assert!(allocate_regions(&mut backend, &totals(), layout).is_ok());
    }
}

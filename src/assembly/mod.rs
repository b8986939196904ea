//! Mesh buffer consolidation
//!
//! Assembly turns an [`Asset`](crate::asset::Asset) into a handful of shared
//! device buffers and one draw record per primitive:
//!
//! 1. [`accumulate`] totals vertex and index counts.
//! 2. [`allocate_regions`] creates the position, normal, UV and index regions.
//! 3. [`populate`] copies attribute bytes into the vertex regions.
//! 4. [`remap_indices`] shifts local indices into one global index space.
//! 5. [`build_bindings`] creates one bind group per primitive.
//!
//! Every stage walks primitives in [`Asset::primitives`](crate::asset::Asset::primitives)
//! order; the offsets of later stages depend on it.

mod accumulate;
mod bindings;
mod populate;
mod regions;
mod remap;

pub use accumulate::*;
pub use bindings::*;
pub use populate::*;
pub use regions::*;
pub use remap::*;

use crate::asset::{Accessor, AttributeKind};
use crate::backend::BindGroupHandle;
use crate::error::AssemblyError;

/// Per-primitive draw: `index_count` indices starting at `index_start`, with
/// the primitive's bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRecord {
    pub index_count: u32,
    pub index_start: u32,
    pub bind_group: BindGroupHandle,
}

impl DrawRecord {
    /// Index range consumed by the draw call
    pub fn indices(&self) -> std::ops::Range<u32> {
        self.index_start..self.index_start + self.index_count
    }
}

/// Bytes of `accessor`, checked against its backing store and against
/// `count × element size` for `kind`.
pub(crate) fn accessor_bytes(
    primitive: usize,
    kind: AttributeKind,
    accessor: &Accessor,
) -> Result<&[u8], AssemblyError> {
    let bytes = accessor
        .bytes()
        .ok_or(AssemblyError::AccessorOutOfBounds {
            primitive,
            kind,
            offset: accessor.view.offset(),
            length: accessor.view.len(),
            buffer_len: accessor.view.buffer_len(),
        })?;

    let expected = accessor.count as u64 * kind.element_size();
    if bytes.len() as u64 != expected {
        return Err(AssemblyError::AccessorLengthMismatch {
            primitive,
            kind,
            expected,
            actual: bytes.len() as u64,
        });
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ByteView;
    use std::sync::Arc;

    #[test]
    fn test_accessor_bytes_checks_length() {
        let accessor = Accessor::new(2, ByteView::from_vec(vec![0; 20]));
        let err = accessor_bytes(3, AttributeKind::Position, &accessor).unwrap_err();
        assert_eq!(
            err,
            AssemblyError::AccessorLengthMismatch {
                primitive: 3,
                kind: AttributeKind::Position,
                expected: 24,
                actual: 20,
            }
        );
    }

    #[test]
    fn test_accessor_bytes_checks_bounds() {
        let store: Arc<[u8]> = vec![0u8; 8].into();
        let accessor = Accessor::new(1, ByteView::new(store, 4, 8));
        let err = accessor_bytes(0, AttributeKind::TexCoord, &accessor).unwrap_err();
        assert!(matches!(err, AssemblyError::AccessorOutOfBounds { buffer_len: 8, .. }));
    }

    #[test]
    fn test_draw_record_range() {
        let record = DrawRecord {
            index_count: 3,
            index_start: 6,
            bind_group: BindGroupHandle(1),
        };
        assert_eq!(record.indices(), 6..9);
    }
}

//! Error types for mesh setup, buffer assembly and per-frame rendering.

use crate::asset::AttributeKind;
use crate::backend::BackendError;
use thiserror::Error;

/// Top-level error returned by the renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Setup failed: {0}")]
    Setup(#[from] SetupError),
    #[error("Buffer assembly failed: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("Frame failed: {0}")]
    Tick(#[from] TickError),
}

/// Failures before any rendering begins.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Device resource creation failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Failed to decode image '{name}': {reason}")]
    ImageDecode { name: String, reason: String },
    #[error("Image '{name}' holds {actual} bytes, expected {expected} for {width}x{height}")]
    ImageSize {
        name: String,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[cfg(feature = "gltf")]
    #[error("Failed to load asset: {0}")]
    Asset(#[from] crate::asset::gltf::GltfLoadError),
}

/// Inconsistencies between an asset and the consolidated buffers built from it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("Primitive {primitive}: {kind} view ({offset}+{length}) lies outside its {buffer_len}-byte buffer")]
    AccessorOutOfBounds {
        primitive: usize,
        kind: AttributeKind,
        offset: usize,
        length: usize,
        buffer_len: usize,
    },
    #[error("Primitive {primitive}: {kind} view holds {actual} bytes, expected {expected}")]
    AccessorLengthMismatch {
        primitive: usize,
        kind: AttributeKind,
        expected: u64,
        actual: u64,
    },
    #[error("Primitive {primitive}: {actual} {kind} elements for {expected} vertices")]
    AttributeCountMismatch {
        primitive: usize,
        kind: AttributeKind,
        expected: usize,
        actual: usize,
    },
    #[error("Primitive {primitive}: writing {length} {kind} bytes at {cursor} overruns the {capacity}-byte region")]
    RegionOverrun {
        primitive: usize,
        kind: AttributeKind,
        cursor: u64,
        length: u64,
        capacity: u64,
    },
    #[error("{kind} region filled to {written} bytes, expected exactly {expected}")]
    RegionUnderfilled {
        kind: AttributeKind,
        written: u64,
        expected: u64,
    },
    #[error("{kind} data of {written} bytes exceeds its {expected}-byte region")]
    RegionOverfilled {
        kind: AttributeKind,
        written: u64,
        expected: u64,
    },
    #[error("Primitive {primitive}: needs {required} vertices, more than 16-bit indices can address")]
    VertexCapacityExceeded { primitive: usize, required: u64 },
    #[error("Primitive {primitive}: index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        primitive: usize,
        index: u16,
        vertex_count: usize,
    },
}

/// Failures while recording or submitting a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickError {
    #[error("Device lost")]
    DeviceLost,
    #[error("Surface lost")]
    SurfaceLost,
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Failed to acquire frame target: {0}")]
    Acquire(String),
    #[error("Device error: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for TickError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::DeviceLost => TickError::DeviceLost,
            BackendError::SurfaceLost => TickError::SurfaceLost,
            BackendError::OutOfMemory => TickError::OutOfMemory,
            BackendError::AcquireImageFailed(reason) => TickError::Acquire(reason),
            other => TickError::Backend(other),
        }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AssemblyError::VertexCapacityExceeded {
            primitive: 2,
            required: 65537,
        };
        assert!(err.to_string().contains("65537"));

        let err = AssemblyError::RegionUnderfilled {
            kind: AttributeKind::TexCoord,
            written: 16,
            expected: 24,
        };
        assert_eq!(
            err.to_string(),
            "texcoord region filled to 16 bytes, expected exactly 24"
        );

        let err = AssemblyError::AttributeCountMismatch {
            primitive: 1,
            kind: AttributeKind::Normal,
            expected: 3,
            actual: 4,
        };
        assert_eq!(err.to_string(), "Primitive 1: 4 normal elements for 3 vertices");

        let err = RenderError::from(TickError::DeviceLost);
        assert_eq!(err.to_string(), "Frame failed: Device lost");
    }

    #[test]
    fn test_backend_errors_map_to_tick_errors() {
        assert_eq!(TickError::from(BackendError::DeviceLost), TickError::DeviceLost);
        assert_eq!(TickError::from(BackendError::SurfaceLost), TickError::SurfaceLost);
        assert_eq!(TickError::from(BackendError::OutOfMemory), TickError::OutOfMemory);
        assert_eq!(
            TickError::from(BackendError::AcquireImageFailed("timeout".into())),
            TickError::Acquire("timeout".into())
        );
        assert!(matches!(
            TickError::from(BackendError::TextureCreationFailed("bad".into())),
            TickError::Backend(_)
        ));
    }
}

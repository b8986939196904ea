//! Backend abstraction layer
//!
//! Provides the device seam the mesh renderer records against, plus the wgpu
//! and in-memory recording implementations.

pub mod recording;
pub mod traits;
pub mod types;
pub mod wgpu_backend;

pub use traits::*;
pub use types::*;

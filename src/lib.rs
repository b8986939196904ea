//! Mesh Multidraw - consolidated mesh buffers with one indexed draw per primitive
//!
//! A multi-node, multi-primitive mesh asset is assembled once into a few
//! shared device buffers:
//! - position, normal and UV streams, each stored in its own region
//! - one 16-bit index buffer with every primitive's indices rebased into a
//!   single global vertex space
//! - one bind group per primitive (transform uniform, sampler, base color)
//!
//! Every tick the [`MeshRenderer`] rewrites the transform uniform, binds the
//! streams once and issues one indexed draw per primitive, swapping only the
//! bind group between draws.
//!
//! # Example
//! ```no_run
//! use mesh_multidraw::{asset::shapes, backend::recording::RecordingBackend};
//! use mesh_multidraw::{MeshRenderer, RendererConfig};
//!
//! let mut backend = RecordingBackend::new(800, 600);
//! let mut renderer = MeshRenderer::setup(&mut backend, &shapes::cube(), RendererConfig::default())?;
//! renderer.tick(&mut backend)?;
//! # Ok::<(), mesh_multidraw::RenderError>(())
//! ```

pub mod assembly;
pub mod asset;
pub mod backend;
pub mod config;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod renderer;
pub mod resources;

pub use asset::Asset;
pub use config::RendererConfig;
pub use error::{AssemblyError, RenderError, RenderResult, SetupError, TickError};
pub use pipeline::ShadingVariant;
pub use renderer::MeshRenderer;

// Re-export wgpu backend for direct access
pub use backend::wgpu_backend::WgpuBackend;

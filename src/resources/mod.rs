//! Resource management
//!
//! Handles decoded images and their device-side textures.

mod texture;

pub use texture::*;

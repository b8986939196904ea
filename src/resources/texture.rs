//! Decoded images and their device uploads

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::error::SetupError;
use image::{DynamicImage, GenericImageView};
use std::path::Path;

/// Decoded RGBA8 image data
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
    pub name: String,
}

impl TextureData {
    /// Load texture from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let img = image::open(path).map_err(|e| SetupError::ImageDecode {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_image(img, &name))
    }

    /// Decode an encoded image (PNG, JPEG, ...)
    pub fn from_bytes(bytes: &[u8], name: &str) -> Result<Self, SetupError> {
        let img = image::load_from_memory(bytes).map_err(|e| SetupError::ImageDecode {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_image(img, name))
    }

    /// Wrap already decoded RGBA8 pixels
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>, name: &str) -> Result<Self, SetupError> {
        let texture = Self {
            width,
            height,
            format: TextureFormat::Rgba8UnormSrgb,
            data,
            name: name.to_string(),
        };
        texture.validate()?;
        Ok(texture)
    }

    fn from_image(img: DynamicImage, name: &str) -> Self {
        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();

        Self {
            width,
            height,
            format: TextureFormat::Rgba8UnormSrgb,
            data: rgba.into_raw(),
            name: name.to_string(),
        }
    }

    /// Create a solid color texture
    pub fn solid_color(color: [u8; 4], name: &str) -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8UnormSrgb,
            data: color.to_vec(),
            name: name.to_string(),
        }
    }

    /// Create a checkerboard texture
    pub fn checkerboard(size: u32, color1: [u8; 4], color2: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let is_even = ((x / 8) + (y / 8)) % 2 == 0;
                let color = if is_even { color1 } else { color2 };
                data.extend_from_slice(&color);
            }
        }

        Self {
            width: size,
            height: size,
            format: TextureFormat::Rgba8UnormSrgb,
            data,
            name: "checkerboard".to_string(),
        }
    }

    /// Byte length implied by the dimensions
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel() as usize
    }

    fn validate(&self) -> Result<(), SetupError> {
        if self.data.len() != self.expected_len() {
            return Err(SetupError::ImageSize {
                name: self.name.clone(),
                width: self.width,
                height: self.height,
                expected: self.expected_len(),
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Uploaded texture with its view
#[derive(Debug, Clone)]
pub struct GpuTexture {
    pub handle: TextureHandle,
    pub view: TextureViewHandle,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub name: String,
}

impl GpuTexture {
    /// Create and upload texture to GPU
    pub fn create<B: GraphicsBackend>(backend: &mut B, data: &TextureData) -> Result<Self, SetupError> {
        data.validate()?;

        let handle = backend.create_texture(&TextureDescriptor {
            label: Some(data.name.clone()),
            width: data.width,
            height: data.height,
            format: data.format,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })?;

        let view = backend.create_texture_view(handle)?;
        backend.write_texture(handle, &data.data, data.width, data.height);

        Ok(Self {
            handle,
            view,
            width: data.width,
            height: data.height,
            format: data.format,
            name: data.name.clone(),
        })
    }
}

//! Recording backend for tests and headless inspection.
//!
//! This backend doesn't talk to a GPU. Buffer and texture contents live in
//! host memory and every command recorded inside a frame is kept in order, so
//! callers can check exactly what would have been submitted.

use crate::backend::traits::*;
use crate::backend::types::*;
use std::collections::HashMap;
use std::ops::Range;

/// A command recorded between `begin_frame` and `end_frame`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginRenderPass(RenderPassDescriptor),
    SetPipeline(RenderPipelineHandle),
    SetBindGroup {
        index: u32,
        bind_group: BindGroupHandle,
    },
    SetVertexBuffer {
        slot: u32,
        buffer: BufferHandle,
        offset: u64,
        size: Option<u64>,
    },
    SetIndexBuffer {
        buffer: BufferHandle,
        offset: u64,
        format: IndexFormat,
    },
    DrawIndexed {
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    },
    EndRenderPass,
}

/// Host-side copy of a buffer.
#[derive(Debug, Clone)]
pub struct RecordedBuffer {
    pub label: Option<String>,
    pub usage: BufferUsage,
    pub data: Vec<u8>,
    /// Number of `write_buffer` calls that targeted this buffer
    pub write_count: usize,
}

/// Host-side copy of a texture.
#[derive(Debug, Clone)]
pub struct RecordedTexture {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
}

/// A bind group as it was created.
#[derive(Debug, Clone)]
pub struct RecordedBindGroup {
    pub layout: BindGroupLayoutHandle,
    pub entries: Vec<(u32, BindGroupEntry)>,
}

/// Recording backend.
#[derive(Debug)]
pub struct RecordingBackend {
    width: u32,
    height: u32,
    format: TextureFormat,

    buffers: HashMap<u64, RecordedBuffer>,
    textures: HashMap<u64, RecordedTexture>,
    texture_views: HashMap<u64, TextureHandle>,
    samplers: HashMap<u64, SamplerDescriptor>,
    bind_group_layouts: HashMap<u64, Vec<BindGroupLayoutEntry>>,
    bind_groups: HashMap<u64, RecordedBindGroup>,
    render_pipelines: HashMap<u64, RenderPipelineDescriptor>,
    next_id: u64,

    frame_view: Option<TextureViewHandle>,
    in_render_pass: bool,
    pending: Vec<Command>,
    submitted: Vec<Vec<Command>>,

    memory_budget: Option<u64>,
    allocated_bytes: u64,
    device_lost: bool,
}

impl RecordingBackend {
    /// Create a recording backend with a `width`×`height` frame target.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Bgra8UnormSrgb,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            texture_views: HashMap::new(),
            samplers: HashMap::new(),
            bind_group_layouts: HashMap::new(),
            bind_groups: HashMap::new(),
            render_pipelines: HashMap::new(),
            next_id: 1,
            frame_view: None,
            in_render_pass: false,
            pending: Vec::new(),
            submitted: Vec::new(),
            memory_budget: None,
            allocated_bytes: 0,
            device_lost: false,
        }
    }

    /// Limit the total bytes of buffers and textures that may be allocated.
    /// Allocations past the budget fail with [`BackendError::OutOfMemory`].
    pub fn with_memory_budget(mut self, bytes: u64) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Change the frame target size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Simulate losing the device. Every later frame fails.
    pub fn lose_device(&mut self) {
        log::trace!("RecordingBackend: device lost");
        self.device_lost = true;
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&RecordedBuffer> {
        self.buffers.get(&handle.0)
    }

    /// Current contents of a buffer
    pub fn buffer_data(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&handle.0).map(|b| b.data.as_slice())
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Live buffers carrying all of `usage`
    pub fn buffers_with_usage(&self, usage: BufferUsage) -> Vec<(BufferHandle, &RecordedBuffer)> {
        let mut found: Vec<(BufferHandle, &RecordedBuffer)> = self
            .buffers
            .iter()
            .filter(|(_, b)| b.usage.contains(usage))
            .map(|(id, b)| (BufferHandle(*id), b))
            .collect();
        found.sort_by_key(|(handle, _)| handle.0);
        found
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&RecordedTexture> {
        self.textures.get(&handle.0)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Texture a view was created from
    pub fn view_texture(&self, view: TextureViewHandle) -> Option<TextureHandle> {
        self.texture_views.get(&view.0).copied()
    }

    pub fn bind_group(&self, handle: BindGroupHandle) -> Option<&RecordedBindGroup> {
        self.bind_groups.get(&handle.0)
    }

    pub fn bind_group_layout(&self, handle: BindGroupLayoutHandle) -> Option<&[BindGroupLayoutEntry]> {
        self.bind_group_layouts.get(&handle.0).map(|e| e.as_slice())
    }

    pub fn render_pipeline(&self, handle: RenderPipelineHandle) -> Option<&RenderPipelineDescriptor> {
        self.render_pipelines.get(&handle.0)
    }

    /// Commands of every submitted frame, oldest first
    pub fn submitted_frames(&self) -> &[Vec<Command>] {
        &self.submitted
    }

    /// Commands of the most recently submitted frame
    pub fn last_frame(&self) -> Option<&[Command]> {
        self.submitted.last().map(|c| c.as_slice())
    }

    /// View handle handed out for the frame currently being recorded
    pub fn frame_view(&self) -> Option<TextureViewHandle> {
        self.frame_view
    }

    fn next_handle(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn reserve(&mut self, bytes: u64) -> BackendResult<()> {
        if self.device_lost {
            return Err(BackendError::DeviceLost);
        }
        if let Some(budget) = self.memory_budget {
            if self.allocated_bytes + bytes > budget {
                return Err(BackendError::OutOfMemory);
            }
        }
        self.allocated_bytes += bytes;
        Ok(())
    }

    fn record(&mut self, command: Command) {
        if self.in_render_pass {
            self.pending.push(command);
        } else {
            log::warn!("RecordingBackend: {:?} outside of a render pass", command);
        }
    }
}

impl GraphicsBackend for RecordingBackend {
    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        if self.device_lost {
            return Err(BackendError::DeviceLost);
        }

        let id = self.next_handle();
        let view = TextureViewHandle(id);
        self.frame_view = Some(view);
        self.pending.clear();

        Ok(FrameContext {
            target_view: view,
            width: self.width,
            height: self.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        self.frame_view = None;
        if self.device_lost {
            self.pending.clear();
            return Err(BackendError::DeviceLost);
        }

        let commands = std::mem::take(&mut self.pending);
        log::trace!("RecordingBackend: submitting {} commands", commands.len());
        self.submitted.push(commands);
        Ok(())
    }

    fn target_format(&self) -> TextureFormat {
        self.format
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        log::trace!(
            "RecordingBackend: creating buffer {:?} (size: {})",
            desc.label,
            desc.size
        );
        self.reserve(desc.size)?;

        let id = self.next_handle();
        self.buffers.insert(
            id,
            RecordedBuffer {
                label: desc.label.clone(),
                usage: desc.usage,
                data: vec![0; desc.size as usize],
                write_count: 0,
            },
        );
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        let Some(buf) = self.buffers.get_mut(&buffer.0) else {
            log::warn!("RecordingBackend: write to unknown buffer {}", buffer.0);
            return;
        };

        let start = offset as usize;
        let end = start + data.len();
        if end > buf.data.len() {
            log::error!(
                "RecordingBackend: write of {} bytes at {} overruns buffer {:?} ({} bytes)",
                data.len(),
                offset,
                buf.label,
                buf.data.len()
            );
            return;
        }

        buf.data[start..end].copy_from_slice(data);
        buf.write_count += 1;
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        log::trace!(
            "RecordingBackend: creating texture {:?} ({}x{})",
            desc.label,
            desc.width,
            desc.height
        );
        let size = desc.width as u64 * desc.height as u64 * desc.format.bytes_per_pixel() as u64;
        self.reserve(size)?;

        let id = self.next_handle();
        self.textures.insert(
            id,
            RecordedTexture {
                label: desc.label.clone(),
                width: desc.width,
                height: desc.height,
                format: desc.format,
                data: vec![0; size as usize],
            },
        );
        Ok(TextureHandle(id))
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        if !self.textures.contains_key(&texture.0) {
            return Err(BackendError::InvalidHandle {
                kind: "texture",
                id: texture.0,
            });
        }

        let id = self.next_handle();
        self.texture_views.insert(id, texture);
        Ok(TextureViewHandle(id))
    }

    fn write_texture(&mut self, texture: TextureHandle, data: &[u8], width: u32, height: u32) {
        let Some(tex) = self.textures.get_mut(&texture.0) else {
            log::warn!("RecordingBackend: write to unknown texture {}", texture.0);
            return;
        };

        if width != tex.width || height != tex.height || data.len() != tex.data.len() {
            log::error!(
                "RecordingBackend: {}x{} write ({} bytes) does not match texture {:?} ({}x{})",
                width,
                height,
                data.len(),
                tex.label,
                tex.width,
                tex.height
            );
            return;
        }
        tex.data.copy_from_slice(data);
    }

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        log::trace!("RecordingBackend: creating sampler {:?}", desc.label);
        let id = self.next_handle();
        self.samplers.insert(id, desc.clone());
        Ok(SamplerHandle(id))
    }

    fn create_bind_group_layout(
        &mut self,
        entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        let id = self.next_handle();
        self.bind_group_layouts.insert(id, entries.to_vec());
        Ok(BindGroupLayoutHandle(id))
    }

    fn create_bind_group(
        &mut self,
        layout: BindGroupLayoutHandle,
        entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        if !self.bind_group_layouts.contains_key(&layout.0) {
            return Err(BackendError::InvalidHandle {
                kind: "bind group layout",
                id: layout.0,
            });
        }

        for (_, entry) in entries {
            match entry {
                BindGroupEntry::Buffer { buffer, .. } if !self.buffers.contains_key(&buffer.0) => {
                    return Err(BackendError::InvalidHandle {
                        kind: "buffer",
                        id: buffer.0,
                    });
                }
                BindGroupEntry::Texture(view) if !self.texture_views.contains_key(&view.0) => {
                    return Err(BackendError::InvalidHandle {
                        kind: "texture view",
                        id: view.0,
                    });
                }
                BindGroupEntry::Sampler(sampler) if !self.samplers.contains_key(&sampler.0) => {
                    return Err(BackendError::InvalidHandle {
                        kind: "sampler",
                        id: sampler.0,
                    });
                }
                _ => {}
            }
        }

        let id = self.next_handle();
        self.bind_groups.insert(
            id,
            RecordedBindGroup {
                layout,
                entries: entries.to_vec(),
            },
        );
        Ok(BindGroupHandle(id))
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        log::trace!("RecordingBackend: creating pipeline {:?}", desc.label);
        if !desc.shader.contains("fn vs_main") || !desc.shader.contains("fn fs_main") {
            return Err(BackendError::ShaderCreationFailed(
                "shader must define vs_main and fs_main".into(),
            ));
        }

        let id = self.next_handle();
        self.render_pipelines.insert(id, desc.clone());
        Ok(RenderPipelineHandle(id))
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        self.in_render_pass = true;
        self.pending.push(Command::BeginRenderPass(desc.clone()));
    }

    fn end_render_pass(&mut self) {
        if self.in_render_pass {
            self.pending.push(Command::EndRenderPass);
            self.in_render_pass = false;
        }
    }

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.record(Command::SetPipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle) {
        self.record(Command::SetBindGroup { index, bind_group });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle, offset: u64, size: Option<u64>) {
        self.record(Command::SetVertexBuffer {
            slot,
            buffer,
            offset,
            size,
        });
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, offset: u64, format: IndexFormat) {
        self.record(Command::SetIndexBuffer {
            buffer,
            offset,
            format,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.record(Command::DrawIndexed {
            indices,
            base_vertex,
            instances,
        });
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buf) = self.buffers.remove(&buffer.0) {
            self.allocated_bytes = self.allocated_bytes.saturating_sub(buf.data.len() as u64);
        }
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if let Some(tex) = self.textures.remove(&texture.0) {
            self.allocated_bytes = self.allocated_bytes.saturating_sub(tex.data.len() as u64);
        }
        self.texture_views.retain(|_, t| *t != texture);
    }
}

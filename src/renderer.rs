//! Mesh renderer: setup and per-tick frame recording

use crate::assembly::*;
use crate::asset::Asset;
use crate::backend::*;
use crate::config::RendererConfig;
use crate::error::{AssemblyError, RenderResult, SetupError, TickError};
use crate::frame::{FrameState, TransformUniform};
use crate::pipeline::{create_mesh_pipeline, MeshPipelineConfig, DEPTH_FORMAT};

/// Depth attachment matching the frame target size
#[derive(Debug, Clone, Copy)]
struct DepthTarget {
    texture: TextureHandle,
    view: TextureViewHandle,
    width: u32,
    height: u32,
}

/// Owns everything built from an asset and draws it once per tick.
///
/// The asset is only borrowed during [`setup`](Self::setup); afterwards the
/// renderer holds device buffers, bind groups and draw records only.
#[derive(Debug)]
pub struct MeshRenderer {
    config: RendererConfig,
    pipeline: RenderPipelineHandle,
    bind_group_layout: BindGroupLayoutHandle,
    uniform_buffer: BufferHandle,
    buffers: ConsolidatedBuffers,
    bindings: BindingSets,
    draws: Vec<DrawRecord>,
    frame: FrameState,
    depth: Option<DepthTarget>,
}

/// Populate the vertex regions, then remap and upload the indices.
fn fill_buffers<B: GraphicsBackend>(
    backend: &mut B,
    asset: &Asset,
    buffers: &ConsolidatedBuffers,
) -> Result<(PopulateReport, RemappedIndices), AssemblyError> {
    let report = populate(backend, asset, buffers)?;
    let remapped = remap_indices(asset)?;
    upload_indices(backend, &buffers.index, &remapped)?;
    Ok((report, remapped))
}

impl MeshRenderer {
    /// Consolidate `asset` into shared device buffers and build the pipeline
    /// and per-primitive bind groups.
    pub fn setup<B: GraphicsBackend>(
        backend: &mut B,
        asset: &Asset,
        config: RendererConfig,
    ) -> RenderResult<Self> {
        let totals = accumulate(asset);
        if totals.is_empty() {
            log::warn!("Asset has no primitives, nothing will be drawn");
        }

        // Each later stage releases what earlier stages created before failing
        let buffers = allocate_regions(backend, &totals, config.stream_layout)?;
        let (report, remapped) = match fill_buffers(backend, asset, &buffers) {
            Ok(filled) => filled,
            Err(e) => {
                buffers.destroy(backend);
                return Err(e.into());
            }
        };

        let frame = FrameState::new(&config);
        let uniform_buffer = match backend.create_buffer(&BufferDescriptor {
            label: Some("Transform Buffer".into()),
            size: TransformUniform::SIZE,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        }) {
            Ok(buffer) => buffer,
            Err(e) => {
                buffers.destroy(backend);
                return Err(SetupError::from(e).into());
            }
        };
        backend.write_buffer(uniform_buffer, 0, bytemuck::bytes_of(&frame.uniform()));

        let color_format = backend.target_format();
        let bound = create_mesh_pipeline(
            backend,
            &MeshPipelineConfig {
                variant: config.variant,
                color_format,
                depth_test: config.depth_test,
                cull_mode: config.cull_mode,
            },
        )
        .map_err(SetupError::from)
        .and_then(|(bind_group_layout, pipeline)| {
            let bindings = build_bindings(
                backend,
                asset,
                bind_group_layout,
                uniform_buffer,
                config.fallback_color,
            )?;
            Ok((bind_group_layout, pipeline, bindings))
        });
        let (bind_group_layout, pipeline, bindings) = match bound {
            Ok(bound) => bound,
            Err(e) => {
                buffers.destroy(backend);
                backend.destroy_buffer(uniform_buffer);
                return Err(e.into());
            }
        };

        let draws: Vec<DrawRecord> = remapped
            .ranges
            .iter()
            .zip(&bindings.bind_groups)
            .map(|(range, bind_group)| DrawRecord {
                index_count: range.count,
                index_start: range.start,
                bind_group: *bind_group,
            })
            .collect();

        log::info!(
            "Mesh ready: {} primitives, {} vertices, {} indices ({} B vertex data, {:?} layout, {} variant)",
            totals.primitives,
            totals.vertices,
            totals.indices,
            report.cursors.iter().sum::<u64>(),
            config.stream_layout,
            config.variant.name()
        );
        if report.missing_uvs > 0 || report.missing_normals > 0 {
            log::info!(
                "{} primitives without UVs, {} without normals",
                report.missing_uvs,
                report.missing_normals
            );
        }

        Ok(Self {
            config,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            buffers,
            bindings,
            draws,
            frame,
            depth: None,
        })
    }

    /// Run one frame: advance the rotation, rewrite the transform uniform and
    /// record one indexed draw per primitive, then submit.
    pub fn tick<B: GraphicsBackend>(&mut self, backend: &mut B) -> Result<(), TickError> {
        self.frame.advance();
        let uniform = self.frame.uniform();
        backend.write_buffer(self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        let frame = backend.begin_frame()?;

        let depth_stencil_attachment = if self.config.depth_test {
            let depth = self.ensure_depth_target(backend, frame.width, frame.height)?;
            Some(DepthStencilAttachment {
                view: depth.view,
                depth_load_op: LoadOp::Clear([1.0, 0.0, 0.0, 0.0]),
                depth_store_op: StoreOp::Store,
                depth_clear_value: 1.0,
            })
        } else {
            None
        };

        backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Mesh Pass".into()),
            color_attachments: vec![ColorAttachment {
                view: frame.target_view,
                load_op: LoadOp::Clear(self.config.clear_color),
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment,
        });

        if self.buffers.totals.vertices > 0 {
            backend.set_render_pipeline(self.pipeline);

            for (slot, kind) in self.config.variant.streams().iter().enumerate() {
                let region = self.buffers.region(*kind);
                backend.set_vertex_buffer(slot as u32, region.buffer, region.offset, Some(region.size));
            }
            backend.set_index_buffer(self.buffers.index.buffer, self.buffers.index.offset, IndexFormat::Uint16);

            for draw in &self.draws {
                backend.set_bind_group(0, draw.bind_group);
                backend.draw_indexed(draw.indices(), 0, 0..1);
            }
        }

        backend.end_render_pass();
        backend.end_frame()?;

        log::trace!(
            "Frame {} submitted ({} draws, angle {:.4})",
            self.frame.ticks(),
            self.draws.len(),
            self.frame.angle()
        );
        Ok(())
    }

    fn ensure_depth_target<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> Result<DepthTarget, TickError> {
        if let Some(depth) = self.depth {
            if depth.width == width && depth.height == height {
                return Ok(depth);
            }
            backend.destroy_texture(depth.texture);
            self.depth = None;
        }

        log::debug!("Creating {}x{} depth target", width, height);
        let texture = backend.create_texture(&TextureDescriptor {
            label: Some("Depth Buffer".into()),
            width,
            height,
            format: DEPTH_FORMAT,
            usage: TextureUsage::RENDER_ATTACHMENT,
        })?;
        let view = backend.create_texture_view(texture)?;

        let depth = DepthTarget {
            texture,
            view,
            width,
            height,
        };
        self.depth = Some(depth);
        Ok(depth)
    }

    /// Draw records in primitive order
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn buffers(&self) -> &ConsolidatedBuffers {
        &self.buffers
    }

    pub fn bindings(&self) -> &BindingSets {
        &self.bindings
    }

    pub fn frame_state(&self) -> &FrameState {
        &self.frame
    }

    pub fn uniform_buffer(&self) -> BufferHandle {
        self.uniform_buffer
    }

    pub fn pipeline(&self) -> RenderPipelineHandle {
        self.pipeline
    }

    pub fn bind_group_layout(&self) -> BindGroupLayoutHandle {
        self.bind_group_layout
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Release the device buffers and textures owned by the renderer
    pub fn destroy<B: GraphicsBackend>(self, backend: &mut B) {
        self.buffers.destroy(backend);
        self.bindings.destroy(backend);
        backend.destroy_buffer(self.uniform_buffer);
        if let Some(depth) = self.depth {
            backend.destroy_texture(depth.texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::shapes;
    use crate::backend::recording::{Command, RecordingBackend};

    #[test]
    fn test_depth_target_follows_frame_size() {
        let mut backend = RecordingBackend::new(64, 48);
        let mut renderer =
            MeshRenderer::setup(&mut backend, &shapes::cube(), RendererConfig::default()).unwrap();

        renderer.tick(&mut backend).unwrap();
        let first = renderer.depth.unwrap();
        assert_eq!((first.width, first.height), (64, 48));

        renderer.tick(&mut backend).unwrap();
        assert_eq!(renderer.depth.unwrap().texture, first.texture);

        backend.resize(32, 32);
        renderer.tick(&mut backend).unwrap();
        let resized = renderer.depth.unwrap();
        assert_ne!(resized.texture, first.texture);
        assert!(backend.texture(first.texture).is_none());
        assert_eq!(backend.texture(resized.texture).unwrap().width, 32);
    }

    #[test]
    fn test_without_depth_test() {
        let mut backend = RecordingBackend::new(8, 8);
        let config = RendererConfig::default().with_depth_test(false);
        let mut renderer = MeshRenderer::setup(&mut backend, &shapes::cube(), config).unwrap();
        renderer.tick(&mut backend).unwrap();

        assert!(renderer.depth.is_none());
        match &backend.last_frame().unwrap()[0] {
            Command::BeginRenderPass(desc) => assert!(desc.depth_stencil_attachment.is_none()),
            other => panic!("unexpected first command {:?}", other),
        }
    }

    #[test]
    fn test_destroy_releases_resources() {
        let mut backend = RecordingBackend::new(8, 8);
        let mut renderer =
            MeshRenderer::setup(&mut backend, &shapes::cube(), RendererConfig::default()).unwrap();
        renderer.tick(&mut backend).unwrap();
        renderer.destroy(&mut backend);

        assert_eq!(backend.buffer_count(), 0);
        assert_eq!(backend.texture_count(), 0);
    }
}

//! Spinning mesh viewer
//!
//! Loads a glTF binary (or one of the built-in shapes), consolidates it into
//! shared buffers and draws it on a window surface every ~16 ms.
//!
//! ```bash
//! cargo run --example viewer -- Duck.glb --variant lit
//! cargo run --example viewer -- cube --layout separate
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::Vec3;
use mesh_multidraw::assembly::StreamLayout;
use mesh_multidraw::asset::{self, shapes, Asset};
use mesh_multidraw::{MeshRenderer, RendererConfig, ShadingVariant, TickError, WgpuBackend};
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::WindowBuilder,
};

const TICK_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum CliLayout {
    /// One vertex buffer holding all three streams
    #[default]
    Packed,
    /// One vertex buffer per stream
    Separate,
}

impl From<CliLayout> for StreamLayout {
    fn from(layout: CliLayout) -> Self {
        match layout {
            CliLayout::Packed => StreamLayout::Packed,
            CliLayout::Separate => StreamLayout::Separate,
        }
    }
}

/// Consolidated mesh viewer.
#[derive(Parser, Debug)]
#[command(name = "viewer", about = "Renders a mesh with one draw per primitive", version)]
struct Args {
    /// Path to a .glb/.gltf file, or one of: triangle, cube, quad-and-triangle, uv-gap
    #[arg(default_value = "cube")]
    model: String,

    /// Shading variant: flat, textured or lit.
    #[arg(long, default_value = "lit")]
    variant: ShadingVariant,

    /// How the attribute streams are laid out in device buffers.
    #[arg(long, default_value = "packed", value_enum)]
    layout: CliLayout,

    /// Disable the depth attachment.
    #[arg(long)]
    no_depth: bool,

    /// Uniform model scale. Defaults to 80 for files and 5 for built-in shapes.
    #[arg(long)]
    scale: Option<f32>,

    /// Disable vertical sync.
    #[arg(long)]
    no_vsync: bool,

    /// Initial window width in pixels.
    #[arg(long, default_value = "800")]
    width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value = "600")]
    height: u32,
}

fn load_model(name: &str) -> (Asset, bool) {
    match name {
        "triangle" => (shapes::triangle(), true),
        "cube" => (shapes::cube(), true),
        "quad-and-triangle" => (shapes::quad_and_triangle(), true),
        "uv-gap" => (shapes::uv_gap(), true),
        path => {
            let asset = asset::gltf::load_gltf(path)
                .unwrap_or_else(|e| panic!("Failed to load '{}': {}", path, e));
            (asset, false)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (asset, builtin) = load_model(&args.model);
    log::info!(
        "Loaded '{}': {} nodes, {} primitives",
        args.model,
        asset.nodes.len(),
        asset.primitive_count()
    );

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(format!("Mesh Multidraw - {}", args.model))
            .with_inner_size(PhysicalSize::new(args.width, args.height))
            .build(&event_loop)
            .expect("Failed to create window"),
    );

    let mut backend = pollster::block_on(WgpuBackend::for_window(Arc::clone(&window), !args.no_vsync))
        .expect("Failed to initialize wgpu backend");

    let defaults = RendererConfig::default();
    let scale = args.scale.unwrap_or(if builtin { 5.0 } else { defaults.model_scale });
    let aspect = args.width as f32 / args.height.max(1) as f32;
    let config = RendererConfig::default()
        .with_variant(args.variant)
        .with_stream_layout(args.layout.into())
        .with_depth_test(!args.no_depth)
        .with_model_base(Vec3::new(0.0, 0.0, 1.0), scale)
        .with_projection(defaults.fov_y, aspect, defaults.near, defaults.far);

    let mut renderer = MeshRenderer::setup(&mut backend, &asset, config).expect("Failed to set up renderer");
    let mut next_tick = Instant::now();

    event_loop
        .run(move |event, elwt: &EventLoopWindowTarget<()>| {
            elwt.set_control_flow(ControlFlow::WaitUntil(next_tick));

            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => backend.resize(size.width, size.height),
                    _ => {}
                },
                Event::AboutToWait => {
                    if Instant::now() < next_tick {
                        return;
                    }
                    next_tick = Instant::now() + TICK_INTERVAL;

                    match renderer.tick(&mut backend) {
                        Ok(()) => {}
                        Err(TickError::SurfaceLost) => {
                            let size = window.inner_size();
                            backend.resize(size.width, size.height);
                        }
                        Err(e) => {
                            log::error!("Stopping: {}", e);
                            elwt.exit();
                        }
                    }
                }
                _ => {}
            }
        })
        .expect("Event loop failed");
}

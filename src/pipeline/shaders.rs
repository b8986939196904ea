//! WGSL sources for the shading variants
//!
//! All variants share bind group 0: the transform uniform at binding 0, the
//! sampler at binding 1 and the base color texture at binding 2. Vertex
//! attribute locations follow the vertex buffer slot order.

/// Positions only, solid color
pub const FLAT_SHADER: &str = r#"
struct Transforms {
    mvp: mat4x4<f32>,
    world: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> transforms: Transforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return transforms.mvp * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 0.0, 1.0);
}
"#;

/// Positions and UVs, sampled base color
pub const TEXTURED_SHADER: &str = r#"
struct Transforms {
    mvp: mat4x4<f32>,
    world: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> transforms: Transforms;
@group(0) @binding(1) var base_sampler: sampler;
@group(0) @binding(2) var base_color: texture_2d<f32>;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = transforms.mvp * vec4<f32>(in.position, 1.0);
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(base_color, base_sampler, in.uv);
}
"#;

/// Positions, normals and UVs: base color with diffuse, specular and ambient
/// terms from one directional light
pub const LIT_SHADER: &str = r#"
struct Transforms {
    mvp: mat4x4<f32>,
    world: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> transforms: Transforms;
@group(0) @binding(1) var base_sampler: sampler;
@group(0) @binding(2) var base_color: texture_2d<f32>;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = transforms.mvp * vec4<f32>(in.position, 1.0);
    out.world_normal = (transforms.world * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(base_color, base_sampler, in.uv);

    // Zero normals (primitives without normal data) get ambient only
    let normal_length = length(in.world_normal);
    var normal = vec3<f32>(0.0, 0.0, 0.0);
    if (normal_length > 0.0) {
        normal = in.world_normal / normal_length;
    }

    let light = normalize(vec3<f32>(-1.0, -1.0, 1.0));
    let view_dir = vec3<f32>(0.0, 0.0, 1.0);
    let ambient = 0.25;

    let reflected = reflect(light, normal);
    let specular = pow(saturate(dot(reflected, -view_dir)), 20.0);
    let brightness = max(saturate(dot(-light, normal)), ambient);

    return vec4<f32>(color.rgb * brightness + vec3<f32>(specular), color.a);
}
"#;

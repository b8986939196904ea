//! WGSL validation for every shading variant.
//!
//! Shaders are parsed and validated with naga, then checked against the
//! vertex layouts and bind group layout the pipeline is built with.

use mesh_multidraw::assembly::{SAMPLER_BINDING, TEXTURE_BINDING, UNIFORM_BINDING};
use mesh_multidraw::pipeline::bind_group_layout_entries;
use mesh_multidraw::ShadingVariant;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use rstest::rstest;

fn parse(variant: ShadingVariant) -> naga::Module {
    let module = naga::front::wgsl::parse_str(variant.shader_source())
        .unwrap_or_else(|e| panic!("{} shader failed to parse: {}", variant.name(), e));
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .unwrap_or_else(|e| panic!("{} shader failed validation: {:?}", variant.name(), e));
    module
}

/// Locations consumed by the vertex entry point, including struct members.
fn vertex_locations(module: &naga::Module) -> Vec<u32> {
    let entry = module
        .entry_points
        .iter()
        .find(|e| e.stage == naga::ShaderStage::Vertex)
        .expect("no vertex entry point");

    let mut locations = Vec::new();
    for argument in &entry.function.arguments {
        match &argument.binding {
            Some(naga::Binding::Location { location, .. }) => locations.push(*location),
            Some(naga::Binding::BuiltIn(_)) => {}
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[argument.ty].inner {
                    for member in members {
                        if let Some(naga::Binding::Location { location, .. }) = member.binding {
                            locations.push(location);
                        }
                    }
                }
            }
        }
    }
    locations.sort_unstable();
    locations
}

#[rstest]
#[case::flat(ShadingVariant::Flat)]
#[case::textured(ShadingVariant::Textured)]
#[case::lit(ShadingVariant::Lit)]
fn test_shader_validates(#[case] variant: ShadingVariant) {
    let module = parse(variant);

    let names: Vec<(&str, naga::ShaderStage)> = module
        .entry_points
        .iter()
        .map(|e| (e.name.as_str(), e.stage))
        .collect();
    assert!(names.contains(&("vs_main", naga::ShaderStage::Vertex)));
    assert!(names.contains(&("fs_main", naga::ShaderStage::Fragment)));
}

/// Vertex inputs line up with the streams bound for the variant.
#[rstest]
#[case::flat(ShadingVariant::Flat)]
#[case::textured(ShadingVariant::Textured)]
#[case::lit(ShadingVariant::Lit)]
fn test_vertex_inputs_match_streams(#[case] variant: ShadingVariant) {
    let module = parse(variant);
    let expected: Vec<u32> = (0..variant.streams().len() as u32).collect();
    assert_eq!(vertex_locations(&module), expected);

    let layouts = variant.vertex_layouts();
    assert_eq!(layouts.len(), variant.streams().len());
    for (slot, layout) in layouts.iter().enumerate() {
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].location, slot as u32);
        assert_eq!(layout.array_stride, variant.streams()[slot].element_size());
    }
}

/// Shader resources all live in group 0 at the bindings the layout declares.
#[rstest]
#[case::flat(ShadingVariant::Flat)]
#[case::textured(ShadingVariant::Textured)]
#[case::lit(ShadingVariant::Lit)]
fn test_resource_bindings(#[case] variant: ShadingVariant) {
    let module = parse(variant);
    let declared: Vec<u32> = bind_group_layout_entries().iter().map(|e| e.binding).collect();
    assert_eq!(declared, vec![UNIFORM_BINDING, SAMPLER_BINDING, TEXTURE_BINDING]);

    let mut used = Vec::new();
    for (_, global) in module.global_variables.iter() {
        if let Some(binding) = &global.binding {
            assert_eq!(binding.group, 0, "{} uses group {}", variant.name(), binding.group);
            assert!(declared.contains(&binding.binding));
            used.push(binding.binding);
        }
    }
    assert!(used.contains(&UNIFORM_BINDING));
}

//! Render pipelines for effect passes, cached by full state.

use std::collections::HashMap;
use std::num::NonZeroU64;

use crate::device::{BlendState, CompareFunction, DepthStencilState};
use crate::effect::{EffectLayout, PassId};
use crate::mesh::Vertex3d;

/// What a draw feeds into the vertex stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum GeometryKind {
    /// Indexed [`Vertex3d`] buffers.
    Mesh,
    /// Three generated vertices, no buffers.
    Fullscreen,
}

/// Everything a `wgpu::RenderPipeline` bakes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub layout: u64,
    pub pass: PassId,
    pub blend: BlendState,
    pub depth: DepthStencilState,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub geometry: GeometryKind,
}

/// Per-layout GPU objects shared by all of its passes.
struct EffectResources {
    module: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
}

#[derive(Default)]
pub(crate) struct PipelineCache {
    effects: HashMap<u64, EffectResources>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles the shader module and bind group layout for an effect layout
    /// the first time it is seen.
    pub fn prepare_effect(&mut self, device: &wgpu::Device, layout: &EffectLayout) {
        self.effects
            .entry(layout.id())
            .or_insert_with(|| create_effect_resources(device, layout));
    }

    pub fn bind_group_layout(&self, layout: u64) -> Option<&wgpu::BindGroupLayout> {
        self.effects.get(&layout).map(|e| &e.bind_group_layout)
    }

    pub fn prepare_pipeline(&mut self, device: &wgpu::Device, layout: &EffectLayout, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        self.prepare_effect(device, layout);
        let Some(resources) = self.effects.get(&layout.id()) else {
            return;
        };
        let pipeline = create_pipeline(device, layout, resources, &key);
        log::debug!(
            "Created pipeline {} / {} ({:?}, {:?})",
            layout.name(),
            layout.pass_decl(key.pass).fragment_entry,
            key.blend,
            key.geometry
        );
        self.pipelines.insert(key, pipeline);
    }

    pub fn pipeline(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }
}

fn create_effect_resources(device: &wgpu::Device, layout: &EffectLayout) -> EffectResources {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(layout.name()),
        source: wgpu::ShaderSource::Wgsl(layout.source().into()),
    });

    let mut entries = vec![wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: NonZeroU64::new(layout.uniform_size() as u64),
        },
        count: None,
    }];
    for slot in 0..layout.texture_count() {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 1 + 2 * slot,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 2 + 2 * slot,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} Bind Group Layout", layout.name())),
        entries: &entries,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} Pipeline Layout", layout.name())),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    EffectResources {
        module,
        bind_group_layout,
        pipeline_layout,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &EffectLayout,
    resources: &EffectResources,
    key: &PipelineKey,
) -> wgpu::RenderPipeline {
    let pass = layout.pass_decl(key.pass);
    let buffers: &[wgpu::VertexBufferLayout] = match key.geometry {
        GeometryKind::Mesh => &[Vertex3d::LAYOUT],
        GeometryKind::Fullscreen => &[],
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{} {}", layout.name(), pass.fragment_entry)),
        layout: Some(&resources.pipeline_layout),
        vertex: wgpu::VertexState {
            module: &resources.module,
            entry_point: Some(&pass.vertex_entry),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &resources.module,
            entry_point: Some(&pass.fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: key.color_format,
                blend: blend_state(key.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            ..Default::default()
        },
        depth_stencil: key.depth_format.map(|format| depth_stencil_state(format, key.depth)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub(crate) fn blend_state(state: BlendState) -> Option<wgpu::BlendState> {
    match state {
        BlendState::Opaque => None,
        BlendState::Additive => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }),
        BlendState::AlphaBlend => Some(wgpu::BlendState::ALPHA_BLENDING),
    }
}

/// A depth-less state still has to name the attachment format when the
/// target carries one.
pub(crate) fn depth_stencil_state(format: wgpu::TextureFormat, state: DepthStencilState) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format,
        depth_write_enabled: state.depth_write,
        depth_compare: if state.depth_test {
            compare_function(state.compare)
        } else {
            wgpu::CompareFunction::Always
        },
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn compare_function(compare: CompareFunction) -> wgpu::CompareFunction {
    match compare {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_depth_test_always_passes() {
        let state = depth_stencil_state(wgpu::TextureFormat::Depth32Float, DepthStencilState::NONE);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);
        assert!(!state.depth_write_enabled);

        let read = depth_stencil_state(wgpu::TextureFormat::Depth32Float, DepthStencilState::DEPTH_READ);
        assert_eq!(read.depth_compare, wgpu::CompareFunction::LessEqual);
        assert!(!read.depth_write_enabled);
    }

    #[test]
    fn additive_blend_adds_source_and_destination() {
        let blend = blend_state(BlendState::Additive).unwrap();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::One);
        assert!(blend_state(BlendState::Opaque).is_none());
    }
}

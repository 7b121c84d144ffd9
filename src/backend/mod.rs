//! wgpu implementation of [`GraphicsDevice`].
//!
//! The toon pipeline drives a stateful, immediate-mode device; wgpu wants
//! render passes. [`WgpuDevice`] records every target switch, clear and draw
//! as a command and replays the list in [`WgpuDevice::present`], opening a new
//! render pass whenever the bound target changes or a clear follows a draw.
//!
//! Uniform blocks captured by `apply_pass` are packed into one buffer per
//! frame and bound with dynamic offsets.

mod pipelines;
mod text;

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::ops::Range;
use std::sync::Arc;

use glam::Vec2;
use log::{info, warn};

use crate::color::Color;
use crate::device::{
    BlendState, ColorFormat, DepthFormat, DepthStencilState, GraphicsDevice, MeshId,
    PresentationParameters, RenderTargetDescriptor, RenderTargetId, TextureId, TextureRef,
};
use crate::effect::{Effect, EffectLayout, PassId};
use crate::error::{Result, ToonError};
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, MeshData};
use crate::texture::Texture;

use pipelines::{GeometryKind, PipelineCache, PipelineKey};
use text::TextRenderer;

pub use text::{Glyph, GlyphAtlas, Vertex2d};

const BACK_BUFFER_DEPTH: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_UNIFORM_CAPACITY: u64 = 64 * 1024;

pub fn wgpu_color_format(format: ColorFormat) -> wgpu::TextureFormat {
    match format {
        ColorFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        ColorFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        ColorFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        ColorFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
    }
}

pub fn color_format(format: wgpu::TextureFormat) -> Option<ColorFormat> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => Some(ColorFormat::Rgba8Unorm),
        wgpu::TextureFormat::Rgba8UnormSrgb => Some(ColorFormat::Rgba8UnormSrgb),
        wgpu::TextureFormat::Bgra8Unorm => Some(ColorFormat::Bgra8Unorm),
        wgpu::TextureFormat::Bgra8UnormSrgb => Some(ColorFormat::Bgra8UnormSrgb),
        wgpu::TextureFormat::Rgba16Float => Some(ColorFormat::Rgba16Float),
        _ => None,
    }
}

pub fn wgpu_depth_format(format: DepthFormat) -> Option<wgpu::TextureFormat> {
    match format {
        DepthFormat::None => None,
        DepthFormat::Depth24Plus => Some(wgpu::TextureFormat::Depth24Plus),
        DepthFormat::Depth32Float => Some(wgpu::TextureFormat::Depth32Float),
    }
}

fn align_to(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

struct OffscreenTarget {
    _color: wgpu::Texture,
    color_view: wgpu::TextureView,
    _depth: Option<wgpu::Texture>,
    depth_view: Option<wgpu::TextureView>,
    format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
}

/// An effect pass captured by `apply_pass`.
struct Program {
    layout: Arc<EffectLayout>,
    pass: PassId,
    uniform_offset: u32,
    textures: Vec<Option<TextureRef>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Geometry {
    Mesh(MeshId),
    Fullscreen,
}

impl Geometry {
    fn kind(self) -> GeometryKind {
        match self {
            Geometry::Mesh(_) => GeometryKind::Mesh,
            Geometry::Fullscreen => GeometryKind::Fullscreen,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Command {
    Target(Option<RenderTargetId>),
    Clear(Color),
    Draw {
        program: usize,
        blend: BlendState,
        depth: DepthStencilState,
        geometry: Geometry,
    },
    Text(Range<u32>),
}

/// One wgpu render pass worth of commands.
#[derive(Debug, PartialEq)]
struct Segment {
    target: Option<RenderTargetId>,
    clear: Option<Color>,
    ops: Vec<Command>,
}

impl Segment {
    fn new(target: Option<RenderTargetId>, clear: Option<Color>) -> Self {
        Self {
            target,
            clear,
            ops: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.clear.is_none() && self.ops.is_empty()
    }
}

/// Splits a recorded frame into render passes. A clear with no draws before
/// it becomes the pass's load op.
fn segments(initial: Option<RenderTargetId>, commands: &[Command]) -> Vec<Segment> {
    let mut out = vec![Segment::new(initial, None)];
    for command in commands {
        let Some(current) = out.last_mut() else {
            break;
        };
        match command {
            Command::Target(target) => {
                if current.target == *target {
                    continue;
                }
                if current.is_empty() {
                    current.target = *target;
                } else {
                    out.push(Segment::new(*target, None));
                }
            }
            Command::Clear(color) => {
                if current.ops.is_empty() {
                    current.clear = Some(*color);
                } else {
                    let target = current.target;
                    out.push(Segment::new(target, Some(*color)));
                }
            }
            op => current.ops.push(op.clone()),
        }
    }
    out.retain(|s| !s.is_empty());
    out
}

/// A [`GraphicsDevice`] backed by wgpu, presenting to a window surface.
pub struct WgpuDevice {
    gpu: GpuContext,
    color_format: ColorFormat,
    pipelines: PipelineCache,
    text: Option<TextRenderer>,
    warned_no_font: bool,

    targets: HashMap<RenderTargetId, OffscreenTarget>,
    textures: HashMap<TextureId, Texture>,
    meshes: HashMap<MeshId, Mesh>,
    next_id: u32,
    white: Texture,
    target_sampler: wgpu::Sampler,
    back_depth: wgpu::TextureView,

    uniform_buffer: wgpu::Buffer,
    uniform_capacity: u64,
    uniform_alignment: usize,
    uniforms: Vec<u8>,
    scratch: Vec<u8>,

    // Current frame
    programs: Vec<Program>,
    commands: Vec<Command>,
    frame_target: Option<RenderTargetId>,

    // Device state
    target: Option<RenderTargetId>,
    blend: BlendState,
    depth: DepthStencilState,
    program: Option<usize>,
}

impl WgpuDevice {
    pub fn new(gpu: GpuContext) -> Result<Self> {
        let color_format = color_format(gpu.format())
            .ok_or_else(|| ToonError::UnsupportedFormat(format!("{:?}", gpu.format())))?;

        let white = Texture::white(&gpu);
        let target_sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Render Target Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let back_depth = create_depth_view(&gpu, "Back Buffer Depth", gpu.width(), gpu.height(), BACK_BUFFER_DEPTH).1;
        let uniform_buffer = create_uniform_buffer(&gpu.device, INITIAL_UNIFORM_CAPACITY);
        let uniform_alignment = gpu.uniform_alignment();

        info!(
            "Graphics device ready: {}x{} {:?}",
            gpu.width(),
            gpu.height(),
            gpu.format()
        );

        Ok(Self {
            gpu,
            color_format,
            pipelines: PipelineCache::new(),
            text: None,
            warned_no_font: false,
            targets: HashMap::new(),
            textures: HashMap::new(),
            meshes: HashMap::new(),
            next_id: 1,
            white,
            target_sampler,
            back_depth,
            uniform_buffer,
            uniform_capacity: INITIAL_UNIFORM_CAPACITY,
            uniform_alignment,
            uniforms: Vec::new(),
            scratch: Vec::new(),
            programs: Vec::new(),
            commands: Vec::new(),
            frame_target: None,
            target: None,
            blend: BlendState::default(),
            depth: DepthStencilState::default(),
            program: None,
        })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_mesh(&mut self, data: &MeshData) -> MeshId {
        let id = MeshId(self.next_id());
        self.meshes.insert(id, Mesh::new(&self.gpu, data));
        id
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.next_id());
        self.textures.insert(id, texture);
        id
    }

    /// Enables `draw_text` with the given TTF/OTF font.
    pub fn load_font(&mut self, font_data: &[u8], size: f32) -> Result<()> {
        let atlas = GlyphAtlas::new(font_data, size)?;
        info!("Font atlas {}x{} at {size}px", atlas.width, atlas.height);
        self.text = Some(TextRenderer::new(&self.gpu, atlas));
        Ok(())
    }

    /// Resizes the surface and back-buffer depth. Offscreen targets follow
    /// when their owner next checks the presentation parameters.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.gpu.resize(width, height) {
            self.back_depth = create_depth_view(&self.gpu, "Back Buffer Depth", width, height, BACK_BUFFER_DEPTH).1;
        } else {
            warn!("Ignoring zero-sized resize to {width}x{height}");
        }
    }

    /// Replays the recorded frame onto the surface and starts a new one.
    pub fn present(&mut self) -> Result<()> {
        let result = self.submit_frame();
        self.programs.clear();
        self.commands.clear();
        self.uniforms.clear();
        if let Some(text) = &mut self.text {
            text.clear();
        }
        self.program = None;
        self.frame_target = self.target;
        result
    }

    fn submit_frame(&mut self) -> Result<()> {
        let Some(frame) = self.gpu.acquire_frame()? else {
            return Ok(());
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let segments = segments(self.frame_target, &self.commands);
        self.upload_uniforms();

        // Pipelines first; bind groups and passes only read the cache.
        for segment in &segments {
            let (color_format, depth_format) = self.attachment_formats(segment.target)?;
            for op in &segment.ops {
                match op {
                    Command::Draw {
                        program,
                        blend,
                        depth,
                        geometry,
                    } => {
                        let program = &self.programs[*program];
                        let key = PipelineKey {
                            layout: program.layout.id(),
                            pass: program.pass,
                            blend: *blend,
                            depth: *depth,
                            color_format,
                            depth_format,
                            geometry: geometry.kind(),
                        };
                        self.pipelines
                            .prepare_pipeline(&self.gpu.device, &program.layout, key);
                    }
                    Command::Text(_) => {
                        if let Some(text) = &mut self.text {
                            text.prepare(&self.gpu, color_format, depth_format);
                        }
                    }
                    Command::Target(_) | Command::Clear(_) => {}
                }
            }
        }

        let bind_groups = self
            .programs
            .iter()
            .map(|program| self.create_bind_group(program))
            .collect::<Result<Vec<_>>>()?;

        if let Some(text) = &self.text {
            text.upload(
                &self.gpu,
                Vec2::new(self.gpu.width() as f32, self.gpu.height() as f32),
            );
        }

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Toon Frame Encoder"),
            });

        for segment in &segments {
            let (color_format, depth_format) = self.attachment_formats(segment.target)?;
            let (color_view, depth_view) = match segment.target {
                None => (&surface_view, Some(&self.back_depth)),
                Some(id) => {
                    let target = self
                        .targets
                        .get(&id)
                        .ok_or(ToonError::UnknownRenderTarget(id.0))?;
                    (&target.color_view, target.depth_view.as_ref())
                }
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Toon Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: match segment.clear {
                            Some(color) => wgpu::LoadOp::Clear(color.to_wgpu()),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: match segment.clear {
                            Some(_) => wgpu::LoadOp::Clear(1.0),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for op in &segment.ops {
                match op {
                    Command::Draw {
                        program: index,
                        blend,
                        depth,
                        geometry,
                    } => {
                        let program = &self.programs[*index];
                        let key = PipelineKey {
                            layout: program.layout.id(),
                            pass: program.pass,
                            blend: *blend,
                            depth: *depth,
                            color_format,
                            depth_format,
                            geometry: geometry.kind(),
                        };
                        let Some(pipeline) = self.pipelines.pipeline(&key) else {
                            continue;
                        };
                        pass.set_pipeline(pipeline);
                        pass.set_bind_group(0, &bind_groups[*index], &[program.uniform_offset]);
                        match geometry {
                            Geometry::Mesh(id) => {
                                let Some(mesh) = self.meshes.get(id) else {
                                    continue;
                                };
                                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                            }
                            Geometry::Fullscreen => pass.draw(0..3, 0..1),
                        }
                    }
                    Command::Text(range) => {
                        if let Some(text) = &self.text {
                            text.draw(&mut pass, color_format, depth_format, range.clone());
                        }
                    }
                    Command::Target(_) | Command::Clear(_) => {}
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn upload_uniforms(&mut self) {
        let needed = self.uniforms.len() as u64;
        if needed > self.uniform_capacity {
            self.uniform_capacity = needed.next_power_of_two();
            self.uniform_buffer = create_uniform_buffer(&self.gpu.device, self.uniform_capacity);
        }
        if needed > 0 {
            self.gpu
                .queue
                .write_buffer(&self.uniform_buffer, 0, &self.uniforms);
        }
    }

    fn attachment_formats(
        &self,
        target: Option<RenderTargetId>,
    ) -> Result<(wgpu::TextureFormat, Option<wgpu::TextureFormat>)> {
        match target {
            None => Ok((self.gpu.format(), Some(BACK_BUFFER_DEPTH))),
            Some(id) => self
                .targets
                .get(&id)
                .map(|t| (t.format, t.depth_format))
                .ok_or(ToonError::UnknownRenderTarget(id.0)),
        }
    }

    fn texture_binding(&self, texture: Option<TextureRef>) -> Result<(&wgpu::TextureView, &wgpu::Sampler)> {
        match texture {
            None => Ok((&self.white.view, &self.white.sampler)),
            Some(TextureRef::Texture(id)) => self
                .textures
                .get(&id)
                .map(|t| (&t.view, &t.sampler))
                .ok_or(ToonError::UnknownTexture(id.0)),
            Some(TextureRef::RenderTarget(id)) => self
                .targets
                .get(&id)
                .map(|t| (&t.color_view, &self.target_sampler))
                .ok_or(ToonError::UnknownRenderTarget(id.0)),
        }
    }

    fn create_bind_group(&self, program: &Program) -> Result<wgpu::BindGroup> {
        let layout = self
            .pipelines
            .bind_group_layout(program.layout.id())
            .ok_or(ToonError::NoPassApplied)?;

        let bindings = program
            .textures
            .iter()
            .map(|t| self.texture_binding(*t))
            .collect::<Result<Vec<_>>>()?;

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &self.uniform_buffer,
                offset: 0,
                size: NonZeroU64::new(program.layout.uniform_size() as u64),
            }),
        }];
        for (slot, (view, sampler)) in bindings.into_iter().enumerate() {
            let slot = slot as u32;
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + 2 * slot,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + 2 * slot,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        Ok(self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(program.layout.name()),
            layout,
            entries: &entries,
        }))
    }

    fn record_draw(&mut self, geometry: Geometry) -> Result<()> {
        let program = self.program.ok_or(ToonError::NoPassApplied)?;
        self.commands.push(Command::Draw {
            program,
            blend: self.blend,
            depth: self.depth,
            geometry,
        });
        Ok(())
    }
}

impl GraphicsDevice for WgpuDevice {
    fn presentation_parameters(&self) -> PresentationParameters {
        PresentationParameters {
            width: self.gpu.width(),
            height: self.gpu.height(),
            color_format: self.color_format,
            depth_format: DepthFormat::Depth32Float,
        }
    }

    fn create_render_target(&mut self, desc: &RenderTargetDescriptor) -> Result<RenderTargetId> {
        let max = self.gpu.max_texture_size();
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(ToonError::RenderTargetAllocation {
                label: desc.label.clone(),
                width: desc.width,
                height: desc.height,
                reason: format!("dimensions must be within 1..={max}"),
            });
        }

        let format = wgpu_color_format(desc.color_format);
        let color = self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_format = wgpu_depth_format(desc.depth_format);
        let (depth, depth_view) = match depth_format {
            Some(format) => {
                let (texture, view) = create_depth_view(
                    &self.gpu,
                    &format!("{} Depth", desc.label),
                    desc.width,
                    desc.height,
                    format,
                );
                (Some(texture), Some(view))
            }
            None => (None, None),
        };

        let id = RenderTargetId(self.next_id());
        self.targets.insert(
            id,
            OffscreenTarget {
                _color: color,
                color_view,
                _depth: depth,
                depth_view,
                format,
                depth_format,
            },
        );
        Ok(id)
    }

    fn release_render_target(&mut self, id: RenderTargetId) {
        if self.targets.remove(&id).is_none() {
            warn!("Released unknown render target {}", id.0);
        }
        if self.target == Some(id) {
            self.set_render_target(None);
        }
    }

    fn set_render_target(&mut self, target: Option<RenderTargetId>) {
        self.target = target;
        self.commands.push(Command::Target(target));
    }

    fn render_target(&self) -> Option<RenderTargetId> {
        self.target
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(Command::Clear(color));
    }

    fn blend_state(&self) -> BlendState {
        self.blend
    }

    fn set_blend_state(&mut self, state: BlendState) {
        self.blend = state;
    }

    fn depth_stencil_state(&self) -> DepthStencilState {
        self.depth
    }

    fn set_depth_stencil_state(&mut self, state: DepthStencilState) {
        self.depth = state;
    }

    fn apply_pass(&mut self, effect: &Effect, pass: PassId) -> Result<()> {
        let layout = effect.layout();
        let known = layout
            .techniques()
            .get(pass.technique.0)
            .is_some_and(|t| pass.index < t.passes.len());
        if !known {
            return Err(ToonError::MissingPass {
                effect: layout.name().to_string(),
                technique: effect.current_technique_name().to_string(),
                pass: format!("#{}", pass.index),
            });
        }

        effect.write_uniforms(&mut self.scratch);
        let offset = align_to(self.uniforms.len(), self.uniform_alignment);
        self.uniforms.resize(offset, 0);
        self.uniforms.extend_from_slice(&self.scratch);

        self.programs.push(Program {
            layout: Arc::clone(layout),
            pass,
            uniform_offset: offset as u32,
            textures: effect.textures().collect(),
        });
        self.program = Some(self.programs.len() - 1);
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshId) -> Result<()> {
        if !self.meshes.contains_key(&mesh) {
            return Err(ToonError::UnknownMesh(mesh.0));
        }
        self.record_draw(Geometry::Mesh(mesh))
    }

    fn draw_fullscreen(&mut self) -> Result<()> {
        self.record_draw(Geometry::Fullscreen)
    }

    fn draw_text(&mut self, text: &str, position: Vec2, color: Color) {
        let Some(renderer) = &mut self.text else {
            if !self.warned_no_font {
                warn!("No font loaded, skipping text");
                self.warned_no_font = true;
            }
            return;
        };
        if let Some(range) = renderer.queue(text, position, color) {
            self.commands.push(Command::Text(range));
        }
    }
}

fn create_uniform_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Effect Uniforms"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_depth_view(
    gpu: &GpuContext,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Option<RenderTargetId> = Some(RenderTargetId(1));
    const B: Option<RenderTargetId> = Some(RenderTargetId(2));

    fn draw() -> Command {
        Command::Draw {
            program: 0,
            blend: BlendState::Opaque,
            depth: DepthStencilState::DEFAULT,
            geometry: Geometry::Fullscreen,
        }
    }

    #[test]
    fn clear_before_draws_becomes_load_op() {
        let commands = [Command::Target(A), Command::Clear(Color::BLACK), draw(), draw()];
        let out = segments(None, &commands);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target, A);
        assert_eq!(out[0].clear, Some(Color::BLACK));
        assert_eq!(out[0].ops.len(), 2);
    }

    #[test]
    fn clear_after_draw_opens_new_pass() {
        let commands = [draw(), Command::Clear(Color::RED), draw()];
        let out = segments(B, &commands);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].clear, None);
        assert_eq!(out[1].target, B);
        assert_eq!(out[1].clear, Some(Color::RED));
    }

    #[test]
    fn target_switches_split_and_idle_targets_vanish() {
        let commands = [
            Command::Target(A),
            Command::Target(B),
            draw(),
            Command::Target(B),
            draw(),
            Command::Target(None),
            Command::Clear(Color::WHITE),
        ];
        let out = segments(None, &commands);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].target, B);
        assert_eq!(out[0].ops.len(), 2);
        assert_eq!(out[1].target, None);
        assert!(out[1].ops.is_empty());
    }

    #[test]
    fn surface_formats_map_to_color_formats() {
        for format in [
            ColorFormat::Rgba8Unorm,
            ColorFormat::Bgra8UnormSrgb,
            ColorFormat::Rgba16Float,
        ] {
            assert_eq!(color_format(wgpu_color_format(format)), Some(format));
        }
        assert_eq!(color_format(wgpu::TextureFormat::R8Unorm), None);
    }
}

//! Caption text: a fontdue glyph atlas and batched pixel-space quads.

use std::collections::HashMap;
use std::ops::Range;

use fontdue::{Font, FontSettings};
use glam::Vec2;

use crate::backend::pipelines::depth_stencil_state;
use crate::color::Color;
use crate::device::DepthStencilState;
use crate::error::{Result, ToonError};
use crate::gpu::GpuContext;

/// Vertex for overlay text, in target pixels with the origin top-left.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2d {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };
}

/// Target size in pixels, padded to 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Viewport {
    size: [f32; 2],
    _pad: [f32; 2],
}

const MAX_VERTICES: usize = 16384;
const GLYPH_GAP: u32 = 1;

/// One rasterized character and where it sits in the atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub uv_min: Vec2,
    pub uv_max: Vec2,
    /// Bitmap size in pixels.
    pub size: Vec2,
    /// Offset of the bitmap's bottom-left corner from the pen position,
    /// y pointing up.
    pub bearing: Vec2,
    pub advance: f32,
}

/// Printable ASCII rasterized at one pixel size into a single-channel bitmap.
#[derive(Debug)]
pub struct GlyphAtlas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    glyphs: HashMap<char, Glyph>,
    line_height: f32,
}

impl GlyphAtlas {
    pub fn new(font_data: &[u8], px: f32) -> Result<Self> {
        let font = Font::from_bytes(font_data, FontSettings::default()).map_err(|e| ToonError::Font(e.to_string()))?;
        let bitmaps: Vec<_> = (' '..='~').map(|c| (c, font.rasterize(c, px))).collect();
        let sizes: Vec<_> = bitmaps.iter().map(|(_, (m, _))| (m.width as u32, m.height as u32)).collect();

        let mut extent = (128u32, 128u32);
        let slots = loop {
            if let Some(slots) = shelf_pack(&sizes, extent.0, extent.1) {
                break slots;
            }
            // Grow the shorter side so the atlas stays close to square.
            if extent.0 <= extent.1 {
                extent.0 *= 2;
            } else {
                extent.1 *= 2;
            }
        };
        let (width, height) = extent;
        let scale = Vec2::new(width as f32, height as f32);

        let mut pixels = vec![0u8; (width * height) as usize];
        let mut glyphs = HashMap::with_capacity(bitmaps.len());
        for ((c, (metrics, bitmap)), &(x, y)) in bitmaps.iter().zip(&slots) {
            let w = metrics.width;
            if w > 0 {
                for (row, line) in bitmap.chunks_exact(w).enumerate() {
                    let start = (y as usize + row) * width as usize + x as usize;
                    pixels[start..start + w].copy_from_slice(line);
                }
            }

            let size = Vec2::new(metrics.width as f32, metrics.height as f32);
            let corner = Vec2::new(x as f32, y as f32);
            glyphs.insert(
                *c,
                Glyph {
                    uv_min: corner / scale,
                    uv_max: (corner + size) / scale,
                    size,
                    bearing: Vec2::new(metrics.xmin as f32, metrics.ymin as f32),
                    advance: metrics.advance_width,
                },
            );
        }

        Ok(Self {
            width,
            height,
            pixels,
            glyphs,
            line_height: px,
        })
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c)
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Appends two triangles per visible glyph, with `origin` at the top-left
    /// of the line. Characters outside the atlas advance by half an em.
    pub fn layout(&self, text: &str, origin: Vec2, color: Color, out: &mut Vec<Vertex2d>) {
        let color = color.to_array();
        let baseline = origin.y + self.line_height;
        let mut pen = origin.x;

        for c in text.chars() {
            let Some(glyph) = self.glyph(c) else {
                pen += self.line_height * 0.5;
                continue;
            };

            if glyph.size.min_element() > 0.0 {
                let min = Vec2::new(pen + glyph.bearing.x, baseline - glyph.bearing.y - glyph.size.y);
                let max = min + glyph.size;
                let vertex = |x: f32, y: f32, u: f32, v: f32| Vertex2d {
                    position: [x, y],
                    uv: [u, v],
                    color,
                };
                let (uv0, uv1) = (glyph.uv_min, glyph.uv_max);
                let top_left = vertex(min.x, min.y, uv0.x, uv0.y);
                let top_right = vertex(max.x, min.y, uv1.x, uv0.y);
                let bottom_left = vertex(min.x, max.y, uv0.x, uv1.y);
                let bottom_right = vertex(max.x, max.y, uv1.x, uv1.y);
                out.extend_from_slice(&[top_left, top_right, bottom_left, top_right, bottom_right, bottom_left]);
            }

            pen += glyph.advance;
        }
    }
}

/// Places rectangles left to right on shelves as tall as their tallest
/// member, keeping [`GLYPH_GAP`] pixels between neighbours and the border.
/// Returns the top-left corner of each, or `None` if they do not fit.
fn shelf_pack(sizes: &[(u32, u32)], width: u32, height: u32) -> Option<Vec<(u32, u32)>> {
    let mut slots = Vec::with_capacity(sizes.len());
    let (mut x, mut y, mut shelf) = (GLYPH_GAP, GLYPH_GAP, 0);

    for &(w, h) in sizes {
        if w + 2 * GLYPH_GAP > width {
            return None;
        }
        if x + w + GLYPH_GAP > width {
            x = GLYPH_GAP;
            y += shelf + GLYPH_GAP;
            shelf = 0;
        }
        if y + h + GLYPH_GAP > height {
            return None;
        }
        slots.push((x, y));
        x += w + GLYPH_GAP;
        shelf = shelf.max(h);
    }
    Some(slots)
}

/// GPU side of the caption: atlas texture, vertex buffer and pipelines per
/// attachment format.
pub(crate) struct TextRenderer {
    atlas: GlyphAtlas,
    module: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<(wgpu::TextureFormat, Option<wgpu::TextureFormat>), wgpu::RenderPipeline>,
    vertex_buffer: wgpu::Buffer,
    viewport: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertices: Vec<Vertex2d>,
}

impl TextRenderer {
    pub fn new(gpu: &GpuContext, atlas: GlyphAtlas) -> Self {
        use wgpu::util::DeviceExt;

        let device = &gpu.device;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Text Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/text.wgsl").into()),
        });

        let viewport = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Text Viewport"),
            size: std::mem::size_of::<Viewport>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let extent = wgpu::Extent3d {
            width: atlas.width,
            height: atlas.height,
            depth_or_array_layers: 1,
        };
        let atlas_texture = device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some("Glyph Atlas"),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::R8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &atlas.pixels,
        );
        let atlas_view = atlas_texture.create_view(&Default::default());
        let atlas_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Glyph Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Text Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<Viewport>() as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Text Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: viewport.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&atlas_sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Text Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Text Vertex Buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex2d>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            atlas,
            module,
            pipeline_layout,
            pipelines: HashMap::new(),
            vertex_buffer,
            viewport,
            bind_group,
            vertices: Vec::with_capacity(1024),
        }
    }

    /// Queues a string and returns its vertex range, or `None` once the
    /// vertex buffer is full.
    pub fn queue(&mut self, text: &str, origin: Vec2, color: Color) -> Option<Range<u32>> {
        let start = self.vertices.len();
        self.atlas.layout(text, origin, color, &mut self.vertices);
        if self.vertices.len() > MAX_VERTICES {
            self.vertices.truncate(start);
            log::warn!("Text vertex buffer full, dropping \"{text}\"");
            return None;
        }
        Some(start as u32..self.vertices.len() as u32)
    }

    pub fn prepare(&mut self, gpu: &GpuContext, color_format: wgpu::TextureFormat, depth_format: Option<wgpu::TextureFormat>) {
        let (module, layout) = (&self.module, &self.pipeline_layout);
        self.pipelines.entry((color_format, depth_format)).or_insert_with(|| {
            gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Text Pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs"),
                    buffers: &[Vertex2d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: depth_format.map(|f| depth_stencil_state(f, DepthStencilState::NONE)),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });
    }

    /// Uploads queued vertices and the target resolution.
    pub fn upload(&self, gpu: &GpuContext, resolution: Vec2) {
        let viewport = Viewport {
            size: resolution.to_array(),
            _pad: [0.0; 2],
        };
        gpu.queue.write_buffer(&self.viewport, 0, bytemuck::bytes_of(&viewport));
        if !self.vertices.is_empty() {
            gpu.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
        }
    }

    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
        vertices: Range<u32>,
    ) {
        let Some(pipeline) = self.pipelines.get(&(color_format, depth_format)) else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(vertices, 0..1);
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

//! Sampled textures: material textures, the sketch overlay and the white
//! fallback bound to empty texture slots.

use std::path::Path;

use image::{Rgba, RgbaImage};
use log::info;

use crate::error::Result;
use crate::gpu::GpuContext;

/// How texel values are read back in the shader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    /// Color images; decoded to linear on sampling.
    Srgb,
    /// Data such as the hatching intensities, sampled as stored.
    Linear,
}

impl ColorSpace {
    fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// A GPU texture with a repeating, filtered sampler.
#[derive(Debug)]
pub struct Texture {
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
}

impl Texture {
    pub fn from_image(gpu: &GpuContext, image: &RgbaImage, label: &str, color_space: ColorSpace) -> Self {
        use wgpu::util::DeviceExt;

        let (width, height) = image.dimensions();
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: color_space.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            image.as_raw(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // The sketch overlay is tiled across the screen, so wrap in both axes.
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            _texture: texture,
            view,
            sampler,
            width,
            height,
            color_space,
        }
    }

    /// Loads an image file. Hatching images are intensity data and should be
    /// loaded as [`ColorSpace::Linear`].
    pub fn from_file(gpu: &GpuContext, path: impl AsRef<Path>, color_space: ColorSpace) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgba8();
        info!("Loaded texture {} ({}x{})", path.display(), image.width(), image.height());
        Ok(Self::from_image(gpu, &image, &path.display().to_string(), color_space))
    }

    pub fn from_bytes(gpu: &GpuContext, bytes: &[u8], label: &str, color_space: ColorSpace) -> Result<Self> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::from_image(gpu, &image, label, color_space))
    }

    pub fn white(gpu: &GpuContext) -> Self {
        let image = RgbaImage::from_pixel(1, 1, Rgba([255; 4]));
        Self::from_image(gpu, &image, "White Texture", ColorSpace::Linear)
    }

    /// A procedural hatching texture for the sketch overlay.
    pub fn sketch(gpu: &GpuContext, size: u32, seed: u32) -> Self {
        Self::from_image(gpu, &sketch_pattern(size, seed), "Sketch Texture", ColorSpace::Linear)
    }
}

/// A tileable hatching pattern: light paper grain with dark diagonal strokes
/// of varying weight in two crossing directions.
pub fn sketch_pattern(size: u32, seed: u32) -> RgbaImage {
    let spacing = (size / 16).max(2);

    RgbaImage::from_fn(size, size, |x, y| {
        let forward = (x + y) % spacing;
        let backward = (x + size - y) % spacing;
        let stroke = hash(x / spacing, (x + y) / spacing, seed);
        let cross = hash(y / spacing, (x + size - y) / spacing, seed.wrapping_add(7));

        let mut ink = 0;
        if forward == 0 && stroke % 3 != 0 {
            ink += 110 + stroke % 60;
        }
        if backward == 0 && cross % 2 == 0 {
            ink += 70 + cross % 50;
        }
        ink += hash(x, y, seed.wrapping_add(31)) % 24;

        let value = 255u32.saturating_sub(ink) as u8;
        Rgba([value, value, value, 255])
    })
}

fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed
        .wrapping_add(x.wrapping_mul(374_761_393))
        .wrapping_add(y.wrapping_mul(668_265_263));
    h ^= h >> 13;
    h = h.wrapping_mul(1_274_126_177);
    h ^ (h >> 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sketch_pattern_is_opaque_and_has_strokes() {
        let image = sketch_pattern(64, 3);
        assert_eq!(image.dimensions(), (64, 64));
        assert!(image.pixels().all(|p| p[3] == 255));
        assert!(image.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));

        let darkest = image.pixels().map(|p| p[0]).min().unwrap();
        let lightest = image.pixels().map(|p| p[0]).max().unwrap();
        assert!(darkest < 160, "expected dark strokes, darkest was {darkest}");
        assert!(lightest > 230, "expected light paper, lightest was {lightest}");
    }

    #[test]
    fn sketch_pattern_is_deterministic_per_seed() {
        assert_eq!(sketch_pattern(32, 9), sketch_pattern(32, 9));
        assert_ne!(sketch_pattern(32, 9), sketch_pattern(32, 10));
    }
}

//! In-memory configuration for the renderer and the demo application.

use std::path::PathBuf;

use glam::Vec2;

use crate::color::Color;
use crate::settings::{NonPhotoRealisticSettings, PRESETS};
use crate::toon_shader::LightingMode;

/// Settings for [`ToonRenderer`](crate::ToonRenderer).
#[derive(Clone, Debug)]
pub struct RendererConfig {
    pub lighting: LightingMode,
    /// Clear color for the scene pass.
    pub background: Color,
    /// Top-left of the preset caption, in pixels.
    pub caption_origin: Vec2,
    /// Key name shown in the caption.
    pub cycle_key_label: String,
    pub presets: Vec<NonPhotoRealisticSettings>,
    pub initial_preset: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            lighting: LightingMode::SinglePass,
            background: Color::CORNFLOWER_BLUE,
            caption_origin: Vec2::new(64.0, 64.0),
            cycle_key_label: "A".to_string(),
            presets: PRESETS.to_vec(),
            initial_preset: 0,
        }
    }
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lighting(mut self, lighting: LightingMode) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn caption(mut self, origin: Vec2, key_label: impl Into<String>) -> Self {
        self.caption_origin = origin;
        self.cycle_key_label = key_label.into();
        self
    }

    pub fn presets(mut self, presets: Vec<NonPhotoRealisticSettings>) -> Self {
        self.presets = presets;
        self
    }

    pub fn initial_preset(mut self, index: usize) -> Self {
        self.initial_preset = index;
        self
    }
}

/// Settings for the demo window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// TTF/OTF file for the caption. Without one the caption is skipped.
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    /// STL model to display; a torus is used when absent.
    pub model_path: Option<PathBuf>,
    pub model_scale: f32,
    /// Hatching image; a procedural pattern is generated when absent.
    pub sketch_texture_path: Option<PathBuf>,
    /// Seed for the sketch jitter.
    pub seed: u64,
    pub renderer: RendererConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Toon Shader".to_string(),
            width: 1024,
            height: 780,
            font_path: None,
            font_size: 18.0,
            model_path: None,
            model_scale: 60.0,
            sketch_texture_path: None,
            seed: 42,
            renderer: RendererConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn font(mut self, path: impl Into<PathBuf>, size: f32) -> Self {
        self.font_path = Some(path.into());
        self.font_size = size;
        self
    }

    pub fn model(mut self, path: impl Into<PathBuf>, scale: f32) -> Self {
        self.model_path = Some(path.into());
        self.model_scale = scale;
        self
    }

    pub fn sketch_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.sketch_texture_path = Some(path.into());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }
}

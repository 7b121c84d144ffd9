//! Non-photorealistic rendering presets.
//!
//! A preset bundles the toon, edge-detection and sketch settings that are
//! switched as a unit. [`PresetCycle`] holds the fixed preset list and the
//! active index; the index only moves through [`PresetCycle::advance`].

use std::borrow::Cow;

use crate::error::{Result, ToonError};

#[derive(Clone, Debug, PartialEq)]
pub struct NonPhotoRealisticSettings {
    pub name: Cow<'static, str>,
    pub enable_toon_shading: bool,
    pub enable_edge_detect: bool,
    pub edge_width: f32,
    pub edge_intensity: f32,
    pub enable_sketch: bool,
    pub sketch_threshold: f32,
    pub sketch_brightness: f32,
    pub sketch_in_color: bool,
    /// Seconds between jitter updates; zero freezes the overlay.
    pub sketch_jitter_speed: f32,
}

impl NonPhotoRealisticSettings {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        name: &'static str,
        enable_toon_shading: bool,
        enable_edge_detect: bool,
        edge_width: f32,
        edge_intensity: f32,
        enable_sketch: bool,
        sketch_threshold: f32,
        sketch_brightness: f32,
        sketch_in_color: bool,
        sketch_jitter_speed: f32,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            enable_toon_shading,
            enable_edge_detect,
            edge_width,
            edge_intensity,
            enable_sketch,
            sketch_threshold,
            sketch_brightness,
            sketch_in_color,
            sketch_jitter_speed,
        }
    }

    /// Whether scene color has to go through an offscreen target.
    pub fn needs_post_process(&self) -> bool {
        self.enable_edge_detect || self.enable_sketch
    }
}

#[rustfmt::skip]
pub const PRESETS: [NonPhotoRealisticSettings; 6] = [
    NonPhotoRealisticSettings::new("Cartoon",                 true,  true,  1.0, 1.0, false, 0.0, 0.0,  false, 0.0),
    NonPhotoRealisticSettings::new("Pencil",                  false, true,  0.5, 0.5, true,  0.1, 0.3,  false, 0.05),
    NonPhotoRealisticSettings::new("Chunky Monochrome",       true,  true,  1.5, 0.5, true,  0.0, 0.35, false, 0.0),
    NonPhotoRealisticSettings::new("Colored Hatching",        false, true,  1.0, 1.0, true,  0.2, 0.5,  true,  0.1),
    NonPhotoRealisticSettings::new("Subtle Edge Enhancement", false, true,  0.5, 0.5, false, 0.0, 0.0,  false, 0.0),
    NonPhotoRealisticSettings::new("Nothing Special",         false, false, 0.0, 0.0, false, 0.0, 0.0,  false, 0.0),
];

/// A fixed, non-empty preset list and the index of the active preset.
#[derive(Clone, Debug)]
pub struct PresetCycle {
    presets: Vec<NonPhotoRealisticSettings>,
    index: usize,
}

impl PresetCycle {
    pub fn new(presets: Vec<NonPhotoRealisticSettings>) -> Result<Self> {
        Self::with_start(presets, 0)
    }

    pub fn with_start(presets: Vec<NonPhotoRealisticSettings>, index: usize) -> Result<Self> {
        if presets.is_empty() {
            return Err(ToonError::EmptyPresetList);
        }
        if index >= presets.len() {
            return Err(ToonError::PresetIndex {
                index,
                len: presets.len(),
            });
        }
        Ok(Self { presets, index })
    }

    pub fn builtin() -> Self {
        Self {
            presets: PRESETS.to_vec(),
            index: 0,
        }
    }

    /// Moves to the next preset, wrapping around, and returns it.
    pub fn advance(&mut self) -> &NonPhotoRealisticSettings {
        self.index = (self.index + 1) % self.presets.len();
        &self.presets[self.index]
    }

    pub fn current(&self) -> &NonPhotoRealisticSettings {
        &self.presets[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn presets(&self) -> &[NonPhotoRealisticSettings] {
        &self.presets
    }
}

impl Default for PresetCycle {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_starts_at_cartoon() {
        let cycle = PresetCycle::builtin();
        assert_eq!(cycle.len(), 6);
        assert_eq!(cycle.current().name, "Cartoon");
    }

    #[test]
    fn advancing_len_times_returns_to_start() {
        for start in 0..PRESETS.len() {
            let mut cycle = PresetCycle::with_start(PRESETS.to_vec(), start).unwrap();
            for _ in 0..cycle.len() {
                cycle.advance();
            }
            assert_eq!(cycle.index(), start);
        }
    }

    #[test]
    fn rejects_empty_and_out_of_range() {
        assert!(matches!(PresetCycle::new(Vec::new()), Err(ToonError::EmptyPresetList)));
        assert!(matches!(
            PresetCycle::with_start(PRESETS.to_vec(), 6),
            Err(ToonError::PresetIndex { index: 6, len: 6 })
        ));
    }

    #[test]
    fn nothing_special_needs_no_post_process() {
        assert!(!PRESETS[5].needs_post_process());
        assert!(PRESETS[4].needs_post_process());
    }
}

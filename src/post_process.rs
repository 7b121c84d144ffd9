//! The NPR post-process compositor.
//!
//! [`ToonPostProcess`] owns the active preset and decides, pass by pass, which
//! target each object is drawn into and with which technique
//! ([`ToonPostProcess::select_pass`]). At the end of the frame it composites
//! the scene color and normal-depth targets onto the back buffer through the
//! edge-detect and sketch techniques, then draws the preset caption.
//!
//! Which targets have been cleared this frame is tracked in a [`FrameState`]
//! owned by the caller, so several objects can share one frame's targets.

use std::collections::HashMap;

use glam::Vec2;
use log::info;
use rand::rngs::StdRng;
use rand::RngExt;

use crate::color::Color;
use crate::config::RendererConfig;
use crate::device::{BlendState, DepthStencilState, GraphicsDevice, TextureRef};
use crate::effect::{Effect, Param, PassId, TechniqueId};
use crate::error::Result;
use crate::render_target::ToonTargets;
use crate::settings::{NonPhotoRealisticSettings, PresetCycle};

pub const NORMAL_DEPTH: &str = "NormalDepth";
pub const TOON: &str = "Toon";
pub const LAMBERT: &str = "Lambert";

pub const EDGE_DETECT: &str = "EdgeDetect";
pub const EDGE_DETECT_COLOR_SKETCH: &str = "EdgeDetectColorSketch";
pub const EDGE_DETECT_MONO_SKETCH: &str = "EdgeDetectMonoSketch";
pub const COLOR_SKETCH: &str = "ColorSketch";
pub const MONO_SKETCH: &str = "MonoSketch";

const COMPOSITE_TECHNIQUES: [&str; 5] = [
    EDGE_DETECT,
    EDGE_DETECT_COLOR_SKETCH,
    EDGE_DETECT_MONO_SKETCH,
    COLOR_SKETCH,
    MONO_SKETCH,
];

/// Whether the pass loop continues after a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassFlow {
    Continue,
    Stop,
    /// The pass index is past the end of the sequence.
    Invalid,
}

impl PassFlow {
    /// `1`, `0` or `-1`.
    pub fn code(self) -> i32 {
        match self {
            PassFlow::Continue => 1,
            PassFlow::Stop => 0,
            PassFlow::Invalid => -1,
        }
    }
}

/// The render target a pass left bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassTarget {
    NormalDepth,
    SceneColor,
    BackBuffer,
    /// The pass did not touch the render target.
    Unchanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassState {
    pub technique: &'static str,
    pub flow: PassFlow,
    pub target: PassTarget,
}

/// Per-frame clear bookkeeping, reset at the start of every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameState {
    pub normal_depth_cleared: bool,
    pub scene_cleared: bool,
    pub back_buffer_cleared: bool,
}

/// Selects the composite technique from the active effects.
///
/// Without edge detection the sketch overlay is assumed on.
pub fn composite_technique(edge_detect: bool, sketch: bool, sketch_in_color: bool) -> &'static str {
    match (edge_detect, sketch, sketch_in_color) {
        (true, true, true) => EDGE_DETECT_COLOR_SKETCH,
        (true, true, false) => EDGE_DETECT_MONO_SKETCH,
        (true, false, _) => EDGE_DETECT,
        (false, _, true) => COLOR_SKETCH,
        (false, _, false) => MONO_SKETCH,
    }
}

/// The shading technique for the scene-color pass.
pub fn shading_technique(settings: &NonPhotoRealisticSettings) -> &'static str {
    if settings.enable_toon_shading {
        TOON
    } else {
        LAMBERT
    }
}

#[derive(Clone, Copy, Debug)]
struct NprParams {
    edge_width: Param<f32>,
    edge_intensity: Param<f32>,
    screen_resolution: Param<Vec2>,
    sketch_threshold: Param<f32>,
    sketch_brightness: Param<f32>,
    sketch_jitter: Param<Vec2>,
    scene_texture: Param<Option<TextureRef>>,
    normal_depth_texture: Param<Option<TextureRef>>,
    sketch_texture: Param<Option<TextureRef>>,
}

impl NprParams {
    fn resolve(effect: &Effect) -> Result<Self> {
        Ok(Self {
            edge_width: effect.param("EdgeWidth")?,
            edge_intensity: effect.param("EdgeIntensity")?,
            screen_resolution: effect.param("ScreenResolution")?,
            sketch_threshold: effect.param("SketchThreshold")?,
            sketch_brightness: effect.param("SketchBrightness")?,
            sketch_jitter: effect.param("SketchJitter")?,
            scene_texture: effect.param("SceneTexture")?,
            normal_depth_texture: effect.param("NormalDepthTexture")?,
            sketch_texture: effect.param("SketchTexture")?,
        })
    }
}

/// The post-process compositor and owner of the active NPR preset.
#[derive(Debug)]
pub struct ToonPostProcess {
    effect: Effect,
    params: NprParams,
    techniques: HashMap<&'static str, (TechniqueId, PassId)>,
    presets: PresetCycle,
    sketch_texture: Option<TextureRef>,
    sketch_jitter: Vec2,
    time_to_next_jitter: f32,
    background: Color,
    caption_origin: Vec2,
    cycle_key_label: String,
}

impl ToonPostProcess {
    pub fn new(
        effect: Effect,
        sketch_texture: Option<TextureRef>,
        config: &RendererConfig,
    ) -> Result<Self> {
        let presets = PresetCycle::with_start(config.presets.clone(), config.initial_preset)?;
        let params = NprParams::resolve(&effect)?;
        let mut techniques = HashMap::new();
        for name in COMPOSITE_TECHNIQUES {
            let technique = effect.technique(name)?;
            techniques.insert(name, (technique, effect.pass(technique, "P0")?));
        }

        Ok(Self {
            effect,
            params,
            techniques,
            presets,
            sketch_texture,
            sketch_jitter: Vec2::ZERO,
            time_to_next_jitter: 0.0,
            background: config.background,
            caption_origin: config.caption_origin,
            cycle_key_label: config.cycle_key_label.clone(),
        })
    }

    /// The active preset.
    pub fn settings(&self) -> &NonPhotoRealisticSettings {
        self.presets.current()
    }

    pub fn preset_index(&self) -> usize {
        self.presets.index()
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn sketch_jitter(&self) -> Vec2 {
        self.sketch_jitter
    }

    /// Switches to the next preset and restarts the jitter countdown.
    pub fn advance_preset(&mut self) -> &NonPhotoRealisticSettings {
        self.time_to_next_jitter = 0.0;
        let settings = self.presets.advance();
        info!("NPR preset: {}", settings.name);
        settings
    }

    /// Advances the sketch jitter animation by `elapsed` seconds.
    pub fn update(&mut self, elapsed: f32, rng: &mut StdRng) {
        let speed = self.presets.current().sketch_jitter_speed;
        if speed <= 0.0 {
            return;
        }
        self.time_to_next_jitter -= elapsed;
        if self.time_to_next_jitter <= 0.0 {
            self.sketch_jitter = Vec2::new(rng.random_range(0.0..1.0), rng.random_range(0.0..1.0));
            self.time_to_next_jitter += speed;
        }
    }

    pub fn caption(&self) -> String {
        format!("{} = settings ({})", self.cycle_key_label, self.settings().name)
    }

    /// Binds the target for pass `index` of one object and names its technique.
    pub fn select_pass(
        &self,
        device: &mut dyn GraphicsDevice,
        targets: &dyn ToonTargets,
        frame: &mut FrameState,
        index: usize,
    ) -> PassState {
        let settings = self.settings();
        match index {
            0 => {
                let target = if settings.enable_edge_detect {
                    device.set_render_target(Some(targets.normal_depth_target().id));
                    if !frame.normal_depth_cleared {
                        device.clear(Color::BLACK);
                        frame.normal_depth_cleared = true;
                    }
                    PassTarget::NormalDepth
                } else {
                    PassTarget::Unchanged
                };
                PassState {
                    technique: NORMAL_DEPTH,
                    flow: PassFlow::Continue,
                    target,
                }
            }
            1 => {
                let (id, cleared, target) = if settings.needs_post_process() {
                    (
                        Some(targets.scene_target().id),
                        &mut frame.scene_cleared,
                        PassTarget::SceneColor,
                    )
                } else {
                    (None, &mut frame.back_buffer_cleared, PassTarget::BackBuffer)
                };
                device.set_render_target(id);
                if !*cleared {
                    device.clear(self.background);
                    *cleared = true;
                }
                PassState {
                    technique: shading_technique(settings),
                    flow: PassFlow::Continue,
                    target,
                }
            }
            2 => {
                let target = if settings.needs_post_process() {
                    device.set_render_target(None);
                    PassTarget::BackBuffer
                } else {
                    PassTarget::Unchanged
                };
                PassState {
                    technique: shading_technique(settings),
                    flow: PassFlow::Stop,
                    target,
                }
            }
            _ => PassState {
                technique: "",
                flow: PassFlow::Invalid,
                target: PassTarget::Unchanged,
            },
        }
    }

    /// Composites the offscreen targets onto the back buffer and draws the caption.
    pub fn apply_post_process(
        &mut self,
        device: &mut dyn GraphicsDevice,
        targets: &dyn ToonTargets,
        frame: &mut FrameState,
    ) -> Result<()> {
        let settings = self.presets.current().clone();

        if settings.needs_post_process() {
            self.clear_unused_targets(device, targets, frame, &settings);
            device.set_render_target(None);

            let params = self.params;
            let effect = &mut self.effect;
            if settings.enable_sketch {
                effect.set(params.sketch_threshold, settings.sketch_threshold);
                effect.set(params.sketch_brightness, settings.sketch_brightness);
                effect.set(params.sketch_jitter, self.sketch_jitter);
                effect.set(params.sketch_texture, self.sketch_texture);
            }

            let scene = targets.scene_target();
            let resolution = Vec2::new(scene.width as f32, scene.height as f32);
            effect.set(params.screen_resolution, resolution);
            if settings.enable_edge_detect {
                effect.set(params.edge_width, settings.edge_width);
                effect.set(params.edge_intensity, settings.edge_intensity);
                effect.set(
                    params.normal_depth_texture,
                    Some(TextureRef::RenderTarget(targets.normal_depth_target().id)),
                );
            }
            effect.set(params.scene_texture, Some(TextureRef::RenderTarget(scene.id)));

            let name = composite_technique(
                settings.enable_edge_detect,
                settings.enable_sketch,
                settings.sketch_in_color,
            );
            let (technique, pass) = self.techniques[name];
            effect.set_current_technique(technique);

            let blend = device.blend_state();
            let depth = device.depth_stencil_state();
            device.set_blend_state(BlendState::Opaque);
            device.set_depth_stencil_state(DepthStencilState::NONE);
            let result = device
                .apply_pass(effect, pass)
                .and_then(|_| device.draw_fullscreen());
            device.set_blend_state(blend);
            device.set_depth_stencil_state(depth);
            result?;
        } else if !frame.back_buffer_cleared {
            device.set_render_target(None);
            device.clear(self.background);
            frame.back_buffer_cleared = true;
        }

        let caption = self.caption();
        device.set_render_target(None);
        device.draw_text(&caption, self.caption_origin + Vec2::ONE, Color::BLACK);
        device.draw_text(&caption, self.caption_origin, Color::WHITE);
        Ok(())
    }

    /// Clears targets no object was drawn into this frame, so the composite
    /// never samples a previous frame's contents.
    fn clear_unused_targets(
        &self,
        device: &mut dyn GraphicsDevice,
        targets: &dyn ToonTargets,
        frame: &mut FrameState,
        settings: &NonPhotoRealisticSettings,
    ) {
        if settings.enable_edge_detect && !frame.normal_depth_cleared {
            device.set_render_target(Some(targets.normal_depth_target().id));
            device.clear(Color::BLACK);
            frame.normal_depth_cleared = true;
        }
        if !frame.scene_cleared {
            device.set_render_target(Some(targets.scene_target().id));
            device.clear(self.background);
            frame.scene_cleared = true;
        }
    }
}

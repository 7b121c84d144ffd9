//! A [`GraphicsDevice`] that records every call instead of drawing.

#![allow(dead_code)]

use toonpass::*;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    CreateTarget(RenderTargetId, String),
    ReleaseTarget(RenderTargetId),
    SetTarget(Option<RenderTargetId>),
    Clear(Option<RenderTargetId>, Color),
    ApplyPass(String),
    DrawMesh(MeshId),
    DrawFullscreen,
    Text(String, Vec2, Color),
}

/// An effect as it was when `apply_pass` captured it, with the device state
/// the pass would draw under.
#[derive(Clone, Debug)]
pub struct AppliedPass {
    pub effect: Effect,
    pub technique: String,
    pub target: Option<RenderTargetId>,
    pub blend: BlendState,
    pub depth: DepthStencilState,
}

impl AppliedPass {
    pub fn bool(&self, name: &str) -> bool {
        match self.effect.value(name) {
            Some(ParamValue::Bool(v)) => *v,
            other => panic!("{name} is not a bool: {other:?}"),
        }
    }

    pub fn float(&self, name: &str) -> f32 {
        match self.effect.value(name) {
            Some(ParamValue::Float(v)) => *v,
            other => panic!("{name} is not a float: {other:?}"),
        }
    }

    pub fn int(&self, name: &str) -> i32 {
        match self.effect.value(name) {
            Some(ParamValue::Int(v)) => *v,
            other => panic!("{name} is not an int: {other:?}"),
        }
    }

    pub fn vec2(&self, name: &str) -> Vec2 {
        match self.effect.value(name) {
            Some(ParamValue::Vec2(v)) => *v,
            other => panic!("{name} is not a vec2: {other:?}"),
        }
    }

    pub fn vec3(&self, name: &str) -> Vec3 {
        match self.effect.value(name) {
            Some(ParamValue::Vec3(v)) => *v,
            other => panic!("{name} is not a vec3: {other:?}"),
        }
    }

    pub fn vec4(&self, name: &str) -> Vec4 {
        match self.effect.value(name) {
            Some(ParamValue::Vec4(v)) => *v,
            other => panic!("{name} is not a vec4: {other:?}"),
        }
    }

    pub fn texture(&self, name: &str) -> Option<TextureRef> {
        match self.effect.value(name) {
            Some(ParamValue::Texture(v)) => *v,
            other => panic!("{name} is not a texture: {other:?}"),
        }
    }
}

pub struct RecordingDevice {
    pub params: PresentationParameters,
    pub events: Vec<Event>,
    pub applied: Vec<AppliedPass>,
    pub live_targets: Vec<RenderTargetId>,
    /// Zero-based index of the `create_render_target` call that fails.
    pub fail_allocation: Option<usize>,
    allocations: usize,
    next_id: u32,
    target: Option<RenderTargetId>,
    blend: BlendState,
    depth: DepthStencilState,
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            params: PresentationParameters {
                width,
                height,
                color_format: ColorFormat::Bgra8UnormSrgb,
                depth_format: DepthFormat::Depth32Float,
            },
            events: Vec::new(),
            applied: Vec::new(),
            live_targets: Vec::new(),
            fail_allocation: None,
            allocations: 0,
            next_id: 1,
            target: None,
            blend: BlendState::default(),
            depth: DepthStencilState::default(),
        }
    }

    pub fn reset_log(&mut self) {
        self.events.clear();
        self.applied.clear();
    }

    pub fn clears_of(&self, target: Option<RenderTargetId>) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Clear(t, _) if *t == target))
            .count()
    }

    pub fn applied_techniques(&self) -> Vec<&str> {
        self.applied.iter().map(|p| p.technique.as_str()).collect()
    }

    pub fn texts(&self) -> Vec<(String, Vec2, Color)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Text(s, p, c) => Some((s.clone(), *p, *c)),
                _ => None,
            })
            .collect()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn presentation_parameters(&self) -> PresentationParameters {
        self.params
    }

    fn create_render_target(&mut self, desc: &RenderTargetDescriptor) -> Result<RenderTargetId> {
        let call = self.allocations;
        self.allocations += 1;
        if self.fail_allocation == Some(call) {
            return Err(ToonError::RenderTargetAllocation {
                label: desc.label.clone(),
                width: desc.width,
                height: desc.height,
                reason: "out of memory".to_string(),
            });
        }
        let id = RenderTargetId(self.next_id);
        self.next_id += 1;
        self.live_targets.push(id);
        self.events.push(Event::CreateTarget(id, desc.label.clone()));
        Ok(id)
    }

    fn release_render_target(&mut self, id: RenderTargetId) {
        self.live_targets.retain(|t| *t != id);
        self.events.push(Event::ReleaseTarget(id));
    }

    fn set_render_target(&mut self, target: Option<RenderTargetId>) {
        self.target = target;
        self.events.push(Event::SetTarget(target));
    }

    fn render_target(&self) -> Option<RenderTargetId> {
        self.target
    }

    fn clear(&mut self, color: Color) {
        self.events.push(Event::Clear(self.target, color));
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

    fn apply_pass(&mut self, effect: &Effect, _pass: PassId) -> Result<()> {
        let technique = effect.current_technique_name().to_string();
        self.events.push(Event::ApplyPass(technique.clone()));
        self.applied.push(AppliedPass {
            effect: effect.clone(),
            technique,
            target: self.target,
            blend: self.blend,
            depth: self.depth,
        });
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshId) -> Result<()> {
        self.events.push(Event::DrawMesh(mesh));
        Ok(())
    }

    fn draw_fullscreen(&mut self) -> Result<()> {
        self.events.push(Event::DrawFullscreen);
        Ok(())
    }

    fn draw_text(&mut self, text: &str, position: Vec2, color: Color) {
        self.events.push(Event::Text(text.to_string(), position, color));
    }
}

pub const SKETCH: TextureRef = TextureRef::Texture(TextureId(99));
pub const MESH: MeshId = MeshId(7);

pub fn renderer(device: &mut RecordingDevice, config: &RendererConfig) -> ToonRenderer {
    ToonRenderer::new(
        device,
        Effect::new(toon_effect_layout()),
        Effect::new(npr_effect_layout()),
        Some(SKETCH),
        config,
    )
    .unwrap()
}

pub fn renderer_with_preset(device: &mut RecordingDevice, preset: usize) -> ToonRenderer {
    renderer(device, &RendererConfig::default().initial_preset(preset))
}

pub fn directional(x: f32, color: Vec4) -> LightNode {
    LightNode::new(LightSource::directional(Vec3::new(x, -1.0, -1.0), color))
}

pub fn camera() -> CameraParameters {
    Camera::new()
        .at(60.0, 100.0, -80.0)
        .looking_at(0.0, 0.0, 0.0)
        .parameters(1024.0 / 780.0)
}

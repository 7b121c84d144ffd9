//! Per-object toon shading with multi-pass light accumulation.
//!
//! [`ToonShader::render`] draws one object with a named technique: a base pass
//! with opaque blending and depth writes, followed by additive passes with depth
//! writes off, one per directional light (or one per batch of lights in
//! [`LightingMode::Batched`]). Device blend and depth state are restored
//! afterwards, whether or not the draws succeeded.

use std::collections::HashMap;

use glam::{Mat4, Vec3, Vec4};

use crate::camera::CameraParameters;
use crate::device::{BlendState, DepthStencilState, GraphicsDevice, TextureRef};
use crate::effect::{Effect, Param, ParamType, PassId, TechniqueId};
use crate::effects::TOON_TECHNIQUES;
use crate::error::{Result, ToonError};
use crate::light::{LightNode, LightSet, LightSource};
use crate::material::Material;

/// Draw callback invoked once per pass with the device in the pass's state.
pub type RenderCallback<'a> = dyn FnMut(&mut dyn GraphicsDevice) -> Result<()> + 'a;

/// How additive light passes use the effect's light parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LightingMode {
    /// One pass per light through the `light` block.
    #[default]
    SinglePass,
    /// Up to `max_lights_per_pass` lights per pass through the `lights` array.
    Batched { max_lights_per_pass: usize },
}

const BASE_PASS: &str = "P0";

fn optional_param<T: ParamType>(effect: &Effect, name: &str) -> Result<Option<Param<T>>> {
    match effect.param::<T>(name) {
        Ok(p) => Ok(Some(p)),
        Err(ToonError::MissingParameter { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Handles to one light's parameter block (`light.*` or `lights[i].*`).
#[derive(Clone, Copy, Debug)]
struct LightBlock {
    direction: Param<Vec3>,
    falloff: Param<f32>,
    position: Param<Vec3>,
    range: Param<f32>,
    color: Param<Vec4>,
    attenuation0: Param<f32>,
    attenuation1: Param<f32>,
    attenuation2: Param<f32>,
    inner_cone_angle: Param<f32>,
    outer_cone_angle: Param<f32>,
}

impl LightBlock {
    fn resolve(effect: &Effect, prefix: &str) -> Result<Self> {
        let name = |member: &str| format!("{prefix}.{member}");
        Ok(Self {
            direction: effect.param(&name("direction"))?,
            falloff: effect.param(&name("falloff"))?,
            position: effect.param(&name("position"))?,
            range: effect.param(&name("range"))?,
            color: effect.param(&name("color"))?,
            attenuation0: effect.param(&name("attenuation0"))?,
            attenuation1: effect.param(&name("attenuation1"))?,
            attenuation2: effect.param(&name("attenuation2"))?,
            inner_cone_angle: effect.param(&name("innerConeAngle"))?,
            outer_cone_angle: effect.param(&name("outerConeAngle"))?,
        })
    }

    fn bind(&self, effect: &mut Effect, light: &LightSource) {
        effect.set(self.direction, light.direction);
        effect.set(self.falloff, light.falloff);
        effect.set(self.position, light.position);
        effect.set(self.range, light.range);
        effect.set(self.color, light.diffuse);
        effect.set(self.attenuation0, light.attenuation0);
        effect.set(self.attenuation1, light.attenuation1);
        effect.set(self.attenuation2, light.attenuation2);
        effect.set(self.inner_cone_angle, light.inner_cone_angle);
        effect.set(self.outer_cone_angle, light.outer_cone_angle);
    }
}

#[derive(Clone, Copy, Debug)]
struct GeometryParams {
    world: Param<Mat4>,
    view_projection: Param<Mat4>,
    world_for_normal: Param<Mat4>,
    camera_position: Param<Vec3>,
}

impl GeometryParams {
    fn resolve(effect: &Effect) -> Result<Self> {
        Ok(Self {
            world: effect.param("world")?,
            view_projection: effect.param("viewProjection")?,
            world_for_normal: effect.param("worldForNormal")?,
            camera_position: effect.param("cameraPosition")?,
        })
    }

    fn bind(&self, effect: &mut Effect, world: Mat4, camera: &CameraParameters) {
        effect.set(self.world, world);
        effect.set(self.view_projection, camera.view_projection());
        effect.set(self.world_for_normal, world.inverse().transpose());
        effect.set(self.camera_position, camera.position);
    }
}

#[derive(Clone, Debug)]
struct LightParams {
    ambient: Param<Vec4>,
    is_light_pass: Option<Param<bool>>,
    light: Option<LightBlock>,
    batch: Vec<LightBlock>,
    number_of_lights: Option<Param<i32>>,
}

impl LightParams {
    fn resolve(effect: &Effect, mode: LightingMode) -> Result<Self> {
        let ambient = effect.param("ambientLightColor")?;
        let is_light_pass = optional_param(effect, "isLightPass")?;

        match mode {
            LightingMode::SinglePass => Ok(Self {
                ambient,
                is_light_pass,
                light: Some(LightBlock::resolve(effect, "light")?),
                batch: Vec::new(),
                number_of_lights: optional_param(effect, "numberOfLights")?,
            }),
            LightingMode::Batched { max_lights_per_pass } => {
                let supported = (0..)
                    .take_while(|i| effect.value(&format!("lights[{i}].direction")).is_some())
                    .count();
                if max_lights_per_pass == 0 || max_lights_per_pass > supported {
                    return Err(ToonError::LightBatch {
                        requested: max_lights_per_pass,
                        supported,
                    });
                }
                let batch = (0..max_lights_per_pass)
                    .map(|i| LightBlock::resolve(effect, &format!("lights[{i}]")))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self {
                    ambient,
                    is_light_pass,
                    light: None,
                    batch,
                    number_of_lights: Some(effect.param("numberOfLights")?),
                })
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct MaterialParams {
    emissive: Param<Vec4>,
    diffuse: Param<Vec4>,
    specular: Param<Vec4>,
    specular_power: Param<f32>,
    texture: Param<Option<TextureRef>>,
    texture_enabled: Param<bool>,
}

impl MaterialParams {
    fn resolve(effect: &Effect) -> Result<Self> {
        Ok(Self {
            emissive: effect.param("emissiveColor")?,
            diffuse: effect.param("diffuseColor")?,
            specular: effect.param("specularColor")?,
            specular_power: effect.param("specularPower")?,
            texture: effect.param("toonTexture")?,
            texture_enabled: effect.param("TextureEnabled")?,
        })
    }

    fn bind(&self, effect: &mut Effect, material: &Material) {
        effect.set(self.emissive, material.emissive);
        effect.set(self.diffuse, material.diffuse);
        effect.set(self.specular, material.specular);
        effect.set(self.specular_power, material.specular_power);
        if material.has_texture() {
            effect.set(self.texture, material.texture);
        }
        effect.set(self.texture_enabled, material.has_texture());
    }
}

/// An effect instance with its parameter handles resolved.
#[derive(Clone, Debug)]
struct BoundEffect {
    effect: Effect,
    geometry: GeometryParams,
    lights: LightParams,
    techniques: HashMap<&'static str, (TechniqueId, PassId)>,
}

impl BoundEffect {
    /// Resolves the minimal parameter set every toon-capable effect carries.
    fn resolve(effect: Effect, mode: LightingMode) -> Result<Self> {
        let mut techniques = HashMap::new();
        for name in TOON_TECHNIQUES {
            let technique = effect.technique(name)?;
            let pass = effect.pass(technique, BASE_PASS)?;
            techniques.insert(name, (technique, pass));
        }
        Ok(Self {
            geometry: GeometryParams::resolve(&effect)?,
            lights: LightParams::resolve(&effect, mode)?,
            techniques,
            effect,
        })
    }

    fn select(&mut self, technique: &str) -> Result<PassId> {
        let &(id, pass) =
            self.techniques
                .get(technique)
                .ok_or_else(|| ToonError::MissingTechnique {
                    effect: self.effect.name().to_string(),
                    technique: technique.to_string(),
                })?;
        self.effect.set_current_technique(id);
        Ok(pass)
    }
}

/// The toon shading stage.
#[derive(Debug)]
pub struct ToonShader {
    default: BoundEffect,
    material: MaterialParams,
    material_effect: Option<BoundEffect>,
    mode: LightingMode,
    camera: CameraParameters,
    lights: LightSet,
}

impl ToonShader {
    pub fn new(effect: Effect, mode: LightingMode) -> Result<Self> {
        let material = MaterialParams::resolve(&effect)?;
        Ok(Self {
            default: BoundEffect::resolve(effect, mode)?,
            material,
            material_effect: None,
            mode,
            camera: CameraParameters::default(),
            lights: LightSet::default(),
        })
    }

    pub fn lights(&self) -> &LightSet {
        &self.lights
    }

    /// The effect the next `render` call draws with.
    pub fn effect(&self) -> &Effect {
        &self.active().effect
    }

    fn active(&self) -> &BoundEffect {
        self.material_effect.as_ref().unwrap_or(&self.default)
    }

    pub fn set_camera_parameters(&mut self, view: Mat4, projection: Mat4, position: Vec3) {
        self.camera = CameraParameters {
            view,
            projection,
            position,
        };
    }

    pub fn set_material_parameters(&mut self, material: &Material) -> Result<()> {
        match &material.effect {
            Some(effect) => {
                match &mut self.material_effect {
                    Some(bound) if bound.effect.layout().id() == effect.layout().id() => {
                        bound.effect = effect.clone();
                    }
                    slot => *slot = Some(BoundEffect::resolve(effect.clone(), self.mode)?),
                }
            }
            None => {
                self.material_effect = None;
                self.material.bind(&mut self.default.effect, material);
            }
        }
        Ok(())
    }

    pub fn set_light_parameters(&mut self, global: &[LightNode], local: &[LightNode]) {
        self.lights = LightSet::gather(global, local);
    }

    /// Draws one object through `technique`, invoking `callback` once for the
    /// base pass and once for every additive light pass.
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        world: Mat4,
        technique: &str,
        callback: Option<&mut RenderCallback<'_>>,
    ) -> Result<()> {
        let callback = callback.ok_or(ToonError::MissingRenderCallback)?;

        let Self {
            default,
            material_effect,
            mode,
            camera,
            lights,
            ..
        } = self;
        let bound = material_effect.as_mut().unwrap_or(default);

        bound.geometry.bind(&mut bound.effect, world, camera);
        bound.effect.set(bound.lights.ambient, lights.ambient());
        let pass = bound.select(technique)?;

        let blend = device.blend_state();
        let depth = device.depth_stencil_state();
        let result = Self::draw_passes(device, bound, pass, *mode, lights, callback);
        device.set_blend_state(blend);
        device.set_depth_stencil_state(depth);
        result
    }

    fn draw_passes(
        device: &mut dyn GraphicsDevice,
        bound: &mut BoundEffect,
        pass: PassId,
        mode: LightingMode,
        lights: &LightSet,
        callback: &mut RenderCallback<'_>,
    ) -> Result<()> {
        let params = &bound.lights;
        let effect = &mut bound.effect;

        device.set_depth_stencil_state(DepthStencilState::DEFAULT);
        device.set_blend_state(BlendState::Opaque);
        if let Some(flag) = params.is_light_pass {
            effect.set(flag, false);
        }
        if let Some(count) = params.number_of_lights {
            effect.set(count, 0);
        }
        device.apply_pass(effect, pass)?;
        callback(&mut *device)?;

        device.set_blend_state(BlendState::Additive);
        device.set_depth_stencil_state(DepthStencilState::DEPTH_READ);
        if let Some(flag) = params.is_light_pass {
            effect.set(flag, true);
        }

        match (mode, params.light) {
            (LightingMode::SinglePass, Some(block)) => {
                for light in lights.directional() {
                    block.bind(effect, light);
                    device.apply_pass(effect, pass)?;
                    callback(&mut *device)?;
                }
            }
            _ => {
                let directional: Vec<&LightSource> = lights.directional().collect();
                for chunk in directional.chunks(params.batch.len().max(1)) {
                    for (block, light) in params.batch.iter().zip(chunk) {
                        block.bind(effect, light);
                    }
                    if let Some(count) = params.number_of_lights {
                        effect.set(count, chunk.len() as i32);
                    }
                    device.apply_pass(effect, pass)?;
                    callback(&mut *device)?;
                }
            }
        }
        Ok(())
    }
}

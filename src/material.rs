use glam::Vec4;

use crate::device::TextureRef;
use crate::effect::Effect;

/// Surface parameters of a drawable.
///
/// A material that carries its own [`Effect`] is rendered through that effect;
/// only the geometry, camera and light parameters are bound on it, and its
/// color parameters are left as the effect instance holds them.
#[derive(Clone, Debug)]
pub struct Material {
    pub emissive: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub specular_power: f32,
    pub texture: Option<TextureRef>,
    pub effect: Option<Effect>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            emissive: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vec4::ONE,
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            specular_power: 10.0,
            texture: None,
            effect: None,
        }
    }
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissive(mut self, color: Vec4) -> Self {
        self.emissive = color;
        self
    }

    pub fn diffuse(mut self, color: Vec4) -> Self {
        self.diffuse = color;
        self
    }

    pub fn specular(mut self, color: Vec4, power: f32) -> Self {
        self.specular = color;
        self.specular_power = power;
        self
    }

    pub fn texture(mut self, texture: impl Into<TextureRef>) -> Self {
        self.texture = Some(texture.into());
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }
}

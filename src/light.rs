//! Light sources and per-frame light gathering.
//!
//! A [`LightNode`] is a light as it sits in the scene: a [`LightSource`] plus the
//! node's world transform and the ambient color it contributes. Each frame the
//! toon shader collects the enabled nodes into a [`LightSet`].

use glam::{Mat4, Vec3, Vec4};

/// Ambient value that means "no ambient contribution".
pub const DEFAULT_AMBIENT: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LightType {
    #[default]
    Directional,
    Point,
    Spot,
}

/// A single light's shading parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSource {
    pub light_type: LightType,
    pub enabled: bool,
    pub direction: Vec3,
    pub position: Vec3,
    pub falloff: f32,
    pub range: f32,
    pub diffuse: Vec4,
    pub attenuation0: f32,
    pub attenuation1: f32,
    pub attenuation2: f32,
    pub inner_cone_angle: f32,
    pub outer_cone_angle: f32,
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            light_type: LightType::Directional,
            enabled: true,
            direction: Vec3::new(0.0, 0.0, -1.0),
            position: Vec3::ZERO,
            falloff: 1.0,
            range: 100.0,
            diffuse: Vec4::ONE,
            attenuation0: 1.0,
            attenuation1: 0.0,
            attenuation2: 0.0,
            inner_cone_angle: 0.0,
            outer_cone_angle: 0.0,
        }
    }
}

impl LightSource {
    pub fn directional(direction: Vec3, diffuse: Vec4) -> Self {
        Self {
            light_type: LightType::Directional,
            direction: direction.normalize_or_zero(),
            diffuse,
            ..Default::default()
        }
    }

    pub fn point(position: Vec3, range: f32, diffuse: Vec4) -> Self {
        Self {
            light_type: LightType::Point,
            position,
            range,
            diffuse,
            ..Default::default()
        }
    }

    pub fn spot(
        position: Vec3,
        direction: Vec3,
        inner_cone_angle: f32,
        outer_cone_angle: f32,
        diffuse: Vec4,
    ) -> Self {
        Self {
            light_type: LightType::Spot,
            position,
            direction: direction.normalize_or_zero(),
            inner_cone_angle,
            outer_cone_angle,
            diffuse,
            ..Default::default()
        }
    }

    pub fn with_attenuation(mut self, constant: f32, linear: f32, quadratic: f32) -> Self {
        self.attenuation0 = constant;
        self.attenuation1 = linear;
        self.attenuation2 = quadratic;
        self
    }

    pub fn with_falloff(mut self, falloff: f32) -> Self {
        self.falloff = falloff;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A light placed in the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightNode {
    pub source: LightSource,
    pub ambient: Vec4,
    pub world: Mat4,
}

impl LightNode {
    pub fn new(source: LightSource) -> Self {
        Self {
            source,
            ambient: DEFAULT_AMBIENT,
            world: Mat4::IDENTITY,
        }
    }

    pub fn with_ambient(mut self, ambient: Vec4) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    pub fn transformed_direction(&self) -> Vec3 {
        self.world
            .transform_vector3(self.source.direction)
            .normalize_or_zero()
    }

    /// Captures the light for this frame with its direction in world space.
    pub fn snapshot(&self) -> LightSource {
        let mut source = self.source;
        if source.light_type != LightType::Point {
            source.direction = self.transformed_direction();
        }
        source
    }
}

/// The lights active for one frame, in precedence order.
#[derive(Clone, Debug, PartialEq)]
pub struct LightSet {
    lights: Vec<LightSource>,
    ambient: Vec4,
}

impl Default for LightSet {
    fn default() -> Self {
        Self {
            lights: Vec::new(),
            ambient: DEFAULT_AMBIENT,
        }
    }
}

impl LightSet {
    /// Gathers local lights back to front, then global lights front to back.
    ///
    /// Disabled lights are skipped entirely. The first enabled light whose
    /// ambient differs from [`DEFAULT_AMBIENT`] fixes the frame's ambient term.
    pub fn gather(global: &[LightNode], local: &[LightNode]) -> Self {
        let mut set = Self::default();
        let mut ambient_set = false;

        for node in local.iter().rev().chain(global.iter()) {
            if !node.source.enabled {
                continue;
            }
            if !ambient_set && node.ambient != DEFAULT_AMBIENT {
                set.ambient = node.ambient;
                ambient_set = true;
            }
            set.lights.push(node.snapshot());
        }

        set
    }

    pub fn lights(&self) -> &[LightSource] {
        &self.lights
    }

    /// Lights driven through the additive lighting passes.
    pub fn directional(&self) -> impl Iterator<Item = &LightSource> {
        self.lights
            .iter()
            .filter(|l| l.light_type == LightType::Directional)
    }

    pub fn directional_count(&self) -> usize {
        self.directional().count()
    }

    pub fn ambient(&self) -> Vec4 {
        self.ambient
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }
}

//! Named-parameter shader effects.
//!
//! An [`EffectLayout`] describes one WGSL shader asset: its uniform parameters,
//! its textures and its techniques. Parameters and techniques are looked up by
//! string name once, up front, producing typed handles ([`Param`],
//! [`TechniqueId`], [`PassId`]) that are then used every frame. A failed lookup
//! is an asset error and is reported immediately.
//!
//! # Binding model
//!
//! All non-texture parameters live in a single uniform block at
//! `@group(0) @binding(0)`, laid out in declaration order with WGSL alignment
//! rules. Texture `i` (in declaration order) is bound at `@binding(1 + 2 * i)`
//! with its sampler at `@binding(2 + 2 * i)`. Booleans are stored as `u32`.
//!
//! ```ignore
//! let layout = EffectLayout::builder("Outline", include_str!("outline.wgsl"))
//!     .param("EdgeWidth", ParamKind::Float)
//!     .param("ScreenResolution", ParamKind::Vec2)
//!     .texture("SceneTexture")
//!     .technique("EdgeDetect", &[("P0", "vs_fullscreen", "fs_edge")])
//!     .build();
//!
//! let mut effect = Effect::new(layout);
//! let width = effect.param::<f32>("EdgeWidth")?;
//! effect.set(width, 1.5);
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::device::TextureRef;
use crate::error::{Result, ToonError};

static NEXT_LAYOUT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Texture,
}

impl ParamKind {
    pub fn name(self) -> &'static str {
        match self {
            ParamKind::Float => "f32",
            ParamKind::Int => "i32",
            ParamKind::Bool => "bool",
            ParamKind::Vec2 => "vec2",
            ParamKind::Vec3 => "vec3",
            ParamKind::Vec4 => "vec4",
            ParamKind::Mat4 => "mat4x4",
            ParamKind::Texture => "texture",
        }
    }

    /// WGSL (alignment, size) in a uniform buffer.
    fn align_size(self) -> (u32, u32) {
        match self {
            ParamKind::Float | ParamKind::Int | ParamKind::Bool => (4, 4),
            ParamKind::Vec2 => (8, 8),
            ParamKind::Vec3 => (16, 12),
            ParamKind::Vec4 => (16, 16),
            ParamKind::Mat4 => (16, 64),
            ParamKind::Texture => (0, 0),
        }
    }

    fn default_value(self) -> ParamValue {
        match self {
            ParamKind::Float => ParamValue::Float(0.0),
            ParamKind::Int => ParamValue::Int(0),
            ParamKind::Bool => ParamValue::Bool(false),
            ParamKind::Vec2 => ParamValue::Vec2(Vec2::ZERO),
            ParamKind::Vec3 => ParamValue::Vec3(Vec3::ZERO),
            ParamKind::Vec4 => ParamValue::Vec4(Vec4::ZERO),
            ParamKind::Mat4 => ParamValue::Mat4(Mat4::IDENTITY),
            ParamKind::Texture => ParamValue::Texture(None),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Texture(Option<TextureRef>),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Vec2(_) => ParamKind::Vec2,
            ParamValue::Vec3(_) => ParamKind::Vec3,
            ParamValue::Vec4(_) => ParamKind::Vec4,
            ParamValue::Mat4(_) => ParamKind::Mat4,
            ParamValue::Texture(_) => ParamKind::Texture,
        }
    }

    fn write(&self, out: &mut [u8]) {
        match self {
            ParamValue::Float(v) => out[..4].copy_from_slice(bytemuck::bytes_of(v)),
            ParamValue::Int(v) => out[..4].copy_from_slice(bytemuck::bytes_of(v)),
            ParamValue::Bool(v) => out[..4].copy_from_slice(bytemuck::bytes_of(&(*v as u32))),
            ParamValue::Vec2(v) => out[..8].copy_from_slice(bytemuck::bytes_of(&v.to_array())),
            ParamValue::Vec3(v) => out[..12].copy_from_slice(bytemuck::bytes_of(&v.to_array())),
            ParamValue::Vec4(v) => out[..16].copy_from_slice(bytemuck::bytes_of(&v.to_array())),
            ParamValue::Mat4(v) => out[..64].copy_from_slice(bytemuck::bytes_of(&v.to_cols_array())),
            ParamValue::Texture(_) => {}
        }
    }
}

/// Rust types that can be stored in an effect parameter.
pub trait ParamType: Copy {
    const KIND: ParamKind;
    fn into_value(self) -> ParamValue;
    fn from_value(value: &ParamValue) -> Option<Self>;
}

macro_rules! param_type {
    ($ty:ty, $kind:ident) => {
        impl ParamType for $ty {
            const KIND: ParamKind = ParamKind::$kind;

            fn into_value(self) -> ParamValue {
                ParamValue::$kind(self)
            }

            fn from_value(value: &ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$kind(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

param_type!(f32, Float);
param_type!(i32, Int);
param_type!(bool, Bool);
param_type!(Vec2, Vec2);
param_type!(Vec3, Vec3);
param_type!(Vec4, Vec4);
param_type!(Mat4, Mat4);
param_type!(Option<TextureRef>, Texture);

/// A typed handle to one parameter of an effect layout.
#[derive(Debug)]
pub struct Param<T> {
    index: usize,
    layout: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Param<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Param<T> {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TechniqueId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PassId {
    pub(crate) technique: TechniqueId,
    pub(crate) index: usize,
}

impl PassId {
    pub fn technique(&self) -> TechniqueId {
        self.technique
    }
}

#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub name: String,
    pub kind: ParamKind,
    /// Byte offset in the uniform block; `None` for textures.
    pub offset: Option<u32>,
    /// Texture slot; `None` for uniforms.
    pub texture_slot: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct PassDecl {
    pub name: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
}

#[derive(Clone, Debug)]
pub struct TechniqueDecl {
    pub name: String,
    pub passes: Vec<PassDecl>,
}

/// The static description of a shader asset.
#[derive(Debug)]
pub struct EffectLayout {
    id: u64,
    name: String,
    source: Cow<'static, str>,
    params: Vec<ParamDecl>,
    lookup: HashMap<String, usize>,
    techniques: Vec<TechniqueDecl>,
    uniform_size: u32,
    texture_count: u32,
}

impl EffectLayout {
    pub fn builder(name: impl Into<String>, source: impl Into<Cow<'static, str>>) -> EffectLayoutBuilder {
        EffectLayoutBuilder {
            name: name.into(),
            source: source.into(),
            params: Vec::new(),
            techniques: Vec::new(),
            cursor: 0,
            texture_count: 0,
        }
    }

    /// Unique per layout; used to key GPU pipeline caches.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    pub fn techniques(&self) -> &[TechniqueDecl] {
        &self.techniques
    }

    /// Size of the uniform block in bytes, a multiple of 16.
    pub fn uniform_size(&self) -> u32 {
        self.uniform_size
    }

    pub fn texture_count(&self) -> u32 {
        self.texture_count
    }

    pub fn param_decl(&self, name: &str) -> Option<&ParamDecl> {
        self.lookup.get(name).map(|&i| &self.params[i])
    }

    pub fn pass_decl(&self, pass: PassId) -> &PassDecl {
        &self.techniques[pass.technique.0].passes[pass.index]
    }

    pub fn technique_decl(&self, technique: TechniqueId) -> &TechniqueDecl {
        &self.techniques[technique.0]
    }
}

pub struct EffectLayoutBuilder {
    name: String,
    source: Cow<'static, str>,
    params: Vec<ParamDecl>,
    techniques: Vec<TechniqueDecl>,
    cursor: u32,
    texture_count: u32,
}

fn align_to(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

impl EffectLayoutBuilder {
    pub fn param(mut self, name: &str, kind: ParamKind) -> Self {
        if kind == ParamKind::Texture {
            return self.texture(name);
        }
        let (align, size) = kind.align_size();
        let offset = align_to(self.cursor, align);
        self.cursor = offset + size;
        self.push(name.to_string(), kind, Some(offset), None);
        self
    }

    /// A struct parameter; members are addressed as `name.member`.
    pub fn structure(mut self, name: &str, members: &[(&str, ParamKind)]) -> Self {
        let base = align_to(self.cursor, 16);
        let size = self.push_members(name, base, members);
        self.cursor = base + size;
        self
    }

    /// An array of structs; members are addressed as `name[i].member`.
    pub fn structure_array(mut self, name: &str, count: usize, members: &[(&str, ParamKind)]) -> Self {
        let mut base = align_to(self.cursor, 16);
        for i in 0..count {
            let size = self.push_members(&format!("{name}[{i}]"), base, members);
            base += size;
        }
        self.cursor = base;
        self
    }

    pub fn texture(mut self, name: &str) -> Self {
        let slot = self.texture_count;
        self.texture_count += 1;
        self.push(name.to_string(), ParamKind::Texture, None, Some(slot));
        self
    }

    /// Declares a technique as `(pass name, vertex entry, fragment entry)` triples.
    pub fn technique(mut self, name: &str, passes: &[(&str, &str, &str)]) -> Self {
        self.techniques.push(TechniqueDecl {
            name: name.to_string(),
            passes: passes
                .iter()
                .map(|(pass, vs, fs)| PassDecl {
                    name: pass.to_string(),
                    vertex_entry: vs.to_string(),
                    fragment_entry: fs.to_string(),
                })
                .collect(),
        });
        self
    }

    pub fn build(self) -> Arc<EffectLayout> {
        let lookup = self
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        Arc::new(EffectLayout {
            id: NEXT_LAYOUT_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            source: self.source,
            params: self.params,
            lookup,
            techniques: self.techniques,
            uniform_size: align_to(self.cursor.max(16), 16),
            texture_count: self.texture_count,
        })
    }

    /// Returns the struct's padded size.
    fn push_members(&mut self, prefix: &str, base: u32, members: &[(&str, ParamKind)]) -> u32 {
        let mut local = 0;
        for (member, kind) in members {
            let (align, size) = kind.align_size();
            let offset = align_to(local, align);
            local = offset + size;
            self.push(format!("{prefix}.{member}"), *kind, Some(base + offset), None);
        }
        align_to(local.max(16), 16)
    }

    fn push(&mut self, name: String, kind: ParamKind, offset: Option<u32>, texture_slot: Option<u32>) {
        self.params.push(ParamDecl {
            name,
            kind,
            offset,
            texture_slot,
        });
    }
}

/// An instance of an effect layout with its own parameter values.
#[derive(Clone, Debug)]
pub struct Effect {
    layout: Arc<EffectLayout>,
    values: Vec<ParamValue>,
    technique: TechniqueId,
}

impl Effect {
    pub fn new(layout: Arc<EffectLayout>) -> Self {
        let values = layout.params.iter().map(|p| p.kind.default_value()).collect();
        Self {
            layout,
            values,
            technique: TechniqueId(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.layout.name
    }

    pub fn layout(&self) -> &Arc<EffectLayout> {
        &self.layout
    }

    /// Resolves a parameter by name, checking its kind.
    pub fn param<T: ParamType>(&self, name: &str) -> Result<Param<T>> {
        let index = *self
            .layout
            .lookup
            .get(name)
            .ok_or_else(|| ToonError::MissingParameter {
                effect: self.layout.name.clone(),
                parameter: name.to_string(),
            })?;
        let found = self.layout.params[index].kind;
        if found != T::KIND {
            return Err(ToonError::ParameterKind {
                effect: self.layout.name.clone(),
                parameter: name.to_string(),
                expected: T::KIND.name(),
                found: found.name(),
            });
        }
        Ok(Param {
            index,
            layout: self.layout.id,
            _marker: PhantomData,
        })
    }

    pub fn technique(&self, name: &str) -> Result<TechniqueId> {
        self.layout
            .techniques
            .iter()
            .position(|t| t.name == name)
            .map(TechniqueId)
            .ok_or_else(|| ToonError::MissingTechnique {
                effect: self.layout.name.clone(),
                technique: name.to_string(),
            })
    }

    pub fn pass(&self, technique: TechniqueId, name: &str) -> Result<PassId> {
        let decl = &self.layout.techniques[technique.0];
        decl.passes
            .iter()
            .position(|p| p.name == name)
            .map(|index| PassId { technique, index })
            .ok_or_else(|| ToonError::MissingPass {
                effect: self.layout.name.clone(),
                technique: decl.name.clone(),
                pass: name.to_string(),
            })
    }

    pub fn current_technique(&self) -> TechniqueId {
        self.technique
    }

    pub fn current_technique_name(&self) -> &str {
        &self.layout.techniques[self.technique.0].name
    }

    pub fn set_current_technique(&mut self, technique: TechniqueId) {
        self.technique = technique;
    }

    pub fn set<T: ParamType>(&mut self, param: Param<T>, value: T) {
        debug_assert_eq!(param.layout, self.layout.id, "parameter handle from another effect");
        self.values[param.index] = value.into_value();
    }

    pub fn get<T: ParamType>(&self, param: Param<T>) -> Option<T> {
        T::from_value(&self.values[param.index])
    }

    /// Looks a value up by name without resolving a handle.
    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.layout.lookup.get(name).map(|&i| &self.values[i])
    }

    /// Packs all uniform values into `out`, replacing its contents.
    pub fn write_uniforms(&self, out: &mut Vec<u8>) {
        out.clear();
        out.resize(self.layout.uniform_size as usize, 0);
        for (decl, value) in self.layout.params.iter().zip(&self.values) {
            if let Some(offset) = decl.offset {
                value.write(&mut out[offset as usize..]);
            }
        }
    }

    /// Bound textures in slot order.
    pub fn textures(&self) -> impl Iterator<Item = Option<TextureRef>> + '_ {
        self.layout
            .params
            .iter()
            .zip(&self.values)
            .filter(|(decl, _)| decl.texture_slot.is_some())
            .map(|(_, value)| match value {
                ParamValue::Texture(t) => *t,
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(layout: &EffectLayout, name: &str) -> u32 {
        layout.param_decl(name).and_then(|p| p.offset).unwrap()
    }

    #[test]
    fn vec3_followed_by_scalar_shares_a_slot() {
        let layout = EffectLayout::builder("t", "")
            .param("a", ParamKind::Vec3)
            .param("b", ParamKind::Float)
            .param("c", ParamKind::Vec2)
            .build();
        assert_eq!(offset(&layout, "a"), 0);
        assert_eq!(offset(&layout, "b"), 12);
        assert_eq!(offset(&layout, "c"), 16);
        assert_eq!(layout.uniform_size(), 32);
    }

    #[test]
    fn struct_arrays_use_padded_stride() {
        let members = [("direction", ParamKind::Vec3), ("color", ParamKind::Vec4), ("range", ParamKind::Float)];
        let layout = EffectLayout::builder("t", "")
            .param("count", ParamKind::Int)
            .structure_array("lights", 2, &members)
            .build();
        assert_eq!(offset(&layout, "lights[0].direction"), 16);
        assert_eq!(offset(&layout, "lights[0].color"), 32);
        assert_eq!(offset(&layout, "lights[0].range"), 48);
        assert_eq!(offset(&layout, "lights[1].direction"), 64);
        assert_eq!(layout.uniform_size(), 112);
    }

    #[test]
    fn textures_take_slots_not_bytes() {
        let layout = EffectLayout::builder("t", "")
            .texture("A")
            .param("x", ParamKind::Float)
            .texture("B")
            .build();
        assert_eq!(layout.texture_count(), 2);
        assert_eq!(layout.param_decl("B").and_then(|p| p.texture_slot), Some(1));
        assert_eq!(layout.uniform_size(), 16);
    }

    #[test]
    fn lookup_failures_name_the_asset() {
        let layout = EffectLayout::builder("Toon", "")
            .param("x", ParamKind::Float)
            .technique("Toon", &[("P0", "vs", "fs")])
            .build();
        let effect = Effect::new(layout);

        assert!(matches!(effect.param::<f32>("y"), Err(ToonError::MissingParameter { .. })));
        assert!(matches!(effect.param::<Vec3>("x"), Err(ToonError::ParameterKind { .. })));
        assert!(matches!(effect.technique("Lambert"), Err(ToonError::MissingTechnique { .. })));
        let toon = effect.technique("Toon").unwrap();
        assert!(matches!(effect.pass(toon, "P1"), Err(ToonError::MissingPass { .. })));
    }

    #[test]
    fn uniforms_are_written_at_their_offsets() {
        let layout = EffectLayout::builder("t", "")
            .param("flag", ParamKind::Bool)
            .param("v", ParamKind::Vec4)
            .build();
        let mut effect = Effect::new(layout);
        let flag = effect.param::<bool>("flag").unwrap();
        let v = effect.param::<Vec4>("v").unwrap();
        effect.set(flag, true);
        effect.set(v, Vec4::new(1.0, 2.0, 3.0, 4.0));

        let mut bytes = Vec::new();
        effect.write_uniforms(&mut bytes);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..4], bytemuck::bytes_of(&1u32));
        let floats: &[f32] = bytemuck::cast_slice(&bytes[16..32]);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }
}

//! The graphics device seam.
//!
//! [`GraphicsDevice`] is the narrow, stateful device surface the toon pipeline
//! drives: a settable render target, settable blend and depth-stencil state,
//! clear-to-color, effect pass application and draws. The wgpu implementation
//! lives in [`crate::backend`]; tests drive the pipeline through a recording
//! implementation.

use glam::Vec2;

use crate::color::Color;
use crate::effect::{Effect, PassId};
use crate::error::Result;

/// Handle to an offscreen render target owned by a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub u32);

/// Handle to a sampled texture owned by a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Handle to mesh geometry owned by a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// Anything a shader can sample from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureRef {
    Texture(TextureId),
    RenderTarget(RenderTargetId),
}

impl From<TextureId> for TextureRef {
    fn from(id: TextureId) -> Self {
        TextureRef::Texture(id)
    }
}

impl From<RenderTargetId> for TextureRef {
    fn from(id: RenderTargetId) -> Self {
        TextureRef::RenderTarget(id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthFormat {
    None,
    Depth24Plus,
    Depth32Float,
}

/// Back-buffer description. Offscreen targets are sized and formatted to match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentationParameters {
    pub width: u32,
    pub height: u32,
    pub color_format: ColorFormat,
    pub depth_format: DepthFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderTargetDescriptor {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub color_format: ColorFormat,
    pub depth_format: DepthFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendState {
    #[default]
    Opaque,
    /// `src + dst`, used to accumulate lighting passes.
    Additive,
    AlphaBlend,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    Less,
    LessEqual,
    Equal,
    Greater,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub compare: CompareFunction,
}

impl DepthStencilState {
    /// Depth test and write.
    pub const DEFAULT: Self = Self {
        depth_test: true,
        depth_write: true,
        compare: CompareFunction::LessEqual,
    };

    /// Depth test without write.
    pub const DEPTH_READ: Self = Self {
        depth_test: true,
        depth_write: false,
        compare: CompareFunction::LessEqual,
    };

    pub const NONE: Self = Self {
        depth_test: false,
        depth_write: false,
        compare: CompareFunction::Always,
    };
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A stateful immediate-mode graphics device.
///
/// Draws use whatever target, blend state, depth state and effect pass are
/// current when they are issued.
pub trait GraphicsDevice {
    fn presentation_parameters(&self) -> PresentationParameters;

    fn create_render_target(&mut self, desc: &RenderTargetDescriptor) -> Result<RenderTargetId>;
    fn release_render_target(&mut self, id: RenderTargetId);

    /// Binds an offscreen target, or the back buffer for `None`.
    fn set_render_target(&mut self, target: Option<RenderTargetId>);
    fn render_target(&self) -> Option<RenderTargetId>;

    /// Clears color and depth of the bound target.
    fn clear(&mut self, color: Color);

    fn blend_state(&self) -> BlendState;
    fn set_blend_state(&mut self, state: BlendState);
    fn depth_stencil_state(&self) -> DepthStencilState;
    fn set_depth_stencil_state(&mut self, state: DepthStencilState);

    /// Makes the given pass of the effect's current technique the active
    /// program, capturing the effect's parameter values as they are now.
    fn apply_pass(&mut self, effect: &Effect, pass: PassId) -> Result<()>;

    fn draw_mesh(&mut self, mesh: MeshId) -> Result<()>;
    fn draw_fullscreen(&mut self) -> Result<()>;

    /// Draws overlay text at a pixel position on the bound target.
    fn draw_text(&mut self, text: &str, position: Vec2, color: Color);
}

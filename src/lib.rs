//! # toonpass
//!
//! **Multi-pass toon and sketch rendering on top of wgpu.**
//!
//! Each object is drawn once per pass into offscreen targets (a normal/depth
//! buffer for edge detection, a lit scene buffer with banded toon shading)
//! and a fullscreen compositor then combines them onto the back buffer with
//! edge darkening and a jittered pencil-hatching overlay. Six presets ship by
//! default and can be cycled at runtime.
//!
//! ## Quick Start
//!
//! ```ignore
//! use toonpass::*;
//!
//! let mut renderer = ToonRenderer::new(
//!     &mut device,
//!     Effect::new(toon_effect_layout()),
//!     Effect::new(npr_effect_layout()),
//!     Some(sketch.into()),
//!     &RendererConfig::default(),
//! )?;
//!
//! renderer.begin_frame(&mut device, &camera.parameters(aspect), &lights, &[])?;
//! renderer.re_render_object(&mut device, world, &material, &mut |d| d.draw_mesh(mesh))?;
//! renderer.end_frame(&mut device)?;
//! ```
//!
//! The pipeline only talks to a [`GraphicsDevice`]; [`WgpuDevice`] is the
//! window-backed implementation used by [`run`].

mod app;
mod backend;
mod camera;
mod color;
mod config;
mod device;
mod effect;
pub mod effects;
mod error;
mod gpu;
mod input;
mod light;
mod material;
mod mesh;
mod pipeline;
pub mod post_process;
mod render_target;
mod settings;
mod texture;
mod toon_shader;

pub use app::run;
pub use backend::{Glyph, GlyphAtlas, Vertex2d, WgpuDevice};
pub use camera::{Camera, CameraParameters};
pub use color::Color;
pub use config::{AppConfig, RendererConfig};
pub use device::{
    BlendState, ColorFormat, CompareFunction, DepthFormat, DepthStencilState, GraphicsDevice,
    MeshId, PresentationParameters, RenderTargetDescriptor, RenderTargetId, TextureId, TextureRef,
};
pub use effect::{
    Effect, EffectLayout, EffectLayoutBuilder, Param, ParamDecl, ParamKind, ParamType, ParamValue,
    PassDecl, PassId, TechniqueDecl, TechniqueId,
};
pub use effects::{npr_effect_layout, toon_effect_layout};
pub use error::{Result, ToonError};
pub use gpu::GpuContext;
pub use input::{Action, Controls};
pub use light::{DEFAULT_AMBIENT, LightNode, LightSet, LightSource, LightType};
pub use material::Material;
pub use mesh::{Mesh, MeshData, Vertex3d};
pub use pipeline::ToonRenderer;
pub use post_process::{FrameState, PassFlow, PassState, PassTarget, ToonPostProcess};
pub use render_target::{RenderTarget, RenderTargets, ToonTargets};
pub use settings::{NonPhotoRealisticSettings, PRESETS, PresetCycle};
pub use texture::{ColorSpace, Texture, sketch_pattern};
pub use toon_shader::{LightingMode, RenderCallback, ToonShader};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};

// Re-exported so callers can seed the sketch jitter
pub use rand::SeedableRng;
pub use rand::rngs::StdRng;

//! Frame orchestration for the toon pipeline.
//!
//! ```ignore
//! renderer.begin_frame(&mut device, &camera, &global_lights, &[])?;
//! for object in &scene {
//!     renderer.re_render_object(&mut device, object.world, &object.material, &mut |d| {
//!         d.draw_mesh(object.mesh)
//!     })?;
//! }
//! renderer.end_frame(&mut device)?;
//! ```

use glam::Mat4;
use log::debug;
use rand::rngs::StdRng;

use crate::camera::CameraParameters;
use crate::config::RendererConfig;
use crate::device::{GraphicsDevice, TextureRef};
use crate::effect::Effect;
use crate::error::{Result, ToonError};
use crate::light::LightNode;
use crate::material::Material;
use crate::post_process::{FrameState, PassFlow, PassTarget, ToonPostProcess};
use crate::render_target::{RenderTargets, ToonTargets};
use crate::settings::NonPhotoRealisticSettings;
use crate::toon_shader::{RenderCallback, ToonShader};

/// Drives objects through the normal-depth, scene and composite passes.
#[derive(Debug)]
pub struct ToonRenderer {
    targets: RenderTargets,
    shader: ToonShader,
    post: ToonPostProcess,
    frame: FrameState,
}

impl ToonRenderer {
    pub fn new(
        device: &mut dyn GraphicsDevice,
        toon_effect: Effect,
        npr_effect: Effect,
        sketch_texture: Option<TextureRef>,
        config: &RendererConfig,
    ) -> Result<Self> {
        let shader = ToonShader::new(toon_effect, config.lighting)?;
        let post = ToonPostProcess::new(npr_effect, sketch_texture, config)?;
        let targets = RenderTargets::for_device(device)?;
        Ok(Self {
            targets,
            shader,
            post,
            frame: FrameState::default(),
        })
    }

    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    pub fn shader(&self) -> &ToonShader {
        &self.shader
    }

    pub fn post_process(&self) -> &ToonPostProcess {
        &self.post
    }

    /// The active preset.
    pub fn settings(&self) -> &NonPhotoRealisticSettings {
        self.post.settings()
    }

    pub fn advance_preset(&mut self) -> &NonPhotoRealisticSettings {
        self.post.advance_preset()
    }

    /// Advances time-based effects by `elapsed` seconds.
    pub fn update(&mut self, elapsed: f32, rng: &mut StdRng) {
        self.post.update(elapsed, rng);
    }

    /// Prepares targets and per-frame parameters. Call once before any
    /// `re_render_object` in a frame.
    pub fn begin_frame(
        &mut self,
        device: &mut dyn GraphicsDevice,
        camera: &CameraParameters,
        global_lights: &[LightNode],
        local_lights: &[LightNode],
    ) -> Result<()> {
        self.targets.set_render_targets(device)?;
        self.frame = FrameState::default();
        self.shader
            .set_camera_parameters(camera.view, camera.projection, camera.position);
        self.shader.set_light_parameters(global_lights, local_lights);
        Ok(())
    }

    /// Renders one object through every pass the active preset needs.
    /// Returns the number of passes that issued a render.
    pub fn re_render_object(
        &mut self,
        device: &mut dyn GraphicsDevice,
        world: Mat4,
        material: &Material,
        drawable: &mut RenderCallback<'_>,
    ) -> Result<usize> {
        self.shader.set_material_parameters(material)?;

        let mut rendered = 0;
        for index in 0.. {
            let pass = self
                .post
                .select_pass(device, &self.targets, &mut self.frame, index);
            match pass.flow {
                PassFlow::Continue => {
                    if pass.target != PassTarget::Unchanged {
                        self.shader
                            .render(device, world, pass.technique, Some(&mut *drawable))?;
                        rendered += 1;
                    }
                }
                PassFlow::Stop => break,
                PassFlow::Invalid => return Err(ToonError::InvalidPass { index }),
            }
        }
        debug!("Object rendered in {rendered} passes");
        Ok(rendered)
    }

    /// Composites the frame onto the back buffer.
    pub fn end_frame(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.post
            .apply_post_process(device, &self.targets, &mut self.frame)
    }
}

//! The demo window: one rotating model rendered through the toon pipeline.
//!
//! `A` cycles the NPR preset, `Space` pauses the rotation, `Escape` quits.

use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Vec3, Vec4};
use log::{error, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::backend::WgpuDevice;
use crate::camera::Camera;
use crate::config::AppConfig;
use crate::device::{MeshId, TextureRef};
use crate::effect::Effect;
use crate::effects::{npr_effect_layout, toon_effect_layout};
use crate::error::{Result, ToonError};
use crate::gpu::GpuContext;
use crate::input::{Action, Controls};
use crate::light::{LightNode, LightSource};
use crate::material::Material;
use crate::mesh::MeshData;
use crate::pipeline::ToonRenderer;
use crate::texture::{ColorSpace, Texture};

const SKETCH_TEXTURE_SIZE: u32 = 256;
const ROTATION_SPEED: f32 = 0.5;

/// Opens the demo window and runs until it is closed.
///
/// # Example
/// ```no_run
/// toonpass::run(toonpass::AppConfig::new().title("Toon").size(1280, 720))?;
/// # Ok::<(), toonpass::ToonError>(())
/// ```
pub fn run(config: AppConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ToonApp::Pending { config };
    event_loop.run_app(&mut app)?;

    match app {
        ToonApp::Exited(Some(e)) => Err(e),
        _ => Ok(()),
    }
}

enum ToonApp {
    Pending { config: AppConfig },
    Running(Box<Scene>),
    Exited(Option<ToonError>),
}

struct Scene {
    window: Arc<Window>,
    device: WgpuDevice,
    renderer: ToonRenderer,
    mesh: MeshId,
    model_scale: f32,
    material: Material,
    camera: Camera,
    lights: Vec<LightNode>,
    controls: Controls,
    rng: StdRng,
    rotating: bool,
    rotation: f32,
    last_frame: Instant,
}

impl Scene {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone())?;
        let sketch = match &config.sketch_texture_path {
            Some(path) => Texture::from_file(&gpu, path, ColorSpace::Linear)?,
            None => Texture::sketch(&gpu, SKETCH_TEXTURE_SIZE, config.seed as u32),
        };
        let mut device = WgpuDevice::new(gpu)?;

        match &config.font_path {
            Some(path) => device.load_font(&std::fs::read(path)?, config.font_size)?,
            None => warn!("No font given, the preset caption will not be drawn"),
        }

        let mut model = match &config.model_path {
            Some(path) => {
                info!("Loading model {}", path.display());
                MeshData::from_stl(path)?
            }
            None => MeshData::torus(0.5, 0.2, 64, 24),
        };
        model.normalize();
        let mesh = device.add_mesh(&model);
        let sketch = device.add_texture(sketch);

        let renderer = ToonRenderer::new(
            &mut device,
            Effect::new(toon_effect_layout()),
            Effect::new(npr_effect_layout()),
            Some(TextureRef::Texture(sketch)),
            &config.renderer,
        )?;
        info!("Preset: {}", renderer.settings().name);

        let light = LightNode::new(LightSource::directional(
            Vec3::new(1.0, -1.0, -1.0),
            Vec4::new(1.0, 0.0, 0.0, 1.0),
        ))
        .with_ambient(Vec4::new(0.1, 0.1, 0.1, 1.0));

        Ok(Self {
            window,
            device,
            renderer,
            mesh,
            model_scale: config.model_scale,
            material: Material::new().specular(Vec4::new(0.5, 0.5, 0.5, 1.0), 16.0),
            camera: Camera::new()
                .at(60.0, 100.0, -80.0)
                .looking_at(0.0, 0.0, 0.0)
                .with_fov(45.0)
                .with_clip(1.0, 300.0),
            lights: vec![light],
            controls: Controls::default(),
            rng: StdRng::seed_from_u64(config.seed),
            rotating: true,
            rotation: 0.0,
            last_frame: Instant::now(),
        })
    }

    /// Applies pending key actions. Returns `false` once quit was requested.
    fn apply_actions(&mut self) -> bool {
        let actions: Vec<Action> = self.controls.drain().collect();
        for action in actions {
            match action {
                Action::CyclePreset => {
                    self.renderer.advance_preset();
                }
                Action::ToggleRotation => self.rotating = !self.rotating,
                Action::Quit => return false,
            }
        }
        true
    }

    fn frame(&mut self) -> Result<()> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.renderer.update(dt, &mut self.rng);
        if self.rotating {
            self.rotation += dt * ROTATION_SPEED;
        }

        let world = Mat4::from_rotation_y(self.rotation) * Mat4::from_scale(Vec3::splat(self.model_scale));
        let camera = self.camera.parameters(self.device.gpu().aspect());
        let mesh = self.mesh;

        self.renderer
            .begin_frame(&mut self.device, &camera, &self.lights, &[])?;
        self.renderer
            .re_render_object(&mut self.device, world, &self.material, &mut |d| d.draw_mesh(mesh))?;
        self.renderer.end_frame(&mut self.device)?;
        self.device.present()
    }
}

impl ApplicationHandler for ToonApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let ToonApp::Pending { config } = self else {
            return;
        };
        *self = match Scene::new(event_loop, config) {
            Ok(scene) => {
                scene.window.request_redraw();
                ToonApp::Running(Box::new(scene))
            }
            Err(e) => {
                error!("Startup failed: {e}");
                event_loop.exit();
                ToonApp::Exited(Some(e))
            }
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let ToonApp::Running(scene) = self else {
            return;
        };

        scene.controls.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                *self = ToonApp::Exited(None);
            }
            WindowEvent::Resized(size) => {
                scene.device.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if !scene.apply_actions() {
                    event_loop.exit();
                    *self = ToonApp::Exited(None);
                    return;
                }
                if let Err(e) = scene.frame() {
                    error!("Frame failed: {e}");
                    event_loop.exit();
                    *self = ToonApp::Exited(Some(e));
                    return;
                }
                scene.window.request_redraw();
            }
            _ => {}
        }
    }
}

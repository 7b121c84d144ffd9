//! Offscreen render targets for the toon pipeline.
//!
//! [`RenderTargets`] owns the two back-buffer-sized targets: scene color and
//! normal+depth. It is the only place that allocates them, and it reallocates
//! both whenever the device's presentation parameters change.

use log::info;

use crate::device::{
    ColorFormat, DepthFormat, GraphicsDevice, PresentationParameters, RenderTargetDescriptor,
    RenderTargetId,
};
use crate::error::Result;

/// An offscreen render target allocated on a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    pub id: RenderTargetId,
    pub width: u32,
    pub height: u32,
    pub color_format: ColorFormat,
    pub depth_format: DepthFormat,
}

impl RenderTarget {
    fn new(
        device: &mut dyn GraphicsDevice,
        label: &str,
        width: u32,
        height: u32,
        color_format: ColorFormat,
        depth_format: DepthFormat,
    ) -> Result<Self> {
        let id = device.create_render_target(&RenderTargetDescriptor {
            label: label.to_string(),
            width,
            height,
            color_format,
            depth_format,
        })?;
        Ok(Self {
            id,
            width,
            height,
            color_format,
            depth_format,
        })
    }
}

/// Access to the toon pipeline's offscreen targets.
pub trait ToonTargets {
    fn scene_target(&self) -> &RenderTarget;
    fn normal_depth_target(&self) -> &RenderTarget;
    /// Reallocates the targets if the back buffer changed since allocation.
    fn set_render_targets(&mut self, device: &mut dyn GraphicsDevice) -> Result<()>;
}

/// The scene-color and normal-depth target pair.
#[derive(Debug)]
pub struct RenderTargets {
    scene: RenderTarget,
    normal_depth: RenderTarget,
}

impl RenderTargets {
    /// Allocates both targets. If the second allocation fails the first is
    /// released before the error is returned.
    pub fn allocate(
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
        color_format: ColorFormat,
        depth_format: DepthFormat,
    ) -> Result<Self> {
        let scene = RenderTarget::new(device, "Scene Color Target", width, height, color_format, depth_format)?;
        let normal_depth = match RenderTarget::new(
            device,
            "Normal Depth Target",
            width,
            height,
            color_format,
            depth_format,
        ) {
            Ok(target) => target,
            Err(e) => {
                device.release_render_target(scene.id);
                return Err(e);
            }
        };

        info!("Allocated {width}x{height} toon render targets ({color_format:?}, {depth_format:?})");
        Ok(Self {
            scene,
            normal_depth,
        })
    }

    /// Allocates targets matching the device's current back buffer.
    pub fn for_device(device: &mut dyn GraphicsDevice) -> Result<Self> {
        let params = device.presentation_parameters();
        Self::allocate(
            device,
            params.width,
            params.height,
            params.color_format,
            params.depth_format,
        )
    }

    pub fn matches(&self, params: &PresentationParameters) -> bool {
        self.scene.width == params.width
            && self.scene.height == params.height
            && self.scene.color_format == params.color_format
            && self.scene.depth_format == params.depth_format
    }

    /// Rebuilds both targets if the back buffer no longer matches, releasing
    /// the old pair. Returns whether a reallocation happened.
    pub fn ensure_matches(&mut self, device: &mut dyn GraphicsDevice) -> Result<bool> {
        let params = device.presentation_parameters();
        if self.matches(&params) {
            return Ok(false);
        }
        let fresh = Self::for_device(device)?;
        let old = std::mem::replace(self, fresh);
        old.release(device);
        Ok(true)
    }

    pub fn release(self, device: &mut dyn GraphicsDevice) {
        device.release_render_target(self.scene.id);
        device.release_render_target(self.normal_depth.id);
    }
}

impl ToonTargets for RenderTargets {
    fn scene_target(&self) -> &RenderTarget {
        &self.scene
    }

    fn normal_depth_target(&self) -> &RenderTarget {
        &self.normal_depth
    }

    fn set_render_targets(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.ensure_matches(device).map(|_| ())
    }
}

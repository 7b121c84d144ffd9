//! Error types for the toon rendering pipeline.
//!
//! Every failure in the core is fatal for the affected render path: a missing
//! technique or parameter is an asset defect, a failed render-target allocation
//! is a device capability mismatch, and an unknown pass index is pipeline misuse.
//! None of them is retried.

use thiserror::Error;

/// Errors produced by the toon pipeline and its GPU backend.
#[derive(Error, Debug)]
pub enum ToonError {
    // ========================================================================
    // Effect & Asset Errors
    // ========================================================================
    /// The effect does not declare the requested technique.
    #[error("effect '{effect}' has no technique named '{technique}'")]
    MissingTechnique { effect: String, technique: String },

    /// The technique does not declare the requested pass.
    #[error("technique '{technique}' of effect '{effect}' has no pass named '{pass}'")]
    MissingPass {
        effect: String,
        technique: String,
        pass: String,
    },

    /// The effect does not declare the requested parameter.
    #[error("effect '{effect}' has no parameter named '{parameter}'")]
    MissingParameter { effect: String, parameter: String },

    /// The parameter exists but holds a different kind of value.
    #[error("parameter '{parameter}' of effect '{effect}' is {found}, not {expected}")]
    ParameterKind {
        effect: String,
        parameter: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Failed to parse a font for the caption overlay.
    #[error("font error: {0}")]
    Font(String),

    /// Failed to decode mesh geometry.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Image decoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Pipeline Usage Errors
    // ========================================================================
    /// `render` was called without a render callback.
    #[error("render called without a render callback")]
    MissingRenderCallback,

    /// The pass selector was asked for a pass index it does not know.
    #[error("no render pass defined for pass index {index}")]
    InvalidPass { index: usize },

    /// A draw was issued before any effect pass was applied.
    #[error("draw issued with no effect pass applied")]
    NoPassApplied,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The preset list is empty.
    #[error("preset list is empty")]
    EmptyPresetList,

    /// A preset index outside the preset list.
    #[error("preset index {index} out of range for {len} presets")]
    PresetIndex { index: usize, len: usize },

    /// Batched lighting was configured with an unsupported batch size.
    #[error("light batch of {requested} exceeds the {supported} lights the effect declares")]
    LightBatch { requested: usize, supported: usize },

    // ========================================================================
    // Device & Resource Errors
    // ========================================================================
    /// Allocation of an offscreen render target failed.
    #[error("failed to allocate render target '{label}' ({width}x{height}): {reason}")]
    RenderTargetAllocation {
        label: String,
        width: u32,
        height: u32,
        reason: String,
    },

    /// The device cannot render to the requested format.
    #[error("unsupported render target format: {0}")]
    UnsupportedFormat(String),

    /// A handle did not refer to a live render target.
    #[error("unknown render target {0}")]
    UnknownRenderTarget(u32),

    /// A handle did not refer to a loaded mesh.
    #[error("unknown mesh {0}")]
    UnknownMesh(u32),

    /// A handle did not refer to a loaded texture.
    #[error("unknown texture {0}")]
    UnknownTexture(u32),

    /// Failed to request a compatible GPU adapter.
    #[error("failed to request wgpu adapter: {0}")]
    AdapterRequest(String),

    /// Failed to create the GPU device.
    #[error("failed to create wgpu device: {0}")]
    DeviceCreate(#[from] wgpu::RequestDeviceError),

    /// Failed to create the window surface.
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// Failed to acquire the next swapchain image.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    // ========================================================================
    // Windowing Errors
    // ========================================================================
    /// Event loop error.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Window creation failed.
    #[error("window error: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Alias for `Result<T, ToonError>`.
pub type Result<T> = std::result::Result<T, ToonError>;

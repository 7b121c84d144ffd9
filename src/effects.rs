//! Built-in effect layouts: the toon shading effect and the NPR compositor.

use std::sync::Arc;

use crate::effect::{EffectLayout, ParamKind};

/// Number of lights the toon effect's `lights` array holds.
pub const MAX_BATCHED_LIGHTS: usize = 8;

/// Members of the toon effect's light block, in WGSL declaration order.
pub const LIGHT_MEMBERS: &[(&str, ParamKind)] = &[
    ("direction", ParamKind::Vec3),
    ("falloff", ParamKind::Float),
    ("position", ParamKind::Vec3),
    ("range", ParamKind::Float),
    ("color", ParamKind::Vec4),
    ("attenuation0", ParamKind::Float),
    ("attenuation1", ParamKind::Float),
    ("attenuation2", ParamKind::Float),
    ("innerConeAngle", ParamKind::Float),
    ("outerConeAngle", ParamKind::Float),
];

/// Techniques every toon-capable effect declares, each with a single pass `P0`.
pub const TOON_TECHNIQUES: [&str; 3] = ["NormalDepth", "Toon", "Lambert"];

pub fn toon_effect_layout() -> Arc<EffectLayout> {
    EffectLayout::builder("ToonShader", include_str!("shaders/toon.wgsl"))
        .param("world", ParamKind::Mat4)
        .param("viewProjection", ParamKind::Mat4)
        .param("worldForNormal", ParamKind::Mat4)
        .param("cameraPosition", ParamKind::Vec3)
        .param("specularPower", ParamKind::Float)
        .param("emissiveColor", ParamKind::Vec4)
        .param("diffuseColor", ParamKind::Vec4)
        .param("specularColor", ParamKind::Vec4)
        .param("ambientLightColor", ParamKind::Vec4)
        .param("TextureEnabled", ParamKind::Bool)
        .param("isLightPass", ParamKind::Bool)
        .param("numberOfLights", ParamKind::Int)
        .structure("light", LIGHT_MEMBERS)
        .structure_array("lights", MAX_BATCHED_LIGHTS, LIGHT_MEMBERS)
        .texture("toonTexture")
        .technique("NormalDepth", &[("P0", "vs_main", "fs_normal_depth")])
        .technique("Toon", &[("P0", "vs_main", "fs_toon")])
        .technique("Lambert", &[("P0", "vs_main", "fs_lambert")])
        .build()
}

pub fn npr_effect_layout() -> Arc<EffectLayout> {
    EffectLayout::builder("PostprocessEffect", include_str!("shaders/npr.wgsl"))
        .param("EdgeWidth", ParamKind::Float)
        .param("EdgeIntensity", ParamKind::Float)
        .param("ScreenResolution", ParamKind::Vec2)
        .param("SketchJitter", ParamKind::Vec2)
        .param("SketchThreshold", ParamKind::Float)
        .param("SketchBrightness", ParamKind::Float)
        .texture("SceneTexture")
        .texture("NormalDepthTexture")
        .texture("SketchTexture")
        .technique("EdgeDetect", &[("P0", "vs_fullscreen", "fs_edge_detect")])
        .technique(
            "EdgeDetectColorSketch",
            &[("P0", "vs_fullscreen", "fs_edge_detect_color_sketch")],
        )
        .technique(
            "EdgeDetectMonoSketch",
            &[("P0", "vs_fullscreen", "fs_edge_detect_mono_sketch")],
        )
        .technique("ColorSketch", &[("P0", "vs_fullscreen", "fs_color_sketch")])
        .technique("MonoSketch", &[("P0", "vs_fullscreen", "fs_mono_sketch")])
        .build()
}

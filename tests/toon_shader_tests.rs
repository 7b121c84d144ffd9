//! Toon Shading Stage Tests
//!
//! Tests for:
//! - Base pass followed by one additive pass per directional light
//! - Batched light passes and batch size validation
//! - Ambient selection across global and local lights
//! - Device state restoration on success and failure
//! - Material-supplied effects

mod common;

use common::*;
use toonpass::effects::LIGHT_MEMBERS;
use toonpass::*;

fn shader(mode: LightingMode) -> ToonShader {
    let mut shader = ToonShader::new(Effect::new(toon_effect_layout()), mode).unwrap();
    let camera = camera();
    shader.set_camera_parameters(camera.view, camera.projection, camera.position);
    shader.set_material_parameters(&Material::new()).unwrap();
    shader
}

fn gray(v: f32) -> Vec4 {
    Vec4::new(v, v, v, 1.0)
}

fn render(shader: &mut ToonShader, device: &mut RecordingDevice, technique: &str) -> Result<usize> {
    let mut calls = 0;
    let mut draw = |d: &mut dyn GraphicsDevice| {
        calls += 1;
        d.draw_mesh(MESH)
    };
    shader.render(device, Mat4::IDENTITY, technique, Some(&mut draw))?;
    Ok(calls)
}

// ============================================================================
// Single-Light Passes
// ============================================================================

#[test]
fn base_pass_then_one_pass_per_light() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);
    shader.set_light_parameters(&[directional(1.0, gray(0.25)), directional(-1.0, gray(0.75))], &[]);

    let calls = render(&mut shader, &mut device, "Toon").unwrap();
    assert_eq!(calls, 3);
    assert_eq!(device.applied.len(), 3);

    let base = &device.applied[0];
    assert!(!base.bool("isLightPass"));
    assert_eq!(base.blend, BlendState::Opaque);
    assert_eq!(base.depth, DepthStencilState::DEFAULT);

    for (pass, expected) in device.applied[1..].iter().zip([gray(0.25), gray(0.75)]) {
        assert!(pass.bool("isLightPass"));
        assert_eq!(pass.blend, BlendState::Additive);
        assert_eq!(pass.depth, DepthStencilState::DEPTH_READ);
        assert_eq!(pass.vec4("light.color"), expected);
    }
    assert_eq!(device.applied_techniques(), vec!["Toon"; 3]);
}

#[test]
fn no_lights_draws_base_pass_only() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);
    shader.set_light_parameters(&[], &[]);

    assert_eq!(render(&mut shader, &mut device, "Lambert").unwrap(), 1);
    assert_eq!(device.applied_techniques(), vec!["Lambert"]);
}

#[test]
fn point_lights_get_no_additive_pass() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);
    let point = LightNode::new(LightSource::point(Vec3::new(0.0, 5.0, 0.0), 10.0, Vec4::ONE));
    shader.set_light_parameters(&[point, directional(1.0, Vec4::ONE)], &[]);

    assert_eq!(shader.lights().len(), 2);
    assert_eq!(shader.lights().directional_count(), 1);
    assert_eq!(render(&mut shader, &mut device, "Toon").unwrap(), 2);
}

#[test]
fn disabled_lights_are_skipped() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);
    let off = LightNode::new(LightSource::directional(Vec3::X, Vec4::ONE).enabled(false))
        .with_ambient(gray(0.5));
    shader.set_light_parameters(&[off], &[]);

    assert!(shader.lights().is_empty());
    assert_eq!(shader.lights().ambient(), DEFAULT_AMBIENT);
    assert_eq!(render(&mut shader, &mut device, "Toon").unwrap(), 1);
}

/// A directional light with a distinct value in every member of its block.
fn distinct_light(seed: f32) -> LightNode {
    let mut source = LightSource::spot(
        Vec3::new(seed, 2.0 * seed, 3.0 * seed),
        Vec3::X,
        0.25 + seed,
        0.5 + seed,
        Vec4::new(seed, 0.5, 0.25, 1.0),
    )
    .with_attenuation(0.1 + seed, 0.2 + seed, 0.3 + seed)
    .with_falloff(2.0 + seed);
    source.light_type = LightType::Directional;
    source.range = 40.0 + seed;
    LightNode::new(source)
}

fn assert_light_block(pass: &common::AppliedPass, prefix: &str, seed: f32) {
    let member = |m: &str| format!("{prefix}.{m}");
    assert_eq!(pass.vec3(&member("direction")), Vec3::X);
    assert_eq!(pass.vec3(&member("position")), Vec3::new(seed, 2.0 * seed, 3.0 * seed));
    assert_eq!(pass.vec4(&member("color")), Vec4::new(seed, 0.5, 0.25, 1.0));
    assert_eq!(pass.float(&member("falloff")), 2.0 + seed);
    assert_eq!(pass.float(&member("range")), 40.0 + seed);
    assert_eq!(pass.float(&member("attenuation0")), 0.1 + seed);
    assert_eq!(pass.float(&member("attenuation1")), 0.2 + seed);
    assert_eq!(pass.float(&member("attenuation2")), 0.3 + seed);
    assert_eq!(pass.float(&member("innerConeAngle")), 0.25 + seed);
    assert_eq!(pass.float(&member("outerConeAngle")), 0.5 + seed);
}

#[test]
fn every_light_member_is_bound_per_pass() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);
    shader.set_light_parameters(&[distinct_light(1.0), distinct_light(3.0)], &[]);

    assert_eq!(render(&mut shader, &mut device, "Toon").unwrap(), 3);
    assert_light_block(&device.applied[1], "light", 1.0);
    assert_light_block(&device.applied[2], "light", 3.0);
}

// ============================================================================
// Batched Passes
// ============================================================================

#[test]
fn every_light_member_is_bound_per_batch() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::Batched {
        max_lights_per_pass: 2,
    });
    let lights: Vec<LightNode> = [1.0, 3.0, 5.0].into_iter().map(distinct_light).collect();
    shader.set_light_parameters(&lights, &[]);

    assert_eq!(render(&mut shader, &mut device, "Toon").unwrap(), 3);
    assert_light_block(&device.applied[1], "lights[0]", 1.0);
    assert_light_block(&device.applied[1], "lights[1]", 3.0);
    assert_light_block(&device.applied[2], "lights[0]", 5.0);
    assert_eq!(device.applied[2].int("numberOfLights"), 1);
}

#[test]
fn batched_lights_are_chunked() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::Batched {
        max_lights_per_pass: 2,
    });
    let lights: Vec<LightNode> = (0..5).map(|i| directional(i as f32, gray(i as f32 / 5.0))).collect();
    shader.set_light_parameters(&lights, &[]);

    assert_eq!(render(&mut shader, &mut device, "Toon").unwrap(), 4);

    let counts: Vec<i32> = device.applied.iter().map(|p| p.int("numberOfLights")).collect();
    assert_eq!(counts, vec![0, 2, 2, 1]);
    assert_eq!(device.applied[2].vec4("lights[0].color"), gray(0.4));
    assert_eq!(device.applied[2].vec4("lights[1].color"), gray(0.6));
    assert_eq!(device.applied[3].vec4("lights[0].color"), gray(0.8));
}

#[test]
fn batch_size_must_fit_the_effect() {
    for requested in [0, 9] {
        let result = ToonShader::new(
            Effect::new(toon_effect_layout()),
            LightingMode::Batched {
                max_lights_per_pass: requested,
            },
        );
        assert!(matches!(
            result,
            Err(ToonError::LightBatch { requested: r, supported: 8 }) if r == requested
        ));
    }
}

// ============================================================================
// Ambient
// ============================================================================

#[test]
fn ambient_comes_from_first_light_that_sets_one() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);

    let global = [directional(1.0, Vec4::ONE).with_ambient(gray(0.3))];
    let local = [
        directional(2.0, Vec4::ONE).with_ambient(gray(0.1)),
        directional(3.0, Vec4::ONE).with_ambient(gray(0.2)),
        directional(4.0, Vec4::ONE),
    ];
    shader.set_light_parameters(&global, &local);
    render(&mut shader, &mut device, "Toon").unwrap();

    // Local lights are walked back to front, ahead of the globals.
    assert_eq!(device.applied[0].vec4("ambientLightColor"), gray(0.2));

    shader.set_light_parameters(&global, &[]);
    assert_eq!(shader.lights().ambient(), gray(0.3));

    shader.set_light_parameters(&[], &[]);
    assert_eq!(shader.lights().ambient(), DEFAULT_AMBIENT);
}

// ============================================================================
// Device State
// ============================================================================

#[test]
fn device_state_is_restored() {
    let mut device = RecordingDevice::new(640, 480);
    device.set_blend_state(BlendState::AlphaBlend);
    device.set_depth_stencil_state(DepthStencilState::NONE);

    let mut shader = shader(LightingMode::SinglePass);
    shader.set_light_parameters(&[directional(1.0, Vec4::ONE)], &[]);
    render(&mut shader, &mut device, "Toon").unwrap();

    assert_eq!(device.blend_state(), BlendState::AlphaBlend);
    assert_eq!(device.depth_stencil_state(), DepthStencilState::NONE);
}

#[test]
fn device_state_is_restored_when_a_draw_fails() {
    let mut device = RecordingDevice::new(640, 480);
    device.set_blend_state(BlendState::AlphaBlend);
    device.set_depth_stencil_state(DepthStencilState::NONE);

    let mut shader = shader(LightingMode::SinglePass);
    shader.set_light_parameters(&[directional(1.0, Vec4::ONE), directional(2.0, Vec4::ONE)], &[]);

    let mut calls = 0;
    let mut failing = |_: &mut dyn GraphicsDevice| {
        calls += 1;
        if calls == 2 {
            Err(ToonError::NoPassApplied)
        } else {
            Ok(())
        }
    };
    let result = shader.render(&mut device, Mat4::IDENTITY, "Toon", Some(&mut failing));

    assert!(matches!(result, Err(ToonError::NoPassApplied)));
    assert_eq!(calls, 2);
    assert_eq!(device.blend_state(), BlendState::AlphaBlend);
    assert_eq!(device.depth_stencil_state(), DepthStencilState::NONE);
}

#[test]
fn missing_callback_touches_nothing() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);

    let result = shader.render(&mut device, Mat4::IDENTITY, "Toon", None);
    assert!(matches!(result, Err(ToonError::MissingRenderCallback)));
    assert!(device.events.is_empty());
}

#[test]
fn unknown_technique_is_reported() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);

    let result = render(&mut shader, &mut device, "Outline");
    assert!(matches!(
        result,
        Err(ToonError::MissingTechnique { technique, .. }) if technique == "Outline"
    ));
    assert!(device.applied.is_empty());
}

// ============================================================================
// Geometry & Materials
// ============================================================================

#[test]
fn world_matrices_are_bound() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);
    let world = Mat4::from_scale(Vec3::splat(2.0));

    shader
        .render(&mut device, world, "NormalDepth", Some(&mut |d: &mut dyn GraphicsDevice| d.draw_mesh(MESH)))
        .unwrap();

    let pass = &device.applied[0];
    assert_eq!(pass.effect.value("world"), Some(&ParamValue::Mat4(world)));
    assert_eq!(
        pass.effect.value("worldForNormal"),
        Some(&ParamValue::Mat4(Mat4::from_scale(Vec3::splat(0.5))))
    );
    assert_eq!(
        pass.effect.value("viewProjection"),
        Some(&ParamValue::Mat4(camera().view_projection()))
    );
}

#[test]
fn material_colors_reach_the_default_effect() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);
    let material = Material::new()
        .diffuse(Vec4::new(0.2, 0.4, 0.6, 1.0))
        .specular(gray(0.5), 16.0);
    shader.set_material_parameters(&material).unwrap();
    render(&mut shader, &mut device, "Toon").unwrap();

    let pass = &device.applied[0];
    assert_eq!(pass.vec4("diffuseColor"), Vec4::new(0.2, 0.4, 0.6, 1.0));
    assert_eq!(pass.vec4("specularColor"), gray(0.5));
    assert!(!pass.bool("TextureEnabled"));

    shader
        .set_material_parameters(&Material::new().texture(TextureId(3)))
        .unwrap();
    render(&mut shader, &mut device, "Toon").unwrap();
    let pass = device.applied.last().unwrap();
    assert!(pass.bool("TextureEnabled"));
    assert_eq!(pass.texture("toonTexture"), Some(TextureRef::Texture(TextureId(3))));
}

#[test]
fn material_effect_overrides_then_reverts() {
    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);
    let default_layout = shader.effect().layout().id();

    let mut custom = Effect::new(toon_effect_layout());
    let diffuse = custom.param::<Vec4>("diffuseColor").unwrap();
    custom.set(diffuse, Vec4::new(0.0, 1.0, 0.0, 1.0));
    let custom_layout = custom.layout().id();
    assert_ne!(custom_layout, default_layout);

    let material = Material::new().diffuse(Vec4::new(1.0, 0.0, 0.0, 1.0)).effect(custom);
    shader.set_material_parameters(&material).unwrap();
    render(&mut shader, &mut device, "Lambert").unwrap();

    let pass = &device.applied[0];
    assert_eq!(pass.effect.layout().id(), custom_layout);
    assert_eq!(pass.vec4("diffuseColor"), Vec4::new(0.0, 1.0, 0.0, 1.0));

    shader
        .set_material_parameters(&Material::new().diffuse(Vec4::new(0.0, 0.0, 1.0, 1.0)))
        .unwrap();
    device.reset_log();
    render(&mut shader, &mut device, "Lambert").unwrap();

    let pass = &device.applied[0];
    assert_eq!(pass.effect.layout().id(), default_layout);
    assert_eq!(pass.vec4("diffuseColor"), Vec4::new(0.0, 0.0, 1.0, 1.0));
}

#[test]
fn material_effect_without_lambert_is_rejected() {
    let partial = EffectLayout::builder("Partial", "")
        .param("world", ParamKind::Mat4)
        .param("viewProjection", ParamKind::Mat4)
        .param("worldForNormal", ParamKind::Mat4)
        .param("cameraPosition", ParamKind::Vec3)
        .param("ambientLightColor", ParamKind::Vec4)
        .param("isLightPass", ParamKind::Bool)
        .structure("light", LIGHT_MEMBERS)
        .technique("NormalDepth", &[("P0", "vs_main", "fs_normal_depth")])
        .technique("Toon", &[("P0", "vs_main", "fs_toon")])
        .build();

    let mut shader = shader(LightingMode::SinglePass);
    let result = shader.set_material_parameters(&Material::new().effect(Effect::new(partial)));
    assert!(matches!(
        result,
        Err(ToonError::MissingTechnique { technique, .. }) if technique == "Lambert"
    ));
}

#[test]
fn material_effect_with_only_the_minimal_parameters_renders() {
    let minimal = EffectLayout::builder("Minimal", "")
        .param("world", ParamKind::Mat4)
        .param("viewProjection", ParamKind::Mat4)
        .param("worldForNormal", ParamKind::Mat4)
        .param("cameraPosition", ParamKind::Vec3)
        .param("ambientLightColor", ParamKind::Vec4)
        .structure("light", LIGHT_MEMBERS)
        .structure_array("lights", 8, LIGHT_MEMBERS)
        .technique("NormalDepth", &[("P0", "vs_main", "fs_normal_depth")])
        .technique("Toon", &[("P0", "vs_main", "fs_toon")])
        .technique("Lambert", &[("P0", "vs_main", "fs_lambert")])
        .build();

    let mut device = RecordingDevice::new(640, 480);
    let mut shader = shader(LightingMode::SinglePass);
    shader
        .set_material_parameters(&Material::new().effect(Effect::new(minimal)))
        .unwrap();
    shader.set_light_parameters(&[distinct_light(1.0)], &[]);

    assert_eq!(render(&mut shader, &mut device, "Toon").unwrap(), 2);
    assert_eq!(device.applied[0].effect.name(), "Minimal");
    assert_eq!(device.applied[0].effect.value("isLightPass"), None);
    assert_light_block(&device.applied[1], "light", 1.0);
}

//! Post-Process Compositor Tests
//!
//! Tests for:
//! - Preset cycling and the caption text
//! - Sketch jitter timing and determinism
//! - Pass selection clears

mod common;

use common::*;
use toonpass::post_process::*;
use toonpass::*;

fn compositor(preset: usize) -> ToonPostProcess {
    ToonPostProcess::new(
        Effect::new(npr_effect_layout()),
        Some(SKETCH),
        &RendererConfig::default().initial_preset(preset),
    )
    .unwrap()
}

// ============================================================================
// Presets
// ============================================================================

#[test]
fn caption_names_the_active_preset() {
    let mut post = compositor(0);
    assert_eq!(post.caption(), "A = settings (Cartoon)");

    post.advance_preset();
    assert_eq!(post.caption(), "A = settings (Pencil)");

    let custom = ToonPostProcess::new(
        Effect::new(npr_effect_layout()),
        None,
        &RendererConfig::default().caption(Vec2::ZERO, "Tab"),
    )
    .unwrap();
    assert_eq!(custom.caption(), "Tab = settings (Cartoon)");
}

#[test]
fn preset_cycle_wraps() {
    let mut post = compositor(0);
    let names: Vec<String> = (0..7)
        .map(|_| post.advance_preset().name.to_string())
        .collect();

    assert_eq!(
        names,
        vec![
            "Pencil",
            "Chunky Monochrome",
            "Colored Hatching",
            "Subtle Edge Enhancement",
            "Nothing Special",
            "Cartoon",
            "Pencil",
        ]
    );
    assert_eq!(post.preset_index(), 1);
}

#[test]
fn bad_preset_configuration_is_rejected() {
    let empty = ToonPostProcess::new(
        Effect::new(npr_effect_layout()),
        None,
        &RendererConfig::default().presets(Vec::new()),
    );
    assert!(matches!(empty, Err(ToonError::EmptyPresetList)));

    let out_of_range = ToonPostProcess::new(
        Effect::new(npr_effect_layout()),
        None,
        &RendererConfig::default().initial_preset(6),
    );
    assert!(matches!(out_of_range, Err(ToonError::PresetIndex { index: 6, len: 6 })));
}

#[test]
fn compositor_needs_the_npr_techniques() {
    let result = ToonPostProcess::new(
        Effect::new(toon_effect_layout()),
        None,
        &RendererConfig::default(),
    );
    assert!(matches!(result, Err(ToonError::MissingParameter { .. })));
}

// ============================================================================
// Sketch Jitter
// ============================================================================

#[test]
fn jitter_is_frozen_at_zero_speed() {
    let mut post = compositor(0);
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..10 {
        post.update(0.5, &mut rng);
    }
    assert_eq!(post.sketch_jitter(), Vec2::ZERO);
}

#[test]
fn jitter_moves_once_per_interval() {
    let mut post = compositor(1);
    let mut rng = StdRng::seed_from_u64(7);

    post.update(0.016, &mut rng);
    let first = post.sketch_jitter();
    assert_ne!(first, Vec2::ZERO);
    assert!((0.0..1.0).contains(&first.x));
    assert!((0.0..1.0).contains(&first.y));

    // Pencil updates every 0.05 s.
    post.update(0.01, &mut rng);
    assert_eq!(post.sketch_jitter(), first);

    post.update(0.05, &mut rng);
    assert_ne!(post.sketch_jitter(), first);
}

#[test]
fn same_seed_gives_same_jitter() {
    let run = || {
        let mut post = compositor(3);
        let mut rng = StdRng::seed_from_u64(1234);
        (0..20)
            .map(|_| {
                post.update(0.033, &mut rng);
                post.sketch_jitter()
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn advancing_restarts_the_jitter_timer() {
    let mut post = compositor(0);
    let mut rng = StdRng::seed_from_u64(9);

    // Cartoon -> Pencil: the next update draws immediately.
    post.advance_preset();
    post.update(0.001, &mut rng);
    let first = post.sketch_jitter();
    assert_ne!(first, Vec2::ZERO);

    // Pencil -> Chunky Monochrome (frozen) -> Colored Hatching.
    post.advance_preset();
    post.update(1.0, &mut rng);
    assert_eq!(post.sketch_jitter(), first);
    post.advance_preset();
    post.update(0.001, &mut rng);
    assert_ne!(post.sketch_jitter(), first);
}

// ============================================================================
// Pass Selection
// ============================================================================

#[test]
fn pass_selection_clears_each_target_once() {
    let mut device = RecordingDevice::new(320, 240);
    let targets = RenderTargets::for_device(&mut device).unwrap();
    let post = compositor(0);
    let mut frame = FrameState::default();
    device.reset_log();

    for _ in 0..3 {
        for index in 0..3 {
            post.select_pass(&mut device, &targets, &mut frame, index);
        }
    }

    assert_eq!(device.clears_of(Some(targets.normal_depth_target().id)), 1);
    assert_eq!(device.clears_of(Some(targets.scene_target().id)), 1);
    assert_eq!(device.clears_of(None), 0);
    assert_eq!(
        frame,
        FrameState {
            normal_depth_cleared: true,
            scene_cleared: true,
            back_buffer_cleared: false,
        }
    );
}

#[test]
fn pass_selection_names_shading_technique() {
    let mut device = RecordingDevice::new(320, 240);
    let targets = RenderTargets::for_device(&mut device).unwrap();
    let mut frame = FrameState::default();

    let toon = compositor(0).select_pass(&mut device, &targets, &mut frame, 1);
    assert_eq!(toon.technique, TOON);
    assert_eq!(toon.target, PassTarget::SceneColor);

    let lambert = compositor(5).select_pass(&mut device, &targets, &mut frame, 1);
    assert_eq!(lambert.technique, LAMBERT);
    assert_eq!(lambert.target, PassTarget::BackBuffer);

    let first = compositor(5).select_pass(&mut device, &targets, &mut frame, 0);
    assert_eq!(first.technique, NORMAL_DEPTH);
    assert_eq!(first.target, PassTarget::Unchanged);
    assert_eq!(first.flow, PassFlow::Continue);
}

#[test]
fn composite_without_sketch_leaves_sketch_texture_unbound() {
    let mut device = RecordingDevice::new(320, 240);
    let targets = RenderTargets::for_device(&mut device).unwrap();
    let mut post = compositor(0);
    let mut frame = FrameState::default();

    post.apply_post_process(&mut device, &targets, &mut frame)
        .unwrap();

    let composite = device.applied.last().unwrap();
    assert_eq!(composite.technique, EDGE_DETECT);
    assert_eq!(composite.texture("SketchTexture"), None);
    assert_eq!(device.events.iter().filter(|e| **e == Event::DrawFullscreen).count(), 1);
    assert_eq!(device.render_target(), None);
}

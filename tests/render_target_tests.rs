//! Render Target Manager Tests
//!
//! Tests for:
//! - Allocation against the device's presentation parameters
//! - Reallocation when the back buffer changes
//! - Cleanup after a failed allocation

mod common;

use common::*;
use toonpass::*;

#[test]
fn targets_match_the_back_buffer() {
    let mut device = RecordingDevice::new(1024, 780);
    let targets = RenderTargets::for_device(&mut device).unwrap();

    for target in [targets.scene_target(), targets.normal_depth_target()] {
        assert_eq!((target.width, target.height), (1024, 780));
        assert_eq!(target.color_format, ColorFormat::Bgra8UnormSrgb);
        assert_eq!(target.depth_format, DepthFormat::Depth32Float);
    }
    assert_ne!(targets.scene_target().id, targets.normal_depth_target().id);

    let labels: Vec<&Event> = device
        .events
        .iter()
        .filter(|e| matches!(e, Event::CreateTarget(..)))
        .collect();
    assert_eq!(
        labels,
        vec![
            &Event::CreateTarget(targets.scene_target().id, "Scene Color Target".to_string()),
            &Event::CreateTarget(targets.normal_depth_target().id, "Normal Depth Target".to_string()),
        ]
    );
}

#[test]
fn unchanged_back_buffer_keeps_targets() {
    let mut device = RecordingDevice::new(800, 600);
    let mut targets = RenderTargets::for_device(&mut device).unwrap();
    let scene = targets.scene_target().id;
    device.reset_log();

    assert!(!targets.ensure_matches(&mut device).unwrap());
    targets.set_render_targets(&mut device).unwrap();

    assert_eq!(targets.scene_target().id, scene);
    assert!(device.events.is_empty());
}

#[test]
fn changed_back_buffer_reallocates() {
    let mut device = RecordingDevice::new(800, 600);
    let mut targets = RenderTargets::for_device(&mut device).unwrap();
    let old = [targets.scene_target().id, targets.normal_depth_target().id];

    device.params.color_format = ColorFormat::Rgba8UnormSrgb;
    assert!(targets.ensure_matches(&mut device).unwrap());
    assert_eq!(targets.scene_target().color_format, ColorFormat::Rgba8UnormSrgb);

    for id in old {
        assert!(device.events.contains(&Event::ReleaseTarget(id)));
        assert!(!device.live_targets.contains(&id));
    }
    assert_eq!(
        device.live_targets,
        vec![targets.scene_target().id, targets.normal_depth_target().id]
    );
}

#[test]
fn failed_second_allocation_releases_the_first() {
    let mut device = RecordingDevice::new(800, 600);
    device.fail_allocation = Some(1);

    let result = RenderTargets::for_device(&mut device);
    assert!(matches!(
        result,
        Err(ToonError::RenderTargetAllocation { ref label, .. }) if label == "Normal Depth Target"
    ));
    assert!(device.live_targets.is_empty());
    assert!(device.events.contains(&Event::ReleaseTarget(RenderTargetId(1))));
}

#[test]
fn failed_reallocation_keeps_the_old_pair() {
    let mut device = RecordingDevice::new(800, 600);
    let mut targets = RenderTargets::for_device(&mut device).unwrap();
    let scene = targets.scene_target().id;

    device.params.width = 1600;
    device.fail_allocation = Some(2);
    assert!(targets.ensure_matches(&mut device).is_err());

    assert_eq!(targets.scene_target().id, scene);
    assert_eq!(targets.scene_target().width, 800);
    assert_eq!(device.live_targets.len(), 2);
}

#[test]
fn released_pair_leaves_nothing_live() {
    let mut device = RecordingDevice::new(320, 240);
    let targets = RenderTargets::for_device(&mut device).unwrap();
    targets.release(&mut device);
    assert!(device.live_targets.is_empty());
}

//! Patch-matrix router node tests

use crate::helpers::tolerances::{FADE_STEP_EPSILON, SILENCE_THRESHOLD};
use crate::helpers::*;
use ensemble::prelude::*;
use std::sync::Arc;

fn router(sources: usize, destinations: usize) -> RouterNode {
    let mut node = RouterNode::new(RouterConfig::new(sources, destinations)).unwrap();
    node.prepare_to_render(TEST_SAMPLE_RATE, 64);
    node
}

/// Source 1 carries DC 1.0, everything else silence.
fn source_one_dc(num_channels: usize, num_samples: usize) -> AudioBuffer {
    let mut audio = AudioBuffer::new(num_channels, num_samples);
    audio.channel_mut(1).fill(1.0);
    audio
}

// =============================================================================
// Crossfades
// =============================================================================

#[test]
fn test_patch_ramps_over_fade_length() {
    let mut node = router(4, 4);
    assert!(node.set_without_locking(1, 2, true));

    let mut audio = source_one_dc(4, 64);
    node.render(&mut audio, &mut MidiPipe::new());

    // 1 ms at 48 kHz
    let out = audio.channel(2);
    assert!(out[0] > 0.0 && out[0] < 0.05);
    assert!(out[..48].windows(2).all(|pair| pair[1] > pair[0]));
    assert_eq!(out[47], 1.0);
    assert!(out[48..].iter().all(|&s| s == 1.0));

    for dst in [0, 1, 3] {
        assert!(audio.channel(dst).iter().all(|s| s.abs() < SILENCE_THRESHOLD));
    }
}

#[test]
fn test_quick_toggle_has_no_discontinuity() {
    let mut node = router(4, 4);
    let handle = node.handle();
    let mut previous = 0.0f32;

    for block in 0..6 {
        match block {
            0 => assert!(handle.set(1, 0, true)),
            1 => assert!(handle.set(1, 0, false)),
            _ => {}
        }
        let mut audio = source_one_dc(4, 16);
        node.render(&mut audio, &mut MidiPipe::new());
        for &sample in audio.channel(0) {
            assert!((sample - previous).abs() <= FADE_STEP_EPSILON);
            previous = sample;
        }
    }
    // Fade back out has completed: steady-state unpatched output
    assert_eq!(previous, 0.0);
    assert!(!node.is_patched(1, 0));
}

// =============================================================================
// Locking
// =============================================================================

#[test]
fn test_handle_edits_from_another_thread() {
    let mut node = router(2, 2);
    let handle = node.handle();

    std::thread::spawn(move || {
        handle.set(0, 1, true);
        handle.add_program("Cross", Some(4));
    })
    .join()
    .unwrap();

    let mut audio = AudioBuffer::from_channels(vec![vec![1.0; 64], vec![0.0; 64]]);
    node.render(&mut audio, &mut MidiPipe::new());
    assert!(node.is_patched(0, 1));
    assert_eq!(audio.channel(1)[63], 1.0);
}

// =============================================================================
// Topology
// =============================================================================

#[test]
fn test_resize_leaves_old_channel_map_intact() {
    let mut node = router(4, 4);
    let handle = node.handle();
    let old_channels = Arc::clone(node.channels());

    handle.set_size(2, 6).unwrap();

    // Rendering does not touch the topology
    let mut audio = AudioBuffer::new(4, 64);
    node.render(&mut audio, &mut MidiPipe::new());
    assert!(Arc::ptr_eq(&old_channels, node.channels()));
    assert!(node.needs_port_rebuild());

    node.refresh_ports();
    assert!(!node.needs_port_rebuild());
    assert!(!Arc::ptr_eq(&old_channels, node.channels()));

    // The old map still describes the old ports
    assert_eq!(old_channels.num_audio_inputs(), 4);
    assert_eq!(old_channels.port(PortType::Audio, 5, false), None);

    // Consumers that re-fetch see the new ones
    let channels = Arc::clone(node.channels());
    assert_eq!(channels.num_audio_inputs(), 2);
    assert_eq!(channels.num_audio_outputs(), 6);
    let index = channels.port(PortType::Audio, 5, false).unwrap();
    assert_eq!(node.ports().get(index).unwrap().symbol, "audio_out_5");
    assert_eq!(handle.size(), (2, 6));
}

#[test]
fn test_state_restores_patches_and_size() {
    let mut node = router(3, 3);
    node.handle().set_size(3, 2).unwrap();
    node.refresh_ports();
    node.handle().set(2, 1, true);
    let state = node.get_state().unwrap();

    let mut restored = router(4, 4);
    restored.set_state(&state).unwrap();
    assert_eq!(restored.num_sources(), 3);
    assert_eq!(restored.num_destinations(), 2);
    assert!(restored.handle().is_connected(2, 1));
}

//! Module lifecycle and block loop tests

use crate::helpers::tolerances::FLOAT_EPSILON;
use crate::helpers::*;
use ensemble::core::uri::FLOAT_PROTOCOL;
use ensemble::core::{decode_float, PortDescription};
use ensemble::prelude::*;
use std::sync::atomic::Ordering;

// =============================================================================
// Control writes
// =============================================================================

#[test]
fn test_control_write_lands_before_run_returns() {
    let (mut module, _probe) = instantiated_module(StereoGainProvider::new());
    module.activate();
    assert_eq!(module.port_value(GAIN), Some(1.0));

    let handle = module.handle();
    assert!(handle.write_control(GAIN, 0.5));

    let mut io = StereoIo::new(TEST_BUFFER_SIZE, 0.8);
    io.bind(&mut module);
    module.run(TEST_BUFFER_SIZE as u32);

    assert_eq!(module.port_value(GAIN), Some(0.5));
    for output in &io.channels[2..] {
        assert!(output.iter().all(|s| (s - 0.4).abs() < FLOAT_EPSILON));
    }
}

#[test]
fn test_control_change_echoed_to_handle() {
    let (mut module, _probe) = instantiated_module(StereoGainProvider::new());
    module.activate();
    let handle = module.handle();

    handle.write_control(GAIN, 0.25);
    let mut io = StereoIo::new(64, 1.0);
    io.bind(&mut module);
    module.run(64);

    let mut seen = Vec::new();
    let count = handle.poll_notifications(|event, payload| {
        assert_eq!(event.protocol, FLOAT_PROTOCOL);
        seen.push((event.index, decode_float(payload)));
    });
    assert_eq!(count, 1);
    assert_eq!(seen, vec![(GAIN, Some(0.25))]);

    // Same value again is applied but not echoed
    handle.write_control(GAIN, 0.25);
    module.run(64);
    assert_eq!(handle.poll_notifications(|_, _| {}), 0);
}

#[test]
fn test_writes_to_non_control_ports_ignored() {
    let (mut module, _probe) = instantiated_module(StereoGainProvider::new());
    module.activate();
    let handle = module.handle();

    handle.write_control(OUT_L, 0.5);
    handle.write_control(99, 0.5);
    let mut io = StereoIo::new(16, 1.0);
    io.bind(&mut module);
    module.run(16);

    assert_eq!(module.port_value(OUT_L), None);
    assert_eq!(handle.poll_notifications(|_, _| {}), 0);
}

// =============================================================================
// Ports
// =============================================================================

#[test]
fn test_port_counts_add_up() {
    let (module, _probe) = instantiated_module(StereoGainProvider::new());
    for &port_type in PortType::all() {
        let total = module
            .ports()
            .iter()
            .filter(|port| port.port_type == port_type)
            .count();
        assert_eq!(
            module.num_ports_of(port_type, true) + module.num_ports_of(port_type, false),
            total
        );
    }
    assert_eq!(module.num_ports_of(PortType::Audio, true), 2);
    assert_eq!(module.num_ports_of(PortType::Audio, false), 2);
    assert_eq!(module.num_ports_of(PortType::Control, true), 1);
}

#[test]
fn test_index_and_symbol_lookup_agree() {
    let (module, _probe) = instantiated_module(StereoGainProvider::new());
    for index in 0..module.num_ports() as u32 {
        let by_index: &PortDescription = module.port(index).unwrap();
        let by_scan = module
            .ports()
            .iter()
            .find(|port| port.symbol == by_index.symbol)
            .unwrap();
        assert_eq!(by_index, by_scan);
        assert_eq!(module.port_index(&by_index.symbol), Some(index));
    }
    assert!(module.port(module.num_ports() as u32).is_none());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_sample_rate_change_keeps_active() {
    let (mut module, probe) = instantiated_module(StereoGainProvider::new());
    module.activate();
    assert!(module.is_active());

    module.set_sample_rate(44100.0).unwrap();

    assert_eq!(module.state(), ModuleState::Active);
    assert!(module.is_active());
    assert_eq!(module.sample_rate(), 44100.0);
    assert_eq!(*probe.instantiated_at.lock(), vec![TEST_SAMPLE_RATE, 44100.0]);
    assert_eq!(probe.activations.load(Ordering::SeqCst), 2);
}

#[test]
fn test_sample_rate_change_keeps_inactive() {
    let (mut module, probe) = instantiated_module(StereoGainProvider::new());

    module.set_sample_rate(96000.0).unwrap();

    assert_eq!(module.state(), ModuleState::Instantiated);
    assert!(!module.is_active());
    assert_eq!(probe.activations.load(Ordering::SeqCst), 0);
}

#[test]
fn test_state_string_round_trip() {
    let (mut module, _probe) = instantiated_module(StereoGainProvider::new());
    module.activate();
    module.handle().write_control(GAIN, 0.3);
    let mut io = StereoIo::new(16, 0.0);
    io.bind(&mut module);
    module.run(16);

    let state = module.get_state_string().unwrap();
    module.set_state_string(&state).unwrap();
    assert_eq!(module.port_value(GAIN), Some(0.3));

    let mut other = instantiated_module(StereoGainProvider::new()).0;
    other.set_state_string(&state).unwrap();
    assert_eq!(other.port_value(GAIN), Some(0.3));
}

#[test]
fn test_handle_outlives_module() {
    let (module, _probe) = instantiated_module(StereoGainProvider::new());
    let handle = module.handle();
    assert!(handle.is_alive());
    drop(module);
    assert!(!handle.is_alive());
}

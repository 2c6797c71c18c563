//! Hosted nodes driven through `GraphNode`

use crate::helpers::tolerances::FLOAT_EPSILON;
use crate::helpers::*;
use approx::assert_relative_eq;
use ensemble::prelude::*;
use std::sync::Arc;

fn plugin_node() -> GraphNode {
    let module = Module::new(Arc::new(StereoGainProvider::new()), ModuleConfig::default()).unwrap();
    GraphNode::from(PluginNode::new(module))
}

fn router_node(sources: usize, destinations: usize) -> GraphNode {
    GraphNode::from(RouterNode::new(RouterConfig::new(sources, destinations)).unwrap())
}

#[test]
fn test_chain_plugin_into_router() {
    let mut nodes = vec![plugin_node(), router_node(2, 2)];
    for node in &mut nodes {
        node.prepare_to_render(TEST_SAMPLE_RATE, 128);
    }
    nodes[1].as_router().unwrap().handle().set(0, 1, true);

    let plugin_handle = nodes[0].as_plugin().unwrap().handle();
    plugin_handle.write_control(GAIN, 0.5);

    // Each node processes the same buffer in place
    let mut audio = dc_buffer(2, 128, 1.0);
    let mut midi = MidiPipe::new();
    for node in &mut nodes {
        node.render(&mut audio, &mut midi);
    }

    // Left through the plugin at half gain, then crossfaded onto output 1
    assert!(audio.channel(0).iter().all(|s| s.abs() < FLOAT_EPSILON));
    assert_relative_eq!(audio.channel(1)[127], 0.5, epsilon = FLOAT_EPSILON);
    assert!(audio.channel(1)[0] < 0.5);
}

#[test]
fn test_names_and_ports() {
    let plugin = plugin_node();
    let router = router_node(3, 1);

    assert_eq!(plugin.name(), "Stereo Gain");
    assert_eq!(plugin.ports().len(), 5);
    assert_eq!(plugin.channels().num_control_inputs(), 1);

    assert_eq!(router.name(), "Audio Router");
    assert_eq!(router.ports().len(), 5);
    assert_eq!(router.channels().num_audio_inputs(), 3);
}

#[test]
fn test_plugin_parameters_follow_control_writes() {
    let mut node = plugin_node();
    node.prepare_to_render(TEST_SAMPLE_RATE, 64);

    let plugin = node.as_plugin().unwrap();
    let parameter = Arc::clone(plugin.parameter_for_port(GAIN).unwrap());
    assert_eq!(parameter.value(), 1.0);

    parameter.set_value(0.25);
    let mut audio = dc_buffer(2, 64, 1.0);
    node.render(&mut audio, &mut MidiPipe::new());
    assert_relative_eq!(audio.channel(0)[0], 0.25, epsilon = FLOAT_EPSILON);

    let plugin = node.as_plugin().unwrap();
    assert_eq!(plugin.module().port_value(GAIN), Some(0.25));
}

#[test]
fn test_state_through_graph_node() {
    let mut node = plugin_node();
    node.prepare_to_render(TEST_SAMPLE_RATE, 64);
    node.as_plugin().unwrap().handle().write_control(GAIN, 0.75);
    node.render(&mut dc_buffer(2, 64, 0.0), &mut MidiPipe::new());
    let state = node.get_state().unwrap();

    let mut other = plugin_node();
    other.prepare_to_render(TEST_SAMPLE_RATE, 64);
    other.set_state(&state).unwrap();
    assert_eq!(other.as_plugin().unwrap().module().port_value(GAIN), Some(0.75));

    // Router state is not plugin state
    let mut router = router_node(2, 2);
    assert!(router.set_state(&state).is_err());
}

#[test]
fn test_release_deactivates_plugin() {
    let mut node = plugin_node();
    node.prepare_to_render(TEST_SAMPLE_RATE, 64);
    assert!(node.as_plugin().unwrap().module().is_active());

    node.release_resources();
    let module = node.as_plugin().unwrap().module();
    assert_eq!(module.state(), ModuleState::Deactivated);
}

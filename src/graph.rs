//! Closed set of node kinds the host graph can hold.
//!
//! Dispatch is a `match` over [`GraphNode`] instead of boxed trait objects,
//! so a graph slot knows statically which capabilities it can reach.

use ensemble_core::{AudioBuffer, ChannelConfig, MidiPipe, Node, PortList, Result};
use std::sync::Arc;

#[cfg(feature = "dsp")]
use ensemble_dsp::RouterNode;
#[cfg(feature = "plugin")]
use ensemble_plugin::PluginNode;

pub enum GraphNode {
    #[cfg(feature = "plugin")]
    Plugin(PluginNode),
    #[cfg(feature = "dsp")]
    Router(RouterNode),
}

macro_rules! dispatch {
    ($self:expr, $node:ident => $body:expr) => {
        match $self {
            #[cfg(feature = "plugin")]
            GraphNode::Plugin($node) => $body,
            #[cfg(feature = "dsp")]
            GraphNode::Router($node) => $body,
        }
    };
}

impl GraphNode {
    #[cfg(feature = "plugin")]
    pub fn as_plugin(&self) -> Option<&PluginNode> {
        match self {
            GraphNode::Plugin(node) => Some(node),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[cfg(feature = "plugin")]
    pub fn as_plugin_mut(&mut self) -> Option<&mut PluginNode> {
        match self {
            GraphNode::Plugin(node) => Some(node),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[cfg(feature = "dsp")]
    pub fn as_router(&self) -> Option<&RouterNode> {
        match self {
            GraphNode::Router(node) => Some(node),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[cfg(feature = "dsp")]
    pub fn as_router_mut(&mut self) -> Option<&mut RouterNode> {
        match self {
            GraphNode::Router(node) => Some(node),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

#[cfg(feature = "plugin")]
impl From<PluginNode> for GraphNode {
    fn from(node: PluginNode) -> Self {
        GraphNode::Plugin(node)
    }
}

#[cfg(feature = "dsp")]
impl From<RouterNode> for GraphNode {
    fn from(node: RouterNode) -> Self {
        GraphNode::Router(node)
    }
}

impl Node for GraphNode {
    fn name(&self) -> &str {
        dispatch!(self, node => node.name())
    }

    fn refresh_ports(&mut self) {
        dispatch!(self, node => node.refresh_ports())
    }

    fn ports(&self) -> &PortList {
        dispatch!(self, node => node.ports())
    }

    fn channels(&self) -> &Arc<ChannelConfig> {
        dispatch!(self, node => node.channels())
    }

    fn prepare_to_render(&mut self, sample_rate: f64, max_block_size: usize) {
        dispatch!(self, node => node.prepare_to_render(sample_rate, max_block_size))
    }

    fn release_resources(&mut self) {
        dispatch!(self, node => node.release_resources())
    }

    #[inline]
    fn render(&mut self, audio: &mut AudioBuffer, midi: &mut MidiPipe) {
        dispatch!(self, node => node.render(audio, midi))
    }

    fn get_state(&self) -> Result<Vec<u8>> {
        dispatch!(self, node => node.get_state())
    }

    fn set_state(&mut self, data: &[u8]) -> Result<()> {
        dispatch!(self, node => node.set_state(data))
    }
}

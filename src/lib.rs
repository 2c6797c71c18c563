//! # Ensemble - Plugin Hosting and Port Bridging
//!
//! Hosts plugin instances inside a real-time graph and exposes their ports
//! and parameters to non-real-time collaborators without blocking audio.
//!
//! ## Architecture
//!
//! Ensemble is an umbrella crate that coordinates:
//! - **ensemble-core** - Port lists, channel maps, port buffers, event rings, parameters
//! - **ensemble-plugin** - Module lifecycle, worker offload, parameter bridging, hosted-plugin node
//! - **ensemble-dsp** - Built-in nodes (patch-matrix router)
//!
//! ## Quick Start
//!
//! ```ignore
//! use ensemble::prelude::*;
//!
//! let module = Module::new(provider, ModuleConfig::default())?;
//! let mut node = GraphNode::from(PluginNode::new(module));
//! node.prepare_to_render(48000.0, 512);
//!
//! // Audio thread
//! node.render(&mut audio, &mut midi);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Plugin hosting and built-in nodes
//! - `plugin` - Plugin hosting
//! - `dsp` - Patch-matrix router

/// Re-export of ensemble-core for direct access
pub use ensemble_core as core;

pub use ensemble_core::{
    AudioBuffer, ChannelConfig, LinearFade, MidiMessage, MidiPipe, Node, Parameter,
    ParameterChange, ParameterRange, ParameterScale, PortBuffer, PortDescription, PortEvent,
    PortList, PortType,
};

// Plugin hosting
#[cfg(feature = "plugin")]
pub use ensemble_plugin as plugin;

#[cfg(feature = "plugin")]
pub use ensemble_plugin::{
    Module, ModuleConfig, ModuleHandle, ModuleState, PluginMetadata, PluginNode, PluginProvider,
};

// Built-in nodes
#[cfg(feature = "dsp")]
pub use ensemble_dsp as dsp;

#[cfg(feature = "dsp")]
pub use ensemble_dsp::{MatrixState, RouterConfig, RouterHandle, RouterNode};

mod error;
pub use error::{Error, Result};

#[cfg(any(feature = "plugin", feature = "dsp"))]
mod graph;
#[cfg(any(feature = "plugin", feature = "dsp"))]
pub use graph::GraphNode;

/// Convenience prelude for common imports
pub mod prelude {
    // Graph
    pub use crate::core::{AudioBuffer, MidiMessage, MidiPipe, Node, Parameter, PortType};

    #[cfg(any(feature = "plugin", feature = "dsp"))]
    pub use crate::GraphNode;

    // Plugin hosting
    #[cfg(feature = "plugin")]
    pub use crate::plugin::{
        Module, ModuleConfig, ModuleHandle, ModuleState, PluginMetadata, PluginNode,
        PluginProvider, PortInfo,
    };

    // Router
    #[cfg(feature = "dsp")]
    pub use crate::dsp::{RouterConfig, RouterHandle, RouterNode};
}

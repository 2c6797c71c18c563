//! In-process plugin hosting for Ensemble
//!
//! This crate turns a plugin description ([`PluginProvider`]) into a running
//! [`Module`] and wraps it as a graph node ([`PluginNode`]).
//!
//! ## Threads
//!
//! - **Audio thread**: owns the `Module`/`PluginNode` and calls `run`/`render`
//! - **Control thread**: holds a cloneable [`ModuleHandle`] to write port
//!   values and poll notifications
//! - **Worker thread**: one per module whose plugin asks for it, fed through
//!   lock-free rings
//!
//! ## Usage
//!
//! ```ignore
//! use ensemble_plugin::{Module, ModuleConfig, PluginNode};
//! use ensemble_core::Node;
//!
//! let module = Module::new(provider, ModuleConfig::default())?;
//! let mut node = PluginNode::new(module);
//! node.prepare_to_render(48000.0, 512);
//!
//! let handle = node.handle();
//! handle.write_control(2, 0.5);
//!
//! node.render(&mut audio, &mut midi);
//! handle.poll_notifications(|event, payload| { /* refresh UI */ });
//! ```

pub mod error;
pub use error::{LoadStage, PluginError, Result};

mod config;
pub use config::ModuleConfig;

mod metadata;
pub use metadata::PluginMetadata;

mod provider;
pub use provider::{
    ExtensionData, HostFeatures, NativeInstance, PluginProvider, PortInfo, PortValue,
    WorkerInterface,
};

mod worker;
pub use worker::{WorkerBridge, WorkerSchedule};

mod handle;
pub use handle::{ModuleHandle, PortWriter};

mod module;
pub use module::{Module, ModuleState};

mod parameter;
pub use parameter::{NativeParameter, NativeParameterBridge, PortParameter};

mod node;
pub use node::PluginNode;

//! Integration test modules for Ensemble
//!
//! - module: Module lifecycle and block loop
//! - worker: worker offload through a running module
//! - router: patch-matrix router node
//! - graph: hosted nodes behind `GraphNode`

pub mod graph;
pub mod module;
pub mod router;
pub mod worker;

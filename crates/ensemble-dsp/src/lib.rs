//! Built-in graph nodes: a patch-matrix audio router with click-free
//! switching. Edits arrive through a locked handle and are picked up by the
//! render path without blocking.

pub mod router;
pub use router::{MatrixState, Program, RouterConfig, RouterHandle, RouterNode, MAX_ROUTER_CHANNELS};

//! Error types for ensemble-core.

use crate::port::PortType;
use thiserror::Error;

/// Error type for ensemble-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid port index: {0}")]
    InvalidPort(u32),

    #[error("No {port_type} channel {channel} (input: {is_input})")]
    InvalidChannel {
        port_type: PortType,
        channel: u32,
        is_input: bool,
    },

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

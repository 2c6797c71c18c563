//! Centralized error type for the ensemble umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] ensemble_core::Error),

    #[cfg(feature = "plugin")]
    #[error("Plugin: {0}")]
    Plugin(#[from] ensemble_plugin::PluginError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_is_transparent() {
        let err: Error = ensemble_core::Error::InvalidConfig("bad size".into()).into();
        assert_eq!(err.to_string(), ensemble_core::Error::InvalidConfig("bad size".into()).to_string());
    }

    #[cfg(feature = "plugin")]
    #[test]
    fn test_plugin_error_prefixed() {
        let err: Error = ensemble_plugin::PluginError::NotInstantiated.into();
        assert!(err.to_string().starts_with("Plugin: "));
    }
}

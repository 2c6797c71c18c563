//! Error types for plugin hosting

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Features,
    Instantiation,
    Worker,
    DefaultState,
    Activation,
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStage::Features => write!(f, "gathering host features"),
            LoadStage::Instantiation => write!(f, "creating instance"),
            LoadStage::Worker => write!(f, "attaching worker"),
            LoadStage::DefaultState => write!(f, "restoring default state"),
            LoadStage::Activation => write!(f, "activating"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Could not instantiate plugin {uri} at {sample_rate} Hz ({stage})")]
    InstantiationFailed {
        uri: String,
        sample_rate: f64,
        stage: LoadStage,
    },

    #[error("Plugin {uri} exposes a worker interface but no worker feature was negotiated")]
    WorkerUnavailable { uri: String },

    #[error("Plugin is not instantiated")]
    NotInstantiated,

    #[error("Failed to save plugin state: {0}")]
    StateSaveError(String),

    #[error("Failed to restore plugin state: {0}")]
    StateRestoreError(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error(transparent)]
    Core(#[from] ensemble_core::Error),

    #[error("State encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PluginError>;

impl From<PluginError> for ensemble_core::Error {
    fn from(err: PluginError) -> Self {
        match err {
            PluginError::Core(inner) => inner,
            other => ensemble_core::Error::State(other.to_string()),
        }
    }
}

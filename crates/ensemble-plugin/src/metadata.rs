//! Descriptive plugin metadata supplied by the provider.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Unique plugin URI
    pub uri: String,

    /// Human-readable name
    pub name: String,

    /// Author name
    pub author: String,

    /// Plugin class label ("Reverb", "Instrument", ...)
    pub class_label: String,

    /// Version string
    pub version: String,
}

impl PluginMetadata {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            author: String::new(),
            class_label: String::new(),
            version: "1.0.0".to_string(),
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn class_label(mut self, label: impl Into<String>) -> Self {
        self.class_label = label.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

//! Error types for plugin creation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    #[error("Unknown plugin kind: {0}")]
    UnknownKind(String),

    #[error("Invalid value for parameter '{parameter}' of '{plugin}': {reason}")]
    InvalidParameter {
        plugin: String,
        parameter: String,
        reason: String,
    },

    #[error("Plugin '{plugin}' does not support {channels} channel(s)")]
    UnsupportedChannels { plugin: String, channels: usize },

    #[error("Plugin name '{0}' is already used on this track")]
    DuplicateName(String),

    #[error("Failed to instantiate plugin '{plugin}': {reason}")]
    InstantiationFailed { plugin: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PluginError>;

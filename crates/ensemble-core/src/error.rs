//! Error types for ensemble-core.

use crate::graph::NodeId;
use thiserror::Error;

/// Error type for ensemble-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[error("Audio device support not compiled in (enable the `device` feature)")]
    DeviceSupportDisabled,

    #[cfg(feature = "device")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "device")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "device")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "device")]
    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[cfg(feature = "device")]
    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),

    #[error("Transport is running; stop it before preparing")]
    TransportRunning,

    #[error("Unknown graph node: {0:?}")]
    UnknownNode(NodeId),

    #[error("Channel {channel} out of range for node {node:?} ({channels} channels)")]
    ChannelOutOfRange {
        node: NodeId,
        channel: usize,
        channels: usize,
    },

    #[error("Node {0:?} cannot be connected to itself")]
    SelfConnection(NodeId),

    #[error("Graph sink cannot be used as a connection source")]
    SinkAsSource,
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

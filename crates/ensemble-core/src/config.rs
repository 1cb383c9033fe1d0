//! Audio engine configuration.

use crate::format::ChannelsFormat;
use crate::{Error, Result};
use serde::Deserialize;

/// Configuration for the audio engine.
///
/// `sample_rate` is only a fallback: once a device is opened its negotiated
/// rate wins. `block_size` is the largest chunk the mixer renders at once;
/// device buffers larger than this are processed in several chunks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f64,
    pub block_size: usize,
    pub output_device_index: Option<usize>,
    pub output_channels: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 512,
            output_device_index: None,
            output_channels: 2,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML. Missing keys take their default values.
    ///
    /// ```
    /// use ensemble_core::EngineConfig;
    ///
    /// let config = EngineConfig::from_toml_str("block_size = 256").unwrap();
    /// assert_eq!(config.block_size, 256);
    /// assert_eq!(config.output_channels, 2);
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate < 8000.0 || self.sample_rate > 384000.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !(16..=8192).contains(&self.block_size) {
            return Err(Error::InvalidConfig(format!(
                "block_size {} out of range (16-8192 samples)",
                self.block_size
            )));
        }
        if self.output_channels == 0 || self.output_channels > ChannelsFormat::MAX_CHANNELS {
            return Err(Error::InvalidConfig(format!(
                "output_channels {} out of range (1-{})",
                self.output_channels,
                ChannelsFormat::MAX_CHANNELS
            )));
        }
        Ok(())
    }
}

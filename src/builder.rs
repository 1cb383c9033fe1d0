//! Builder for configuring and constructing an `EnsembleEngine`.

use crate::{EnsembleEngine, Result};
use ensemble_core::EngineConfig;
use ensemble_plugin::PluginRegistry;

/// The sample rate set here is a fallback: once the output device is
/// initialised its negotiated rate wins. Query `engine.sample_rate()` after
/// `initialise()` for the actual rate.
///
/// # Example
///
/// ```
/// use ensemble::prelude::*;
///
/// let engine = EnsembleEngine::builder()
///     .sample_rate(48000.0)
///     .block_size(256)
///     .outputs(2)
///     .build()?;
///
/// assert_eq!(engine.block_size(), 256);
/// # Ok::<(), ensemble::Error>(())
/// ```
#[derive(Default)]
pub struct EnsembleEngineBuilder {
    config: EngineConfig,
    plugins: Option<PluginRegistry>,
}

impl EnsembleEngineBuilder {
    pub fn output_device(mut self, index: usize) -> Self {
        self.config.output_device_index = Some(index);
        self
    }

    /// Default: 2
    pub fn outputs(mut self, count: usize) -> Self {
        self.config.output_channels = count;
        self
    }

    /// Default: 44100 Hz
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 512
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.config.block_size = block_size;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Read the configuration from TOML. Missing keys keep their defaults.
    pub fn config_toml(mut self, source: &str) -> Result<Self> {
        self.config = EngineConfig::from_toml_str(source)?;
        Ok(self)
    }

    /// Use `registry` instead of the built-in plugin set.
    pub fn plugins(mut self, registry: PluginRegistry) -> Self {
        self.plugins = Some(registry);
        self
    }

    pub fn build(self) -> Result<EnsembleEngine> {
        self.config.validate()?;
        let plugins = self.plugins.unwrap_or_default();
        Ok(EnsembleEngine::from_parts(self.config, plugins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let engine = EnsembleEngineBuilder::default().build().unwrap();
        assert_eq!(engine.sample_rate(), 44100.0);
        assert_eq!(engine.block_size(), 512);
        assert_eq!(engine.channels(), 2);
        assert!(engine.plugins().has_kind("gain"));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        assert!(EnsembleEngineBuilder::default().outputs(0).build().is_err());
        assert!(EnsembleEngineBuilder::default()
            .block_size(4)
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_from_toml() {
        let engine = EnsembleEngineBuilder::default()
            .config_toml("sample_rate = 48000.0\noutput_channels = 4")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(engine.sample_rate(), 48000.0);
        assert_eq!(engine.channels(), 4);
        assert_eq!(engine.transport().sample_rate(), 48000.0);
    }

    #[test]
    fn test_builder_custom_registry() {
        let engine = EnsembleEngineBuilder::default()
            .plugins(PluginRegistry::new())
            .build()
            .unwrap();
        assert!(engine.plugins().kinds().is_empty());
    }
}

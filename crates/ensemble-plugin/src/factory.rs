//! Plugin instantiation.
//!
//! [`PluginFactory`] is the seam the routing layer creates processors
//! through. [`PluginRegistry`] is the stock implementation: a table of named
//! constructors, pre-populated with the built-in processors.

use crate::descriptor::PluginDescriptor;
use crate::error::{PluginError, Result};
use ensemble_core::AudioProcessor;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Creates processors for plugin descriptors.
pub trait PluginFactory: Send + Sync {
    fn create_processor_instance(
        &self,
        descriptor: &PluginDescriptor,
        sample_rate: f64,
        block_size: usize,
        channels: usize,
    ) -> Result<Box<dyn AudioProcessor>>;
}

/// Everything a constructor needs to build one processor.
#[derive(Debug, Clone, Copy)]
pub struct PluginSpec<'a> {
    pub descriptor: &'a PluginDescriptor,
    pub sample_rate: f64,
    pub block_size: usize,
    pub channels: usize,
}

pub type PluginConstructor =
    Arc<dyn Fn(&PluginSpec<'_>) -> Result<Box<dyn AudioProcessor>> + Send + Sync>;

/// Registry of plugin constructors keyed by kind.
///
/// Cloning shares the underlying table.
#[derive(Clone)]
pub struct PluginRegistry {
    constructors: Arc<RwLock<HashMap<String, PluginConstructor>>>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            constructors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register<F>(&self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(&PluginSpec<'_>) -> Result<Box<dyn AudioProcessor>> + Send + Sync + 'static,
    {
        self.constructors
            .write()
            .insert(kind.into(), Arc::new(constructor));
    }

    pub fn unregister(&self, kind: &str) -> bool {
        self.constructors.write().remove(kind).is_some()
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.constructors.read().contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.constructors.read().keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        let registry = Self::new();
        crate::builtin::register_builtin_plugins(&registry);
        registry
    }
}

impl PluginFactory for PluginRegistry {
    /// Construct the processor, then seed its exposed parameter cells from
    /// the descriptor. Descriptor values for parameters the processor does
    /// not expose are ignored with a warning.
    fn create_processor_instance(
        &self,
        descriptor: &PluginDescriptor,
        sample_rate: f64,
        block_size: usize,
        channels: usize,
    ) -> Result<Box<dyn AudioProcessor>> {
        let constructor = self
            .constructors
            .read()
            .get(&descriptor.kind)
            .cloned()
            .ok_or_else(|| PluginError::UnknownKind(descriptor.kind.clone()))?;

        let spec = PluginSpec {
            descriptor,
            sample_rate,
            block_size,
            channels,
        };
        let processor = constructor(&spec)?;

        let cells = processor.parameters();
        for (key, value) in &descriptor.parameters {
            match cells.iter().find(|(name, _)| name == key) {
                Some((_, cell)) => cell.set(*value),
                None => tracing::warn!(
                    "Plugin '{}' ({}) has no parameter '{}'; ignoring",
                    descriptor.name,
                    descriptor.kind,
                    key
                ),
            }
        }

        tracing::debug!(
            "Created plugin '{}' ({}) with {} channel(s)",
            descriptor.name,
            descriptor.kind,
            channels
        );
        Ok(processor)
    }
}

/// Read a descriptor parameter that must lie in `range`, or fall back to `default`.
pub fn parameter_in_range(
    spec: &PluginSpec<'_>,
    key: &str,
    range: std::ops::RangeInclusive<f32>,
    default: f32,
) -> Result<f32> {
    match spec.descriptor.parameter(key) {
        None => Ok(default),
        Some(value) if range.contains(&value) => Ok(value),
        Some(value) => Err(PluginError::InvalidParameter {
            plugin: spec.descriptor.name.clone(),
            parameter: key.to_string(),
            reason: format!(
                "{value} outside {}..={}",
                range.start(),
                range.end()
            ),
        }),
    }
}

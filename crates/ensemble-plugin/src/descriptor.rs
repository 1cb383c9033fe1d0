use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A plugin slot on a track: which kind to instantiate and its initial parameters.
///
/// `name` identifies the slot on its track (it keys the plugin-node store and
/// prefixes its parameter keys), `kind` selects the factory constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, f32>,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: f32) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn parameter(&self, key: &str) -> Option<f32> {
        self.parameters.get(key).copied()
    }

    /// Key under which a parameter of this plugin is published, `"<name>.<param>"`.
    pub fn parameter_key(&self, parameter: &str) -> String {
        format!("{}.{}", self.name, parameter)
    }
}

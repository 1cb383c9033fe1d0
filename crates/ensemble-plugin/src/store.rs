//! Where each track's plugins ended up in the processing graph.

use dashmap::DashMap;
use ensemble_core::{NodeId, TrackId};

/// `{track, plugin name} → NodeId` for every materialized plugin.
#[derive(Debug, Default)]
pub struct PluginNodeStore {
    nodes: DashMap<(TrackId, String), NodeId>,
}

impl PluginNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a plugin node, returning the node previously stored under the key.
    pub fn insert(&self, track: TrackId, plugin: &str, node: NodeId) -> Option<NodeId> {
        self.nodes.insert((track, plugin.to_string()), node)
    }

    pub fn get(&self, track: TrackId, plugin: &str) -> Option<NodeId> {
        self.nodes
            .get(&(track, plugin.to_string()))
            .map(|entry| *entry.value())
    }

    pub fn remove(&self, track: TrackId, plugin: &str) -> Option<NodeId> {
        self.nodes
            .remove(&(track, plugin.to_string()))
            .map(|(_, node)| node)
    }

    /// Plugins of `track` with their nodes, sorted by name.
    pub fn for_track(&self, track: TrackId) -> Vec<(String, NodeId)> {
        let mut plugins: Vec<(String, NodeId)> = self
            .nodes
            .iter()
            .filter(|entry| entry.key().0 == track)
            .map(|entry| (entry.key().1.clone(), *entry.value()))
            .collect();
        plugins.sort_by(|a, b| a.0.cmp(&b.0));
        plugins
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&self) {
        self.nodes.clear();
    }
}

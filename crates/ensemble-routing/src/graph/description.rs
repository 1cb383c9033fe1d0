use crate::model::Clip;
use ensemble_core::{ChannelsFormat, TrackId};
use ensemble_plugin::PluginDescriptor;
use serde::{Deserialize, Serialize};

/// Index of a node in a [`GraphDescription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphNodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphNodeKind {
    /// Plays clips through an input stage.
    AudioTrack,
    /// A bus: sums what is routed into it.
    AuxTrack,
}

/// One track as it will appear in the processing graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: GraphNodeId,
    pub track: TrackId,
    pub name: String,
    pub kind: GraphNodeKind,
    pub format: ChannelsFormat,
    pub output: Option<GraphNodeId>,
    pub sends: Vec<GraphNodeId>,
    pub plugins: Vec<PluginDescriptor>,
    pub clips: Vec<Clip>,
    /// False once the node is found as some other node's send target or output.
    pub is_graph_start: bool,
}

/// Signal flows from `source` into `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphConnectionDescription {
    pub source: GraphNodeId,
    pub destination: GraphNodeId,
}

/// A gap or refusal found while walking the routing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildDiagnostic {
    /// `missing` does not exist. `referenced_by` is `None` for a requested root.
    MissingTrack {
        referenced_by: Option<TrackId>,
        missing: TrackId,
    },
    /// The edge `from → to` would have closed a cycle.
    CycleRejected { from: TrackId, to: TrackId },
    /// `to` is a folder, which carries no audio.
    NotRoutable { from: TrackId, to: TrackId },
}

/// The virtual graph: nodes in an arena, edges as index pairs.
#[derive(Debug, Clone, Default)]
pub struct GraphDescription {
    pub(crate) nodes: Vec<GraphNode>,
    pub(crate) connections: Vec<GraphConnectionDescription>,
    pub(crate) diagnostics: Vec<BuildDiagnostic>,
}

impl GraphDescription {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn connections(&self) -> &[GraphConnectionDescription] {
        &self.connections
    }

    pub fn diagnostics(&self) -> &[BuildDiagnostic] {
        &self.diagnostics
    }

    pub fn node(&self, id: GraphNodeId) -> Option<&GraphNode> {
        self.nodes.get(id.0)
    }

    pub fn node_for_track(&self, track: TrackId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.track == track)
    }

    /// Nodes nothing routes into.
    pub fn graph_starts(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|n| n.is_graph_start)
    }
}

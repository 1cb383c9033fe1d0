//! One track's realized chain: input stage → plugins → gain/output stage.

use super::description::{GraphNode, GraphNodeId, GraphNodeKind};
use super::stages::{GainStage, TrackInput};
use crate::error::Result;
use ensemble_core::params::{MUTE, VOLUME};
use ensemble_core::{ChannelsFormat, NodeId, ParameterStore, ProcessingGraph, TrackId};
use ensemble_plugin::{PluginError, PluginFactory, PluginNodeStore};
use std::sync::Arc;

/// A plugin that could not be added to its track's chain.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedPlugin {
    pub track: TrackId,
    pub plugin: String,
    pub error: PluginError,
}

/// Collaborators a module needs while it wires itself into the graph.
pub(crate) struct ModuleContext<'a> {
    pub factory: &'a dyn PluginFactory,
    pub plugin_nodes: &'a PluginNodeStore,
    pub parameters: &'a ParameterStore,
    pub sample_rate: f64,
    pub block_size: usize,
    pub failed: &'a mut Vec<FailedPlugin>,
}

/// Handles to the processing-graph nodes realizing one [`GraphNode`].
#[derive(Debug, Clone, PartialEq)]
pub struct GraphModule {
    node: GraphNodeId,
    track: TrackId,
    kind: GraphNodeKind,
    format: ChannelsFormat,
    input_stage: Option<NodeId>,
    plugins: Vec<(String, NodeId)>,
    output: NodeId,
}

impl GraphModule {
    /// Wire `node`'s full chain into `graph`.
    ///
    /// Either every stage is added and connected, or nothing is left behind in
    /// the graph and the error is returned.
    pub(crate) fn create(
        graph: &mut ProcessingGraph,
        node: &GraphNode,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<Self> {
        let channels = node.format.channel_count();
        let volume = ctx.parameters.cell(node.track, VOLUME, 1.0);
        let mute = ctx.parameters.cell(node.track, MUTE, 0.0);

        let output = graph.add(Box::new(GainStage::new(
            format!("{} out", node.name),
            channels,
            volume,
            mute,
        )));
        let input_stage = match node.kind {
            GraphNodeKind::AudioTrack => Some(graph.add(Box::new(TrackInput::new(
                format!("{} in", node.name),
                channels,
                node.clips.clone(),
            )))),
            GraphNodeKind::AuxTrack => None,
        };

        let mut module = Self {
            node: node.id,
            track: node.track,
            kind: node.kind,
            format: node.format,
            input_stage,
            plugins: Vec::new(),
            output,
        };

        for descriptor in &node.plugins {
            let duplicate = module.plugins.iter().any(|(name, _)| *name == descriptor.name);
            let created = if duplicate {
                Err(PluginError::DuplicateName(descriptor.name.clone()))
            } else {
                ctx.factory.create_processor_instance(
                    descriptor,
                    ctx.sample_rate,
                    ctx.block_size,
                    channels,
                )
            }
            .and_then(|processor| {
                if processor.channels() == channels {
                    Ok(processor)
                } else {
                    Err(PluginError::UnsupportedChannels {
                        plugin: descriptor.name.clone(),
                        channels,
                    })
                }
            });

            match created {
                Ok(mut processor) => {
                    // Scenes sharing a track read one cell per parameter.
                    for (key, cell) in processor.parameters() {
                        let param = descriptor.parameter_key(&key);
                        let shared = ctx.parameters.share(node.track, &param, cell.clone());
                        if !Arc::ptr_eq(&shared, &cell) && !processor.adopt_parameter(&key, shared)
                        {
                            tracing::warn!(
                                "Plugin '{}' on track {} keeps a private '{key}' cell",
                                descriptor.name,
                                node.track
                            );
                        }
                    }
                    let id = graph.add(processor);
                    ctx.plugin_nodes.insert(node.track, &descriptor.name, id);
                    module.plugins.push((descriptor.name.clone(), id));
                }
                Err(error) => {
                    tracing::warn!(
                        "Dropping plugin '{}' from track {}: {error}",
                        descriptor.name,
                        node.track
                    );
                    ctx.failed.push(FailedPlugin {
                        track: node.track,
                        plugin: descriptor.name.clone(),
                        error,
                    });
                }
            }
        }

        if let Err(e) = module.wire_chain(graph) {
            module.remove(graph, ctx.plugin_nodes);
            return Err(e);
        }

        tracing::debug!(
            "Materialized track {} with {} plugin(s)",
            node.track,
            module.plugins.len()
        );
        Ok(module)
    }

    fn wire_chain(&self, graph: &mut ProcessingGraph) -> Result<()> {
        let channels = self.channels();
        let mut previous = self.input_stage;
        for next in self.plugins.iter().map(|(_, id)| *id).chain(Some(self.output)) {
            if let Some(previous) = previous {
                for ch in 0..channels {
                    graph.connect(previous, ch, next, ch)?;
                }
            }
            previous = Some(next);
        }
        Ok(())
    }

    /// Remove every node of this module from `graph`.
    pub(crate) fn remove(&self, graph: &mut ProcessingGraph, plugin_nodes: &PluginNodeStore) {
        for (name, id) in &self.plugins {
            graph.remove(*id);
            plugin_nodes.remove(self.track, name);
        }
        if let Some(input) = self.input_stage {
            graph.remove(input);
        }
        graph.remove(self.output);
    }

    /// Where signal routed into this track enters.
    ///
    /// For an aux without plugins this is the output stage itself.
    pub fn input(&self) -> NodeId {
        self.input_stage
            .or_else(|| self.plugins.first().map(|(_, id)| *id))
            .unwrap_or(self.output)
    }

    pub fn output(&self) -> NodeId {
        self.output
    }

    pub fn plugins(&self) -> &[(String, NodeId)] {
        &self.plugins
    }

    pub fn node(&self) -> GraphNodeId {
        self.node
    }

    pub fn track(&self) -> TrackId {
        self.track
    }

    pub fn kind(&self) -> GraphNodeKind {
        self.kind
    }

    pub fn format(&self) -> ChannelsFormat {
        self.format
    }

    pub fn channels(&self) -> usize {
        self.format.channel_count()
    }
}

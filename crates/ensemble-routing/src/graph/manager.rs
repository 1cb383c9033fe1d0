//! Materializes a [`GraphDescription`] into a live [`ProcessingGraph`].

use super::description::GraphDescription;
use super::module::{FailedPlugin, GraphModule, ModuleContext};
use crate::error::{Result, RoutingError};
use ensemble_core::{ParameterStore, ProcessingGraph, TrackId};
use ensemble_plugin::{PluginFactory, PluginNodeStore};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Turns virtual nodes into [`GraphModule`]s and description edges into
/// per-channel connections.
///
/// The manager holds the graph weakly: the graph's owner decides its lifetime
/// and every operation fails with [`RoutingError::GraphExpired`] once it is gone.
pub struct GraphManager {
    graph: Weak<Mutex<ProcessingGraph>>,
    factory: Arc<dyn PluginFactory>,
    plugin_nodes: Arc<PluginNodeStore>,
    parameters: Arc<ParameterStore>,
    sample_rate: f64,
    block_size: usize,
    modules: Vec<GraphModule>,
    failed_plugins: Vec<FailedPlugin>,
}

impl GraphManager {
    pub fn new(
        graph: Weak<Mutex<ProcessingGraph>>,
        factory: Arc<dyn PluginFactory>,
        plugin_nodes: Arc<PluginNodeStore>,
        parameters: Arc<ParameterStore>,
        sample_rate: f64,
        block_size: usize,
    ) -> Self {
        Self {
            graph,
            factory,
            plugin_nodes,
            parameters,
            sample_rate,
            block_size,
            modules: Vec::new(),
            failed_plugins: Vec::new(),
        }
    }

    fn graph(&self) -> Result<Arc<Mutex<ProcessingGraph>>> {
        self.graph.upgrade().ok_or(RoutingError::GraphExpired)
    }

    /// Create one module per node and wire every edge.
    ///
    /// On error every module created by this call is removed again.
    pub fn materialize(&mut self, description: GraphDescription) -> Result<()> {
        let graph = self.graph()?;
        let mut graph = graph.lock();
        let first_new = self.modules.len();

        let result = self.materialize_into(&mut graph, &description);
        if result.is_err() {
            for module in self.modules.drain(first_new..) {
                module.remove(&mut graph, &self.plugin_nodes);
            }
        } else if graph.is_prepared() {
            graph.commit();
        }
        result
    }

    fn materialize_into(
        &mut self,
        graph: &mut ProcessingGraph,
        description: &GraphDescription,
    ) -> Result<()> {
        let base = self.modules.len();
        let mut ctx = ModuleContext {
            factory: self.factory.as_ref(),
            plugin_nodes: &self.plugin_nodes,
            parameters: &self.parameters,
            sample_rate: self.sample_rate,
            block_size: self.block_size,
            failed: &mut self.failed_plugins,
        };
        for node in description.nodes() {
            let module = GraphModule::create(graph, node, &mut ctx)?;
            self.modules.push(module);
        }

        for edge in description.connections() {
            let source = &self.modules[base + edge.source.0];
            let destination = &self.modules[base + edge.destination.0];
            wire(graph, source, destination)?;
        }

        tracing::debug!(
            "Materialized {} module(s) and {} edge(s)",
            description.nodes().len(),
            description.connections().len()
        );
        Ok(())
    }

    /// Connect `track`'s output stage to the hardware sink.
    pub fn attach_master(&mut self, track: TrackId) -> Result<()> {
        let graph = self.graph()?;
        let mut graph = graph.lock();
        let module = self
            .module_for_track(track)
            .ok_or(RoutingError::MissingMaster(track))?;

        let sink = graph.output_node();
        let sink_channels = graph.output_channels();
        for ch in 0..module.channels().min(sink_channels) {
            graph.connect(module.output(), ch, sink, ch)?;
        }
        if graph.is_prepared() {
            graph.commit();
        }
        tracing::debug!("Attached track {track} to the hardware output");
        Ok(())
    }

    /// Remove every module from the graph and forget it.
    pub fn clear(&mut self) -> Result<()> {
        let graph = self.graph()?;
        let mut graph = graph.lock();
        for module in self.modules.drain(..) {
            module.remove(&mut graph, &self.plugin_nodes);
        }
        self.failed_plugins.clear();
        Ok(())
    }

    pub fn modules(&self) -> &[GraphModule] {
        &self.modules
    }

    pub fn module_for_track(&self, track: TrackId) -> Option<&GraphModule> {
        self.modules.iter().find(|m| m.track() == track)
    }

    pub fn failed_plugins(&self) -> &[FailedPlugin] {
        &self.failed_plugins
    }

    pub fn plugin_nodes(&self) -> &Arc<PluginNodeStore> {
        &self.plugin_nodes
    }

    pub fn set_format(&mut self, sample_rate: f64, block_size: usize) {
        self.sample_rate = sample_rate;
        self.block_size = block_size;
    }
}

/// Fan `source` out into `destination`: one connection per destination channel,
/// reading the source channel clamped to its width.
fn wire(
    graph: &mut ProcessingGraph,
    source: &GraphModule,
    destination: &GraphModule,
) -> Result<()> {
    let source_channels = source.channels();
    for ch in 0..destination.channels() {
        graph.connect(
            source.output(),
            ch.min(source_channels - 1),
            destination.input(),
            ch,
        )?;
    }
    Ok(())
}

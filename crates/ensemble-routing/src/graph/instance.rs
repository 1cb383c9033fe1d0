//! One scene's live processing graph, bound to the shared transport.

use super::builder::GraphBuilder;
use super::description::BuildDiagnostic;
use super::manager::GraphManager;
use super::module::{FailedPlugin, GraphModule};
use crate::error::{Result, RoutingError};
use crate::model::{Edit, Scene};
use ensemble_core::{
    AudioBuffer, ChannelsFormat, LiveGraph, MidiBuffer, ParameterStore, ProcessContext,
    ProcessingGraph, Transport,
};
use ensemble_plugin::{PluginFactory, PluginNodeStore};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Capture pipeline attached to a graph instance.
///
/// The engine only tells it when audio is about to flow and when the instance
/// goes away; everything else lives outside this crate.
pub trait RecordingCollaborator: Send {
    fn prepare(&mut self, sample_rate: f64, block_size: usize);
    fn release(&mut self);
}

/// Scene graph lifecycle: `build` once, `prepare_to_play`, `process_block`
/// from the audio thread, `shutdown`.
pub struct GraphInstance {
    scene: Scene,
    transport: Arc<Transport>,
    graph: Arc<Mutex<ProcessingGraph>>,
    manager: Mutex<GraphManager>,
    plugin_nodes: Arc<PluginNodeStore>,
    recorder: Mutex<Option<Box<dyn RecordingCollaborator>>>,
    diagnostics: Mutex<Vec<BuildDiagnostic>>,
    built: AtomicBool,
}

impl GraphInstance {
    pub fn new(
        scene: Scene,
        transport: Arc<Transport>,
        factory: Arc<dyn PluginFactory>,
        parameters: Arc<ParameterStore>,
    ) -> Self {
        let graph = Arc::new(Mutex::new(ProcessingGraph::new(
            ChannelsFormat::MAX_CHANNELS,
        )));
        let plugin_nodes = Arc::new(PluginNodeStore::new());
        let manager = GraphManager::new(
            Arc::downgrade(&graph),
            factory,
            plugin_nodes.clone(),
            parameters,
            transport.sample_rate(),
            transport.block_size(),
        );
        Self {
            scene,
            transport,
            graph,
            manager: Mutex::new(manager),
            plugin_nodes,
            recorder: Mutex::new(None),
            diagnostics: Mutex::new(Vec::new()),
            built: AtomicBool::new(false),
        }
    }

    pub fn with_recorder(self, recorder: Box<dyn RecordingCollaborator>) -> Self {
        *self.recorder.lock() = Some(recorder);
        self
    }

    /// Describe, materialize and attach the scene's tracks, then prepare for
    /// the transport's current format.
    ///
    /// One-shot: a second call returns [`RoutingError::AlreadyBuilt`]. A failed
    /// build leaves the graph empty and may be retried.
    pub fn build(&self, edit: &Edit) -> Result<()> {
        if self
            .built
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RoutingError::AlreadyBuilt);
        }

        match self.build_inner(edit) {
            Ok(()) => {
                tracing::info!("Built graph for scene '{}'", self.scene.name);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Building scene '{}' failed: {e}", self.scene.name);
                // Best effort: an expired graph has nothing left to clear.
                let _ = self.manager.lock().clear();
                self.built.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    fn build_inner(&self, edit: &Edit) -> Result<()> {
        let description = GraphBuilder::new(edit).build_scene(&self.scene);
        *self.diagnostics.lock() = description.diagnostics().to_vec();

        let master = edit.master().ok_or(RoutingError::NoMaster)?;
        {
            let mut manager = self.manager.lock();
            manager.materialize(description)?;
            manager.attach_master(master)?;
        }

        self.prepare_to_play(self.transport.sample_rate(), self.transport.block_size());
        Ok(())
    }

    /// Prepare the graph and recorder for a new format. Blocks the graph lock;
    /// control thread only.
    pub fn prepare_to_play(&self, sample_rate: f64, block_size: usize) {
        {
            let mut graph = self.graph.lock();
            let unchanged = graph.is_prepared()
                && !graph.needs_commit()
                && graph.sample_rate() == sample_rate
                && graph.block_size() == block_size;
            if unchanged {
                return;
            }
            graph.prepare(sample_rate, block_size);
        }
        self.manager.lock().set_format(sample_rate, block_size);
        if let Some(recorder) = self.recorder.lock().as_mut() {
            recorder.prepare(sample_rate, block_size);
        }
        tracing::debug!(
            "Scene '{}' prepared at {sample_rate} Hz, {block_size} frames",
            self.scene.name
        );
    }

    /// Render one block at the transport playhead (RT-safe).
    ///
    /// Renders silence if the graph is locked for a rebuild.
    pub fn process_block(&self, buffer: &mut AudioBuffer, midi: &MidiBuffer) {
        let Some(mut graph) = self.graph.try_lock() else {
            buffer.clear();
            return;
        };
        let context = ProcessContext {
            playhead: self.transport.playhead(),
            playing: self.transport.is_playing(),
            sample_rate: self.transport.sample_rate(),
            midi,
        };
        graph.process_block(buffer, &context);
    }

    /// Tear down the graph, forget plugin nodes and release the recorder.
    pub fn shutdown(&self) {
        if let Err(e) = self.manager.lock().clear() {
            tracing::warn!("Shutting down scene '{}': {e}", self.scene.name);
        }
        self.graph.lock().clear();
        self.plugin_nodes.clear();
        if let Some(mut recorder) = self.recorder.lock().take() {
            recorder.release();
        }
        tracing::info!("Scene '{}' shut down", self.scene.name);
    }

    pub fn modules(&self) -> Vec<GraphModule> {
        self.manager.lock().modules().to_vec()
    }

    pub fn description_diagnostics(&self) -> Vec<BuildDiagnostic> {
        self.diagnostics.lock().clone()
    }

    pub fn failed_plugins(&self) -> Vec<FailedPlugin> {
        self.manager.lock().failed_plugins().to_vec()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn is_built(&self) -> bool {
        self.built.load(Ordering::Acquire)
    }

    pub fn graph(&self) -> &Arc<Mutex<ProcessingGraph>> {
        &self.graph
    }

    pub fn plugin_nodes(&self) -> &Arc<PluginNodeStore> {
        &self.plugin_nodes
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }
}

impl LiveGraph for GraphInstance {
    fn prepare_to_play(&self, sample_rate: f64, block_size: usize) {
        GraphInstance::prepare_to_play(self, sample_rate, block_size);
    }

    fn process_block(&self, buffer: &mut AudioBuffer, midi: &MidiBuffer) {
        GraphInstance::process_block(self, buffer, midi);
    }
}

impl std::fmt::Debug for GraphInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphInstance")
            .field("scene", &self.scene.name)
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}

//! EnsembleEngine: the edit, its launched scenes, and the output they play through.

use crate::{EnsembleEngineBuilder, Result};
use ensemble_core::params::{MUTE, VOLUME};
use ensemble_core::{
    AudioOutputEngine, EngineConfig, InstanceList, Mixer, ParameterStore, TrackId, Transport,
};
use ensemble_plugin::PluginRegistry;
use ensemble_routing::{Edit, GraphInstance, SceneId};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Main engine: owns the routing model, the shared transport, the parameter
/// cells, the plugin registry and the audio output.
///
/// Scenes are compiled into [`GraphInstance`]s on the control thread and
/// published to the output's live list, where every playing instance is mixed.
///
/// # Example
///
/// ```
/// use ensemble::prelude::*;
///
/// let engine = EnsembleEngine::builder().block_size(64).build()?;
/// let scene = engine.edit(|edit| -> ensemble::Result<SceneId> {
///     let master = edit.add_track(Track::aux(TrackId::new(1), "master"))?;
///     edit.add_track(Track::audio(TrackId::new(2), "keys").with_output(master))?;
///     edit.set_master(master)?;
///     Ok(edit.add_scene("all", Vec::new(), None))
/// })?;
///
/// engine.launch(scene)?;
/// engine.transport().play();
/// let block = engine.render_offline(64);
/// assert_eq!(block.len(), 64 * engine.channels());
/// assert_eq!(engine.transport().playhead(), 64);
/// # Ok::<(), ensemble::Error>(())
/// ```
pub struct EnsembleEngine {
    output: Mutex<AudioOutputEngine>,
    transport: Arc<Transport>,
    parameters: Arc<ParameterStore>,
    plugins: PluginRegistry,
    edit: RwLock<Edit>,
    launched: Mutex<Vec<Arc<GraphInstance>>>,
}

impl EnsembleEngine {
    pub fn builder() -> EnsembleEngineBuilder {
        EnsembleEngineBuilder::default()
    }

    pub(crate) fn from_parts(config: EngineConfig, plugins: PluginRegistry) -> Self {
        let transport = Arc::new(Transport::new(config.sample_rate, config.block_size));
        let mut output = AudioOutputEngine::new(config, transport.clone());
        output.audio_device_about_to_start(output.sample_rate(), output.block_size());

        Self {
            output: Mutex::new(output),
            transport,
            parameters: Arc::new(ParameterStore::new()),
            plugins,
            edit: RwLock::new(Edit::new()),
            launched: Mutex::new(Vec::new()),
        }
    }

    /// Open the output device and start the realtime callback.
    pub fn initialise(&self) -> Result<()> {
        self.output.lock().initialise()?;
        Ok(())
    }

    /// Stop the device callback. Launched scenes stay published.
    pub fn shutdown(&self) {
        self.output.lock().shutdown();
    }

    pub fn is_initialised(&self) -> bool {
        self.output.lock().is_initialised()
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    pub fn parameters(&self) -> &Arc<ParameterStore> {
        &self.parameters
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Mutate the routing model.
    ///
    /// Changes reach the audio only when a scene is launched (again).
    pub fn edit<R>(&self, f: impl FnOnce(&mut Edit) -> R) -> R {
        f(&mut self.edit.write())
    }

    /// Read the routing model.
    pub fn with_edit<R>(&self, f: impl FnOnce(&Edit) -> R) -> R {
        f(&self.edit.read())
    }

    /// Compile `scene` into a built, prepared [`GraphInstance`] without
    /// publishing it.
    pub fn build_scene(&self, scene: SceneId) -> Result<Arc<GraphInstance>> {
        let edit = self.edit.read();
        let instance = GraphInstance::new(
            edit.scene(scene)?.clone(),
            self.transport.clone(),
            Arc::new(self.plugins.clone()),
            self.parameters.clone(),
        );
        instance.build(&edit)?;
        Ok(Arc::new(instance))
    }

    /// Build `scene` and add it to the live list.
    ///
    /// A scene that is already live is replaced by the fresh build.
    pub fn launch(&self, scene: SceneId) -> Result<Arc<GraphInstance>> {
        let instance = self.build_scene(scene)?;
        let mut launched = self.launched.lock();
        let replaced: Vec<Arc<GraphInstance>> = launched
            .iter()
            .filter(|i| i.scene().id == scene)
            .cloned()
            .collect();
        launched.retain(|i| i.scene().id != scene);
        launched.push(instance.clone());
        self.publish(&launched);

        for old in replaced {
            old.shutdown();
        }
        tracing::info!(
            "Launched scene '{}' ({} live)",
            instance.scene().name,
            launched.len()
        );
        Ok(instance)
    }

    /// Remove `scene` from the live list. Returns whether it was live.
    pub fn stop_scene(&self, scene: SceneId) -> bool {
        let mut launched = self.launched.lock();
        let Some(position) = launched.iter().position(|i| i.scene().id == scene) else {
            return false;
        };
        let instance = launched.remove(position);
        self.publish(&launched);
        instance.shutdown();
        true
    }

    /// Locate to the scene's range and play it, or play from the current
    /// position if the scene has no range.
    pub fn play_scene(&self, scene: SceneId, looping: bool) -> Result<()> {
        let range = self.edit.read().scene(scene)?.range;
        match range {
            Some((start, end)) => self.transport.play_selection(start, end, looping),
            None => self.transport.play(),
        }
        Ok(())
    }

    /// Stop the transport and tear down every launched scene.
    pub fn stop_all(&self) {
        self.transport.stop();
        let mut launched = self.launched.lock();
        self.output.lock().set_instances(Vec::new());
        for instance in launched.drain(..) {
            instance.shutdown();
        }
        tracing::info!("Stopped all scenes");
    }

    pub fn live_scenes(&self) -> Vec<SceneId> {
        self.launched.lock().iter().map(|i| i.scene().id).collect()
    }

    fn publish(&self, launched: &[Arc<GraphInstance>]) {
        let list: InstanceList = launched
            .iter()
            .map(|i| i.clone() as Arc<dyn ensemble_core::LiveGraph>)
            .collect();
        self.output.lock().set_instances(list);
    }

    pub fn set_volume(&self, track: TrackId, volume: f32) -> bool {
        self.parameters.set(track, VOLUME, volume)
    }

    pub fn set_mute(&self, track: TrackId, muted: bool) -> bool {
        self.parameters
            .set(track, MUTE, if muted { 1.0 } else { 0.0 })
    }

    /// A mixer over the live list, for rendering without a device.
    pub fn mixer(&self) -> Mixer {
        self.output.lock().mixer()
    }

    /// Render `frames` frames of the live mix, interleaved over the output
    /// channels. Advances the transport like the device callback would.
    pub fn render_offline(&self, frames: usize) -> Vec<f32> {
        let channels = self.channels();
        let mut out = vec![0.0; frames * channels];
        self.mixer().render_interleaved(&mut out, channels);
        out
    }

    pub fn sample_rate(&self) -> f64 {
        self.output.lock().sample_rate()
    }

    pub fn block_size(&self) -> usize {
        self.output.lock().block_size()
    }

    pub fn channels(&self) -> usize {
        self.output.lock().channels()
    }

    pub fn config(&self) -> EngineConfig {
        self.output.lock().config().clone()
    }

    #[cfg(feature = "device")]
    pub fn list_output_devices() -> Result<Vec<String>> {
        Ok(AudioOutputEngine::list_output_devices()?)
    }
}

impl Drop for EnsembleEngine {
    fn drop(&mut self) {
        self.output.get_mut().shutdown();
        for instance in self.launched.get_mut().drain(..) {
            instance.shutdown();
        }
    }
}

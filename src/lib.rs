//! # Ensemble - DAW routing engine
//!
//! Compiles a track/routing model into live processing graphs and mixes them
//! against one shared, lock-free transport.
//!
//! ## Architecture
//!
//! Ensemble is an umbrella crate that coordinates:
//! - **ensemble-core** - Processing graph, Transport, parameter cells, output mixing
//! - **ensemble-plugin** - Plugin descriptors, factory seam, built-in processors
//! - **ensemble-routing** - Tracks, sends, scenes and their graph compiler
//!
//! ## Quick Start
//!
//! ```
//! use ensemble::prelude::*;
//!
//! let engine = EnsembleEngine::builder().build()?;
//!
//! let scene = engine.edit(|edit| -> ensemble::Result<SceneId> {
//!     let master = edit.add_track(Track::aux(TrackId::new(1), "master"))?;
//!     let verb = edit.add_track(
//!         Track::aux(TrackId::new(2), "verb")
//!             .with_output(master)
//!             .with_plugin(PluginDescriptor::new("echo", "delay").with_parameter("mix", 0.4)),
//!     )?;
//!     let vox = edit.add_track(Track::audio(TrackId::new(3), "vox").with_output(master))?;
//!     edit.add_send(vox, verb)?;
//!     edit.set_master(master)?;
//!     Ok(edit.add_scene("song", Vec::new(), None))
//! })?;
//!
//! let instance = engine.launch(scene)?;
//! assert_eq!(instance.modules().len(), 3);
//!
//! engine.transport().play();
//! engine.render_offline(1024);
//! # Ok::<(), ensemble::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `device` - Hardware output through CPAL. Without it the engine renders offline only.

/// Re-export of ensemble-core for direct access
pub use ensemble_core as core;

/// Re-export of ensemble-plugin
pub use ensemble_plugin as plugin;

/// Re-export of ensemble-routing
pub use ensemble_routing as routing;

pub use ensemble_core::{
    AtomicDouble, AtomicFloat, AudioBuffer, AudioProcessor, ChannelsFormat, EngineConfig,
    FrameRate, LiveGraph, MidiBuffer, Mixer, ParameterStore, ProcessContext, Timecode, TrackId,
    Transport, TransportState,
};
pub use ensemble_plugin::{PluginDescriptor, PluginFactory, PluginRegistry};
pub use ensemble_routing::{
    BuildDiagnostic, Clip, Edit, GraphBuilder, GraphInstance, MemorySource, SampleSource, Scene,
    SceneId, Track, TrackKind,
};

mod error;
pub use error::{Error, Result};

mod builder;
mod engine;

pub use builder::EnsembleEngineBuilder;
pub use engine::EnsembleEngine;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{EnsembleEngine, EnsembleEngineBuilder};

    pub use crate::core::{ChannelsFormat, ParameterStore, TrackId, Transport};
    pub use crate::plugin::{PluginDescriptor, PluginRegistry};
    pub use crate::routing::{Clip, Edit, GraphInstance, MemorySource, SceneId, Track};
}

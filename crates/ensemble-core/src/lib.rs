//! Realtime kernel for the ensemble engine: processing graph, transport,
//! parameter cells and output mixing.
//!
//! # Primary API
//!
//! - [`ProcessingGraph`]: boxed [`AudioProcessor`]s joined by per-channel connections
//! - [`Transport`]: lock-free, sample-accurate playback state
//! - [`ParameterStore`]: `(TrackId, key)` → [`AtomicFloat`] parameter cells
//! - [`AudioOutputEngine`] / [`Mixer`]: mixes every [`LiveGraph`] into the device
//!
//! # Features
//!
//! - `"device"`: CPAL hardware output. Without it, [`Mixer`] still renders offline.
//!
//! # Example
//!
//! ```
//! use ensemble_core::{EngineConfig, Transport, AudioOutputEngine};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(Transport::default());
//! let engine = AudioOutputEngine::new(EngineConfig::default(), transport.clone());
//!
//! transport.play();
//! let mut mixer = engine.mixer();
//! let mut device = vec![0.0f32; 2 * 256];
//! mixer.render_interleaved(&mut device, 2);
//! assert_eq!(transport.playhead(), 256);
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::EngineConfig;

pub mod lockfree;
pub use lockfree::{AtomicDouble, AtomicFloat};

mod id;
pub use id::TrackId;

mod format;
pub use format::ChannelsFormat;

mod buffer;
pub use buffer::{AudioBuffer, MidiBuffer, MidiEvent};

mod processor;
pub use processor::{AudioProcessor, Passthrough, ProcessContext};

mod graph;
pub use graph::{Connection, NodeId, ProcessingGraph};

pub mod params;
pub use params::ParameterStore;

mod smooth;
pub use smooth::SmoothedValue;

pub mod transport;
pub use transport::{FrameRate, Timecode, Transport, TransportSnapshot, TransportState};

mod callback;
pub use callback::{InstanceList, LiveGraph, LiveInstances, Mixer};

mod output;
pub use output::AudioOutputEngine;

pub mod prelude {
    pub use crate::{
        AudioBuffer, AudioOutputEngine, AudioProcessor, ChannelsFormat, EngineConfig, LiveGraph,
        MidiBuffer, NodeId, ParameterStore, ProcessContext, ProcessingGraph, TrackId, Transport,
    };
}

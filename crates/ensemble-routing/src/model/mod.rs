//! The declarative routing model: tracks, sends, clips, scenes.
//!
//! The model is owned and mutated by the control thread only. The graph
//! builder reads it; nothing on the audio thread ever touches it.

mod edit;
mod source;
mod track;

pub use edit::{Edit, Scene, SceneId};
pub use source::{MemorySource, SampleSource};
pub use track::{Clip, Track, TrackKind, TrackSend};

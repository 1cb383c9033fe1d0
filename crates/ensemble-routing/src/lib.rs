//! Track routing for the ensemble engine.
//!
//! The [`model`] is what the user edits: tracks, sends, aux busses, folders,
//! plugin chains and scenes. The [`graph`] module compiles a scene of that
//! model into a live processing graph driven by the shared
//! [`Transport`](ensemble_core::Transport).
//!
//! ```
//! use ensemble_core::{ParameterStore, TrackId, Transport};
//! use ensemble_plugin::PluginRegistry;
//! use ensemble_routing::prelude::*;
//! use std::sync::Arc;
//!
//! let mut edit = Edit::new();
//! let master = edit.add_track(Track::aux(TrackId::new(1), "master"))?;
//! edit.add_track(Track::audio(TrackId::new(2), "vox").with_output(master))?;
//! edit.set_master(master)?;
//! let scene = edit.add_scene("all", Vec::new(), None);
//!
//! let instance = GraphInstance::new(
//!     edit.scene(scene)?.clone(),
//!     Arc::new(Transport::default()),
//!     Arc::new(PluginRegistry::default()),
//!     Arc::new(ParameterStore::new()),
//! );
//! instance.build(&edit)?;
//! assert_eq!(instance.modules().len(), 2);
//! # Ok::<(), ensemble_routing::RoutingError>(())
//! ```

mod error;
pub use error::{Result, RoutingError};

pub mod graph;
pub use graph::{
    BuildDiagnostic, FailedPlugin, GraphBuilder, GraphDescription, GraphInstance, GraphManager,
    GraphModule, GraphNode, GraphNodeId, GraphNodeKind, RecordingCollaborator,
};

pub mod model;
pub use model::{Clip, Edit, MemorySource, SampleSource, Scene, SceneId, Track, TrackKind, TrackSend};

pub mod prelude {
    pub use crate::graph::{GraphBuilder, GraphDescription, GraphInstance};
    pub use crate::model::{Clip, Edit, MemorySource, Scene, SceneId, Track, TrackKind};
    pub use crate::{Result, RoutingError};
}

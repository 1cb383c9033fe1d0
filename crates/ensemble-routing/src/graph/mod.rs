//! From routing model to live processing graph.
//!
//! [`GraphBuilder`] walks an [`Edit`](crate::model::Edit) into a
//! [`GraphDescription`]: one virtual node per track, deduplicated acyclic edges.
//! [`GraphManager`] materializes that description into a
//! [`ProcessingGraph`](ensemble_core::ProcessingGraph), one [`GraphModule`] per
//! node. [`GraphInstance`] owns the result for one scene and implements
//! [`LiveGraph`](ensemble_core::LiveGraph) so the output engine can mix it.

mod builder;
mod description;
mod instance;
mod manager;
mod module;
mod stages;

pub use builder::GraphBuilder;
pub use description::{
    BuildDiagnostic, GraphConnectionDescription, GraphDescription, GraphNode, GraphNodeId,
    GraphNodeKind,
};
pub use instance::{GraphInstance, RecordingCollaborator};
pub use manager::GraphManager;
pub use module::{FailedPlugin, GraphModule};
pub use stages::{GainStage, TrackInput};

//! Error types for routing and graph materialization.

use crate::model::SceneId;
use ensemble_core::TrackId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    /// The processing graph was dropped while a manager still referred to it.
    #[error("Processing graph handle expired")]
    GraphExpired,

    #[error("No materialized module for master track {0}")]
    MissingMaster(TrackId),

    #[error("Edit has no master track")]
    NoMaster,

    #[error("Graph instance already built; create a new instance to re-route")]
    AlreadyBuilt,

    #[error("Unknown track: {0}")]
    UnknownTrack(TrackId),

    #[error("Track {0} already exists")]
    DuplicateTrack(TrackId),

    #[error("Track {0} is not a folder")]
    NotAFolder(TrackId),

    #[error("Unknown scene: {0:?}")]
    UnknownScene(SceneId),

    #[error(transparent)]
    Core(#[from] ensemble_core::Error),
}

pub type Result<T> = std::result::Result<T, RoutingError>;

//! Centralized error type for the ensemble umbrella crate.
//!
//! Wraps every subsystem error so `?` propagates across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] ensemble_core::Error),

    #[error("Plugin: {0}")]
    Plugin(#[from] ensemble_plugin::PluginError),

    #[error("Routing: {0}")]
    Routing(#[from] ensemble_routing::RoutingError),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Plugin descriptors, the [`PluginFactory`] seam and built-in processors.
//!
//! ```
//! use ensemble_plugin::{PluginDescriptor, PluginFactory, PluginRegistry};
//!
//! let registry = PluginRegistry::default();
//! let echo = PluginDescriptor::new("echo", "delay").with_parameter("mix", 0.3);
//! let processor = registry.create_processor_instance(&echo, 48000.0, 512, 2)?;
//! assert_eq!(processor.channels(), 2);
//! # Ok::<(), ensemble_plugin::PluginError>(())
//! ```

mod error;
pub use error::{PluginError, Result};

mod descriptor;
pub use descriptor::PluginDescriptor;

mod factory;
pub use factory::{parameter_in_range, PluginConstructor, PluginFactory, PluginRegistry, PluginSpec};

pub mod builtin;

mod store;
pub use store::PluginNodeStore;

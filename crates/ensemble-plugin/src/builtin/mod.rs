//! Built-in processors available from [`PluginRegistry::default`](crate::PluginRegistry).

mod delay;
mod gain;
mod invert;

pub use delay::Delay;
pub use gain::Gain;
pub use invert::Invert;

use crate::factory::{parameter_in_range, PluginRegistry};

pub(crate) fn register_builtin_plugins(registry: &PluginRegistry) {
    registry.register("gain", |spec| {
        let gain = parameter_in_range(spec, Gain::GAIN, 0.0..=Gain::MAX_GAIN, 1.0)?;
        Ok(Box::new(Gain::new(spec.channels, gain)))
    });

    registry.register("delay", |spec| {
        let time = parameter_in_range(spec, Delay::TIME_MS, 0.0..=Delay::MAX_TIME_MS, 250.0)?;
        let mix = parameter_in_range(spec, Delay::MIX, 0.0..=1.0, 0.5)?;
        Ok(Box::new(Delay::new(spec.channels, time, mix)))
    });

    registry.register("invert", |spec| Ok(Box::new(Invert::new(spec.channels))));
}

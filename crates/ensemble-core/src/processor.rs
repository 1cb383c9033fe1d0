//! The unit of work inside a [`ProcessingGraph`](crate::ProcessingGraph).

use crate::buffer::{AudioBuffer, MidiBuffer};
use crate::lockfree::AtomicFloat;
use std::sync::Arc;

/// Per-block information handed to every processor.
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext<'a> {
    /// Transport playhead at the first frame of the block.
    pub playhead: i64,
    pub playing: bool,
    pub sample_rate: f64,
    pub midi: &'a MidiBuffer,
}

/// A node of the processing graph.
///
/// Processors work in place: the buffer arrives holding the sum of every
/// incoming connection and leaves holding this node's output. Input and output
/// width are both [`channels`](AudioProcessor::channels).
///
/// `process` runs on the audio thread and must not allocate, lock or block.
/// Everything else runs on the control thread.
pub trait AudioProcessor: Send {
    fn name(&self) -> &str;

    fn channels(&self) -> usize;

    fn prepare(&mut self, _sample_rate: f64, _max_block_size: usize) {}

    fn process(&mut self, buffer: &mut AudioBuffer, context: &ProcessContext<'_>);

    fn reset(&mut self) {}

    /// Lock-free parameter cells this processor reads while processing.
    ///
    /// Hosts register these in a [`ParameterStore`](crate::ParameterStore) so the
    /// control thread can write them by key.
    fn parameters(&self) -> Vec<(String, Arc<AtomicFloat>)> {
        Vec::new()
    }

    /// Replace the cell behind parameter `key` with a host-owned one.
    ///
    /// Returns `false` if the key is unknown or the processor keeps its own cell.
    fn adopt_parameter(&mut self, _key: &str, _cell: Arc<AtomicFloat>) -> bool {
        false
    }
}

/// Forwards its input unchanged.
#[derive(Debug, Clone)]
pub struct Passthrough {
    name: String,
    channels: usize,
}

impl Passthrough {
    pub fn new(name: impl Into<String>, channels: usize) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }
}

impl AudioProcessor for Passthrough {
    fn name(&self) -> &str {
        &self.name
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn process(&mut self, _buffer: &mut AudioBuffer, _context: &ProcessContext<'_>) {}
}

//! Realtime mixing of live graphs.
//!
//! The control thread publishes the set of live graphs through
//! [`LiveInstances`]; the audio thread's [`Mixer`] loads that set once per
//! block without locking, renders every graph while the transport rolls, sums
//! them and advances the transport exactly once per rendered chunk.

use crate::buffer::{AudioBuffer, MidiBuffer};
use crate::transport::Transport;
use arc_swap::{ArcSwap, Guard};
use parking_lot::Mutex;
use std::sync::Arc;

/// A renderable graph the output engine can mix.
///
/// `process_block` is called from the audio thread; implementations must not
/// block (use `try_lock` and render silence if contended).
pub trait LiveGraph: Send + Sync {
    /// Prepare for a new audio format. Control thread.
    fn prepare_to_play(&self, sample_rate: f64, block_size: usize);

    /// Render `buffer.frames()` frames, overwriting `buffer`.
    fn process_block(&self, buffer: &mut AudioBuffer, midi: &MidiBuffer);
}

pub type InstanceList = Vec<Arc<dyn LiveGraph>>;

/// The published list of live graphs.
///
/// Publishing replaces the whole list with one atomic store. The previous list
/// is parked in `retired` so its last reference is dropped on the control
/// thread at the next publish, never inside the audio callback.
pub struct LiveInstances {
    current: ArcSwap<InstanceList>,
    retired: Mutex<Option<Arc<InstanceList>>>,
}

impl Default for LiveInstances {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveInstances {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
            retired: Mutex::new(None),
        }
    }

    pub fn publish(&self, instances: InstanceList) {
        let previous = self.current.swap(Arc::new(instances));
        *self.retired.lock() = Some(previous);
    }

    /// Lock-free load for the audio thread.
    #[inline]
    pub fn load(&self) -> Guard<Arc<InstanceList>> {
        self.current.load()
    }

    /// Owned copy of the current list for control-thread iteration.
    pub fn snapshot(&self) -> Arc<InstanceList> {
        self.current.load_full()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Audio-thread mixer state. All buffers are allocated in [`Mixer::new`].
pub struct Mixer {
    transport: Arc<Transport>,
    instances: Arc<LiveInstances>,
    mix: AudioBuffer,
    scratch: AudioBuffer,
    midi: MidiBuffer,
}

impl Mixer {
    pub fn new(
        transport: Arc<Transport>,
        instances: Arc<LiveInstances>,
        channels: usize,
        block_size: usize,
    ) -> Self {
        Self {
            transport,
            instances,
            mix: AudioBuffer::new(channels, block_size),
            scratch: AudioBuffer::new(channels, block_size),
            midi: MidiBuffer::default(),
        }
    }

    pub fn channels(&self) -> usize {
        self.mix.channels()
    }

    pub fn block_size(&self) -> usize {
        self.mix.capacity()
    }

    /// Render one chunk of at most `block_size` frames into the mix buffer.
    pub fn render_chunk(&mut self, frames: usize) -> &AudioBuffer {
        let frames = frames.min(self.mix.capacity());
        self.mix.set_frames(frames);
        self.mix.clear();
        self.scratch.set_frames(frames);

        // Every instance of one chunk sees the same play state.
        if self.transport.is_playing() {
            let instances = self.instances.load();
            for instance in instances.iter() {
                self.scratch.clear();
                instance.process_block(&mut self.scratch, &self.midi);
                self.mix.add_from(&self.scratch);
            }
        }

        self.transport.advance(frames as i64);
        &self.mix
    }

    /// Fill an interleaved device buffer, rendering it in block-sized chunks.
    pub fn render_interleaved(&mut self, output: &mut [f32], output_channels: usize) {
        if output_channels == 0 {
            return;
        }
        let block = self.block_size().max(1);
        for chunk in output.chunks_mut(block * output_channels) {
            let frames = chunk.len() / output_channels;
            self.render_chunk(frames).write_interleaved(chunk, output_channels);
        }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }
}

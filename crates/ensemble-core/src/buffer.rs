//! Pre-allocated planar audio buffers and block-local MIDI event lists.
//!
//! Both types allocate only in their constructors. Everything called from the
//! audio thread works within the capacity fixed at construction.

/// Planar audio buffer with a fixed capacity and a variable frame count.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    data: Vec<f32>,
    channels: usize,
    capacity: usize,
    frames: usize,
}

impl AudioBuffer {
    /// Create a silent buffer holding up to `capacity` frames per channel.
    pub fn new(channels: usize, capacity: usize) -> Self {
        Self {
            data: vec![0.0; channels * capacity],
            channels,
            capacity,
            frames: capacity,
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Set the active frame count, clamped to the capacity.
    #[inline]
    pub fn set_frames(&mut self, frames: usize) {
        self.frames = frames.min(self.capacity);
    }

    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        let start = channel * self.capacity;
        &self.data[start..start + self.frames]
    }

    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        let start = channel * self.capacity;
        &mut self.data[start..start + self.frames]
    }

    /// Zero the active frames of every channel.
    pub fn clear(&mut self) {
        for channel in 0..self.channels {
            self.channel_mut(channel).fill(0.0);
        }
    }

    pub fn fill(&mut self, value: f32) {
        for channel in 0..self.channels {
            self.channel_mut(channel).fill(value);
        }
    }

    /// Sum one channel of `source` into one channel of `self`.
    #[inline]
    pub fn add_channel_from(&mut self, channel: usize, source: &AudioBuffer, source_channel: usize) {
        let frames = self.frames.min(source.frames);
        let src = &source.channel(source_channel)[..frames];
        let dst = &mut self.channel_mut(channel)[..frames];
        for (d, s) in dst.iter_mut().zip(src) {
            *d += *s;
        }
    }

    /// Sum every overlapping channel of `source` into `self`.
    pub fn add_from(&mut self, source: &AudioBuffer) {
        for channel in 0..self.channels.min(source.channels) {
            self.add_channel_from(channel, source, channel);
        }
    }

    /// Copy overlapping channels from `source`; extra channels of `self` are silenced.
    pub fn copy_from(&mut self, source: &AudioBuffer) {
        let frames = self.frames.min(source.frames);
        for channel in 0..self.channels {
            let dst = self.channel_mut(channel);
            if channel < source.channels {
                dst[..frames].copy_from_slice(&source.channel(channel)[..frames]);
                dst[frames..].fill(0.0);
            } else {
                dst.fill(0.0);
            }
        }
    }

    /// Interleave the active frames into `output`, which has `output_channels`
    /// channels per frame. Hardware channels beyond this buffer get silence.
    pub fn write_interleaved(&self, output: &mut [f32], output_channels: usize) {
        if output_channels == 0 {
            return;
        }
        for (frame, out) in output
            .chunks_exact_mut(output_channels)
            .take(self.frames)
            .enumerate()
        {
            for (channel, sample) in out.iter_mut().enumerate() {
                *sample = if channel < self.channels {
                    self.data[channel * self.capacity + frame]
                } else {
                    0.0
                };
            }
        }
    }

    pub fn peak(&self) -> f32 {
        (0..self.channels)
            .flat_map(|c| self.channel(c).iter())
            .fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }
}

/// A short MIDI message positioned within the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    pub frame: u32,
    pub data: [u8; 3],
}

/// Fixed-capacity list of MIDI events for one processing block.
#[derive(Debug, Clone)]
pub struct MidiBuffer {
    events: Vec<MidiEvent>,
}

impl MidiBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Append an event. Returns `false` (and drops the event) when full.
    pub fn push(&mut self, event: MidiEvent) -> bool {
        if self.events.len() == self.events.capacity() {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MidiEvent> {
        self.events.iter()
    }
}

impl Default for MidiBuffer {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

use ensemble_core::{AudioBuffer, AudioProcessor, ProcessContext};

/// Polarity inversion.
pub struct Invert {
    channels: usize,
}

impl Invert {
    pub fn new(channels: usize) -> Self {
        Self { channels }
    }
}

impl AudioProcessor for Invert {
    fn name(&self) -> &str {
        "invert"
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn process(&mut self, buffer: &mut AudioBuffer, _context: &ProcessContext<'_>) {
        for c in 0..buffer.channels() {
            buffer.channel_mut(c).iter_mut().for_each(|s| *s = -*s);
        }
    }
}

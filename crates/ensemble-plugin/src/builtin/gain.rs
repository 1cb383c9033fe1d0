use ensemble_core::{AtomicFloat, AudioBuffer, AudioProcessor, ProcessContext, SmoothedValue};
use std::sync::Arc;

/// Linear gain with a short ramp on changes.
pub struct Gain {
    channels: usize,
    gain: Arc<AtomicFloat>,
    smoother: SmoothedValue,
    ramp: Vec<f32>,
}

impl Gain {
    pub const GAIN: &'static str = "gain";
    pub const MAX_GAIN: f32 = 4.0;

    pub fn new(channels: usize, gain: f32) -> Self {
        Self {
            channels,
            gain: Arc::new(AtomicFloat::new(gain)),
            smoother: SmoothedValue::new(gain, 0.005),
            ramp: Vec::new(),
        }
    }
}

impl AudioProcessor for Gain {
    fn name(&self) -> &str {
        "gain"
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.smoother.set_target(self.gain.get());
        self.smoother.prepare(sample_rate);
        self.ramp = vec![0.0; max_block_size];
    }

    fn process(&mut self, buffer: &mut AudioBuffer, _context: &ProcessContext<'_>) {
        self.smoother.set_target(self.gain.get_relaxed());
        let frames = buffer.frames().min(self.ramp.len());
        let ramp = &mut self.ramp[..frames];
        self.smoother.fill(ramp);
        for c in 0..buffer.channels() {
            for (s, g) in buffer.channel_mut(c).iter_mut().zip(ramp.iter()) {
                *s *= *g;
            }
        }
    }

    fn reset(&mut self) {
        self.smoother.snap();
    }

    fn parameters(&self) -> Vec<(String, Arc<AtomicFloat>)> {
        vec![(Self::GAIN.to_string(), self.gain.clone())]
    }

    fn adopt_parameter(&mut self, key: &str, cell: Arc<AtomicFloat>) -> bool {
        if key != Self::GAIN {
            return false;
        }
        self.smoother.set_target(cell.get());
        self.smoother.snap();
        self.gain = cell;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ensemble_core::MidiBuffer;

    #[test]
    fn test_gain_settles_on_new_value() {
        let mut gain = Gain::new(2, 1.0);
        gain.prepare(1000.0, 64);
        gain.parameters()[0].1.set(0.5);

        let midi = MidiBuffer::default();
        let ctx = ProcessContext {
            playhead: 0,
            playing: true,
            sample_rate: 1000.0,
            midi: &midi,
        };
        let mut buffer = AudioBuffer::new(2, 64);
        buffer.fill(1.0);
        gain.process(&mut buffer, &ctx);

        // 5 ms at 1 kHz is a five-sample ramp.
        assert!(buffer.channel(0)[0] > 0.5);
        assert_relative_eq!(buffer.channel(1)[63], 0.5);
    }

    #[test]
    fn test_adopted_cell_drives_gain() {
        let mut gain = Gain::new(1, 2.0);
        let shared = Arc::new(AtomicFloat::new(0.25));
        assert!(gain.adopt_parameter(Gain::GAIN, shared.clone()));
        assert!(!gain.adopt_parameter("cutoff", Arc::new(AtomicFloat::new(0.0))));
        assert!(Arc::ptr_eq(&gain.parameters()[0].1, &shared));
        gain.prepare(1000.0, 16);

        let midi = MidiBuffer::default();
        let ctx = ProcessContext {
            playhead: 0,
            playing: true,
            sample_rate: 1000.0,
            midi: &midi,
        };
        let mut buffer = AudioBuffer::new(1, 16);
        buffer.fill(1.0);
        gain.process(&mut buffer, &ctx);
        assert_relative_eq!(buffer.channel(0)[0], 0.25);
    }
}

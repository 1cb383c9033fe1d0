use ensemble_core::{AtomicFloat, AudioBuffer, AudioProcessor, ProcessContext};
use std::sync::Arc;

/// Feed-forward delay with a dry/wet mix.
///
/// Delay lines are sized for [`Delay::MAX_TIME_MS`] in `prepare`, so changing
/// the time while running never allocates.
pub struct Delay {
    channels: usize,
    time_ms: Arc<AtomicFloat>,
    mix: Arc<AtomicFloat>,
    sample_rate: f64,
    lines: Vec<Vec<f32>>,
    write: usize,
}

impl Delay {
    pub const TIME_MS: &'static str = "time_ms";
    pub const MIX: &'static str = "mix";
    pub const MAX_TIME_MS: f32 = 2000.0;

    pub fn new(channels: usize, time_ms: f32, mix: f32) -> Self {
        Self {
            channels,
            time_ms: Arc::new(AtomicFloat::new(time_ms)),
            mix: Arc::new(AtomicFloat::new(mix)),
            sample_rate: 44100.0,
            lines: Vec::new(),
            write: 0,
        }
    }

    fn delay_samples(&self, len: usize) -> usize {
        let time = self.time_ms.get_relaxed().clamp(0.0, Self::MAX_TIME_MS) as f64;
        ((time * 0.001 * self.sample_rate) as usize).min(len.saturating_sub(1))
    }
}

impl AudioProcessor for Delay {
    fn name(&self) -> &str {
        "delay"
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn prepare(&mut self, sample_rate: f64, _max_block_size: usize) {
        self.sample_rate = sample_rate;
        let len = (Self::MAX_TIME_MS as f64 * 0.001 * sample_rate) as usize + 1;
        self.lines = vec![vec![0.0; len]; self.channels];
        self.write = 0;
    }

    fn process(&mut self, buffer: &mut AudioBuffer, _context: &ProcessContext<'_>) {
        let Some(len) = self.lines.first().map(Vec::len) else {
            return;
        };
        let delay = self.delay_samples(len);
        let wet = self.mix.get_relaxed().clamp(0.0, 1.0);
        let dry = 1.0 - wet;
        let start = self.write;

        for (c, line) in self.lines.iter_mut().enumerate().take(buffer.channels()) {
            let mut write = start;
            for s in buffer.channel_mut(c) {
                line[write] = *s;
                let read = (write + len - delay) % len;
                *s = *s * dry + line[read] * wet;
                write = (write + 1) % len;
            }
        }
        self.write = (start + buffer.frames()) % len;
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.fill(0.0);
        }
        self.write = 0;
    }

    fn parameters(&self) -> Vec<(String, Arc<AtomicFloat>)> {
        vec![
            (Self::TIME_MS.to_string(), self.time_ms.clone()),
            (Self::MIX.to_string(), self.mix.clone()),
        ]
    }

    fn adopt_parameter(&mut self, key: &str, cell: Arc<AtomicFloat>) -> bool {
        match key {
            Self::TIME_MS => self.time_ms = cell,
            Self::MIX => self.mix = cell,
            _ => return false,
        }
        true
    }
}

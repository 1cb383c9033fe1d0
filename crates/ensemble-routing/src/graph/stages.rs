//! Processors that make up the fixed ends of a track's chain.

use crate::model::Clip;
use ensemble_core::{AtomicFloat, AudioBuffer, AudioProcessor, ProcessContext, SmoothedValue};
use std::sync::Arc;

/// Plays a track's clips at the transport playhead.
pub struct TrackInput {
    name: String,
    channels: usize,
    clips: Vec<Clip>,
    scratch: Vec<f32>,
}

impl TrackInput {
    pub fn new(name: impl Into<String>, channels: usize, clips: Vec<Clip>) -> Self {
        Self {
            name: name.into(),
            channels,
            clips,
            scratch: Vec::new(),
        }
    }
}

impl AudioProcessor for TrackInput {
    fn name(&self) -> &str {
        &self.name
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn prepare(&mut self, _sample_rate: f64, max_block_size: usize) {
        self.scratch = vec![0.0; max_block_size];
    }

    fn process(&mut self, buffer: &mut AudioBuffer, context: &ProcessContext<'_>) {
        if !context.playing {
            return;
        }
        let block_start = context.playhead;
        let block_end = block_start + buffer.frames() as i64;

        for clip in &self.clips {
            let from = clip.start.max(block_start);
            let to = clip.end().min(block_end);
            if from >= to {
                continue;
            }
            let count = ((to - from) as usize).min(self.scratch.len());
            let offset = (from - block_start) as usize;
            let source_start = clip.offset + (from - clip.start);
            let source_channels = clip.source.channels();
            if source_channels == 0 {
                continue;
            }

            for channel in 0..buffer.channels() {
                let scratch = &mut self.scratch[..count];
                clip.source
                    .read(channel.min(source_channels - 1), source_start, scratch);
                let out = &mut buffer.channel_mut(channel)[offset..offset + count];
                for (o, s) in out.iter_mut().zip(scratch.iter()) {
                    *o += *s;
                }
            }
        }
    }
}

/// Track volume and mute, read from lock-free parameter cells.
pub struct GainStage {
    name: String,
    channels: usize,
    volume: Arc<AtomicFloat>,
    mute: Arc<AtomicFloat>,
    smoother: SmoothedValue,
    ramp: Vec<f32>,
}

impl GainStage {
    const RAMP_SECS: f32 = 0.01;

    pub fn new(
        name: impl Into<String>,
        channels: usize,
        volume: Arc<AtomicFloat>,
        mute: Arc<AtomicFloat>,
    ) -> Self {
        let mut stage = Self {
            name: name.into(),
            channels,
            volume,
            mute,
            smoother: SmoothedValue::new(1.0, Self::RAMP_SECS),
            ramp: Vec::new(),
        };
        let target = stage.target();
        stage.smoother.set_target(target);
        stage
    }

    #[inline]
    fn target(&self) -> f32 {
        if self.mute.get_relaxed() >= 0.5 {
            0.0
        } else {
            self.volume.get_relaxed()
        }
    }
}

impl AudioProcessor for GainStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        let target = self.target();
        self.smoother.set_target(target);
        self.smoother.prepare(sample_rate);
        self.ramp = vec![0.0; max_block_size];
    }

    fn process(&mut self, buffer: &mut AudioBuffer, _context: &ProcessContext<'_>) {
        let target = self.target();
        self.smoother.set_target(target);

        if !self.smoother.is_ramping() {
            for c in 0..buffer.channels() {
                self.smoother.apply(buffer.channel_mut(c));
            }
            return;
        }

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
}

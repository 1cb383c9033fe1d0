/// Read access to decoded audio.
///
/// `read` runs on the audio thread: implementations must not block or allocate.
pub trait SampleSource: Send + Sync {
    fn channels(&self) -> usize;

    /// Length in samples.
    fn length(&self) -> i64;

    /// Copy `out.len()` samples of `channel` starting at `start`.
    /// Positions outside the source read as silence.
    fn read(&self, channel: usize, start: i64, out: &mut [f32]);
}

/// Planar samples held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    channels: Vec<Vec<f32>>,
}

impl MemorySource {
    pub fn new(channels: Vec<Vec<f32>>) -> Self {
        Self { channels }
    }

    /// `length` samples of `value` on every channel.
    pub fn constant(channels: usize, length: usize, value: f32) -> Self {
        Self::new(vec![vec![value; length]; channels])
    }
}

impl SampleSource for MemorySource {
    fn channels(&self) -> usize {
        self.channels.len()
    }

    fn length(&self) -> i64 {
        self.channels.first().map_or(0, |c| c.len() as i64)
    }

    fn read(&self, channel: usize, start: i64, out: &mut [f32]) {
        out.fill(0.0);
        let Some(data) = self.channels.get(channel) else {
            return;
        };
        let len = data.len() as i64;
        let end = start + out.len() as i64;
        let from = start.clamp(0, len);
        let to = end.clamp(0, len);
        if from >= to {
            return;
        }
        let offset = (from - start) as usize;
        let count = (to - from) as usize;
        out[offset..offset + count].copy_from_slice(&data[from as usize..to as usize]);
    }
}

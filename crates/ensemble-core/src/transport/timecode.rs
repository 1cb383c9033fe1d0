//! Playhead display as SMPTE-style timecode.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FrameRate {
    /// Film.
    Fps24 = 0,
    /// PAL video.
    #[default]
    Fps25 = 1,
    /// NTSC video, non-drop counting.
    Fps2997 = 2,
    Fps30 = 3,
}

impl FrameRate {
    pub fn fps(self) -> f64 {
        match self {
            FrameRate::Fps24 => 24.0,
            FrameRate::Fps25 => 25.0,
            FrameRate::Fps2997 => 30000.0 / 1001.0,
            FrameRate::Fps30 => 30.0,
        }
    }

    /// Frames counted per timecode second.
    pub fn nominal_frames(self) -> u32 {
        match self {
            FrameRate::Fps24 => 24,
            FrameRate::Fps25 => 25,
            FrameRate::Fps2997 | FrameRate::Fps30 => 30,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => FrameRate::Fps24,
            2 => FrameRate::Fps2997,
            3 => FrameRate::Fps30,
            _ => FrameRate::Fps25,
        }
    }
}

/// `hh:mm:ss:ff`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

impl Timecode {
    /// Convert a sample position. Negative positions read as zero.
    pub fn from_samples(samples: i64, sample_rate: f64, rate: FrameRate) -> Self {
        if samples <= 0 || sample_rate <= 0.0 {
            return Self::default();
        }
        let total_frames = (samples as f64 / sample_rate * rate.fps()).floor() as u64;
        let per_second = rate.nominal_frames() as u64;

        let frames = (total_frames % per_second) as u32;
        let total_seconds = total_frames / per_second;
        Self {
            hours: (total_seconds / 3600) as u32,
            minutes: ((total_seconds / 60) % 60) as u32,
            seconds: (total_seconds % 60) as u32,
            frames,
        }
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_negative() {
        assert_eq!(
            Timecode::from_samples(-100, 48000.0, FrameRate::Fps25).to_string(),
            "00:00:00:00"
        );
    }

    #[test]
    fn test_whole_hour() {
        let tc = Timecode::from_samples(48000 * 3600, 48000.0, FrameRate::Fps24);
        assert_eq!(tc.to_string(), "01:00:00:00");
    }

    #[test]
    fn test_frames_field() {
        // 1.5 s at 25 fps is 37 frames: one second and 12 frames.
        let tc = Timecode::from_samples(72000, 48000.0, FrameRate::Fps25);
        assert_eq!(tc.seconds, 1);
        assert_eq!(tc.frames, 12);
    }

    #[test]
    fn test_frame_rate_u8_roundtrip() {
        for rate in [
            FrameRate::Fps24,
            FrameRate::Fps25,
            FrameRate::Fps2997,
            FrameRate::Fps30,
        ] {
            assert_eq!(FrameRate::from_u8(rate as u8), rate);
        }
    }
}

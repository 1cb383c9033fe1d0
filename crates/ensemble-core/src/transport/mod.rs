//! Sample-accurate, lock-free playback state shared by the control and audio threads.
//!
//! All mode flags live in one `AtomicU8`, so a reader never observes a torn
//! combination such as "looping but not playing". Positions are separate
//! `AtomicI64`s: writers store them before publishing the mode (Release) and
//! readers load the mode first (Acquire).
//!
//! Only the audio thread calls [`Transport::advance`], once per block.

mod state;
mod timecode;

pub use state::TransportState;
pub use timecode::{FrameRate, Timecode};

use crate::lockfree::AtomicDouble;
use crate::{Error, Result};
use state::{BOUNDED, LOOPING, NO_STOP, PLAYING, SELECTION, STOPPED};
use std::sync::atomic::{AtomicI64, AtomicU8, AtomicUsize, Ordering};

/// Point-in-time copy of the transport for display.
///
/// Fields are read one by one, so under concurrent writes the copy is only
/// eventually consistent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSnapshot {
    pub state: TransportState,
    pub playhead: i64,
    pub play_start: i64,
    pub play_end: i64,
    pub playing_selection: bool,
    pub sample_rate: f64,
    pub block_size: usize,
}

pub struct Transport {
    mode: AtomicU8,
    playhead: AtomicI64,
    play_start: AtomicI64,
    play_end: AtomicI64,
    stop_sample: AtomicI64,
    sample_rate: AtomicDouble,
    block_size: AtomicUsize,
    frame_rate: AtomicU8,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(44100.0, 512)
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("state", &self.state())
            .field("playhead", &self.playhead())
            .finish()
    }
}

impl Transport {
    pub fn new(sample_rate: f64, block_size: usize) -> Self {
        Self {
            mode: AtomicU8::new(STOPPED),
            playhead: AtomicI64::new(0),
            play_start: AtomicI64::new(0),
            play_end: AtomicI64::new(0),
            stop_sample: AtomicI64::new(NO_STOP),
            sample_rate: AtomicDouble::new(sample_rate),
            block_size: AtomicUsize::new(block_size),
            frame_rate: AtomicU8::new(FrameRate::default() as u8),
        }
    }

    /// Reset the playhead to zero and store the audio format.
    ///
    /// Fails with [`Error::TransportRunning`] while playing; use
    /// [`set_audio_format`](Self::set_audio_format) for a device restart mid-play.
    pub fn prepare(&self, sample_rate: f64, block_size: usize) -> Result<()> {
        if self.is_playing() {
            return Err(Error::TransportRunning);
        }
        self.playhead.store(0, Ordering::Release);
        self.set_audio_format(sample_rate, block_size);
        Ok(())
    }

    pub fn set_audio_format(&self, sample_rate: f64, block_size: usize) {
        self.sample_rate.set(sample_rate);
        self.block_size.store(block_size, Ordering::Release);
    }

    /// Roll from the current playhead with no end point.
    pub fn play(&self) {
        self.mode.store(PLAYING, Ordering::Release);
    }

    /// Roll from the current playhead until `end`, then stop or loop back.
    ///
    /// An `end` before the playhead is treated as the playhead itself.
    pub fn play_until(&self, end: i64, looping: bool) {
        let start = self.playhead();
        self.publish_bounded(start, end, looping, 0);
    }

    /// Jump to `start` and roll until `end`.
    pub fn play_selection(&self, start: i64, end: i64, looping: bool) {
        let start = start.max(0);
        self.playhead.store(start, Ordering::Release);
        self.publish_bounded(start, end, looping, SELECTION);
    }

    fn publish_bounded(&self, start: i64, end: i64, looping: bool, extra: u8) {
        self.play_start.store(start, Ordering::Release);
        self.play_end.store(end.max(start), Ordering::Release);
        let kind = if looping { LOOPING } else { BOUNDED };
        self.mode.store(PLAYING | kind | extra, Ordering::Release);
    }

    /// Stop playback and capture the playhead as the stop sample.
    ///
    /// Returns `false` when already stopped. When the control and audio
    /// threads race to stop, exactly one call returns `true`.
    pub fn stop(&self) -> bool {
        let mut expected = self.mode.load(Ordering::Acquire);
        while expected & PLAYING != 0 {
            match self.mode.compare_exchange(
                expected,
                STOPPED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let at = self.playhead.load(Ordering::Acquire);
                    self.stop_sample.store(at, Ordering::Release);
                    return true;
                }
                Err(actual) => expected = actual,
            }
        }
        false
    }

    /// Take the sample captured by the last stop. Returns it once, then `None`.
    pub fn consume_stop_sample(&self) -> Option<i64> {
        let sample = self.stop_sample.swap(NO_STOP, Ordering::AcqRel);
        (sample != NO_STOP).then_some(sample)
    }

    pub fn has_stopped(&self) -> bool {
        self.stop_sample.load(Ordering::Acquire) != NO_STOP
    }

    /// Move the playhead to zero. Ignored while playing.
    pub fn rewind(&self) -> bool {
        self.locate(0)
    }

    /// Move the playhead (clamped at zero). Ignored while playing.
    pub fn locate(&self, sample: i64) -> bool {
        if self.is_playing() {
            return false;
        }
        self.playhead.store(sample.max(0), Ordering::Release);
        true
    }

    /// Advance the playhead by one block. Audio thread only.
    ///
    /// Returns `true` when this call reached the bounded end and stopped.
    pub fn advance(&self, num_samples: i64) -> bool {
        let mode = self.mode.load(Ordering::Acquire);
        if mode & PLAYING == 0 {
            return false;
        }

        let current = self.playhead.load(Ordering::Acquire);
        let mut next = current.saturating_add(num_samples).max(0);
        let mut reached_end = false;

        if mode & (BOUNDED | LOOPING) != 0 {
            let end = self.play_end.load(Ordering::Acquire);
            if next > end {
                if mode & LOOPING != 0 {
                    next = self.play_start.load(Ordering::Acquire);
                } else {
                    next = end;
                    reached_end = true;
                }
            }
        }

        // A control-thread relocation since the load wins over this advance.
        let _ = self
            .playhead
            .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire);

        reached_end && self.stop_at_end(mode)
    }

    /// Stop only if the mode is still the one `advance` loaded.
    ///
    /// A `stop` or a fresh `play*` published since then wins, so an end
    /// reached under a superseded mode never stops the new playback.
    fn stop_at_end(&self, loaded: u8) -> bool {
        if self
            .mode
            .compare_exchange(loaded, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let at = self.playhead.load(Ordering::Acquire);
        self.stop_sample.store(at, Ordering::Release);
        true
    }

    pub fn is_playing(&self) -> bool {
        self.mode.load(Ordering::Acquire) & PLAYING != 0
    }

    pub fn is_looping(&self) -> bool {
        let mode = self.mode.load(Ordering::Acquire);
        mode & PLAYING != 0 && mode & LOOPING != 0
    }

    pub fn is_playing_selection(&self) -> bool {
        let mode = self.mode.load(Ordering::Acquire);
        mode & PLAYING != 0 && mode & SELECTION != 0
    }

    pub fn state(&self) -> TransportState {
        TransportState::from_mode(self.mode.load(Ordering::Acquire))
    }

    pub fn playhead(&self) -> i64 {
        self.playhead.load(Ordering::Acquire)
    }

    pub fn play_start(&self) -> i64 {
        self.play_start.load(Ordering::Acquire)
    }

    pub fn play_end(&self) -> i64 {
        self.play_end.load(Ordering::Acquire)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate.get()
    }

    pub fn block_size(&self) -> usize {
        self.block_size.load(Ordering::Acquire)
    }

    pub fn frame_rate(&self) -> FrameRate {
        FrameRate::from_u8(self.frame_rate.load(Ordering::Relaxed))
    }

    pub fn set_frame_rate(&self, rate: FrameRate) {
        self.frame_rate.store(rate as u8, Ordering::Relaxed);
    }

    pub fn timecode(&self) -> Timecode {
        Timecode::from_samples(self.playhead(), self.sample_rate(), self.frame_rate())
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        let mode = self.mode.load(Ordering::Acquire);
        TransportSnapshot {
            state: TransportState::from_mode(mode),
            playhead: self.playhead(),
            play_start: self.play_start(),
            play_end: self.play_end(),
            playing_selection: mode & PLAYING != 0 && mode & SELECTION != 0,
            sample_rate: self.sample_rate(),
            block_size: self.block_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_free_play_advances() {
        let t = Transport::default();
        t.play();
        t.advance(512);
        t.advance(512);
        assert_eq!(t.playhead(), 1024);
        assert_eq!(t.state(), TransportState::PlayingFree);
    }

    #[test]
    fn test_advance_while_stopped_is_noop() {
        let t = Transport::default();
        t.advance(512);
        assert_eq!(t.playhead(), 0);
    }

    #[test]
    fn test_negative_advance_clamps_to_zero() {
        let t = Transport::default();
        t.locate(100);
        t.play();
        t.advance(-500);
        assert_eq!(t.playhead(), 0);
    }

    #[test]
    fn test_looping_returns_to_play_start() {
        let t = Transport::default();
        t.locate(1000);
        t.play_until(1500, true);
        assert!(t.is_looping());

        t.advance(400);
        assert_eq!(t.playhead(), 1400);
        t.advance(400);
        assert_eq!(t.playhead(), 1000);
        assert!(t.is_playing());
    }

    #[test]
    fn test_bounded_clamps_and_stops() {
        let t = Transport::default();
        t.play_until(1000, false);
        t.advance(600);
        t.advance(600);

        assert_eq!(t.playhead(), 1000);
        assert!(!t.is_playing());
        assert!(t.has_stopped());
        assert_eq!(t.consume_stop_sample(), Some(1000));
        assert_eq!(t.consume_stop_sample(), None);
        assert!(!t.has_stopped());
    }

    #[test]
    fn test_stop_while_stopped_is_noop() {
        let t = Transport::default();
        assert!(!t.stop());
        assert_eq!(t.consume_stop_sample(), None);
    }

    #[test]
    fn test_stop_captures_playhead() {
        let t = Transport::default();
        t.play();
        t.advance(256);
        assert!(t.stop());
        assert_eq!(t.consume_stop_sample(), Some(256));
    }

    #[test]
    fn test_rewind_and_locate_ignored_while_playing() {
        let t = Transport::default();
        t.locate(300);
        t.play();
        assert!(!t.rewind());
        assert!(!t.locate(10));
        assert_eq!(t.playhead(), 300);

        t.stop();
        assert!(t.rewind());
        assert_eq!(t.playhead(), 0);
        assert!(t.locate(-5));
        assert_eq!(t.playhead(), 0);
    }

    #[test]
    fn test_prepare_rejected_while_playing() {
        let t = Transport::default();
        t.locate(99);
        assert!(t.prepare(48000.0, 256).is_ok());
        assert_eq!(t.playhead(), 0);
        assert_eq!(t.sample_rate(), 48000.0);

        t.play();
        t.advance(10);
        assert!(matches!(
            t.prepare(96000.0, 128),
            Err(Error::TransportRunning)
        ));
        t.set_audio_format(96000.0, 128);
        assert_eq!(t.playhead(), 10);
        assert_eq!(t.block_size(), 128);
    }

    #[test]
    fn test_play_selection() {
        let t = Transport::default();
        t.play_selection(2000, 3000, false);
        assert_eq!(t.playhead(), 2000);
        assert_eq!(t.play_start(), 2000);
        assert!(t.is_playing_selection());
        assert_eq!(t.state(), TransportState::PlayingBounded);

        t.stop();
        assert!(!t.is_playing_selection());
    }

    #[test]
    fn test_play_until_before_playhead() {
        let t = Transport::default();
        t.locate(500);
        t.play_until(100, false);
        assert_eq!(t.play_end(), 500);
        t.advance(1);
        assert_eq!(t.playhead(), 500);
        assert!(!t.is_playing());
    }

    #[test]
    fn test_snapshot_and_timecode() {
        let t = Transport::new(48000.0, 512);
        t.set_frame_rate(FrameRate::Fps25);
        t.locate(48000 * 61);
        let snap = t.snapshot();
        assert_eq!(snap.state, TransportState::Stopped);
        assert_eq!(snap.playhead, 48000 * 61);
        assert_eq!(t.timecode().to_string(), "00:01:01:00");
    }

    #[test]
    fn test_end_reached_under_superseded_mode_does_not_stop() {
        let t = Transport::default();
        t.play_until(100, false);
        let loaded = t.mode.load(Ordering::Acquire);

        // Control thread restarts unbounded play between the load and the stop.
        t.play();
        assert!(!t.stop_at_end(loaded));
        assert!(t.is_playing());
        assert_eq!(t.state(), TransportState::PlayingFree);
        assert_eq!(t.consume_stop_sample(), None);
    }

    #[test]
    fn test_end_reached_after_control_stop_does_not_fire_again() {
        let t = Transport::default();
        t.play_until(100, false);
        let loaded = t.mode.load(Ordering::Acquire);

        assert!(t.stop());
        assert!(!t.stop_at_end(loaded));
        assert_eq!(t.consume_stop_sample(), Some(0));
        assert_eq!(t.consume_stop_sample(), None);
    }

    #[test]
    fn test_advance_reports_end_stop() {
        let t = Transport::default();
        t.play_until(100, false);
        assert!(!t.advance(60));
        assert!(t.advance(60));
        assert!(!t.advance(60));
        assert_eq!(t.consume_stop_sample(), Some(100));
    }

    #[test]
    fn test_advance_at_end_races_control_stop() {
        for _ in 0..200 {
            let t = Arc::new(Transport::default());
            t.play_until(64, false);
            let barrier = Arc::new(Barrier::new(2));

            let control = {
                let t = t.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    t.stop()
                })
            };
            barrier.wait();
            let by_audio = t.advance(128);
            let by_control = control.join().unwrap();

            assert!(by_audio ^ by_control);
            assert!(!t.is_playing());
            assert!(t.consume_stop_sample().is_some());
            assert!(t.consume_stop_sample().is_none());
        }
    }

    #[test]
    fn test_concurrent_stop_fires_once() {
        for _ in 0..50 {
            let t = Arc::new(Transport::default());
            t.play();
            let wins = Arc::new(AtomicUsize::new(0));
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let t = t.clone();
                    let wins = wins.clone();
                    thread::spawn(move || {
                        if t.stop() {
                            wins.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            assert_eq!(wins.load(Ordering::SeqCst), 1);
            assert!(t.consume_stop_sample().is_some());
            assert!(t.consume_stop_sample().is_none());
        }
    }
}

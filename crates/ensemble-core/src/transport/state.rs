//! Packed transport mode word.

pub(crate) const PLAYING: u8 = 0b0001;
pub(crate) const BOUNDED: u8 = 0b0010;
pub(crate) const LOOPING: u8 = 0b0100;
pub(crate) const SELECTION: u8 = 0b1000;
pub(crate) const STOPPED: u8 = 0;

/// Sentinel meaning "no stop sample pending".
pub(crate) const NO_STOP: i64 = i64::MIN;

/// Coarse transport state, derived from the mode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    /// Rolling with no end point.
    PlayingFree,
    /// Rolling until the play end, then stopping.
    PlayingBounded,
    /// Rolling until the play end, then jumping back to the play start.
    PlayingLooping,
}

impl TransportState {
    pub(crate) fn from_mode(mode: u8) -> Self {
        if mode & PLAYING == 0 {
            TransportState::Stopped
        } else if mode & LOOPING != 0 {
            TransportState::PlayingLooping
        } else if mode & BOUNDED != 0 {
            TransportState::PlayingBounded
        } else {
            TransportState::PlayingFree
        }
    }

    pub fn is_playing(self) -> bool {
        self != TransportState::Stopped
    }
}

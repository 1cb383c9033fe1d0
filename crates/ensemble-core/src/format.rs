//! Channel layouts.

use serde::{Deserialize, Serialize};

/// Channel layout of a track, send or bus.
///
/// The channel count decides how many discrete per-channel connections are made
/// whenever two materialized nodes are wired together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChannelsFormat {
    Mono,
    #[default]
    Stereo,
    /// Left, centre, right.
    Lcr,
    Quad,
    Surround5_0,
    Surround5_1,
    Surround6_1,
    Surround7_1,
}

impl ChannelsFormat {
    /// Widest supported layout (7.1).
    pub const MAX_CHANNELS: usize = 8;

    pub const fn channel_count(self) -> usize {
        match self {
            ChannelsFormat::Mono => 1,
            ChannelsFormat::Stereo => 2,
            ChannelsFormat::Lcr => 3,
            ChannelsFormat::Quad => 4,
            ChannelsFormat::Surround5_0 => 5,
            ChannelsFormat::Surround5_1 => 6,
            ChannelsFormat::Surround6_1 => 7,
            ChannelsFormat::Surround7_1 => 8,
        }
    }

    /// Layout with exactly `channels` channels.
    pub fn from_channel_count(channels: usize) -> Option<Self> {
        Some(match channels {
            1 => ChannelsFormat::Mono,
            2 => ChannelsFormat::Stereo,
            3 => ChannelsFormat::Lcr,
            4 => ChannelsFormat::Quad,
            5 => ChannelsFormat::Surround5_0,
            6 => ChannelsFormat::Surround5_1,
            7 => ChannelsFormat::Surround6_1,
            8 => ChannelsFormat::Surround7_1,
            _ => return None,
        })
    }
}

use super::source::SampleSource;
use ensemble_core::{ChannelsFormat, TrackId};
use ensemble_plugin::PluginDescriptor;
use std::fmt;
use std::sync::Arc;

/// A non-exclusive signal path from a track to another (usually aux) track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSend {
    pub destination: TrackId,
    pub format: ChannelsFormat,
}

/// A region of a source placed on the timeline.
#[derive(Clone)]
pub struct Clip {
    /// Timeline sample where the clip begins.
    pub start: i64,
    pub length: i64,
    /// Source sample played at `start`.
    pub offset: i64,
    pub source: Arc<dyn SampleSource>,
}

impl Clip {
    /// The whole source, starting at `start`.
    pub fn new(start: i64, source: Arc<dyn SampleSource>) -> Self {
        Self {
            start,
            length: source.length(),
            offset: 0,
            source,
        }
    }

    pub fn with_offset(mut self, offset: i64, length: i64) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }

    pub fn end(&self) -> i64 {
        self.start + self.length
    }
}

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("start", &self.start)
            .field("length", &self.length)
            .field("offset", &self.offset)
            .field("channels", &self.source.channels())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum TrackKind {
    Audio { clips: Vec<Clip>, armed: bool },
    /// A bus: receives sends, plays no clips.
    Aux,
    /// Groups children. Produces no audio of its own.
    Folder { children: Vec<TrackId> },
    /// An audio track used for capture.
    Record {
        clips: Vec<Clip>,
        armed: bool,
        input_channel: usize,
    },
}

/// A track: the shared routing record plus its variant payload.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub format: ChannelsFormat,
    /// Main output. Resolved through the edit, so it may dangle.
    pub output: Option<TrackId>,
    pub sends: Vec<TrackSend>,
    pub plugins: Vec<PluginDescriptor>,
    pub kind: TrackKind,
}

impl Track {
    fn with_kind(id: TrackId, name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id,
            name: name.into(),
            format: ChannelsFormat::default(),
            output: None,
            sends: Vec::new(),
            plugins: Vec::new(),
            kind,
        }
    }

    pub fn audio(id: TrackId, name: impl Into<String>) -> Self {
        Self::with_kind(
            id,
            name,
            TrackKind::Audio {
                clips: Vec::new(),
                armed: false,
            },
        )
    }

    pub fn aux(id: TrackId, name: impl Into<String>) -> Self {
        Self::with_kind(id, name, TrackKind::Aux)
    }

    pub fn folder(id: TrackId, name: impl Into<String>) -> Self {
        Self::with_kind(
            id,
            name,
            TrackKind::Folder {
                children: Vec::new(),
            },
        )
    }

    pub fn record(id: TrackId, name: impl Into<String>, input_channel: usize) -> Self {
        Self::with_kind(
            id,
            name,
            TrackKind::Record {
                clips: Vec::new(),
                armed: false,
                input_channel,
            },
        )
    }

    pub fn with_format(mut self, format: ChannelsFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: TrackId) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_plugin(mut self, plugin: PluginDescriptor) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Add a clip. Ignored for tracks that cannot hold clips.
    pub fn with_clip(mut self, clip: Clip) -> Self {
        if let TrackKind::Audio { clips, .. } | TrackKind::Record { clips, .. } = &mut self.kind {
            clips.push(clip);
        }
        self
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, TrackKind::Folder { .. })
    }

    pub fn is_aux(&self) -> bool {
        matches!(self.kind, TrackKind::Aux)
    }

    pub fn clips(&self) -> &[Clip] {
        match &self.kind {
            TrackKind::Audio { clips, .. } | TrackKind::Record { clips, .. } => clips,
            TrackKind::Aux | TrackKind::Folder { .. } => &[],
        }
    }

    pub fn is_armed(&self) -> bool {
        match self.kind {
            TrackKind::Audio { armed, .. } | TrackKind::Record { armed, .. } => armed,
            TrackKind::Aux | TrackKind::Folder { .. } => false,
        }
    }

    pub fn set_armed(&mut self, value: bool) {
        if let TrackKind::Audio { armed, .. } | TrackKind::Record { armed, .. } = &mut self.kind {
            *armed = value;
        }
    }

    pub fn children(&self) -> &[TrackId] {
        match &self.kind {
            TrackKind::Folder { children } => children,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemorySource;

    #[test]
    fn test_clips_only_on_audio_kinds() {
        let source: Arc<dyn SampleSource> = Arc::new(MemorySource::constant(1, 100, 0.5));
        let audio = Track::audio(TrackId::new(1), "a").with_clip(Clip::new(0, source.clone()));
        let aux = Track::aux(TrackId::new(2), "bus").with_clip(Clip::new(0, source.clone()));
        let rec = Track::record(TrackId::new(3), "rec", 0).with_clip(Clip::new(50, source));

        assert_eq!(audio.clips().len(), 1);
        assert!(aux.clips().is_empty());
        assert_eq!(rec.clips()[0].end(), 150);
    }

    #[test]
    fn test_arm_state() {
        let mut track = Track::record(TrackId::new(1), "rec", 2);
        assert!(!track.is_armed());
        track.set_armed(true);
        assert!(track.is_armed());

        let mut folder = Track::folder(TrackId::new(2), "group");
        folder.set_armed(true);
        assert!(!folder.is_armed());
        assert!(folder.is_folder());
    }
}

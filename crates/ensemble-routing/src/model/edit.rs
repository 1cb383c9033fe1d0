use super::track::{Track, TrackKind, TrackSend};
use crate::error::{Result, RoutingError};
use ensemble_core::TrackId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SceneId(pub u32);

/// A subset of the edit played as one graph.
///
/// An empty track list means every reachable track of the edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    pub tracks: Vec<TrackId>,
    pub range: Option<(i64, i64)>,
}

/// The session: every track, the root order, the master and the scenes.
#[derive(Debug, Default)]
pub struct Edit {
    tracks: Vec<Track>,
    index: HashMap<TrackId, usize>,
    roots: Vec<TrackId>,
    master: Option<TrackId>,
    scenes: Vec<Scene>,
}

impl Edit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level track.
    pub fn add_track(&mut self, track: Track) -> Result<TrackId> {
        let id = self.insert(track)?;
        self.roots.push(id);
        Ok(id)
    }

    /// Add `track` inside the folder `folder`.
    pub fn add_child(&mut self, folder: TrackId, track: Track) -> Result<TrackId> {
        match self.track(folder).map(|t| t.is_folder()) {
            None => return Err(RoutingError::UnknownTrack(folder)),
            Some(false) => return Err(RoutingError::NotAFolder(folder)),
            Some(true) => {}
        }
        let id = self.insert(track)?;
        if let Some(TrackKind::Folder { children }) = self.track_mut(folder).map(|t| &mut t.kind) {
            children.push(id);
        }
        Ok(id)
    }

    fn insert(&mut self, track: Track) -> Result<TrackId> {
        let id = track.id;
        if self.index.contains_key(&id) {
            return Err(RoutingError::DuplicateTrack(id));
        }
        self.index.insert(id, self.tracks.len());
        self.tracks.push(track);
        Ok(id)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.index.get(&id).map(|&i| &self.tracks[i])
    }

    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        let i = *self.index.get(&id)?;
        self.tracks.get_mut(i)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Point `track`'s main output at `output`. The output is not validated:
    /// dangling outputs are reported by the graph builder.
    pub fn set_output(&mut self, track: TrackId, output: Option<TrackId>) -> Result<()> {
        let t = self
            .track_mut(track)
            .ok_or(RoutingError::UnknownTrack(track))?;
        t.output = output;
        Ok(())
    }

    /// Add a send from `track` to `destination`, in the destination's format.
    pub fn add_send(&mut self, track: TrackId, destination: TrackId) -> Result<()> {
        let source_format = self
            .track(track)
            .ok_or(RoutingError::UnknownTrack(track))?
            .format;
        let format = self
            .track(destination)
            .map_or(source_format, |d| d.format);

        if let Some(t) = self.track_mut(track) {
            t.sends.push(TrackSend {
                destination,
                format,
            });
        }
        Ok(())
    }

    pub fn set_master(&mut self, track: TrackId) -> Result<()> {
        if !self.index.contains_key(&track) {
            return Err(RoutingError::UnknownTrack(track));
        }
        self.master = Some(track);
        Ok(())
    }

    pub fn master(&self) -> Option<TrackId> {
        self.master
    }

    pub fn roots(&self) -> &[TrackId] {
        &self.roots
    }

    /// Roots and everything inside folders, depth first, each id once.
    pub fn reachable_tracks(&self) -> Vec<TrackId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<TrackId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(track) = self.track(id) else {
                continue;
            };
            order.push(id);
            stack.extend(track.children().iter().rev().copied());
        }
        order
    }

    pub fn add_scene(
        &mut self,
        name: impl Into<String>,
        tracks: Vec<TrackId>,
        range: Option<(i64, i64)>,
    ) -> SceneId {
        let id = SceneId(self.scenes.len() as u32);
        self.scenes.push(Scene {
            id,
            name: name.into(),
            tracks,
            range,
        });
        id
    }

    pub fn scene(&self, id: SceneId) -> Result<&Scene> {
        self.scenes
            .iter()
            .find(|s| s.id == id)
            .ok_or(RoutingError::UnknownScene(id))
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }
}

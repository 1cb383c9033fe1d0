//! Keyed parameter cells shared between the control and audio threads.
//!
//! Parameters are addressed by `(TrackId, key)`. The audio thread holds the
//! `Arc<AtomicFloat>` returned from [`ParameterStore::cell`] and reads it
//! lock-free; the control thread writes through the store by key.

use crate::id::TrackId;
use crate::lockfree::AtomicFloat;
use dashmap::DashMap;
use std::sync::Arc;

/// Track volume as a linear gain.
pub const VOLUME: &str = "volume";

/// Track mute, `0.0` or `1.0`.
pub const MUTE: &str = "mute";

#[derive(Debug, Default)]
pub struct ParameterStore {
    cells: DashMap<(TrackId, String), Arc<AtomicFloat>>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cell for `(track, key)`, creating it with `default` if absent.
    pub fn cell(&self, track: TrackId, key: &str, default: f32) -> Arc<AtomicFloat> {
        self.cells
            .entry((track, key.to_string()))
            .or_insert_with(|| Arc::new(AtomicFloat::new(default)))
            .clone()
    }

    /// Get the cell for `(track, key)`, inserting `cell` if absent.
    ///
    /// Unlike [`bind`](Self::bind), an existing cell always wins, so every
    /// holder of the key keeps reading the same value.
    pub fn share(&self, track: TrackId, key: &str, cell: Arc<AtomicFloat>) -> Arc<AtomicFloat> {
        self.cells
            .entry((track, key.to_string()))
            .or_insert(cell)
            .clone()
    }

    /// Bind an existing cell (usually one exposed by a processor) to `(track, key)`.
    ///
    /// Replaces any previous binding; holders of the old cell stop seeing writes.
    pub fn bind(&self, track: TrackId, key: &str, cell: Arc<AtomicFloat>) {
        self.cells.insert((track, key.to_string()), cell);
    }

    pub fn get(&self, track: TrackId, key: &str) -> Option<f32> {
        self.cells
            .get(&(track, key.to_string()))
            .map(|cell| cell.get())
    }

    /// Write a bound parameter. Returns `false` if nothing is bound to the key.
    pub fn set(&self, track: TrackId, key: &str, value: f32) -> bool {
        match self.cells.get(&(track, key.to_string())) {
            Some(cell) => {
                cell.set(value);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, track: TrackId, key: &str) -> Option<Arc<AtomicFloat>> {
        self.cells
            .remove(&(track, key.to_string()))
            .map(|(_, cell)| cell)
    }

    /// Drop every binding that belongs to `track`.
    pub fn remove_track(&self, track: TrackId) {
        self.cells.retain(|(owner, _), _| *owner != track);
    }

    /// Keys bound for `track`, sorted.
    pub fn keys(&self, track: TrackId) -> Vec<String> {
        let mut keys: Vec<String> = self
            .cells
            .iter()
            .filter(|entry| entry.key().0 == track)
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&self) {
        self.cells.clear();
    }
}

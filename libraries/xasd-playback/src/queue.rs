//! Play queue
//!
//! Ordered, insertion-order list of tracks. A track identity appears at most
//! once; the queue itself knows nothing about which entry is playing.

use crate::types::{Track, TrackId};

/// Ordered set of tracks keyed by [`TrackId`]
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self { tracks: Vec::new() }
    }

    /// Append a track unless its identity is already queued
    ///
    /// Returns false (and drops `track`) on a duplicate.
    pub fn push(&mut self, track: Track) -> bool {
        if self.contains(track.id) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// Remove the entry with the given identity
    ///
    /// Returns the index it occupied and the track.
    pub fn remove(&mut self, id: TrackId) -> Option<(usize, Track)> {
        let index = self.position(id)?;
        Some((index, self.tracks.remove(index)))
    }

    /// Linear scan for a track identity
    pub fn position(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Check whether a track identity is queued
    pub fn contains(&self, id: TrackId) -> bool {
        self.position(id).is_some()
    }

    /// Get track at index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    /// All tracks in queue order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Clear entire queue, returning the removed tracks
    pub fn clear(&mut self) -> Vec<Track> {
        std::mem::take(&mut self.tracks)
    }

    /// Total number of tracks in queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

//! Playback Events
//!
//! Event-based communication for UI synchronization. The controller queues
//! events as state changes and the UI drains them:
//! - State changes (play/pause/stop/loading)
//! - Track changes
//! - Position updates (every progress tick)
//! - Volume and queue changes
//! - Errors

use crate::types::{PlaybackState, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// The current track changed (select, skip or auto-advance)
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Track length became known
    DurationKnown {
        track_id: TrackId,
        duration_ms: u64,
    },

    /// Position update (every progress tick)
    PositionUpdate {
        /// Current playback position
        position_ms: u64,
        /// Total track duration (0 while unknown)
        duration_ms: u64,
        /// Elapsed share, 0-100
        percentage: f64,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0-100)
        level: u8,
    },

    /// Queue changed (tracks added/removed)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Error occurred during playback
    Error {
        /// Error message
        message: String,
    },
}

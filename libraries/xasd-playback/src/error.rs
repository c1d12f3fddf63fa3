//! Error types for playback management

use crate::types::TrackId;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently selected
    #[error("No track loaded")]
    NoTrackLoaded,

    /// The track is not in the queue
    #[error("Track {0} is not queued")]
    TrackNotQueued(TrackId),

    /// The engine could not load or start the track's audio
    #[error("Failed to load track {track_id}: {reason}")]
    Load { track_id: TrackId, reason: String },

    /// The track's source locator could not be turned into a URL
    #[error("Invalid audio source: {0}")]
    InvalidSource(String),

    /// Any other engine-side failure
    #[error("Audio engine error: {0}")]
    Engine(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

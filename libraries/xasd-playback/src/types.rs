//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::{PlaybackError, Result};

/// Stable track identity
///
/// Queue membership and removal compare this, never object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TrackId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Track information for queue management
///
/// Immutable apart from `audio_url`, which is filled in once the file path has
/// been resolved against the media base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier from the backend
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Path of the audio file relative to the media store
    pub file_path: String,

    /// Fully-qualified playable URL (resolved lazily)
    #[serde(default)]
    pub audio_url: Option<String>,
}

impl Track {
    /// Create a track with an unresolved source locator
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            file_path: file_path.into(),
            audio_url: None,
        }
    }

    /// Resolve `file_path` against `base` unless already resolved
    ///
    /// Returns the playable URL.
    pub fn resolve_source(&mut self, base: &Url) -> Result<&str> {
        if self.audio_url.is_none() {
            let relative = self.file_path.trim_start_matches('/');
            if relative.is_empty() {
                return Err(PlaybackError::InvalidSource(format!(
                    "track {} has no file path",
                    self.id
                )));
            }
            let url = base
                .join(relative)
                .map_err(|e| PlaybackError::InvalidSource(format!("{}: {}", self.file_path, e)))?;
            self.audio_url = Some(url.into());
        }

        Ok(self.audio_url.as_deref().unwrap_or_default())
    }
}

/// Playback state as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No track selected, or playback stopped
    Stopped,

    /// Start requested, decoder still loading
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0-100, default: 50)
    pub volume: u8,

    /// Base URL that track file paths are resolved against
    pub media_base_url: String,

    /// Maximum number of cached decoder handles (default: 16)
    pub handle_cache_capacity: usize,

    /// Progress refresh interval in milliseconds (default: 1000)
    pub progress_interval_ms: u64,

    /// Ask the engine to stream instead of fully buffering (default: true)
    pub streaming: bool,
}

impl PlaybackConfig {
    /// Progress refresh interval
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }

    /// Parsed media base URL, always ending in `/` so joins append
    pub fn media_base(&self) -> Result<Url> {
        let mut base = self.media_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .map_err(|e| PlaybackError::InvalidSource(format!("{}: {}", self.media_base_url, e)))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 50,
            media_base_url: "https://f000.backblazeb2.com/file/xasdmedia/".to_string(),
            handle_cache_capacity: 16,
            progress_interval_ms: 1000,
            streaming: true,
        }
    }
}

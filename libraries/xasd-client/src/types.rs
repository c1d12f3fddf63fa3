//! Types for xasd backend requests and responses.

use serde::{Deserialize, Serialize};
use xasd_playback::{Track, TrackId};

/// Configuration for connecting to an xasd backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend (e.g., "https://api.xasd.example")
    pub url: String,
    /// Current access token (if authenticated)
    pub access_token: Option<String>,
}

impl ClientConfig {
    /// Create a new config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
        }
    }

    /// Create a config with an existing token.
    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: Some(access_token.into()),
        }
    }
}

// =============================================================================
// Authentication Types
// =============================================================================

/// Response from the token endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Error body returned by the backend (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub detail: String,
}

/// Current user info.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserInfo {
    pub user_id: u64,
    pub name: String,
    pub email_address: String,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Stored audio file of a track.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerFile {
    #[serde(default)]
    pub file_id: Option<u64>,
    /// Path relative to the media store
    pub filepath: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerArtist {
    #[serde(default)]
    pub artist_id: Option<u64>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerAlbum {
    #[serde(default)]
    pub album_id: Option<u64>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerGenre {
    #[serde(default)]
    pub genre_id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A track as returned by the backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerTrack {
    pub track_id: u64,
    pub title: String,
    #[serde(default)]
    pub tracknumber: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    pub file: ServerFile,
    pub artist: ServerArtist,
    #[serde(default)]
    pub album: Option<ServerAlbum>,
    #[serde(default)]
    pub genre: Option<ServerGenre>,
}

impl ServerTrack {
    /// Convert to a playable queue track (source not yet resolved).
    pub fn into_track(self) -> Track {
        Track::new(
            TrackId(self.track_id),
            self.title,
            self.artist.name,
            self.file.filepath,
        )
    }
}

/// Response from `/search/any/{query}`.
///
/// The backend may return `null` entries; they are kept here and dropped by
/// the client.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub tracks: Vec<Option<ServerTrack>>,
    #[serde(default)]
    pub albums: Vec<Option<ServerAlbum>>,
    #[serde(default)]
    pub artists: Vec<Option<ServerArtist>>,
}

//! Search query, filter and results
//!
//! Independent of playback: results are plain [`Track`]s the UI can hand to
//! the playback controller.

use crate::client::XasdClient;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use xasd_playback::Track;

/// Which search endpoint to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFilter {
    /// Tracks, albums and artists
    #[default]
    All,
    /// Track titles only
    Tracks,
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchFilter::All => write!(f, "all"),
            SearchFilter::Tracks => write!(f, "tracks"),
        }
    }
}

impl FromStr for SearchFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" | "any" => Ok(SearchFilter::All),
            "tracks" | "track" => Ok(SearchFilter::Tracks),
            other => Err(format!("unknown search filter: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Track>,
    pub filter: SearchFilter,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_filter(&mut self, filter: SearchFilter) {
        self.filter = filter;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
    }

    /// Run the current query and replace the results
    ///
    /// On error the previous results are kept.
    pub async fn run(&mut self, client: &XasdClient) -> Result<&[Track]> {
        let tracks = match self.filter {
            SearchFilter::All => client.search_any(&self.query).await?,
            SearchFilter::Tracks => client.search_tracks(&self.query).await?,
        };

        self.results = tracks.into_iter().map(|t| t.into_track()).collect();
        Ok(&self.results)
    }
}

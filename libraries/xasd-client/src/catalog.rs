//! Search endpoints of the xasd backend.

use crate::auth::{send_error, server_error};
use crate::error::{ClientError, Result};
use crate::types::{SearchListResponse, ServerTrack};
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Catalog search client.
pub struct CatalogClient<'a> {
    http: &'a Client,
    base_url: &'a str,
}

impl<'a> CatalogClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str) -> Self {
        Self { http, base_url }
    }

    /// Search tracks, albums and artists; returns the tracks.
    ///
    /// `null` entries in the response are dropped.
    pub async fn search_any(&self, query: &str) -> Result<Vec<ServerTrack>> {
        let url = self.search_url("any", query)?;
        debug!(url = %url, "Searching catalog");

        let response = self.http.get(url).send().await.map_err(send_error)?;
        let status = response.status();

        if status.is_success() {
            let results: SearchListResponse = response.json().await.map_err(|e| {
                ClientError::ParseError(format!("Failed to parse search response: {}", e))
            })?;

            let tracks: Vec<ServerTrack> = results.tracks.into_iter().flatten().collect();
            debug!(query = %query, tracks = tracks.len(), "Search complete");
            Ok(tracks)
        } else {
            Err(server_error(response).await)
        }
    }

    /// Search tracks by title.
    pub async fn search_tracks(&self, query: &str) -> Result<Vec<ServerTrack>> {
        let url = self.search_url("track", query)?;
        debug!(url = %url, "Searching tracks");

        let response = self.http.get(url).send().await.map_err(send_error)?;
        let status = response.status();

        if status.is_success() {
            let tracks: Vec<ServerTrack> = response.json().await.map_err(|e| {
                ClientError::ParseError(format!("Failed to parse track search response: {}", e))
            })?;

            debug!(query = %query, tracks = tracks.len(), "Track search complete");
            Ok(tracks)
        } else {
            Err(server_error(response).await)
        }
    }

    /// `{base}/search/{kind}/{query}` with the query as one encoded segment
    fn search_url(&self, kind: &str, query: &str) -> Result<Url> {
        let mut url =
            Url::parse(self.base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["search", kind, query]);
        Ok(url)
    }
}

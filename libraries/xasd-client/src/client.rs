//! Main xasd backend client.

use crate::auth::AuthClient;
use crate::catalog::CatalogClient;
use crate::error::{ClientError, Result};
use crate::types::{ClientConfig, ServerTrack, TokenResponse, UserInfo};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Client for the xasd backend.
///
/// Holds the base URL and the access token obtained at login; the token is
/// sent as a bearer credential on authenticated calls.
///
/// # Example
///
/// ```ignore
/// use xasd_client::{ClientConfig, XasdClient};
///
/// let client = XasdClient::new(ClientConfig::new("https://api.xasd.example"))?;
/// client.login("user", "password").await?;
///
/// let me = client.current_user().await?;
/// println!("Logged in as {}", me.name);
///
/// for track in client.search_any("Earth").await? {
///     println!("{} - {}", track.artist.name, track.title);
/// }
/// ```
pub struct XasdClient {
    http: Client,
    config: Arc<RwLock<ClientConfig>>,
}

impl XasdClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let normalized_config = ClientConfig {
            url,
            access_token: config.access_token,
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("xasd/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self {
            http,
            config: Arc::new(RwLock::new(normalized_config)),
        })
    }

    /// Get the backend URL.
    pub async fn url(&self) -> String {
        self.config.read().await.url.clone()
    }

    /// Check if the client has an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.config.read().await.access_token.is_some()
    }

    /// Get the current access token.
    pub async fn token(&self) -> Option<String> {
        self.config.read().await.access_token.clone()
    }

    /// Set the token directly (e.g., from stored credentials).
    pub async fn set_token(&self, access_token: impl Into<String>) {
        self.config.write().await.access_token = Some(access_token.into());
    }

    /// Clear the stored token (logout).
    pub async fn logout(&self) {
        self.config.write().await.access_token = None;
        info!("Logged out");
    }

    /// Login with username and password.
    ///
    /// On success, the access token is stored for subsequent requests.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let url = self.url().await;
        let response = AuthClient::new(&self.http, &url)
            .login(username, password)
            .await?;

        self.config.write().await.access_token = Some(response.access_token.clone());
        Ok(response)
    }

    /// Fetch the user the stored token belongs to.
    ///
    /// Fails with `AuthRequired` without a token or when the backend
    /// rejects it.
    pub async fn current_user(&self) -> Result<UserInfo> {
        let config = self.config.read().await;
        let access_token = config
            .access_token
            .clone()
            .ok_or(ClientError::AuthRequired)?;
        let url = config.url.clone();
        drop(config);

        AuthClient::new(&self.http, &url)
            .current_user(&access_token)
            .await
    }

    /// Search the whole catalog; returns matching tracks.
    ///
    /// A blank query returns nothing without contacting the backend.
    pub async fn search_any(&self, query: &str) -> Result<Vec<ServerTrack>> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Skipping blank search");
            return Ok(Vec::new());
        }

        let url = self.url().await;
        CatalogClient::new(&self.http, &url).search_any(query).await
    }

    /// Search tracks by title.
    pub async fn search_tracks(&self, query: &str) -> Result<Vec<ServerTrack>> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Skipping blank search");
            return Ok(Vec::new());
        }

        let url = self.url().await;
        CatalogClient::new(&self.http, &url)
            .search_tracks(query)
            .await
    }
}

//! Authentication endpoints of the xasd backend.

use crate::error::{ClientError, Result};
use crate::types::{ErrorDetail, TokenResponse, UserInfo};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

/// Authentication client for the xasd backend.
pub struct AuthClient<'a> {
    http: &'a Client,
    base_url: &'a str,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str) -> Self {
        Self { http, base_url }
    }

    /// Exchange username and password for an access token.
    ///
    /// The backend expects an OAuth2 password form and rejects bad
    /// credentials with 400 or 401.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let url = format!("{}/token", self.base_url);
        debug!(url = %url, username = %username, "Attempting login");

        let form = [
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
        ];

        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();

        if status.is_success() {
            let token: TokenResponse = response.json().await.map_err(|e| {
                ClientError::ParseError(format!("Failed to parse token response: {}", e))
            })?;

            info!(username = %username, "Login successful");
            Ok(token)
        } else if status.as_u16() == 400 || status.as_u16() == 401 {
            let detail = error_detail(response).await;
            warn!(status = %status, error = %detail, "Login failed: invalid credentials");
            Err(ClientError::AuthFailed(detail))
        } else {
            Err(server_error(response).await)
        }
    }

    /// Get the user the access token belongs to.
    pub async fn current_user(&self, access_token: &str) -> Result<UserInfo> {
        let url = format!("{}/user/me", self.base_url);
        debug!(url = %url, "Getting current user info");

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();

        if status.is_success() {
            let user: UserInfo = response.json().await.map_err(|e| {
                ClientError::ParseError(format!("Failed to parse user info: {}", e))
            })?;

            Ok(user)
        } else if status.as_u16() == 401 {
            Err(ClientError::AuthRequired)
        } else {
            Err(server_error(response).await)
        }
    }
}

/// Classify a transport failure.
pub(crate) fn send_error(e: reqwest::Error) -> ClientError {
    if e.is_connect() || e.is_timeout() {
        ClientError::ServerUnreachable(e.to_string())
    } else {
        ClientError::Request(e)
    }
}

/// Build a `ServerError` from a non-success response.
pub(crate) async fn server_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    ClientError::ServerError {
        status,
        message: error_detail(response).await,
    }
}

/// The backend's `detail` message, or the raw body.
async fn error_detail(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorDetail>(&text)
        .map(|body| body.detail)
        .unwrap_or(text)
}

//! Login session and token persistence
//!
//! The access token survives restarts through a [`TokenStore`]. On startup
//! the session checks the stored token against `/user/me`; a token the
//! backend no longer accepts is forgotten rather than reported as an error.

use crate::client::XasdClient;
use crate::error::{ClientError, Result};
use crate::types::UserInfo;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Where the access token is kept between runs
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Token store that forgets everything on exit
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|e| ClientError::Storage(e.to_string()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
}

/// Token store backed by a small JSON file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredToken = serde_json::from_str(&contents)
            .map_err(|e| ClientError::Storage(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(stored.access_token))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&StoredToken {
            access_token: token.to_string(),
        })
        .map_err(|e| ClientError::Storage(e.to_string()))?;
        fs::write(&self.path, contents)?;

        debug!(path = %self.path.display(), "Token saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A client plus its persisted login
pub struct Session<S: TokenStore> {
    client: XasdClient,
    store: S,
    user: Option<UserInfo>,
}

impl<S: TokenStore> Session<S> {
    pub fn new(client: XasdClient, store: S) -> Self {
        Self {
            client,
            store,
            user: None,
        }
    }

    /// Re-establish the login from the stored token
    ///
    /// Returns `Ok(None)` when there is no token or the backend refuses it;
    /// a refused token is removed from the store. Transport failures are
    /// returned as errors and leave the store alone.
    pub async fn restore(&mut self) -> Result<Option<UserInfo>> {
        let Some(token) = self.store.load()? else {
            debug!("No stored token");
            return Ok(None);
        };

        self.client.set_token(token).await;
        match self.client.current_user().await {
            Ok(user) => {
                info!(user = %user.name, "Session restored");
                self.user = Some(user.clone());
                Ok(Some(user))
            }
            Err(e @ (ClientError::AuthRequired | ClientError::ServerError { .. })) => {
                warn!(error = %e, "Stored token rejected, clearing session");
                self.forget().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Log in, fetch the user and persist the token
    ///
    /// The token is only stored once the backend has returned the user; on
    /// failure the client is left without a token.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<UserInfo> {
        let token = self.client.login(username, password).await?;

        let user = match self.client.current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Login succeeded but user lookup failed");
                self.client.logout().await;
                self.user = None;
                return Err(e);
            }
        };

        self.store.save(&token.access_token)?;
        info!(user = %user.name, "Logged in");
        self.user = Some(user.clone());
        Ok(user)
    }

    /// Drop the login locally; the backend keeps no session state
    pub async fn logout(&mut self) -> Result<()> {
        self.forget().await
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn client(&self) -> &XasdClient {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn forget(&mut self) -> Result<()> {
        self.client.logout().await;
        self.user = None;
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_creates_parent_and_clears() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save("secret").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("secret"));

        store.clear().unwrap();
        assert!(!store.path().exists());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(path);
        assert!(matches!(store.load(), Err(ClientError::Storage(_))));
    }
}

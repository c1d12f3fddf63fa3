//! xasd - Backend Client
//!
//! HTTP client for the xasd backend.
//!
//! # Features
//!
//! - **Authentication**: OAuth2 password login, current user lookup
//! - **Session**: token persistence and restore on startup
//! - **Search**: catalog-wide and track-title search
//!
//! # Example
//!
//! ```ignore
//! use xasd_client::{ClientConfig, FileTokenStore, SearchState, Session, XasdClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = XasdClient::new(ClientConfig::new("https://api.xasd.example"))?;
//!     let mut session = Session::new(client, FileTokenStore::new("token.json"));
//!
//!     if session.restore().await?.is_none() {
//!         session.login("user", "password").await?;
//!     }
//!
//!     let mut search = SearchState::new();
//!     search.set_query("Earth");
//!     for track in search.run(session.client()).await? {
//!         println!("{} - {}", track.artist, track.title);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod catalog;
mod client;
mod error;
mod search;
mod session;
mod types;

// Re-export main types
pub use client::XasdClient;
pub use error::{ClientError, Result};
pub use search::{SearchFilter, SearchState};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use types::{
    ClientConfig, SearchListResponse, ServerAlbum, ServerArtist, ServerFile, ServerGenre,
    ServerTrack, TokenResponse, UserInfo,
};

// Re-export sub-clients for direct use if needed
pub use auth::AuthClient;
pub use catalog::CatalogClient;

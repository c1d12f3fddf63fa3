//! Tests for the xasd client library.
//!
//! These tests use mock servers to verify client behavior without
//! requiring a real backend.

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xasd_client::{
    ClientConfig, ClientError, FileTokenStore, MemoryTokenStore, SearchFilter, SearchState,
    Session, TokenStore, XasdClient,
};
use xasd_playback::TrackId;

fn track_json(id: u64, title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "tracknumber": "1",
        "date": "2023",
        "track_id": id,
        "file": {"filepath": format!("artist/album/{}.mp3", id), "file_id": id},
        "artist": {"name": "artist_name", "artist_id": 1},
        "genre": {"name": "genre_name", "genre_id": 1}
    })
}

fn user_json() -> serde_json::Value {
    json!({
        "name": "username",
        "email_address": "user@example.com",
        "user_id": 1
    })
}

async fn mount_user_me(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/user/me"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(server)
        .await;
}

// =============================================================================
// Authentication Tests
// =============================================================================

mod authentication {
    use super::*;

    #[tokio::test]
    async fn test_successful_login_stores_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("username=username"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt_token",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();

        let token = client.login("username", "password").await.unwrap();
        assert_eq!(token.access_token, "jwt_token");
        assert_eq!(token.token_type, "bearer");
        assert!(client.is_authenticated().await);
        assert_eq!(client.token().await.as_deref(), Some("jwt_token"));
    }

    #[tokio::test]
    async fn test_login_invalid_credentials() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Incorrect username or password"
            })))
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();

        match client.login("username", "wrong").await.unwrap_err() {
            ClientError::AuthFailed(msg) => assert_eq!(msg, "Incorrect username or password"),
            e => panic!("Expected AuthFailed, got: {:?}", e),
        }
        assert!(!client.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_login_bad_request_is_auth_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad form"))
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();

        match client.login("username", "").await.unwrap_err() {
            ClientError::AuthFailed(msg) => assert_eq!(msg, "bad form"),
            e => panic!("Expected AuthFailed, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_current_user_with_token() {
        let mock_server = MockServer::start().await;
        mount_user_me(&mock_server, "valid").await;

        let config = ClientConfig::with_token(mock_server.uri(), "valid");
        let client = XasdClient::new(config).unwrap();

        let user = client.current_user().await.unwrap();
        assert_eq!(user.user_id, 1);
        assert_eq!(user.name, "username");
        assert_eq!(user.email_address, "user@example.com");
    }

    #[tokio::test]
    async fn test_current_user_rejected_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Could not validate credentials"
            })))
            .mount(&mock_server)
            .await;

        let config = ClientConfig::with_token(mock_server.uri(), "expired");
        let client = XasdClient::new(config).unwrap();

        assert!(matches!(
            client.current_user().await,
            Err(ClientError::AuthRequired)
        ));
    }

    #[tokio::test]
    async fn test_current_user_without_token_skips_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        assert!(matches!(
            client.current_user().await,
            Err(ClientError::AuthRequired)
        ));
    }
}

// =============================================================================
// Search Tests
// =============================================================================

mod search {
    use super::*;

    #[tokio::test]
    async fn test_search_any_drops_null_entries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/any/earth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": [track_json(1, "Earth Song"), null, track_json(2, "Earth Wind")],
                "albums": [],
                "artists": [null]
            })))
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();

        let tracks = client.search_any("earth").await.unwrap();
        let titles: Vec<&str> = tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Earth Song", "Earth Wind"]);
    }

    #[tokio::test]
    async fn test_search_tracks_encodes_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/track/daft%20punk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([track_json(
                7,
                "One More Time"
            )])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();

        let tracks = client.search_tracks("  daft punk ").await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].track_id, 7);
    }

    #[tokio::test]
    async fn test_blank_query_skips_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        assert!(client.search_any("   ").await.unwrap().is_empty());
        assert!(client.search_tracks("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/any/earth"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();

        match client.search_any("earth").await.unwrap_err() {
            ClientError::ServerError { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("Internal Server Error"));
            }
            e => panic!("Expected ServerError, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_search_invalid_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/track/earth"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        assert!(matches!(
            client.search_tracks("earth").await,
            Err(ClientError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_search_state_follows_filter() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/any/earth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": [track_json(1, "Earth Song"), track_json(2, "Earth Wind")],
                "albums": [],
                "artists": []
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/track/earth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([track_json(
                3,
                "Earth Only"
            )])))
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        let mut state = SearchState::new();
        state.set_query("earth");

        let results = state.run(&client).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, TrackId(1));
        assert_eq!(results[0].file_path, "artist/album/1.mp3");
        assert_eq!(results[0].artist, "artist_name");

        state.set_filter(SearchFilter::Tracks);
        state.run(&client).await.unwrap();
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.results[0].title, "Earth Only");
    }

    #[tokio::test]
    async fn test_search_state_keeps_results_on_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/any/earth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": [track_json(1, "Earth Song")]
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/any/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        let mut state = SearchState::new();
        state.set_query("earth");
        state.run(&client).await.unwrap();

        state.set_query("broken");
        assert!(state.run(&client).await.is_err());
        assert_eq!(state.results.len(), 1);
    }
}

// =============================================================================
// Session Tests
// =============================================================================

mod session {
    use super::*;

    #[tokio::test]
    async fn test_login_persists_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt_token",
                "token_type": "bearer"
            })))
            .mount(&mock_server)
            .await;
        mount_user_me(&mock_server, "jwt_token").await;

        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        let mut session = Session::new(client, store);

        let user = session.login("username", "password").await.unwrap();
        assert_eq!(user.name, "username");
        assert!(session.is_authenticated());
        assert_eq!(session.store().load().unwrap().as_deref(), Some("jwt_token"));

        session.logout().await.unwrap();
        assert!(!session.is_authenticated());
        assert!(!session.client().is_authenticated().await);
        assert_eq!(session.store().load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_keeps_nothing_when_user_lookup_fails() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt_token",
                "token_type": "bearer"
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        let mut session = Session::new(client, store);

        let result = session.login("username", "password").await;
        assert!(matches!(result, Err(ClientError::ServerError { .. })));
        assert!(!session.is_authenticated());
        assert!(!session.client().is_authenticated().await);
        assert_eq!(session.store().load().unwrap(), None);
        assert!(!session.store().path().exists());
    }

    #[tokio::test]
    async fn test_restore_with_valid_token() {
        let mock_server = MockServer::start().await;
        mount_user_me(&mock_server, "stored").await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        let mut session = Session::new(client, MemoryTokenStore::with_token("stored"));

        let user = session.restore().await.unwrap().unwrap();
        assert_eq!(user.user_id, 1);
        assert_eq!(session.user(), Some(&user));
        assert!(session.client().is_authenticated().await);
    }

    #[tokio::test]
    async fn test_restore_clears_rejected_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        store.save("expired").unwrap();

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        let mut session = Session::new(client, store);

        assert_eq!(session.restore().await.unwrap(), None);
        assert!(!session.is_authenticated());
        assert!(!session.client().is_authenticated().await);
        assert!(!session.store().path().exists());
    }

    #[tokio::test]
    async fn test_restore_clears_token_on_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        let mut session = Session::new(client, MemoryTokenStore::with_token("stored"));

        assert_eq!(session.restore().await.unwrap(), None);
        assert_eq!(session.store().load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_without_token_skips_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = XasdClient::new(ClientConfig::new(mock_server.uri())).unwrap();
        let mut session = Session::new(client, MemoryTokenStore::new());

        assert_eq!(session.restore().await.unwrap(), None);
    }
}

//! Application configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use xasd_playback::PlaybackConfig;

/// File picked up from the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "xasd.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_token_path() -> PathBuf {
    PathBuf::from(".xasd").join("token.json")
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `xasd.toml` is read if
    /// present. Variables such as `XASD_SERVER__URL` or
    /// `XASD_PLAYBACK__VOLUME` override file values.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Same as [`load`](Self::load), reading overrides from `env` instead of
    /// the process environment when given
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with XASD_)
        settings = settings.add_source(
            config::Environment::with_prefix("XASD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        settings.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn defaults_without_sources() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.toml");
        fs::write(&path, "").unwrap();

        let config = AppConfig::load_with_env(Some(&path), no_env()).unwrap();
        assert_eq!(config.server.url, "http://localhost:8000");
        assert_eq!(config.playback.volume, 50);
        assert_eq!(config.playback.handle_cache_capacity, 16);
        assert_eq!(config.session.token_path, PathBuf::from(".xasd/token.json"));
    }

    #[test]
    fn reads_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("xasd.toml");
        fs::write(
            &path,
            r#"
[server]
url = "https://api.example.com"

[playback]
volume = 30
progress_interval_ms = 500
media_base_url = "https://media.example.com/"

[session]
token_path = "/tmp/xasd-token.json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_with_env(Some(&path), no_env()).unwrap();
        assert_eq!(config.server.url, "https://api.example.com");
        assert_eq!(config.playback.volume, 30);
        assert_eq!(config.playback.progress_interval_ms, 500);
        assert_eq!(config.playback.media_base_url, "https://media.example.com/");
        // Unset keys keep their defaults
        assert_eq!(config.playback.handle_cache_capacity, 16);
        assert_eq!(
            config.session.token_path,
            PathBuf::from("/tmp/xasd-token.json")
        );
    }

    #[test]
    fn environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("xasd.toml");
        fs::write(&path, "[server]\nurl = \"https://file.example.com\"\n").unwrap();

        let env = HashMap::from([
            (
                "XASD_SERVER__URL".to_string(),
                "https://env.example.com".to_string(),
            ),
            ("XASD_PLAYBACK__VOLUME".to_string(), "75".to_string()),
        ]);

        let config = AppConfig::load_with_env(Some(&path), Some(env)).unwrap();
        assert_eq!(config.server.url, "https://env.example.com");
        assert_eq!(config.playback.volume, 75);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");

        assert!(AppConfig::load_with_env(Some(&path), no_env()).is_err());
    }
}

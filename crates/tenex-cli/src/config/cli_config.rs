//! CLI configuration file support
//!
//! Loads configuration from ~/.config/tenex/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tenex_chat::ClientConfig;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Where the chat API lives
    #[serde(default)]
    pub server: ServerConfig,
    /// Credentials attached to requests
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Chat server settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub chat_path: Option<String>,
    pub stream_path: Option<String>,
    pub auth_path: Option<String>,
    /// Chunks buffered between the network task and the terminal
    pub channel_capacity: Option<usize>,
}

/// Auth settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Value of the `session_id` cookie
    pub session_cookie: Option<String>,
}

impl CliConfig {
    /// Load configuration from default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config");
                Self::default()
            }
        }
    }

    fn parse(content: &str, path: &Path) -> Self {
        toml::from_str(content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config");
            Self::default()
        })
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tenex").join("config.toml"))
    }

    /// Build the client configuration. Flag values win over the file.
    pub fn client_config(&self, base_url: Option<&str>, session: Option<&str>) -> ClientConfig {
        let base_url = base_url
            .map(str::to_string)
            .or_else(|| self.server.base_url.clone());
        let mut config = match base_url {
            Some(url) => ClientConfig::new(url),
            None => ClientConfig::default(),
        };

        if let Some(path) = &self.server.chat_path {
            config = config.with_chat_path(path);
        }
        if let Some(path) = &self.server.stream_path {
            config = config.with_stream_path(path);
        }
        if let Some(path) = &self.server.auth_path {
            config = config.with_auth_path(path);
        }
        if let Some(capacity) = self.server.channel_capacity {
            config = config.with_channel_capacity(capacity);
        }

        let session = session
            .map(str::to_string)
            .or_else(|| self.auth.session_cookie.clone());
        if let Some(session) = session {
            config = config.with_session_cookie(session);
        }

        config
    }
}

/// Directory for the rolling log files
pub fn log_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tenex").join("logs"))
}

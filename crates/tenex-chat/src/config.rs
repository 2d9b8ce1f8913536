//! Client configuration

use url::Url;

use crate::error::{ChatError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_CHAT_PATH: &str = "/api/chat/";
pub const DEFAULT_STREAM_PATH: &str = "/api/chat/stream";
pub const DEFAULT_AUTH_PATH: &str = "/api/v1/auth";
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Where the chat API lives and how requests are authorized
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub chat_path: String,
    pub stream_path: String,
    pub auth_path: String,
    /// Value of the `session_id` cookie issued by the auth service.
    pub session_cookie: Option<String>,
    /// Buffer size of the channel used by [`crate::spawn_chunk_channel`].
    pub channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            auth_path: DEFAULT_AUTH_PATH.to_string(),
            session_cookie: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_chat_path(mut self, path: impl Into<String>) -> Self {
        self.chat_path = path.into();
        self
    }

    pub fn with_stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.auth_path = path.into();
        self
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn chat_url(&self) -> Result<Url> {
        self.endpoint(&self.chat_path)
    }

    pub fn stream_url(&self) -> Result<Url> {
        self.endpoint(&self.stream_path)
    }

    /// URL of an endpoint under the auth prefix, e.g. `auth_url("me")`.
    pub fn auth_url(&self, endpoint: &str) -> Result<Url> {
        let path = format!(
            "{}/{}",
            self.auth_path.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        self.endpoint(&path)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let raw = format!("{base}{path}");
        Url::parse(&raw).map_err(|e| ChatError::InvalidUrl(format!("{raw}: {e}")))
    }
}

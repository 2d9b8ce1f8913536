//! Chat transcript and streaming wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Author of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

/// Single entry in a chat transcript
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub is_streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub is_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

impl ChatMessage {
    pub fn is_streaming(&self) -> bool {
        self.is_streaming.unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete.unwrap_or(false)
    }

    /// Whether the message finished streaming and can no longer change.
    pub fn is_finalized(&self) -> bool {
        self.is_streaming == Some(false)
    }
}

/// Body of a chat request, streaming or not
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[ts(export)]
pub struct ChatRequest {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Response of the non-streaming chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[ts(export)]
pub struct ChatResponse {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// One decoded server-sent event payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StreamingChunk {
    /// Frame identifier assigned by the server, not a message id.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

impl StreamingChunk {
    /// A non-terminal chunk carrying a text fragment.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// The terminal chunk synthesized for the `[DONE]` sentinel.
    pub fn completion() -> Self {
        Self {
            is_complete: true,
            ..Self::default()
        }
    }

    /// A chunk reporting a server-side failure.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            is_complete: true,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Fully assembled streamed reply
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StreamingMessage {
    pub id: String,
    pub content: String,
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

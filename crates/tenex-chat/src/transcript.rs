//! Transcript state machine.
//!
//! Holds the ordered message list together with the loading flag and the last
//! user-facing error. Every change goes through one of the transition methods
//! below; updates address messages by id and updaters always see the stored
//! message, never a copy taken earlier.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tenex_shared::{ChatMessage, Sender, generate_message_id};

/// User-facing error shown after any failed send.
pub const SEND_FAILURE_MESSAGE: &str = "Failed to send message. Please try again.";

/// Everything about a new message except its id.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub text: String,
    pub sender: Sender,
    pub timestamp: Option<DateTime<Utc>>,
    pub is_streaming: Option<bool>,
    pub is_complete: Option<bool>,
    pub error: Option<String>,
}

impl MessageDraft {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            timestamp: None,
            is_streaming: None,
            is_complete: None,
            error: None,
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Agent,
            ..Self::user(text)
        }
    }

    /// Empty agent message waiting for streamed content.
    pub fn placeholder() -> Self {
        Self {
            is_streaming: Some(true),
            is_complete: Some(false),
            ..Self::agent("")
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    fn into_message(self, id: String) -> ChatMessage {
        ChatMessage {
            id,
            text: self.text,
            sender: self.sender,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            is_streaming: self.is_streaming,
            is_complete: self.is_complete,
            error: self.error,
        }
    }
}

/// Partial update of the mutable message fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub text: Option<String>,
    pub is_streaming: Option<bool>,
    pub is_complete: Option<bool>,
    pub error: Option<String>,
}

impl MessagePatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Stream finished successfully.
    pub fn completed() -> Self {
        Self {
            is_streaming: Some(false),
            is_complete: Some(true),
            ..Self::default()
        }
    }

    /// Stream finished with an error.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            is_streaming: Some(false),
            is_complete: Some(false),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    fn apply(self, message: &mut ChatMessage) {
        if let Some(text) = self.text {
            message.text = text;
        }
        if let Some(is_streaming) = self.is_streaming {
            message.is_streaming = Some(is_streaming);
        }
        if let Some(is_complete) = self.is_complete {
            message.is_complete = Some(is_complete);
        }
        if let Some(error) = self.error {
            message.error = Some(error);
        }
    }
}

type Updater = Box<dyn FnOnce(&ChatMessage) -> MessagePatch + Send>;

/// A literal patch or a function of the current stored message.
pub enum MessageUpdate {
    Patch(MessagePatch),
    Updater(Updater),
}

impl MessageUpdate {
    pub fn updater<F>(f: F) -> Self
    where
        F: FnOnce(&ChatMessage) -> MessagePatch + Send + 'static,
    {
        MessageUpdate::Updater(Box::new(f))
    }

    /// Append `fragment` to whatever text the message holds when applied.
    pub fn append(fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        Self::updater(move |current| MessagePatch::text(format!("{}{}", current.text, fragment)))
    }
}

impl From<MessagePatch> for MessageUpdate {
    fn from(patch: MessagePatch) -> Self {
        MessageUpdate::Patch(patch)
    }
}

impl std::fmt::Debug for MessageUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageUpdate::Patch(patch) => f.debug_tuple("Patch").field(patch).finish(),
            MessageUpdate::Updater(_) => f.write_str("Updater(..)"),
        }
    }
}

/// Ordered chat transcript with loading and error state
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    is_loading: bool,
    error: Option<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Append a message and return its generated id.
    pub fn add_message(&mut self, draft: MessageDraft) -> String {
        let id = generate_message_id();
        self.messages.push(draft.into_message(id.clone()));
        id
    }

    /// Apply `update` to the message with `id`.
    ///
    /// Returns `false` when no message has that id or the message already
    /// finished streaming; finalized messages never change again.
    pub fn update_message(&mut self, id: &str, update: impl Into<MessageUpdate>) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            tracing::debug!(message_id = id, "Update for unknown message ignored");
            return false;
        };

        if message.is_finalized() {
            tracing::warn!(message_id = id, "Update for finalized message ignored");
            return false;
        }

        let patch = match update.into() {
            MessageUpdate::Patch(patch) => patch,
            MessageUpdate::Updater(f) => f(&*message),
        };
        patch.apply(message);
        true
    }

    /// Remove every message and the last error. The loading flag belongs to
    /// whatever send is still in flight and is left alone.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.error = None;
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

//! Chat session: the transcript reducer driven by a transport.

use std::sync::Arc;

use futures::StreamExt;
use tenex_shared::{ChatMessage, StreamingChunk};

use crate::error::ChatError;
use crate::transcript::{
    MessageDraft, MessagePatch, MessageUpdate, SEND_FAILURE_MESSAGE, Transcript,
};
use crate::transport::ChatTransport;

/// Error text recorded on a reply the user cancelled.
pub const CANCELLED_MESSAGE: &str = "Cancelled";

/// Why a send was not started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    /// Text was empty after trimming.
    Blank,
    /// Another reply is still streaming.
    Busy,
}

/// Handle to the agent reply a send is filling in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub user_message_id: String,
    pub message_id: String,
    /// Trimmed text that goes to the transport.
    pub text: String,
}

/// Effect of applying one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyProgress {
    /// More chunks may follow.
    Streaming,
    /// The reply completed.
    Completed,
    /// The reply failed; the message carries the error.
    Failed,
}

impl ReplyProgress {
    pub fn is_finished(self) -> bool {
        !matches!(self, ReplyProgress::Streaming)
    }
}

/// Result of [`ChatSession::send_user_message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Rejected(SendRejected),
    Completed { message_id: String },
    Failed { message_id: String },
}

/// Transcript plus the transport that fills it
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    transcript: Transcript,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            transcript: Transcript::new(),
        }
    }

    pub fn transport(&self) -> Arc<dyn ChatTransport> {
        Arc::clone(&self.transport)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.transcript.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.transcript.error()
    }

    pub fn add_message(&mut self, draft: MessageDraft) -> String {
        self.transcript.add_message(draft)
    }

    pub fn update_message(&mut self, id: &str, update: impl Into<MessageUpdate>) -> bool {
        self.transcript.update_message(id, update)
    }

    /// Empty the transcript and drop the last error. A reply that is still
    /// streaming keeps running; its late chunks find no message to update.
    pub fn clear_messages(&mut self) {
        self.transcript.clear();
    }

    /// Record the user message and the empty agent placeholder for `text`.
    ///
    /// Blank text and sends while a reply is streaming are rejected without
    /// touching the transcript.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingReply, SendRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendRejected::Blank);
        }
        if self.transcript.is_loading() {
            tracing::debug!("Send rejected while a reply is streaming");
            return Err(SendRejected::Busy);
        }

        let user_message_id = self.transcript.add_message(MessageDraft::user(text));
        self.transcript.set_loading(true);
        self.transcript.set_error(None);
        let message_id = self.transcript.add_message(MessageDraft::placeholder());

        Ok(PendingReply {
            user_message_id,
            message_id,
            text: text.to_string(),
        })
    }

    /// Fold one streamed chunk into the reply.
    pub fn apply_chunk(&mut self, reply: &PendingReply, chunk: StreamingChunk) -> ReplyProgress {
        if let Some(error) = chunk.error {
            tracing::warn!(message_id = %reply.message_id, %error, "Reply failed on the server");
            self.fail(reply, error);
            return ReplyProgress::Failed;
        }

        if chunk.is_complete {
            self.transcript
                .update_message(&reply.message_id, MessagePatch::completed());
            self.transcript.set_loading(false);
            return ReplyProgress::Completed;
        }

        if !chunk.content.is_empty() {
            self.transcript
                .update_message(&reply.message_id, MessageUpdate::append(chunk.content));
        }
        ReplyProgress::Streaming
    }

    /// Finalize the reply after a transport failure.
    pub fn fail_reply(&mut self, reply: &PendingReply, error: &ChatError) {
        tracing::error!(message_id = %reply.message_id, %error, "Error sending message");
        self.fail(reply, error.to_string());
    }

    /// Finalize a reply whose stream ended without a completion signal.
    pub fn finish_reply(&mut self, reply: &PendingReply) {
        tracing::debug!(message_id = %reply.message_id, "Stream ended without completion signal");
        self.transcript
            .update_message(&reply.message_id, MessagePatch::completed());
        self.transcript.set_loading(false);
    }

    /// Stop waiting for a reply the user abandoned.
    pub fn cancel_reply(&mut self, reply: &PendingReply) {
        self.transcript
            .update_message(&reply.message_id, MessagePatch::failed(CANCELLED_MESSAGE));
        self.transcript.set_loading(false);
    }

    fn fail(&mut self, reply: &PendingReply, error: String) {
        self.transcript
            .update_message(&reply.message_id, MessagePatch::failed(error));
        self.transcript
            .set_error(Some(SEND_FAILURE_MESSAGE.to_string()));
        self.transcript.set_loading(false);
    }

    /// Send `text` and stream the reply into the transcript.
    pub async fn send_user_message(&mut self, text: &str) -> SendOutcome {
        self.send_user_message_with(text, |_| {}).await
    }

    /// Like [`Self::send_user_message`], reporting the agent message after
    /// every chunk that changed it.
    pub async fn send_user_message_with<F>(&mut self, text: &str, mut on_update: F) -> SendOutcome
    where
        F: FnMut(&ChatMessage),
    {
        let reply = match self.begin_send(text) {
            Ok(reply) => reply,
            Err(rejected) => return SendOutcome::Rejected(rejected),
        };

        let transport = Arc::clone(&self.transport);
        let mut stream = transport.stream_message(&reply.text);

        let mut progress = ReplyProgress::Streaming;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    progress = self.apply_chunk(&reply, chunk);
                }
                Err(error) => {
                    self.fail_reply(&reply, &error);
                    progress = ReplyProgress::Failed;
                }
            }
            if let Some(message) = self.transcript.get(&reply.message_id) {
                on_update(message);
            }
            if progress.is_finished() {
                break;
            }
        }

        if !progress.is_finished() {
            self.finish_reply(&reply);
            if let Some(message) = self.transcript.get(&reply.message_id) {
                on_update(message);
            }
            progress = ReplyProgress::Completed;
        }

        match progress {
            ReplyProgress::Failed => SendOutcome::Failed {
                message_id: reply.message_id,
            },
            _ => SendOutcome::Completed {
                message_id: reply.message_id,
            },
        }
    }
}

//! Tenex chat client
//!
//! This crate provides:
//! - HTTP transport for the chat API, streamed over server-sent events
//! - Transcript reducer that turns streamed chunks into chat messages
//! - Client for the auth endpoints guarding the chat API

pub mod auth;
pub mod config;
pub mod error;
mod http_client;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod session;
pub mod transcript;
pub mod transport;

pub use auth::AuthClient;
pub use config::ClientConfig;
pub use error::{ChatError, Result};
pub use session::{
    CANCELLED_MESSAGE, ChatSession, PendingReply, ReplyProgress, SendOutcome, SendRejected,
};
pub use transcript::{MessageDraft, MessagePatch, MessageUpdate, SEND_FAILURE_MESSAGE, Transcript};
pub use transport::{
    ChatTransport, ChunkStream, HttpChatTransport, SseDecoder, SseFrame, parse_frame,
    send_message_streaming, spawn_chunk_channel,
};

// Shared wire types, so callers need only one dependency.
pub use tenex_shared::{ChatMessage, ChatResponse, Sender, StreamingChunk};

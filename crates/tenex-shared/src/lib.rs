//! Tenex shared types
//!
//! Wire and data types shared between the chat client, the terminal front end
//! and the web client. TypeScript bindings are exported with `ts-rs` when the
//! crate's tests run.

pub mod api;
pub mod auth;
pub mod chat;
pub mod ids;

pub use api::ApiResponse;
pub use auth::{AuthState, AuthStatus, LoginRequest, LoginResponse, User};
pub use chat::{ChatMessage, ChatRequest, ChatResponse, Sender, StreamingChunk, StreamingMessage};
pub use ids::generate_message_id;

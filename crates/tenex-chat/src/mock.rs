//! Scripted chat transport for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tenex_shared::{ChatResponse, StreamingChunk};
use tokio::time::{Duration, sleep};

use crate::error::{ChatError, Result};
use crate::transport::{ChatTransport, ChunkStream};

/// One scripted reply: chunks in order, optionally followed by a failure.
#[derive(Debug)]
pub struct MockReply {
    pub delay_ms: u64,
    pub chunks: Vec<StreamingChunk>,
    pub error: Option<ChatError>,
}

impl MockReply {
    /// Exactly these chunks, nothing appended.
    pub fn chunks(chunks: Vec<StreamingChunk>) -> Self {
        Self {
            delay_ms: 0,
            chunks,
            error: None,
        }
    }

    /// A single content chunk followed by the completion signal.
    pub fn text(content: impl Into<String>) -> Self {
        Self::chunks(vec![
            StreamingChunk::content(content),
            StreamingChunk::completion(),
        ])
    }

    /// Fail before any chunk is produced.
    pub fn error(error: ChatError) -> Self {
        Self::chunks_then_error(Vec::new(), error)
    }

    pub fn chunks_then_error(chunks: Vec<StreamingChunk>, error: ChatError) -> Self {
        Self {
            delay_ms: 0,
            chunks,
            error: Some(error),
        }
    }

    /// Sleep this long between chunks.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// Transport that replays scripted replies and records what was sent.
///
/// Once the script runs out every message is echoed back.
#[derive(Debug, Clone)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<MockReply>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    pub fn from_replies(replies: Vec<MockReply>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(replies))),
            sent: Arc::default(),
        }
    }

    /// Messages passed to the transport, oldest first.
    pub fn sent_messages(&self) -> Vec<String> {
        lock(&self.sent).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.sent).len()
    }

    fn next_reply(&self, message: &str) -> MockReply {
        lock(&self.sent).push(message.to_string());
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| MockReply::text(format!("Echo: {message}")))
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_message(&self, message: &str) -> Result<ChatResponse> {
        let reply = self.next_reply(message);
        if let Some(error) = reply.error {
            return Err(error);
        }
        let response = reply
            .chunks
            .iter()
            .take_while(|chunk| chunk.error.is_none())
            .map(|chunk| chunk.content.as_str())
            .collect::<String>();
        Ok(ChatResponse {
            response,
            timestamp: chrono::Utc::now(),
        })
    }

    fn stream_message(&self, message: &str) -> ChunkStream {
        let reply = self.next_reply(message);
        let delay = Duration::from_millis(reply.delay_ms);

        let items = reply
            .chunks
            .into_iter()
            .map(Ok)
            .chain(reply.error.map(Err))
            .collect::<Vec<_>>();

        Box::pin(stream::iter(items).then(move |item| async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            item
        }))
    }
}

//! Chat transport - request issuance and chunk delivery

pub(crate) mod http;
pub mod sse;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tenex_shared::{ChatResponse, StreamingChunk};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{ChatError, Result};

pub use http::HttpChatTransport;
pub use sse::{SseDecoder, SseFrame, parse_frame};

/// Chunks of one streamed reply, in decode order. The stream ends after the
/// terminal chunk or when the body ends; an `Err` item is always the last.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamingChunk>> + Send>>;

/// Chat transport trait
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a message and wait for the whole reply.
    async fn send_message(&self, message: &str) -> Result<ChatResponse>;

    /// Send a message and stream the reply chunk by chunk. Dropping the
    /// stream abandons the underlying read.
    fn stream_message(&self, message: &str) -> ChunkStream;
}

/// Stream a reply, handing every chunk to `on_chunk`.
///
/// Transport failures go to `on_error` when one is supplied and the call then
/// returns `Ok(())`; without it the failure is returned to the caller.
pub async fn send_message_streaming<T, F, E>(
    transport: &T,
    message: &str,
    mut on_chunk: F,
    on_error: Option<E>,
) -> Result<()>
where
    T: ChatTransport + ?Sized,
    F: FnMut(StreamingChunk),
    E: FnOnce(ChatError),
{
    let mut stream = transport.stream_message(message);

    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                let terminal = chunk.is_complete;
                on_chunk(chunk);
                if terminal {
                    break;
                }
            }
            Err(error) => {
                return match on_error {
                    Some(on_error) => {
                        on_error(error);
                        Ok(())
                    }
                    None => Err(error),
                };
            }
        }
    }

    Ok(())
}

/// Run a streamed reply on its own task and forward its chunks into a bounded
/// channel.
///
/// Dropping the receiver cancels the producer at its next send; the returned
/// handle can also be aborted directly.
pub fn spawn_chunk_channel(
    transport: Arc<dyn ChatTransport>,
    message: String,
    capacity: usize,
) -> (mpsc::Receiver<Result<StreamingChunk>>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let handle = tokio::spawn(async move {
        let mut stream = transport.stream_message(&message);
        while let Some(item) = stream.next().await {
            let stop = match &item {
                Ok(chunk) => chunk.is_complete,
                Err(_) => true,
            };
            if tx.send(item).await.is_err() {
                tracing::debug!("Chunk receiver dropped, abandoning stream");
                return;
            }
            if stop {
                return;
            }
        }
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockReply, MockTransport};

    #[tokio::test]
    async fn callback_receives_chunks_in_order() {
        let transport = MockTransport::from_replies(vec![MockReply::chunks(vec![
            StreamingChunk::content("a"),
            StreamingChunk::content("b"),
            StreamingChunk::completion(),
        ])]);

        let mut seen = Vec::new();
        send_message_streaming(&transport, "hi", |c| seen.push(c), None::<fn(ChatError)>)
            .await
            .unwrap();

        let contents: Vec<_> = seen.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", ""]);
        assert!(seen.last().unwrap().is_complete);
    }

    #[tokio::test]
    async fn error_goes_to_callback_when_supplied() {
        let transport = MockTransport::from_replies(vec![MockReply::error(ChatError::status(
            502, "",
        ))]);

        let mut reported = None;
        let result = send_message_streaming(
            &transport,
            "hi",
            |_| {},
            Some(|e: ChatError| reported = Some(e.to_string())),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(reported.as_deref(), Some("HTTP error! status: 502"));
    }

    #[tokio::test]
    async fn error_propagates_without_callback() {
        let transport = MockTransport::from_replies(vec![MockReply::error(ChatError::Stream(
            "reset".to_string(),
        ))]);

        let result =
            send_message_streaming(&transport, "hi", |_| {}, None::<fn(ChatError)>).await;
        assert!(matches!(result, Err(ChatError::Stream(_))));
    }

    #[tokio::test]
    async fn channel_forwards_until_terminal_chunk() {
        let transport: Arc<dyn ChatTransport> =
            Arc::new(MockTransport::from_replies(vec![MockReply::chunks(vec![
                StreamingChunk::content("x"),
                StreamingChunk::completion(),
                StreamingChunk::content("never"),
            ])]));

        let (mut rx, handle) = spawn_chunk_channel(transport, "hi".to_string(), 4);
        let mut received = Vec::new();
        while let Some(item) = rx.recv().await {
            received.push(item.unwrap());
        }
        handle.await.unwrap();

        assert_eq!(received.len(), 2);
        assert!(received[1].is_complete);
    }

    #[tokio::test]
    async fn dropping_receiver_stops_producer() {
        let transport: Arc<dyn ChatTransport> = Arc::new(MockTransport::from_replies(vec![
            MockReply::chunks(vec![StreamingChunk::content("x"); 16]),
        ]));

        let (rx, handle) = spawn_chunk_channel(transport, "hi".to_string(), 1);
        drop(rx);
        handle.await.unwrap();
    }
}

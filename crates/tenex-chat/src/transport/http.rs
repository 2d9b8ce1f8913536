//! HTTP chat transport

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use tenex_shared::{ChatRequest, ChatResponse};

use super::sse::SseDecoder;
use super::{ChatTransport, ChunkStream};
use crate::config::ClientConfig;
use crate::error::{ChatError, Result};
use crate::http_client::build_http_client;

/// Chat transport backed by the HTTP chat API
#[derive(Clone)]
pub struct HttpChatTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpChatTransport {
    /// Create a transport for the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = build_http_client(config.session_cookie.as_deref())?;
        Ok(Self { client, config })
    }
}

pub(crate) async fn response_to_error(response: Response) -> ChatError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ChatError::status(status, body)
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send_message(&self, message: &str) -> Result<ChatResponse> {
        let url = self.config.chat_url()?;
        tracing::debug!(%url, "Sending chat message");

        let response = self
            .client
            .post(url)
            .json(&ChatRequest::new(message))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }

        Ok(response.json().await?)
    }

    fn stream_message(&self, message: &str) -> ChunkStream {
        let client = self.client.clone();
        let url = self.config.stream_url();
        let body = ChatRequest::new(message);

        Box::pin(async_stream::stream! {
            let url = match url {
                Ok(url) => url,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            tracing::debug!(%url, "Opening chat stream");

            let response = match client
                .post(url)
                .header("Accept", "text/event-stream")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(ChatError::Http(e));
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(response_to_error(response).await);
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            let mut delivered = 0usize;

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(ChatError::Stream(e.to_string()));
                        return;
                    }
                };

                for frame in decoder.push(&bytes) {
                    let terminal = frame.is_terminal();
                    delivered += 1;
                    yield Ok(frame.into_chunk());
                    if terminal {
                        tracing::debug!(chunks = delivered, "Chat stream completed");
                        return;
                    }
                }
            }

            // The last line may lack its trailing newline.
            if let Some(frame) = decoder.finish() {
                delivered += 1;
                yield Ok(frame.into_chunk());
            }
            tracing::debug!(chunks = delivered, "Chat stream ended");
        })
    }
}

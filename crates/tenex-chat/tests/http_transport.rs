//! HTTP transport and session tests against a local mock server

use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;
use tenex_chat::{
    AuthClient, ChatError, ChatSession, ChatTransport, ClientConfig, HttpChatTransport,
    SEND_FAILURE_MESSAGE, SendOutcome, StreamingChunk, send_message_streaming,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn disable_system_proxy_for_tests() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        // Safety: set once for the process before any HTTP clients are built.
        unsafe {
            std::env::set_var("TENEX_DISABLE_SYSTEM_PROXY", "1");
        }
    });
}

fn sse_body(frames: &[&str]) -> String {
    frames.iter().map(|f| format!("data: {f}\n\n")).collect()
}

async fn stream_server(body: String) -> MockServer {
    disable_system_proxy_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;
    server
}

fn transport_for(server: &MockServer) -> HttpChatTransport {
    HttpChatTransport::new(ClientConfig::new(server.uri())).unwrap()
}

async fn collect(transport: &HttpChatTransport, message: &str) -> Vec<StreamingChunk> {
    let mut chunks = Vec::new();
    send_message_streaming(transport, message, |c| chunks.push(c), None::<fn(ChatError)>)
        .await
        .unwrap();
    chunks
}

#[tokio::test]
async fn streams_chunks_in_order() {
    let server = stream_server(sse_body(&[
        r#"{"id":"1","content":"Hello","isComplete":false}"#,
        r#"{"id":"2","content":" world","isComplete":false}"#,
        r#"{"id":"3","content":"","isComplete":true}"#,
    ]))
    .await;

    let chunks = collect(&transport_for(&server), "hi").await;

    let contents: Vec<_> = chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["Hello", " world", ""]);
    assert_eq!(chunks[0].id, "1");
    assert!(chunks[2].is_complete);
}

#[tokio::test]
async fn done_sentinel_ends_the_stream() {
    let server = stream_server(sse_body(&[
        r#"{"id":"1","content":"only","isComplete":false}"#,
        "[DONE]",
        r#"{"id":"2","content":"after","isComplete":false}"#,
    ]))
    .await;

    let chunks = collect(&transport_for(&server), "hi").await;

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].content, "only");
    assert!(chunks[1].is_complete);
    assert!(chunks[1].content.is_empty());
}

#[tokio::test]
async fn malformed_frame_is_skipped() {
    let mut body = sse_body(&[r#"{"id":"1","content":"a","isComplete":false}"#]);
    body.push_str("data: {not json\n\n");
    body.push_str(": keep-alive comment\n\n");
    body.push_str(&sse_body(&[
        r#"{"id":"2","content":"b","isComplete":false}"#,
        r#"{"id":"3","content":"","isComplete":true}"#,
    ]));
    let server = stream_server(body).await;

    let chunks = collect(&transport_for(&server), "hi").await;

    let contents: Vec<_> = chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["a", "b", ""]);
}

#[tokio::test]
async fn body_without_terminal_chunk_just_ends() {
    let server = stream_server(sse_body(&[
        r#"{"id":"1","content":"partial","isComplete":false}"#,
    ]))
    .await;

    let items: Vec<_> = transport_for(&server).stream_message("hi").collect().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap().content, "partial");
}

#[tokio::test]
async fn request_body_carries_message() {
    disable_system_proxy_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .and(header("accept", "text/event-stream"))
        .and(body_partial_json(json!({ "message": "What is Tenex?" })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse_body(&[r#"{"id":"1","content":"","isComplete":true}"#]),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let chunks = collect(&transport_for(&server), "What is Tenex?").await;
    assert_eq!(chunks.len(), 1);
}

#[tokio::test]
async fn error_status_is_reported() {
    disable_system_proxy_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let mut chunks = Vec::new();
    let mut reported = None;
    send_message_streaming(
        &transport,
        "hi",
        |c| chunks.push(c),
        Some(|e: ChatError| reported = Some(e)),
    )
    .await
    .unwrap();

    assert!(chunks.is_empty());
    let error = reported.unwrap();
    assert_eq!(error.to_string(), "HTTP error! status: 500");
    assert_eq!(error.status_code(), Some(500));
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    disable_system_proxy_for_tests();
    let transport = HttpChatTransport::new(ClientConfig::new("http://127.0.0.1:1")).unwrap();

    let result = send_message_streaming(&transport, "hi", |_| {}, None::<fn(ChatError)>).await;
    assert!(matches!(result, Err(ChatError::Http(_))));
}

#[tokio::test]
async fn non_streaming_send_returns_response() {
    disable_system_proxy_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/"))
        .and(body_partial_json(json!({ "message": "ping" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "pong",
            "timestamp": "2023-09-10T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let response = transport_for(&server).send_message("ping").await.unwrap();
    assert_eq!(response.response, "pong");
}

#[tokio::test]
async fn session_cookie_is_sent() {
    disable_system_proxy_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/"))
        .and(header("cookie", "session_id=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "ok",
            "timestamp": "2023-09-10T10:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(server.uri()).with_session_cookie("abc123");
    let transport = HttpChatTransport::new(config).unwrap();
    assert!(transport.send_message("hi").await.is_ok());
}

#[tokio::test]
async fn session_streams_reply_into_transcript() {
    let server = stream_server(sse_body(&[
        r#"{"id":"1","content":"Hello","isComplete":false}"#,
        r#"{"id":"2","content":"! How can I help?","isComplete":false}"#,
        r#"{"id":"3","content":"","isComplete":true}"#,
    ]))
    .await;

    let mut session = ChatSession::new(Arc::new(transport_for(&server)));
    let outcome = session.send_user_message("Hello").await;

    assert!(matches!(outcome, SendOutcome::Completed { .. }));
    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "Hello! How can I help?");
    assert!(messages[1].is_complete());
    assert!(!session.is_loading());
}

#[tokio::test]
async fn session_records_server_error_chunk() {
    let server = stream_server(sse_body(&[
        r#"{"id":"1","content":"","isComplete":true,"error":"Model unavailable"}"#,
    ]))
    .await;

    let mut session = ChatSession::new(Arc::new(transport_for(&server)));
    let outcome = session.send_user_message("Hello").await;

    assert!(matches!(outcome, SendOutcome::Failed { .. }));
    assert_eq!(session.error(), Some(SEND_FAILURE_MESSAGE));
    assert_eq!(
        session.messages()[1].error.as_deref(),
        Some("Model unavailable")
    );
}

#[tokio::test]
async fn auth_client_reads_current_user() {
    disable_system_proxy_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "email": "ada@example.com",
            "name": "Ada"
        })))
        .mount(&server)
        .await;

    let auth = AuthClient::new(ClientConfig::new(server.uri())).unwrap();
    let user = auth.current_user().await.unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert!(auth.check_auth_status().await);
    assert!(auth.auth_state().await.is_authenticated);
}

#[tokio::test]
async fn auth_client_maps_unauthorized() {
    disable_system_proxy_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let auth = AuthClient::new(ClientConfig::new(server.uri())).unwrap();
    assert!(matches!(
        auth.current_user().await,
        Err(ChatError::Unauthorized)
    ));
    assert!(!auth.check_auth_status().await);
}

#[tokio::test]
async fn logout_ends_session() {
    disable_system_proxy_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthClient::new(ClientConfig::new(server.uri())).unwrap();
    assert!(auth.logout().await.is_ok());
}

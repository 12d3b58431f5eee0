//! Mock HTTP server setup for integration tests

use anthropic_speak::AnthropicClient;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const MESSAGES_PATH: &str = "/v1/messages";
pub const TEST_KEY: &str = "sk-ant-test";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = format!("{}/v1/", server.url());
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Create a test client pointed at the mock server
    pub fn client(&self) -> AnthropicClient {
        AnthropicClient::builder()
            .api_key(TEST_KEY)
            .base_url(&self.base_url)
            .header("anthropic-beta", "prompt-caching-2024-07-31")
            .build()
            .expect("client should build")
    }

    /// Create a mock for a successful JSON response
    pub async fn mock_json_response(&self, status: u16, body: &Value) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", MESSAGES_PATH)
            .match_header("x-api-key", TEST_KEY)
            .match_header("anthropic-version", "2023-06-01")
            .with_status(status as usize)
            .with_header("content-type", "application/json")
            .with_header("request-id", "req_mock_1")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// JSON response that only matches when the request body contains `expected`
    pub async fn mock_json_expecting(&self, expected: Value, body: &Value) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", MESSAGES_PATH)
            .match_body(Matcher::PartialJson(expected))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Create a mock for a successful streaming response (SSE).
    ///
    /// Each frame is written as `event: <type>` plus one `data:` line.
    pub async fn mock_sse_stream(&self, frames: &[Value]) -> Mock {
        let mut server = self.server.lock().await;
        let body = frames
            .iter()
            .map(|frame| {
                let event = frame.get("type").and_then(Value::as_str).unwrap_or("message");
                format!("event: {}\ndata: {}\n\n", event, frame)
            })
            .collect::<String>();

        server
            .mock("POST", MESSAGES_PATH)
            .match_header("accept", "text/event-stream")
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }

    /// Streaming response with a hand-written SSE body.
    pub async fn mock_sse_body(&self, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", MESSAGES_PATH)
            .match_header("accept", "text/event-stream")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }

    /// Create a mock for an error response
    pub async fn mock_error_response(&self, status: u16, error_type: &str, message: &str) -> Mock {
        let mut server = self.server.lock().await;
        let body = serde_json::json!({
            "type": "error",
            "error": {"type": error_type, "message": message}
        });
        server
            .mock("POST", MESSAGES_PATH)
            .with_status(status as usize)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// A mock that must never be hit
    pub async fn mock_unreachable(&self) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", MESSAGES_PATH)
            .with_status(500)
            .expect(0)
            .create_async()
            .await
    }
}

/// Canonical non-streamed reply.
pub fn message_body(text: &str) -> Value {
    serde_json::json!({
        "id": "msg_01XFDUDYJgAACzvnptvVoYEL",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-20250514",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "stop_sequence": null,
        "usage": {"input_tokens": 25, "output_tokens": 9}
    })
}

//! Integration tests for error handling

use anthropic_speak::protocol::ProtocolError;
use anthropic_speak::transport::TransportError;
use anthropic_speak::{ChatRequest, Error, Message};
use serde_json::json;

use crate::mock_server::MockServerFixture;

#[tokio::test]
async fn test_missing_max_tokens_never_reaches_the_wire() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_unreachable().await;

    let request = ChatRequest::new("claude-sonnet-4-20250514").with_message(Message::user("Hi"));
    let err = fixture.client().chat(request).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.field_path(), Some("max_tokens"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_api_key_is_validation_error() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_unreachable().await;

    let client = anthropic_speak::AnthropicClient::builder()
        .base_url(&fixture.base_url)
        .build()
        .unwrap();
    let request = ChatRequest::new("claude-sonnet-4-20250514")
        .with_message(Message::user("Hi"))
        .with_max_tokens(10u32);
    let err = client.chat(request).await.unwrap_err();

    assert_eq!(err.field_path(), Some("api_key"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_overloaded_status_is_transport_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(529, "overloaded_error", "Overloaded")
        .await;

    let request = ChatRequest::new("claude-sonnet-4-20250514")
        .with_message(Message::user("Hi"))
        .with_max_tokens(10u32);
    let err = fixture.client().chat(request).await.unwrap_err();

    match err {
        Error::Transport(TransportError::Status {
            status,
            error_type,
            message,
        }) => {
            assert_eq!(status, 529);
            assert_eq!(error_type, "overloaded_error");
            assert_eq!(message, "Overloaded");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_request_status() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(400, "invalid_request_error", "max_tokens: must be greater than 0")
        .await;

    let request = ChatRequest::new("claude-sonnet-4-20250514")
        .with_message(Message::user("Hi"))
        .with_max_tokens(0u32);
    let err = fixture.client().chat(request).await.unwrap_err();
    assert!(err.to_string().contains("invalid_request_error"));
}

#[tokio::test]
async fn test_response_without_id_is_protocol_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json_response(200, &json!({"model": "claude-sonnet-4-20250514", "content": []}))
        .await;

    let request = ChatRequest::new("claude-sonnet-4-20250514")
        .with_message(Message::user("Hi"))
        .with_max_tokens(10u32);
    let err = fixture.client().chat(request).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::MissingField { .. })
    ));
}

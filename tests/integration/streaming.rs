//! Integration tests for streaming responses

use std::time::Duration;

use anthropic_speak::{
    CallControl, ChatRequest, ContentBlock, Error, Message, StopReason, StreamingError,
};
use serde_json::{json, Value};

use crate::mock_server::MockServerFixture;

fn request() -> ChatRequest {
    ChatRequest::new("claude-sonnet-4-20250514")
        .with_message(Message::user("Say hello"))
        .with_max_tokens(128u32)
        .with_stream(true)
}

fn message_start() -> Value {
    json!({
        "type": "message_start",
        "message": {
            "id": "msg_stream_1", "type": "message", "role": "assistant",
            "model": "claude-sonnet-4-20250514", "content": [],
            "stop_reason": null, "stop_sequence": null,
            "usage": {"input_tokens": 12, "output_tokens": 1}
        }
    })
}

fn text_block(index: u64) -> Value {
    json!({"type": "content_block_start", "index": index, "content_block": {"type": "text", "text": ""}})
}

fn text_delta(index: u64, text: &str) -> Value {
    json!({"type": "content_block_delta", "index": index, "delta": {"type": "text_delta", "text": text}})
}

#[tokio::test]
async fn test_sse_streaming_response() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream(&[
            message_start(),
            text_block(0),
            json!({"type": "ping"}),
            text_delta(0, "Hel"),
            text_delta(0, "lo"),
            json!({"type": "content_block_stop", "index": 0}),
            json!({"type": "message_delta", "delta": {"stop_reason": "end_turn", "stop_sequence": null},
                   "usage": {"output_tokens": 6}}),
            json!({"type": "message_stop"}),
        ])
        .await;

    let response = fixture.client().chat(request()).await.unwrap();

    assert_eq!(response.id, "msg_stream_1");
    assert_eq!(response.content.len(), 1);
    assert_eq!(response.all_text(), "Hello");
    assert_eq!(response.stop_reason, Some(StopReason::Stop));
    assert_eq!(response.usage.input_tokens, 12);
    assert_eq!(response.usage.output_tokens, 6);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_streamed_tool_call() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(&[
            message_start(),
            text_block(0),
            text_delta(0, "Let me echo that."),
            json!({"type": "content_block_start", "index": 1,
                   "content_block": {"type": "tool_use", "id": "toolu_9", "name": "echo", "input": {}}}),
            json!({"type": "content_block_delta", "index": 1,
                   "delta": {"type": "input_json_delta", "partial_json": "{\"intended_output\":"}}),
            json!({"type": "content_block_delta", "index": 1,
                   "delta": {"type": "input_json_delta", "partial_json": " \"hi\"}"}}),
            json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": {"output_tokens": 30}}),
            json!({"type": "message_stop"}),
        ])
        .await;

    let response = fixture.client().chat(request()).await.unwrap();
    assert!(response.used_tools());
    let uses = response.tool_uses();
    assert_eq!(uses[0].id, "toolu_9");
    assert_eq!(uses[0].input, &json!({"intended_output": "hi"}));
}

#[tokio::test]
async fn test_mid_stream_error_event() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(&[
            message_start(),
            text_block(0),
            text_delta(0, "Hel"),
            json!({"type": "error", "error": {"type": "overloaded", "message": "busy"}}),
            text_delta(0, "lo"),
        ])
        .await;

    let err = fixture.client().chat(request()).await.unwrap_err();
    match err {
        Error::Streaming(StreamingError::Provider {
            error_type,
            message,
        }) => {
            assert_eq!(error_type, "overloaded");
            assert_eq!(message, "busy");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_stream_is_streaming_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_sse_stream(&[]).await;

    let err = fixture.client().chat(request()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Streaming(StreamingError::NoBaseMessage)
    ));
}

#[tokio::test]
async fn test_stream_without_stop_marker_ends_gracefully() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(&[message_start(), text_block(0), text_delta(0, "partial")])
        .await;

    let response = fixture.client().chat(request()).await.unwrap();
    assert_eq!(response.all_text(), "partial");
    assert_eq!(response.stop_reason, None);
}

#[tokio::test]
async fn test_cancelled_before_dispatch() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_unreachable().await;

    let control = CallControl::new();
    control.cancel();
    let err = fixture
        .client()
        .chat_with_control(request(), control)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_expired_deadline() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_unreachable().await;

    let control = CallControl::new().with_timeout(Duration::ZERO);
    let err = fixture
        .client()
        .chat_with_control(request(), control)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_untagged_text_deltas_concatenate() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(&[
            message_start(),
            json!({"type": "content_block_start", "content_block": {"type": "text", "text": ""}}),
            json!({"type": "content_block_delta", "delta": {"text": "Hel"}}),
            json!({"type": "content_block_delta", "delta": {"text": "lo"}}),
            json!({"type": "message_stop"}),
        ])
        .await;

    let response = fixture.client().chat(request()).await.unwrap();
    assert_eq!(response.all_text(), "Hello");
}

#[tokio::test]
async fn test_truncated_frame_fails_the_call() {
    let fixture = MockServerFixture::new().await;
    let body = format!(
        "event: message_start\ndata: {}\n\n\
         event: content_block_start\ndata: {}\n\n\
         event: content_block_delta\ndata: {}\n\n\
         event: content_block_delta\ndata: {{\"type\":\"content_block_delta\",\"index\":0,\"delta\":{{\"type\":\"text_del\n\n\
         event: content_block_delta\ndata: {}\n\n\
         event: message_stop\ndata: {{\"type\":\"message_stop\"}}\n\n",
        message_start(),
        text_block(0),
        text_delta(0, "Hel"),
        text_delta(0, "o"),
    );
    let _mock = fixture.mock_sse_body(&body).await;

    let err = fixture.client().chat(request()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Streaming(StreamingError::MalformedEvent { .. })
    ));
}

#[tokio::test]
async fn test_unknown_tool_delta_reaches_response() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(&[
            message_start(),
            json!({"type": "content_block_start", "index": 0,
                   "content_block": {"type": "tool_use", "id": "toolu_7", "name": "lookup", "input": {}}}),
            json!({"type": "content_block_delta", "index": 0,
                   "delta": {"type": "input_json_delta", "partial_json": "{\"q\": \"rust\"}"}}),
            json!({"type": "content_block_delta", "index": 0,
                   "delta": {"type": "caller_delta", "caller": {"kind": "direct"}}}),
            json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}}),
            json!({"type": "message_stop"}),
        ])
        .await;

    let response = fixture.client().chat(request()).await.unwrap();
    match &response.content[0] {
        ContentBlock::ToolUse { input, extra, .. } => {
            assert_eq!(input, &json!({"q": "rust"}));
            assert_eq!(extra.get("caller"), Some(&json!({"kind": "direct"})));
        }
        other => panic!("unexpected block: {:?}", other),
    }
}

#[tokio::test]
async fn test_citations_reach_response() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(&[
            message_start(),
            text_block(0),
            text_delta(0, "Water boils at 100 C."),
            json!({"type": "content_block_delta", "index": 0, "delta": {
                "type": "citations_delta",
                "citation": {"type": "char_location", "cited_text": "boils at 100", "document_index": 0}
            }}),
            json!({"type": "message_stop"}),
        ])
        .await;

    let response = fixture.client().chat(request()).await.unwrap();
    match &response.content[0] {
        ContentBlock::Text { text, citations } => {
            assert_eq!(text, "Water boils at 100 C.");
            let citations = citations.as_ref().unwrap();
            assert_eq!(citations.len(), 1);
            assert_eq!(citations[0]["cited_text"], "boils at 100");
        }
        other => panic!("unexpected block: {:?}", other),
    }
}

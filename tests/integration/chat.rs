//! Integration tests for non-streamed chat calls

use anthropic_speak::{ChatRequest, Message, StopReason, ToolChoice, ToolDefinition, ToolKit};
use serde_json::json;

use crate::mock_server::{message_body, MockServerFixture};

fn request() -> ChatRequest {
    ChatRequest::new("claude-sonnet-4-20250514")
        .with_message(Message::user("Hello"))
        .with_max_tokens(256u32)
}

#[tokio::test]
async fn test_json_chat_round_trip() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response(200, &message_body("Hi! How can I help?"))
        .await;

    let response = fixture.client().chat(request()).await.unwrap();

    assert_eq!(response.id, "msg_01XFDUDYJgAACzvnptvVoYEL");
    assert_eq!(response.all_text(), "Hi! How can I help?");
    assert_eq!(response.stop_reason, Some(StopReason::Stop));
    assert!(response.completed_naturally());
    assert_eq!(response.total_tokens(), 34);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_request_body_shape_on_the_wire() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_expecting(
            json!({
                "model": "claude-sonnet-4-20250514",
                "max_tokens": 512,
                "system": "You are terse.\n\nNever apologise.",
                "messages": [{"role": "user", "content": "Hello"}]
            }),
            &message_body("ok"),
        )
        .await;

    let req = ChatRequest::new("claude-sonnet-4-20250514")
        .with_system("You are terse.")
        .with_message(Message::system("Never apologise."))
        .with_message(Message::user("Hello"))
        .with_max_tokens("512");

    let response = fixture.client().chat(req).await.unwrap();
    assert_eq!(response.first_text(), Some("ok"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_tool_use_reply() {
    let fixture = MockServerFixture::new().await;
    let tools = ToolKit::new()
        .with_tool(ToolDefinition::new(
            "get_weather",
            "Get the current weather in a given location",
            json!({
                "type": "object",
                "properties": {"location": {"type": "string"}},
                "required": ["location"]
            }),
        ))
        .unwrap();

    let _mock = fixture
        .mock_json_expecting(
            json!({
                "tools": [{
                    "name": "get_weather",
                    "description": "Get the current weather in a given location",
                    "input_schema": {
                        "type": "object",
                        "properties": {"location": {"type": "string"}},
                        "required": ["location"]
                    }
                }],
                "tool_choice": {"type": "tool", "name": "get_weather"}
            }),
            &json!({
                "id": "msg_tool",
                "type": "message",
                "role": "assistant",
                "model": "claude-sonnet-4-20250514",
                "content": [
                    {"type": "text", "text": "Checking."},
                    {"type": "tool_use", "id": "toolu_01A", "name": "get_weather",
                     "input": {"location": "San Francisco, CA"}}
                ],
                "stop_reason": "tool_use",
                "usage": {"input_tokens": 400, "output_tokens": 60}
            }),
        )
        .await;

    let response = fixture
        .client()
        .chat(
            request()
                .with_tools(tools)
                .with_tool_choice(ToolChoice::tool("get_weather")),
        )
        .await
        .unwrap();

    assert!(response.used_tools());
    assert_eq!(response.stop_reason, Some(StopReason::ToolCalls));
    let uses = response.tool_uses();
    assert_eq!(uses.len(), 1);
    assert_eq!(uses[0].input["location"], "San Francisco, CA");
}

#[tokio::test]
async fn test_cache_usage_reported() {
    let fixture = MockServerFixture::new().await;
    let mut body = message_body("cached");
    body["usage"] = json!({
        "input_tokens": 20,
        "output_tokens": 5,
        "cache_creation_input_tokens": 0,
        "cache_read_input_tokens": 180
    });
    let _mock = fixture.mock_json_response(200, &body).await;

    let response = fixture.client().chat(request()).await.unwrap();
    assert!(response.used_caching());
    assert_eq!(response.total_input_tokens(), 200);
    assert!((response.cache_efficiency() - 0.9).abs() < 1e-9);
}

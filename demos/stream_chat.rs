//! Streaming chat with a tool
//!
//! The reply is delivered as server-sent events and assembled into one
//! response before it is returned. Ctrl-C cancels the call in flight.
//!
//! Usage:
//!   ANTHROPIC_API_KEY="your_key" cargo run --example stream_chat

use std::time::Duration;

use anthropic_speak::{
    AnthropicClient, CallControl, ChatRequest, Message, ToolChoice, ToolDefinition, ToolKit,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = AnthropicClient::from_env()?;

    let tools = ToolKit::new().with_tool(ToolDefinition::new(
        "get_weather",
        "Get the current weather in a given location",
        json!({
            "type": "object",
            "properties": {
                "location": {"type": "string", "description": "City and state, e.g. San Francisco, CA"}
            },
            "required": ["location"]
        }),
    ))?;

    let request = ChatRequest::new("claude-sonnet-4-20250514")
        .with_message(Message::user("What's the weather like in Lisbon right now?"))
        .with_tools(tools)
        .with_tool_choice(ToolChoice::Auto)
        .with_max_tokens(1024u32)
        .with_stream(true);

    let control = CallControl::new().with_timeout(Duration::from_secs(120));
    let on_ctrl_c = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let response = client.chat_with_control(request, control).await?;

    for text in response.text_blocks() {
        println!("{}", text);
    }
    for call in response.tool_uses() {
        println!("tool call {} -> {}({})", call.id, call.name, call.input);
    }
    println!("\nusage: {:?}", response.usage);
    Ok(())
}

//! 类型系统模块：定义与厂商无关的通用请求、消息、工具与响应类型。
//!
//! # Types Module
//!
//! The universal (provider-neutral) schema: requests, conversation messages,
//! tools, responses and the typed streaming events of the Messages API.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatRequest`] | Immutable request value with `with_*` setters |
//! | [`Message`] | Chat message with role and content |
//! | [`ContentBlock`] | Closed sum of text / tool_use / tool_result / thinking |
//! | [`ToolKit`] | Ordered tool definitions with unique names |
//! | [`ChatResponse`] | Response value plus derived queries |
//! | [`StopReason`] | Universal stop reason with the provider mapping |
//! | [`StreamEvent`] | One decoded streaming frame |
//!
//! ## Example
//!
//! ```rust
//! use anthropic_speak::types::{ChatRequest, Message, ToolDefinition, ToolKit};
//!
//! let tools = ToolKit::new()
//!     .with_tool(ToolDefinition::new(
//!         "get_weather",
//!         "Get current weather for a location",
//!         serde_json::json!({
//!             "type": "object",
//!             "properties": {"location": {"type": "string"}}
//!         }),
//!     ))
//!     .unwrap();
//!
//! let request = ChatRequest::new("claude-sonnet-4-20250514")
//!     .with_system("You are a helpful assistant")
//!     .with_message(Message::user("What's the weather in Paris?"))
//!     .with_tools(tools)
//!     .with_max_tokens(512u32);
//! assert_eq!(request.tools().len(), 1);
//! ```

pub mod events;
pub mod message;
pub mod request;
pub mod response;
pub mod tool;

pub use events::{StreamErrorPayload, StreamEvent};
pub use message::{ContentBlock, Message, MessageContent, Role, ToolResultContent};
pub use request::{ChatRequest, MaxTokens};
pub use response::{ChatResponse, StopReason, ToolUse, Usage};
pub use tool::{ToolChoice, ToolDefinition, ToolKit};

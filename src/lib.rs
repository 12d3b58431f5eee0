//! # anthropic-speak
//!
//! 面向 Anthropic Messages API 的聊天客户端：通用请求模型、线上格式转换、流式组装与阶段流水线。
//!
//! A chat-completion client for the Anthropic Messages API. Requests are built
//! in a provider-neutral schema, translated to the wire format, executed, and
//! translated back, including responses delivered as an event stream.
//!
//! ## Core Pieces
//!
//! - **Translation**: [`drivers::AnthropicDriver`] maps [`ChatRequest`] to the
//!   wire body and headers, and wire responses back to [`ChatResponse`].
//! - **Streaming assembly**: [`pipeline::StreamAssembler`] rebuilds one
//!   response object from `message_start` / `content_block_*` /
//!   `message_delta` events.
//! - **Pipeline**: [`pipeline::Pipeline`] runs named stages over a typed
//!   context and routes by transition label; the client uses
//!   prepare → call → finalize.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anthropic_speak::{AnthropicClient, ChatRequest, Message};
//!
//! #[tokio::main]
//! async fn main() -> anthropic_speak::Result<()> {
//!     let client = AnthropicClient::from_env()?;
//!
//!     let request = ChatRequest::new("claude-sonnet-4-20250514")
//!         .with_system("You are a concise assistant.")
//!         .with_message(Message::user("Hello, how are you?"))
//!         .with_max_tokens(256u32)
//!         .with_stream(true);
//!
//!     let response = client.chat(request).await?;
//!     println!("{}", response.all_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Universal request, message, tool, response and event types |
//! | [`protocol`] | Wire shapes of the Messages endpoint |
//! | [`drivers`] | Request/response translation |
//! | [`pipeline`] | Stage engine, SSE decoding and streaming assembly |
//! | [`transport`] | Wire client seam and the default HTTP transport |
//! | [`client`] | Configuration, per-call control and the client value |

pub mod client;
pub mod drivers;
pub mod pipeline;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{AnthropicClient, AnthropicClientBuilder, CallControl, ClientConfig};
pub use drivers::{AnthropicDriver, ProviderDriver};
pub use types::{
    ChatRequest, ChatResponse, ContentBlock, Message, MessageContent, Role, StopReason,
    ToolChoice, ToolDefinition, ToolKit, Usage,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, StreamingError};

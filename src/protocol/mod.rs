//! 协议层：Anthropic Messages 线上格式的请求/响应结构与常量。
//!
//! # Protocol Layer
//!
//! Wire shapes of the Messages endpoint. Nothing in here performs I/O; the
//! translator in [`crate::drivers`] maps between these shapes and the
//! universal schema in [`crate::types`].
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`request`] | Request body, wire tools/messages and the prepared HTTP request |
//! | [`response`] | Response body as received from the provider |
//! | [`error`] | Protocol-specific error types |

pub mod error;
pub mod request;
pub mod response;

pub use error::ProtocolError;
pub use request::{MessagesRequest, ProviderRequest, WireMessage, WireTool};
pub use response::{MessagesResponse, WireContainer};

/// Default base URL; endpoint paths are joined onto it.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/";

/// Protocol version sent as `anthropic-version` unless configured otherwise.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Path of the Messages endpoint relative to the base URL.
pub const MESSAGES_PATH: &str = "messages";

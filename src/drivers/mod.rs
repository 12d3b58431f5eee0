//! Provider 驱动抽象层：通用请求/响应与厂商线上格式之间的双向转换。
//!
//! Provider driver abstraction. A driver is a pure translator: it turns a
//! [`ChatRequest`] into a fully prepared [`ProviderRequest`] and a provider
//! response body back into a [`ChatResponse`]. Drivers never perform I/O.
//!
//! The trait is object-safe so the client can hold a `Arc<dyn ProviderDriver>`
//! and tests can substitute their own.

pub mod anthropic;

use serde_json::Value;

use crate::client::ClientConfig;
use crate::protocol::ProviderRequest;
use crate::types::{ChatRequest, ChatResponse};
use crate::Result;

pub use anthropic::AnthropicDriver;

/// Core trait for provider-specific API adaptation.
pub trait ProviderDriver: Send + Sync + std::fmt::Debug {
    /// Unique provider identifier.
    fn provider_id(&self) -> &str;

    /// Universal request → provider HTTP request. Validates before building.
    fn translate_request(&self, request: &ChatRequest, config: &ClientConfig)
        -> Result<ProviderRequest>;

    /// Provider response body → universal response.
    fn translate_response(&self, body: Value) -> Result<ChatResponse>;

    /// Provider request body → universal request.
    fn request_from_wire(&self, body: &Value) -> Result<ChatRequest>;

    /// Universal response → provider response body.
    fn response_to_wire(&self, response: &ChatResponse) -> Value;
}

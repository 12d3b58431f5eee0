//! 传输层：发送已准备好的 HTTP 请求，返回 JSON 响应体或事件字节流。
//!
//! # Transport
//!
//! The core only needs one capability: send a [`ProviderRequest`] and get back
//! a status plus either a JSON body or a byte stream. [`WireClient`] is that
//! seam; [`HttpTransport`] is the default implementation on `reqwest`.
//! Retries, proxies and connection policy belong to implementations, never to
//! the pipeline.

pub mod http;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::protocol::ProviderRequest;
use crate::{BoxStream, Result};

pub use http::HttpTransport;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} ({error_type}): {message}")]
    Status {
        status: u16,
        error_type: String,
        message: String,
    },

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Build a status error from a provider error body
    /// (`{"type":"error","error":{"type":..,"message":..}}`).
    pub fn from_error_body(status: u16, body: &Value) -> Self {
        let error_type = body
            .pointer("/error/type")
            .and_then(Value::as_str)
            .unwrap_or("http_error")
            .to_string();
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| body.as_str().filter(|s| !s.is_empty()).map(str::to_string))
            .unwrap_or_else(|| format!("request failed with status {}", status));
        TransportError::Status {
            status,
            error_type,
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            TransportError::Other(_) => None,
        }
    }
}

/// Response payload as delivered by a [`WireClient`].
pub enum WireBody {
    Json(Value),
    Stream(BoxStream<'static, Bytes>),
}

impl std::fmt::Debug for WireBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireBody::Json(v) => f.debug_tuple("Json").field(v).finish(),
            WireBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[derive(Debug)]
pub struct WireResponse {
    pub status: u16,
    /// Response headers, lower-case names.
    pub headers: BTreeMap<String, String>,
    pub body: WireBody,
}

impl WireResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: WireBody::Json(body),
        }
    }

    pub fn stream(status: u16, body: BoxStream<'static, Bytes>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: WireBody::Stream(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Provider request id (`request-id` header), when present.
    pub fn request_id(&self) -> Option<&str> {
        self.headers.get("request-id").map(String::as_str)
    }
}

/// "Send HTTP request, get JSON body or event stream."
#[async_trait]
pub trait WireClient: Send + Sync {
    async fn send(&self, request: &ProviderRequest) -> Result<WireResponse>;
}

//! Wire request shapes for the Messages endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::message::{MessageContent, Role};
use crate::types::tool::ToolChoice;

/// One conversation turn on the wire. Only `user` and `assistant` appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Tool definition on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub input_schema: Value,
}

/// Body of a Messages request. `None` / empty fields are omitted, never sent as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(deserialize_with = "token_count")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "tool_choice_any_form"
    )]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_function_calling: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<Value>,
}

/// Accepts `1024` as well as `"1024"`.
fn token_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("max_tokens out of range: {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| serde::de::Error::custom(format!("max_tokens is not numeric: {:?}", s))),
        other => Err(serde::de::Error::custom(format!(
            "max_tokens must be a number, found {}",
            other
        ))),
    }
}

/// Accepts the object form and the legacy bare-string form of `tool_choice`.
fn tool_choice_any_form<'de, D>(deserializer: D) -> Result<Option<ToolChoice>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(v) => ToolChoice::from_wire(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported tool_choice: {}", v))),
    }
}

/// Fully prepared HTTP request: the hand-off between translation and the wire client.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Target URL (base_url + endpoint path).
    pub url: String,
    /// Request headers, lower-case names.
    pub headers: BTreeMap<String, String>,
    /// Serialized JSON request body.
    pub body: Value,
    /// Whether an event stream is expected back.
    pub stream: bool,
}

impl ProviderRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

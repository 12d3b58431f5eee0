//! Anthropic Messages API driver.
//!
//! Handles the shape differences between the universal schema and the wire:
//! - System instructions are a single top-level `system` string, not messages.
//! - `max_tokens` is required and always a JSON number.
//! - `tool_choice` / `parallel_function_calling` only make sense with tools.
//! - Stop reasons use the provider vocabulary (`end_turn`, `tool_use`, ...).

use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::client::ClientConfig;
use crate::protocol::{
    MessagesRequest, MessagesResponse, ProtocolError, ProviderRequest, WireMessage, WireTool,
};
use crate::types::message::{ContentBlock, Message, Role};
use crate::types::request::ChatRequest;
use crate::types::response::{ChatResponse, StopReason};
use crate::types::tool::{ToolDefinition, ToolKit};
use crate::{Error, Result};

use super::ProviderDriver;

const SOURCE: &str = "request_translator";

/// Anthropic Messages API driver.
#[derive(Debug, Clone)]
pub struct AnthropicDriver {
    provider_id: String,
}

impl Default for AnthropicDriver {
    fn default() -> Self {
        Self::new("anthropic")
    }
}

impl AnthropicDriver {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
        }
    }

    /// Fold instruction segments and `system`-role turns into one string.
    ///
    /// Returns the remaining conversation in order. The fold is one-way: the
    /// reverse direction yields a single segment.
    fn split_system_messages(
        segments: &[String],
        messages: &[Message],
    ) -> (Option<String>, Vec<WireMessage>) {
        let mut system_parts: Vec<String> = segments
            .iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect();
        let mut conversation = Vec::with_capacity(messages.len());

        for m in messages {
            match m.role {
                Role::System => {
                    let text = m.content.joined_text();
                    if !text.trim().is_empty() {
                        system_parts.push(text);
                    }
                }
                Role::User | Role::Assistant => conversation.push(WireMessage {
                    role: m.role,
                    content: m.content.clone(),
                }),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };
        (system, conversation)
    }

    fn build_body(request: &ChatRequest) -> Result<MessagesRequest> {
        if request.model().trim().is_empty() {
            return Err(Error::missing_field("model", SOURCE));
        }
        let max_tokens = request
            .max_tokens()
            .ok_or_else(|| Error::missing_field("max_tokens", SOURCE))?
            .resolve()?;

        let (system, messages) =
            Self::split_system_messages(request.system_instructions(), request.messages());
        if messages.is_empty() {
            return Err(Error::missing_field("messages", SOURCE));
        }

        if request.frequency_penalty().is_some() || request.presence_penalty().is_some() {
            debug!(
                model = request.model(),
                "dropping frequency/presence penalty: not supported by the Messages API"
            );
        }
        if request.response_format().is_some() {
            debug!(
                model = request.model(),
                "dropping response_format: not supported by the Messages API"
            );
        }

        let tools: Vec<WireTool> = request
            .tools()
            .iter()
            .map(|t| WireTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect();
        let (tool_choice, parallel_function_calling) = if tools.is_empty() {
            (None, None)
        } else {
            (
                request.tool_choice().cloned(),
                request.parallel_function_calling(),
            )
        };

        Ok(MessagesRequest {
            model: request.model().to_string(),
            messages,
            max_tokens,
            system,
            tools,
            tool_choice,
            parallel_function_calling,
            temperature: request.temperature(),
            stream: request.is_stream().then_some(true),
            top_k: request.top_k(),
            top_p: request.top_p(),
            stop_sequences: request.stop_sequences().to_vec(),
            thinking: request.reasoning().cloned(),
            service_tier: request.service_tier().map(str::to_string),
            metadata: request.metadata().cloned(),
            container: request.container().map(str::to_string),
            mcp_servers: request.mcp_servers().to_vec(),
        })
    }

    fn build_headers(config: &ClientConfig, stream: bool) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        headers.insert("x-api-key".to_string(), config.api_key.clone());
        headers.insert(
            "anthropic-version".to_string(),
            config.api_version.clone(),
        );
        if stream {
            headers.insert("accept".to_string(), "text/event-stream".to_string());
        }
        for (name, value) in &config.extra_headers {
            // Extras never replace the headers computed above.
            headers
                .entry(name.to_ascii_lowercase())
                .or_insert_with(|| value.clone());
        }
        headers
    }

    fn convert_block(index: usize, raw: Value) -> Result<ContentBlock> {
        let path = format!("content[{}]", index);
        let block_type = match raw.get("type") {
            Some(Value::String(t)) => t.clone(),
            Some(other) => {
                return Err(ProtocolError::SchemaMismatch {
                    path: format!("{}.type", path),
                    expected: "string".into(),
                    actual: json_kind(other).into(),
                }
                .into())
            }
            None => return Err(ProtocolError::missing(format!("{}.type", path)).into()),
        };
        match block_type.as_str() {
            "text" | "tool_use" | "tool_result" | "thinking" => serde_json::from_value(raw)
                .map_err(|e| {
                    ProtocolError::SchemaMismatch {
                        path,
                        expected: format!("{} block", block_type),
                        actual: e.to_string(),
                    }
                    .into()
                }),
            _ => Err(ProtocolError::UnsupportedBlock { block_type, path }.into()),
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ProviderDriver for AnthropicDriver {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn translate_request(
        &self,
        request: &ChatRequest,
        config: &ClientConfig,
    ) -> Result<ProviderRequest> {
        if config.api_key.trim().is_empty() {
            return Err(Error::missing_field("api_key", SOURCE));
        }
        if config.api_version.trim().is_empty() {
            return Err(Error::missing_field("anthropic_version", SOURCE));
        }

        let wire = Self::build_body(request)?;
        let stream = wire.stream.unwrap_or(false);
        let body = serde_json::to_value(&wire)?;

        Ok(ProviderRequest {
            url: config.messages_url(),
            headers: Self::build_headers(config, stream),
            body,
            stream,
        })
    }

    fn translate_response(&self, body: Value) -> Result<ChatResponse> {
        if !body.is_object() {
            return Err(ProtocolError::MalformedBody(format!(
                "expected a JSON object, found {}",
                json_kind(&body)
            ))
            .into());
        }
        let wire: MessagesResponse = serde_json::from_value(body)
            .map_err(|e| ProtocolError::MalformedBody(e.to_string()))?;

        let id = wire
            .id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProtocolError::missing("id"))?;
        let model = wire
            .model
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProtocolError::missing("model"))?;
        let role = match wire.role.as_deref() {
            None | Some("assistant") => Role::Assistant,
            Some("user") => Role::User,
            Some(other) => {
                return Err(ProtocolError::SchemaMismatch {
                    path: "role".into(),
                    expected: "assistant".into(),
                    actual: other.into(),
                }
                .into())
            }
        };

        let content = wire
            .content
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Self::convert_block(i, raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(ChatResponse {
            id,
            response_type: wire.response_type.unwrap_or_else(|| "message".to_string()),
            model,
            role,
            content,
            stop_reason: wire.stop_reason.as_deref().map(StopReason::from_provider),
            stop_sequence: wire.stop_sequence,
            usage: wire.usage.unwrap_or_default(),
            container_id: wire.container.map(|c| c.id().to_string()),
        })
    }

    fn request_from_wire(&self, body: &Value) -> Result<ChatRequest> {
        let wire: MessagesRequest = serde_json::from_value(body.clone())
            .map_err(|e| ProtocolError::MalformedBody(e.to_string()))?;

        let tools = ToolKit::from_tools(
            wire.tools
                .into_iter()
                .map(|t| ToolDefinition::new(t.name, t.description, t.input_schema)),
        )?;

        let mut request = ChatRequest::new(wire.model)
            .with_messages(
                wire.messages
                    .into_iter()
                    .map(|m| Message::with_content(m.role, m.content))
                    .collect(),
            )
            .with_max_tokens(wire.max_tokens)
            .with_tools(tools)
            .with_stop_sequences(wire.stop_sequences)
            .with_stream(wire.stream.unwrap_or(false))
            .with_mcp_servers(wire.mcp_servers);

        if let Some(system) = wire.system {
            request = request.with_system(system);
        }
        if let Some(choice) = wire.tool_choice {
            request = request.with_tool_choice(choice);
        }
        if let Some(parallel) = wire.parallel_function_calling {
            request = request.with_parallel_function_calling(parallel);
        }
        if let Some(t) = wire.temperature {
            request = request.with_temperature(t);
        }
        if let Some(k) = wire.top_k {
            request = request.with_top_k(k);
        }
        if let Some(p) = wire.top_p {
            request = request.with_top_p(p);
        }
        if let Some(thinking) = wire.thinking {
            request = request.with_reasoning(thinking);
        }
        if let Some(tier) = wire.service_tier {
            request = request.with_service_tier(tier);
        }
        if let Some(metadata) = wire.metadata {
            request = request.with_metadata(metadata);
        }
        if let Some(container) = wire.container {
            request = request.with_container(container);
        }
        Ok(request)
    }

    fn response_to_wire(&self, response: &ChatResponse) -> Value {
        // Fixed table: `stop` is always `end_turn`; the literal survives in `stop_sequence`.
        let stop_reason = response.stop_reason.as_ref().map(StopReason::to_provider);

        let mut body = json!({
            "id": response.id,
            "type": response.response_type,
            "role": response.role,
            "content": response.content,
            "model": response.model,
            "stop_reason": stop_reason,
            "stop_sequence": response.stop_sequence,
            "usage": response.usage,
        });
        if let Some(container) = &response.container_id {
            body["container"] = json!({ "id": container });
        }
        body
    }
}

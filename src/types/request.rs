//! Provider-neutral chat request.
//!
//! A [`ChatRequest`] is immutable once built: every `with_*` method consumes
//! the value and returns a new one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::Message;
use super::tool::{ToolChoice, ToolKit};
use crate::{Error, ErrorContext, Result};

/// Output token limit as carried by the universal schema.
///
/// Callers may hand in either an integer or a numeric string; the canonical
/// type is `u32` and [`MaxTokens::resolve`] performs the coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxTokens {
    Count(u32),
    Text(String),
}

impl MaxTokens {
    pub fn resolve(&self) -> Result<u32> {
        match self {
            MaxTokens::Count(n) => Ok(*n),
            MaxTokens::Text(s) => s.trim().parse::<u32>().map_err(|_| {
                Error::validation_with_context(
                    "max_tokens must be a non-negative integer",
                    ErrorContext::new()
                        .with_field_path("max_tokens")
                        .with_details(format!("got {:?}", s))
                        .with_source("request_translator"),
                )
            }),
        }
    }
}

impl From<u32> for MaxTokens {
    fn from(n: u32) -> Self {
        MaxTokens::Count(n)
    }
}

impl From<&str> for MaxTokens {
    fn from(s: &str) -> Self {
        MaxTokens::Text(s.to_string())
    }
}

impl From<String> for MaxTokens {
    fn from(s: String) -> Self {
        MaxTokens::Text(s)
    }
}

/// Universal chat request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    system_instructions: Vec<String>,
    #[serde(skip_serializing_if = "ToolKit::is_empty")]
    tools: ToolKit,
    max_tokens: Option<MaxTokens>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    top_k: Option<u32>,
    stop: Vec<String>,
    stream: bool,
    tool_choice: Option<ToolChoice>,
    parallel_function_calling: Option<bool>,
    reasoning: Option<Value>,
    frequency_penalty: Option<f64>,
    presence_penalty: Option<f64>,
    response_format: Option<Value>,
    service_tier: Option<String>,
    metadata: Option<Value>,
    container: Option<String>,
    mcp_servers: Vec<Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the conversation.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Append one message to the conversation.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Append one system instruction segment.
    pub fn with_system(mut self, segment: impl Into<String>) -> Self {
        self.system_instructions.push(segment.into());
        self
    }

    pub fn with_system_instructions(mut self, segments: Vec<String>) -> Self {
        self.system_instructions = segments;
        self
    }

    pub fn with_tools(mut self, tools: ToolKit) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: impl Into<MaxTokens>) -> Self {
        self.max_tokens = Some(max_tokens.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn with_parallel_function_calling(mut self, enabled: bool) -> Self {
        self.parallel_function_calling = Some(enabled);
        self
    }

    /// Extended thinking configuration, e.g. `{"type":"enabled","budget_tokens":1024}`.
    pub fn with_reasoning(mut self, reasoning: Value) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    /// Not supported by the provider; dropped during translation.
    pub fn with_frequency_penalty(mut self, penalty: f64) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    /// Not supported by the provider; dropped during translation.
    pub fn with_presence_penalty(mut self, penalty: f64) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Not supported by the provider; dropped during translation.
    pub fn with_response_format(mut self, format: Value) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn with_service_tier(mut self, tier: impl Into<String>) -> Self {
        self.service_tier = Some(tier.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn with_mcp_servers(mut self, servers: Vec<Value>) -> Self {
        self.mcp_servers = servers;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system_instructions(&self) -> &[String] {
        &self.system_instructions
    }

    pub fn tools(&self) -> &ToolKit {
        &self.tools
    }

    pub fn max_tokens(&self) -> Option<&MaxTokens> {
        self.max_tokens.as_ref()
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn top_p(&self) -> Option<f64> {
        self.top_p
    }

    pub fn top_k(&self) -> Option<u32> {
        self.top_k
    }

    pub fn stop_sequences(&self) -> &[String] {
        &self.stop
    }

    pub fn is_stream(&self) -> bool {
        self.stream
    }

    pub fn tool_choice(&self) -> Option<&ToolChoice> {
        self.tool_choice.as_ref()
    }

    pub fn parallel_function_calling(&self) -> Option<bool> {
        self.parallel_function_calling
    }

    pub fn reasoning(&self) -> Option<&Value> {
        self.reasoning.as_ref()
    }

    pub fn frequency_penalty(&self) -> Option<f64> {
        self.frequency_penalty
    }

    pub fn presence_penalty(&self) -> Option<f64> {
        self.presence_penalty
    }

    pub fn response_format(&self) -> Option<&Value> {
        self.response_format.as_ref()
    }

    pub fn service_tier(&self) -> Option<&str> {
        self.service_tier.as_deref()
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    pub fn mcp_servers(&self) -> &[Value] {
        &self.mcp_servers
    }
}

//! Provider-neutral chat response and the queries derived from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::{ContentBlock, Role};

/// Why generation ended, in universal terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StopReason {
    Stop,
    Length,
    ToolCalls,
    /// Provider reason with no universal counterpart, carried verbatim.
    Other(String),
}

impl StopReason {
    /// Provider `stop_reason` → universal reason.
    ///
    /// `stop_sequence` folds into [`StopReason::Stop`]; the literal that
    /// fired survives in [`ChatResponse::stop_sequence`].
    pub fn from_provider(reason: &str) -> Self {
        match reason {
            "end_turn" | "stop_sequence" => StopReason::Stop,
            "max_tokens" => StopReason::Length,
            "tool_use" => StopReason::ToolCalls,
            other => StopReason::Other(other.to_string()),
        }
    }

    /// Universal reason → provider `stop_reason`. Unknown reasons become `end_turn`.
    pub fn to_provider(&self) -> &'static str {
        match self {
            StopReason::Stop => "end_turn",
            StopReason::Length => "max_tokens",
            StopReason::ToolCalls => "tool_use",
            StopReason::Other(_) => "end_turn",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StopReason::Stop => "stop",
            StopReason::Length => "length",
            StopReason::ToolCalls => "tool_calls",
            StopReason::Other(s) => s,
        }
    }

    pub fn parse(universal: &str) -> Self {
        match universal {
            "stop" => StopReason::Stop,
            "length" => StopReason::Length,
            "tool_calls" => StopReason::ToolCalls,
            other => StopReason::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StopReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StopReason {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(StopReason::parse(&s))
    }
}

/// Token accounting for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

impl Usage {
    /// Base input plus cache-creation and cache-read input.
    pub fn total_input_tokens(&self) -> u64 {
        self.input_tokens
            + self.cache_creation_input_tokens.unwrap_or(0)
            + self.cache_read_input_tokens.unwrap_or(0)
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens() + self.output_tokens
    }

    pub fn used_caching(&self) -> bool {
        self.cache_creation_input_tokens.is_some() || self.cache_read_input_tokens.is_some()
    }

    /// Share of input served from cache, in `[0.0, 1.0]`. Zero input yields `0.0`.
    pub fn cache_efficiency(&self) -> f64 {
        let total = self.total_input_tokens();
        if total == 0 {
            return 0.0;
        }
        self.cache_read_input_tokens.unwrap_or(0) as f64 / total as f64
    }
}

/// Borrowed view of a `tool_use` block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolUse<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub input: &'a Value,
}

/// Universal chat response, produced once per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub response_type: String,
    pub model: String,
    pub role: Role,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<StopReason>,
    pub stop_sequence: Option<String>,
    pub usage: Usage,
    pub container_id: Option<String>,
}

impl ChatResponse {
    /// First text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.text_blocks().next()
    }

    pub fn text_blocks(&self) -> impl Iterator<Item = &str> + '_ {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// All text blocks concatenated in order.
    pub fn all_text(&self) -> String {
        self.text_blocks().collect()
    }

    pub fn tool_uses(&self) -> Vec<ToolUse<'_>> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse {
                    id, name, input, ..
                } => Some(ToolUse {
                    id: id.as_str(),
                    name: name.as_str(),
                    input,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn thinking(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Thinking { thinking, .. } => Some(thinking.as_str()),
                _ => None,
            })
            .collect()
    }

    /// True if the model stopped to call a tool or any tool-use block is present.
    pub fn used_tools(&self) -> bool {
        self.stop_reason == Some(StopReason::ToolCalls)
            || self
                .content
                .iter()
                .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }

    pub fn completed_naturally(&self) -> bool {
        self.stop_reason == Some(StopReason::Stop)
    }

    pub fn was_truncated(&self) -> bool {
        self.stop_reason == Some(StopReason::Length)
    }

    pub fn was_stopped_by_sequence(&self) -> bool {
        self.stop_sequence.is_some()
    }

    pub fn total_input_tokens(&self) -> u64 {
        self.usage.total_input_tokens()
    }

    pub fn total_tokens(&self) -> u64 {
        self.usage.total_tokens()
    }

    pub fn used_caching(&self) -> bool {
        self.usage.used_caching()
    }

    pub fn cache_efficiency(&self) -> f64 {
        self.usage.cache_efficiency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(content: Vec<ContentBlock>, stop_reason: Option<StopReason>) -> ChatResponse {
        ChatResponse {
            id: "msg_1".into(),
            response_type: "message".into(),
            model: "claude-sonnet-4-20250514".into(),
            role: Role::Assistant,
            content,
            stop_reason,
            stop_sequence: None,
            usage: Usage::default(),
            container_id: None,
        }
    }

    #[test]
    fn test_stop_reason_table() {
        let table = [
            ("end_turn", StopReason::Stop),
            ("max_tokens", StopReason::Length),
            ("stop_sequence", StopReason::Stop),
            ("tool_use", StopReason::ToolCalls),
        ];
        for (provider, universal) in table {
            assert_eq!(StopReason::from_provider(provider), universal);
        }
        assert_eq!(StopReason::Stop.to_provider(), "end_turn");
        assert_eq!(StopReason::Length.to_provider(), "max_tokens");
        assert_eq!(StopReason::ToolCalls.to_provider(), "tool_use");
    }

    #[test]
    fn test_stop_round_trip_is_identity() {
        let there = StopReason::Stop.to_provider();
        assert_eq!(StopReason::from_provider(there), StopReason::Stop);
    }

    #[test]
    fn test_unmapped_reasons() {
        let passthrough = StopReason::from_provider("pause_turn");
        assert_eq!(passthrough, StopReason::Other("pause_turn".into()));
        assert_eq!(passthrough.as_str(), "pause_turn");
        assert_eq!(passthrough.to_provider(), "end_turn");
    }

    #[test]
    fn test_cache_efficiency_zero_input() {
        let r = response(vec![], Some(StopReason::Stop));
        assert_eq!(r.cache_efficiency(), 0.0);
    }

    #[test]
    fn test_token_totals_include_cache() {
        let mut r = response(vec![], None);
        r.usage = Usage {
            input_tokens: 10,
            output_tokens: 5,
            cache_creation_input_tokens: Some(20),
            cache_read_input_tokens: Some(70),
        };
        assert_eq!(r.total_input_tokens(), 100);
        assert_eq!(r.total_tokens(), 105);
        assert!(r.used_caching());
        assert!((r.cache_efficiency() - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_used_tools_either_signal() {
        let by_reason = response(vec![ContentBlock::text("hi")], Some(StopReason::ToolCalls));
        assert!(by_reason.used_tools());

        let by_block = response(
            vec![ContentBlock::tool_use("toolu_1", "echo", json!({}))],
            Some(StopReason::Stop),
        );
        assert!(by_block.used_tools());

        let neither = response(vec![ContentBlock::text("hi")], Some(StopReason::Stop));
        assert!(!neither.used_tools());
    }

    #[test]
    fn test_text_queries() {
        let r = response(
            vec![
                ContentBlock::thinking("plan"),
                ContentBlock::text("Hello, "),
                ContentBlock::tool_use("toolu_1", "echo", json!({"x": 1})),
                ContentBlock::text("world"),
            ],
            Some(StopReason::Stop),
        );
        assert_eq!(r.first_text(), Some("Hello, "));
        assert_eq!(r.all_text(), "Hello, world");
        assert_eq!(r.thinking(), vec!["plan"]);
        let uses = r.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].name, "echo");
        assert_eq!(uses[0].input["x"], 1);
        assert!(r.completed_naturally());
        assert!(!r.was_truncated());
    }
}

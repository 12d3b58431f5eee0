//! Streaming events of the Messages API.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::StreamingError;

/// Error payload carried by an `error` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamErrorPayload {
    #[serde(rename = "type", default = "unknown_error_type")]
    pub error_type: String,
    #[serde(default = "unknown_error_message")]
    pub message: String,
}

fn unknown_error_type() -> String {
    "unknown".to_string()
}

fn unknown_error_message() -> String {
    "Unknown streaming error".to_string()
}

/// One decoded SSE frame, selected by its `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    MessageStart {
        message: Map<String, Value>,
    },
    ContentBlockStart {
        index: Option<u64>,
        content_block: Map<String, Value>,
    },
    ContentBlockDelta {
        index: Option<u64>,
        delta: Map<String, Value>,
    },
    ContentBlockStop {
        index: Option<u64>,
    },
    MessageDelta {
        delta: Map<String, Value>,
        usage: Option<Map<String, Value>>,
    },
    MessageStop,
    Ping,
    Error(StreamErrorPayload),
    /// Event types this client does not know about; ignored by the assembler.
    Unknown {
        event_type: String,
    },
}

impl StreamEvent {
    /// Decode a frame payload.
    pub fn from_value(frame: Value) -> Result<Self, StreamingError> {
        let Value::Object(mut obj) = frame else {
            return Err(StreamingError::MalformedEvent {
                event: "<frame>".into(),
                reason: "frame payload is not a JSON object".into(),
            });
        };
        let event_type = obj
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let index = obj.get("index").and_then(Value::as_u64);

        let event = match event_type.as_str() {
            "message_start" => StreamEvent::MessageStart {
                message: take_object(&mut obj, "message", &event_type)?,
            },
            "content_block_start" => StreamEvent::ContentBlockStart {
                index,
                content_block: take_object(&mut obj, "content_block", &event_type)?,
            },
            "content_block_delta" => StreamEvent::ContentBlockDelta {
                index,
                delta: take_object(&mut obj, "delta", &event_type)?,
            },
            "content_block_stop" => StreamEvent::ContentBlockStop { index },
            "message_delta" => StreamEvent::MessageDelta {
                delta: take_object(&mut obj, "delta", &event_type)?,
                usage: match obj.remove("usage") {
                    Some(Value::Object(u)) => Some(u),
                    _ => None,
                },
            },
            "message_stop" => StreamEvent::MessageStop,
            "ping" => StreamEvent::Ping,
            "error" => {
                // Some proxies flatten the payload onto the event itself.
                let payload = obj.remove("error").unwrap_or(Value::Object(obj));
                StreamEvent::Error(serde_json::from_value(payload).unwrap_or(
                    StreamErrorPayload {
                        error_type: unknown_error_type(),
                        message: unknown_error_message(),
                    },
                ))
            }
            _ => StreamEvent::Unknown { event_type },
        };
        Ok(event)
    }

    pub fn name(&self) -> &str {
        match self {
            StreamEvent::MessageStart { .. } => "message_start",
            StreamEvent::ContentBlockStart { .. } => "content_block_start",
            StreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            StreamEvent::ContentBlockStop { .. } => "content_block_stop",
            StreamEvent::MessageDelta { .. } => "message_delta",
            StreamEvent::MessageStop => "message_stop",
            StreamEvent::Ping => "ping",
            StreamEvent::Error(_) => "error",
            StreamEvent::Unknown { event_type } => event_type,
        }
    }
}

fn take_object(
    obj: &mut Map<String, Value>,
    key: &str,
    event: &str,
) -> Result<Map<String, Value>, StreamingError> {
    match obj.remove(key) {
        Some(Value::Object(inner)) => Ok(inner),
        Some(_) => Err(StreamingError::MalformedEvent {
            event: event.to_string(),
            reason: format!("`{}` is not an object", key),
        }),
        None => Err(StreamingError::MalformedEvent {
            event: event.to_string(),
            reason: format!("missing `{}`", key),
        }),
    }
}

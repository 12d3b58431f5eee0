//! Streaming assembler: rebuilds one complete Messages response from events.
//!
//! ```text
//!  Idle ──message_start──► Started ──content_block_start──► Accumulating
//!                             │                                  │
//!                             └──────message_stop / [DONE]──────►┴──► Done
//!
//!  any non-terminal state ──error event / protocol violation──► Failed
//! ```
//!
//! The result is a provider-shaped JSON object, so the response translator
//! treats streamed and non-streamed replies identically.

use futures::StreamExt;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::client::CallControl;
use crate::error::StreamingError;
use crate::types::events::StreamEvent;
use crate::{BoxStream, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblerState {
    #[default]
    Idle,
    Started,
    Accumulating,
    Done,
    Failed,
}

#[derive(Debug, Default)]
struct BlockBuffer {
    fields: Map<String, Value>,
    partial_json: String,
}

impl BlockBuffer {
    fn append_str(&mut self, key: &str, piece: &str) {
        match self.fields.get_mut(key) {
            Some(Value::String(s)) => s.push_str(piece),
            _ => {
                self.fields
                    .insert(key.to_string(), Value::String(piece.to_string()));
            }
        }
    }

    /// Finished block. Accumulated tool input replaces the start placeholder;
    /// input that does not parse is kept as the raw string.
    fn into_value(mut self) -> Value {
        if !self.partial_json.is_empty() {
            let input = serde_json::from_str::<Value>(&self.partial_json)
                .unwrap_or(Value::String(self.partial_json));
            self.fields.insert("input".to_string(), input);
        }
        Value::Object(self.fields)
    }
}

/// Incremental state machine fed one [`StreamEvent`] at a time.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    state: AssemblerState,
    base: Option<Map<String, Value>>,
    blocks: Vec<BlockBuffer>,
    current: Option<usize>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == AssemblerState::Done
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn fail(&mut self, err: StreamingError) -> std::result::Result<(), StreamingError> {
        self.state = AssemblerState::Failed;
        Err(err)
    }

    fn out_of_order(&mut self, event: &str, reason: &str) -> std::result::Result<(), StreamingError> {
        self.fail(StreamingError::OutOfOrder {
            event: event.to_string(),
            reason: reason.to_string(),
        })
    }

    /// Apply one event.
    pub fn feed(&mut self, event: StreamEvent) -> std::result::Result<(), StreamingError> {
        match self.state {
            AssemblerState::Failed => {
                return Err(StreamingError::OutOfOrder {
                    event: event.name().to_string(),
                    reason: "assembler already failed".into(),
                })
            }
            AssemblerState::Done => {
                trace!(event = event.name(), "event after message_stop ignored");
                return Ok(());
            }
            _ => {}
        }

        match event {
            StreamEvent::MessageStart { message } => {
                if self.base.is_some() {
                    return self.out_of_order("message_start", "message already started");
                }
                self.base = Some(message);
                self.state = AssemblerState::Started;
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                if self.base.is_none() {
                    return self.out_of_order("content_block_start", "no message_start yet");
                }
                let position = self.blocks.len();
                if index.is_some_and(|i| i != position as u64) {
                    debug!(
                        declared = ?index,
                        position, "content block index differs from arrival order"
                    );
                }
                self.blocks.push(BlockBuffer {
                    fields: content_block,
                    partial_json: String::new(),
                });
                self.current = Some(position);
                self.state = AssemblerState::Accumulating;
            }
            StreamEvent::ContentBlockDelta { delta, .. } => {
                let Some(open) = self.current.filter(|i| *i < self.blocks.len()) else {
                    return self.out_of_order("content_block_delta", "no open content block");
                };
                if let Err(reason) = apply_delta(&mut self.blocks[open], delta) {
                    return self.fail(StreamingError::MalformedEvent {
                        event: "content_block_delta".into(),
                        reason,
                    });
                }
            }
            StreamEvent::MessageDelta { delta, usage } => {
                if self.base.is_none() {
                    return self.out_of_order("message_delta", "no message_start yet");
                }
                let base = self.base.get_or_insert_with(Map::new);
                for (k, v) in delta {
                    base.insert(k, v);
                }
                if let Some(usage) = usage {
                    match base.get_mut("usage") {
                        Some(Value::Object(existing)) => {
                            for (k, v) in usage {
                                existing.insert(k, v);
                            }
                        }
                        _ => {
                            base.insert("usage".to_string(), Value::Object(usage));
                        }
                    }
                }
            }
            StreamEvent::MessageStop => {
                self.state = AssemblerState::Done;
            }
            StreamEvent::Error(payload) => {
                return self.fail(StreamingError::Provider {
                    error_type: payload.error_type,
                    message: payload.message,
                });
            }
            StreamEvent::ContentBlockStop { .. } | StreamEvent::Ping => {}
            StreamEvent::Unknown { event_type } => {
                trace!(event = %event_type, "unknown stream event ignored");
            }
        }
        Ok(())
    }

    /// Produce the assembled response object.
    ///
    /// Callable at any point after `message_start`; the end of input counts as
    /// a graceful end.
    pub fn finish(self) -> std::result::Result<Value, StreamingError> {
        if self.state == AssemblerState::Failed {
            return Err(StreamingError::OutOfOrder {
                event: "<end>".into(),
                reason: "assembler already failed".into(),
            });
        }
        let mut base = self.base.ok_or(StreamingError::NoBaseMessage)?;
        if !self.blocks.is_empty() || !base.contains_key("content") {
            let content = self.blocks.into_iter().map(BlockBuffer::into_value).collect();
            base.insert("content".to_string(), Value::Array(content));
        }
        Ok(Value::Object(base))
    }
}

fn delta_str<'a>(delta: &'a Map<String, Value>, key: &str) -> std::result::Result<&'a str, String> {
    delta
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("delta is missing string field `{}`", key))
}

/// Kind of a delta that arrived without a `type` tag, judged by its payload.
/// Text-like payloads must still concatenate rather than overwrite.
fn untagged_delta_kind(delta: &Map<String, Value>) -> &'static str {
    let has_str = |key: &str| delta.get(key).is_some_and(Value::is_string);
    if has_str("text") {
        "text_delta"
    } else if has_str("thinking") {
        "thinking_delta"
    } else if has_str("partial_json") {
        "input_json_delta"
    } else if has_str("signature") {
        "signature_delta"
    } else if delta.contains_key("citation") {
        "citations_delta"
    } else {
        ""
    }
}

fn apply_delta(
    block: &mut BlockBuffer,
    mut delta: Map<String, Value>,
) -> std::result::Result<(), String> {
    let kind = match delta.get("type").and_then(Value::as_str) {
        Some(kind) => kind.to_string(),
        None => untagged_delta_kind(&delta).to_string(),
    };
    match kind.as_str() {
        "text_delta" => block.append_str("text", delta_str(&delta, "text")?),
        "thinking_delta" => block.append_str("thinking", delta_str(&delta, "thinking")?),
        "signature_delta" => {
            let signature = delta_str(&delta, "signature")?.to_string();
            block
                .fields
                .insert("signature".to_string(), Value::String(signature));
        }
        "input_json_delta" => block
            .partial_json
            .push_str(delta_str(&delta, "partial_json")?),
        "citations_delta" => {
            let citation = delta.remove("citation").unwrap_or(Value::Null);
            match block.fields.get_mut("citations") {
                Some(Value::Array(list)) => list.push(citation),
                _ => {
                    block
                        .fields
                        .insert("citations".to_string(), Value::Array(vec![citation]));
                }
            }
        }
        _ => {
            delta.remove("type");
            for (k, v) in delta {
                block.fields.insert(k, v);
            }
        }
    }
    Ok(())
}

/// Drive a [`StreamAssembler`] over decoded frames until the end marker or
/// end of input. Every read races the call's cancellation and deadline; a
/// stop signal discards what was accumulated.
pub async fn assemble(mut frames: BoxStream<'static, Value>, control: &CallControl) -> Result<Value> {
    let mut assembler = StreamAssembler::new();
    let mut events = 0usize;

    while let Some(frame) = control.run(async { Ok(frames.next().await) }).await? {
        let event = StreamEvent::from_value(frame?)?;
        events += 1;
        assembler.feed(event)?;
        if assembler.is_done() {
            break;
        }
    }

    let blocks = assembler.block_count();
    let message = assembler.finish()?;
    debug!(events, blocks, "stream assembled");
    Ok(message)
}

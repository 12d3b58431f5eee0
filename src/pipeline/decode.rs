//! Streaming decoder (Bytes -> JSON Value)
//!
//! Server-sent events as the Messages endpoint emits them: every `data:` line
//! carries one JSON frame. `event:`/`id:`/`retry:` fields, `:` comments and
//! blank lines carry nothing the assembler needs and are dropped. A frame
//! that does not decode ends the stream with an error; a reply missing a
//! piece is never reported as complete.

use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::warn;

use crate::error::StreamingError;
use crate::BoxStream;

const DATA_PREFIX: &str = "data:";

/// Line-oriented SSE decoder.
///
/// - one JSON payload per `data:` line
/// - stops on `done_signal` (default `[DONE]`)
/// - a frame that is not valid JSON yields one error item, then the stream ends
#[derive(Debug, Clone)]
pub struct SseDecoder {
    done_signal: String,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new("[DONE]")
    }
}

enum Line {
    Frame(Value),
    Invalid(StreamingError),
    Done,
    Skip,
}

impl SseDecoder {
    pub fn new(done_signal: impl Into<String>) -> Self {
        Self {
            done_signal: done_signal.into(),
        }
    }

    fn classify(&self, raw: &[u8]) -> Line {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches('\r').trim();
        if line.is_empty() || line.starts_with(':') {
            return Line::Skip;
        }

        let payload = if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
            rest.trim_start()
        } else if line.starts_with('{') {
            // Some proxies strip the field name and forward bare JSON lines.
            line
        } else {
            // `event:`, `id:`, `retry:` and unknown fields.
            return Line::Skip;
        };

        if payload == self.done_signal {
            return Line::Done;
        }
        if payload.is_empty() {
            return Line::Skip;
        }
        match serde_json::from_str::<Value>(payload) {
            Ok(v) => Line::Frame(v),
            Err(e) => {
                warn!(
                    frame = %payload.chars().take(120).collect::<String>(),
                    error = %e,
                    "undecodable stream frame"
                );
                Line::Invalid(StreamingError::MalformedEvent {
                    event: "<frame>".into(),
                    reason: format!("frame is not valid JSON: {}", e),
                })
            }
        }
    }

    /// Decode a byte stream into JSON frames.
    ///
    /// Bytes are buffered until a full line is available, so multi-byte
    /// characters split across chunks decode correctly. Transport errors are
    /// passed through and end nothing by themselves; the consumer decides.
    pub fn decode_stream(&self, input: BoxStream<'static, Bytes>) -> BoxStream<'static, Value> {
        let decoder = self.clone();
        let stream = stream::unfold(
            (input, Vec::<u8>::new(), false),
            move |(mut input, mut buf, finished)| {
                let decoder = decoder.clone();
                async move {
                    if finished {
                        return None;
                    }
                    loop {
                        // Emit complete lines first.
                        if let Some(idx) = buf.iter().position(|b| *b == b'\n') {
                            let line: Vec<u8> = buf.drain(..=idx).collect();
                            match decoder.classify(&line[..line.len() - 1]) {
                                Line::Frame(v) => return Some((Ok(v), (input, buf, false))),
                                Line::Invalid(e) => {
                                    return Some((Err(e.into()), (input, buf, true)))
                                }
                                Line::Done => return None,
                                Line::Skip => continue,
                            }
                        }

                        // Need more data.
                        match input.next().await {
                            Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                            Some(Err(e)) => return Some((Err(e), (input, buf, false))),
                            None => {
                                // EOF: the last line may lack its newline.
                                let rest = std::mem::take(&mut buf);
                                return match decoder.classify(&rest) {
                                    Line::Frame(v) => Some((Ok(v), (input, buf, true))),
                                    Line::Invalid(e) => Some((Err(e.into()), (input, buf, true))),
                                    Line::Done | Line::Skip => None,
                                };
                            }
                        }
                    }
                }
            },
        );

        Box::pin(stream)
    }
}

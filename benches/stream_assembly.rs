//! Benchmarks for streaming assembly
//!
//! This benchmark measures:
//! - SSE line decoding speed
//! - Event classification throughput
//! - Assembler cost for long text and tool-input streams

use anthropic_speak::pipeline::{assemble, SseDecoder, StreamAssembler};
use anthropic_speak::types::StreamEvent;
use anthropic_speak::CallControl;
use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use futures::stream;
use serde_json::{json, Value};

fn text_stream(deltas: usize) -> Vec<Value> {
    let mut frames = vec![
        json!({"type": "message_start", "message": {
            "id": "msg_bench", "type": "message", "role": "assistant",
            "model": "claude-sonnet-4-20250514", "content": [],
            "stop_reason": null, "usage": {"input_tokens": 25, "output_tokens": 1}
        }}),
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
    ];
    for i in 0..deltas {
        frames.push(json!({
            "type": "content_block_delta", "index": 0,
            "delta": {"type": "text_delta", "text": format!("token{} ", i)}
        }));
    }
    frames.push(json!({"type": "content_block_stop", "index": 0}));
    frames.push(json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"output_tokens": deltas}}));
    frames.push(json!({"type": "message_stop"}));
    frames
}

fn tool_stream(pieces: usize) -> Vec<Value> {
    let mut frames = vec![
        json!({"type": "message_start", "message": {
            "id": "msg_tool", "type": "message", "role": "assistant",
            "model": "claude-sonnet-4-20250514", "content": [],
            "usage": {"input_tokens": 400, "output_tokens": 1}
        }}),
        json!({"type": "content_block_start", "index": 0,
               "content_block": {"type": "tool_use", "id": "toolu_1", "name": "search", "input": {}}}),
        json!({"type": "content_block_delta", "index": 0,
               "delta": {"type": "input_json_delta", "partial_json": "{\"terms\": ["}}),
    ];
    for i in 0..pieces {
        let sep = if i + 1 == pieces { "" } else { "," };
        frames.push(json!({
            "type": "content_block_delta", "index": 0,
            "delta": {"type": "input_json_delta", "partial_json": format!("\"term{}\"{}", i, sep)}
        }));
    }
    frames.push(json!({"type": "content_block_delta", "index": 0,
                       "delta": {"type": "input_json_delta", "partial_json": "]}"}}));
    frames.push(json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}}));
    frames.push(json!({"type": "message_stop"}));
    frames
}

fn to_sse(frames: &[Value]) -> String {
    frames
        .iter()
        .map(|f| format!("event: {}\ndata: {}\n\n", f["type"].as_str().unwrap(), f))
        .collect()
}

fn bench_event_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_decoding");
    let frames = text_stream(200);
    group.throughput(Throughput::Elements(frames.len() as u64));

    group.bench_function("from_value_200_deltas", |b| {
        b.iter(|| {
            for frame in black_box(&frames) {
                black_box(StreamEvent::from_value(frame.clone()).unwrap());
            }
        })
    });

    group.finish();
}

fn bench_assembler(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembler");

    for (name, frames) in [("text_1000", text_stream(1000)), ("tool_json_500", tool_stream(500))] {
        let events: Vec<StreamEvent> = frames
            .into_iter()
            .map(|f| StreamEvent::from_value(f).unwrap())
            .collect();
        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut assembler = StreamAssembler::new();
                for event in black_box(&events) {
                    assembler.feed(event.clone()).unwrap();
                }
                black_box(assembler.finish().unwrap())
            })
        });
    }

    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("sse_to_message");
    let body = to_sse(&text_stream(500));
    group.throughput(Throughput::Bytes(body.len() as u64));

    // Split into network-sized chunks so the decoder has to buffer partial lines.
    let chunks: Vec<Bytes> = body
        .as_bytes()
        .chunks(1460)
        .map(Bytes::copy_from_slice)
        .collect();
    let runtime = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("decode_and_assemble_500", |b| {
        b.to_async(&runtime).iter(|| {
            let chunks = chunks.clone();
            async move {
                let input = Box::pin(stream::iter(
                    chunks.into_iter().map(Ok::<Bytes, anthropic_speak::Error>),
                ));
                let frames = SseDecoder::default().decode_stream(input);
                black_box(assemble(frames, &CallControl::new()).await.unwrap())
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_event_decoding,
    bench_assembler,
    bench_end_to_end,
);
criterion_main!(benches);

//! Basic chat example
//!
//! Sends one non-streamed request and prints the reply with token usage.
//!
//! API Keys are configured via environment variables:
//! - ANTHROPIC_API_KEY (required)
//! - ANTHROPIC_BASE_URL, ANTHROPIC_VERSION (optional)
//!
//! Usage:
//!   ANTHROPIC_API_KEY="your_key" RUST_LOG=anthropic_speak=debug cargo run --example basic_chat

use anthropic_speak::{AnthropicClient, ChatRequest, Message};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if std::env::var("ANTHROPIC_API_KEY").is_err() {
        eprintln!("Warning: ANTHROPIC_API_KEY not set. The request will be rejected before it is sent.");
    }

    let client = AnthropicClient::from_env()?;
    let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| "claude-sonnet-4-20250514".into());

    let request = ChatRequest::new(model)
        .with_system("You are a helpful assistant. Answer in two sentences or fewer.")
        .with_message(Message::user("What does a Rust borrow checker do?"))
        .with_max_tokens(300u32)
        .with_temperature(0.3);

    let response = client.chat(request).await?;

    println!("Response:\n{}", response.all_text());
    println!(
        "\nstop_reason={} input_tokens={} output_tokens={}",
        response.stop_reason.as_ref().map(|r| r.as_str()).unwrap_or("none"),
        response.total_input_tokens(),
        response.usage.output_tokens
    );
    Ok(())
}

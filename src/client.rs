//! Messages client: configuration, per-call control and the client value.
//!
//! The client is an explicitly constructed value. Nothing is resolved from
//! global state after [`AnthropicClientBuilder::build`] returns.

pub mod builder;
pub mod config;
pub mod control;
pub mod core;

pub use builder::AnthropicClientBuilder;
pub use config::ClientConfig;
pub use control::CallControl;
pub use core::AnthropicClient;

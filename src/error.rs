use crate::pipeline::PipelineError;
use crate::protocol::ProtocolError;
use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path that caused the error (e.g., "max_tokens", "headers.x-api-key")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "request_translator", "client_config")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Error raised while assembling a streamed response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamingError {
    /// The provider sent an explicit `error` event mid-stream.
    #[error("provider stream error ({error_type}): {message}")]
    Provider { error_type: String, message: String },

    /// The stream ended before a `message_start` event was seen.
    #[error("stream ended without a base message: no base message produced")]
    NoBaseMessage,

    /// The event sequence violated the Messages streaming protocol.
    #[error("unexpected `{event}` event: {reason}")]
    OutOfOrder { event: String, reason: String },

    /// An event frame did not have the shape its type requires.
    #[error("malformed `{event}` event: {reason}")]
    MalformedEvent { event: String, reason: String },
}

/// Unified error type for the client.
///
/// Every variant is terminal for the invocation that produced it; the
/// pipeline never downgrades a stage failure into a partial result.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Streaming error: {0}")]
    Streaming(#[from] StreamingError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Call cancelled: {reason}")]
    Cancelled { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Validation error for a required request field that is absent or empty.
    pub fn missing_field(field: &str, source: &str) -> Self {
        Error::validation_with_context(
            format!("{} is required for the request", field),
            ErrorContext::new()
                .with_field_path(field)
                .with_source(source),
        )
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        Error::Cancelled {
            reason: reason.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Validation { context, .. } | Error::Configuration { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Field named by a validation error, if any.
    pub fn field_path(&self) -> Option<&str> {
        self.context().and_then(|c| c.field_path.as_deref())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }
}

//! Protocol error types

/// Raised when a provider payload does not have the expected wire shape.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Missing required response field: {field}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    MissingField { field: String, hint: Option<String> },

    #[error("Schema mismatch: expected {expected}, found {actual} at {path}")]
    SchemaMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported content block type '{block_type}' at {path}")]
    UnsupportedBlock { block_type: String, path: String },

    #[error("Malformed response body: {0}")]
    MalformedBody(String),
}

impl ProtocolError {
    pub fn missing(field: impl Into<String>) -> Self {
        ProtocolError::MissingField {
            field: field.into(),
            hint: None,
        }
    }

    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        if let ProtocolError::MissingField { ref mut hint, .. } = self {
            *hint = hint_val;
        }
        self
    }
}

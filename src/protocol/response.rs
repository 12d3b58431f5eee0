//! Wire response shape of the Messages endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::response::Usage;

/// Container reference: the API sends an object, older proxies a bare id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireContainer {
    Object {
        id: String,
        #[serde(flatten)]
        rest: serde_json::Map<String, Value>,
    },
    Id(String),
}

impl WireContainer {
    pub fn id(&self) -> &str {
        match self {
            WireContainer::Object { id, .. } => id,
            WireContainer::Id(id) => id,
        }
    }
}

/// Response body before translation.
///
/// Required fields are optional here so that their absence surfaces as a
/// [`ProtocolError::MissingField`](super::ProtocolError::MissingField) naming
/// the field rather than a generic decode failure. Content blocks stay raw
/// until the translator checks their type tags.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub response_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub container: Option<WireContainer>,
}

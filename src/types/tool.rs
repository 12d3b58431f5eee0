//! Tool calling definitions in the universal schema

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, ErrorContext, Result};

/// Tool definition (for function calling)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the tool input
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Ordered set of tool definitions with unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolKit {
    tools: Vec<ToolDefinition>,
}

impl ToolKit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a kit from definitions, rejecting duplicate names.
    pub fn from_tools(tools: impl IntoIterator<Item = ToolDefinition>) -> Result<Self> {
        let mut kit = Self::new();
        for tool in tools {
            kit = kit.with_tool(tool)?;
        }
        Ok(kit)
    }

    pub fn with_tool(mut self, tool: ToolDefinition) -> Result<Self> {
        if tool.name.trim().is_empty() {
            return Err(Error::validation_with_context(
                "tool name must be non-empty",
                ErrorContext::new()
                    .with_field_path(format!("tools[{}].name", self.tools.len()))
                    .with_source("tool_kit"),
            ));
        }
        if self.get(&tool.name).is_some() {
            return Err(Error::validation_with_context(
                format!("duplicate tool name '{}'", tool.name),
                ErrorContext::new()
                    .with_field_path(format!("tools[{}].name", self.tools.len()))
                    .with_source("tool_kit"),
            ));
        }
        self.tools.push(tool);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ToolDefinition> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl<'de> Deserialize<'de> for ToolKit {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tools = Vec::<ToolDefinition>::deserialize(deserializer)?;
        ToolKit::from_tools(tools).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a ToolKit {
    type Item = &'a ToolDefinition;
    type IntoIter = std::slice::Iter<'a, ToolDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}

/// How the model may pick tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    Any,
    None,
    Tool { name: String },
}

impl ToolChoice {
    pub fn tool(name: impl Into<String>) -> Self {
        ToolChoice::Tool { name: name.into() }
    }

    /// Accepts the object form (`{"type":"auto"}`) and the bare string form (`"auto"`).
    pub fn from_wire(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => match s.as_str() {
                "auto" => Some(ToolChoice::Auto),
                "any" => Some(ToolChoice::Any),
                "none" => Some(ToolChoice::None),
                _ => None,
            },
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}

//! Tool definitions
//!
//! A tool declares its name, description and parameters up front so that the
//! registry can validate calls and the prompt builder can describe it.

use crate::errors::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;

/// Parameter value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    /// Non-negative integer written as a quoted string (`k="3"`)
    Integer,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::String => write!(f, "string"),
            ParamKind::Integer => write!(f, "integer"),
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    /// Value used when an optional parameter is omitted
    pub default: Option<String>,
}

impl ParamSpec {
    /// Required parameter
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// Optional parameter with a default
    pub fn optional(
        name: impl Into<String>,
        kind: ParamKind,
        description: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: Some(default.into()),
        }
    }
}

/// Tool schema definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Parameters in declaration order
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON Schema rendering of the parameters
    pub fn schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for param in &self.params {
            let mut prop = json!({
                "type": param.kind.to_string(),
                "description": param.description,
            });
            if let Some(default) = &param.default {
                prop["default"] = json!(default);
            }
            properties.insert(param.name.clone(), prop);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Literal call syntax shown to the model, e.g. `search[query="...", k="3"]`
    pub fn call_syntax(&self) -> String {
        let args: Vec<String> = self
            .params
            .iter()
            .map(|p| match &p.default {
                Some(default) => format!("{}=\"{}\"", p.name, default),
                None => format!("{}=\"...\"", p.name),
            })
            .collect();
        format!("{}[{}]", self.name, args.join(", "))
    }
}

/// Validated arguments handed to a tool
///
/// Every declared parameter is present unless it is optional without a
/// default. Integer parameters have already been checked to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolArgs {
    tool: String,
    values: HashMap<String, String>,
}

impl ToolArgs {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// String argument that must be present
    pub fn get_str(&self, key: &str) -> Result<&str, ToolError> {
        self.get(key).ok_or_else(|| ToolError::InvalidArguments {
            tool: self.tool.clone(),
            reason: format!("missing required argument '{}'", key),
        })
    }

    /// Integer argument that must be present
    pub fn get_usize(&self, key: &str) -> Result<usize, ToolError> {
        let raw = self.get_str(key)?;
        parse_usize(raw).ok_or_else(|| ToolError::InvalidArguments {
            tool: self.tool.clone(),
            reason: format!("argument '{}' must be a non-negative integer, got '{}'", key, raw),
        })
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn parse_usize(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok()
}

/// Capability callable from an `Action:` line
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declared name, description and parameters
    fn spec(&self) -> &ToolSpec;

    /// Run the tool on validated arguments
    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError>;
}

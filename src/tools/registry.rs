//! Tool registry (capability table)
//!
//! Maps exact tool names to implementations. Tools are validated when they
//! are registered, so dispatch only has to check the call itself.
//!
//! Tools:
//! - search: Rank documents against a query
//! - list_docs: List document ids and titles
//! - explain_term: Look up a financial term

use crate::errors::{AgentError, Result, ToolError};
use crate::retrieval::RetrievalEngine;
use crate::tools::implementations::{ExplainTermTool, Glossary, ListDocsTool, SearchTool};
use crate::tools::types::{parse_usize, ParamKind, Tool, ToolArgs, ToolSpec};
use crate::types::action::{is_identifier, Action, FINISH_ACTION};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Tool registry
#[derive(Clone, Default)]
pub struct ToolRegistry {
    /// Tools in registration order
    tools: Vec<Arc<dyn Tool>>,

    /// Name to position in `tools`
    by_name: HashMap<String, usize>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

impl ToolRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in tools
    pub fn standard(engine: Arc<RetrievalEngine>, glossary: Glossary) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(SearchTool::new(Arc::clone(&engine))))?;
        registry.register(Arc::new(ListDocsTool::new(engine)))?;
        registry.register(Arc::new(ExplainTermTool::new(glossary)))?;
        Ok(registry)
    }

    /// Add a tool after validating its declaration
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let spec = tool.spec();
        validate_spec(spec)?;

        if self.by_name.contains_key(&spec.name) {
            return Err(AgentError::InvalidToolRegistration(format!(
                "tool '{}' is already registered",
                spec.name
            )));
        }

        debug!(tool = %spec.name, params = spec.params.len(), "registered tool");
        self.by_name.insert(spec.name.clone(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Keep only the named tools, preserving registration order
    pub fn restrict_to(&mut self, allowed: &[String]) -> Result<()> {
        if let Some(unknown) = allowed.iter().find(|name| !self.contains(name)) {
            return Err(AgentError::InvalidToolRegistration(format!(
                "allowed tool '{}' is not registered",
                unknown
            )));
        }

        let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
        self.tools.retain(|tool| allowed.contains(tool.spec().name.as_str()));
        self.by_name = self
            .tools
            .iter()
            .enumerate()
            .map(|(i, tool)| (tool.spec().name.clone(), i))
            .collect();
        Ok(())
    }

    /// Validate an action against the table and run the tool
    pub async fn dispatch(&self, action: &Action) -> std::result::Result<Value, ToolError> {
        let tool = self
            .get(&action.name)
            .ok_or_else(|| ToolError::UnknownTool {
                name: action.name.clone(),
                available: self.tool_names().join(", "),
            })?;

        let args = bind_arguments(tool.spec(), action)?;
        debug!(tool = %action.name, args = args.len(), "dispatching tool");
        tool.execute(&args).await
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Specs in registration order
    pub fn specs(&self) -> Vec<&ToolSpec> {
        self.tools.iter().map(|tool| tool.spec()).collect()
    }

    /// Names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.spec().name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn validate_spec(spec: &ToolSpec) -> Result<()> {
    let reject = |reason: String| -> Result<()> { Err(AgentError::InvalidToolRegistration(reason)) };

    if !is_identifier(&spec.name) {
        return reject(format!("tool name '{}' is not an identifier", spec.name));
    }
    if spec.name == FINISH_ACTION {
        return reject(format!("'{}' is reserved", FINISH_ACTION));
    }

    let mut seen = HashSet::new();
    for param in &spec.params {
        if !is_identifier(&param.name) {
            return reject(format!(
                "parameter '{}' of '{}' is not an identifier",
                param.name, spec.name
            ));
        }
        if !seen.insert(param.name.as_str()) {
            return reject(format!(
                "parameter '{}' of '{}' is declared twice",
                param.name, spec.name
            ));
        }
        if let (ParamKind::Integer, Some(default)) = (param.kind, &param.default) {
            if parse_usize(default).is_none() {
                return reject(format!(
                    "default '{}' of '{}.{}' is not an integer",
                    default, spec.name, param.name
                ));
            }
        }
    }

    Ok(())
}

/// Check an action's arguments against the declared parameters
fn bind_arguments(spec: &ToolSpec, action: &Action) -> std::result::Result<ToolArgs, ToolError> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool: spec.name.clone(),
        reason,
    };

    if let Some((key, _)) = action.args.iter().find(|(key, _)| spec.param(key).is_none()) {
        let expected: Vec<&str> = spec.params.iter().map(|p| p.name.as_str()).collect();
        return Err(invalid(if expected.is_empty() {
            format!("unknown argument '{}'; this tool takes no arguments", key)
        } else {
            format!(
                "unknown argument '{}'; expected one of: {}",
                key,
                expected.join(", ")
            )
        }));
    }

    let mut args = ToolArgs::new(spec.name.clone());
    for param in &spec.params {
        let value = match (action.arg(&param.name), &param.default) {
            (Some(value), _) => value,
            (None, Some(default)) => default.as_str(),
            (None, None) if param.required => {
                return Err(invalid(format!(
                    "missing required argument '{}'",
                    param.name
                )))
            }
            (None, None) => continue,
        };

        if param.kind == ParamKind::Integer && parse_usize(value).is_none() {
            return Err(invalid(format!(
                "argument '{}' must be a non-negative integer, got '{}'",
                param.name, value
            )));
        }
        args.insert(param.name.clone(), value);
    }

    Ok(args)
}

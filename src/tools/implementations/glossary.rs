//! Financial glossary and the `explain_term` tool

use crate::errors::{AgentError, Result, ToolError};
use crate::tools::types::{ParamKind, ParamSpec, Tool, ToolArgs, ToolSpec};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;

pub const EXPLAIN_TERM_TOOL: &str = "explain_term";

const BUILTIN_GLOSSARY: &str = include_str!("../../../data/glossary.json");

/// Term to plain-language explanation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    /// Keys are stored lowercased
    entries: BTreeMap<String, String>,
}

impl Glossary {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (normalize(k.as_ref()), v.into()))
                .collect(),
        }
    }

    /// Glossary compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_GLOSSARY)
    }

    /// Parse a JSON object of `term: explanation` pairs
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)
            .map_err(|e| AgentError::CorpusLoad(format!("invalid glossary: {}", e)))?;
        Ok(Self::new(raw))
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AgentError::CorpusLoad(format!("cannot read glossary {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Case-insensitive lookup, retrying without a trailing `s`
    pub fn lookup(&self, term: &str) -> Option<&str> {
        let key = normalize(term);
        if let Some(found) = self.entries.get(&key) {
            return Some(found);
        }
        key.strip_suffix('s')
            .and_then(|singular| self.entries.get(singular))
            .map(String::as_str)
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase and collapse inner whitespace
fn normalize(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Looks a financial term up in the glossary
#[derive(Debug, Clone)]
pub struct ExplainTermTool {
    glossary: Glossary,
    spec: ToolSpec,
}

impl ExplainTermTool {
    pub fn new(glossary: Glossary) -> Self {
        let spec = ToolSpec::new(
            EXPLAIN_TERM_TOOL,
            "Explain a financial term such as EPS, EBITDA or net income in plain language.",
        )
        .with_param(ParamSpec::required(
            "term",
            ParamKind::String,
            "The term to explain",
        ));
        Self { glossary, spec }
    }
}

#[async_trait]
impl Tool for ExplainTermTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &ToolArgs) -> std::result::Result<Value, ToolError> {
        let term = args.get_str("term")?;
        let explanation = self.glossary.lookup(term);

        Ok(json!({
            "tool": EXPLAIN_TERM_TOOL,
            "term": term,
            "found": explanation.is_some(),
            "explanation": explanation
                .map(str::to_string)
                .unwrap_or_else(|| format!("No glossary entry for '{}'. Try searching the documents instead.", term)),
        }))
    }
}

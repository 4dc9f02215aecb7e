//! `list_docs` tool

use crate::errors::ToolError;
use crate::retrieval::RetrievalEngine;
use crate::tools::types::{Tool, ToolArgs, ToolSpec};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub const LIST_DOCS_TOOL: &str = "list_docs";

/// Lists document ids and titles in corpus order
#[derive(Debug, Clone)]
pub struct ListDocsTool {
    engine: Arc<RetrievalEngine>,
    spec: ToolSpec,
}

impl ListDocsTool {
    pub fn new(engine: Arc<RetrievalEngine>) -> Self {
        Self {
            engine,
            spec: ToolSpec::new(
                LIST_DOCS_TOOL,
                "List the ids and titles of every available document.",
            ),
        }
    }
}

#[async_trait]
impl Tool for ListDocsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, _args: &ToolArgs) -> Result<Value, ToolError> {
        Ok(json!({
            "tool": LIST_DOCS_TOOL,
            "documents": self.engine.list_documents(),
        }))
    }
}
